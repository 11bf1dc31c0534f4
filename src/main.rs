use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;

use pharmacy_receipts::{
    config::Config,
    db::SupabaseClient,
    handlers::{router, AppState},
};

type Error = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize the logger with default settings or "info" level if not specified
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting the pharmacy receipts app...");

    // Load environment variables from a .env file if present
    dotenv().ok();

    // Missing backend settings are fatal
    let config = Config::load().map_err(|e| {
        log::error!("{}", e);
        e
    })?;

    let store = SupabaseClient::from_config(&config);
    log::info!(
        "Using table '{}' at {}",
        config.receipts_table,
        config.supabase_url
    );

    let state = Arc::new(AppState::new(Arc::new(store)));
    let app = router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    log::info!("Shutting down gracefully");
    Ok(())
}
