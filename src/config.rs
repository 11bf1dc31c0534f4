use envconfig::Envconfig;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Env(#[from] envconfig::Error),
    #[error("Missing {0} environment variable")]
    Missing(&'static str),
}

#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(from = "SUPABASE_URL")]
    pub supabase_url: String,

    #[envconfig(from = "SUPABASE_ANON_KEY")]
    pub supabase_anon_key: String,

    #[envconfig(from = "RECEIPTS_TABLE", default = "receipts")]
    pub receipts_table: String,

    #[envconfig(from = "BIND_ADDR", default = "127.0.0.1:3000")]
    pub bind_addr: String,

    /// Store `items` as a JSON string instead of a JSON array.
    #[envconfig(from = "ITEMS_AS_TEXT", default = "false")]
    pub items_as_text: bool,
}

impl Config {
    /// Reads the environment and rejects blank backend settings.
    pub fn load() -> Result<Self, ConfigError> {
        Self::init_from_env()?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.supabase_url.trim().is_empty() {
            return Err(ConfigError::Missing("SUPABASE_URL"));
        }
        if self.supabase_anon_key.trim().is_empty() {
            return Err(ConfigError::Missing("SUPABASE_ANON_KEY"));
        }
        Ok(self)
    }
}
