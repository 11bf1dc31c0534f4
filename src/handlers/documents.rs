use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    handlers::AppState,
    utils::attachment_disposition,
    views::document::{self, DocumentFormat},
};

#[derive(Deserialize, Debug, Default)]
pub struct DownloadQuery {
    format: Option<String>,
}

impl DownloadQuery {
    fn document_format(&self) -> DocumentFormat {
        match self.format.as_deref() {
            Some("txt") | Some("text") => DocumentFormat::Text,
            _ => DocumentFormat::Html,
        }
    }
}

fn not_found(id: &str) -> Response {
    log::warn!("Requested unknown receipt {}", id);
    (StatusCode::NOT_FOUND, "Receipt not found").into_response()
}

/// Serves the generated document as an attachment named after the receipt.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let Some(receipt) = state.find_receipt(&id).await else {
        return not_found(&id);
    };
    let format = query.document_format();
    log::info!("Downloading receipt {} as {}", receipt.id, format.extension());

    let disposition = attachment_disposition(&document::file_name(&receipt, format));
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document::render(&receipt, format),
    )
        .into_response()
}

/// The HTML document that opens the print dialog when loaded.
pub async fn print(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.find_receipt(&id).await {
        Some(receipt) => {
            log::info!("Printing receipt {}", receipt.id);
            Html(document::render_printable(&receipt)).into_response()
        }
        None => not_found(&id),
    }
}
