use axum::{routing::get, Router};
use std::sync::{Arc, Mutex, RwLock};

use crate::{
    db::{models::Receipt, ReceiptStore},
    services::{
        submission::{refresh_receipts, ReceiptList, SubmissionGate},
        ReceiptForm,
    },
    views::{self, Notice, Page},
};

pub mod documents;
pub mod receipts;

/// State shared by every request: the backend and what is on screen.
pub struct AppState {
    pub store: Arc<dyn ReceiptStore>,
    pub receipts: RwLock<ReceiptList>,
    pub submission: SubmissionGate,
    last_created: Mutex<Option<Receipt>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ReceiptStore>) -> Self {
        Self {
            store,
            receipts: RwLock::new(ReceiptList::NotLoaded),
            submission: SubmissionGate::default(),
            last_created: Mutex::new(None),
        }
    }

    pub fn render(&self, form: &ReceiptForm, notice: Option<&Notice>, print_receipt: Option<&str>) -> String {
        let receipts = self.receipts.read().unwrap_or_else(|e| e.into_inner());
        views::render_page(&Page {
            form,
            receipts: &*receipts,
            notice,
            submit_enabled: self.submission.is_idle(),
            print_receipt,
        })
    }

    fn remember_created(&self, receipt: &Receipt) {
        *self.last_created.lock().unwrap_or_else(|e| e.into_inner()) = Some(receipt.clone());
    }

    fn lookup(&self, id: &str) -> Option<Receipt> {
        let displayed = self
            .receipts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .find(id)
            .cloned();
        displayed.or_else(|| {
            self.last_created
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .as_ref()
                .filter(|r| r.id == id)
                .cloned()
        })
    }

    /// Finds a receipt on screen, reloading the list once if it is not there.
    pub async fn find_receipt(&self, id: &str) -> Option<Receipt> {
        if let Some(receipt) = self.lookup(id) {
            return Some(receipt);
        }
        log::info!("Receipt {} not displayed, reloading list", id);
        refresh_receipts(self.store.as_ref(), &self.receipts).await.ok()?;
        self.lookup(id)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(receipts::index).post(receipts::form_action))
        .route("/receipts/:id/download", get(documents::download))
        .route("/receipts/:id/print", get(documents::print))
        .with_state(state)
}
