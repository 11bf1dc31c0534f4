#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use pharmacy_receipts::db::{
    models::{NewReceipt, Receipt},
    ReceiptStore, StoreError,
};

/// In-memory backend that assigns ids and timestamps like the hosted one.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Receipt>>,
    pub inserts: AtomicUsize,
    pub fetches: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub fail_insert: AtomicBool,
}

impl MemoryStore {
    pub fn with_receipts(receipts: Vec<Receipt>) -> Self {
        let store = Self::default();
        *store.rows.lock().unwrap() = receipts;
        store
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ReceiptStore for MemoryStore {
    async fn list_receipts(&self) -> Result<Vec<Receipt>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::Fetch("connection refused".to_string()));
        }
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create_receipt(&self, receipt: &NewReceipt) -> Result<Receipt, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Insert("new row violates row-level security policy".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        let created_at = rows
            .iter()
            .map(|r| r.created_at)
            .max()
            .map(|latest| latest + Duration::minutes(1))
            .unwrap_or_else(|| Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        let stored = Receipt {
            id: format!("rcpt-{:04}", rows.len() + 1),
            pharmacy_name: receipt.pharmacy_name.clone(),
            patient_name: receipt.patient_name.clone(),
            items: serde_json::to_value(&receipt.items).unwrap(),
            total: receipt.total,
            created_at,
        };
        rows.push(stored.clone());
        Ok(stored)
    }
}

pub fn receipt(id: &str, pharmacy: &str, patient: &str, minute: u32) -> Receipt {
    Receipt {
        id: id.to_string(),
        pharmacy_name: pharmacy.to_string(),
        patient_name: patient.to_string(),
        items: serde_json::json!([{"name": "Aspirin", "qty": 2, "price": 1.5}]),
        total: 3.0,
        created_at: Utc.with_ymd_and_hms(2024, 4, 30, 8, minute, 0).unwrap(),
    }
}
