use std::sync::{Mutex, RwLock};

use crate::{
    db::{models::Receipt, ReceiptStore, StoreError},
    services::{ReceiptForm, ValidationError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Resetting,
}

/// Tracks the single in-flight submission. The submit control is enabled
/// only while the phase is `Idle`.
#[derive(Debug, Default)]
pub struct SubmissionGate {
    phase: Mutex<SubmissionPhase>,
}

/// Holds the gate out of `Idle`; dropping it re-enables submission.
pub struct SubmissionGuard<'a> {
    gate: &'a SubmissionGate,
}

impl SubmissionGate {
    pub fn phase(&self) -> SubmissionPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == SubmissionPhase::Idle
    }

    /// Moves `Idle -> Validating`, or returns `None` if a submission is already running.
    pub fn begin(&self) -> Option<SubmissionGuard<'_>> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if *phase != SubmissionPhase::Idle {
            return None;
        }
        *phase = SubmissionPhase::Validating;
        Some(SubmissionGuard { gate: self })
    }

    fn set(&self, next: SubmissionPhase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }
}

impl SubmissionGuard<'_> {
    pub fn advance(&self, next: SubmissionPhase) {
        log::debug!("Submission phase -> {:?}", next);
        self.gate.set(next);
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.gate.set(SubmissionPhase::Idle);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Receipt),
    Rejected(ValidationError),
    Failed(StoreError),
    Busy,
}

/// Runs one submission: validate, insert, and reset the form on success.
///
/// Validation failures never reach the store. On a backend failure the form
/// is left exactly as entered.
pub async fn submit_receipt(
    store: &dyn ReceiptStore,
    gate: &SubmissionGate,
    form: &mut ReceiptForm,
) -> SubmitOutcome {
    let Some(guard) = gate.begin() else {
        log::warn!("Submission refused: another submission is in progress");
        return SubmitOutcome::Busy;
    };

    let new_receipt = match form.validate() {
        Ok(receipt) => receipt,
        Err(e) => {
            log::warn!("Receipt rejected, missing: {}", e.missing.join(", "));
            return SubmitOutcome::Rejected(e);
        }
    };

    guard.advance(SubmissionPhase::Submitting);
    match store.create_receipt(&new_receipt).await {
        Ok(receipt) => {
            log::info!("Created receipt {} for {}", receipt.id, receipt.patient_name);
            guard.advance(SubmissionPhase::Resetting);
            form.reset();
            SubmitOutcome::Created(receipt)
        }
        Err(e) => {
            log::error!("Error adding receipt: {}", e);
            SubmitOutcome::Failed(e)
        }
    }
}

/// The receipts currently on screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReceiptList {
    #[default]
    NotLoaded,
    Loaded(Vec<Receipt>),
    Failed(String),
}

impl ReceiptList {
    pub fn find(&self, id: &str) -> Option<&Receipt> {
        match self {
            ReceiptList::Loaded(receipts) => receipts.iter().find(|r| r.id == id),
            _ => None,
        }
    }
}

/// Fetches the full list and replaces what is displayed, success or not.
pub async fn refresh_receipts(
    store: &dyn ReceiptStore,
    list: &RwLock<ReceiptList>,
) -> Result<(), StoreError> {
    let result = store.list_receipts().await;
    let mut displayed = list.write().unwrap_or_else(|e| e.into_inner());
    match result {
        Ok(receipts) => {
            log::info!("Loaded {} receipts", receipts.len());
            *displayed = ReceiptList::Loaded(receipts);
            Ok(())
        }
        Err(e) => {
            log::error!("Error loading receipts: {}", e);
            *displayed = ReceiptList::Failed(e.to_string());
            Err(e)
        }
    }
}
