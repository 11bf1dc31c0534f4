use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use crate::{
    handlers::AppState,
    services::{
        submission::{refresh_receipts, submit_receipt, SubmitOutcome},
        LineItemRow, ReceiptForm, RowField,
    },
    views::Notice,
};

const LOAD_FAILED: &str = "Failed to load receipts. Please try again.";

/// What the user pressed when the form was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    AddRow,
    RemoveRow(usize),
    Recalculate,
    Submit,
}

impl FormAction {
    fn parse(value: &str) -> Self {
        match value {
            "add_row" => FormAction::AddRow,
            "submit" => FormAction::Submit,
            other => other
                .strip_prefix("remove_row:")
                .and_then(|i| i.parse().ok())
                .map(FormAction::RemoveRow)
                .unwrap_or(FormAction::Recalculate),
        }
    }
}

/// Rebuilds the form from posted fields. Rows come as `name_<i>`,
/// `qty_<i>` and `price_<i>` and keep the order of their indices.
pub fn parse_form(fields: &[(String, String)]) -> (ReceiptForm, FormAction) {
    let mut pharmacy_name = String::new();
    let mut patient_name = String::new();
    let mut action = FormAction::Recalculate;
    let mut edits: Vec<(usize, RowField, &str)> = Vec::new();

    for (key, value) in fields {
        match key.as_str() {
            "pharmacy_name" => pharmacy_name = value.clone(),
            "patient_name" => patient_name = value.clone(),
            "action" => action = FormAction::parse(value),
            _ => {
                let Some((field, index)) = key.split_once('_') else {
                    continue;
                };
                let field = match field {
                    "name" => RowField::Name,
                    "qty" => RowField::Qty,
                    "price" => RowField::Price,
                    _ => continue,
                };
                if let Ok(index) = index.parse::<usize>() {
                    edits.push((index, field, value.as_str()));
                }
            }
        }
    }

    // Posted indices may have gaps; rows are laid out in index order.
    let positions: BTreeMap<usize, usize> = edits
        .iter()
        .map(|(index, _, _)| *index)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .enumerate()
        .map(|(position, index)| (index, position))
        .collect();

    let mut form = ReceiptForm::with_rows(
        pharmacy_name,
        patient_name,
        vec![LineItemRow::blank(); positions.len()],
    );
    for (index, field, value) in edits {
        if let Err(e) = form.update_row(positions[&index], field, value) {
            log::warn!("Ignoring posted field for row {}: {}", index, e);
        }
    }
    (form, action)
}

#[derive(Deserialize, Debug, Default)]
pub struct IndexQuery {
    /// Set by the redirect after a receipt is added.
    print: Option<String>,
}

/// Page load: fetch the list and show an empty form.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IndexQuery>,
) -> Html<String> {
    log::info!("Loading receipts page");
    let loaded = refresh_receipts(state.store.as_ref(), &state.receipts).await;

    let created = query.print.filter(|id| state.lookup(id).is_some());
    let notice = match (&loaded, &created) {
        (Err(_), _) => Some(Notice::danger(LOAD_FAILED)),
        (Ok(()), Some(_)) => Some(Notice::success("Receipt added successfully!")),
        (Ok(()), None) => None,
    };

    Html(state.render(&ReceiptForm::default(), notice.as_ref(), created.as_deref()))
}

/// Every form button posts here. A created receipt redirects to the page
/// load, so reloading cannot insert it twice; anything else re-renders the
/// posted form.
pub async fn form_action(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let (mut form, action) = parse_form(&fields);
    log::info!("Received form action {:?}", action);

    let notice = match action {
        FormAction::AddRow => {
            form.add_row();
            None
        }
        FormAction::RemoveRow(index) => form
            .remove_row(index)
            .err()
            .map(|e| Notice::warning(e.to_string())),
        FormAction::Recalculate => None,
        FormAction::Submit => {
            match submit_receipt(state.store.as_ref(), &state.submission, &mut form).await {
                SubmitOutcome::Created(receipt) => {
                    state.remember_created(&receipt);
                    let target = format!("/?print={}", urlencoding::encode(&receipt.id));
                    return Redirect::to(&target).into_response();
                }
                SubmitOutcome::Rejected(e) => Some(Notice::danger(e.to_string())),
                SubmitOutcome::Failed(e) => Some(Notice::danger(e.to_string())),
                SubmitOutcome::Busy => Some(Notice::warning(
                    "A receipt is already being added. Please wait.",
                )),
            }
        }
    };

    Html(state.render(&form, notice.as_ref(), None)).into_response()
}
