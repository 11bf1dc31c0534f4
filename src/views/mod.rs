use crate::{
    services::{submission::ReceiptList, ReceiptForm},
    utils::{receipt_path, Escape},
};

pub mod card;
pub mod document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Danger,
}

impl NoticeKind {
    fn class(self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Warning => "warning",
            NoticeKind::Danger => "danger",
        }
    }
}

/// A dismissible message shown above the form.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Danger,
            message: message.into(),
        }
    }
}

/// Everything the single page is projected from.
pub struct Page<'a> {
    pub form: &'a ReceiptForm,
    pub receipts: &'a ReceiptList,
    pub notice: Option<&'a Notice>,
    pub submit_enabled: bool,
    /// Receipt whose print view opens as soon as the page loads.
    pub print_receipt: Option<&'a str>,
}

fn render_notice(notice: &Notice) -> String {
    format!(
        r#"<div class="alert alert-{} alert-dismissible fade show" role="alert">{}<button type="button" class="btn-close" data-bs-dismiss="alert" aria-label="Close"></button></div>
<script>setTimeout(() => document.querySelectorAll('#alert-container .alert').forEach(a => a.remove()), 5000);</script>"#,
        notice.kind.class(),
        Escape(&notice.message)
    )
}

fn render_rows(form: &ReceiptForm) -> String {
    form.rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            format!(
                r#"<div class="medicine-item-row row mb-2">
<div class="col-md-5 mb-2 mb-md-0"><input type="text" class="form-control medicine-name" name="name_{i}" placeholder="Medicine name" value="{name}"></div>
<div class="col-md-2 mb-2 mb-md-0"><input type="number" class="form-control medicine-qty" name="qty_{i}" placeholder="Qty" min="1" value="{qty}" onchange="recalculate(this)"></div>
<div class="col-md-3 mb-2 mb-md-0"><div class="input-group"><span class="input-group-text">$</span><input type="number" class="form-control medicine-price" name="price_{i}" placeholder="Price" step="0.01" min="0" value="{price}" onchange="recalculate(this)"></div></div>
<div class="col-md-2"><button type="submit" class="btn btn-outline-danger w-100" name="action" value="remove_row:{i}">Remove</button></div>
</div>
"#,
                i = i,
                name = Escape(&row.name),
                qty = Escape(&row.qty),
                price = Escape(&row.price),
            )
        })
        .collect()
}

pub fn render_form(form: &ReceiptForm, submit_enabled: bool) -> String {
    let disabled = if submit_enabled { "" } else { " disabled" };
    let label = if submit_enabled { "Add Receipt" } else { "Adding..." };

    format!(
        r#"<form id="receipt-form" method="post" action="/">
<button type="submit" name="action" value="submit" hidden{disabled}></button>
<div class="mb-3"><label class="form-label" for="pharmacy-name">Pharmacy name</label><input type="text" class="form-control" id="pharmacy-name" name="pharmacy_name" value="{pharmacy}"></div>
<div class="mb-3"><label class="form-label" for="patient-name">Patient name</label><input type="text" class="form-control" id="patient-name" name="patient_name" value="{patient}"></div>
<h6>Medicines</h6>
<div id="medicine-items-container">
{rows}</div>
<button type="submit" class="btn btn-outline-primary btn-sm mb-3" name="action" value="add_row">Add medicine</button>
<button type="submit" class="d-none" id="recalculate" name="action" value="recalculate">Recalculate</button>
<div class="mb-3"><label class="form-label" for="total">Total</label><div class="input-group"><span class="input-group-text">$</span><input type="text" class="form-control" id="total" value="{total}" readonly></div></div>
<button type="submit" class="btn btn-primary w-100" id="submit-btn" name="action" value="submit"{disabled}>{label}</button>
</form>
<script>function recalculate(input) {{ input.form.requestSubmit(document.getElementById('recalculate')); }}</script>
"#,
        pharmacy = Escape(&form.pharmacy_name),
        patient = Escape(&form.patient_name),
        rows = render_rows(form),
        total = form.total_display(),
        disabled = disabled,
        label = label,
    )
}

pub fn render_list(receipts: &ReceiptList) -> String {
    match receipts {
        ReceiptList::NotLoaded => {
            r#"<p class="text-muted text-center py-4">Loading receipts...</p>"#.to_string()
        }
        ReceiptList::Failed(_) => {
            r#"<p class="text-danger text-center py-4">Failed to load receipts.</p>"#.to_string()
        }
        ReceiptList::Loaded(list) if list.is_empty() => {
            r#"<p class="text-muted text-center py-4">No receipts found.</p>"#.to_string()
        }
        ReceiptList::Loaded(list) => list.iter().map(card::render_card).collect(),
    }
}

pub fn render_page(page: &Page<'_>) -> String {
    let notice = page.notice.map(render_notice).unwrap_or_default();
    let auto_print = page
        .print_receipt
        .map(|id| {
            format!(
                r#"<div class="container pb-4"><a id="auto-print" class="btn btn-outline-secondary" href="{}" target="_blank">Print receipt</a></div>
<script>window.open(document.getElementById('auto-print').href, '_blank');</script>"#,
                receipt_path(id, "print")
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Pharmacy Receipts</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css">
</head>
<body class="bg-light">
<div class="container py-4">
<h1 class="mb-4">Pharmacy Receipts</h1>
<div id="alert-container">{notice}</div>
<div class="row">
<div class="col-lg-5 mb-4"><div class="card shadow-sm"><div class="card-body">
{form}</div></div></div>
<div class="col-lg-7"><div id="receipts-list">
{list}</div></div>
</div>
</div>
{auto_print}
</body>
</html>
"#,
        notice = notice,
        form = render_form(page.form, page.submit_enabled),
        list = render_list(page.receipts),
        auto_print = auto_print,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{LineItemRow, ReceiptForm};

    #[test]
    fn failed_list_says_so() {
        let html = render_list(&ReceiptList::Failed("offline".to_string()));
        assert!(html.contains("Failed to load receipts."));
        assert!(render_list(&ReceiptList::Loaded(Vec::new())).contains("No receipts found."));
    }

    #[test]
    fn form_round_trips_typed_values_escaped() {
        let form = ReceiptForm::with_rows(
            "Acme \"Central\"".to_string(),
            "Jo".to_string(),
            vec![LineItemRow {
                name: "Aspirin".to_string(),
                qty: "2".to_string(),
                price: "1.5".to_string(),
            }],
        );
        let html = render_form(&form, true);
        assert!(html.contains(r#"value="Acme &quot;Central&quot;""#));
        assert!(html.contains(r#"name="name_0" placeholder="Medicine name" value="Aspirin""#));
        assert!(html.contains(r#"value="remove_row:0""#));
        assert!(html.contains(r#"id="total" value="3.00""#));
        assert!(html.contains(">Add Receipt</button>"));
    }

    #[test]
    fn enter_key_default_button_submits() {
        let form = ReceiptForm::with_rows(
            "Acme".to_string(),
            "Jo".to_string(),
            vec![LineItemRow::default(), LineItemRow::default()],
        );
        let html = render_form(&form, true);
        let first_submit = &html[html.find(r#"type="submit""#).unwrap()..];
        let value_at = first_submit.find("value=\"").unwrap() + "value=\"".len();
        let value = &first_submit[value_at..];
        let value = &value[..value.find('"').unwrap()];

        assert_eq!(value, "submit");
        assert!(html.find(r#"type="submit""#) < html.find("remove_row:"));
    }

    #[test]
    fn busy_form_disables_submit() {
        let html = render_form(&ReceiptForm::default(), false);
        assert!(html.contains(r#"value="submit" disabled>Adding...</button>"#));
    }

    #[test]
    fn page_carries_notice_and_auto_print() {
        let form = ReceiptForm::default();
        let notice = Notice::success("Receipt added successfully!");
        let html = render_page(&Page {
            form: &form,
            receipts: &ReceiptList::Loaded(Vec::new()),
            notice: Some(&notice),
            submit_enabled: true,
            print_receipt: Some("r-1"),
        });
        assert!(html.contains("alert-success"));
        assert!(html.contains("Receipt added successfully!"));
        assert!(html.contains(r#"href="/receipts/r-1/print""#));
    }
}
