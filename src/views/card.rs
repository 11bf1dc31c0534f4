use crate::{
    db::models::{MedicineItem, Receipt},
    utils::{format_currency, format_date, receipt_path, Escape},
};

fn medicine_entry(item: &MedicineItem) -> String {
    format!(
        r#"<div class="medicine-item d-flex justify-content-between py-1 border-bottom"><span>{}</span><span>{} &times; {}</span></div>"#,
        Escape(&item.name),
        item.qty,
        format_currency(item.price)
    )
}

fn quantity_entry(item: &MedicineItem) -> String {
    format!(
        r#"<div class="quantity-item d-flex justify-content-between py-1 border-bottom"><span>{}</span><span>{}</span></div>"#,
        Escape(&item.name),
        item.qty
    )
}

fn sub_list(entries: String, empty: &str) -> String {
    if entries.is_empty() {
        format!(r#"<p class="text-muted mb-0">{}</p>"#, empty)
    } else {
        entries
    }
}

/// One receipt in the list, with download and print actions.
pub fn render_card(receipt: &Receipt) -> String {
    let items = receipt.line_items();
    let medicines = sub_list(
        items.iter().map(medicine_entry).collect(),
        "No medicines listed",
    );
    let quantities = sub_list(
        items.iter().map(quantity_entry).collect(),
        "No quantities listed",
    );

    format!(
        r#"<div class="receipt-card card mb-3 shadow-sm">
<div class="card-body">
<div class="d-flex justify-content-between align-items-start mb-3">
<div>
<h5 class="card-title text-primary">{pharmacy}</h5>
<p class="card-text mb-1"><strong>Patient:</strong> {patient}</p>
<p class="card-text text-muted small mb-0">{date}</p>
</div>
<div class="text-end">
<span class="badge bg-success fs-6">{total}</span>
<p class="text-muted small mb-0">ID: {short_id}</p>
</div>
</div>
<div class="row mb-3">
<div class="col-md-6">
<h6 class="text-muted">Medicines</h6>
<div class="medicines-list bg-light p-2 rounded">{medicines}</div>
</div>
<div class="col-md-6">
<h6 class="text-muted">Quantities</h6>
<div class="quantities-list bg-light p-2 rounded">{quantities}</div>
</div>
</div>
<div class="d-flex gap-2">
<a class="btn btn-sm btn-outline-primary flex-fill" href="{download}">Download</a>
<a class="btn btn-sm btn-outline-secondary flex-fill" href="{print}" target="_blank">Print</a>
</div>
</div>
</div>
"#,
        pharmacy = Escape(&receipt.pharmacy_name),
        patient = Escape(&receipt.patient_name),
        date = format_date(receipt.created_at),
        total = format_currency(receipt.total),
        short_id = Escape(receipt.short_id()),
        medicines = medicines,
        quantities = quantities,
        download = receipt_path(&receipt.id, "download"),
        print = receipt_path(&receipt.id, "print"),
    )
}
