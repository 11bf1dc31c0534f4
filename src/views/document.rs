use std::fmt::Write;

use crate::{
    db::models::{MedicineItem, Receipt},
    utils::{format_currency, format_date, Escape},
};

/// Output format of a generated receipt document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Html,
    Text,
}

impl DocumentFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Html => "html",
            DocumentFormat::Text => "txt",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DocumentFormat::Html => "text/html; charset=utf-8",
            DocumentFormat::Text => "text/plain; charset=utf-8",
        }
    }
}

pub fn file_name(receipt: &Receipt, format: DocumentFormat) -> String {
    format!("receipt-{}.{}", receipt.id, format.extension())
}

pub fn render(receipt: &Receipt, format: DocumentFormat) -> String {
    match format {
        DocumentFormat::Html => render_html(receipt),
        DocumentFormat::Text => render_text(receipt),
    }
}

const DOCUMENT_STYLE: &str = "\
body { font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }
.header { text-align: center; border-bottom: 2px solid #333; padding-bottom: 10px; margin-bottom: 20px; }
.receipt-info { display: flex; justify-content: space-between; margin-bottom: 20px; }
.info-item { margin-bottom: 5px; }
table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }
.total { text-align: right; font-weight: bold; font-size: 1.2em; }
.footer { text-align: center; margin-top: 30px; padding-top: 10px; border-top: 1px solid #ddd; }
";

fn item_row(item: &MedicineItem) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        Escape(&item.name),
        item.qty,
        format_currency(item.price),
        format_currency(item.line_total())
    )
}

/// Self-contained HTML receipt, used for both download and print.
pub fn render_html(receipt: &Receipt) -> String {
    render_html_with_script(receipt, None)
}

/// The HTML receipt with `window.print()` run on load.
pub fn render_printable(receipt: &Receipt) -> String {
    render_html_with_script(receipt, Some("window.addEventListener('load', () => window.print());"))
}

fn render_html_with_script(receipt: &Receipt, script: Option<&str>) -> String {
    let rows: String = receipt.line_items().iter().map(item_row).collect();
    let pharmacy = Escape(&receipt.pharmacy_name);

    let mut html = String::new();
    // Writing into a String cannot fail.
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Receipt - {pharmacy}</title>
<style>
{style}</style>
</head>
<body>
<div class="header">
<h1>{pharmacy}</h1>
<p>Receipt</p>
</div>
<div class="receipt-info">
<div>
<div class="info-item"><strong>Patient:</strong> {patient}</div>
<div class="info-item"><strong>Date:</strong> {date}</div>
</div>
<div>
<div class="info-item"><strong>Receipt ID:</strong> {id}</div>
</div>
</div>
<table>
<thead>
<tr><th>Item</th><th>Quantity</th><th>Price</th><th>Total</th></tr>
</thead>
<tbody>
{rows}
</tbody>
</table>
<div class="total">Total: {total}</div>
<div class="footer">
<p>Thank you for your business!</p>
<p>This is a computer generated receipt</p>
</div>
"#,
        pharmacy = pharmacy,
        style = DOCUMENT_STYLE,
        patient = Escape(&receipt.patient_name),
        date = format_date(receipt.created_at),
        id = Escape(&receipt.id),
        rows = rows,
        total = format_currency(receipt.total),
    );
    if let Some(script) = script {
        let _ = writeln!(html, "<script>{}</script>", script);
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// Plain-text receipt, one `name | qty | price | line total` line per item.
pub fn render_text(receipt: &Receipt) -> String {
    let mut lines = vec![
        receipt.pharmacy_name.clone(),
        "Receipt".to_string(),
        format!("Patient: {}", receipt.patient_name),
        format!("Date: {}", format_date(receipt.created_at)),
        format!("Receipt ID: {}", receipt.id),
        String::new(),
        "Item | Quantity | Price | Total".to_string(),
    ];
    lines.extend(receipt.line_items().iter().map(|item| {
        format!(
            "{} | {} | {} | {}",
            item.name,
            item.qty,
            format_currency(item.price),
            format_currency(item.line_total())
        )
    }));
    lines.push(String::new());
    lines.push(format!("Total: {}", format_currency(receipt.total)));
    lines.push(String::new());
    lines.push("Thank you for your business!".to_string());

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn acme_receipt() -> Receipt {
        serde_json::from_value(json!({
            "id": "3f2a9c1e-77aa-4b1d-9e0f-0123456789ab",
            "pharmacy_name": "Acme",
            "patient_name": "Jo",
            "items": [{"name": "Aspirin", "qty": 2, "price": 1.5}],
            "total": 3.0,
            "created_at": "2024-05-01T09:05:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn text_document_lists_item_breakdown_and_total() {
        let text = render_text(&acme_receipt());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.contains(&"Aspirin | 2 | $1.50 | $3.00"));
        assert!(lines.contains(&"Total: $3.00"));
        assert!(lines.contains(&"Patient: Jo"));
        assert!(lines.contains(&"Date: May 1, 2024, 09:05 AM"));
    }

    #[test]
    fn html_document_has_table_row_and_total() {
        let html = render_html(&acme_receipt());
        assert!(html.contains("<title>Receipt - Acme</title>"));
        assert!(html.contains("<tr><td>Aspirin</td><td>2</td><td>$1.50</td><td>$3.00</td></tr>"));
        assert!(html.contains("Total: $3.00"));
        assert!(html.contains("3f2a9c1e-77aa-4b1d-9e0f-0123456789ab"));
        assert!(!html.contains("window.print"));
    }

    #[test]
    fn printable_document_opens_the_print_dialog() {
        assert!(render_printable(&acme_receipt()).contains("window.print()"));
    }

    #[test]
    fn user_text_is_escaped() {
        let mut receipt = acme_receipt();
        receipt.patient_name = "<img src=x onerror=alert(1)>".to_string();
        receipt.items = json!([{"name": "</td><script>", "qty": 1, "price": 1.0}]);

        let html = render_html(&receipt);
        assert!(!html.contains("<img"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    }

    #[test]
    fn malformed_items_render_an_empty_table() {
        let mut receipt = acme_receipt();
        receipt.items = json!("[{broken");
        let html = render_html(&receipt);
        assert!(html.contains("<tbody>\n\n</tbody>"));
        assert!(html.contains("Total: $3.00"));
    }

    #[test]
    fn file_name_uses_receipt_id() {
        let receipt = acme_receipt();
        assert_eq!(
            file_name(&receipt, DocumentFormat::Html),
            "receipt-3f2a9c1e-77aa-4b1d-9e0f-0123456789ab.html"
        );
        assert_eq!(
            file_name(&receipt, DocumentFormat::Text),
            "receipt-3f2a9c1e-77aa-4b1d-9e0f-0123456789ab.txt"
        );
    }
}
