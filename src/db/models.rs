use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One medicine entry on a receipt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MedicineItem {
    pub name: String,
    pub qty: u32,
    pub price: f64,
}

impl MedicineItem {
    pub fn line_total(&self) -> f64 {
        f64::from(self.qty) * self.price
    }
}

/// A receipt as stored by the backend.
///
/// `items` is kept as raw JSON because older rows hold the list as a
/// JSON-encoded string rather than an array. Use [`Receipt::line_items`]
/// to read it.
///
/// Display fields decode leniently so one odd row cannot fail the whole
/// list: null names become empty, a null or missing total becomes zero, and
/// an unreadable timestamp becomes the Unix epoch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Receipt {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pharmacy_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub patient_name: String,
    #[serde(default)]
    pub items: Value,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: f64,
    #[serde(default = "unknown_timestamp", deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// The insert payload: a receipt before the backend assigns `id` and `created_at`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewReceipt {
    pub pharmacy_name: String,
    pub patient_name: String,
    pub items: Vec<MedicineItem>,
    pub total: f64,
}

#[derive(Error, Debug)]
#[error("Malformed item list: {0}")]
pub struct ParseError(#[from] serde_json::Error);

impl Receipt {
    /// Resolves the stored item list, whichever form it was saved in.
    ///
    /// Anything that does not decode to a list of items yields an empty list.
    pub fn line_items(&self) -> Vec<MedicineItem> {
        match &self.items {
            Value::String(text) => decode_items(text),
            Value::Array(_) => match serde_json::from_value(self.items.clone()) {
                Ok(items) => items,
                Err(e) => {
                    log::warn!("Receipt {} has unreadable items: {}", self.id, e);
                    Vec::new()
                }
            },
            _ => Vec::new(),
        }
    }

    /// First eight characters of the id, for compact display.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}

pub fn encode_items(items: &[MedicineItem]) -> String {
    // A Vec of plain structs with string keys always serializes.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

pub fn parse_items(text: &str) -> Result<Vec<MedicineItem>, ParseError> {
    Ok(serde_json::from_str(text)?)
}

/// Lenient counterpart of [`parse_items`]: malformed input becomes an empty list.
pub fn decode_items(text: &str) -> Vec<MedicineItem> {
    parse_items(text).unwrap_or_else(|e| {
        log::warn!("Dropping malformed item list: {}", e);
        Vec::new()
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(amount.filter(|n| n.is_finite()).unwrap_or_else(|| {
        log::warn!("Unreadable receipt total, showing 0");
        0.0
    }))
}

fn unknown_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Accepts RFC 3339 as well as timezone-less `timestamp` columns, read as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(parse_timestamp).unwrap_or_else(|| {
        log::warn!("Unreadable receipt timestamp {}", value);
        unknown_timestamp()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn aspirin() -> MedicineItem {
        MedicineItem {
            name: "Aspirin".to_string(),
            qty: 2,
            price: 1.5,
        }
    }

    fn receipt_with_items(items: Value) -> Receipt {
        serde_json::from_value(json!({
            "id": "3f2a9c1e-77aa-4b1d-9e0f-0123456789ab",
            "pharmacy_name": "Acme",
            "patient_name": "Jo",
            "items": items,
            "total": 3.0,
            "created_at": "2024-05-01T09:05:00+00:00"
        }))
        .unwrap()
    }

    #[test]
    fn items_survive_text_encoding() {
        let items = vec![
            aspirin(),
            MedicineItem {
                name: "Metformin 500mg".to_string(),
                qty: 30,
                price: 0.25,
            },
        ];
        let encoded = encode_items(&items);
        assert_eq!(parse_items(&encoded).unwrap(), items);
    }

    #[test]
    fn malformed_items_decode_to_empty() {
        assert!(parse_items("[{\"name\":").is_err());
        assert!(decode_items("[{\"name\":").is_empty());
        assert!(decode_items("not json").is_empty());
    }

    #[test]
    fn line_items_reads_array_and_string_forms() {
        let from_array = receipt_with_items(json!([{"name": "Aspirin", "qty": 2, "price": 1.5}]));
        assert_eq!(from_array.line_items(), vec![aspirin()]);

        let from_text =
            receipt_with_items(json!("[{\"name\":\"Aspirin\",\"qty\":2,\"price\":1.5}]"));
        assert_eq!(from_text.line_items(), vec![aspirin()]);

        assert!(receipt_with_items(json!("garbage")).line_items().is_empty());
        assert!(receipt_with_items(json!({"name": "Aspirin"})).line_items().is_empty());
        assert!(receipt_with_items(Value::Null).line_items().is_empty());
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let receipt: Receipt = serde_json::from_value(json!({
            "id": 42,
            "pharmacy_name": "Acme",
            "patient_name": "Jo",
            "items": [],
            "total": 0.0,
            "created_at": "2024-05-01T09:05:00Z"
        }))
        .unwrap();
        assert_eq!(receipt.id, "42");
        assert_eq!(receipt.short_id(), "42");
    }

    #[test]
    fn odd_rows_still_decode() {
        let receipts: Vec<Receipt> = serde_json::from_value(json!([
            {
                "id": "plain",
                "pharmacy_name": "Acme",
                "patient_name": "Jo",
                "items": [],
                "total": 3.0,
                "created_at": "2024-05-01T09:05:00+02:00"
            },
            {
                "id": "naive",
                "pharmacy_name": null,
                "patient_name": "Sam",
                "items": [],
                "total": null,
                "created_at": "2024-05-01 09:05:00.25"
            },
            {
                "id": "text-total",
                "pharmacy_name": "Acme",
                "patient_name": "Lee",
                "total": "12.40",
                "created_at": "yesterday"
            }
        ]))
        .unwrap();

        assert_eq!(receipts.len(), 3);
        assert_eq!(receipts[0].created_at.to_rfc3339(), "2024-05-01T07:05:00+00:00");
        assert_eq!(receipts[1].pharmacy_name, "");
        assert_eq!(receipts[1].total, 0.0);
        assert_eq!(
            receipts[1].created_at,
            parse_timestamp("2024-05-01T09:05:00.25Z").unwrap()
        );
        assert_eq!(receipts[2].total, 12.4);
        assert_eq!(receipts[2].created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert!(receipts[2].line_items().is_empty());
    }

    #[test]
    fn missing_total_and_timestamp_take_defaults() {
        let receipt: Receipt = serde_json::from_value(json!({
            "id": "bare",
            "pharmacy_name": "Acme",
            "patient_name": "Jo"
        }))
        .unwrap();
        assert_eq!(receipt.total, 0.0);
        assert_eq!(receipt.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn short_id_truncates_to_eight_chars() {
        let receipt = receipt_with_items(json!([]));
        assert_eq!(receipt.short_id(), "3f2a9c1e");
    }

    #[test]
    fn line_total_multiplies_quantity_and_price() {
        assert_eq!(aspirin().line_total(), 3.0);
    }
}
