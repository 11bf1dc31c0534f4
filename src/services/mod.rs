use thiserror::Error;

use crate::{
    db::models::{MedicineItem, NewReceipt},
    utils::parse_number,
};

pub mod submission;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("At least one medicine item is required")]
    LastRow,
    #[error("No medicine row at position {0}")]
    NoSuchRow(usize),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Please fill in all required fields.")]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// One editable medicine row. Fields hold the raw text as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemRow {
    pub name: String,
    pub qty: String,
    pub price: String,
}

impl Default for LineItemRow {
    fn default() -> Self {
        Self {
            name: String::new(),
            qty: "1".to_string(),
            price: String::new(),
        }
    }
}

impl LineItemRow {
    /// A row with every field empty, as posted before any edits apply.
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            qty: String::new(),
            price: String::new(),
        }
    }

    /// The row as a stored item, if every field is usable.
    fn to_item(&self) -> Option<MedicineItem> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let qty = parse_number(&self.qty)?.trunc();
        let price = parse_number(&self.price)?;
        if qty < 1.0 || qty > f64::from(u32::MAX) || price < 0.0 {
            return None;
        }
        Some(MedicineItem {
            name: name.to_string(),
            qty: qty as u32,
            price,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    Name,
    Qty,
    Price,
}

/// The receipt entry form: two names and an ordered, never-empty list of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptForm {
    pub pharmacy_name: String,
    pub patient_name: String,
    rows: Vec<LineItemRow>,
}

impl Default for ReceiptForm {
    fn default() -> Self {
        Self {
            pharmacy_name: String::new(),
            patient_name: String::new(),
            rows: vec![LineItemRow::default()],
        }
    }
}

impl ReceiptForm {
    /// Builds a form from posted rows. An empty row list gets one blank row.
    pub fn with_rows(pharmacy_name: String, patient_name: String, rows: Vec<LineItemRow>) -> Self {
        let mut form = Self {
            pharmacy_name,
            patient_name,
            rows,
        };
        if form.rows.is_empty() {
            form.rows.push(LineItemRow::default());
        }
        form
    }

    pub fn rows(&self) -> &[LineItemRow] {
        &self.rows
    }

    pub fn add_row(&mut self) {
        self.rows.push(LineItemRow::default());
    }

    pub fn remove_row(&mut self, index: usize) -> Result<(), FormError> {
        if index >= self.rows.len() {
            return Err(FormError::NoSuchRow(index));
        }
        if self.rows.len() == 1 {
            return Err(FormError::LastRow);
        }
        self.rows.remove(index);
        Ok(())
    }

    pub fn update_row(&mut self, index: usize, field: RowField, value: &str) -> Result<(), FormError> {
        let row = self.rows.get_mut(index).ok_or(FormError::NoSuchRow(index))?;
        let target = match field {
            RowField::Name => &mut row.name,
            RowField::Qty => &mut row.qty,
            RowField::Price => &mut row.price,
        };
        *target = value.to_string();
        Ok(())
    }

    pub fn total(&self) -> f64 {
        calculate_total(&self.rows)
    }

    /// The total as shown in the read-only total field.
    pub fn total_display(&self) -> String {
        format_total(self.total())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Assembles the insert payload, or explains what is missing.
    ///
    /// Rows that are incomplete are left out of the item list; the total is
    /// the displayed value, which still counts them.
    pub fn validate(&self) -> Result<NewReceipt, ValidationError> {
        let mut missing = Vec::new();
        let pharmacy_name = self.pharmacy_name.trim();
        let patient_name = self.patient_name.trim();
        if pharmacy_name.is_empty() {
            missing.push("pharmacy name");
        }
        if patient_name.is_empty() {
            missing.push("patient name");
        }

        let items: Vec<MedicineItem> = self.rows.iter().filter_map(LineItemRow::to_item).collect();
        if items.is_empty() {
            missing.push("medicine items");
        }

        let total = parse_number(&self.total_display());
        if total.is_none() {
            missing.push("total");
        }

        match total {
            Some(total) if missing.is_empty() => Ok(NewReceipt {
                pharmacy_name: pharmacy_name.to_string(),
                patient_name: patient_name.to_string(),
                items,
                total,
            }),
            _ => Err(ValidationError { missing }),
        }
    }
}

/// Sums quantity × price across rows, counting unparseable fields as zero.
pub fn calculate_total(rows: &[LineItemRow]) -> f64 {
    rows.iter()
        .map(|row| parse_number(&row.qty).unwrap_or(0.0) * parse_number(&row.price).unwrap_or(0.0))
        .sum()
}

pub fn format_total(total: f64) -> String {
    format!("{:.2}", total)
}
