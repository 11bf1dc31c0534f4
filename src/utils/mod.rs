use chrono::{DateTime, Utc};
use std::fmt;

/// Helper function to format a receipt timestamp
///
/// This function takes a `DateTime<Utc>` and formats it in the short US style
/// used throughout the receipt views, e.g. "May 1, 2024, 09:05 AM".
///
/// # Arguments
///
/// * `date` - The timestamp assigned by the backend
///
/// # Returns
///
/// A `String` containing the formatted date and time
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y, %I:%M %p").to_string()
}

/// Helper function to format an amount as US dollars
///
/// Rounds to whole cents and groups thousands, so `1234.5` becomes
/// `"$1,234.50"` and `-1.5` becomes `"-$1.50"`.
///
/// # Arguments
///
/// * `amount` - The amount in dollars
///
/// # Returns
///
/// A `String` with the currency-formatted amount
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Parses a form field as a number, `None` when blank, malformed or non-finite.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Link to a per-receipt action, with the id percent-encoded as one path segment.
pub fn receipt_path(id: &str, action: &str) -> String {
    format!("/receipts/{}/{}", urlencoding::encode(id), action)
}

/// `Content-Disposition` value for an attachment.
///
/// Non-ASCII or quote characters are dropped from the plain `filename`
/// and the exact name is carried in the RFC 5987 `filename*` parameter.
pub fn attachment_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .filter(|c| *c == ' ' || (c.is_ascii_graphic() && *c != '"' && *c != '\\'))
        .collect();
    if fallback == file_name {
        format!("attachment; filename=\"{}\"", file_name)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(file_name)
        )
    }
}

/// Wraps user-supplied text so it is HTML-escaped when formatted.
///
/// Every piece of receipt data that reaches a template goes through this.
pub struct Escape<'a>(pub &'a str);

impl fmt::Display for Escape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut last = 0;
        for (idx, ch) in self.0.char_indices() {
            let replacement = match ch {
                '&' => "&amp;",
                '<' => "&lt;",
                '>' => "&gt;",
                '"' => "&quot;",
                '\'' => "&#39;",
                _ => continue,
            };
            f.write_str(&self.0[last..idx])?;
            f.write_str(replacement)?;
            last = idx + ch.len_utf8();
        }
        f.write_str(&self.0[last..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn currency_uses_cents_and_grouping() {
        assert_eq!(format_currency(3.0), "$3.00");
        assert_eq!(format_currency(1.5), "$1.50");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(-1.5), "-$1.50");
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn date_is_short_us_style() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 0).unwrap();
        assert_eq!(format_date(date), "May 1, 2024, 09:05 AM");

        let evening = Utc.with_ymd_and_hms(2023, 12, 24, 18, 30, 0).unwrap();
        assert_eq!(format_date(evening), "Dec 24, 2023, 06:30 PM");
    }

    #[test]
    fn numbers_parse_leniently_but_reject_garbage() {
        assert_eq!(parse_number(" 2 "), Some(2.0));
        assert_eq!(parse_number("1.25"), Some(1.25));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn receipt_paths_encode_the_id() {
        assert_eq!(receipt_path("r-42", "print"), "/receipts/r-42/print");
        assert_eq!(
            receipt_path("a/b ü", "download"),
            "/receipts/a%2Fb%20%C3%BC/download"
        );
    }

    #[test]
    fn disposition_header_stays_ascii() {
        assert_eq!(
            attachment_disposition("receipt-r-42.html"),
            "attachment; filename=\"receipt-r-42.html\""
        );

        let header = attachment_disposition("receipt-é\"1.txt");
        assert!(header.is_ascii());
        assert_eq!(
            header,
            "attachment; filename=\"receipt-1.txt\"; filename*=UTF-8''receipt-%C3%A9%221.txt"
        );
    }

    #[test]
    fn escape_neutralises_markup() {
        assert_eq!(
            Escape("<script>alert('x') & \"y\"</script>").to_string(),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
        assert_eq!(Escape("Paracétamol 500mg").to_string(), "Paracétamol 500mg");
    }
}
