/// Date helpers shared by the search components
use chrono::NaiveDate;

/// Canonical expiry format in the symbol master, e.g. "27-JAN-26"
const EXPIRY_FORMAT: &str = "%d-%b-%y";

/// Parse an expiry date for sorting. Missing or unparseable dates sort last.
pub fn parse_expiry_date(expiry: Option<&str>) -> NaiveDate {
    match expiry {
        Some(text) => NaiveDate::parse_from_str(text, EXPIRY_FORMAT).unwrap_or(NaiveDate::MAX),
        None => NaiveDate::MAX,
    }
}
