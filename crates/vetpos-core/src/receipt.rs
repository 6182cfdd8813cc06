//! # Receipt Numbers
//!
//! `YYYYMMDD-NNNN`: the business day plus that day's sequence, starting at 1.
//! The sequence keeps growing past 9999 (`20261017-10000`).
//!
//! The sequence itself is allocated by the database (one counter row per
//! day); this module only owns the format.

use chrono::NaiveDate;

/// Key of the per-day counter, e.g. `20261017`.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y%m%d").to_string()
}

/// Formats a receipt number from its day and sequence.
///
/// ```rust
/// use chrono::NaiveDate;
/// use vetpos_core::receipt::format_receipt_number;
///
/// let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
/// assert_eq!(format_receipt_number(day, 7), "20261017-0007");
/// ```
pub fn format_receipt_number(day: NaiveDate, sequence: i64) -> String {
    format!("{}-{:04}", day_key(day), sequence)
}

/// Splits a receipt number back into its day key and sequence.
pub fn parse_receipt_number(receipt: &str) -> Option<(NaiveDate, i64)> {
    let (day, seq) = receipt.split_once('-')?;
    let day = NaiveDate::parse_from_str(day, "%Y%m%d").ok()?;
    let seq = seq.parse::<i64>().ok().filter(|s| *s > 0)?;
    Some((day, seq))
}
