use chrono::{DateTime, NaiveDate, Utc};

use crate::{AppError, AppResult};

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn to_date(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}

/// Parse a form-supplied `YYYY-MM-DD` date into epoch milliseconds at UTC midnight.
pub fn date_ms_from_iso(value: &str) -> AppResult<i64> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        AppError::new("VALIDATION/DATE", "Date must be in YYYY-MM-DD format")
            .with_context("value", value.to_string())
            .with_context("parse_error", e.to_string())
    })?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AppError::new("VALIDATION/DATE", "Invalid date"))?;
    Ok(midnight.and_utc().timestamp_millis())
}

/// Format epoch milliseconds back to `YYYY-MM-DD` for reports.
pub fn iso_date_from_ms(ms: i64) -> String {
    to_date(ms).format("%Y-%m-%d").to_string()
}
