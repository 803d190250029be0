//! Input validation for logbook and transaction fields.

use serde_json::Value;

use super::error::LedgerError;

/// Name given to logbooks created without one.
pub const DEFAULT_LOGBOOK_NAME: &str = "New Logbook";

/// Summary given to transactions created without one.
pub const DEFAULT_TRANSACTION_SUMMARY: &str = "New Transaction";

/// Validates a three-letter currency code and lower-cases it.
pub fn normalize_currency(raw: &str) -> Result<String, LedgerError> {
    let code = raw.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_lowercase())
    } else {
        Err(LedgerError::Validation(format!(
            "Currency must be a three-letter code, got {raw:?}"
        )))
    }
}

/// Trims a display name, rejecting empty ones.
pub fn normalize_name(raw: &str, label: &str) -> Result<String, LedgerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Uses `raw` when it is a non-blank string, `default` otherwise.
#[must_use]
pub fn name_or_default(raw: Option<&str>, default: &str) -> String {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Parses an amount in minor units from a JSON integer or integer string.
pub fn parse_amount(value: &Value) -> Result<i64, LedgerError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        LedgerError::Validation(format!(
            "Amount must be an integer number of minor units, got {value}"
        ))
    })
}
