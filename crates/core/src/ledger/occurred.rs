//! Parsing of `Occurred` values supplied by clients.

use moneylog_shared::OccurredNullPolicy;
use serde_json::Value;

use super::error::LedgerError;

/// The `"now"` sentinel.
pub const NOW_SENTINEL: &str = "now";

/// A validated request to change a transaction's `Occurred` timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurredUpdate {
    /// Set to the current time.
    Now,
    /// Set to an explicit epoch-seconds timestamp.
    At(i64),
    /// Clear to null.
    Clear,
}

impl OccurredUpdate {
    /// Validates a raw client value.
    ///
    /// Accepts `"now"`, an integer timestamp, or `null` when `policy` is
    /// [`OccurredNullPolicy::Clear`]. Everything else is a validation error.
    pub fn parse(value: &Value, policy: OccurredNullPolicy) -> Result<Self, LedgerError> {
        match value {
            Value::String(s) if s == NOW_SENTINEL => Ok(Self::Now),
            Value::Number(n) => n.as_i64().map(Self::At).ok_or_else(|| {
                LedgerError::Validation(format!("Occurred must be an integer timestamp, got {n}"))
            }),
            Value::Null => match policy {
                OccurredNullPolicy::Clear => Ok(Self::Clear),
                OccurredNullPolicy::Reject => Err(LedgerError::Validation(
                    "Occurred cannot be cleared".to_string(),
                )),
            },
            other => Err(LedgerError::Validation(format!(
                "Occurred must be \"now\", an integer timestamp or null, got {other}"
            ))),
        }
    }

    /// The value to store, given the current time.
    #[must_use]
    pub const fn resolve(self, now: i64) -> Option<i64> {
        match self {
            Self::Now => Some(now),
            Self::At(ts) => Some(ts),
            Self::Clear => None,
        }
    }
}

/// `Occurred` for a new transaction: an integer timestamp if one was given,
/// the current time otherwise.
#[must_use]
pub fn occurred_on_create(value: Option<&Value>, now: i64) -> i64 {
    value.and_then(Value::as_i64).unwrap_or(now)
}
