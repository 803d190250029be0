//! Resource addresses used for ownership checks and notifications.

use std::fmt;
use std::str::FromStr;

use moneylog_shared::types::{LogbookId, TransactionId};
use thiserror::Error;

/// Address of an ownable resource, e.g. `/logbook/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourcePath {
    /// A logbook.
    Logbook(LogbookId),
    /// A transaction.
    Transaction(TransactionId),
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logbook(id) => write!(f, "/logbook/{id}"),
            Self::Transaction(id) => write!(f, "/transaction/{id}"),
        }
    }
}

/// A string that is not a recognised resource path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised resource path: {0}")]
pub struct InvalidResourcePath(pub String);

impl FromStr for ResourcePath {
    type Err = InvalidResourcePath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidResourcePath(s.to_string());
        let mut parts = s.strip_prefix('/').ok_or_else(invalid)?.splitn(3, '/');

        let kind = parts.next().ok_or_else(invalid)?;
        let id = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some_and(|rest| !rest.is_empty()) {
            return Err(invalid());
        }

        match kind {
            "logbook" => id.parse().map(Self::Logbook).map_err(|_| invalid()),
            "transaction" => id.parse().map(Self::Transaction).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// Outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The user may mutate the resource.
    Allow,
    /// The user may not, or the resource does not exist.
    Deny,
}

impl Access {
    /// Returns true for [`Access::Allow`].
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}
