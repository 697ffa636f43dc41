//! Error taxonomy for calendar resolution.
//!
//! Every variant is terminal for the call that produced it. Nothing in this
//! crate retries or substitutes a default on failure.

use std::fmt;

use chrono::NaiveDate;

/// Errors produced by the registry, the snapshot builder and the resolvers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Unknown market / currency identifier.
    NotFound {
        /// "market" | "currency"
        kind: &'static str,
        identifier: String,
    },
    /// `start > end`, a malformed date, or a naive instant.
    InvalidRange(String),
    /// Requested date lies outside the market's coverage window.
    Coverage {
        fin_id: String,
        requested: NaiveDate,
        first: NaiveDate,
        last: NaiveDate,
    },
    /// The snapshot itself is inconsistent (bad rule, cyclic replacement, ...).
    DataIntegrity(String),
}

impl CalendarError {
    /// Stable machine-readable name, used by transports for error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CalendarError::NotFound { .. } => "not_found",
            CalendarError::InvalidRange(_) => "invalid_range",
            CalendarError::Coverage { .. } => "coverage",
            CalendarError::DataIntegrity(_) => "data_integrity",
        }
    }

    pub(crate) fn market_not_found(identifier: &str) -> Self {
        CalendarError::NotFound {
            kind: "market",
            identifier: identifier.to_string(),
        }
    }

    pub(crate) fn currency_not_found(code: &str) -> Self {
        CalendarError::NotFound {
            kind: "currency",
            identifier: code.to_string(),
        }
    }

    pub(crate) fn integrity(msg: impl Into<String>) -> Self {
        CalendarError::DataIntegrity(msg.into())
    }
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::NotFound { kind, identifier } => {
                write!(f, "{kind} '{identifier}' not found")
            }
            CalendarError::InvalidRange(msg) => write!(f, "invalid range: {msg}"),
            CalendarError::Coverage {
                fin_id,
                requested,
                first,
                last,
            } => write!(
                f,
                "{requested} is outside the available dates for {fin_id} \
                 (first_available_date={first}, last_available_date={last})"
            ),
            CalendarError::DataIntegrity(msg) => write!(f, "data integrity: {msg}"),
        }
    }
}

impl std::error::Error for CalendarError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_message_names_bounds() {
        let e = CalendarError::Coverage {
            fin_id: "US.NYSE".to_string(),
            requested: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            first: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            last: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        };
        let msg = e.to_string();
        assert!(msg.contains("first_available_date=2023-01-01"));
        assert!(msg.contains("last_available_date=2025-12-31"));
        assert_eq!(e.kind(), "coverage");
    }
}
