//! Error types for the payment ledger

use fisiopay_domain::RecordId;
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// No control is open for the requested month
    #[error("No payment control open for month {0}")]
    ControlNotFound(String),

    /// The record does not exist in the month's control
    #[error("Payment record not found: {0}")]
    RecordNotFound(RecordId),

    /// The requested status change is not a legal transition
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the record currently holds
        from: String,
        /// Status that was requested
        to: String,
    },

    /// Required input is missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// The record cannot be removed
    #[error("Record cannot be removed: {0}")]
    RemovalDenied(String),
}
