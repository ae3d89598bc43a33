//! Fisiopay Monthly Payment Ledger
//!
//! The aggregate state keyed by reference month: one control per month,
//! owning the payment records of every payee, their monetary values and
//! their status lifecycles. Everything here is in-memory and lock-based;
//! records advance under per-record mutual exclusion so concurrent status
//! changes can never both win.

#![warn(missing_docs)]

pub mod error;
pub mod ledger;

pub use error::LedgerError;
pub use ledger::{ControlSnapshot, ControlSummary, ManualRecordRequest, PaymentLedger};
