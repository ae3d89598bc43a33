//! Fisiopay Domain Layer
//!
//! Core data model for the payment-document pipeline: fixed-point money,
//! reference months, document kinds, payment records and their status
//! lifecycles. All monetary values are integers in minor units (centavos);
//! floating point never touches a stored amount.
//!
//! Infrastructure (HTTP, process sandboxing, file storage) lives in the
//! other crates; this one holds the value objects they all share.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod financials;
pub mod money;
pub mod month;
pub mod physiotherapist;
pub mod record;
pub mod status;

// Re-exports for convenience
pub use document::{DocumentKind, UploadedDocument};
pub use financials::ExtractedFinancials;
pub use money::Money;
pub use month::{MonthFormatError, ReferenceMonth};
pub use physiotherapist::{ContractType, Physiotherapist};
pub use record::{ControlId, Payee, PaymentRecord, RecordId};
pub use status::{NotificationStatus, PaymentStatus};
