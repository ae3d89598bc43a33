//! Status module - lifecycle state machines for payment records
//!
//! A record carries two orthogonal statuses: one for the payment itself and
//! one for the notification e-mail. Both advance monotonically; there is no
//! transition back to `Pending` once a record has moved on. Corrections are
//! new records, not rewinds.

use serde::{Deserialize, Serialize};

/// Payment status of a record
///
/// Lifecycle: `PENDING → PROCESSING → SENT`, with `PROCESSING → FAILED`
/// as the error branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Created, nothing done yet
    Pending,

    /// Payment is being prepared/executed
    Processing,

    /// Payment went out
    Sent,

    /// Payment attempt failed
    Failed,
}

impl PaymentStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Sent => "SENT",
            PaymentStatus::Failed => "FAILED",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(PaymentStatus::Pending),
            "PROCESSING" => Some(PaymentStatus::Processing),
            "SENT" => Some(PaymentStatus::Sent),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    /// Whether advancing from `self` to `target` is a legal transition
    ///
    /// Only the drawn edges are accepted; same-state, backward and skipping
    /// transitions are all rejected.
    pub fn can_advance(&self, target: PaymentStatus) -> bool {
        matches!(
            (self, target),
            (PaymentStatus::Pending, PaymentStatus::Processing)
                | (PaymentStatus::Processing, PaymentStatus::Sent)
                | (PaymentStatus::Processing, PaymentStatus::Failed)
        )
    }

    /// Whether this status is terminal (no outgoing edges)
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Sent | PaymentStatus::Failed)
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid payment status: {}", s))
    }
}

/// Notification (e-mail) status of a record
///
/// Lifecycle: `PENDING → SENT`, `PENDING → FAILED` (delivery failed
/// outright), `SENT → FAILED` (bounce detected after send). Independent of
/// the payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    /// No notification sent yet
    Pending,

    /// Notification delivered
    Sent,

    /// Delivery failed or bounced
    Failed,
}

impl NotificationStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::Sent => "SENT",
            NotificationStatus::Failed => "FAILED",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(NotificationStatus::Pending),
            "SENT" => Some(NotificationStatus::Sent),
            "FAILED" => Some(NotificationStatus::Failed),
            _ => None,
        }
    }

    /// Whether advancing from `self` to `target` is a legal transition
    pub fn can_advance(&self, target: NotificationStatus) -> bool {
        matches!(
            (self, target),
            (NotificationStatus::Pending, NotificationStatus::Sent)
                | (NotificationStatus::Pending, NotificationStatus::Failed)
                | (NotificationStatus::Sent, NotificationStatus::Failed)
        )
    }
}

impl std::str::FromStr for NotificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid notification status: {}", s))
    }
}
