//! Payment record module - the per-payee entry of a monthly control

use crate::financials::ExtractedFinancials;
use crate::money::Money;
use crate::physiotherapist::ContractType;
use crate::status::{NotificationStatus, PaymentStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a monthly payment control, based on UUIDv7
///
/// UUIDv7 sorts chronologically, which keeps controls listable by creation
/// order without a separate counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(Uuid);

impl ControlId {
    /// Generate a new UUIDv7-based ControlId
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse a ControlId from its string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid control id: {}", e))
    }
}

impl Default for ControlId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a payment record, based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a new UUIDv7-based RecordId
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse a RecordId from its string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid record id: {}", e))
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a payment record pays
///
/// Either a registered physiotherapist or a manually-entered payee; the enum
/// makes the two shapes mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Payee {
    /// A payee from the physiotherapist registry
    #[serde(rename_all = "camelCase")]
    Registered {
        /// Registry identifier
        physiotherapist_id: u32,
    },

    /// A payee entered by hand for this control only
    #[serde(rename_all = "camelCase")]
    Manual {
        /// Payee name
        name: String,
        /// Contact e-mail, when known
        email: Option<String>,
        /// Contract type declared at entry
        contract_type: ContractType,
    },
}

impl Payee {
    /// Whether this is a manual (unregistered) payee
    pub fn is_manual(&self) -> bool {
        matches!(self, Payee::Manual { .. })
    }

    /// Registry id, when the payee is registered
    pub fn physiotherapist_id(&self) -> Option<u32> {
        match self {
            Payee::Registered { physiotherapist_id } => Some(*physiotherapist_id),
            Payee::Manual { .. } => None,
        }
    }
}

/// A payment record - one payee's entry within a monthly control
///
/// Created PENDING/PENDING; values are filled in as documents are uploaded
/// and parsed; statuses only move forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Record identifier
    pub id: RecordId,

    /// Who gets paid
    pub payee: Payee,

    /// Gross value in minor units
    pub gross_value: Money,

    /// Net value in minor units
    pub net_value: Money,

    /// Financial fields of the last parsed RPA, when one was uploaded
    pub financials: Option<ExtractedFinancials>,

    /// Payment lifecycle status
    pub payment_status: PaymentStatus,

    /// Notification lifecycle status
    pub notification_status: NotificationStatus,

    /// Creation time, seconds since the Unix epoch
    pub created_at: u64,

    /// When the payment reached SENT, seconds since the Unix epoch
    pub paid_at: Option<u64>,

    /// When the notification reached SENT, seconds since the Unix epoch
    pub notified_at: Option<u64>,
}

impl PaymentRecord {
    /// Create a new PENDING/PENDING record with zero values
    pub fn new(payee: Payee, created_at: u64) -> Self {
        Self {
            id: RecordId::new(),
            payee,
            gross_value: Money::ZERO,
            net_value: Money::ZERO,
            financials: None,
            payment_status: PaymentStatus::Pending,
            notification_status: NotificationStatus::Pending,
            created_at,
            paid_at: None,
            notified_at: None,
        }
    }
}
