//! Ledger implementation
//!
//! Controls live in a `RwLock` map keyed by reference month; each record's
//! mutable state sits behind its own `Mutex`, which is what guarantees
//! that two concurrent advances past the same state produce exactly one
//! winner. Lock order is always controls -> records -> record, and no lock
//! is held across anything that blocks.

use crate::error::LedgerError;
use fisiopay_domain::{
    ContractType, ControlId, ExtractedFinancials, Money, NotificationStatus, Payee,
    PaymentRecord, PaymentStatus, Physiotherapist, RecordId, ReferenceMonth,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Request to add a manually-entered payment record
///
/// The `manual*` aliases accept the field names legacy clients send.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualRecordRequest {
    /// Payee name (required, non-blank)
    #[serde(alias = "manualName")]
    pub name: String,

    /// Contact e-mail, when known
    #[serde(default, alias = "manualEmail")]
    pub email: Option<String>,

    /// Declared contract type
    #[serde(alias = "manualContractType")]
    pub contract_type: ContractType,

    /// Gross value; zero when not yet known
    #[serde(default)]
    pub gross_value: Option<Money>,
}

/// Snapshot of one monthly control and its records
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSnapshot {
    /// Control identifier (stable across repeated opens)
    pub id: ControlId,

    /// The month this control covers
    pub reference_month: ReferenceMonth,

    /// Human-readable month name
    pub month_name: String,

    /// Records in creation order
    pub records: Vec<PaymentRecord>,
}

/// Listing entry for one control
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSummary {
    /// Control identifier
    pub id: ControlId,

    /// The month this control covers
    pub reference_month: ReferenceMonth,

    /// Number of payment records attached
    pub record_count: usize,
}

struct RecordEntry {
    id: RecordId,
    // Payee identity is immutable, mirrored here so lookups need no lock
    physiotherapist_id: Option<u32>,
    state: Mutex<PaymentRecord>,
}

struct ControlEntry {
    id: ControlId,
    reference_month: ReferenceMonth,
    records: RwLock<Vec<Arc<RecordEntry>>>,
}

impl ControlEntry {
    fn snapshot(&self) -> ControlSnapshot {
        let records = self.records.read().unwrap();
        ControlSnapshot {
            id: self.id,
            reference_month: self.reference_month.clone(),
            month_name: self.reference_month.display_name(),
            records: records
                .iter()
                .map(|entry| entry.state.lock().unwrap().clone())
                .collect(),
        }
    }
}

/// The monthly payment ledger
///
/// One control per reference month; a control must be opened before
/// records can be attached, and opening is idempotent.
pub struct PaymentLedger {
    controls: RwLock<HashMap<String, Arc<ControlEntry>>>,
}

impl PaymentLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            controls: RwLock::new(HashMap::new()),
        }
    }

    /// Open the control for a month, or return the existing one
    ///
    /// A fresh control is seeded with one PENDING/PENDING record per active
    /// physiotherapist. Re-opening synchronizes records for
    /// physiotherapists that became active since, and never touches
    /// existing records - the returned control id is stable.
    pub fn open_control(
        &self,
        month: &ReferenceMonth,
        active: &[Physiotherapist],
    ) -> ControlSnapshot {
        let entry = self.get_or_create(month);
        self.sync_records(&entry, active);
        entry.snapshot()
    }

    /// Snapshot the control for a month
    pub fn control(&self, month: &ReferenceMonth) -> Result<ControlSnapshot, LedgerError> {
        Ok(self.entry(month)?.snapshot())
    }

    /// Whether a control is open for the month
    pub fn is_open(&self, month: &ReferenceMonth) -> bool {
        self.controls.read().unwrap().contains_key(month.as_str())
    }

    /// List all controls, newest month first
    pub fn list_controls(&self) -> Vec<ControlSummary> {
        let controls = self.controls.read().unwrap();
        let mut summaries: Vec<ControlSummary> = controls
            .values()
            .map(|entry| ControlSummary {
                id: entry.id,
                reference_month: entry.reference_month.clone(),
                record_count: entry.records.read().unwrap().len(),
            })
            .collect();
        summaries.sort_by(|a, b| b.reference_month.cmp(&a.reference_month));
        summaries
    }

    /// Add a record for a payee outside the physiotherapist registry
    ///
    /// Name and contract type are required; the value defaults to zero and
    /// is filled in later from a parsed document.
    pub fn add_manual_record(
        &self,
        month: &ReferenceMonth,
        request: ManualRecordRequest,
    ) -> Result<PaymentRecord, LedgerError> {
        if request.name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "manual record requires a name".to_string(),
            ));
        }

        let entry = self.entry(month)?;
        let gross = request.gross_value.unwrap_or(Money::ZERO);
        let mut record = PaymentRecord::new(
            Payee::Manual {
                name: request.name,
                email: request.email,
                contract_type: request.contract_type,
            },
            now(),
        );
        record.gross_value = gross;
        record.net_value = gross;

        let snapshot = record.clone();
        entry.records.write().unwrap().push(Arc::new(RecordEntry {
            id: record.id,
            physiotherapist_id: None,
            state: Mutex::new(record),
        }));

        info!(month = %month, record = %snapshot.id, "manual payment record added");
        Ok(snapshot)
    }

    /// Attach extracted financials to a record
    ///
    /// Overwrites the previously attached set, updates the net value from
    /// the extracted net, and fills the gross value only while it is still
    /// zero. Statuses are not touched.
    pub fn attach_financials(
        &self,
        month: &ReferenceMonth,
        record_id: RecordId,
        financials: &ExtractedFinancials,
    ) -> Result<PaymentRecord, LedgerError> {
        let record = self.record(month, record_id)?;
        let mut state = record.state.lock().unwrap();
        apply_financials(&mut state, financials);
        Ok(state.clone())
    }

    /// Attach extracted financials to the record of a registered
    /// physiotherapist, when the control has one
    pub fn attach_financials_by_physiotherapist(
        &self,
        month: &ReferenceMonth,
        physiotherapist_id: u32,
        financials: &ExtractedFinancials,
    ) -> Result<PaymentRecord, LedgerError> {
        let entry = self.entry(month)?;
        let record = {
            let records = entry.records.read().unwrap();
            records
                .iter()
                .find(|r| r.physiotherapist_id == Some(physiotherapist_id))
                .cloned()
        }
        .ok_or_else(|| {
            LedgerError::Validation(format!(
                "no record for physiotherapist {} in {}",
                physiotherapist_id, month
            ))
        })?;

        let mut state = record.state.lock().unwrap();
        apply_financials(&mut state, financials);
        Ok(state.clone())
    }

    /// Advance a record's payment status
    ///
    /// Applies the domain transition table under the record's mutex: of two
    /// concurrent calls advancing past the same state, exactly one
    /// succeeds. Illegal transitions leave the record unchanged.
    pub fn advance_payment_status(
        &self,
        month: &ReferenceMonth,
        record_id: RecordId,
        target: PaymentStatus,
    ) -> Result<PaymentRecord, LedgerError> {
        let record = self.record(month, record_id)?;
        let mut state = record.state.lock().unwrap();

        if !state.payment_status.can_advance(target) {
            return Err(LedgerError::InvalidTransition {
                from: state.payment_status.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }

        state.payment_status = target;
        if target == PaymentStatus::Sent {
            state.paid_at = Some(now());
        }

        debug!(record = %record_id, status = target.as_str(), "payment status advanced");
        Ok(state.clone())
    }

    /// Advance a record's notification status
    pub fn advance_notification_status(
        &self,
        month: &ReferenceMonth,
        record_id: RecordId,
        target: NotificationStatus,
    ) -> Result<PaymentRecord, LedgerError> {
        let record = self.record(month, record_id)?;
        let mut state = record.state.lock().unwrap();

        if !state.notification_status.can_advance(target) {
            return Err(LedgerError::InvalidTransition {
                from: state.notification_status.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }

        state.notification_status = target;
        if target == NotificationStatus::Sent {
            state.notified_at = Some(now());
        }

        debug!(record = %record_id, status = target.as_str(), "notification status advanced");
        Ok(state.clone())
    }

    /// Remove a manual record
    ///
    /// Records of registered physiotherapists are never removed, and no
    /// record is removed once its payment has been marked sent.
    pub fn remove_manual_record(
        &self,
        month: &ReferenceMonth,
        record_id: RecordId,
    ) -> Result<(), LedgerError> {
        let entry = self.entry(month)?;
        let mut records = entry.records.write().unwrap();

        let position = records
            .iter()
            .position(|r| r.id == record_id)
            .ok_or(LedgerError::RecordNotFound(record_id))?;

        if records[position].physiotherapist_id.is_some() {
            return Err(LedgerError::RemovalDenied(
                "records of registered physiotherapists cannot be removed".to_string(),
            ));
        }
        if records[position].state.lock().unwrap().payment_status == PaymentStatus::Sent {
            return Err(LedgerError::RemovalDenied(
                "payment already sent".to_string(),
            ));
        }

        records.remove(position);
        info!(month = %month, record = %record_id, "manual payment record removed");
        Ok(())
    }

    fn get_or_create(&self, month: &ReferenceMonth) -> Arc<ControlEntry> {
        if let Some(entry) = self.controls.read().unwrap().get(month.as_str()) {
            return Arc::clone(entry);
        }

        let mut controls = self.controls.write().unwrap();
        let entry = controls
            .entry(month.as_str().to_string())
            .or_insert_with(|| {
                info!(month = %month, "opening payment control");
                Arc::new(ControlEntry {
                    id: ControlId::new(),
                    reference_month: month.clone(),
                    records: RwLock::new(Vec::new()),
                })
            });
        Arc::clone(entry)
    }

    /// Seed records for active physiotherapists not yet in the control
    fn sync_records(&self, entry: &ControlEntry, active: &[Physiotherapist]) {
        let mut records = entry.records.write().unwrap();
        for physio in active.iter().filter(|p| p.active) {
            let present = records
                .iter()
                .any(|r| r.physiotherapist_id == Some(physio.id));
            if present {
                continue;
            }

            let record = PaymentRecord::new(
                Payee::Registered {
                    physiotherapist_id: physio.id,
                },
                now(),
            );
            records.push(Arc::new(RecordEntry {
                id: record.id,
                physiotherapist_id: Some(physio.id),
                state: Mutex::new(record),
            }));
        }
    }

    fn entry(&self, month: &ReferenceMonth) -> Result<Arc<ControlEntry>, LedgerError> {
        self.controls
            .read()
            .unwrap()
            .get(month.as_str())
            .cloned()
            .ok_or_else(|| LedgerError::ControlNotFound(month.to_string()))
    }

    fn record(
        &self,
        month: &ReferenceMonth,
        record_id: RecordId,
    ) -> Result<Arc<RecordEntry>, LedgerError> {
        let entry = self.entry(month)?;
        let records = entry.records.read().unwrap();
        records
            .iter()
            .find(|r| r.id == record_id)
            .cloned()
            .ok_or(LedgerError::RecordNotFound(record_id))
    }
}

impl Default for PaymentLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_financials(state: &mut PaymentRecord, financials: &ExtractedFinancials) {
    if let Some(net) = financials.net_value {
        state.net_value = net;
    }
    // Keep a manually entered gross; only fill it while still unset
    if state.gross_value.is_zero() {
        if let Some(gross) = financials.gross_value {
            state.gross_value = gross;
        }
    }
    state.financials = Some(financials.clone());
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(s: &str) -> ReferenceMonth {
        ReferenceMonth::parse(s).unwrap()
    }

    fn physio(id: u32, name: &str) -> Physiotherapist {
        Physiotherapist {
            id,
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            contract_type: ContractType::Rpa,
            active: true,
        }
    }

    fn manual_request(name: &str) -> ManualRecordRequest {
        ManualRecordRequest {
            name: name.to_string(),
            email: None,
            contract_type: ContractType::Rpa,
            gross_value: None,
        }
    }

    #[test]
    fn test_open_control_seeds_active_physiotherapists() {
        let ledger = PaymentLedger::new();
        let mut inactive = physio(3, "Clara");
        inactive.active = false;

        let control = ledger.open_control(
            &month("2025-03"),
            &[physio(1, "Ana"), physio(2, "Bruno"), inactive],
        );

        assert_eq!(control.records.len(), 2);
        assert!(control.records.iter().all(|r| {
            r.payment_status == PaymentStatus::Pending
                && r.notification_status == NotificationStatus::Pending
                && r.gross_value.is_zero()
        }));
        assert_eq!(control.month_name, "Março de 2025");
    }

    #[test]
    fn test_open_control_is_idempotent() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");

        let first = ledger.open_control(&m, &[physio(1, "Ana")]);
        let second = ledger.open_control(&m, &[physio(1, "Ana")]);

        assert_eq!(first.id, second.id);
        assert_eq!(second.records.len(), 1);
    }

    #[test]
    fn test_reopen_syncs_newly_active_physiotherapists() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");

        let first = ledger.open_control(&m, &[physio(1, "Ana")]);
        let second = ledger.open_control(&m, &[physio(1, "Ana"), physio(2, "Bruno")]);

        assert_eq!(first.id, second.id);
        assert_eq!(second.records.len(), 2);
        // The original record is untouched
        assert_eq!(second.records[0].id, first.records[0].id);
    }

    #[test]
    fn test_control_not_found() {
        let ledger = PaymentLedger::new();
        assert!(matches!(
            ledger.control(&month("2030-01")),
            Err(LedgerError::ControlNotFound(_))
        ));
        assert!(!ledger.is_open(&month("2030-01")));
    }

    #[test]
    fn test_list_controls_newest_first() {
        let ledger = PaymentLedger::new();
        ledger.open_control(&month("2025-01"), &[]);
        ledger.open_control(&month("2025-03"), &[physio(1, "Ana")]);
        ledger.open_control(&month("2024-12"), &[]);

        let list = ledger.list_controls();
        let months: Vec<&str> = list.iter().map(|c| c.reference_month.as_str()).collect();
        assert_eq!(months, vec!["2025-03", "2025-01", "2024-12"]);
        assert_eq!(list[0].record_count, 1);
    }

    #[test]
    fn test_add_manual_record_defaults() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        ledger.open_control(&m, &[]);

        let record = ledger.add_manual_record(&m, manual_request("Diego")).unwrap();

        assert!(record.payee.is_manual());
        assert_eq!(record.gross_value, Money::ZERO);
        assert_eq!(record.net_value, Money::ZERO);
        assert_eq!(record.payment_status, PaymentStatus::Pending);

        let control = ledger.control(&m).unwrap();
        assert_eq!(control.records.len(), 1);
    }

    #[test]
    fn test_add_manual_record_requires_name() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        ledger.open_control(&m, &[]);

        let result = ledger.add_manual_record(&m, manual_request("   "));
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_add_manual_record_requires_open_control() {
        let ledger = PaymentLedger::new();
        let result = ledger.add_manual_record(&month("2025-03"), manual_request("Diego"));
        assert!(matches!(result, Err(LedgerError::ControlNotFound(_))));
    }

    #[test]
    fn test_attach_financials_sets_values_not_status() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        let control = ledger.open_control(&m, &[physio(1, "Ana")]);
        let record_id = control.records[0].id;

        let financials = ExtractedFinancials {
            gross_value: Some(Money::from_cents(385000)),
            net_value: Some(Money::from_cents(333424)),
            income_tax_withholding: Some(Money::from_cents(9226)),
            ..Default::default()
        };

        let updated = ledger.attach_financials(&m, record_id, &financials).unwrap();

        assert_eq!(updated.gross_value, Money::from_cents(385000));
        assert_eq!(updated.net_value, Money::from_cents(333424));
        assert_eq!(updated.financials, Some(financials));
        assert_eq!(updated.payment_status, PaymentStatus::Pending);
        assert_eq!(updated.notification_status, NotificationStatus::Pending);
    }

    #[test]
    fn test_attach_financials_keeps_nonzero_gross() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        ledger.open_control(&m, &[]);
        let record = ledger
            .add_manual_record(
                &m,
                ManualRecordRequest {
                    gross_value: Some(Money::from_cents(500000)),
                    ..manual_request("Diego")
                },
            )
            .unwrap();

        let financials = ExtractedFinancials {
            gross_value: Some(Money::from_cents(385000)),
            net_value: Some(Money::from_cents(333424)),
            ..Default::default()
        };

        let updated = ledger.attach_financials(&m, record.id, &financials).unwrap();
        // Manually entered gross survives; net follows the document
        assert_eq!(updated.gross_value, Money::from_cents(500000));
        assert_eq!(updated.net_value, Money::from_cents(333424));
    }

    #[test]
    fn test_attach_by_physiotherapist() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        ledger.open_control(&m, &[physio(1, "Ana"), physio(2, "Bruno")]);

        let financials = ExtractedFinancials {
            net_value: Some(Money::from_cents(120000)),
            ..Default::default()
        };

        let updated = ledger
            .attach_financials_by_physiotherapist(&m, 2, &financials)
            .unwrap();
        assert_eq!(updated.payee.physiotherapist_id(), Some(2));
        assert_eq!(updated.net_value, Money::from_cents(120000));

        let missing = ledger.attach_financials_by_physiotherapist(&m, 99, &financials);
        assert!(matches!(missing, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_payment_status_happy_path() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        let control = ledger.open_control(&m, &[physio(1, "Ana")]);
        let id = control.records[0].id;

        let r = ledger
            .advance_payment_status(&m, id, PaymentStatus::Processing)
            .unwrap();
        assert_eq!(r.payment_status, PaymentStatus::Processing);
        assert!(r.paid_at.is_none());

        let r = ledger
            .advance_payment_status(&m, id, PaymentStatus::Sent)
            .unwrap();
        assert_eq!(r.payment_status, PaymentStatus::Sent);
        assert!(r.paid_at.is_some());
    }

    #[test]
    fn test_no_rewind_to_pending() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        let control = ledger.open_control(&m, &[physio(1, "Ana")]);
        let id = control.records[0].id;

        ledger
            .advance_payment_status(&m, id, PaymentStatus::Processing)
            .unwrap();
        ledger
            .advance_payment_status(&m, id, PaymentStatus::Sent)
            .unwrap();

        let result = ledger.advance_payment_status(&m, id, PaymentStatus::Pending);
        assert_eq!(
            result,
            Err(LedgerError::InvalidTransition {
                from: "SENT".to_string(),
                to: "PENDING".to_string(),
            })
        );

        // State unchanged after the rejected transition
        let control = ledger.control(&m).unwrap();
        assert_eq!(control.records[0].payment_status, PaymentStatus::Sent);
    }

    #[test]
    fn test_skip_forward_rejected() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        let control = ledger.open_control(&m, &[physio(1, "Ana")]);
        let id = control.records[0].id;

        let result = ledger.advance_payment_status(&m, id, PaymentStatus::Sent);
        assert!(matches!(result, Err(LedgerError::InvalidTransition { .. })));
    }

    #[test]
    fn test_notification_status_independent_of_payment() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        let control = ledger.open_control(&m, &[physio(1, "Ana")]);
        let id = control.records[0].id;

        let r = ledger
            .advance_notification_status(&m, id, NotificationStatus::Failed)
            .unwrap();
        assert_eq!(r.notification_status, NotificationStatus::Failed);
        assert_eq!(r.payment_status, PaymentStatus::Pending);
        assert!(r.notified_at.is_none());
    }

    #[test]
    fn test_concurrent_advance_has_one_winner() {
        let ledger = Arc::new(PaymentLedger::new());
        let m = month("2025-03");
        let control = ledger.open_control(&m, &[physio(1, "Ana")]);
        let id = control.records[0].id;

        let mut successes = 0;
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let ledger = Arc::clone(&ledger);
                    let m = m.clone();
                    scope.spawn(move || {
                        ledger
                            .advance_payment_status(&m, id, PaymentStatus::Processing)
                            .is_ok()
                    })
                })
                .collect();
            for handle in handles {
                if handle.join().unwrap() {
                    successes += 1;
                }
            }
        });

        assert_eq!(successes, 1, "exactly one concurrent advance may win");
    }

    #[test]
    fn test_remove_manual_record() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        ledger.open_control(&m, &[physio(1, "Ana")]);
        let manual = ledger.add_manual_record(&m, manual_request("Diego")).unwrap();

        ledger.remove_manual_record(&m, manual.id).unwrap();
        assert_eq!(ledger.control(&m).unwrap().records.len(), 1);

        let again = ledger.remove_manual_record(&m, manual.id);
        assert!(matches!(again, Err(LedgerError::RecordNotFound(_))));
    }

    #[test]
    fn test_remove_registered_record_denied() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        let control = ledger.open_control(&m, &[physio(1, "Ana")]);

        let result = ledger.remove_manual_record(&m, control.records[0].id);
        assert!(matches!(result, Err(LedgerError::RemovalDenied(_))));
    }

    #[test]
    fn test_remove_after_payment_sent_denied() {
        let ledger = PaymentLedger::new();
        let m = month("2025-03");
        ledger.open_control(&m, &[]);
        let manual = ledger.add_manual_record(&m, manual_request("Diego")).unwrap();

        ledger
            .advance_payment_status(&m, manual.id, PaymentStatus::Processing)
            .unwrap();
        ledger
            .advance_payment_status(&m, manual.id, PaymentStatus::Sent)
            .unwrap();

        let result = ledger.remove_manual_record(&m, manual.id);
        assert!(matches!(result, Err(LedgerError::RemovalDenied(_))));
    }
}
