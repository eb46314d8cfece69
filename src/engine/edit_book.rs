// ============================================================================
// Allocation Book
// Current allocation records of one month and the edit workflow over them
// ============================================================================

use super::deposit_ledger::{DepositLedger, SharedDepositLedger};
use super::reconciliation::{reconcile, Reconciliation};
use super::settlement_engine::SettlementOutcome;
use crate::domain::{AllocationKind, AllocationRecord, MonthKey, PeriodQuantities, SiteId};
use crate::error::{InvalidInput, SettlementError, SettlementResult};
use crate::interfaces::{SettlementEvent, SettlementEventHandler};
use crate::validation::{apply_minimum_allocation, check_charge_uniqueness, check_non_negative};
use chrono::Utc;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hand edit of one allocation record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AllocationEdit {
    pub production_site: SiteId,
    pub consumption_site: SiteId,
    pub allocated: PeriodQuantities,
    pub charge: bool,
}

impl AllocationEdit {
    pub fn new(
        production_site: impl Into<SiteId>,
        consumption_site: impl Into<SiteId>,
        allocated: impl Into<PeriodQuantities>,
    ) -> Self {
        Self {
            production_site: production_site.into(),
            consumption_site: consumption_site.into(),
            allocated: allocated.into(),
            charge: false,
        }
    }

    pub fn with_charge(mut self, charge: bool) -> Self {
        self.charge = charge;
        self
    }
}

/// Accepted edit
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub previous: AllocationRecord,
    pub record: AllocationRecord,
    pub reconciliation: Reconciliation,
    /// No period was positive and the record was forced to zero
    pub zeroed: bool,
}

/// Records of a single month, one per (production, consumption) pair
pub struct AllocationBook {
    month: MonthKey,
    records: Vec<AllocationRecord>,
    event_handler: Arc<dyn SettlementEventHandler>,
}

impl AllocationBook {
    pub fn new(month: MonthKey, event_handler: Arc<dyn SettlementEventHandler>) -> Self {
        Self {
            month,
            records: Vec::new(),
            event_handler,
        }
    }

    /// Seed a book with the allocations of a settlement run
    pub fn from_outcome(
        outcome: &SettlementOutcome,
        event_handler: Arc<dyn SettlementEventHandler>,
    ) -> Self {
        Self {
            month: outcome.month,
            records: outcome.allocations.clone(),
            event_handler,
        }
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    pub fn records(&self) -> &[AllocationRecord] {
        &self.records
    }

    pub fn get(&self, production: &str, consumption: &str) -> Option<&AllocationRecord> {
        self.position(production, consumption).map(|i| &self.records[i])
    }

    /// Add or replace a record without reconciliation. Records of another
    /// month, or claiming a charge already held elsewhere, are refused.
    pub fn insert(&mut self, record: AllocationRecord) -> SettlementResult<()> {
        if record.month != self.month {
            return Err(InvalidInput::MonthMismatch {
                record: "allocation record",
                site: record.production_site.clone(),
                expected: self.month,
                found: record.month,
            }
            .into());
        }
        check_charge_uniqueness(&self.records, &record)?;
        match self.position(record.production_site.as_str(), record.consumption_site.as_str()) {
            Some(i) => self.records[i] = record,
            None => self.records.push(record),
        }
        Ok(())
    }

    /// Apply a hand edit.
    ///
    /// Runs the quantity checks, the minimum-allocation rule and charge
    /// uniqueness, then reconciles the delta into `ledger` and stores the
    /// superseding version. On error neither the book nor the ledger changes.
    pub fn submit_edit(
        &mut self,
        edit: AllocationEdit,
        ledger: &mut DepositLedger,
    ) -> SettlementResult<EditOutcome> {
        let result = self.try_edit(&edit, ledger);
        if let Ok(outcome) = &result {
            tracing::debug!(
                production_site = %edit.production_site,
                consumption_site = %edit.consumption_site,
                zeroed = outcome.zeroed,
                adjustments = outcome.reconciliation.adjustments.len(),
                "edit reconciled"
            );
        }
        self.report(
            "allocation edit",
            &edit.production_site,
            &edit.consumption_site,
            result.as_ref().map(|o| &o.record),
        );
        result
    }

    /// As [`submit_edit`](Self::submit_edit), holding the shared ledger lock
    /// for the whole edit
    pub fn submit_shared(
        &mut self,
        edit: AllocationEdit,
        ledger: &SharedDepositLedger,
    ) -> SettlementResult<EditOutcome> {
        ledger.with(|l| self.submit_edit(edit, l))
    }

    fn try_edit(
        &mut self,
        edit: &AllocationEdit,
        ledger: &mut DepositLedger,
    ) -> SettlementResult<EditOutcome> {
        let index = self.require(&edit.production_site, &edit.consumption_site)?;

        check_non_negative(&edit.consumption_site, &edit.allocated)?;
        let normalized = apply_minimum_allocation(edit.allocated);

        let previous = self.records[index].clone();
        let record = previous.supersede(normalized.quantities(), edit.charge);
        check_charge_uniqueness(&self.records, &record)?;

        // Nothing above may touch the ledger
        let reconciliation = reconcile(&previous, &record, ledger);
        self.records[index] = record.clone();

        Ok(EditOutcome {
            previous,
            record,
            reconciliation,
            zeroed: normalized.is_zeroed(),
        })
    }

    /// Move the charge flag without touching quantities
    pub fn set_charge(
        &mut self,
        production: &str,
        consumption: &str,
        charge: bool,
    ) -> SettlementResult<&AllocationRecord> {
        let (production, consumption) = (SiteId::from(production), SiteId::from(consumption));
        let result = self.try_set_charge(&production, &consumption, charge);
        self.conclude("charge update", &production, &consumption, result)
    }

    fn try_set_charge(
        &mut self,
        production: &SiteId,
        consumption: &SiteId,
        charge: bool,
    ) -> SettlementResult<usize> {
        let index = self.require(production, consumption)?;
        let current = &self.records[index];
        let record = current.supersede(current.allocated, charge);
        check_charge_uniqueness(&self.records, &record)?;
        self.records[index] = record;
        Ok(index)
    }

    /// Replace the injection/reduction adjustment of a record
    pub fn set_adjustment(
        &mut self,
        production: &str,
        consumption: &str,
        kind: AllocationKind,
        adjustment: Option<PeriodQuantities>,
    ) -> SettlementResult<&AllocationRecord> {
        let (production, consumption) = (SiteId::from(production), SiteId::from(consumption));
        let result = self.try_set_adjustment(&production, &consumption, kind, adjustment);
        self.conclude("adjustment update", &production, &consumption, result)
    }

    fn try_set_adjustment(
        &mut self,
        production: &SiteId,
        consumption: &SiteId,
        kind: AllocationKind,
        adjustment: Option<PeriodQuantities>,
    ) -> SettlementResult<usize> {
        let index = self.require(production, consumption)?;
        if let Some(values) = &adjustment {
            check_non_negative(&self.records[index].consumption_site, values)?;
        }

        let current = &self.records[index];
        let mut record = current.supersede(current.allocated, current.charge);
        record.kind = kind;
        record.adjustment = adjustment;
        self.records[index] = record;
        Ok(index)
    }

    /// Report an in-place update and hand back the stored record
    fn conclude(
        &self,
        action: &'static str,
        production: &SiteId,
        consumption: &SiteId,
        result: SettlementResult<usize>,
    ) -> SettlementResult<&AllocationRecord> {
        match result {
            Ok(index) => {
                let record = &self.records[index];
                self.report(action, production, consumption, Ok(record));
                Ok(record)
            }
            Err(err) => {
                self.report(action, production, consumption, Err(&err));
                Err(err)
            }
        }
    }

    fn position(&self, production: &str, consumption: &str) -> Option<usize> {
        self.records.iter().position(|r| {
            r.production_site.as_str() == production && r.consumption_site.as_str() == consumption
        })
    }

    fn require(&self, production: &SiteId, consumption: &SiteId) -> SettlementResult<usize> {
        self.position(production.as_str(), consumption.as_str())
            .ok_or_else(|| SettlementError::AllocationNotFound {
                production_site: production.clone(),
                consumption_site: consumption.clone(),
                month: self.month,
            })
    }

    fn report(
        &self,
        action: &'static str,
        production: &SiteId,
        consumption: &SiteId,
        result: Result<&AllocationRecord, &SettlementError>,
    ) {
        let event = match result {
            Ok(record) => {
                tracing::info!(
                    production_site = %production,
                    consumption_site = %consumption,
                    month = %self.month,
                    version = record.version,
                    "{action} accepted"
                );
                SettlementEvent::EditAccepted {
                    production_site: production.clone(),
                    consumption_site: consumption.clone(),
                    month: self.month,
                    version: record.version,
                    timestamp: Utc::now(),
                }
            }
            Err(err) => {
                tracing::warn!(
                    production_site = %production,
                    consumption_site = %consumption,
                    month = %self.month,
                    error = %err,
                    "{action} rejected"
                );
                SettlementEvent::EditRejected {
                    production_site: production.clone(),
                    consumption_site: consumption.clone(),
                    month: self.month,
                    reason: err.to_string(),
                    timestamp: Utc::now(),
                }
            }
        };
        self.event_handler.on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompanyId, Period};
    use crate::engine::deposit_ledger::BankKey;
    use crate::interfaces::{NoOpEventHandler, RecordingEventHandler};

    fn month() -> MonthKey {
        "122024".parse().unwrap()
    }

    fn record(production: &str, consumption: &str, allocated: [i64; 5]) -> AllocationRecord {
        let mut r = AllocationRecord::new(
            SiteId::from(production),
            CompanyId::from("GCO"),
            SiteId::from(consumption),
            CompanyId::from("CCO"),
            month(),
        );
        r.allocated = PeriodQuantities::new(allocated);
        r
    }

    fn book() -> AllocationBook {
        let mut book = AllocationBook::new(month(), Arc::new(NoOpEventHandler));
        book.insert(record("GEN", "C1", [10, 0, 0, 0, 0])).unwrap();
        book.insert(record("GEN", "C2", [0, 5, 0, 0, 0])).unwrap();
        book
    }

    #[test]
    fn test_edit_supersedes_and_deposits() {
        let mut book = book();
        let mut ledger = DepositLedger::new();

        let outcome = book
            .submit_edit(AllocationEdit::new("GEN", "C1", [14, 0, 0, 0, 0]), &mut ledger)
            .unwrap();

        assert_eq!(outcome.previous.version, 1);
        assert_eq!(outcome.record.version, 2);
        assert_eq!(outcome.reconciliation.deposited(), 4);
        assert_eq!(book.get("GEN", "C1").unwrap().allocated[Period::P1], 14);
        assert_eq!(ledger.balance(&BankKey::new("CCO", "GEN", "C1")), 4);
    }

    #[test]
    fn test_all_zero_edit_is_normalized() {
        let mut book = book();
        let mut ledger = DepositLedger::new();

        let outcome = book
            .submit_edit(AllocationEdit::new("GEN", "C2", [0; 5]), &mut ledger)
            .unwrap();

        assert!(outcome.zeroed);
        assert!(outcome.record.allocated.is_zero());
        // Nothing was banked for this key, so the whole return lapses
        assert_eq!(outcome.reconciliation.lapsed()[Period::P2], 5);
    }

    #[test]
    fn test_negative_edit_rejected() {
        let mut book = book();
        let mut ledger = DepositLedger::new();

        let err = book
            .submit_edit(AllocationEdit::new("GEN", "C1", [3, -1, 0, 0, 0]), &mut ledger)
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidInput(_)));
        assert_eq!(book.get("GEN", "C1").unwrap().version, 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_charge_conflict_leaves_state_unchanged() {
        let handler = Arc::new(RecordingEventHandler::new());
        let mut book = AllocationBook::new(month(), handler.clone());
        let mut charged = record("GEN", "C1", [10, 0, 0, 0, 0]);
        charged.charge = true;
        book.insert(charged).unwrap();
        book.insert(record("GEN", "C2", [0, 5, 0, 0, 0])).unwrap();

        let mut ledger = DepositLedger::new();
        let err = book
            .submit_edit(
                AllocationEdit::new("GEN", "C2", [0, 9, 0, 0, 0]).with_charge(true),
                &mut ledger,
            )
            .unwrap_err();

        assert!(matches!(err, SettlementError::ChargeConflict { .. }));
        let c2 = book.get("GEN", "C2").unwrap();
        assert_eq!((c2.version, c2.charge, c2.allocated[Period::P2]), (1, false, 5));
        assert!(ledger.is_empty());
        assert!(matches!(
            handler.events().last(),
            Some(SettlementEvent::EditRejected { .. })
        ));
    }

    #[test]
    fn test_unknown_pair_rejected() {
        let mut book = book();
        let mut ledger = DepositLedger::new();
        let err = book
            .submit_edit(AllocationEdit::new("GEN", "C9", [1, 0, 0, 0, 0]), &mut ledger)
            .unwrap_err();
        assert!(matches!(err, SettlementError::AllocationNotFound { .. }));
    }

    #[test]
    fn test_set_charge_moves_only_when_free() {
        let mut book = book();
        assert!(book.set_charge("GEN", "C1", true).unwrap().charge);
        assert!(book.set_charge("GEN", "C2", true).is_err());

        book.set_charge("GEN", "C1", false).unwrap();
        assert!(book.set_charge("GEN", "C2", true).is_ok());
    }

    #[test]
    fn test_set_adjustment() {
        let mut book = book();
        let updated = book
            .set_adjustment(
                "GEN",
                "C1",
                AllocationKind::Reduction,
                Some(PeriodQuantities::new([4, 0, 0, 0, 0])),
            )
            .unwrap();
        assert_eq!(updated.effective()[Period::P1], 6);
        assert_eq!(updated.version, 2);
    }

    #[test]
    fn test_insert_wrong_month_refused() {
        let mut book = book();
        let mut other = record("GEN", "C3", [1; 5]);
        other.month = "012025".parse().unwrap();
        assert!(book.insert(other).is_err());
    }

    #[test]
    fn test_insert_second_charge_refused() {
        let mut book = AllocationBook::new(month(), Arc::new(NoOpEventHandler));
        let mut first = record("GEN", "C1", [10, 0, 0, 0, 0]);
        first.charge = true;
        book.insert(first).unwrap();

        let mut second = record("GEN", "C2", [5, 0, 0, 0, 0]);
        second.charge = true;
        let err = book.insert(second).unwrap_err();

        assert!(matches!(err, SettlementError::ChargeConflict { .. }));
        assert!(book.get("GEN", "C2").is_none());
        assert_eq!(book.records().iter().filter(|r| r.charge).count(), 1);
    }

    #[test]
    fn test_insert_replacing_charged_record_allowed() {
        let mut book = AllocationBook::new(month(), Arc::new(NoOpEventHandler));
        let mut charged = record("GEN", "C1", [10, 0, 0, 0, 0]);
        charged.charge = true;
        book.insert(charged.clone()).unwrap();

        charged.allocated = PeriodQuantities::new([12, 0, 0, 0, 0]);
        book.insert(charged).unwrap();
        assert_eq!(book.get("GEN", "C1").unwrap().allocated[Period::P1], 12);
    }

    #[test]
    fn test_in_place_updates_are_reported() {
        let handler = Arc::new(RecordingEventHandler::new());
        let mut book = AllocationBook::new(month(), handler.clone());
        book.insert(record("GEN", "C1", [10, 0, 0, 0, 0])).unwrap();
        book.insert(record("GEN", "C2", [0, 5, 0, 0, 0])).unwrap();

        book.set_charge("GEN", "C1", true).unwrap();
        assert!(book.set_charge("GEN", "C2", true).is_err());
        book.set_adjustment("GEN", "C2", AllocationKind::Injection, Some(PeriodQuantities::splat(1)))
            .unwrap();

        let events = handler.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], SettlementEvent::EditAccepted { version: 2, .. }));
        assert!(matches!(events[1], SettlementEvent::EditRejected { .. }));
        assert!(matches!(events[2], SettlementEvent::EditAccepted { version: 2, .. }));
    }

    #[test]
    fn test_shared_ledger_edit() {
        let mut book = book();
        let shared = SharedDepositLedger::default();
        book.submit_shared(AllocationEdit::new("GEN", "C1", [12, 0, 0, 0, 0]), &shared)
            .unwrap();
        assert_eq!(shared.snapshot().balance(&BankKey::new("CCO", "GEN", "C1")), 2);
    }
}
