use crate::activation_id::ActivationId;
use crate::error::LedgerViolation;
use crate::outcome::PromiseCompletionOutcome;
use std::collections::HashMap;

/// The ledger recording, for each activation with a wait-promise, whether
/// that promise has settled and how.
///
/// Entries transition only `absent -> success` or `absent -> failure`; a
/// future that completes twice would violate that, so this side-table gives
/// the drain loop a place to check settledness without polling the future
/// itself.
#[derive(Debug, Default)]
pub struct PromiseCompletionLedger {
    entries: HashMap<ActivationId, PromiseCompletionOutcome>,
}

impl PromiseCompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful settlement. Errors if this activation already
    /// has an entry (the `absent -> *` transition has already happened).
    pub fn record_success(&mut self, id: ActivationId) -> Result<(), LedgerViolation> {
        self.insert_once(id, PromiseCompletionOutcome::Success)
    }

    /// Records a failed settlement, capturing the error's display form.
    pub fn record_failure(
        &mut self,
        id: ActivationId,
        error: impl Into<String>,
    ) -> Result<(), LedgerViolation> {
        self.insert_once(id, PromiseCompletionOutcome::Failure(error.into()))
    }

    fn insert_once(
        &mut self,
        id: ActivationId,
        outcome: PromiseCompletionOutcome,
    ) -> Result<(), LedgerViolation> {
        if self.entries.contains_key(&id) {
            return Err(LedgerViolation::AlreadySettled { id });
        }
        self.entries.insert(id, outcome);
        Ok(())
    }

    /// Reads the current outcome without consuming it.
    pub fn peek(&self, id: ActivationId) -> Option<&PromiseCompletionOutcome> {
        self.entries.get(&id)
    }

    /// Removes and returns an activation's entry, if any — used when an
    /// activation is consumed off the queue head.
    pub fn take(&mut self, id: ActivationId) -> Option<PromiseCompletionOutcome> {
        self.entries.remove(&id)
    }

    /// Drops every entry — used when a drain flushes the whole queue after
    /// a fatal upstream failure.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_success_once() {
        let mut ledger = PromiseCompletionLedger::new();
        let id = ActivationId::from_raw(1);
        assert!(ledger.record_success(id).is_ok());
        assert!(ledger.peek(id).unwrap().is_success());
    }

    #[test_log::test]
    fn second_settlement_of_same_activation_is_rejected() {
        let mut ledger = PromiseCompletionLedger::new();
        let id = ActivationId::from_raw(1);
        ledger.record_success(id).unwrap();
        let err = ledger.record_failure(id, "late").unwrap_err();
        similar_asserts::assert_eq!(err, LedgerViolation::AlreadySettled { id });
    }

    #[test]
    fn take_removes_the_entry() {
        let mut ledger = PromiseCompletionLedger::new();
        let id = ActivationId::from_raw(7);
        ledger.record_failure(id, "boom").unwrap();
        let outcome = ledger.take(id).unwrap();
        assert!(outcome.is_failure());
        assert!(ledger.peek(id).is_none());
    }

    #[test_log::test]
    fn clear_drops_every_entry() {
        let mut ledger = PromiseCompletionLedger::new();
        ledger.record_success(ActivationId::from_raw(1)).unwrap();
        ledger.record_success(ActivationId::from_raw(2)).unwrap();
        assert_eq!(ledger.len(), 2);
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
