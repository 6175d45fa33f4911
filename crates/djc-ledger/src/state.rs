use crate::activation_id::ActivationId;
use crate::error::LedgerViolation;

/// Per-activation lifecycle states.
///
/// `FlushedByUpstreamFailure` is an alternate terminal reached when an
/// earlier activation's wait-promise failed and the queue was flushed out
/// from under this one while it was still `Queued`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationState {
    Queued,
    Ready,
    Executing,
    Resolved,
    Rejected,
    FlushedByUpstreamFailure,
}

impl ActivationState {
    /// Whether `self -> next` is an allowed transition.
    ///
    /// Transitions are monotone: no activation returns to `Queued` (or any
    /// earlier state) after leaving it, and every non-terminal state has
    /// exactly one legal successor set.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Ready)
                | (Self::Queued, Self::FlushedByUpstreamFailure)
                | (Self::Ready, Self::Executing)
                | (Self::Ready, Self::FlushedByUpstreamFailure)
                | (Self::Executing, Self::Resolved)
                | (Self::Executing, Self::Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Resolved | Self::Rejected | Self::FlushedByUpstreamFailure
        )
    }
}

/// Tracks one activation's current lifecycle state and enforces that every
/// transition is monotone.
#[derive(Clone, Copy, Debug)]
pub struct ActivationLifecycle {
    id: ActivationId,
    state: ActivationState,
}

impl ActivationLifecycle {
    pub fn new(id: ActivationId) -> Self {
        Self {
            id,
            state: ActivationState::Queued,
        }
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    /// Advances to `next`, rejecting the transition if it isn't monotone.
    pub fn advance(&mut self, next: ActivationState) -> Result<(), LedgerViolation> {
        if !self.state.can_transition_to(next) {
            return Err(LedgerViolation::IllegalStateTransition {
                id: self.id,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_queued_ready_executing_resolved() {
        let mut lifecycle = ActivationLifecycle::new(ActivationId::from_raw(1));
        assert!(lifecycle.advance(ActivationState::Ready).is_ok());
        assert!(lifecycle.advance(ActivationState::Executing).is_ok());
        assert!(lifecycle.advance(ActivationState::Resolved).is_ok());
        assert_eq!(lifecycle.state(), ActivationState::Resolved);
        assert!(lifecycle.state().is_terminal());
    }

    #[test]
    fn flush_from_queued_is_legal() {
        let mut lifecycle = ActivationLifecycle::new(ActivationId::from_raw(2));
        assert!(
            lifecycle
                .advance(ActivationState::FlushedByUpstreamFailure)
                .is_ok()
        );
    }

    #[test]
    fn cannot_return_to_queued() {
        let mut lifecycle = ActivationLifecycle::new(ActivationId::from_raw(3));
        lifecycle.advance(ActivationState::Ready).unwrap();
        let err = lifecycle.advance(ActivationState::Queued).unwrap_err();
        assert!(matches!(err, LedgerViolation::IllegalStateTransition { .. }));
    }

    #[test]
    fn cannot_skip_ready_to_resolved() {
        let mut lifecycle = ActivationLifecycle::new(ActivationId::from_raw(4));
        let err = lifecycle.advance(ActivationState::Resolved).unwrap_err();
        assert!(matches!(err, LedgerViolation::IllegalStateTransition { .. }));
    }

    #[test]
    fn terminal_states_have_no_legal_successor() {
        let mut lifecycle = ActivationLifecycle::new(ActivationId::from_raw(5));
        lifecycle.advance(ActivationState::Ready).unwrap();
        lifecycle.advance(ActivationState::Executing).unwrap();
        lifecycle.advance(ActivationState::Rejected).unwrap();
        assert!(lifecycle.advance(ActivationState::Resolved).is_err());
    }
}
