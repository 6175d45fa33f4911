use crate::activation_id::ActivationId;
use crate::state::ActivationState;

/// A specific violation of the ledger's or the per-activation state
/// machine's invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerViolation {
    /// The ledger already has a settled outcome for this activation; only
    /// one `absent -> success` or `absent -> failure` transition is allowed
    /// per entry.
    AlreadySettled { id: ActivationId },
    /// Activation state transitions are monotone; this one isn't.
    IllegalStateTransition {
        id: ActivationId,
        from: ActivationState,
        to: ActivationState,
    },
}

impl std::fmt::Display for LedgerViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadySettled { id } => {
                write!(f, "{id} already has a settled ledger outcome")
            }
            Self::IllegalStateTransition { id, from, to } => {
                write!(f, "{id} cannot transition from {from:?} to {to:?}")
            }
        }
    }
}
