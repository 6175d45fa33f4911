mod activation_id;
mod error;
mod ledger;
mod outcome;
mod state;

pub use activation_id::{ActivationId, ActivationIdGenerator};
pub use error::LedgerViolation;
pub use ledger::PromiseCompletionLedger;
pub use outcome::PromiseCompletionOutcome;
pub use state::{ActivationLifecycle, ActivationState};
