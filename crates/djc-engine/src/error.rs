use djc_types::ActivationIdentity;
use thiserror::Error;

/// Errors surfaced at the manager's public boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A registry-level caller error, re-exported from `djc-types`.
    #[error(transparent)]
    Domain(#[from] djc_types::DomainError),

    /// An activation reached execution with no registered callbacks despite
    /// passing the readiness check (can only happen if a bug elsewhere
    /// violates the "append-only" invariant).
    #[error("activation {identity} reached execution with no registered callback")]
    NoCallback { identity: ActivationIdentity },

    /// No elements in the document carry this instance's marker.
    #[error("no elements found for instance {identity}")]
    NoElements { identity: ActivationIdentity },

    /// A data-hash was present but its factory vanished between the
    /// readiness check and execution.
    #[error("no data factory registered for {identity}")]
    NoDataFactory { identity: ActivationIdentity },

    /// A callback threw or its returned future rejected.
    #[error("callback chain for {identity} failed: {message}")]
    CallbackFailure {
        identity: ActivationIdentity,
        message: String,
    },

    /// An activation's wait-promise rejected, forcing a queue flush.
    /// Identifies the activation at the head and wraps the upstream error.
    #[error("wait-promise for {identity} failed, flushing queue: {upstream}")]
    ScriptLoadFailed {
        identity: ActivationIdentity,
        upstream: String,
    },

    /// The activation was dropped by a queue flush triggered by an
    /// *earlier* activation's wait-promise failure. A future that never
    /// completes would leak the task awaiting it, so this crate resolves
    /// it instead of leaving it pending forever (see DESIGN.md).
    #[error("activation was dropped by an upstream queue flush")]
    Flushed,
}
