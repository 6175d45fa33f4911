use crate::error::EngineError;
use crate::registry::{CallbackRegistry, DataFactoryMap};
use djc_ledger::{
    ActivationId, ActivationLifecycle, PromiseCompletionLedger, PromiseCompletionOutcome,
};
use djc_types::ActivationIdentity;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Instant;
use tokio::sync::oneshot;

/// One pending activation request.
///
/// The attached wait-promise itself is not stored here: attaching it is a
/// one-time action taken at `enqueue` time, which spawns a task that writes
/// the settled outcome into the [`PromiseCompletionLedger`] under `id` and
/// requests a drain. This struct only remembers whether such a promise was
/// attached, so the readiness predicate knows whether to consult the ledger
/// at all.
pub struct Activation {
    pub id: ActivationId,
    pub identity: ActivationIdentity,
    pub enqueued_at: Instant,
    pub has_wait: bool,
    pub resolver: oneshot::Sender<Result<Value, EngineError>>,
    pub lifecycle: ActivationLifecycle,
}

/// FIFO queue of pending activations. Ordering holds because the drain loop
/// only ever pops from the front.
#[derive(Default)]
pub struct ActivationQueue {
    entries: VecDeque<Activation>,
}

impl ActivationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, activation: Activation) {
        self.entries.push_back(activation);
    }

    pub fn front(&self) -> Option<&Activation> {
        self.entries.front()
    }

    pub fn pop_front(&mut self) -> Option<Activation> {
        self.entries.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops every pending activation, used when a fatal upstream failure
    /// forces the whole queue to flush.
    pub fn drain_all(&mut self) -> Vec<Activation> {
        self.entries.drain(..).collect()
    }

    /// All activations currently blocked (used by the stall reporter, which
    /// only ever reads).
    pub fn iter(&self) -> impl Iterator<Item = &Activation> {
        self.entries.iter()
    }
}

/// The outcome of inspecting the queue head against the readiness predicate
/// and the ledger.
pub enum HeadStatus {
    Ready,
    Blocked,
    Failed(String),
}

/// Evaluates one activation against the readiness predicate, checking the
/// ledger failure case first since a settled failure outranks any other
/// blocking reason.
pub fn head_status<E>(
    activation: &Activation,
    callbacks: &CallbackRegistry<E>,
    factories: &DataFactoryMap,
    ledger: &PromiseCompletionLedger,
) -> HeadStatus {
    if activation.has_wait {
        match ledger.peek(activation.id) {
            Some(PromiseCompletionOutcome::Failure(message)) => {
                return HeadStatus::Failed(message.clone());
            }
            Some(PromiseCompletionOutcome::Success) => {}
            None => return HeadStatus::Blocked,
        }
    }

    if !callbacks.is_registered(&activation.identity.class_id) {
        return HeadStatus::Blocked;
    }

    if let Some(hash) = &activation.identity.data_hash {
        if !factories.contains(&activation.identity.class_id, hash) {
            return HeadStatus::Blocked;
        }
    }

    HeadStatus::Ready
}
