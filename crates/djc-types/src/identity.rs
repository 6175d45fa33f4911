use serde::{Deserialize, Serialize};

/// Identifies an activation request by the triple the envelope wire format
/// carries: which component class, which instance, and which data binding
/// (if any).
///
/// This is the identity a server-authored envelope names; it is distinct
/// from the workspace-local [`djc_ledger::ActivationId`], which is the
/// collision-free key actually used inside the queue. The same
/// `(class_id, instance_id, data_hash)` triple can legitimately be enqueued
/// more than once, so it cannot double as a ledger key on its own.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivationIdentity {
    pub class_id: String,
    pub instance_id: String,
    pub data_hash: Option<String>,
}

impl ActivationIdentity {
    pub fn new(
        class_id: impl Into<String>,
        instance_id: impl Into<String>,
        data_hash: Option<String>,
    ) -> Self {
        Self {
            class_id: class_id.into(),
            instance_id: instance_id.into(),
            data_hash,
        }
    }
}

impl std::fmt::Display for ActivationIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.data_hash {
            Some(hash) => write!(f, "{}#{}@{}", self.class_id, self.instance_id, hash),
            None => write!(f, "{}#{}", self.class_id, self.instance_id),
        }
    }
}
