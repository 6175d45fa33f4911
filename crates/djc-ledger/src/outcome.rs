/// The settled result of an activation's external wait-promise: a ledger
/// entry is `absent | success | failure(error)`, transitioning only
/// `absent -> success` or `absent -> failure`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromiseCompletionOutcome {
    Success,
    Failure(String),
}

impl PromiseCompletionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}
