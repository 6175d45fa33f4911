use crate::queue::{ActivationQueue, HeadStatus, head_status};
use crate::registry::{CallbackRegistry, DataFactoryMap};
use djc_ledger::PromiseCompletionLedger;
use djc_types::ActivationIdentity;
use std::time::{Duration, Instant};

/// How often the stall reporter scans the queue while it has at least one
/// blocked activation. Implementation-defined; defaults to 5s.
#[derive(Clone, Copy, Debug)]
pub struct StallReporterConfig {
    interval: Duration,
}

impl Default for StallReporterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

impl StallReporterConfig {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval_duration(&self) -> Duration {
        self.interval
    }
}

/// One stall diagnostic: how many activations are currently blocked, and
/// which one has been blocked the longest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StallReport {
    pub blocked_count: usize,
    pub oldest_identity: ActivationIdentity,
    pub oldest_wait: Duration,
}

/// Scans every queued activation (not just the head) against the readiness
/// predicate. Purely observational — takes no locks beyond the caller's own
/// borrows and mutates nothing.
pub fn scan<E>(
    queue: &ActivationQueue,
    callbacks: &CallbackRegistry<E>,
    factories: &DataFactoryMap,
    ledger: &PromiseCompletionLedger,
    now: Instant,
) -> Option<StallReport> {
    let mut blocked_count = 0;
    let mut oldest: Option<(&ActivationIdentity, Instant)> = None;

    for activation in queue.iter() {
        let blocked = !matches!(
            head_status(activation, callbacks, factories, ledger),
            HeadStatus::Ready
        );
        if !blocked {
            continue;
        }
        blocked_count += 1;
        if oldest.is_none_or(|(_, at)| activation.enqueued_at < at) {
            oldest = Some((&activation.identity, activation.enqueued_at));
        }
    }

    let (identity, since) = oldest?;
    Some(StallReport {
        blocked_count,
        oldest_identity: identity.clone(),
        oldest_wait: now.saturating_duration_since(since),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Activation;
    use djc_ledger::{ActivationIdGenerator, ActivationLifecycle};
    use tokio::sync::oneshot;

    #[test]
    fn default_interval_is_five_seconds() {
        assert_eq!(
            StallReporterConfig::default().interval_duration(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn builder_overrides_interval() {
        let config = StallReporterConfig::default().interval(Duration::from_millis(250));
        assert_eq!(config.interval_duration(), Duration::from_millis(250));
    }

    #[test]
    fn scan_is_none_when_queue_empty() {
        let queue = ActivationQueue::new();
        let callbacks: CallbackRegistry<()> = CallbackRegistry::new();
        let factories = DataFactoryMap::new();
        let ledger = PromiseCompletionLedger::new();
        assert!(scan(&queue, &callbacks, &factories, &ledger, Instant::now()).is_none());
    }

    #[test]
    fn scan_reports_the_oldest_blocked_activation() {
        let ids = ActivationIdGenerator::new();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        let older = Instant::now();
        let newer = older + Duration::from_millis(50);

        let id1 = ids.next();
        let id2 = ids.next();

        let mut queue = ActivationQueue::new();
        queue.push(Activation {
            id: id1,
            identity: ActivationIdentity::new("y", "old", None),
            enqueued_at: older,
            has_wait: false,
            resolver: tx1,
            lifecycle: ActivationLifecycle::new(id1),
        });
        queue.push(Activation {
            id: id2,
            identity: ActivationIdentity::new("z", "new", None),
            enqueued_at: newer,
            has_wait: false,
            resolver: tx2,
            lifecycle: ActivationLifecycle::new(id2),
        });

        let callbacks: CallbackRegistry<()> = CallbackRegistry::new();
        let factories = DataFactoryMap::new();
        let ledger = PromiseCompletionLedger::new();

        let report = scan(
            &queue,
            &callbacks,
            &factories,
            &ledger,
            newer + Duration::from_millis(10),
        )
        .unwrap();

        assert_eq!(report.blocked_count, 2);
        assert_eq!(report.oldest_identity.instance_id, "old");
    }
}
