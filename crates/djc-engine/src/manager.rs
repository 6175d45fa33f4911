use crate::assets::{AssetRegistry, WaitFuture};
use crate::error::EngineError;
use crate::host::Host;
use crate::queue::{Activation, ActivationQueue, HeadStatus, head_status};
use crate::registry::{ActivationContext, CallbackFn, CallbackRegistry, DataFactoryFn, DataFactoryMap};
use crate::stall::{self, StallReporterConfig};
use djc_ledger::{ActivationIdGenerator, ActivationLifecycle, ActivationState, PromiseCompletionLedger};
use djc_types::{ActivationIdentity, AssetKind, DomainError, TagDescriptor};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Notify, oneshot};
use tokio::task::JoinHandle;

/// The component manager — the crate's single public entry point. Owns
/// every registry, the activation queue and ledger, and the host handle;
/// drives the drain loop and the stall reporter as background tasks on
/// `tokio`'s runtime rather than exposing them as methods the caller must
/// pump.
pub struct ComponentManager<H: Host> {
    host: Arc<H>,
    assets: AssetRegistry,
    callbacks: CallbackRegistry<H::Element>,
    factories: DataFactoryMap,
    queue: Mutex<ActivationQueue>,
    ledger: Mutex<PromiseCompletionLedger>,
    ids: ActivationIdGenerator,
    drain_notify: Notify,
    stall_config: StallReporterConfig,
    stall_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<H: Host> ComponentManager<H> {
    /// Builds a manager around `host` and spawns its drain task. The drain
    /// task lives for as long as the returned `Arc` has a strong reference
    /// remaining; there is no explicit shutdown method.
    pub fn new(host: H) -> Arc<Self> {
        Self::with_stall_config(host, StallReporterConfig::default())
    }

    pub fn with_stall_config(host: H, stall_config: StallReporterConfig) -> Arc<Self> {
        let manager = Arc::new(Self {
            host: Arc::new(host),
            assets: AssetRegistry::new(),
            callbacks: CallbackRegistry::new(),
            factories: DataFactoryMap::new(),
            queue: Mutex::new(ActivationQueue::new()),
            ledger: Mutex::new(PromiseCompletionLedger::new()),
            ids: ActivationIdGenerator::new(),
            drain_notify: Notify::new(),
            stall_config,
            stall_handle: Mutex::new(None),
        });

        let drain_task_manager = Arc::clone(&manager);
        tokio::spawn(async move {
            loop {
                drain_task_manager.drain_notify.notified().await;
                drain_task_manager.drain_once().await;
            }
        });

        manager
    }

    pub(crate) fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Appends to the class-id's callback chain and wakes the drain loop,
    /// since this may unblock the current head.
    pub fn register_callback(&self, class_id: impl Into<String>, callback: CallbackFn<H::Element>) {
        self.callbacks.register(class_id, callback);
        self.request_drain();
    }

    /// Registers the data factory for a `(class_id, data_hash)` pair.
    pub fn register_data_factory(
        &self,
        class_id: impl Into<String>,
        data_hash: impl Into<String>,
        factory: DataFactoryFn,
    ) {
        self.factories.register(class_id, data_hash, factory);
        self.request_drain();
    }

    /// Marks a `(kind, url)` asset as loaded and requests a drain pass.
    pub async fn mark_loaded(&self, kind: &str, url: &str) -> Result<(), DomainError> {
        let kind = AssetKind::parse(kind)?;
        self.assets.mark_loaded(kind, url).await;
        self.request_drain();
        Ok(())
    }

    /// Pure membership test for a `(kind, url)` asset.
    pub async fn is_loaded(&self, kind: &str, url: &str) -> Result<bool, DomainError> {
        let kind = AssetKind::parse(kind)?;
        Ok(self.assets.is_loaded(kind, url).await)
    }

    /// A future resolving once every listed URL of `kind` is loaded.
    pub async fn wait_for(&self, kind: &str, urls: &[String]) -> Result<WaitFuture, DomainError> {
        let kind = AssetKind::parse(kind)?;
        Ok(self.assets.wait_for(kind, urls).await)
    }

    /// Loads a `<script>` element through the asset registry.
    pub async fn load_script(
        &self,
        tag: &TagDescriptor,
    ) -> Result<(H::Element, WaitFuture), DomainError> {
        self.assets.load_script(&self.host, tag).await
    }

    /// Loads a `<link>` stylesheet element through the asset registry.
    pub async fn load_stylesheet(
        &self,
        tag: &TagDescriptor,
    ) -> Result<Option<H::Element>, DomainError> {
        self.assets.load_stylesheet(&self.host, tag).await
    }

    /// Allocates an id, optionally spawns a task that settles the
    /// wait-promise into the ledger, appends to the FIFO queue, arms the
    /// stall reporter, and requests a drain. Returns the observing promise;
    /// never itself blocks on execution.
    pub async fn enqueue(
        self: &Arc<Self>,
        class_id: impl Into<String>,
        instance_id: impl Into<String>,
        data_hash: Option<String>,
        wait: Option<WaitFuture>,
    ) -> BoxFuture<'static, Result<Value, EngineError>> {
        let identity = ActivationIdentity::new(class_id, instance_id, data_hash);
        let id = self.ids.next();
        let (resolver, receiver) = oneshot::channel();
        let has_wait = wait.is_some();

        if let Some(wait) = wait {
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                let outcome = wait.await;
                let mut ledger = manager.ledger.lock().await;
                let settled = match outcome {
                    Ok(()) => ledger.record_success(id),
                    Err(message) => ledger.record_failure(id, message),
                };
                drop(ledger);
                settled.expect("activation ids are allocated exactly once, never reused");
                manager.request_drain();
            });
        }

        let activation = Activation {
            id,
            identity,
            enqueued_at: Instant::now(),
            has_wait,
            resolver,
            lifecycle: ActivationLifecycle::new(id),
        };

        self.queue.lock().await.push(activation);
        self.arm_stall_reporter().await;
        self.request_drain();

        observe(receiver)
    }

    /// Wakes the drain task. Coalesces naturally: `Notify::notify_one`
    /// stores at most one permit, so requests arriving while a drain pass
    /// is already running just cause one harmless extra pass afterwards.
    fn request_drain(&self) {
        self.drain_notify.notify_one();
    }

    /// Starts the periodic stall scan if it isn't already running.
    /// Idempotent — at most one timer is ever active.
    async fn arm_stall_reporter(self: &Arc<Self>) {
        let mut handle = self.stall_handle.lock().await;
        if handle.is_some() {
            return;
        }
        let manager = Arc::clone(self);
        let interval = self.stall_config.interval_duration();
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                manager.report_stall_if_any().await;
            }
        }));
    }

    /// Disarms the stall reporter once the queue has fully drained.
    async fn disarm_stall_reporter(&self) {
        if let Some(handle) = self.stall_handle.lock().await.take() {
            handle.abort();
        }
    }

    async fn report_stall_if_any(&self) {
        let queue = self.queue.lock().await;
        let ledger = self.ledger.lock().await;
        if let Some(report) = stall::scan(&queue, &self.callbacks, &self.factories, &ledger, Instant::now()) {
            let message = format!(
                "{} activation(s) blocked; oldest is {} ({:.1}s)",
                report.blocked_count,
                report.oldest_identity,
                report.oldest_wait.as_secs_f64()
            );
            tracing::warn!(%message, "activation queue stalled");
            self.host.log_diagnostic(&message);
        }
    }

    /// The drain algorithm. Pops and executes ready activations until the
    /// head is blocked, the queue is empty, or the head's wait-promise
    /// failed (in which case the whole queue is flushed).
    async fn drain_once(self: &Arc<Self>) {
        loop {
            let step = self.next_step().await;
            match step {
                Step::Empty => {
                    self.disarm_stall_reporter().await;
                    break;
                }
                Step::Blocked => break,
                Step::Failed { identity, error } => {
                    tracing::error!(%identity, %error, "wait-promise failed, flushing activation queue");
                    self.host
                        .log_diagnostic(&format!("queue flushed after {identity} failed: {error}"));
                    self.disarm_stall_reporter().await;
                    break;
                }
                Step::Ready(activation) => {
                    self.execute(activation).await;
                }
            }
        }
    }

    /// Inspects (and, if ready, pops) the queue head. On fatal failure,
    /// flushes every remaining activation and clears the ledger in the
    /// same critical section, so a concurrent `enqueue` never observes a
    /// half-flushed queue.
    async fn next_step(&self) -> Step {
        let mut queue = self.queue.lock().await;
        let mut ledger = self.ledger.lock().await;

        let (identity, status) = match queue.front() {
            None => return Step::Empty,
            Some(head) => (
                head.identity.clone(),
                head_status(head, &self.callbacks, &self.factories, &ledger),
            ),
        };

        match status {
            HeadStatus::Blocked => Step::Blocked,
            HeadStatus::Ready => {
                let mut activation = queue.pop_front().expect("head was just confirmed present");
                ledger.take(activation.id);
                activation
                    .lifecycle
                    .advance(ActivationState::Ready)
                    .expect("queue head is always still Queued when popped");
                Step::Ready(activation)
            }
            HeadStatus::Failed(error) => {
                let mut flushed = queue.drain_all().into_iter();
                ledger.clear();
                drop(queue);
                drop(ledger);

                if let Some(mut head) = flushed.next() {
                    let _ = head
                        .lifecycle
                        .advance(ActivationState::FlushedByUpstreamFailure);
                    let _ = head.resolver.send(Err(EngineError::ScriptLoadFailed {
                        identity: identity.clone(),
                        upstream: error.clone(),
                    }));
                }
                // The rest of these observing promises would otherwise be
                // unresolved forever. Dropping the sender resolves them
                // instead of leaking the tasks awaiting them.
                for mut activation in flushed {
                    let _ = activation
                        .lifecycle
                        .advance(ActivationState::FlushedByUpstreamFailure);
                    let _ = activation.resolver.send(Err(EngineError::Flushed));
                }
                Step::Failed { identity, error }
            }
        }
    }

    /// Runs the full callback chain for one activation and settles its
    /// observing promise.
    async fn execute(&self, activation: Activation) {
        let Activation {
            identity,
            resolver,
            mut lifecycle,
            ..
        } = activation;

        let _ = lifecycle.advance(ActivationState::Executing);

        let chain = self.callbacks.chain_for(&identity.class_id);
        if chain.is_empty() {
            let _ = lifecycle.advance(ActivationState::Rejected);
            let _ = resolver.send(Err(EngineError::NoCallback {
                identity: identity.clone(),
            }));
            return;
        }

        let els = self.host.instance_elements(&identity.instance_id);
        if els.is_empty() {
            let _ = lifecycle.advance(ActivationState::Rejected);
            let _ = resolver.send(Err(EngineError::NoElements {
                identity: identity.clone(),
            }));
            return;
        }

        let data = match &identity.data_hash {
            None => Value::Null,
            Some(hash) => match self.factories.get(&identity.class_id, hash) {
                Some(factory) => factory(),
                None => {
                    let _ = lifecycle.advance(ActivationState::Rejected);
                    let _ = resolver.send(Err(EngineError::NoDataFactory {
                        identity: identity.clone(),
                    }));
                    return;
                }
            },
        };

        let context = ActivationContext {
            name: identity.class_id.clone(),
            id: identity.instance_id.clone(),
            els,
        };

        let mut value = data;
        for callback in chain {
            match callback(value.clone(), context.clone()).await {
                Ok(result) => value = result,
                Err(message) => {
                    let _ = lifecycle.advance(ActivationState::Rejected);
                    let error = EngineError::CallbackFailure {
                        identity: identity.clone(),
                        message: message.clone(),
                    };
                    if resolver.send(Err(error)).is_err() {
                        let diagnostic =
                            format!("activation {identity} failed with no observer: {message}");
                        tracing::warn!("{diagnostic}");
                        self.host.log_diagnostic(&diagnostic);
                    }
                    return;
                }
            }
        }

        let _ = lifecycle.advance(ActivationState::Resolved);
        let _ = resolver.send(Ok(value));
    }
}

/// What one pass of [`ComponentManager::next_step`] decided to do.
enum Step {
    Empty,
    Blocked,
    Failed {
        identity: ActivationIdentity,
        error: String,
    },
    Ready(Activation),
}

/// Flattens the raw `oneshot::Receiver` into the activation's observing
/// promise: a dropped sender (receiver error) becomes `EngineError::Flushed`
/// rather than a channel-level error type callers shouldn't need to know
/// about.
fn observe(
    receiver: oneshot::Receiver<Result<Value, EngineError>>,
) -> BoxFuture<'static, Result<Value, EngineError>> {
    async move {
        match receiver.await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Flushed),
        }
    }
    .boxed()
}
