use crate::host::Host;
use djc_types::{AssetKind, DomainError, TagDescriptor};
use futures::FutureExt;
use futures::future::{BoxFuture, ready};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify};

/// A future standing in for a promise that either settles successfully or
/// carries an error message — a "wait-promise".
pub type WaitFuture = BoxFuture<'static, Result<(), String>>;

fn resolved() -> WaitFuture {
    ready(Ok(())).boxed()
}

/// The shared latch behind one `(kind, url)` waiter: exists at most once
/// per key, resolved at most once.
struct Waiter {
    notify: Notify,
    resolved: AtomicBool,
}

impl Waiter {
    fn new() -> Self {
        Self {
            notify: Notify::new(),
            resolved: AtomicBool::new(false),
        }
    }

    fn fire(&self) {
        self.resolved.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    async fn wait(self: Arc<Self>) {
        loop {
            if self.resolved.load(Ordering::Acquire) {
                return;
            }
            let notified = self.notify.notified();
            if self.resolved.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }
}

/// The asset registry and loader: tracks which URLs are known-loaded per
/// kind, and hands out latches to callers waiting on a not-yet-loaded URL.
///
/// `mark_loaded` is monotonic — once a `(kind, url)` pair is loaded it is
/// never un-loaded.
pub struct AssetRegistry {
    loaded: Mutex<HashMap<AssetKind, HashSet<String>>>,
    waiters: Mutex<HashMap<(AssetKind, String), Arc<Waiter>>>,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self {
            loaded: Mutex::new(HashMap::new()),
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Inserts `url` into the kind's loaded set and fires any waiter
    /// registered for it, exactly once.
    pub async fn mark_loaded(&self, kind: AssetKind, url: &str) {
        {
            let mut loaded = self.loaded.lock().await;
            loaded.entry(kind).or_default().insert(url.to_string());
        }
        let waiter = {
            let waiters = self.waiters.lock().await;
            waiters.get(&(kind, url.to_string())).cloned()
        };
        if let Some(waiter) = waiter {
            waiter.fire();
        }
    }

    /// Pure membership test.
    pub async fn is_loaded(&self, kind: AssetKind, url: &str) -> bool {
        self.loaded
            .lock()
            .await
            .get(&kind)
            .is_some_and(|set| set.contains(url))
    }

    async fn waiter_for(&self, kind: AssetKind, url: &str) -> Arc<Waiter> {
        let mut waiters = self.waiters.lock().await;
        waiters
            .entry((kind, url.to_string()))
            .or_insert_with(|| Arc::new(Waiter::new()))
            .clone()
    }

    /// A future resolving once every listed URL is loaded. URLs already
    /// loaded contribute immediately; the rest share a latch with every
    /// other caller waiting on the same `(kind, url)`.
    pub async fn wait_for(&self, kind: AssetKind, urls: &[String]) -> WaitFuture {
        let mut pending = Vec::new();
        for url in urls {
            if self.is_loaded(kind, url).await {
                continue;
            }
            pending.push(self.waiter_for(kind, url).await);
        }
        if pending.is_empty() {
            return resolved();
        }
        async move {
            for waiter in pending {
                waiter.wait().await;
            }
            Ok(())
        }
        .boxed()
    }

    /// Loads a `<script>` element. Dedups by source URL; marks loaded at
    /// insertion time, before the load event settles, so a failing or
    /// blocked URL does not re-block future `wait_for` calls on the same
    /// URL. Appends to the document body and returns a future that
    /// resolves on the element's load event. A URL already loaded returns
    /// an unappended element and a pre-resolved future. An inline-only
    /// script (no `src`) is appended but untracked.
    pub async fn load_script<H: Host>(
        &self,
        host: &Arc<H>,
        tag: &TagDescriptor,
    ) -> Result<(H::Element, WaitFuture), DomainError> {
        tag.expect(AssetKind::Script)?;
        let element = host.create_script(tag);

        let Some(src) = tag.source_url().map(str::to_string) else {
            tracing::trace!("appending inline script with no src, untracked");
            host.append_to_body(&element);
            return Ok((element, resolved()));
        };

        if self.is_loaded(AssetKind::Script, &src).await {
            tracing::debug!(%src, "script already loaded, skipping insertion");
            return Ok((element, resolved()));
        }

        self.mark_loaded(AssetKind::Script, &src).await;
        tracing::debug!(%src, "inserting script");
        host.append_to_body(&element);

        let host = Arc::clone(host);
        let awaited = element.clone();
        let future = async move { host.await_element_load(awaited).await }.boxed();
        Ok((element, future))
    }

    /// Loads a `<link>` stylesheet element. Dedups by href; fire-and-forget
    /// (no load tracking). Returns `None` when the href is already loaded.
    pub async fn load_stylesheet<H: Host>(
        &self,
        host: &Arc<H>,
        tag: &TagDescriptor,
    ) -> Result<Option<H::Element>, DomainError> {
        tag.expect(AssetKind::Stylesheet)?;

        if let Some(href) = tag.source_url() {
            if self.is_loaded(AssetKind::Stylesheet, href).await {
                return Ok(None);
            }
            self.mark_loaded(AssetKind::Stylesheet, href).await;
        }

        let element = host.create_link(tag);
        host.append_to_head(&element);
        Ok(Some(element))
    }
}
