//! An in-memory [`Host`] used only by this crate's own test modules. Real
//! embedders provide their own; this one exists so the manager, registries,
//! and asset loader can be exercised without a real DOM.

use crate::host::Host;
use djc_types::TagDescriptor;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MockElement(u64);

#[derive(Default)]
struct Inner {
    body: Vec<MockElement>,
    head: Vec<MockElement>,
    instance_elements: HashMap<String, Vec<MockElement>>,
    load_outcomes: HashMap<MockElement, Result<(), String>>,
    envelopes: Vec<(MockElement, String)>,
    diagnostics: Vec<String>,
}

/// A fake document: elements are opaque integer handles, everything else
/// (body/head order, instance markers, load outcomes, envelopes) is plain
/// state a test arranges up front via the `set_*`/`push_*` helpers.
pub struct MockHost {
    next_id: AtomicU64,
    inner: Mutex<Inner>,
    mutation_tx: mpsc::UnboundedSender<(MockElement, String)>,
    mutation_rx: Mutex<Option<mpsc::UnboundedReceiver<(MockElement, String)>>>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            next_id: AtomicU64::new(1),
            inner: Mutex::new(Inner::default()),
            mutation_tx: tx,
            mutation_rx: Mutex::new(Some(rx)),
        }
    }

    fn next_element(&self) -> MockElement {
        MockElement(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn body_children(&self) -> Vec<MockElement> {
        self.inner.lock().unwrap().body.clone()
    }

    pub fn head_children(&self) -> Vec<MockElement> {
        self.inner.lock().unwrap().head.clone()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.inner.lock().unwrap().diagnostics.clone()
    }

    /// Registers `elements` as carrying instance `instance_id`'s marker, so
    /// `instance_elements` finds them.
    pub fn register_instance_elements(&self, instance_id: &str, elements: Vec<MockElement>) {
        self.inner
            .lock()
            .unwrap()
            .instance_elements
            .insert(instance_id.to_string(), elements);
    }

    /// Pre-arranges the result `await_element_load` returns for `element`.
    /// Without an entry, the load "fires" successfully as soon as it's
    /// awaited — good enough for tests that don't care about timing.
    pub fn set_load_outcome(&self, element: MockElement, outcome: Result<(), String>) {
        self.inner
            .lock()
            .unwrap()
            .load_outcomes
            .insert(element, outcome);
    }

    /// Seeds the elements `scan_envelopes` returns at startup.
    pub fn set_envelopes(&self, envelopes: Vec<(MockElement, String)>) {
        self.inner.lock().unwrap().envelopes = envelopes;
    }

    /// Simulates a new envelope element appearing after startup.
    pub fn push_mutation(&self, element: MockElement, text: impl Into<String>) {
        let _ = self.mutation_tx.send((element, text.into()));
    }
}

#[async_trait::async_trait]
impl Host for MockHost {
    type Element = MockElement;

    fn create_script(&self, _tag: &TagDescriptor) -> Self::Element {
        self.next_element()
    }

    fn create_link(&self, _tag: &TagDescriptor) -> Self::Element {
        self.next_element()
    }

    fn append_to_body(&self, element: &Self::Element) {
        self.inner.lock().unwrap().body.push(*element);
    }

    fn append_to_head(&self, element: &Self::Element) {
        self.inner.lock().unwrap().head.push(*element);
    }

    async fn await_element_load(&self, element: Self::Element) -> Result<(), String> {
        self.inner
            .lock()
            .unwrap()
            .load_outcomes
            .get(&element)
            .cloned()
            .unwrap_or(Ok(()))
    }

    fn instance_elements(&self, instance_id: &str) -> Vec<Self::Element> {
        self.inner
            .lock()
            .unwrap()
            .instance_elements
            .get(instance_id)
            .cloned()
            .unwrap_or_default()
    }

    fn scan_envelopes(&self) -> Vec<(Self::Element, String)> {
        self.inner.lock().unwrap().envelopes.clone()
    }

    fn mutation_stream(&self) -> BoxStream<'static, (Self::Element, String)> {
        let receiver = self
            .mutation_rx
            .lock()
            .unwrap()
            .take()
            .expect("mutation_stream called more than once on the same MockHost");
        futures::stream::unfold(receiver, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed()
    }

    fn log_diagnostic(&self, message: &str) {
        self.inner.lock().unwrap().diagnostics.push(message.to_string());
    }
}
