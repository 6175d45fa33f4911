use djc_types::TagDescriptor;
use futures::stream::BoxStream;
use std::hash::Hash;

/// The DOM/browser capability the manager needs, abstracted behind a trait
/// so the core is testable without a real browser. Every method here
/// corresponds to a concrete DOM operation the manager and ingestor need;
/// none of it is implemented in this crate — a real embedder (or the
/// `#[cfg(test)]` mock used by this crate's own tests) provides it.
///
/// `Element` is an opaque handle the host hands back for anything it
/// creates or discovers; the manager only ever compares, clones, and hashes
/// it, never inspects it.
#[async_trait::async_trait]
pub trait Host: Send + Sync + 'static {
    type Element: Clone + Eq + Hash + Send + Sync + std::fmt::Debug + 'static;

    /// Builds (but does not insert) a `<script>` element from a descriptor.
    fn create_script(&self, tag: &TagDescriptor) -> Self::Element;

    /// Builds (but does not insert) a `<link>` element from a descriptor.
    fn create_link(&self, tag: &TagDescriptor) -> Self::Element;

    /// Appends an element to `<body>`.
    fn append_to_body(&self, element: &Self::Element);

    /// Appends an element to `<head>`.
    fn append_to_head(&self, element: &Self::Element);

    /// Resolves when the given (already-inserted) script element fires its
    /// load event, or rejects with the error event's message.
    async fn await_element_load(&self, element: Self::Element) -> Result<(), String>;

    /// Queries the document for elements carrying the
    /// `data-djc-id-<instance_id>` marker attribute, in document order.
    fn instance_elements(&self, instance_id: &str) -> Vec<Self::Element>;

    /// Synchronous startup scan for `<script data-djc>` envelope elements,
    /// in document order, paired with each element's text content.
    fn scan_envelopes(&self) -> Vec<(Self::Element, String)>;

    /// A live stream of newly-inserted envelope elements (id + text
    /// content), in the order the host observes them. Expressed as a
    /// stream; the host decides whether that's backed by a mutation
    /// observer, polling, or something else.
    fn mutation_stream(&self) -> BoxStream<'static, (Self::Element, String)>;

    /// Writes a diagnostic to the host console.
    fn log_diagnostic(&self, message: &str);
}
