use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The context handed to every callback in an activation's chain:
/// `{name: class-id, id: instance-id, els: [element, …]}`.
#[derive(Clone, Debug)]
pub struct ActivationContext<E> {
    pub name: String,
    pub id: String,
    pub els: Vec<E>,
}

/// A registered component callback: `(data, context) -> value or promise`.
pub type CallbackFn<E> =
    Arc<dyn Fn(Value, ActivationContext<E>) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

/// A registered data factory: a nullary function producing a fresh data
/// object. Invoked fresh at execution time, never cached — every call to
/// this function is expected to allocate.
pub type DataFactoryFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Maps component-class-id to its ordered, append-only callback list.
#[derive(Default)]
pub struct CallbackRegistry<E> {
    callbacks: Mutex<HashMap<String, Vec<CallbackFn<E>>>>,
}

impl<E> CallbackRegistry<E> {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(HashMap::new()),
        }
    }

    /// Appends `callback` to `class_id`'s list, creating the list if absent.
    pub fn register(&self, class_id: impl Into<String>, callback: CallbackFn<E>) {
        self.callbacks
            .lock()
            .expect("callback registry mutex poisoned")
            .entry(class_id.into())
            .or_default()
            .push(callback);
    }

    /// Whether `class_id` has at least one registered callback.
    pub fn is_registered(&self, class_id: &str) -> bool {
        self.callbacks
            .lock()
            .expect("callback registry mutex poisoned")
            .get(class_id)
            .is_some_and(|list| !list.is_empty())
    }

    /// The ordered callback chain for `class_id`, or an empty vec.
    pub fn chain_for(&self, class_id: &str) -> Vec<CallbackFn<E>> {
        self.callbacks
            .lock()
            .expect("callback registry mutex poisoned")
            .get(class_id)
            .cloned()
            .unwrap_or_default()
    }
}

/// Maps `(component-class-id, data-hash)` to a data factory. Last writer
/// wins on an identical key.
#[derive(Default)]
pub struct DataFactoryMap {
    factories: Mutex<HashMap<(String, String), DataFactoryFn>>,
}

impl DataFactoryMap {
    pub fn new() -> Self {
        Self {
            factories: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(
        &self,
        class_id: impl Into<String>,
        data_hash: impl Into<String>,
        factory: DataFactoryFn,
    ) {
        self.factories
            .lock()
            .expect("data factory map mutex poisoned")
            .insert((class_id.into(), data_hash.into()), factory);
    }

    pub fn contains(&self, class_id: &str, data_hash: &str) -> bool {
        self.factories
            .lock()
            .expect("data factory map mutex poisoned")
            .contains_key(&(class_id.to_string(), data_hash.to_string()))
    }

    pub fn get(&self, class_id: &str, data_hash: &str) -> Option<DataFactoryFn> {
        self.factories
            .lock()
            .expect("data factory map mutex poisoned")
            .get(&(class_id.to_string(), data_hash.to_string()))
            .cloned()
    }
}
