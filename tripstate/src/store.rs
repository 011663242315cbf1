//! The state store: one JSON document and an ordered list of bindings.
//!
//! Every mutating call applies its change and notifies synchronously before
//! returning. Bindings are visited in registration order; replacing a binding
//! under an existing id keeps its position.
//!
//! Callbacks are plain `FnMut(&Slice)` closures and every mutation takes
//! `&mut self`, so a callback cannot call back into the store during a
//! notification pass.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::binding::Binding;
use crate::core::path::{CoercionPolicy, Path, PathError, get_at, set_at};
use crate::core::types::Slice;

/// Handle returned by [`StateStore::connect`]; pass it to
/// [`StateStore::disconnect`] to remove the binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[must_use = "the binding stays connected until this is passed to StateStore::disconnect"]
pub struct Subscription {
    id: String,
    token: u64,
}

impl Subscription {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Single source of truth for application state.
#[derive(Debug)]
pub struct StateStore {
    /// Always a `Value::Object`.
    document: Value,
    bindings: Vec<Binding>,
    policy: CoercionPolicy,
    next_token: u64,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(Map::new())
    }
}

impl StateStore {
    pub fn new(initial: Map<String, Value>) -> Self {
        Self::with_policy(initial, CoercionPolicy::default())
    }

    pub fn with_policy(initial: Map<String, Value>, policy: CoercionPolicy) -> Self {
        Self {
            document: Value::Object(initial),
            bindings: Vec::new(),
            policy,
            next_token: 0,
        }
    }

    pub fn policy(&self) -> CoercionPolicy {
        self.policy
    }

    /// Deep copy of the value at `path`; `None` if any segment is missing.
    pub fn get(&self, path: impl Into<Path>) -> Option<Value> {
        get_at(&self.document, &path.into()).cloned()
    }

    /// Deep copy of the whole document.
    pub fn snapshot(&self) -> Value {
        self.document.clone()
    }

    /// Replace the node at `path` and notify changed bindings.
    ///
    /// Returns a copy of the updated document. Fails only for a non-mapping
    /// root write, or for coercion under [`CoercionPolicy::Reject`]. Watched
    /// values are compared structurally: writing an equal value notifies
    /// only bindings that watch nothing.
    pub fn set(&mut self, path: impl Into<Path>, value: Value) -> Result<Value, PathError> {
        let path = path.into();
        set_at(&mut self.document, &path, value, self.policy)?;
        debug!(path = %path, "state set");
        self.notify_changed();
        Ok(self.snapshot())
    }

    /// Shallow-merge the top-level keys of `partial` into the root and notify
    /// changed bindings.
    pub fn merge(&mut self, partial: Map<String, Value>) -> Value {
        let keys = partial.len();
        self.root_mut().extend(partial);
        debug!(keys, "state merged");
        self.notify_changed();
        self.snapshot()
    }

    /// Replace the whole document and notify every binding unconditionally.
    pub fn reset(&mut self, document: Map<String, Value>) {
        self.document = Value::Object(document);
        debug!(bindings = self.bindings.len(), "state reset");
        let document = &self.document;
        for binding in &mut self.bindings {
            let slice = binding.force(document);
            binding.deliver(&slice);
        }
    }

    /// [`StateStore::reset`] to an empty mapping.
    pub fn reset_empty(&mut self) {
        self.reset(Map::new());
    }

    /// Register `callback` under `id`.
    ///
    /// With no watched paths the callback receives the full document after
    /// every mutation; otherwise only when a watched value changed. An id that
    /// is already connected is replaced in place, with a warning.
    pub fn connect<F, I, P>(
        &mut self,
        id: impl Into<String>,
        callback: F,
        watched: I,
    ) -> Subscription
    where
        F: FnMut(&Slice) + 'static,
        I: IntoIterator<Item = P>,
        P: Into<Path>,
    {
        let id = id.into();
        let token = self.next_token;
        self.next_token += 1;
        let watched: Vec<Path> = watched.into_iter().map(Into::into).collect();
        debug!(binding = %id, watched = watched.len(), "binding connected");
        let binding = Binding::new(id.clone(), token, Box::new(callback), watched);

        match self.bindings.iter_mut().find(|existing| existing.id() == id) {
            Some(existing) => {
                warn!(binding = %id, "binding id already connected; replacing previous binding");
                *existing = binding;
            }
            None => self.bindings.push(binding),
        }
        Subscription { id, token }
    }

    /// Remove the binding created by `subscription`.
    ///
    /// Returns `false` if it was already removed, or replaced by a later
    /// `connect` under the same id (the replacement stays connected).
    pub fn disconnect(&mut self, subscription: Subscription) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|binding| {
            !(binding.id() == subscription.id && binding.token() == subscription.token)
        });
        let removed = self.bindings.len() != before;
        debug!(binding = %subscription.id, removed, "binding disconnected");
        removed
    }

    /// Remove whatever binding is currently connected under `id`.
    pub fn disconnect_id(&mut self, id: &str) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|binding| binding.id() != id);
        let removed = self.bindings.len() != before;
        debug!(binding = %id, removed, "binding disconnected by id");
        removed
    }

    /// Notify the named binding once with its current slice, changed or not.
    ///
    /// Used to deliver the first render after `connect`. Returns `false` when
    /// no binding has that id.
    pub fn trigger_update(&mut self, id: &str) -> bool {
        let document = &self.document;
        let Some(binding) = self.bindings.iter_mut().find(|binding| binding.id() == id) else {
            debug!(binding = %id, "trigger for unknown binding");
            return false;
        };
        let slice = binding.force(document);
        binding.deliver(&slice);
        true
    }

    pub fn is_connected(&self, id: &str) -> bool {
        self.bindings.iter().any(|binding| binding.id() == id)
    }

    /// Connected binding ids in notification order.
    pub fn binding_ids(&self) -> Vec<&str> {
        self.bindings.iter().map(Binding::id).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn notify_changed(&mut self) {
        let document = &self.document;
        let mut notified = 0usize;
        for binding in &mut self.bindings {
            if let Some(slice) = binding.observe(document) {
                binding.deliver(&slice);
                notified += 1;
            }
        }
        debug!(notified, total = self.bindings.len(), "notification pass");
    }

    fn root_mut(&mut self) -> &mut Map<String, Value> {
        if !self.document.is_object() {
            self.document = Value::Object(Map::new());
        }
        match &mut self.document {
            Value::Object(root) => root,
            _ => unreachable!("document root is always a mapping"),
        }
    }
}
