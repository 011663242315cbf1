//! A registered consumer of store notifications and its dirty-path state.

use std::fmt;

use serde_json::Value;

use crate::core::path::{Path, get_at};
use crate::core::types::{Slice, WatchedSlice};

/// Callback invoked with the binding's slice.
pub type Callback = Box<dyn FnMut(&Slice)>;

/// One connected consumer. Owned by the store; created on connect and
/// dropped on disconnect.
pub struct Binding {
    id: String,
    token: u64,
    callback: Callback,
    watched: Vec<Path>,
    /// `None` until the first notification establishes a baseline.
    last_observed: Option<Vec<Option<Value>>>,
}

impl Binding {
    pub(crate) fn new(id: String, token: u64, callback: Callback, watched: Vec<Path>) -> Self {
        Self {
            id,
            token,
            callback,
            watched,
            last_observed: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn token(&self) -> u64 {
        self.token
    }

    pub fn watched_paths(&self) -> &[Path] {
        &self.watched
    }

    pub fn has_baseline(&self) -> bool {
        self.last_observed.is_some()
    }

    /// Slice to deliver after a mutation, or `None` when nothing watched changed.
    ///
    /// Unwatched bindings always get the full document. Watched bindings get
    /// every watched path when at least one differs from the baseline; the
    /// baseline moves only in that case.
    ///
    /// Values are compared structurally, so writing an equal value (even a
    /// freshly built mapping) does not count as a change.
    pub(crate) fn observe(&mut self, document: &Value) -> Option<Slice> {
        if self.watched.is_empty() {
            return Some(Slice::Document(document.clone()));
        }
        let current = self.current_values(document);
        if self.last_observed.as_ref() == Some(&current) {
            return None;
        }
        Some(self.commit(current))
    }

    /// Slice for an unconditional notification (`reset`, `trigger_update`).
    pub(crate) fn force(&mut self, document: &Value) -> Slice {
        if self.watched.is_empty() {
            return Slice::Document(document.clone());
        }
        let current = self.current_values(document);
        self.commit(current)
    }

    pub(crate) fn deliver(&mut self, slice: &Slice) {
        (self.callback)(slice);
    }

    fn current_values(&self, document: &Value) -> Vec<Option<Value>> {
        self.watched
            .iter()
            .map(|path| get_at(document, path).cloned())
            .collect()
    }

    fn commit(&mut self, current: Vec<Option<Value>>) -> Slice {
        let entries = self.watched.iter().cloned().zip(current.iter().cloned());
        let slice = Slice::Watched(WatchedSlice::new(entries.collect()));
        self.last_observed = Some(current);
        slice
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("token", &self.token)
            .field("watched", &self.watched)
            .field("last_observed", &self.last_observed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn binding(watched: &[&str]) -> Binding {
        Binding::new(
            "nav".to_string(),
            0,
            Box::new(|_: &Slice| {}),
            watched.iter().map(|raw| Path::new(*raw)).collect(),
        )
    }

    /// Without a baseline every watched path counts as changed, even absent ones.
    #[test]
    fn first_observation_always_fires() {
        let mut nav = binding(&["user.isLoggedIn"]);
        assert!(!nav.has_baseline());
        let slice = nav.observe(&json!({})).expect("first observation fires");
        assert_eq!(slice.get("user.isLoggedIn"), None);
        assert!(nav.has_baseline());
    }

    #[test]
    fn unchanged_values_are_skipped() {
        let mut nav = binding(&["user.isLoggedIn"]);
        let doc = json!({"user": {"isLoggedIn": false}});
        nav.observe(&doc).expect("baseline");
        assert!(nav.observe(&doc).is_none());
        assert!(nav.observe(&json!({"user": {"isLoggedIn": false}, "x": 1})).is_none());
    }

    #[test]
    fn equal_mapping_is_not_a_change() {
        let mut profile = binding(&["user.profile"]);
        profile
            .observe(&json!({"user": {"profile": {"name": "Ana"}}}))
            .expect("baseline");
        let rebuilt = json!({"user": {"profile": {"name": "Ana"}}});
        assert!(profile.observe(&rebuilt).is_none());
    }

    #[test]
    fn any_changed_path_delivers_all_watched_paths() {
        let mut header = binding(&["user.isLoggedIn", "user.profile.name"]);
        header
            .observe(&json!({"user": {"isLoggedIn": false, "profile": {"name": "Ana"}}}))
            .expect("baseline");
        let slice = header
            .observe(&json!({"user": {"isLoggedIn": true, "profile": {"name": "Ana"}}}))
            .expect("changed");
        assert_eq!(
            slice.to_value(),
            json!({"user.isLoggedIn": true, "user.profile.name": "Ana"})
        );
    }

    #[test]
    fn unwatched_binding_gets_whole_document() {
        let mut all = binding(&[]);
        let doc = json!({"a": 1});
        assert_eq!(all.observe(&doc), Some(Slice::Document(doc.clone())));
        assert_eq!(all.observe(&doc), Some(Slice::Document(doc)));
        assert!(!all.has_baseline());
    }

    #[test]
    fn force_fires_and_refreshes_baseline() {
        let mut nav = binding(&["a"]);
        let doc = json!({"a": 1});
        nav.observe(&doc).expect("baseline");
        let slice = nav.force(&doc);
        assert_eq!(slice.get("a"), Some(&json!(1)));
        assert!(nav.observe(&doc).is_none());
    }
}
