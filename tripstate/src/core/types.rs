//! Values handed to binding callbacks.

use serde_json::{Map, Value};

use crate::core::path::{CoercionPolicy, Path, get_at, set_at};

/// What a binding callback receives on notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Slice {
    /// Copy of the whole document, for bindings that watch nothing.
    Document(Value),
    /// Current value of every watched path, in watch order.
    Watched(WatchedSlice),
}

impl Slice {
    /// Look up a value by path string.
    ///
    /// For [`Slice::Watched`] this matches watched paths verbatim; for
    /// [`Slice::Document`] it walks the document.
    pub fn get(&self, path: &str) -> Option<&Value> {
        match self {
            Slice::Document(document) => get_at(document, &Path::new(path)),
            Slice::Watched(watched) => watched.get(path),
        }
    }

    /// Flat JSON form: the document itself, or `{ "<path>": value }` with
    /// absent paths omitted.
    pub fn to_value(&self) -> Value {
        match self {
            Slice::Document(document) => document.clone(),
            Slice::Watched(watched) => Value::Object(watched.to_map()),
        }
    }

    /// Document-shaped JSON, suitable as a template context.
    pub fn to_context(&self) -> Value {
        match self {
            Slice::Document(document) => document.clone(),
            Slice::Watched(watched) => watched.to_document(),
        }
    }
}

/// Watched paths paired with their current values (`None` when absent).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchedSlice {
    entries: Vec<(Path, Option<Value>)>,
}

impl WatchedSlice {
    pub fn new(entries: Vec<(Path, Option<Value>)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(watched, _)| watched.as_str() == path)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, Option<&Value>)> {
        self.entries
            .iter()
            .map(|(path, value)| (path, value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn to_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter_map(|(path, value)| Some((path.to_string(), value.clone()?)))
            .collect()
    }

    /// Re-nest the watched values into a fresh document, so `user.name`
    /// becomes `{"user": {"name": ...}}`. Later paths win on overlap.
    fn to_document(&self) -> Value {
        let mut document = Value::Object(Map::new());
        for (path, value) in &self.entries {
            let Some(value) = value else { continue };
            // Only a non-mapping value watched at the root can fail; it has no
            // place in a document-shaped context.
            let _ = set_at(&mut document, path, value.clone(), CoercionPolicy::Overwrite);
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn watched() -> WatchedSlice {
        WatchedSlice::new(vec![
            (Path::new("user.isLoggedIn"), Some(json!(true))),
            (Path::new("user.profile.name"), Some(json!("Ana"))),
            (Path::new("trip.destination"), None),
        ])
    }

    #[test]
    fn watched_slice_looks_up_by_verbatim_path() {
        let slice = Slice::Watched(watched());
        assert_eq!(slice.get("user.isLoggedIn"), Some(&json!(true)));
        assert_eq!(slice.get("trip.destination"), None);
        assert_eq!(slice.get("user"), None);
    }

    #[test]
    fn watched_slice_iterates_in_watch_order() {
        let slice = watched();
        assert_eq!(slice.len(), 3);
        assert!(!slice.is_empty());
        assert!(WatchedSlice::default().is_empty());
        let paths: Vec<&str> = slice.iter().map(|(path, _)| path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["user.isLoggedIn", "user.profile.name", "trip.destination"]
        );
        let absent: Vec<&str> = slice
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(path, _)| path.as_str())
            .collect();
        assert_eq!(absent, vec!["trip.destination"]);
    }

    #[test]
    fn document_slice_walks_paths() {
        let slice = Slice::Document(json!({"user": {"isLoggedIn": false}}));
        assert_eq!(slice.get("user.isLoggedIn"), Some(&json!(false)));
    }

    #[test]
    fn to_value_omits_absent_paths() {
        assert_eq!(
            Slice::Watched(watched()).to_value(),
            json!({"user.isLoggedIn": true, "user.profile.name": "Ana"})
        );
    }

    #[test]
    fn to_context_renests_watched_values() {
        assert_eq!(
            Slice::Watched(watched()).to_context(),
            json!({"user": {"isLoggedIn": true, "profile": {"name": "Ana"}}})
        );
    }
}
