//! Dot-separated paths into a JSON document, plus the accessors that walk them.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A parsed location inside the state document, e.g. `user.preferences.language`.
///
/// The raw string is split on `.` once, at construction. The empty string is
/// the document root. Segments that address a sequence are decimal indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    raw: String,
    segments: Vec<String>,
}

impl Path {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = if raw.is_empty() {
            Vec::new()
        } else {
            raw.split('.').map(str::to_string).collect()
        };
        Self { raw, segments }
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The first `len` segments joined back into a path string.
    fn prefix(&self, len: usize) -> String {
        self.segments[..len.min(self.segments.len())].join(".")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Path {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Path::new(s))
    }
}

impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        Path::new(raw)
    }
}

impl From<String> for Path {
    fn from(raw: String) -> Self {
        Path::new(raw)
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Self {
        path.clone()
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Path::new)
    }
}

/// Largest number of `null` slots `set_at` will pad a sequence with.
///
/// Indices further past the end are treated like non-index segments: coerced
/// under [`CoercionPolicy::Overwrite`], rejected under
/// [`CoercionPolicy::Reject`].
pub const MAX_PAD: usize = 1024;

/// What `set_at` does when an intermediate node cannot hold children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoercionPolicy {
    /// Replace the node with a fresh mapping (scalars) or pad sequences with
    /// `null` up to the requested index (at most [`MAX_PAD`] slots).
    #[default]
    Overwrite,
    /// Leave the document untouched and return a [`PathError`].
    Reject,
}

impl CoercionPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Reject } else { Self::Overwrite }
    }
}

/// Write failures. Reads never fail; absent data is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The root path can only be replaced by a mapping.
    RootNotMapping,
    /// A node on the path holds a value that cannot be descended into.
    NotAContainer { path: String, found: &'static str },
    /// A sequence index past the append slot.
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::RootNotMapping => f.write_str("document root must be a mapping"),
            PathError::NotAContainer { path, found } => {
                write!(f, "cannot descend into {} at '{}'", found, path)
            }
            PathError::IndexOutOfRange { path, index, len } => write!(
                f,
                "index {} out of range at '{}' (sequence length {})",
                index, path, len
            ),
        }
    }
}

impl std::error::Error for PathError {}

/// Return the node at `path`, or `None` as soon as any segment is missing.
pub fn get_at<'a>(document: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments
        .iter()
        .try_fold(document, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index)),
            _ => None,
        })
}

/// Assign `value` at `path`, creating intermediate mappings as needed.
///
/// Absent and `null` intermediates are replaced by mappings under either
/// policy; any other non-container is handled according to `policy`. On error
/// the nodes created before the failing segment are kept.
pub fn set_at(
    document: &mut Value,
    path: &Path,
    value: Value,
    policy: CoercionPolicy,
) -> Result<(), PathError> {
    let Some((last, parents)) = path.segments.split_last() else {
        if !value.is_object() {
            return Err(PathError::RootNotMapping);
        }
        *document = value;
        return Ok(());
    };

    let mut node = document;
    for (depth, segment) in parents.iter().enumerate() {
        prepare_container(node, segment, policy, path, depth)?;
        node = child_slot(node, segment, policy, path, depth)?;
    }
    prepare_container(node, last, policy, path, parents.len())?;
    *child_slot(node, last, policy, path, parents.len())? = value;
    Ok(())
}

/// Make `node` indexable by `segment`, coercing it when the policy allows.
fn prepare_container(
    node: &mut Value,
    segment: &str,
    policy: CoercionPolicy,
    path: &Path,
    depth: usize,
) -> Result<(), PathError> {
    let indexable = match node {
        Value::Object(_) => true,
        Value::Array(items) => match segment.parse::<usize>() {
            Ok(index) => policy == CoercionPolicy::Reject || within_pad(index, items.len()),
            Err(_) => false,
        },
        Value::Null => {
            *node = Value::Object(Map::new());
            true
        }
        _ => false,
    };
    if indexable {
        return Ok(());
    }
    match policy {
        CoercionPolicy::Overwrite => {
            *node = Value::Object(Map::new());
            Ok(())
        }
        CoercionPolicy::Reject => Err(PathError::NotAContainer {
            path: path.prefix(depth),
            found: kind(node),
        }),
    }
}

/// Slot for `segment` inside an already-prepared container. Missing keys are
/// inserted as `null`.
fn child_slot<'a>(
    node: &'a mut Value,
    segment: &str,
    policy: CoercionPolicy,
    path: &Path,
    depth: usize,
) -> Result<&'a mut Value, PathError> {
    match node {
        Value::Object(map) => Ok(map.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = segment
                .parse::<usize>()
                .map_err(|_| PathError::NotAContainer {
                    path: path.prefix(depth),
                    found: "sequence",
                })?;
            let len = items.len();
            let out_of_range = || PathError::IndexOutOfRange {
                path: path.prefix(depth + 1),
                index,
                len,
            };
            if index > len && (policy == CoercionPolicy::Reject || !within_pad(index, len)) {
                return Err(out_of_range());
            }
            if index >= len {
                let new_len = index.checked_add(1).ok_or_else(out_of_range)?;
                items.resize(new_len, Value::Null);
            }
            Ok(&mut items[index])
        }
        other => Err(PathError::NotAContainer {
            path: path.prefix(depth),
            found: kind(other),
        }),
    }
}

/// Whether writing `index` into a sequence of `len` items pads at most
/// [`MAX_PAD`] slots.
fn within_pad(index: usize, len: usize) -> bool {
    index.saturating_sub(len) <= MAX_PAD
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_splits_once_and_keeps_raw() {
        let path = Path::new("user.preferences.language");
        assert_eq!(path.segments(), ["user", "preferences", "language"]);
        assert_eq!(path.to_string(), "user.preferences.language");
        assert!(Path::new("").is_root());
        assert!(Path::root().segments().is_empty());
    }

    #[test]
    fn path_deserializes_from_string() {
        let paths: Vec<Path> = serde_json::from_value(json!(["a.b", ""])).expect("paths");
        assert_eq!(paths[0].segments(), ["a", "b"]);
        assert!(paths[1].is_root());
    }

    #[test]
    fn get_at_walks_mappings_and_sequences() {
        let doc = json!({"trip": {"days": [{"city": "Lisbon"}, {"city": "Porto"}]}});
        assert_eq!(
            get_at(&doc, &Path::new("trip.days.1.city")),
            Some(&json!("Porto"))
        );
        assert_eq!(get_at(&doc, &Path::root()), Some(&doc));
    }

    #[test]
    fn get_at_short_circuits_on_missing_segment() {
        let doc = json!({"user": {"isLoggedIn": false}});
        assert_eq!(get_at(&doc, &Path::new("user.profile.name")), None);
        assert_eq!(get_at(&doc, &Path::new("user.isLoggedIn.deeper")), None);
        assert_eq!(get_at(&doc, &Path::new("trip.days.x")), None);
    }

    /// Round-trip: whatever `set_at` writes, `get_at` reads back.
    #[test]
    fn set_then_get_round_trips() {
        let mut doc = json!({"user": {"isLoggedIn": false}});
        for (raw, value) in [
            ("user.isLoggedIn", json!(true)),
            ("user.preferences.language", json!("pt")),
            ("trip.days", json!([])),
            ("trip.days.0", json!({"city": "Faro"})),
            ("trip.days.0.city", json!("Braga")),
        ] {
            let path = Path::new(raw);
            set_at(&mut doc, &path, value.clone(), CoercionPolicy::Overwrite).expect("set");
            assert_eq!(get_at(&doc, &path), Some(&value), "path {}", raw);
        }
    }

    #[test]
    fn set_at_creates_intermediate_mappings() {
        let mut doc = json!({});
        set_at(&mut doc, &Path::new("a.b.c"), json!(1), CoercionPolicy::Reject).expect("set");
        assert_eq!(doc, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn set_at_replaces_null_intermediates_even_when_strict() {
        let mut doc = json!({"user": {"profile": null}});
        set_at(
            &mut doc,
            &Path::new("user.profile.name"),
            json!("Ana"),
            CoercionPolicy::Reject,
        )
        .expect("set");
        assert_eq!(doc, json!({"user": {"profile": {"name": "Ana"}}}));
    }

    /// Scalars on the way are silently replaced by mappings in lenient mode.
    #[test]
    fn set_at_overwrites_scalar_intermediates_by_default() {
        let mut doc = json!({"user": {"isLoggedIn": false}});
        set_at(
            &mut doc,
            &Path::new("user.isLoggedIn.since"),
            json!("2024-05-01"),
            CoercionPolicy::Overwrite,
        )
        .expect("set");
        assert_eq!(doc, json!({"user": {"isLoggedIn": {"since": "2024-05-01"}}}));
    }

    #[test]
    fn set_at_rejects_scalar_intermediates_when_strict() {
        let mut doc = json!({"user": {"isLoggedIn": false}});
        let err = set_at(
            &mut doc,
            &Path::new("user.isLoggedIn.since"),
            json!("2024-05-01"),
            CoercionPolicy::Reject,
        )
        .expect_err("strict mode rejects coercion");
        assert_eq!(
            err,
            PathError::NotAContainer {
                path: "user.isLoggedIn".to_string(),
                found: "boolean",
            }
        );
        assert_eq!(doc, json!({"user": {"isLoggedIn": false}}));
    }

    #[test]
    fn set_at_appends_and_pads_sequences() {
        let mut doc = json!({"days": ["mon"]});
        set_at(&mut doc, &Path::new("days.1"), json!("tue"), CoercionPolicy::Reject)
            .expect("append");
        assert_eq!(doc, json!({"days": ["mon", "tue"]}));

        let err = set_at(&mut doc, &Path::new("days.4"), json!("fri"), CoercionPolicy::Reject)
            .expect_err("gap");
        assert!(matches!(err, PathError::IndexOutOfRange { index: 4, len: 2, .. }));

        set_at(
            &mut doc,
            &Path::new("days.3"),
            json!("thu"),
            CoercionPolicy::Overwrite,
        )
        .expect("pad");
        assert_eq!(doc, json!({"days": ["mon", "tue", null, "thu"]}));
    }

    #[test]
    fn set_at_huge_index_coerces_instead_of_padding() {
        for raw in ["days.18446744073709551615", "days.1000000000000000"] {
            let mut doc = json!({"days": ["mon"]});
            let path = Path::new(raw);
            set_at(&mut doc, &path, json!("x"), CoercionPolicy::Overwrite).expect("lenient");
            assert_eq!(get_at(&doc, &path), Some(&json!("x")), "path {}", raw);
            assert!(doc["days"].is_object(), "path {}", raw);
        }
    }

    #[test]
    fn set_at_huge_index_is_out_of_range_when_strict() {
        let mut doc = json!({"days": ["mon"]});
        let err = set_at(
            &mut doc,
            &Path::new("days.18446744073709551615"),
            json!("x"),
            CoercionPolicy::Reject,
        )
        .expect_err("strict");
        assert!(matches!(
            err,
            PathError::IndexOutOfRange {
                index: usize::MAX,
                len: 1,
                ..
            }
        ));
        assert_eq!(doc, json!({"days": ["mon"]}));
    }

    #[test]
    fn set_at_pads_up_to_the_limit() {
        let mut doc = json!({"days": []});
        let path = Path::new(format!("days.{}", MAX_PAD));
        set_at(&mut doc, &path, json!("last"), CoercionPolicy::Overwrite).expect("pad");
        assert_eq!(doc["days"].as_array().map(Vec::len), Some(MAX_PAD + 1));
        assert_eq!(get_at(&doc, &path), Some(&json!("last")));
    }

    #[test]
    fn set_at_non_index_segment_on_sequence_follows_policy() {
        let mut doc = json!({"days": ["mon"]});
        let err = set_at(&mut doc, &Path::new("days.first"), json!(1), CoercionPolicy::Reject)
            .expect_err("strict");
        assert!(err.to_string().contains("sequence"));

        set_at(
            &mut doc,
            &Path::new("days.first"),
            json!(1),
            CoercionPolicy::Overwrite,
        )
        .expect("lenient");
        assert_eq!(doc, json!({"days": {"first": 1}}));
    }

    #[test]
    fn set_at_root_requires_mapping() {
        let mut doc = json!({"a": 1});
        assert_eq!(
            set_at(&mut doc, &Path::root(), json!(3), CoercionPolicy::Overwrite),
            Err(PathError::RootNotMapping)
        );
        set_at(&mut doc, &Path::root(), json!({"b": 2}), CoercionPolicy::Overwrite)
            .expect("replace root");
        assert_eq!(doc, json!({"b": 2}));
    }
}
