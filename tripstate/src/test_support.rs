//! Test-only helpers for recording notifications and writing fixture files.

use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::core::types::Slice;

/// Shared log of callback invocations, tagged by the callback that fired.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<(String, Slice)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that appends `(tag, slice)` to the log.
    pub fn callback(&self, tag: &str) -> impl FnMut(&Slice) + 'static {
        let calls = Rc::clone(&self.calls);
        let tag = tag.to_string();
        move |slice: &Slice| calls.borrow_mut().push((tag.clone(), slice.clone()))
    }

    pub fn count(&self, tag: &str) -> usize {
        self.calls.borrow().iter().filter(|(t, _)| t == tag).count()
    }

    pub fn slices(&self, tag: &str) -> Vec<Slice> {
        self.calls
            .borrow()
            .iter()
            .filter(|(t, _)| t == tag)
            .map(|(_, slice)| slice.clone())
            .collect()
    }

    pub fn last(&self, tag: &str) -> Option<Slice> {
        self.slices(tag).pop()
    }

    /// Tags in firing order.
    pub fn order(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

/// Run `f` with a thread-local subscriber and return the `WARN`+ log output.
pub fn capture_warnings<F: FnOnce()>(f: F) -> String {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    buf.contents()
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        let bytes = self.0.lock().map(|buf| buf.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut buf) = self.0.lock() {
            buf.extend_from_slice(data);
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Unwrap a `json!({...})` literal into a document root.
pub fn document(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("document fixture must be a mapping, got {}", other),
    }
}

/// Temporary directory for config, document, and script fixtures.
pub struct TestDir {
    dir: tempfile::TempDir,
}

impl TestDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` under the directory and return its path.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn write_json(&self, name: &str, value: &Value) -> Result<PathBuf> {
        let mut buf = serde_json::to_string_pretty(value)?;
        buf.push('\n');
        self.write(name, &buf)
    }
}
