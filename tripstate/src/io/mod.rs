//! I/O helpers for loading configuration, documents, and replay scripts, and
//! for scaffolding a new state directory.

pub mod config;
pub mod document;
pub mod init;
pub mod script;

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Replace `path` with `contents` via a sibling `<name>.tmp` file and a rename.
///
/// Missing parent directories are created.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("no file name in {}", path.display()))?;
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, contents).with_context(|| format!("write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))
}
