//! Scaffolding for `tripstate init`: a config file plus the initial document.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tracing::info;

use super::config::{CONFIG_FILE, DocumentConfig, StoreConfig, TripstateConfig, write_config};
use super::document::write_document;
use crate::state::default_document;

/// Initial document location, relative to the config file.
pub const DOCUMENT_FILE: &str = "state/initial.json";

/// Files written by [`init_project`].
#[derive(Debug, Clone)]
pub struct InitPaths {
    pub config_path: PathBuf,
    pub document_path: PathBuf,
}

impl InitPaths {
    pub fn new(root: &Path) -> Self {
        Self {
            config_path: root.join(CONFIG_FILE),
            document_path: root.join(DOCUMENT_FILE),
        }
    }
}

/// Options for [`init_project`].
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Overwrite existing files.
    pub force: bool,
    /// Write `strict_paths = true` into the config.
    pub strict: bool,
}

/// Write `tripstate.toml` and the built-in initial document under `root`.
///
/// Fails if either file already exists unless `options.force` is set.
pub fn init_project(root: &Path, options: &InitOptions) -> Result<InitPaths> {
    let paths = InitPaths::new(root);
    if !options.force {
        for existing in [&paths.config_path, &paths.document_path] {
            if existing.exists() {
                return Err(anyhow!(
                    "tripstate init: {} already exists (use --force to overwrite)",
                    existing.display()
                ));
            }
        }
    }

    let config = TripstateConfig {
        store: StoreConfig {
            strict_paths: options.strict,
        },
        document: DocumentConfig {
            path: Some(PathBuf::from(DOCUMENT_FILE)),
            schema: None,
        },
    };
    write_document(&paths.document_path, &default_document())?;
    write_config(&paths.config_path, &config)?;
    info!(root = %root.display(), strict = options.strict, "initialized");
    Ok(paths)
}
