//! Store configuration stored in `tripstate.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::write_atomic;
use crate::core::path::CoercionPolicy;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "tripstate.toml";

/// Store configuration (TOML).
///
/// Missing fields default to the lenient store with the built-in initial
/// document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TripstateConfig {
    pub store: StoreConfig,
    pub document: DocumentConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Reject writes that would replace a non-container node on the way to
    /// the target path, instead of silently overwriting it with a mapping.
    pub strict_paths: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocumentConfig {
    /// Initial document (JSON). Relative paths resolve against the config
    /// file's directory.
    pub path: Option<PathBuf>,

    /// Optional JSON Schema the initial document must satisfy.
    pub schema: Option<PathBuf>,
}

impl TripstateConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.document.path {
            if path.as_os_str().is_empty() {
                return Err(anyhow!("document.path must not be empty"));
            }
        }
        if self.document.schema.is_some() && self.document.path.is_none() {
            return Err(anyhow!("document.schema requires document.path"));
        }
        Ok(())
    }

    pub fn coercion_policy(&self) -> CoercionPolicy {
        CoercionPolicy::from_strict(self.store.strict_paths)
    }

    /// Resolve relative document and schema paths against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        self.document.path = self.document.path.map(resolve);
        self.document.schema = self.document.schema.map(resolve);
        self
    }
}

/// Config file to use: the explicit path if given, else `tripstate.toml` in `dir`.
pub fn config_path(explicit: Option<&Path>, dir: &Path) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.join(CONFIG_FILE))
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `TripstateConfig::default()`. Document
/// paths in the result are resolved against the file's directory.
pub fn load_config(path: &Path) -> Result<TripstateConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = TripstateConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: TripstateConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    debug!(path = %path.display(), strict = cfg.store.strict_paths, "config loaded");
    Ok(cfg.resolve_paths(base))
}

/// Write config as TOML, replacing any existing file atomically.
pub fn write_config(path: &Path, cfg: &TripstateConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    debug!(path = %path.display(), "writing config");
    write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, TripstateConfig::default());
        assert_eq!(cfg.coercion_policy(), CoercionPolicy::Overwrite);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tripstate.toml");
        let cfg = TripstateConfig {
            store: StoreConfig { strict_paths: true },
            document: DocumentConfig::default(),
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.coercion_policy(), CoercionPolicy::Reject);
    }

    #[test]
    fn relative_document_paths_resolve_against_config_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tripstate.toml");
        fs::write(
            &path,
            "[document]\npath = \"state/initial.json\"\nschema = \"/abs/schema.json\"\n",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(
            cfg.document.path,
            Some(temp.path().join("state/initial.json"))
        );
        assert_eq!(cfg.document.schema, Some(PathBuf::from("/abs/schema.json")));
    }

    #[test]
    fn config_path_prefers_explicit_file() {
        let dir = Path::new("/work");
        assert_eq!(config_path(None, dir), dir.join("tripstate.toml"));
        assert_eq!(
            config_path(Some(Path::new("custom.toml")), dir),
            PathBuf::from("custom.toml")
        );
    }

    #[test]
    fn schema_without_document_is_invalid() {
        let cfg = TripstateConfig {
            store: StoreConfig::default(),
            document: DocumentConfig {
                path: None,
                schema: Some(PathBuf::from("schema.json")),
            },
        };
        let err = cfg.validate().expect_err("invalid");
        assert!(err.to_string().contains("document.schema"));
    }
}
