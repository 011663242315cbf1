//! Replay scripts: bindings to connect and store operations to apply.
//!
//! ```json
//! {
//!   "bindings": [{ "id": "nav", "watch": ["user.isLoggedIn"], "trigger": true }],
//!   "ops": [
//!     { "op": "set", "path": "user.isLoggedIn", "value": true },
//!     { "op": "merge", "value": { "ui": { "loading": true } } },
//!     { "op": "trigger", "id": "nav" },
//!     { "op": "disconnect", "id": "nav" },
//!     { "op": "reset" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::path::Path as StatePath;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    /// Bindings connected, in order, before the first operation.
    #[serde(default)]
    pub bindings: Vec<BindingSpec>,
    #[serde(default)]
    pub ops: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub id: String,
    #[serde(default)]
    pub watch: Vec<StatePath>,
    /// Deliver an initial notification right after connecting.
    #[serde(default)]
    pub trigger: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Set {
        path: StatePath,
        value: Value,
    },
    Merge {
        value: Map<String, Value>,
    },
    Reset {
        #[serde(default)]
        value: Map<String, Value>,
    },
    Connect(BindingSpec),
    Trigger {
        id: String,
    },
    Disconnect {
        id: String,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Set { .. } => "set",
            Operation::Merge { .. } => "merge",
            Operation::Reset { .. } => "reset",
            Operation::Connect(_) => "connect",
            Operation::Trigger { .. } => "trigger",
            Operation::Disconnect { .. } => "disconnect",
        }
    }
}

/// Load a replay script (JSON) from disk.
pub fn load_script(path: &Path) -> Result<ReplayScript> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read script {}", path.display()))?;
    let script: ReplayScript = serde_json::from_str(&contents)
        .with_context(|| format!("parse script {}", path.display()))?;
    debug!(
        path = %path.display(),
        bindings = script.bindings.len(),
        ops = script.ops.len(),
        "script loaded"
    );
    Ok(script)
}
