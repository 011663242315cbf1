//! Drive a store from a replay script and record every notification.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::core::types::Slice;
use crate::io::config::TripstateConfig;
use crate::io::document::load_document;
use crate::io::script::{BindingSpec, Operation, ReplayScript, load_script};
use crate::state::default_document;
use crate::store::{StateStore, Subscription};

/// One callback invocation observed during a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// 0 while connecting the script's bindings, then the 1-based op number.
    pub step: usize,
    pub binding: String,
    pub slice: Value,
}

/// Notifications in delivery order plus the document after the last op.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub notifications: Vec<Notification>,
    pub document: Value,
}

/// Inputs for [`replay_files`].
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub script: PathBuf,
    /// Overrides `[document] path` from the config.
    pub document: Option<PathBuf>,
    pub config: TripstateConfig,
}

/// Apply `script` to `store`, returning every notification in order.
///
/// Script errors (unknown binding ids, rejected writes) abort the replay and
/// name the failing op.
pub fn run_script(store: &mut StateStore, script: &ReplayScript) -> Result<Vec<Notification>> {
    let log: Rc<RefCell<Vec<Notification>>> = Rc::default();
    let step = Rc::new(Cell::new(0usize));
    let mut subscriptions: HashMap<String, Subscription> = HashMap::new();

    for spec in &script.bindings {
        connect(store, spec, &log, &step, &mut subscriptions);
    }

    for (index, op) in script.ops.iter().enumerate() {
        let number = index + 1;
        step.set(number);
        debug!(step = number, op = op.name(), "applying op");
        apply(store, op, &log, &step, &mut subscriptions)
            .with_context(|| format!("op #{} ({})", number, op.name()))?;
    }

    Ok(log.take())
}

/// Load config-selected document and script from disk, then replay.
pub fn replay_files(options: &ReplayOptions) -> Result<ReplayReport> {
    let document_path = options
        .document
        .as_deref()
        .or(options.config.document.path.as_deref());
    let initial = match document_path {
        Some(path) => load_document(path, options.config.document.schema.as_deref())
            .context("load initial document")?,
        None => default_document(),
    };
    let script = load_script(&options.script)?;

    let mut store = StateStore::with_policy(initial, options.config.coercion_policy());
    let notifications = run_script(&mut store, &script)?;
    info!(
        ops = script.ops.len(),
        notifications = notifications.len(),
        "replay finished"
    );
    Ok(ReplayReport {
        notifications,
        document: store.snapshot(),
    })
}

fn apply(
    store: &mut StateStore,
    op: &Operation,
    log: &Rc<RefCell<Vec<Notification>>>,
    step: &Rc<Cell<usize>>,
    subscriptions: &mut HashMap<String, Subscription>,
) -> Result<()> {
    match op {
        Operation::Set { path, value } => {
            store.set(path, value.clone())?;
        }
        Operation::Merge { value } => {
            store.merge(value.clone());
        }
        Operation::Reset { value } => store.reset(value.clone()),
        Operation::Connect(spec) => connect(store, spec, log, step, subscriptions),
        Operation::Trigger { id } => {
            if !store.trigger_update(id) {
                return Err(anyhow!("binding '{}' is not connected", id));
            }
        }
        Operation::Disconnect { id } => {
            let subscription = subscriptions
                .remove(id)
                .ok_or_else(|| anyhow!("binding '{}' is not connected", id))?;
            store.disconnect(subscription);
        }
    }
    Ok(())
}

fn connect(
    store: &mut StateStore,
    spec: &BindingSpec,
    log: &Rc<RefCell<Vec<Notification>>>,
    step: &Rc<Cell<usize>>,
    subscriptions: &mut HashMap<String, Subscription>,
) {
    let log = Rc::clone(log);
    let step = Rc::clone(step);
    let binding = spec.id.clone();
    let callback = move |slice: &Slice| {
        log.borrow_mut().push(Notification {
            step: step.get(),
            binding: binding.clone(),
            slice: slice.to_value(),
        });
    };
    let subscription = store.connect(spec.id.clone(), callback, spec.watch.iter());
    subscriptions.insert(spec.id.clone(), subscription);
    if spec.trigger {
        store.trigger_update(&spec.id);
    }
}
