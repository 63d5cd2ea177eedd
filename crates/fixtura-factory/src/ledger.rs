//! Per-blueprint record of generated, not yet cleaned up, instances.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;

use fixtura_core::{AttributeMap, Depth, Instance, Record, stored_form};

use crate::model::TrackedEntry;

#[derive(Clone)]
pub(crate) struct TrackedInstance {
    /// The `Instance<R>` handed to the caller; references share its allocation.
    instance: Arc<dyn Any + Send + Sync>,
    depth: Depth,
    attributes: AttributeMap,
    tracked_at: DateTime<Utc>,
}

impl TrackedInstance {
    pub(crate) fn new<R: Record>(instance: Instance<R>, attributes: AttributeMap) -> Self {
        Self {
            depth: instance.depth(),
            instance: Arc::new(instance),
            attributes,
            tracked_at: Utc::now(),
        }
    }

    fn identity(&self, field: &str) -> Value {
        self.attributes.get(field).cloned().unwrap_or(Value::Null)
    }
}

#[derive(Default)]
pub struct Ledger {
    entries: Mutex<HashMap<String, Vec<TrackedInstance>>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a whole batch under `name` in one critical section.
    pub(crate) fn append(&self, name: &str, batch: Vec<TrackedInstance>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .extend(batch);
    }

    pub fn len(&self, name: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Names with at least one tracked instance, sorted.
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = entries
            .iter()
            .filter(|(_, tracked)| !tracked.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Identity values of everything tracked under `name`.
    pub fn identities(&self, name: &str, field: &str) -> Vec<Value> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|tracked| tracked.iter().map(|entry| entry.identity(field)).collect())
            .unwrap_or_default()
    }

    /// Drop every instance of `name` whose identity is in `ids`.
    ///
    /// Returns how many instances were removed.
    pub fn prune(&self, name: &str, field: &str, ids: &[Value]) -> usize {
        let doomed: HashSet<String> = ids.iter().map(stored_form).collect();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tracked) = entries.get_mut(name) else {
            return 0;
        };
        let before = tracked.len();
        tracked.retain(|entry| !doomed.contains(&stored_form(&entry.identity(field))));
        before - tracked.len()
    }

    /// Tracked instances of `name` that were generated as `R`.
    pub fn instances<R: Record>(&self, name: &str) -> Vec<Instance<R>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|tracked| {
                tracked
                    .iter()
                    .filter_map(|entry| entry.instance.downcast_ref::<Instance<R>>().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn entries(&self, name: &str) -> Vec<TrackedEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|tracked| {
                tracked
                    .iter()
                    .map(|entry| TrackedEntry {
                        depth: entry.depth,
                        attributes: entry.attributes.clone(),
                        tracked_at: entry.tracked_at,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
