use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use fixtura_core::{AttributeMap, Depth, Instance};

/// Result of one generate call, shaped by how many instances it produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch<R> {
    Empty,
    One(Instance<R>),
    Many(Vec<Instance<R>>),
}

impl<R> Batch<R> {
    pub fn from_vec(mut instances: Vec<Instance<R>>) -> Self {
        match instances.len() {
            0 => Batch::Empty,
            1 => instances.pop().map_or(Batch::Empty, Batch::One),
            _ => Batch::Many(instances),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Batch::Empty => 0,
            Batch::One(_) => 1,
            Batch::Many(instances) => instances.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Instances in override-set order.
    pub fn into_vec(self) -> Vec<Instance<R>> {
        match self {
            Batch::Empty => Vec::new(),
            Batch::One(instance) => vec![instance],
            Batch::Many(instances) => instances,
        }
    }

    pub fn into_one(self) -> Option<Instance<R>> {
        match self {
            Batch::One(instance) => Some(instance),
            _ => None,
        }
    }
}

/// Snapshot of one ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntry {
    pub depth: Depth,
    pub attributes: AttributeMap,
    pub tracked_at: DateTime<Utc>,
}

/// Outcome of cleaning up one blueprint name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupReport {
    pub name: String,
    pub table: String,
    pub identity_field: String,
    /// Ledger entries removed.
    pub removed: usize,
    /// Identity values handed to the storage adapter.
    pub ids: Vec<Value>,
}
