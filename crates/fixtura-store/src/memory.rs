use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use fixtura_core::{AttributeMap, stored_form};

use crate::adapter::StorageAdapter;
use crate::error::StoreResult;

/// A `create` call as received by the in-memory store.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCall {
    pub table: String,
    pub records: usize,
}

/// A `remove` call as received by the in-memory store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveCall {
    pub table: String,
    pub identity_field: String,
    pub ids: Vec<Value>,
}

#[derive(Debug, Default)]
struct Journal {
    creates: Vec<CreateCall>,
    removes: Vec<RemoveCall>,
}

/// Table-keyed row store held in memory.
///
/// Intended for tests: besides the rows it keeps a journal of every call it
/// received so callers can assert what the factory issued.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<BTreeMap<String, Vec<AttributeMap>>>,
    journal: Mutex<Journal>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently stored in `table`.
    pub fn rows(&self, table: &str) -> Vec<AttributeMap> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, table: &str) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .map_or(0, Vec::len)
    }

    /// Drop every row and forget the call journal.
    pub fn clear(&self) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self.journal.lock().unwrap_or_else(PoisonError::into_inner) = Journal::default();
    }

    pub fn create_calls(&self) -> Vec<CreateCall> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .creates
            .clone()
    }

    pub fn remove_calls(&self) -> Vec<RemoveCall> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .removes
            .clone()
    }
}

#[async_trait]
impl StorageAdapter for InMemoryStore {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, table: &str, records: &[AttributeMap]) -> StoreResult<()> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .creates
            .push(CreateCall {
                table: table.to_string(),
                records: records.len(),
            });
        if records.is_empty() {
            return Ok(());
        }

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables
            .entry(table.to_string())
            .or_default()
            .extend(records.iter().cloned());
        debug!(table, rows = records.len(), "stored rows in memory");
        Ok(())
    }

    async fn remove(&self, table: &str, identity_field: &str, ids: &[Value]) -> StoreResult<()> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .removes
            .push(RemoveCall {
                table: table.to_string(),
                identity_field: identity_field.to_string(),
                ids: ids.to_vec(),
            });

        let doomed: HashSet<String> = ids.iter().map(stored_form).collect();
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(rows) = tables.get_mut(table) {
            let before = rows.len();
            rows.retain(|row| {
                row.get(identity_field)
                    .is_none_or(|value| !doomed.contains(&stored_form(value)))
            });
            debug!(table, removed = before - rows.len(), "removed rows from memory");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(id: &str, color: &str) -> AttributeMap {
        match json!({ "id": id, "color": color }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn removes_only_matching_identities() {
        let store = InMemoryStore::new();
        store
            .create("widgets", &[row("a", "red"), row("b", "blue"), row("c", "red")])
            .await
            .expect("create");

        store
            .remove("widgets", "id", &[json!("a"), json!("c")])
            .await
            .expect("remove");

        let rows = store.rows("widgets");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&json!("b")));
        assert_eq!(
            store.remove_calls(),
            vec![RemoveCall {
                table: "widgets".to_string(),
                identity_field: "id".to_string(),
                ids: vec![json!("a"), json!("c")],
            }]
        );
    }

    #[tokio::test]
    async fn empty_create_is_journaled_but_stores_nothing() {
        let store = InMemoryStore::new();
        store.create("widgets", &[]).await.expect("create");
        assert_eq!(store.count("widgets"), 0);
        assert_eq!(store.create_calls().len(), 1);
    }

    #[tokio::test]
    async fn remove_on_unknown_table_is_a_no_op() {
        let store = InMemoryStore::new();
        store
            .remove("ghosts", "id", &[json!(1)])
            .await
            .expect("remove");
        assert_eq!(store.count("ghosts"), 0);
        store.clear();
        assert!(store.remove_calls().is_empty());
    }
}
