use async_trait::async_trait;
use serde_json::Value;

use fixtura_core::AttributeMap;

use crate::error::StoreResult;

/// Trait implemented by backends that persist generated records.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Insert every record into `table`. Empty input is a no-op.
    async fn create(&self, table: &str, records: &[AttributeMap]) -> StoreResult<()>;

    /// Delete every row of `table` whose `identity_field` matches one of `ids`.
    ///
    /// `identity_field` is the logical attribute name; adapters that store it
    /// under another physical name translate it themselves.
    async fn remove(&self, table: &str, identity_field: &str, ids: &[Value]) -> StoreResult<()>;
}
