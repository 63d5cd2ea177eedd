use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;

use fixtura_core::{AttributeMap, stored_form};

use crate::adapter::StorageAdapter;
use crate::error::{StoreError, StoreResult};

mod ident;

use ident::{quote_ident, quote_table};

/// Adapter for PostgreSQL databases.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    identity_columns: HashMap<String, String>,
}

impl PostgresStore {
    /// Create a new adapter using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            identity_columns: HashMap::new(),
        }
    }

    /// Store the logical identity attribute `logical` in column `physical`.
    pub fn with_identity_column(
        mut self,
        logical: impl Into<String>,
        physical: impl Into<String>,
    ) -> Self {
        self.identity_columns.insert(logical.into(), physical.into());
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn identity_column<'a>(&'a self, logical: &'a str) -> &'a str {
        self.identity_columns
            .get(logical)
            .map(String::as_str)
            .unwrap_or(logical)
    }

    /// Rename translated identity attributes to their physical columns.
    fn physical_rows(&self, records: &[AttributeMap]) -> Vec<AttributeMap> {
        records
            .iter()
            .map(|record| {
                record
                    .iter()
                    .map(|(key, value)| (self.identity_column(key).to_string(), value.clone()))
                    .collect()
            })
            .collect()
    }
}

#[async_trait]
impl StorageAdapter for PostgresStore {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, table: &str, records: &[AttributeMap]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let rows = self.physical_rows(records);
        let columns: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        let column_list = columns
            .iter()
            .map(|column| quote_ident(column))
            .collect::<StoreResult<Vec<_>>>()?
            .join(", ");
        let table_ident = quote_table(table)?;
        let sql = format!(
            "insert into {table_ident} ({column_list}) \
             select {column_list} from jsonb_populate_recordset(null::{table_ident}, $1)"
        );

        let inserted = sqlx::query(&sql)
            .bind(Json(&rows))
            .execute(&self.pool)
            .await?
            .rows_affected();
        debug!(table, rows = inserted, "inserted rows");
        Ok(())
    }

    async fn remove(&self, table: &str, identity_field: &str, ids: &[Value]) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let column = quote_ident(self.identity_column(identity_field))?;
        let sql = format!(
            "delete from {} where {column}::text = any($1)",
            quote_table(table)?
        );
        let keys: Vec<String> = ids.iter().map(stored_form).collect();

        let rows = sqlx::query(&sql)
            .bind(keys)
            .execute(&self.pool)
            .await
            .map_err(|err| StoreError::Db(format!("delete from {table} failed: {err}")))?
            .rows_affected();
        debug!(table, rows, "deleted rows");
        Ok(())
    }
}
