//! Storage adapters for Fixtura.
//!
//! The factory only needs two operations from a backend: insert a batch of
//! records into a named table, and delete the rows whose identity attribute
//! matches a set of values. Everything else is left to the backend.

pub mod adapter;
pub mod error;
pub mod memory;
pub mod postgres;

pub use adapter::StorageAdapter;
pub use error::{StoreError, StoreResult};
pub use memory::{CreateCall, InMemoryStore, RemoveCall};
pub use postgres::PostgresStore;
