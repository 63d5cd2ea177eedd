//! Blueprint-driven fixture factory for Fixtura.
//!
//! Register a named blueprint that produces a default record, then ask the
//! factory for instances of it with per-instance overrides. Every instance is
//! tracked so a test suite can delete what it created, one blueprint at a time
//! or all at once, through a pluggable storage adapter.
//!
//! ```no_run
//! use fixtura_core::{Overrides, Record};
//! use fixtura_factory::{Factory, FactoryConfig};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Widget {
//!     id: u64,
//!     color: String,
//! }
//!
//! impl Record for Widget {}
//!
//! # async fn demo() -> fixtura_factory::FactoryResult<()> {
//! let factory = Factory::new(FactoryConfig::default());
//! factory.register("Widget", || Widget { id: 1, color: "red".into() });
//!
//! let widgets = factory
//!     .generate::<Widget>("Widget", vec![Overrides::new().set("color", "blue"), Overrides::new()])
//!     .await?;
//! assert_eq!(widgets.len(), 2);
//!
//! factory.cleanup("Widget").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod errors;
mod generator;
mod ledger;
pub mod logging;
pub mod model;
mod registry;
mod resolver;

pub use config::{FactoryConfig, LogFormat, LoggingConfig};
pub use engine::Factory;
pub use errors::{CleanupFailures, FactoryError, FactoryResult};
pub use model::{Batch, CleanupReport, TrackedEntry};
