//! Core contracts for Fixtura.
//!
//! This crate defines the record capability trait, the attribute copier used to
//! apply overrides, the indirection-depth wrapper for generated instances, and
//! the table-name inflection shared by the store adapters and the factory.

pub mod attributes;
pub mod depth;
pub mod error;
pub mod inflect;
pub mod record;

pub use attributes::{
    AttributeMap, Overrides, apply_overrides, copy_with_overrides, from_attributes, stored_form,
    to_attributes,
};
pub use depth::{Depth, INDIRECTION_MARKER, Instance, split_markers};
pub use error::{Error, Result};
pub use inflect::{EnglishInflector, Inflector, derive_table_name};
pub use record::Record;
