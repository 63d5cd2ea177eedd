//! Memoized identity-attribute and table-name resolution.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use fixtura_core::{Inflector, derive_table_name};

use crate::errors::{FactoryError, FactoryResult};
use crate::registry::BlueprintRegistry;

/// Caches are never invalidated: re-registering a blueprint keeps whatever
/// was resolved for its name before.
#[derive(Default)]
pub struct Resolver {
    identity_fields: RwLock<HashMap<String, Option<String>>>,
    tables: RwLock<HashMap<String, String>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the table of `name`, bypassing derivation.
    pub fn set_table_name(&self, name: &str, table: &str) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), table.to_string());
    }

    pub fn table_name(
        &self,
        registry: &BlueprintRegistry,
        inflector: &dyn Inflector,
        name: &str,
    ) -> FactoryResult<String> {
        if let Some(table) = self.cached_table(name) {
            return Ok(table);
        }
        if !registry.contains(name) {
            return Err(FactoryError::BlueprintNotFound(name.to_string()));
        }

        // Walk the ascension chain up to the first pinned or root blueprint.
        let mut visited = HashSet::from([name.to_string()]);
        let mut current = name.to_string();
        let table = loop {
            let Some(ascension) = registry.ascension(&current) else {
                break derive_table_name(&current, inflector);
            };
            if let Some(table) = self.cached_table(&ascension.parent) {
                break table;
            }
            if !visited.insert(ascension.parent.clone()) {
                return Err(FactoryError::Internal(format!(
                    "ascension cycle through blueprint '{}'",
                    ascension.parent
                )));
            }
            current = ascension.parent;
        };

        debug!(blueprint = name, table = %table, "table name resolved");
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), table.clone());
        Ok(table)
    }

    /// Identity attribute of the records `name` produces, if any.
    pub fn identity_field(
        &self,
        registry: &BlueprintRegistry,
        default_field: &str,
        name: &str,
    ) -> FactoryResult<Option<String>> {
        if let Some(field) = self
            .identity_fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            debug!(blueprint = name, "identity field cache hit");
            return Ok(field.clone());
        }

        let blueprint = registry.lookup(name)?;
        let attributes = blueprint
            .factory
            .default_attributes()
            .map_err(|err| FactoryError::attribute(name, err))?;

        let tagged = blueprint.factory.identity_annotation();
        let field = match tagged {
            Some(tag) if attributes.contains_key(tag) => Some(tag.to_string()),
            _ => {
                if let Some(tag) = tagged {
                    warn!(blueprint = name, tag, "tagged identity attribute is not an attribute");
                }
                attributes
                    .contains_key(default_field)
                    .then(|| default_field.to_string())
            }
        };

        debug!(blueprint = name, field = ?field, "identity field resolved");
        self.identity_fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), field.clone());
        Ok(field)
    }

    fn cached_table(&self, name: &str) -> Option<String> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}
