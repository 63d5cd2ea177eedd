//! Blueprint registry: name to default-instance factory, plus ascension links.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use fixtura_core::{AttributeMap, Depth, Instance, Overrides, Record, to_attributes};

use crate::errors::{FactoryError, FactoryResult};

/// Zero-argument producer of a default instance.
pub type Produce<R> = Arc<dyn Fn() -> Instance<R> + Send + Sync>;

/// Override set applied by an ascended blueprint before the caller's own.
pub type AncestorOverrides = Arc<dyn Fn() -> Overrides + Send + Sync>;

/// Type-erased face of a blueprint factory.
pub(crate) trait ErasedFactory: Send + Sync {
    fn record_type(&self) -> &'static str;
    fn identity_annotation(&self) -> Option<&'static str>;
    /// Attributes of a freshly produced default instance.
    fn default_attributes(&self) -> fixtura_core::Result<AttributeMap>;
    fn as_any(&self) -> &dyn Any;
}

pub(crate) struct TypedFactory<R> {
    pub(crate) produce: Produce<R>,
}

impl<R: Record> ErasedFactory for TypedFactory<R> {
    fn record_type(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn identity_annotation(&self) -> Option<&'static str> {
        R::identity_field()
    }

    fn default_attributes(&self) -> fixtura_core::Result<AttributeMap> {
        let instance = (*self.produce)();
        to_attributes(instance.get())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone)]
pub(crate) struct Blueprint {
    pub(crate) factory: Arc<dyn ErasedFactory>,
    /// Depth the factory itself returns.
    pub(crate) base_depth: Depth,
}

impl Blueprint {
    pub(crate) fn typed<R: Record>(&self, name: &str) -> FactoryResult<Produce<R>> {
        self.factory
            .as_any()
            .downcast_ref::<TypedFactory<R>>()
            .map(|typed| Arc::clone(&typed.produce))
            .ok_or_else(|| FactoryError::RecordTypeMismatch {
                blueprint: name.to_string(),
                registered: self.factory.record_type(),
                requested: std::any::type_name::<R>(),
            })
    }
}

#[derive(Clone)]
pub struct Ascension {
    pub parent: String,
    pub(crate) overrides: AncestorOverrides,
}

/// Thread-safe blueprint registry.
#[derive(Default)]
pub struct BlueprintRegistry {
    blueprints: RwLock<HashMap<String, Blueprint>>,
    ascensions: RwLock<HashMap<String, Ascension>>,
}

impl BlueprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert<R: Record>(&self, name: &str, produce: Produce<R>, base_depth: Depth) {
        let blueprint = Blueprint {
            factory: Arc::new(TypedFactory { produce }),
            base_depth,
        };
        let replaced = self
            .blueprints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), blueprint)
            .is_some();
        self.ascensions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);

        if replaced {
            warn!(blueprint = name, "blueprint already registered, replacing");
        } else {
            debug!(blueprint = name, record = std::any::type_name::<R>(), "blueprint registered");
        }
    }

    /// Make `child` produce what `parent` produces, plus `overrides`.
    pub fn ascend(
        &self,
        child: &str,
        parent: &str,
        overrides: AncestorOverrides,
    ) -> FactoryResult<()> {
        if child == parent {
            return Err(FactoryError::Internal(format!(
                "blueprint '{child}' cannot ascend itself"
            )));
        }

        let mut blueprints = self
            .blueprints
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let inherited = blueprints
            .get(parent)
            .cloned()
            .ok_or_else(|| FactoryError::BlueprintNotFound(parent.to_string()))?;
        blueprints.insert(child.to_string(), inherited);
        self.ascensions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                child.to_string(),
                Ascension {
                    parent: parent.to_string(),
                    overrides,
                },
            );

        debug!(blueprint = child, parent, "blueprint ascended");
        Ok(())
    }

    pub(crate) fn lookup(&self, name: &str) -> FactoryResult<Blueprint> {
        self.blueprints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| FactoryError::BlueprintNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blueprints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Immediate parent link of an ascended blueprint.
    pub fn ascension(&self, name: &str) -> Option<Ascension> {
        self.ascensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}
