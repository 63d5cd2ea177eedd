use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use fixtura_core::{
    Depth, EnglishInflector, Inflector, Instance, Overrides, Record, split_markers, to_attributes,
};
use fixtura_store::StorageAdapter;

use crate::config::FactoryConfig;
use crate::errors::{CleanupFailures, FactoryError, FactoryResult};
use crate::generator::{GenerationPlan, fan_out, panic_message};
use crate::ledger::{Ledger, TrackedInstance};
use crate::model::{Batch, CleanupReport, TrackedEntry};
use crate::registry::BlueprintRegistry;
use crate::resolver::Resolver;

/// Fixture factory: blueprint registry, resolver caches, and the ledger of
/// generated instances, shared by every clone of the handle.
#[derive(Clone)]
pub struct Factory {
    inner: Arc<FactoryInner>,
}

struct FactoryInner {
    config: FactoryConfig,
    registry: BlueprintRegistry,
    resolver: Resolver,
    ledger: Ledger,
    store: RwLock<Option<Arc<dyn StorageAdapter>>>,
    inflector: RwLock<Arc<dyn Inflector>>,
    cleanup_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Factory {
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            inner: Arc::new(FactoryInner {
                config,
                registry: BlueprintRegistry::new(),
                resolver: Resolver::new(),
                ledger: Ledger::new(),
                store: RwLock::new(None),
                inflector: RwLock::new(Arc::new(EnglishInflector)),
                cleanup_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn with_store(config: FactoryConfig, store: Arc<dyn StorageAdapter>) -> Self {
        let factory = Self::new(config);
        factory.set_store(store);
        factory
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.inner.config
    }

    pub fn set_store(&self, store: Arc<dyn StorageAdapter>) {
        info!(engine = store.engine(), "storage adapter configured");
        *self
            .inner
            .store
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(store);
    }

    /// Replace the pluralizer used for derived table names.
    pub fn set_inflector(&self, inflector: Arc<dyn Inflector>) {
        *self
            .inner
            .inflector
            .write()
            .unwrap_or_else(PoisonError::into_inner) = inflector;
    }

    fn store(&self) -> Option<Arc<dyn StorageAdapter>> {
        self.inner
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a blueprint producing plain records.
    pub fn register<R, F>(&self, name: &str, factory: F)
    where
        R: Record,
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.inner
            .registry
            .insert::<R>(name, Arc::new(move || Instance::Value(factory())), Depth::Value);
    }

    /// Register a blueprint producing shared references to records.
    pub fn register_ref<R, F>(&self, name: &str, factory: F)
    where
        R: Record,
        F: Fn() -> Arc<R> + Send + Sync + 'static,
    {
        self.inner
            .registry
            .insert::<R>(name, Arc::new(move || Instance::Ref(factory())), Depth::Ref);
    }

    /// Declare `child` as `parent` plus the overrides `overrides` returns.
    ///
    /// Only the immediate parent's overrides apply when `child` is generated;
    /// a grandparent's are not chained in.
    pub fn ascend<F>(&self, child: &str, parent: &str, overrides: F) -> FactoryResult<()>
    where
        F: Fn() -> Overrides + Send + Sync + 'static,
    {
        self.inner.registry.ascend(child, parent, Arc::new(overrides))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.registry.contains(name)
    }

    pub fn set_table_name(&self, name: &str, table: &str) {
        self.inner.resolver.set_table_name(name, table);
    }

    pub fn table_name(&self, name: &str) -> FactoryResult<String> {
        let inflector = self
            .inner
            .inflector
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.inner
            .resolver
            .table_name(&self.inner.registry, inflector.as_ref(), name)
    }

    /// Identity attribute of `name`, or `None` when the record has none.
    pub fn identity_field(&self, name: &str) -> FactoryResult<Option<String>> {
        self.inner.resolver.identity_field(
            &self.inner.registry,
            &self.inner.config.default_identity_field,
            name,
        )
    }

    /// Produce one instance per override set without persisting them.
    ///
    /// A leading `*` on `name` wraps each instance in one more reference.
    pub async fn generate<R: Record>(
        &self,
        name: &str,
        overrides: Vec<Overrides>,
    ) -> FactoryResult<Batch<R>> {
        self.make_batch(name, overrides, false).await
    }

    /// Like [`Factory::generate`], then insert the instances through the store.
    pub async fn persist<R: Record>(
        &self,
        name: &str,
        overrides: Vec<Overrides>,
    ) -> FactoryResult<Batch<R>> {
        self.make_batch(name, overrides, true).await
    }

    /// Produce a single instance.
    pub async fn build<R: Record>(
        &self,
        name: &str,
        overrides: Overrides,
    ) -> FactoryResult<Instance<R>> {
        self.make_batch(name, vec![overrides], false)
            .await?
            .into_one()
            .ok_or_else(|| FactoryError::Internal(format!("'{name}' produced no instance")))
    }

    async fn make_batch<R: Record>(
        &self,
        requested: &str,
        mut overrides: Vec<Overrides>,
        persist: bool,
    ) -> FactoryResult<Batch<R>> {
        let start = Instant::now();
        let (markers, name) = split_markers(requested);
        let blueprint = self.inner.registry.lookup(name)?;
        let depth = blueprint
            .base_depth
            .deepen(markers)
            .ok_or_else(|| FactoryError::UnsupportedDepth {
                name: requested.to_string(),
            })?;
        let produce = blueprint.typed::<R>(name)?;

        let target = if persist {
            let store = self.store().ok_or(FactoryError::StoreNotConfigured)?;
            Some((store, self.table_name(name)?))
        } else {
            None
        };

        if overrides.is_empty() {
            overrides.push(Overrides::new());
        }
        let batch_id = uuid::Uuid::new_v4();
        debug!(
            batch_id = %batch_id,
            blueprint = name,
            depth = depth.level(),
            count = overrides.len(),
            "generation started"
        );

        let plan = GenerationPlan {
            blueprint: name.to_string(),
            produce,
            ancestor: self
                .inner
                .registry
                .ascension(name)
                .map(|ascension| ascension.overrides),
            depth,
            timeout: self.inner.config.generation_timeout(),
        };
        let first = std::panic::catch_unwind(AssertUnwindSafe(|| (*plan.produce)())).map_err(
            |panic| {
                FactoryError::Internal(format!(
                    "blueprint '{name}' panicked: {}",
                    panic_message(panic)
                ))
            },
        )?;
        let realized = fan_out(&plan, first, overrides).await?;

        let mut instances = Vec::with_capacity(realized.len());
        let mut tracked = Vec::with_capacity(realized.len());
        let mut rows = Vec::with_capacity(realized.len());
        for item in realized {
            tracked.push(TrackedInstance::new(item.instance.clone(), item.attributes.clone()));
            rows.push(item.attributes);
            instances.push(item.instance);
        }
        self.inner.ledger.append(name, tracked);

        if let Some((store, table)) = target {
            store.create(&table, &rows).await?;
            info!(
                batch_id = %batch_id,
                blueprint = name,
                table = %table,
                count = rows.len(),
                "instances persisted"
            );
        }

        info!(
            batch_id = %batch_id,
            blueprint = name,
            count = instances.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation completed"
        );
        Ok(Batch::from_vec(instances))
    }

    pub fn tracked_count(&self, name: &str) -> usize {
        self.inner.ledger.len(name)
    }

    /// Names with at least one tracked instance.
    pub fn tracked_names(&self) -> Vec<String> {
        self.inner.ledger.names()
    }

    pub fn tracked<R: Record>(&self, name: &str) -> Vec<Instance<R>> {
        self.inner.ledger.instances(name)
    }

    pub fn tracked_entries(&self, name: &str) -> Vec<TrackedEntry> {
        self.inner.ledger.entries(name)
    }

    /// Remove everything tracked under `name`, from the ledger and the store.
    pub async fn cleanup(&self, name: &str) -> FactoryResult<CleanupReport> {
        self.cleanup_ids(name, None).await
    }

    /// Remove the given instances of `name`. An empty slice removes everything.
    pub async fn cleanup_instances<R: Record>(
        &self,
        name: &str,
        instances: &[Instance<R>],
    ) -> FactoryResult<CleanupReport> {
        if instances.is_empty() {
            return self.cleanup_ids(name, None).await;
        }

        let field = self
            .identity_field(name)?
            .ok_or_else(|| FactoryError::NoIdentityField(name.to_string()))?;
        let ids = instances
            .iter()
            .map(|instance| {
                let attributes = to_attributes(instance.get())
                    .map_err(|err| FactoryError::attribute(name, err))?;
                Ok(attributes.get(&field).cloned().unwrap_or(Value::Null))
            })
            .collect::<FactoryResult<Vec<_>>>()?;
        self.cleanup_ids(name, Some(ids)).await
    }

    async fn cleanup_ids(
        &self,
        name: &str,
        explicit: Option<Vec<Value>>,
    ) -> FactoryResult<CleanupReport> {
        let table = self.table_name(name)?;
        let field = self
            .identity_field(name)?
            .ok_or_else(|| FactoryError::NoIdentityField(name.to_string()))?;

        let lock = self.cleanup_lock(name);
        let _guard = lock.lock().await;

        let ids = match explicit {
            Some(ids) => ids,
            None => self.inner.ledger.identities(name, &field),
        };
        if ids.is_empty() {
            debug!(blueprint = name, "nothing tracked to clean up");
            return Ok(CleanupReport {
                name: name.to_string(),
                table,
                identity_field: field,
                removed: 0,
                ids,
            });
        }

        let removed = self.inner.ledger.prune(name, &field, &ids);
        if let Some(store) = self.store() {
            store.remove(&table, &field, &ids).await?;
        }

        info!(
            blueprint = name,
            table = %table,
            removed,
            ids = ids.len(),
            "instances cleaned up"
        );
        Ok(CleanupReport {
            name: name.to_string(),
            table,
            identity_field: field,
            removed,
            ids,
        })
    }

    /// Locks are only created for names that resolved a table and an
    /// identity, so the map is bounded by the registered blueprints.
    fn cleanup_lock(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.inner
            .cleanup_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Clean up several names concurrently; every tracked name when `names`
    /// is empty. Failures are collected across all names.
    pub async fn cleanup_all(&self, names: &[&str]) -> FactoryResult<Vec<CleanupReport>> {
        let names: Vec<String> = if names.is_empty() {
            self.tracked_names()
        } else {
            names.iter().map(|name| name.to_string()).collect()
        };

        let mut tasks = JoinSet::new();
        let mut task_names = HashMap::new();
        for name in names {
            let factory = self.clone();
            let task_name = name.clone();
            let handle = tasks.spawn(async move { factory.cleanup(&task_name).await });
            task_names.insert(handle.id(), name);
        }

        let mut reports = Vec::new();
        let mut failures = CleanupFailures::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (name, outcome) = match joined {
                Ok((id, outcome)) => (task_names.remove(&id), outcome),
                Err(err) => {
                    let id = err.id();
                    let reason = if err.is_panic() {
                        format!("cleanup panicked: {}", panic_message(err.into_panic()))
                    } else {
                        format!("cleanup task failed: {err}")
                    };
                    (task_names.remove(&id), Err(FactoryError::Internal(reason)))
                }
            };
            let name = name.unwrap_or_default();
            match outcome {
                Ok(report) => reports.push(report),
                Err(err) => {
                    warn!(blueprint = %name, error = %err, "cleanup failed");
                    failures.failures.push((name, err));
                }
            }
        }

        if !failures.is_empty() {
            failures.failures.sort_by(|left, right| left.0.cmp(&right.0));
            return Err(FactoryError::CleanupFailed(failures));
        }
        reports.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(reports)
    }
}
