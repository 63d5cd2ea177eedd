//! Concurrent instance generation for a single blueprint.

use std::any::Any;
use std::time::Duration;

use tokio::task::JoinSet;

use fixtura_core::{AttributeMap, Depth, Instance, Overrides, Record, copy_with_overrides};

use crate::errors::{FactoryError, FactoryResult};
use crate::registry::{AncestorOverrides, Produce};

/// One realized instance and the attributes recorded for it.
pub(crate) struct Realized<R> {
    pub(crate) instance: Instance<R>,
    pub(crate) attributes: AttributeMap,
}

/// Everything one generate call needs, detached from the factory.
pub(crate) struct GenerationPlan<R> {
    pub(crate) blueprint: String,
    pub(crate) produce: Produce<R>,
    pub(crate) ancestor: Option<AncestorOverrides>,
    pub(crate) depth: Depth,
    pub(crate) timeout: Option<Duration>,
}

/// Copy `source` into a fresh record, apply the ancestor's overrides and then
/// the caller's, and wrap the result to `depth`.
pub(crate) fn realize<R: Record>(
    source: &Instance<R>,
    ancestor: Option<&AncestorOverrides>,
    lesson: &Overrides,
    depth: Depth,
) -> fixtura_core::Result<Realized<R>> {
    let inherited = ancestor.map(|overrides| (**overrides)());
    let mut layers: Vec<&Overrides> = Vec::with_capacity(2);
    if let Some(inherited) = inherited.as_ref() {
        layers.push(inherited);
    }
    layers.push(lesson);

    let (record, attributes) = copy_with_overrides(source.get(), &layers)?;
    Ok(Realized {
        instance: Instance::wrap(record, depth),
        attributes,
    })
}

/// Realize one instance per override set in parallel.
///
/// `first` is the default instance already produced by the caller; it seeds
/// the first override set, every other task asks the factory for its own.
/// Results come back in override-set order.
pub(crate) async fn fan_out<R: Record>(
    plan: &GenerationPlan<R>,
    first: Instance<R>,
    lessons: Vec<Overrides>,
) -> FactoryResult<Vec<Realized<R>>> {
    let total = lessons.len();
    let mut tasks = JoinSet::new();
    let mut seed = Some(first);

    for (index, lesson) in lessons.into_iter().enumerate() {
        let produce = plan.produce.clone();
        let ancestor = plan.ancestor.clone();
        let source = seed.take();
        let depth = plan.depth;
        tasks.spawn_blocking(move || {
            let source = source.unwrap_or_else(|| (*produce)());
            (index, realize(&source, ancestor.as_ref(), &lesson, depth))
        });
    }

    let mut slots: Vec<Option<Realized<R>>> = (0..total).map(|_| None).collect();
    let collect = async {
        while let Some(joined) = tasks.join_next().await {
            let (index, realized) = joined.map_err(|err| {
                if err.is_panic() {
                    FactoryError::Internal(format!(
                        "blueprint '{}' panicked: {}",
                        plan.blueprint,
                        panic_message(err.into_panic())
                    ))
                } else {
                    FactoryError::Internal(format!(
                        "blueprint '{}' task failed: {err}",
                        plan.blueprint
                    ))
                }
            })?;
            let realized = realized.map_err(|err| FactoryError::attribute(&plan.blueprint, err))?;
            slots[index] = Some(realized);
        }
        Ok::<(), FactoryError>(())
    };

    match plan.timeout {
        Some(limit) => tokio::time::timeout(limit, collect)
            .await
            .map_err(|_| FactoryError::Timeout {
                blueprint: plan.blueprint.clone(),
                after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })??,
        None => collect.await?,
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                FactoryError::Internal(format!(
                    "blueprint '{}' produced no instance for override set {index}",
                    plan.blueprint
                ))
            })
        })
        .collect()
}

pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during generation".to_string()
    }
}
