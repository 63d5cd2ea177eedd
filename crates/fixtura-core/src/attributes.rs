use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::record::Record;

/// Flattened view of a record: attribute name to value.
pub type AttributeMap = Map<String, Value>;

/// Named replacement values applied on top of a default instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    values: BTreeMap<String, Value>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a single attribute value.
    pub fn set(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(attribute.into(), value.into());
        self
    }

    /// Builder-style insert for values that only implement `Serialize`
    /// (nested records, identifiers, timestamps).
    pub fn try_set<T: Serialize + ?Sized>(
        mut self,
        attribute: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        let value = serde_json::to_value(value).map_err(|err| Error::Encode(err.to_string()))?;
        self.values.insert(attribute.into(), value);
        Ok(self)
    }

    pub fn insert(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(attribute.into(), value.into());
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.values.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Overrides {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Read every top-level attribute of a record.
pub fn to_attributes<R: Record>(record: &R) -> Result<AttributeMap> {
    match serde_json::to_value(record).map_err(|err| Error::Encode(err.to_string()))? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::NotAnObject {
            record_type: std::any::type_name::<R>(),
        }),
    }
}

/// Rebuild a record from its attributes.
pub fn from_attributes<R: Record>(attributes: AttributeMap) -> Result<R> {
    serde_json::from_value(Value::Object(attributes)).map_err(|err| Error::IncompatibleValue {
        reason: err.to_string(),
    })
}

/// Replace attributes wholesale. Every key must already be present.
pub fn apply_overrides(attributes: &mut AttributeMap, overrides: &Overrides) -> Result<()> {
    for (name, value) in overrides {
        let slot = attributes
            .get_mut(name)
            .ok_or_else(|| Error::UnknownAttribute {
                attribute: name.clone(),
            })?;
        *slot = value.clone();
    }
    Ok(())
}

/// Copy `source` into a fresh record, applying each override layer in order.
///
/// Returns the new record together with its attribute snapshot.
pub fn copy_with_overrides<R: Record>(
    source: &R,
    layers: &[&Overrides],
) -> Result<(R, AttributeMap)> {
    let mut attributes = to_attributes(source)?;
    for layer in layers {
        apply_overrides(&mut attributes, layer)?;
    }
    let record: R = from_attributes(attributes)?;
    let snapshot = to_attributes(&record)?;
    Ok((record, snapshot))
}

/// Key under which an identity value is compared and handed to storage.
pub fn stored_form(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
