//! Allow-list sanitizing of external payloads.
//!
//! Every model built from Snipcart or ShipStation JSON implements [`Schema`]
//! and rejects unknown keys on deserialization. Payloads therefore go through
//! [`safe_populate`], which removes whatever the upstream API added since the
//! model was written before handing the data to serde.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

/// Static description of the keys a model accepts.
pub trait Schema {
    /// Keys the model reads verbatim.
    const FIELDS: &'static [&'static str];

    /// Keys accepted on input that [`Schema::prepare`] folds or normalises
    /// instead of reading verbatim.
    const VIRTUAL_FIELDS: &'static [&'static str] = &[];

    fn accepts(key: &str) -> bool {
        Self::FIELDS.contains(&key) || Self::VIRTUAL_FIELDS.contains(&key)
    }

    /// Runs on the root object after unknown keys are gone. Implementations
    /// fold virtual keys and sanitize nested child schemas here.
    fn prepare(_map: &mut Map<String, Value>) {}
}

/// Removes root-level keys the schema does not accept, plus null values so
/// model defaults apply, then runs the schema's `prepare` hook.
///
/// Anything that is not a JSON object is returned untouched. Returns the
/// names of removed unknown keys.
pub fn strip_unknown<S: Schema>(value: &mut Value) -> Vec<String> {
    let Value::Object(map) = value else {
        return Vec::new();
    };

    let removed: Vec<String> = map.keys().filter(|key| !S::accepts(key)).cloned().collect();
    for key in &removed {
        map.remove(key);
    }
    map.retain(|_, v| !v.is_null());

    if !removed.is_empty() {
        debug!(
            schema = std::any::type_name::<S>(),
            removed = ?removed,
            "stripped unknown payload properties"
        );
    }

    S::prepare(map);
    removed
}

/// Sanitizes a single nested object stored under `key`.
pub fn strip_field<S: Schema>(map: &mut Map<String, Value>, key: &str) {
    if let Some(value) = map.get_mut(key) {
        strip_unknown::<S>(value);
    }
}

/// Sanitizes every element of an array stored under `key`.
pub fn strip_each<S: Schema>(map: &mut Map<String, Value>, key: &str) {
    if let Some(Value::Array(items)) = map.get_mut(key) {
        for item in items.iter_mut() {
            strip_unknown::<S>(item);
        }
    }
}

/// Strips unknown keys, then populates the model.
pub fn safe_populate<T>(mut data: Value) -> Result<T, serde_json::Error>
where
    T: Schema + DeserializeOwned,
{
    strip_unknown::<T>(&mut data);
    serde_json::from_value(data)
}

/// [`safe_populate`] for each element of a list.
pub fn safe_populate_many<T>(items: Vec<Value>) -> Result<Vec<T>, serde_json::Error>
where
    T: Schema + DeserializeOwned,
{
    items.into_iter().map(safe_populate).collect()
}

/// Test helper: the schema and the serialized model agree on their keys.
#[cfg(test)]
pub(crate) fn assert_schema_matches<T: Schema + serde::Serialize>(model: &T) {
    let Value::Object(map) = serde_json::to_value(model).unwrap() else {
        panic!("{} does not serialize to an object", std::any::type_name::<T>());
    };
    for key in map.keys() {
        assert!(T::accepts(key), "{} serializes undeclared key {key}", std::any::type_name::<T>());
    }
    for field in T::FIELDS {
        assert!(map.contains_key(*field), "{} declares {field} but never serializes it", std::any::type_name::<T>());
    }
}
