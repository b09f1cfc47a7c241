//! Configuration snapshot accessor.
//!
//! The host framework owns field types, defaults, and persistence. Lifecycle
//! operations see a resolved key-value view with per-field change detection,
//! modelled by [`ResourceData`]. Values are JSON values so that sub-resource
//! collections can be expressed as lists of maps.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Key-value view of one resource's desired configuration and persisted
/// state.
pub trait ResourceData: Send + Sync {
    /// Returns the persisted remote identifier, if any.
    fn id(&self) -> Option<&str>;

    /// Records (or clears, with `None`) the remote identifier.
    fn set_id(&mut self, id: Option<String>);

    /// Returns the current value of `key`.
    fn get(&self, key: &str) -> Option<&Value>;

    /// Returns the value `key` held before the pending change, if any.
    fn get_old(&self, key: &str) -> Option<&Value>;

    /// Reports whether `key` differs from its previously persisted value.
    fn has_change(&self, key: &str) -> bool;

    /// Writes `value` for `key` into the state snapshot.
    fn set(&mut self, key: &str, value: Value);
}

/// Typed accessors over [`ResourceData`].
///
/// Missing keys, JSON nulls, and empty strings are all reported as absent.
pub trait ResourceDataExt: ResourceData {
    /// Returns a non-empty string value.
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Returns a non-empty string value as an owned `String`.
    fn get_string(&self, key: &str) -> Option<String> {
        self.get_str(key).map(str::to_owned)
    }

    /// Returns the previous non-empty string value of `key`.
    fn get_old_string(&self, key: &str) -> Option<String> {
        self.get_old(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }

    /// Returns a non-zero unsigned value that fits in `u32`.
    fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key)
            .and_then(Value::as_u64)
            .and_then(|value| u32::try_from(value).ok())
            .filter(|value| *value != 0)
    }

    /// Returns a boolean value, defaulting to `false`.
    fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Returns a list of maps, skipping entries that are not maps.
    fn get_maps(&self, key: &str) -> Vec<Map<String, Value>> {
        maps_of(self.get(key))
    }

    /// Returns the previous list of maps held by `key`.
    fn get_old_maps(&self, key: &str) -> Vec<Map<String, Value>> {
        maps_of(self.get_old(key))
    }

    /// Writes an optional string, storing JSON null for `None`.
    fn set_opt_str(&mut self, key: &str, value: Option<&str>) {
        self.set(key, value.map_or(Value::Null, Value::from));
    }

    /// Writes a list of maps.
    fn set_maps(&mut self, key: &str, maps: Vec<Map<String, Value>>) {
        self.set(key, Value::Array(maps.into_iter().map(Value::Object).collect()));
    }
}

impl<T: ResourceData + ?Sized> ResourceDataExt for T {}

fn maps_of(value: Option<&Value>) -> Vec<Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// In-memory [`ResourceData`] implementation.
///
/// `prior` holds the last persisted values and `values` the current view.
/// A key has a change when the two differ. [`ResourceSnapshot::commit`]
/// promotes the current view to the persisted one, mirroring what the host
/// framework does after a successful lifecycle operation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceSnapshot {
    id: Option<String>,
    values: BTreeMap<String, Value>,
    prior: BTreeMap<String, Value>,
}

impl ResourceSnapshot {
    /// Creates an empty snapshot with no identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a snapshot for a resource that does not exist yet: every
    /// supplied value counts as changed.
    #[must_use]
    pub fn from_desired(values: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            id: None,
            values: values.into_iter().collect(),
            prior: BTreeMap::new(),
        }
    }

    /// Builder-style helper to set a current value.
    #[must_use]
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.values.insert(key.to_owned(), value);
        self
    }

    /// Builder-style helper to set the identity.
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    /// Accepts all current values as persisted, clearing change markers.
    pub fn commit(&mut self) {
        self.prior.clone_from(&self.values);
    }

    /// Replaces the desired value of `key` after a commit, so that
    /// [`ResourceData::has_change`] reports it.
    pub fn stage(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_owned(), value);
    }
}

impl ResourceData for ResourceSnapshot {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|value| !value.is_null())
    }

    fn get_old(&self, key: &str) -> Option<&Value> {
        self.prior.get(key).filter(|value| !value.is_null())
    }

    fn has_change(&self, key: &str) -> bool {
        self.get(key) != self.get_old(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_owned(), value);
    }
}
