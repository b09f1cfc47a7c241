//! Typed readers and writers over snapshot maps.

use serde_json::{Map, Value};

/// Reads typed values from a sub-resource map.
///
/// Missing keys, nulls, and empty strings read as absent.
#[derive(Clone, Copy, Debug)]
pub struct MapReader<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> MapReader<'a> {
    /// Wraps `map` for reading.
    #[must_use]
    pub const fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Returns a non-empty string value.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<String> {
        self.map
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }

    /// Returns an unsigned value that fits in `u32`, or zero.
    #[must_use]
    pub fn u32(&self, key: &str) -> u32 {
        self.map
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(0)
    }
}

/// Builds a sub-resource map.
#[derive(Debug, Default)]
pub struct MapWriter {
    map: Map<String, Value>,
}

impl MapWriter {
    /// Starts an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes an optional string, storing null for `None`.
    #[must_use]
    pub fn string(mut self, key: &str, value: Option<&str>) -> Self {
        self.map
            .insert(key.to_owned(), value.map_or(Value::Null, Value::from));
        self
    }

    /// Writes an unsigned value.
    #[must_use]
    pub fn u32(mut self, key: &str, value: u32) -> Self {
        self.map.insert(key.to_owned(), Value::from(value));
        self
    }

    /// Returns the finished map.
    #[must_use]
    pub fn finish(self) -> Map<String, Value> {
        self.map
    }
}
