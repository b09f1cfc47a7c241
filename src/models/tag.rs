//! Server tags.

use serde_json::{Map, Value};

use super::maps::{MapReader, MapWriter};
use crate::compute::ServerTag;
use crate::reconcile::SubResource;

/// A tag (key name plus optional value) applied to a server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tag {
    /// Tag key name; unique per server.
    pub name: String,
    /// Tag value.
    pub value: Option<String>,
}

impl Tag {
    /// Reads a tag from its snapshot map.
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let reader = MapReader::new(map);
        Self {
            name: reader.string("name").unwrap_or_default(),
            value: reader.string("value"),
        }
    }

    /// Writes the tag as a snapshot map.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        MapWriter::new()
            .string("name", Some(&self.name))
            .string("value", self.value.as_deref())
            .finish()
    }

    /// Converts an API tag.
    #[must_use]
    pub fn from_compute(tag: &ServerTag) -> Self {
        Self {
            name: tag.name.clone(),
            value: tag.value.clone(),
        }
    }

    /// Converts the tag into its API form.
    #[must_use]
    pub fn to_compute(&self) -> ServerTag {
        ServerTag {
            name: self.name.clone(),
            value: self.value.clone(),
        }
    }
}

// Tags are addressed by key name; the platform assigns them no identifier.
impl SubResource for Tag {
    type Key = String;

    fn remote_id(&self) -> Option<&str> {
        None
    }

    fn slot_key(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn differs_from(&self, actual: &Self) -> bool {
        self.value != actual.value
    }

    fn with_remote_id(self, _id: Option<String>) -> Self {
        self
    }
}

/// Reads every tag in a snapshot list, skipping entries without a name.
#[must_use]
pub fn tags_from_maps(maps: &[Map<String, Value>]) -> Vec<Tag> {
    maps.iter()
        .map(Tag::from_map)
        .filter(|tag| !tag.name.is_empty())
        .collect()
}

/// Writes tags as a snapshot list.
#[must_use]
pub fn tags_to_maps(tags: &[Tag]) -> Vec<Map<String, Value>> {
    tags.iter().map(Tag::to_map).collect()
}
