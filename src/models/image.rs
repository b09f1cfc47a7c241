//! Image selector for server deployment.

use serde_json::{Map, Value};

use super::maps::{MapReader, MapWriter};
use crate::compute::{Image, ImageKind};
use crate::error::ProviderError;

/// Which image catalogues to search.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ImageSelectorKind {
    /// Search OS images first, then customer images.
    #[default]
    Auto,
    /// Search only OS images.
    Os,
    /// Search only customer images.
    Customer,
}

impl ImageSelectorKind {
    /// Parses a configured selector kind; unknown or empty values mean
    /// [`ImageSelectorKind::Auto`].
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("os") => Self::Os,
            Some("customer") => Self::Customer,
            _ => Self::Auto,
        }
    }

    /// Name used in configuration.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Os => "os",
            Self::Customer => "customer",
        }
    }
}

impl From<ImageKind> for ImageSelectorKind {
    fn from(kind: ImageKind) -> Self {
        match kind {
            ImageKind::Os => Self::Os,
            ImageKind::Customer => Self::Customer,
        }
    }
}

/// The `image` block of a server configuration: exactly one of `id` or
/// `name`, plus the catalogue to search.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfiguredImage {
    /// Image identifier.
    pub id: Option<String>,
    /// Image name.
    pub name: Option<String>,
    /// Catalogue to search.
    pub kind: ImageSelectorKind,
}

impl ConfiguredImage {
    /// Reads the selector from its snapshot map.
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let reader = MapReader::new(map);
        Self {
            id: reader.string("id"),
            name: reader.string("name"),
            kind: ImageSelectorKind::parse(reader.string("type").as_deref()),
        }
    }

    /// Writes the selector as a snapshot map.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        MapWriter::new()
            .string("id", self.id.as_deref())
            .string("name", self.name.as_deref())
            .string("type", Some(self.kind.name()))
            .finish()
    }

    /// Checks that exactly one of `id` and `name` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Validation`] otherwise.
    pub fn validate(&self) -> Result<(), ProviderError> {
        match (&self.id, &self.name) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err(ProviderError::Validation(String::from(
                "image: specify either id or name, not both",
            ))),
            (None, None) => Err(ProviderError::Validation(String::from(
                "image: must specify either id or name",
            ))),
        }
    }

    /// Records the identity of the image the selector resolved to.
    pub fn read_image(&mut self, image: &Image) {
        self.id = Some(image.id.clone());
        self.name = Some(image.name.clone());
        self.kind = image.kind.into();
    }

    /// Human-readable description of what the selector looks for.
    #[must_use]
    pub fn describe(&self) -> String {
        match (&self.id, &self.name) {
            (Some(id), _) => format!("Id '{id}'"),
            (None, Some(name)) => format!("name '{name}'"),
            (None, None) => String::from("(unspecified)"),
        }
    }

    /// Reports whether `image` matches the selector's id or name.
    #[must_use]
    pub fn matches(&self, image: &Image) -> bool {
        match (&self.id, &self.name) {
            (Some(id), _) => image.id == *id,
            (None, Some(name)) => image.name == *name,
            (None, None) => false,
        }
    }
}
