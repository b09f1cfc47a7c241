//! Converters between snapshot maps and compute API objects.
//!
//! Each sub-resource kind reads itself from a snapshot map, writes itself
//! back, and converts to and from its API counterpart. The conversions are
//! pure; no remote calls happen here.

mod disk;
mod image;
mod maps;
mod network_adapter;
mod tag;

pub use disk::{DEFAULT_DISK_SPEED, Disk, disks_from_compute, disks_from_maps, disks_to_maps};
pub use image::{ConfiguredImage, ImageSelectorKind};
pub use maps::{MapReader, MapWriter};
pub use network_adapter::{
    NetworkAdapter, adapters_from_maps, adapters_from_network, adapters_to_maps,
    apply_adapters_to_network, capture_adapter_ids,
};
pub use tag::{Tag, tags_from_maps, tags_to_maps};

#[cfg(test)]
mod tests;
