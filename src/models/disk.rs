//! Server disks.

use serde_json::{Map, Value};

use super::maps::{MapReader, MapWriter};
use crate::compute::VirtualMachineDisk;
use crate::reconcile::SubResource;

/// Storage tier applied when none is configured.
pub const DEFAULT_DISK_SPEED: &str = "STANDARD";

/// Configured or observed state of one server disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Disk {
    /// Platform-assigned identifier; absent until the disk exists.
    pub id: Option<String>,
    /// SCSI unit the disk occupies.
    pub scsi_unit_id: u32,
    /// Size in gigabytes.
    pub size_gb: u32,
    /// Storage tier.
    pub speed: String,
}

impl Disk {
    /// Creates a disk that does not exist yet.
    #[must_use]
    pub fn new(scsi_unit_id: u32, size_gb: u32, speed: &str) -> Self {
        Self {
            id: None,
            scsi_unit_id,
            size_gb,
            speed: speed.to_owned(),
        }
    }

    /// Reads a disk from its snapshot map.
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let reader = MapReader::new(map);
        Self {
            id: reader.string("id"),
            scsi_unit_id: reader.u32("scsi_unit_id"),
            size_gb: reader.u32("size_gb"),
            speed: reader
                .string("speed")
                .unwrap_or_else(|| DEFAULT_DISK_SPEED.to_owned()),
        }
    }

    /// Writes the disk as a snapshot map.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        MapWriter::new()
            .string("id", self.id.as_deref())
            .u32("scsi_unit_id", self.scsi_unit_id)
            .u32("size_gb", self.size_gb)
            .string("speed", Some(&self.speed))
            .finish()
    }

    /// Converts an API disk.
    #[must_use]
    pub fn from_compute(disk: &VirtualMachineDisk) -> Self {
        Self {
            id: disk.id.clone(),
            scsi_unit_id: disk.scsi_unit_id,
            size_gb: disk.size_gb,
            speed: disk.speed.clone(),
        }
    }

    /// Converts the disk into its API form.
    #[must_use]
    pub fn to_compute(&self) -> VirtualMachineDisk {
        VirtualMachineDisk {
            id: self.id.clone(),
            scsi_unit_id: self.scsi_unit_id,
            size_gb: self.size_gb,
            speed: self.speed.clone(),
        }
    }
}

impl SubResource for Disk {
    type Key = u32;

    fn remote_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn slot_key(&self) -> Option<u32> {
        Some(self.scsi_unit_id)
    }

    fn differs_from(&self, actual: &Self) -> bool {
        self.scsi_unit_id != actual.scsi_unit_id
            || self.size_gb != actual.size_gb
            || !self.speed.eq_ignore_ascii_case(&actual.speed)
    }

    fn with_remote_id(self, id: Option<String>) -> Self {
        Self { id, ..self }
    }
}

/// Reads every disk in a snapshot list.
#[must_use]
pub fn disks_from_maps(maps: &[Map<String, Value>]) -> Vec<Disk> {
    maps.iter().map(Disk::from_map).collect()
}

/// Writes disks as a snapshot list.
#[must_use]
pub fn disks_to_maps(disks: &[Disk]) -> Vec<Map<String, Value>> {
    disks.iter().map(Disk::to_map).collect()
}

/// Converts the disks reported for a server.
#[must_use]
pub fn disks_from_compute(disks: &[VirtualMachineDisk]) -> Vec<Disk> {
    disks.iter().map(Disk::from_compute).collect()
}
