//! Disk reconciliation.
//!
//! Disks can be added, grown, moved to another storage tier, and removed.
//! Shrinking a disk or moving it to another SCSI unit is rejected before
//! any change is made.

use tracing::info;

use super::keys;
use crate::compute::{ComputeApi, Server};
use crate::data::{ResourceData, ResourceDataExt};
use crate::error::ProviderError;
use crate::models::{Disk, disks_from_compute, disks_from_maps, disks_to_maps};
use crate::provider::Provider;
use crate::reconcile::{Changes, SubResource, split_by_action};

/// Whether disks present on the server but absent from the configuration
/// are removed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum UnconfiguredDisks {
    /// Keep them (image disks after deployment).
    Keep,
    /// Remove them.
    Remove,
}

fn validate_modifications(
    server_id: &str,
    changes: &Changes<Disk>,
    actual: &[Disk],
) -> Result<(), ProviderError> {
    for desired in &changes.to_modify {
        let Some(current) = actual.iter().find(|disk| disk.id == desired.id) else {
            continue;
        };
        let disk_id = desired.id.clone().unwrap_or_default();
        if desired.scsi_unit_id != current.scsi_unit_id {
            return Err(ProviderError::Validation(format!(
                "disk '{disk_id}' on server '{server_id}' cannot move from SCSI unit {} to {}",
                current.scsi_unit_id, desired.scsi_unit_id
            )));
        }
        if desired.size_gb < current.size_gb {
            return Err(ProviderError::InvalidDiskResize {
                server_id: server_id.to_owned(),
                disk_id,
                current_gb: current.size_gb,
                requested_gb: desired.size_gb,
            });
        }
    }
    Ok(())
}

fn record(data: &mut dyn ResourceData, disks: &[Disk]) {
    data.set_maps(keys::DISK, disks_to_maps(disks));
}

async fn wait<A: ComputeApi>(
    provider: &Provider<A>,
    description: &str,
    server_id: &str,
) -> Result<(), ProviderError> {
    provider
        .wait_for_change(description, server_id, provider.timeouts().update)
        .await
        .map(|_server| ())
}

async fn modify_disk<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
    desired: &Disk,
    current: &Disk,
) -> Result<(), ProviderError> {
    let disk_id = desired.id.as_deref().unwrap_or_default();
    if desired.size_gb > current.size_gb {
        let description = format!(
            "Resize disk '{disk_id}' on server '{server_id}' to {} GB",
            desired.size_gb
        );
        info!(server_id, disk_id, size_gb = desired.size_gb, "resizing disk");
        provider
            .retry_locked_action(&description, |api| {
                api.resize_disk(server_id, disk_id, desired.size_gb)
            })
            .await?;
        wait(provider, &description, server_id).await?;
    }
    if !desired.speed.eq_ignore_ascii_case(&current.speed) {
        let description = format!(
            "Change speed of disk '{disk_id}' on server '{server_id}' to {}",
            desired.speed
        );
        info!(server_id, disk_id, speed = %desired.speed, "changing disk speed");
        provider
            .retry_locked_action(&description, |api| {
                api.change_disk_speed(server_id, disk_id, &desired.speed)
            })
            .await?;
        wait(provider, &description, server_id).await?;
    }
    Ok(())
}

/// Converges the server's disks with the configured list, writing progress
/// back to the snapshot after every applied change.
pub(super) async fn reconcile_disks<A: ComputeApi>(
    provider: &Provider<A>,
    data: &mut dyn ResourceData,
    server: &Server,
    unconfigured: UnconfiguredDisks,
) -> Result<(), ProviderError> {
    let server_id = server.id.as_str();
    let configured = disks_from_maps(&data.get_maps(keys::DISK));
    let actual = disks_from_compute(&server.disks);
    let changes = split_by_action(&configured, &actual);
    validate_modifications(server_id, &changes, &actual)?;

    let mut recorded = actual.clone();
    if unconfigured == UnconfiguredDisks::Remove {
        for disk in &changes.to_remove {
            let Some(disk_id) = disk.id.as_deref() else {
                continue;
            };
            let description = format!("Remove disk '{disk_id}' from server '{server_id}'");
            info!(server_id, disk_id, "removing disk");
            provider
                .retry_locked_action(&description, |api| api.remove_disk(server_id, disk_id))
                .await?;
            wait(provider, &description, server_id).await?;
            recorded.retain(|existing| existing.id != disk.id);
            record(data, &recorded);
        }
    }

    for desired in &changes.to_modify {
        let Some(current) = actual.iter().find(|disk| disk.id == desired.id) else {
            continue;
        };
        modify_disk(provider, server_id, desired, current).await?;
        if let Some(entry) = recorded.iter_mut().find(|disk| disk.id == desired.id) {
            entry.clone_from(desired);
        }
        record(data, &recorded);
    }

    for desired in &changes.to_add {
        let description = format!(
            "Add {} GB disk on SCSI unit {} to server '{server_id}'",
            desired.size_gb, desired.scsi_unit_id
        );
        info!(server_id, scsi_unit_id = desired.scsi_unit_id, "adding disk");
        let request = desired.to_compute();
        let disk_id = provider
            .retry_locked_action(&description, |api| api.add_disk(server_id, &request))
            .await?;
        wait(provider, &description, server_id).await?;
        recorded.push(desired.clone().with_remote_id(Some(disk_id)));
        record(data, &recorded);
    }

    record(data, &recorded);
    Ok(())
}
