//! Server lifecycle orchestration.
//!
//! Each entry point takes the resource's configuration snapshot and the
//! provider session. Remote calls run under the retry executor, and
//! asynchronous platform operations additionally hold the async operation
//! lock and are followed by a blocking wait for completion.

mod disks;
mod image;
pub mod keys;
mod network;
mod power;
mod sizing;
mod tags;

use serde_json::Value;
use tracing::{info, warn};

use crate::compute::{ComputeApi, Image, Server, ServerDeploymentConfiguration};
use crate::data::{ResourceData, ResourceDataExt};
use crate::error::ProviderError;
use crate::models::{
    ConfiguredImage, adapters_from_maps, adapters_to_maps, apply_adapters_to_network,
    capture_adapter_ids, disks_from_compute, disks_from_maps, disks_to_maps,
};
use crate::provider::Provider;
use disks::{UnconfiguredDisks, reconcile_disks};

pub use image::{resolve_server_image, validate_admin_password};
pub use network::find_public_ipv4;
pub use power::{power_off, shutdown, start};

fn required_string(data: &dyn ResourceData, key: &str) -> Result<String, ProviderError> {
    data.get_string(key)
        .ok_or_else(|| ProviderError::Validation(format!("'{key}' must be specified")))
}

fn configured_image(data: &dyn ResourceData) -> ConfiguredImage {
    data.get(keys::IMAGE)
        .and_then(Value::as_object)
        .map(ConfiguredImage::from_map)
        .unwrap_or_default()
}

async fn fetch_server<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
) -> Result<Option<Server>, ProviderError> {
    let description = format!("Get server '{server_id}'");
    provider
        .retry_action(&description, |api| api.get_server(server_id))
        .await
}

/// Takes sizing values from configuration where given, otherwise keeps the
/// image defaults and records them.
fn merge_sizing(data: &mut dyn ResourceData, deployment: &mut ServerDeploymentConfiguration) {
    match data.get_u32(keys::MEMORY_GB) {
        Some(memory_gb) => deployment.memory_gb = memory_gb,
        None => data.set(keys::MEMORY_GB, Value::from(deployment.memory_gb)),
    }
    match data.get_u32(keys::CPU_COUNT) {
        Some(count) => deployment.cpu.count = count,
        None => data.set(keys::CPU_COUNT, Value::from(deployment.cpu.count)),
    }
    match data.get_u32(keys::CPU_CORE_COUNT) {
        Some(cores) => deployment.cpu.cores_per_socket = cores,
        None => data.set(
            keys::CPU_CORE_COUNT,
            Value::from(deployment.cpu.cores_per_socket),
        ),
    }
    match data.get_string(keys::CPU_SPEED) {
        Some(speed) => deployment.cpu.speed = speed,
        None => data.set(keys::CPU_SPEED, Value::from(deployment.cpu.speed.as_str())),
    }
}

/// Configured disk speeds override the image's for disks deployed with it.
fn merge_image_disk_speeds(data: &dyn ResourceData, deployment: &mut ServerDeploymentConfiguration) {
    let configured = disks_from_maps(&data.get_maps(keys::DISK));
    for disk in &mut deployment.disks {
        if let Some(wanted) = configured
            .iter()
            .find(|wanted| wanted.scsi_unit_id == disk.scsi_unit_id)
        {
            disk.speed.clone_from(&wanted.speed);
        }
    }
}

async fn build_deployment<A: ComputeApi>(
    provider: &Provider<A>,
    data: &mut dyn ResourceData,
    network_domain_id: &str,
) -> Result<(ServerDeploymentConfiguration, Image), ProviderError> {
    let description = format!("Get network domain '{network_domain_id}'");
    let network_domain = provider
        .retry_action(&description, |api| api.get_network_domain(network_domain_id))
        .await?
        .ok_or_else(|| ProviderError::NotFound {
            kind: "network domain",
            id: network_domain_id.to_owned(),
        })?;
    let datacenter_id = network_domain.datacenter_id;
    info!(network_domain_id, datacenter_id, "server will be deployed in datacenter");

    let selector = configured_image(data);
    selector.validate()?;
    let adapters = adapters_from_maps(&data.get_maps(keys::NETWORK_ADAPTER));
    network::validate_adapters(&adapters)?;

    let image = resolve_server_image(provider, &selector, &datacenter_id).await?;

    let mut deployment = ServerDeploymentConfiguration {
        name: required_string(data, keys::NAME)?,
        description: data.get_string(keys::DESCRIPTION).unwrap_or_default(),
        administrator_password: data.get_string(keys::ADMIN_PASSWORD).unwrap_or_default(),
        primary_dns: data.get_string(keys::PRIMARY_DNS).unwrap_or_default(),
        secondary_dns: data.get_string(keys::SECONDARY_DNS).unwrap_or_default(),
        start: data.get_bool(keys::AUTO_START),
        ..ServerDeploymentConfiguration::default()
    };
    validate_admin_password(&deployment.administrator_password, &image)?;
    image.apply_to(&mut deployment);
    merge_image_disk_speeds(data, &mut deployment);
    merge_sizing(data, &mut deployment);

    network_domain_id.clone_into(&mut deployment.network.network_domain_id);
    apply_adapters_to_network(&adapters, &mut deployment.network);
    Ok((deployment, image))
}

/// Deploys a server and brings its tags, disks, and computed network
/// attributes in line with the configuration.
///
/// The identity is recorded as soon as the deployment is accepted, and
/// every later step writes its result back before the next one starts.
///
/// # Errors
///
/// Returns validation errors for the image, admin password, or adapters,
/// [`ProviderError::NotFound`] for a missing network domain, and any
/// retry, lock, API, or wait error.
pub async fn create<A: ComputeApi>(
    data: &mut dyn ResourceData,
    provider: &Provider<A>,
) -> Result<(), ProviderError> {
    let network_domain_id = required_string(data, keys::NETWORK_DOMAIN_ID)?;
    let (deployment, image) = build_deployment(provider, data, &network_domain_id).await?;
    info!(
        name = %deployment.name,
        image_id = %image.id,
        image_kind = image.kind.name(),
        "deploying server"
    );

    let description = format!("Deploy server '{}'", deployment.name);
    let server_id = provider
        .retry_locked_action(&description, |api| api.deploy_server(&deployment))
        .await?;
    data.set_id(Some(server_id.clone()));
    let mut selector = configured_image(data);
    selector.read_image(&image);
    data.set(keys::IMAGE, Value::Object(selector.to_map()));

    info!(server_id, "server is being provisioned");
    let server = provider
        .wait_for_deploy(&server_id, provider.timeouts().create)
        .await?;

    let mut adapters = adapters_from_maps(&data.get_maps(keys::NETWORK_ADAPTER));
    capture_adapter_ids(&mut adapters, &server.network);
    data.set_maps(keys::NETWORK_ADAPTER, adapters_to_maps(&adapters));
    network::capture_primary_adapter(data, &server);
    network::refresh_public_ipv4(provider, data, &server).await?;

    tags::apply_server_tags(provider, data, &server_id).await?;
    reconcile_disks(provider, data, &server, UnconfiguredDisks::Keep).await
}

/// Refreshes the snapshot from the platform.
///
/// A server that no longer exists has its identity cleared; that is not
/// an error.
///
/// # Errors
///
/// Returns any retry or API error.
pub async fn read<A: ComputeApi>(
    data: &mut dyn ResourceData,
    provider: &Provider<A>,
) -> Result<(), ProviderError> {
    let Some(server_id) = data.id().map(str::to_owned) else {
        return Ok(());
    };
    let Some(server) = fetch_server(provider, &server_id).await? else {
        warn!(server_id, "server has been deleted");
        data.set_id(None);
        return Ok(());
    };

    data.set(keys::NAME, Value::from(server.name.as_str()));
    data.set(keys::DESCRIPTION, Value::from(server.description.as_str()));
    data.set(keys::MEMORY_GB, Value::from(server.memory_gb));
    data.set(keys::CPU_COUNT, Value::from(server.cpu.count));
    data.set(keys::CPU_CORE_COUNT, Value::from(server.cpu.cores_per_socket));
    data.set(keys::CPU_SPEED, Value::from(server.cpu.speed.as_str()));
    network::capture_network_configuration(data, &server);
    network::refresh_public_ipv4(provider, data, &server).await?;
    tags::read_server_tags(provider, data, &server_id).await?;
    data.set_maps(keys::DISK, disks_to_maps(&disks_from_compute(&server.disks)));
    Ok(())
}

/// Applies changed attribute groups: name and description, memory and
/// CPU, network adapters, tags, then disks.
///
/// A server that no longer exists has its identity cleared; that is not
/// an error.
///
/// # Errors
///
/// Returns validation errors ([`ProviderError::RebootsDisabled`],
/// [`ProviderError::InvalidDiskResize`], primary adapter removal) and any
/// retry, lock, API, or wait error.
pub async fn update<A: ComputeApi>(
    data: &mut dyn ResourceData,
    provider: &Provider<A>,
) -> Result<(), ProviderError> {
    let Some(server_id) = data.id().map(str::to_owned) else {
        return Ok(());
    };
    let Some(server) = fetch_server(provider, &server_id).await? else {
        warn!(server_id, "server has been deleted");
        data.set_id(None);
        return Ok(());
    };

    let name = data
        .has_change(keys::NAME)
        .then(|| data.get_string(keys::NAME))
        .flatten();
    let description = data
        .has_change(keys::DESCRIPTION)
        .then(|| data.get_string(keys::DESCRIPTION).unwrap_or_default());
    if name.is_some() || description.is_some() {
        info!(server_id, "server name / description change detected");
        let action = format!("Edit metadata for server '{server_id}'");
        provider
            .retry_action(&action, |api| {
                api.edit_server_metadata(&server_id, name.as_deref(), description.as_deref())
            })
            .await?;
    }

    let reconfiguration = sizing::pending_reconfiguration(data);
    if !reconfiguration.is_empty() {
        info!(server_id, "server CPU / memory change detected");
        sizing::update_server_configuration(provider, &server, &reconfiguration).await?;
    }

    if data.has_change(keys::NETWORK_ADAPTER) {
        network::update_network_adapters(provider, data, &server).await?;
    }

    if data.has_change(keys::TAG) {
        tags::apply_server_tags(provider, data, &server_id).await?;
    }

    if data.has_change(keys::DISK) {
        let current = fetch_server(provider, &server_id)
            .await?
            .ok_or_else(|| ProviderError::NotFound {
                kind: "server",
                id: server_id.clone(),
            })?;
        reconcile_disks(provider, data, &current, UnconfiguredDisks::Remove).await?;
    }
    Ok(())
}

/// Deletes a server, powering it off first when it is running.
///
/// Power-off ignores `allow_server_reboots`. A server that no longer exists
/// is treated as already deleted.
///
/// # Errors
///
/// Returns any retry, lock, API, or wait error.
pub async fn delete<A: ComputeApi>(
    data: &mut dyn ResourceData,
    provider: &Provider<A>,
) -> Result<(), ProviderError> {
    let Some(server_id) = data.id().map(str::to_owned) else {
        return Ok(());
    };
    let Some(server) = fetch_server(provider, &server_id).await? else {
        warn!(
            server_id,
            "server not found; treating it as already deleted"
        );
        data.set_id(None);
        return Ok(());
    };

    if server.started {
        info!(server_id, "server is running and will be powered off");
        power_off(provider, &server_id).await?;
    }

    let description = format!("Delete server '{server_id}'");
    info!(server_id, "deleting server");
    provider
        .retry_locked_action(&description, |api| api.delete_server(&server_id))
        .await?;
    provider
        .wait_for_delete(&server_id, provider.timeouts().delete)
        .await?;
    data.set_id(None);
    Ok(())
}
