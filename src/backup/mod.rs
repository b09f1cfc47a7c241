//! Server backup lifecycle orchestration.
//!
//! A backup resource shares its identity with the server it protects.
//! Enabling, re-planning and disabling backup are synchronous platform
//! calls, so they run under the retry executor without the async operation
//! lock.

use serde_json::Value;
use tracing::{info, warn};

use crate::compute::{BackupDetails, ComputeApi, Server};
use crate::data::{ResourceData, ResourceDataExt};
use crate::error::ProviderError;
use crate::provider::Provider;

/// Snapshot keys for the server backup resource.
pub mod keys {
    /// Identifier of the protected server.
    pub const SERVER_ID: &str = "server";
    /// Backup service plan.
    pub const SERVICE_PLAN: &str = "service_plan";
    /// Cloud Backup asset identifier (computed).
    pub const ASSET_ID: &str = "asset_id";
}

fn required_string(data: &dyn ResourceData, key: &str) -> Result<String, ProviderError> {
    data.get_string(key)
        .ok_or_else(|| ProviderError::Validation(format!("'{key}' must be specified")))
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

async fn require_server<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
) -> Result<Server, ProviderError> {
    fetch_server(provider, server_id)
        .await?
        .ok_or_else(|| ProviderError::NotFound {
            kind: "server",
            id: server_id.to_owned(),
        })
}

async fn fetch_details<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
) -> Result<Option<BackupDetails>, ProviderError> {
    let description = format!("Get backup details for server '{server_id}'");
    provider
        .retry_action(&description, |api| api.get_server_backup_details(server_id))
        .await
}

/// Returns the protected server when both it and its backup exist;
/// otherwise clears the identity.
async fn existing_backup<A: ComputeApi>(
    data: &mut dyn ResourceData,
    provider: &Provider<A>,
    server_id: &str,
) -> Result<Option<Server>, ProviderError> {
    let Some(server) = fetch_server(provider, server_id).await? else {
        warn!(server_id, "server not found; treating backup as deleted");
        data.set_id(None);
        return Ok(None);
    };
    if fetch_details(provider, server_id).await?.is_none() {
        warn!(server_id, "backup is not enabled; treating backup as deleted");
        data.set_id(None);
        return Ok(None);
    }
    Ok(Some(server))
}

/// Enables backup for the configured server.
///
/// # Errors
///
/// Returns [`ProviderError::NotFound`] when the server does not exist or
/// backup details are missing after enabling, and any retry or API error.
pub async fn create<A: ComputeApi>(
    data: &mut dyn ResourceData,
    provider: &Provider<A>,
) -> Result<(), ProviderError> {
    let server_id = required_string(data, keys::SERVER_ID)?;
    let service_plan = required_string(data, keys::SERVICE_PLAN)?;
    let server = require_server(provider, &server_id).await?;

    let description = format!("Enable backup for server '{}'", server.name);
    info!(server_id, service_plan, "enabling server backup");
    provider
        .retry_action(&description, |api| {
            api.enable_server_backup(&server_id, &service_plan)
        })
        .await?;

    let details = fetch_details(provider, &server_id)
        .await?
        .ok_or_else(|| ProviderError::NotFound {
            kind: "backup details",
            id: server_id.clone(),
        })?;
    data.set(keys::ASSET_ID, Value::from(details.asset_id));
    data.set_id(Some(server_id));
    Ok(())
}

/// Refreshes the asset identifier and service plan.
///
/// When either the server or its backup no longer exists, the identity is
/// cleared and the read succeeds.
///
/// # Errors
///
/// Returns any retry or API error.
pub async fn read<A: ComputeApi>(
    data: &mut dyn ResourceData,
    provider: &Provider<A>,
) -> Result<(), ProviderError> {
    let Some(server_id) = data
        .get_string(keys::SERVER_ID)
        .or_else(|| data.id().map(str::to_owned))
    else {
        return Ok(());
    };
    if fetch_server(provider, &server_id).await?.is_none() {
        warn!(server_id, "server not found; treating backup as deleted");
        data.set_id(None);
        return Ok(());
    }
    let Some(details) = fetch_details(provider, &server_id).await? else {
        warn!(server_id, "backup is not enabled; treating backup as deleted");
        data.set_id(None);
        return Ok(());
    };
    data.set(keys::ASSET_ID, Value::from(details.asset_id));
    data.set(keys::SERVICE_PLAN, Value::from(details.service_plan));
    Ok(())
}

/// Changes the backup service plan when it has changed. A missing server
/// or backup clears the identity instead.
///
/// # Errors
///
/// Returns any retry or API error.
pub async fn update<A: ComputeApi>(
    data: &mut dyn ResourceData,
    provider: &Provider<A>,
) -> Result<(), ProviderError> {
    let server_id = required_string(data, keys::SERVER_ID)?;
    let Some(server) = existing_backup(data, provider, &server_id).await? else {
        return Ok(());
    };

    if data.has_change(keys::SERVICE_PLAN) {
        let service_plan = required_string(data, keys::SERVICE_PLAN)?;
        let description = format!("Change backup service plan for server '{}'", server.name);
        info!(server_id, service_plan, "changing backup service plan");
        provider
            .retry_action(&description, |api| {
                api.change_server_backup_service_plan(&server_id, &service_plan)
            })
            .await?;
    }
    Ok(())
}

/// Disables backup for the server. A missing server or backup that is
/// already disabled counts as deleted.
///
/// # Errors
///
/// Returns any retry or API error.
pub async fn delete<A: ComputeApi>(
    data: &mut dyn ResourceData,
    provider: &Provider<A>,
) -> Result<(), ProviderError> {
    let server_id = required_string(data, keys::SERVER_ID)?;
    let Some(server) = existing_backup(data, provider, &server_id).await? else {
        return Ok(());
    };

    let description = format!("Disable backup for server '{}'", server.name);
    info!(server_id, "disabling server backup");
    provider
        .retry_action(&description, |api| api.disable_server_backup(&server_id))
        .await?;
    data.set_id(None);
    Ok(())
}
