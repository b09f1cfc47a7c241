//! Network adapters, primary-adapter capture, and public IPv4 lookup.

use tracing::{debug, info};

use super::keys;
use crate::compute::{ComputeApi, Paging, Server};
use crate::data::{ResourceData, ResourceDataExt};
use crate::error::ProviderError;
use crate::models::{NetworkAdapter, adapters_from_maps, adapters_from_network, adapters_to_maps};
use crate::provider::Provider;
use crate::reconcile::split_by_action;

/// Finds the public IPv4 address NAT-mapped to `private_ipv4`.
///
/// Pages through the network domain's NAT rules until a rule matches or the
/// listing is exhausted. No mapping is not an error.
///
/// # Errors
///
/// Returns retry or API errors from the listing call.
pub async fn find_public_ipv4<A: ComputeApi>(
    provider: &Provider<A>,
    network_domain_id: &str,
    private_ipv4: &str,
) -> Result<Option<String>, ProviderError> {
    let mut paging = Paging::default();
    loop {
        let description = format!(
            "List NAT rules (page {}) in network domain '{network_domain_id}'",
            paging.page_number
        );
        let page = provider
            .retry_action(&description, |api| {
                api.list_nat_rules(network_domain_id, &paging)
            })
            .await?;
        if page.is_empty() {
            return Ok(None);
        }
        if let Some(rule) = page
            .rules
            .into_iter()
            .find(|rule| rule.internal_ip_address == private_ipv4)
        {
            return Ok(Some(rule.external_ip_address));
        }
        paging.next();
    }
}

/// Looks up and records the server's public IPv4 address.
pub(super) async fn refresh_public_ipv4<A: ComputeApi>(
    provider: &Provider<A>,
    data: &mut dyn ResourceData,
    server: &Server,
) -> Result<(), ProviderError> {
    let public_ipv4 = match server.network.primary_adapter.private_ipv4.as_deref() {
        Some(private_ipv4) => {
            find_public_ipv4(provider, &server.network.network_domain_id, private_ipv4).await?
        }
        None => None,
    };
    data.set_opt_str(keys::PUBLIC_IPV4, public_ipv4.as_deref());
    Ok(())
}

/// Records the primary adapter's VLAN and addresses.
pub(super) fn capture_primary_adapter(data: &mut dyn ResourceData, server: &Server) {
    let primary = &server.network.primary_adapter;
    data.set_opt_str(keys::PRIMARY_ADAPTER_VLAN, primary.vlan_id.as_deref());
    data.set_opt_str(keys::PRIMARY_ADAPTER_IPV4, primary.private_ipv4.as_deref());
    data.set_opt_str(keys::PRIMARY_ADAPTER_IPV6, primary.private_ipv6.as_deref());
}

/// Records the server's adapters (primary first) and primary adapter
/// details.
pub(super) fn capture_network_configuration(data: &mut dyn ResourceData, server: &Server) {
    data.set_maps(
        keys::NETWORK_ADAPTER,
        adapters_to_maps(&adapters_from_network(&server.network)),
    );
    capture_primary_adapter(data, server);
}

pub(super) fn validate_adapters(adapters: &[NetworkAdapter]) -> Result<(), ProviderError> {
    if adapters.is_empty() {
        return Err(ProviderError::Validation(String::from(
            "at least one network adapter must be configured",
        )));
    }
    if let Some(index) = adapters
        .iter()
        .position(|adapter| adapter.vlan_id.is_none() && adapter.private_ipv4.is_none())
    {
        return Err(ProviderError::Validation(format!(
            "network adapter {index} must specify a VLAN or an IPv4 address"
        )));
    }
    Ok(())
}

async fn fetch_server<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
) -> Result<Server, ProviderError> {
    let description = format!("Get server '{server_id}'");
    provider
        .retry_action(&description, |api| api.get_server(server_id))
        .await?
        .ok_or_else(|| ProviderError::NotFound {
            kind: "server",
            id: server_id.to_owned(),
        })
}

fn ensure_not_primary(server: &Server, adapter: &NetworkAdapter) -> Result<(), ProviderError> {
    if adapter.id.is_some() && adapter.id == server.network.primary_adapter.id {
        return Err(ProviderError::Validation(format!(
            "cannot remove the primary network adapter of server '{}'",
            server.id
        )));
    }
    Ok(())
}

async fn remove_adapter<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
    adapter: &NetworkAdapter,
) -> Result<(), ProviderError> {
    let Some(adapter_id) = adapter.id.as_deref() else {
        return Ok(());
    };
    let description = format!("Remove network adapter '{adapter_id}' from server '{server_id}'");
    info!(server_id, adapter_id, "removing network adapter");
    provider
        .retry_locked_action(&description, |api| {
            api.remove_network_adapter(server_id, adapter_id)
        })
        .await?;
    provider
        .wait_for_change(&description, server_id, provider.timeouts().update)
        .await?;
    Ok(())
}

async fn modify_adapter<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
    adapter: &NetworkAdapter,
) -> Result<(), ProviderError> {
    let adapter_id = adapter.id.as_deref().unwrap_or_default();
    let description = format!("Change network adapter '{adapter_id}' on server '{server_id}'");
    info!(server_id, adapter_id, "changing network adapter");
    let request = adapter.to_compute();
    provider
        .retry_locked_action(&description, |api| {
            api.change_network_adapter(server_id, &request)
        })
        .await?;
    provider
        .wait_for_change(&description, server_id, provider.timeouts().update)
        .await?;
    Ok(())
}

async fn add_adapter<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
    adapter: &NetworkAdapter,
) -> Result<(), ProviderError> {
    let slot = adapter
        .vlan_id
        .as_deref()
        .or(adapter.private_ipv4.as_deref())
        .unwrap_or_default();
    let description = format!("Add network adapter ({slot}) to server '{server_id}'");
    info!(server_id, slot, "adding network adapter");
    let request = adapter.to_compute();
    let adapter_id = provider
        .retry_locked_action(&description, |api| {
            api.add_network_adapter(server_id, &request)
        })
        .await?;
    debug!(server_id, adapter_id, "network adapter added");
    provider
        .wait_for_change(&description, server_id, provider.timeouts().update)
        .await?;
    Ok(())
}

/// Converges the server's network adapters with the configured list.
///
/// Adapters dropped from the configuration since the last pass are removed
/// first. The server is then re-read and the configuration diffed against
/// the fresh adapter list, applying removals, then modifications, then
/// additions. The final adapter list is written back to the snapshot.
pub(super) async fn update_network_adapters<A: ComputeApi>(
    provider: &Provider<A>,
    data: &mut dyn ResourceData,
    server: &Server,
) -> Result<(), ProviderError> {
    let server_id = server.id.as_str();
    let configured = adapters_from_maps(&data.get_maps(keys::NETWORK_ADAPTER));
    validate_adapters(&configured)?;
    let previous = adapters_from_maps(&data.get_old_maps(keys::NETWORK_ADAPTER));

    let dropped = split_by_action(&configured, &previous).to_remove;
    let mut current = server.clone();
    if !dropped.is_empty() {
        for adapter in &dropped {
            ensure_not_primary(&current, adapter)?;
        }
        for adapter in &dropped {
            remove_adapter(provider, server_id, adapter).await?;
        }
        current = fetch_server(provider, server_id).await?;
        capture_network_configuration(data, &current);
    }

    let actual = adapters_from_network(&current.network);
    let changes = split_by_action(&configured, &actual);
    debug!(
        server_id,
        add = changes.to_add.len(),
        modify = changes.to_modify.len(),
        remove = changes.to_remove.len(),
        "network adapter changes"
    );

    if !changes.is_empty() {
        for adapter in &changes.to_remove {
            ensure_not_primary(&current, adapter)?;
        }
        for adapter in &changes.to_remove {
            remove_adapter(provider, server_id, adapter).await?;
        }
        for adapter in &changes.to_modify {
            modify_adapter(provider, server_id, adapter).await?;
        }
        for adapter in &changes.to_add {
            add_adapter(provider, server_id, adapter).await?;
        }
    }

    let refreshed = fetch_server(provider, server_id).await?;
    capture_network_configuration(data, &refreshed);
    if !changes.is_empty() {
        refresh_public_ipv4(provider, data, &refreshed).await?;
    }
    Ok(())
}

