//! Tag reconciliation.

use tracing::{debug, info};

use super::keys;
use crate::compute::{ComputeApi, ServerTag};
use crate::data::{ResourceData, ResourceDataExt};
use crate::error::ProviderError;
use crate::models::{Tag, tags_from_maps, tags_to_maps};
use crate::provider::Provider;
use crate::reconcile::split_by_action;

async fn fetch_tags<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
) -> Result<Vec<Tag>, ProviderError> {
    let description = format!("Get tags for server '{server_id}'");
    let tags = provider
        .retry_action(&description, |api| api.get_server_tags(server_id))
        .await?;
    Ok(tags.iter().map(Tag::from_compute).collect())
}

/// Makes sure the tag key exists, creating it when the session allows.
async fn ensure_tag_key<A: ComputeApi>(
    provider: &Provider<A>,
    name: &str,
) -> Result<(), ProviderError> {
    let description = format!("Get tag key '{name}'");
    let existing = provider
        .retry_action(&description, |api| api.get_tag_key_by_name(name))
        .await?;
    if existing.is_some() {
        return Ok(());
    }
    if !provider.settings().auto_create_tag_keys {
        return Err(ProviderError::NotFound {
            kind: "tag key",
            id: name.to_owned(),
        });
    }
    let description = format!("Create tag key '{name}'");
    info!(tag_key = name, "creating tag key");
    provider
        .retry_action(&description, |api| api.create_tag_key(name))
        .await?;
    Ok(())
}

/// Converges the server's tags with the configured list and records the
/// result.
pub(super) async fn apply_server_tags<A: ComputeApi>(
    provider: &Provider<A>,
    data: &mut dyn ResourceData,
    server_id: &str,
) -> Result<(), ProviderError> {
    let configured = tags_from_maps(&data.get_maps(keys::TAG));
    let actual = fetch_tags(provider, server_id).await?;
    let changes = split_by_action(&configured, &actual);
    debug!(
        server_id,
        add = changes.to_add.len(),
        modify = changes.to_modify.len(),
        remove = changes.to_remove.len(),
        "tag changes"
    );
    if changes.is_empty() {
        data.set_maps(keys::TAG, tags_to_maps(&actual));
        return Ok(());
    }

    if !changes.to_remove.is_empty() {
        let names: Vec<String> = changes
            .to_remove
            .iter()
            .map(|tag| tag.name.clone())
            .collect();
        let description = format!("Remove tags from server '{server_id}'");
        info!(server_id, tags = ?names, "removing tags");
        provider
            .retry_action(&description, |api| api.remove_server_tags(server_id, &names))
            .await?;
    }

    let applied: Vec<ServerTag> = changes
        .to_modify
        .iter()
        .chain(&changes.to_add)
        .map(Tag::to_compute)
        .collect();
    if !applied.is_empty() {
        for tag in &applied {
            ensure_tag_key(provider, &tag.name).await?;
        }
        let description = format!("Apply tags to server '{server_id}'");
        info!(server_id, count = applied.len(), "applying tags");
        provider
            .retry_action(&description, |api| api.apply_server_tags(server_id, &applied))
            .await?;
    }

    read_server_tags(provider, data, server_id).await
}

/// Records the server's current tags.
pub(super) async fn read_server_tags<A: ComputeApi>(
    provider: &Provider<A>,
    data: &mut dyn ResourceData,
    server_id: &str,
) -> Result<(), ProviderError> {
    let tags = fetch_tags(provider, server_id).await?;
    data.set_maps(keys::TAG, tags_to_maps(&tags));
    Ok(())
}
