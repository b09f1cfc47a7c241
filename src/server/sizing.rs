//! Memory and CPU reconfiguration.

use tracing::info;

use super::{keys, power};
use crate::compute::{ComputeApi, Server, ServerReconfiguration};
use crate::data::{ResourceData, ResourceDataExt};
use crate::error::ProviderError;
use crate::provider::Provider;

fn changed_u32(data: &dyn ResourceData, key: &str) -> Option<u32> {
    if data.has_change(key) {
        data.get_u32(key)
    } else {
        None
    }
}

/// Builds the reconfiguration implied by changed sizing fields.
pub(super) fn pending_reconfiguration(data: &dyn ResourceData) -> ServerReconfiguration {
    ServerReconfiguration {
        memory_gb: changed_u32(data, keys::MEMORY_GB),
        cpu_count: changed_u32(data, keys::CPU_COUNT),
        cores_per_socket: changed_u32(data, keys::CPU_CORE_COUNT),
        cpu_speed: if data.has_change(keys::CPU_SPEED) {
            data.get_string(keys::CPU_SPEED)
        } else {
            None
        },
    }
}

/// Applies memory and CPU changes.
///
/// CPU changes on a running server need a shutdown and restart, which
/// requires `allow_server_reboots`. Memory-only changes apply in place.
pub(super) async fn update_server_configuration<A: ComputeApi>(
    provider: &Provider<A>,
    server: &Server,
    reconfiguration: &ServerReconfiguration,
) -> Result<(), ProviderError> {
    if reconfiguration.is_empty() {
        return Ok(());
    }
    let server_id = server.id.as_str();
    let restart = reconfiguration.changes_cpu() && server.started;
    if restart {
        power::shutdown(provider, server_id).await?;
    }

    let description = format!("Reconfigure server '{server_id}'");
    info!(server_id, ?reconfiguration, "reconfiguring server");
    provider
        .retry_locked_action(&description, |api| {
            api.reconfigure_server(server_id, reconfiguration)
        })
        .await?;
    provider
        .wait_for_change(&description, server_id, provider.timeouts().update)
        .await?;

    if restart {
        power::start(provider, server_id).await?;
    }
    Ok(())
}
