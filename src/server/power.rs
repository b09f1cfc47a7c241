//! Power state transitions.
//!
//! Start and graceful shutdown honour the `allow_server_reboots` setting.
//! Forced power-off does not: deletion must be able to proceed regardless.

use tracing::info;

use crate::compute::{ComputeApi, Server};
use crate::error::ProviderError;
use crate::provider::Provider;

fn ensure_reboots_allowed<A: ComputeApi>(
    provider: &Provider<A>,
    operation: &'static str,
    server_id: &str,
) -> Result<(), ProviderError> {
    if provider.settings().allow_server_reboots {
        return Ok(());
    }
    Err(ProviderError::RebootsDisabled {
        operation,
        server_id: server_id.to_owned(),
    })
}

/// Powers a server on and waits for the change to complete.
///
/// # Errors
///
/// Returns [`ProviderError::RebootsDisabled`] when reboots are not allowed,
/// plus any retry, lock, API, or wait error.
pub async fn start<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
) -> Result<Server, ProviderError> {
    ensure_reboots_allowed(provider, "start", server_id)?;

    let description = format!("Start server '{server_id}'");
    info!(server_id, "starting server");
    provider
        .retry_locked_action(&description, |api| api.start_server(server_id))
        .await?;
    provider
        .wait_for_change(&description, server_id, provider.timeouts().shutdown)
        .await
}

/// Gracefully shuts a server down and waits for the change to complete.
///
/// # Errors
///
/// Returns [`ProviderError::RebootsDisabled`] when reboots are not allowed,
/// plus any retry, lock, API, or wait error.
pub async fn shutdown<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
) -> Result<Server, ProviderError> {
    ensure_reboots_allowed(provider, "shut down", server_id)?;

    let description = format!("Shut down server '{server_id}'");
    info!(server_id, "shutting down server");
    provider
        .retry_locked_action(&description, |api| api.shutdown_server(server_id))
        .await?;
    provider
        .wait_for_change(&description, server_id, provider.timeouts().shutdown)
        .await
}

/// Forcibly powers a server off and waits for the change to complete.
///
/// # Errors
///
/// Returns any retry, lock, API, or wait error.
pub async fn power_off<A: ComputeApi>(
    provider: &Provider<A>,
    server_id: &str,
) -> Result<Server, ProviderError> {
    let description = format!("Power off server '{server_id}'");
    info!(server_id, "powering off server");
    provider
        .retry_locked_action(&description, |api| api.power_off_server(server_id))
        .await?;
    provider
        .wait_for_change(&description, server_id, provider.timeouts().shutdown)
        .await
}
