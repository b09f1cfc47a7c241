//! Blocking waits for asynchronous server operations.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use super::Provider;
use crate::compute::{ComputeApi, ResourceState, Server};
use crate::error::ProviderError;

enum Poll {
    Busy,
    Missing,
    Found(Server),
}

impl<A: ComputeApi> Provider<A> {
    async fn poll_server(&self, server_id: &str) -> Result<Poll, ProviderError> {
        match self.api.get_server(server_id).await {
            Ok(Some(server)) => Ok(Poll::Found(server)),
            Ok(None) => Ok(Poll::Missing),
            Err(err) if err.is_resource_busy() => Ok(Poll::Busy),
            Err(err) => Err(ProviderError::api(format!("Get server '{server_id}'"), err)),
        }
    }

    fn failed(action: &str, server: &Server) -> Option<ProviderError> {
        match &server.state {
            ResourceState::Failed(state) => Some(ProviderError::ResourceFailed {
                action: action.to_owned(),
                resource_id: server.id.clone(),
                state: state.clone(),
            }),
            _ => None,
        }
    }

    /// Waits until a newly deployed server reaches the normal state.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ResourceFailed`] when the deployment fails
    /// and [`ProviderError::Timeout`] when `timeout` elapses first.
    pub async fn wait_for_deploy(
        &self,
        server_id: &str,
        timeout: Duration,
    ) -> Result<Server, ProviderError> {
        self.wait_for_server("Deploy server", server_id, timeout, true)
            .await
    }

    /// Waits until an in-progress change on a server completes.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] when the server disappears,
    /// [`ProviderError::ResourceFailed`] when the change fails, and
    /// [`ProviderError::Timeout`] when `timeout` elapses first.
    pub async fn wait_for_change(
        &self,
        action: &str,
        server_id: &str,
        timeout: Duration,
    ) -> Result<Server, ProviderError> {
        self.wait_for_server(action, server_id, timeout, false)
            .await
    }

    async fn wait_for_server(
        &self,
        action: &str,
        server_id: &str,
        timeout: Duration,
        tolerate_absence: bool,
    ) -> Result<Server, ProviderError> {
        let deadline = Instant::now() + timeout;
        while Instant::now() <= deadline {
            match self.poll_server(server_id).await? {
                Poll::Found(server) => {
                    if let Some(err) = Self::failed(action, &server) {
                        return Err(err);
                    }
                    if !server.state.is_pending() {
                        return Ok(server);
                    }
                    debug!(server_id, state = %server.state, action, "operation in progress");
                }
                Poll::Missing if !tolerate_absence => {
                    return Err(ProviderError::NotFound {
                        kind: "server",
                        id: server_id.to_owned(),
                    });
                }
                Poll::Missing | Poll::Busy => {}
            }
            sleep(self.settings.poll_interval).await;
        }

        Err(ProviderError::Timeout {
            action: action.to_owned(),
            resource_id: server_id.to_owned(),
        })
    }

    /// Waits until a server no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ResourceFailed`] when the deletion fails and
    /// [`ProviderError::Timeout`] when `timeout` elapses first.
    pub async fn wait_for_delete(
        &self,
        server_id: &str,
        timeout: Duration,
    ) -> Result<(), ProviderError> {
        let action = "Delete server";
        let deadline = Instant::now() + timeout;
        while Instant::now() <= deadline {
            match self.poll_server(server_id).await? {
                Poll::Missing => return Ok(()),
                Poll::Found(server) => {
                    if let Some(err) = Self::failed(action, &server) {
                        return Err(err);
                    }
                    debug!(server_id, state = %server.state, "waiting for deletion");
                }
                Poll::Busy => {}
            }
            sleep(self.settings.poll_interval).await;
        }

        Err(ProviderError::Timeout {
            action: action.to_owned(),
            resource_id: server_id.to_owned(),
        })
    }
}
