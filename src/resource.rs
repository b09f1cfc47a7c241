//! Resource lifecycle abstraction used by the host framework.
//!
//! Every resource type exposes the same four entry points. The host picks
//! the implementation by resource type name and drives it with the
//! resource's snapshot and the shared provider session.

use std::future::Future;
use std::pin::Pin;

use crate::compute::ComputeApi;
use crate::data::ResourceData;
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::{backup, server};

/// Boxed future type returned by lifecycle operations.
pub type LifecycleFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ProviderError>> + Send + 'a>>;

/// Create, read, update, and delete operations for one resource type.
///
/// Implementations write progress back to the snapshot as they go, so a
/// failed operation still leaves the snapshot describing what exists.
pub trait ResourceLifecycle<A: ComputeApi> {
    /// Name of the resource type as the host framework knows it.
    const TYPE_NAME: &'static str;

    /// Creates the resource and records its identity.
    fn create<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a>;

    /// Refreshes the snapshot, clearing the identity when the resource is
    /// gone.
    fn read<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a>;

    /// Applies changed attributes.
    fn update<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a>;

    /// Destroys the resource and clears its identity.
    fn delete<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a>;
}

/// The `ddcloud_server` resource.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ServerResource;

impl<A: ComputeApi> ResourceLifecycle<A> for ServerResource {
    const TYPE_NAME: &'static str = "ddcloud_server";

    fn create<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a> {
        Box::pin(server::create(data, provider))
    }

    fn read<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a> {
        Box::pin(server::read(data, provider))
    }

    fn update<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a> {
        Box::pin(server::update(data, provider))
    }

    fn delete<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a> {
        Box::pin(server::delete(data, provider))
    }
}

/// The `ddcloud_server_backup` resource.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ServerBackupResource;

impl<A: ComputeApi> ResourceLifecycle<A> for ServerBackupResource {
    const TYPE_NAME: &'static str = "ddcloud_server_backup";

    fn create<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a> {
        Box::pin(backup::create(data, provider))
    }

    fn read<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a> {
        Box::pin(backup::read(data, provider))
    }

    fn update<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a> {
        Box::pin(backup::update(data, provider))
    }

    fn delete<'a>(
        &'a self,
        data: &'a mut dyn ResourceData,
        provider: &'a Provider<A>,
    ) -> LifecycleFuture<'a> {
        Box::pin(backup::delete(data, provider))
    }
}
