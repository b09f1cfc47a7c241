//! Contract for the CloudControl compute API consumed by the provider.
//!
//! The transport (HTTP, authentication, serialisation) lives behind
//! [`ComputeApi`]; the reconciliation core only sees typed operations that
//! either succeed or fail with an [`ApiError`] whose busy variant is
//! retryable.

mod error;
mod types;

use std::future::Future;
use std::pin::Pin;

pub use error::ApiError;
pub use types::{
    BackupDetails, Image, ImageKind, NatRule, NatRulePage, NetworkDomain, OperatingSystem, Paging,
    ResourceState, Server, ServerDeploymentConfiguration, ServerReconfiguration, ServerTag,
    VirtualMachineCpu, VirtualMachineDisk, VirtualMachineNetwork, VirtualMachineNetworkAdapter,
};

/// Future returned by compute API operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Typed operations exposed by the CloudControl compute API.
///
/// Lookups return `Ok(None)` when the subject does not exist; every other
/// failure is an [`ApiError`].
pub trait ComputeApi: Send + Sync {
    /// Fetches a network domain by identifier.
    fn get_network_domain<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Option<NetworkDomain>>;

    /// Fetches a server by identifier.
    fn get_server<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Option<Server>>;

    /// Starts deployment of a new server and returns its identifier.
    fn deploy_server<'a>(
        &'a self,
        configuration: &'a ServerDeploymentConfiguration,
    ) -> ApiFuture<'a, String>;

    /// Changes a server's name and/or description.
    fn edit_server_metadata<'a>(
        &'a self,
        id: &'a str,
        name: Option<&'a str>,
        description: Option<&'a str>,
    ) -> ApiFuture<'a, ()>;

    /// Changes a server's memory and CPU allocation.
    fn reconfigure_server<'a>(
        &'a self,
        id: &'a str,
        reconfiguration: &'a ServerReconfiguration,
    ) -> ApiFuture<'a, ()>;

    /// Deletes a stopped server.
    fn delete_server<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()>;

    /// Powers on a server.
    fn start_server<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()>;

    /// Asks the guest OS to shut down.
    fn shutdown_server<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()>;

    /// Hard-stops a server without involving the guest OS.
    fn power_off_server<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()>;

    /// Adds a disk to a server and returns the new disk's identifier.
    fn add_disk<'a>(
        &'a self,
        server_id: &'a str,
        disk: &'a VirtualMachineDisk,
    ) -> ApiFuture<'a, String>;

    /// Expands an existing disk.
    fn resize_disk<'a>(
        &'a self,
        server_id: &'a str,
        disk_id: &'a str,
        size_gb: u32,
    ) -> ApiFuture<'a, ()>;

    /// Changes the storage tier of an existing disk.
    fn change_disk_speed<'a>(
        &'a self,
        server_id: &'a str,
        disk_id: &'a str,
        speed: &'a str,
    ) -> ApiFuture<'a, ()>;

    /// Removes a disk from a server.
    fn remove_disk<'a>(&'a self, server_id: &'a str, disk_id: &'a str) -> ApiFuture<'a, ()>;

    /// Adds a network adapter and returns its identifier.
    fn add_network_adapter<'a>(
        &'a self,
        server_id: &'a str,
        adapter: &'a VirtualMachineNetworkAdapter,
    ) -> ApiFuture<'a, String>;

    /// Changes the VLAN, address, or type of an existing network adapter.
    fn change_network_adapter<'a>(
        &'a self,
        server_id: &'a str,
        adapter: &'a VirtualMachineNetworkAdapter,
    ) -> ApiFuture<'a, ()>;

    /// Removes a network adapter from a server.
    fn remove_network_adapter<'a>(
        &'a self,
        server_id: &'a str,
        adapter_id: &'a str,
    ) -> ApiFuture<'a, ()>;

    /// Lists one page of NAT rules in a network domain.
    fn list_nat_rules<'a>(
        &'a self,
        network_domain_id: &'a str,
        paging: &'a Paging,
    ) -> ApiFuture<'a, NatRulePage>;

    /// Lists the OS (built-in) images available in a datacenter.
    fn list_os_images<'a>(&'a self, datacenter_id: &'a str) -> ApiFuture<'a, Vec<Image>>;

    /// Lists the customer images available in a datacenter.
    fn list_customer_images<'a>(&'a self, datacenter_id: &'a str) -> ApiFuture<'a, Vec<Image>>;

    /// Lists the tags applied to a server.
    fn get_server_tags<'a>(&'a self, server_id: &'a str) -> ApiFuture<'a, Vec<ServerTag>>;

    /// Applies (creates or overwrites) tags on a server.
    fn apply_server_tags<'a>(
        &'a self,
        server_id: &'a str,
        tags: &'a [ServerTag],
    ) -> ApiFuture<'a, ()>;

    /// Removes tags from a server by key name.
    fn remove_server_tags<'a>(
        &'a self,
        server_id: &'a str,
        tag_names: &'a [String],
    ) -> ApiFuture<'a, ()>;

    /// Looks up a tag key by name, returning its identifier.
    fn get_tag_key_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<String>>;

    /// Creates a tag key and returns its identifier.
    fn create_tag_key<'a>(&'a self, name: &'a str) -> ApiFuture<'a, String>;

    /// Enables Cloud Backup for a server.
    fn enable_server_backup<'a>(
        &'a self,
        server_id: &'a str,
        service_plan: &'a str,
    ) -> ApiFuture<'a, ()>;

    /// Changes the Cloud Backup service plan for a server.
    fn change_server_backup_service_plan<'a>(
        &'a self,
        server_id: &'a str,
        service_plan: &'a str,
    ) -> ApiFuture<'a, ()>;

    /// Disables Cloud Backup for a server.
    fn disable_server_backup<'a>(&'a self, server_id: &'a str) -> ApiFuture<'a, ()>;

    /// Fetches Cloud Backup details, or `None` when backup is not enabled.
    fn get_server_backup_details<'a>(
        &'a self,
        server_id: &'a str,
    ) -> ApiFuture<'a, Option<BackupDetails>>;
}
