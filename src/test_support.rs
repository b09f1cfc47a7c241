//! Test support utilities shared across unit and integration tests.
//!
//! [`FakeCompute`] is an in-memory CloudControl that implements
//! [`ComputeApi`]. Tests seed it with network domains, images, NAT rules
//! and servers, script busy responses or terminal failures per operation,
//! and inspect the journal of mutating calls afterwards.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use uuid::Uuid;

use crate::compute::{
    ApiError, ApiFuture, BackupDetails, ComputeApi, Image, ImageKind, NatRule, NatRulePage,
    NetworkDomain, Paging, ResourceState, Server, ServerDeploymentConfiguration,
    ServerReconfiguration, ServerTag, VirtualMachineDisk, VirtualMachineNetworkAdapter,
};
use crate::config::ProviderSettings;
use crate::lock::AsyncOperationLock;
use crate::provider::{LifecycleTimeouts, Provider};

/// Records a single mutating call made against [`FakeCompute`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FakeCall {
    /// Operation name, matching the [`ComputeApi`] method.
    pub operation: &'static str,
    /// Identifier (or name) the call was addressed to.
    pub target: String,
    /// Holder of the observed lock while the call ran.
    pub lock_holder: Option<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    network_domains: BTreeMap<String, NetworkDomain>,
    servers: BTreeMap<String, Server>,
    pending_polls: BTreeMap<String, u32>,
    polls_per_operation: u32,
    images: Vec<Image>,
    nat_rules: BTreeMap<String, Vec<NatRule>>,
    tag_keys: BTreeMap<String, String>,
    tags: BTreeMap<String, Vec<ServerTag>>,
    backups: BTreeMap<String, BackupDetails>,
    busy: BTreeMap<String, u32>,
    failures: BTreeMap<String, VecDeque<ApiError>>,
    calls: Vec<FakeCall>,
    address_counter: u32,
    observed_lock: Option<AsyncOperationLock>,
}

impl FakeState {
    /// Applies scripted busy and failure responses, then journals the call.
    fn intercept(&mut self, operation: &'static str, target: &str) -> Result<(), ApiError> {
        if !operation.starts_with("get_") && !operation.starts_with("list_") {
            let lock_holder = self
                .observed_lock
                .as_ref()
                .and_then(AsyncOperationLock::holder);
            self.calls.push(FakeCall {
                operation,
                target: target.to_owned(),
                lock_holder,
            });
        }
        if let Some(remaining) = self.busy.get_mut(operation).filter(|count| **count > 0) {
            *remaining -= 1;
            return Err(ApiError::busy(format!("{operation}: resource busy")));
        }
        if let Some(err) = self
            .failures
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        Ok(())
    }

    fn server_mut(&mut self, server_id: &str) -> Result<&mut Server, ApiError> {
        self.servers
            .get_mut(server_id)
            .ok_or_else(|| not_found("server", server_id))
    }

    fn begin_operation(&mut self, server_id: &str, state: ResourceState) {
        if self.polls_per_operation == 0 {
            if state == ResourceState::PendingDelete {
                self.servers.remove(server_id);
            }
            return;
        }
        if let Some(server) = self.servers.get_mut(server_id) {
            server.state = state;
        }
        self.pending_polls
            .insert(server_id.to_owned(), self.polls_per_operation);
    }

    fn next_address(&mut self) -> (String, String) {
        self.address_counter += 1;
        let host = self.address_counter + 10;
        (
            format!("10.0.0.{host}"),
            format!("2001:db8::{host:x}"),
        )
    }

    fn realise_adapter(&mut self, adapter: &VirtualMachineNetworkAdapter) -> VirtualMachineNetworkAdapter {
        let (ipv4, ipv6) = self.next_address();
        VirtualMachineNetworkAdapter {
            id: Some(new_id()),
            vlan_id: adapter
                .vlan_id
                .clone()
                .or_else(|| Some(String::from("vlan-default"))),
            private_ipv4: adapter.private_ipv4.clone().or(Some(ipv4)),
            private_ipv6: Some(ipv6),
            adapter_type: adapter
                .adapter_type
                .clone()
                .or_else(|| Some(String::from("E1000"))),
        }
    }

    fn poll(&mut self, server_id: &str) -> Option<Server> {
        if let Some(remaining) = self.pending_polls.get_mut(server_id) {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.pending_polls.remove(server_id);
                let deleting = self
                    .servers
                    .get(server_id)
                    .is_some_and(|server| server.state == ResourceState::PendingDelete);
                if deleting {
                    self.servers.remove(server_id);
                } else if let Some(server) = self.servers.get_mut(server_id) {
                    server.state = ResourceState::Normal;
                }
            }
        }
        self.servers.get(server_id).cloned()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn not_found(kind: &str, id: &str) -> ApiError {
    ApiError::response("RESOURCE_NOT_FOUND", format!("{kind} '{id}' not found"))
}

/// In-memory implementation of [`ComputeApi`].
///
/// Clones share state, so a test can keep a handle after moving the fake
/// into a [`Provider`](crate::provider::Provider).
#[derive(Clone, Debug, Default)]
pub struct FakeCompute {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCompute {
    /// Creates an empty fake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a network domain.
    pub fn seed_network_domain(&self, id: &str, datacenter_id: &str) {
        self.state().network_domains.insert(
            id.to_owned(),
            NetworkDomain {
                id: id.to_owned(),
                name: format!("domain-{id}"),
                datacenter_id: datacenter_id.to_owned(),
            },
        );
    }

    /// Adds an OS or customer image.
    pub fn seed_image(&self, image: Image) {
        self.state().images.push(image);
    }

    /// Adds a NAT rule to a network domain.
    pub fn seed_nat_rule(&self, network_domain_id: &str, internal: &str, external: &str) {
        self.state()
            .nat_rules
            .entry(network_domain_id.to_owned())
            .or_default()
            .push(NatRule {
                id: new_id(),
                internal_ip_address: internal.to_owned(),
                external_ip_address: external.to_owned(),
            });
    }

    /// Adds an existing server.
    pub fn seed_server(&self, server: Server) {
        self.state().servers.insert(server.id.clone(), server);
    }

    /// Registers a tag key.
    pub fn seed_tag_key(&self, name: &str) {
        self.state().tag_keys.insert(name.to_owned(), new_id());
    }

    /// Enables backup for a server.
    pub fn seed_backup(&self, server_id: &str, service_plan: &str) {
        self.state().backups.insert(
            server_id.to_owned(),
            BackupDetails {
                asset_id: new_id(),
                service_plan: service_plan.to_owned(),
                state: String::from("NORMAL"),
            },
        );
    }

    /// Removes a server behind the provider's back.
    pub fn remove_server(&self, server_id: &str) {
        self.state().servers.remove(server_id);
    }

    /// Makes the next `times` calls to `operation` fail as busy.
    pub fn push_busy(&self, operation: &str, times: u32) {
        let mut state = self.state();
        let remaining = state.busy.entry(operation.to_owned()).or_default();
        *remaining = remaining.saturating_add(times);
    }

    /// Makes the next call to `operation` fail with `err`.
    pub fn fail_next(&self, operation: &str, err: ApiError) {
        self.state()
            .failures
            .entry(operation.to_owned())
            .or_default()
            .push_back(err);
    }

    /// Makes servers report a pending state for `polls` reads after each
    /// asynchronous operation.
    pub fn set_polls_per_operation(&self, polls: u32) {
        self.state().polls_per_operation = polls;
    }

    /// Records the holder of `lock` with every journaled call.
    pub fn observe_lock(&self, lock: AsyncOperationLock) {
        self.state().observed_lock = Some(lock);
    }

    /// Returns the journal of mutating calls.
    #[must_use]
    pub fn calls(&self) -> Vec<FakeCall> {
        self.state().calls.clone()
    }

    /// Returns the operation names from the journal, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<&'static str> {
        self.state()
            .calls
            .iter()
            .map(|call| call.operation)
            .collect()
    }

    /// Returns a server's current state without affecting pending polls.
    #[must_use]
    pub fn server(&self, server_id: &str) -> Option<Server> {
        self.state().servers.get(server_id).cloned()
    }

    /// Returns the tags applied to a server.
    #[must_use]
    pub fn tags(&self, server_id: &str) -> Vec<ServerTag> {
        self.state()
            .tags
            .get(server_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Reports whether a tag key exists.
    #[must_use]
    pub fn has_tag_key(&self, name: &str) -> bool {
        self.state().tag_keys.contains_key(name)
    }

    /// Returns a server's backup details.
    #[must_use]
    pub fn backup(&self, server_id: &str) -> Option<BackupDetails> {
        self.state().backups.get(server_id).cloned()
    }

    fn run<T>(
        &self,
        operation: &'static str,
        target: &str,
        body: impl FnOnce(&mut FakeState) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut state = self.state();
        state.intercept(operation, target)?;
        body(&mut state)
    }

    fn list_images(&self, datacenter_id: &str, kind: ImageKind) -> Vec<Image> {
        self.state()
            .images
            .iter()
            .filter(|image| image.kind == kind && image.datacenter_id == datacenter_id)
            .cloned()
            .collect()
    }
}

impl ComputeApi for FakeCompute {
    fn get_network_domain<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Option<NetworkDomain>> {
        Box::pin(async move {
            self.run("get_network_domain", id, |state| {
                Ok(state.network_domains.get(id).cloned())
            })
        })
    }

    fn get_server<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Option<Server>> {
        Box::pin(async move { self.run("get_server", id, |state| Ok(state.poll(id))) })
    }

    fn deploy_server<'a>(
        &'a self,
        configuration: &'a ServerDeploymentConfiguration,
    ) -> ApiFuture<'a, String> {
        Box::pin(async move {
            self.run("deploy_server", &configuration.name, |state| {
                let domain_id = &configuration.network.network_domain_id;
                let datacenter_id = state
                    .network_domains
                    .get(domain_id)
                    .map(|domain| domain.datacenter_id.clone())
                    .ok_or_else(|| not_found("network domain", domain_id))?;
                let id = new_id();
                let primary_adapter = state.realise_adapter(&configuration.network.primary_adapter);
                let additional_adapters = configuration
                    .network
                    .additional_adapters
                    .iter()
                    .map(|adapter| state.realise_adapter(adapter))
                    .collect();
                let server = Server {
                    id: id.clone(),
                    name: configuration.name.clone(),
                    description: configuration.description.clone(),
                    datacenter_id,
                    memory_gb: configuration.memory_gb,
                    cpu: configuration.cpu.clone(),
                    disks: configuration
                        .disks
                        .iter()
                        .map(|disk| VirtualMachineDisk {
                            id: Some(new_id()),
                            ..disk.clone()
                        })
                        .collect(),
                    network: crate::compute::VirtualMachineNetwork {
                        network_domain_id: domain_id.clone(),
                        primary_adapter,
                        additional_adapters,
                    },
                    started: configuration.start,
                    state: ResourceState::Normal,
                };
                state.servers.insert(id.clone(), server);
                state.begin_operation(&id, ResourceState::PendingAdd);
                Ok(id)
            })
        })
    }

    fn edit_server_metadata<'a>(
        &'a self,
        id: &'a str,
        name: Option<&'a str>,
        description: Option<&'a str>,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("edit_server_metadata", id, |state| {
                let server = state.server_mut(id)?;
                if let Some(value) = name {
                    value.clone_into(&mut server.name);
                }
                if let Some(value) = description {
                    value.clone_into(&mut server.description);
                }
                Ok(())
            })
        })
    }

    fn reconfigure_server<'a>(
        &'a self,
        id: &'a str,
        reconfiguration: &'a ServerReconfiguration,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("reconfigure_server", id, |state| {
                let server = state.server_mut(id)?;
                if reconfiguration.changes_cpu() && server.started {
                    return Err(ApiError::response(
                        "SERVER_STARTED",
                        "CPU changes require the server to be stopped",
                    ));
                }
                if let Some(memory) = reconfiguration.memory_gb {
                    server.memory_gb = memory;
                }
                if let Some(count) = reconfiguration.cpu_count {
                    server.cpu.count = count;
                }
                if let Some(cores) = reconfiguration.cores_per_socket {
                    server.cpu.cores_per_socket = cores;
                }
                if let Some(speed) = &reconfiguration.cpu_speed {
                    server.cpu.speed.clone_from(speed);
                }
                state.begin_operation(id, ResourceState::PendingChange);
                Ok(())
            })
        })
    }

    fn delete_server<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("delete_server", id, |state| {
                if state.server_mut(id)?.started {
                    return Err(ApiError::response(
                        "SERVER_STARTED",
                        "a running server cannot be deleted",
                    ));
                }
                state.tags.remove(id);
                state.backups.remove(id);
                state.begin_operation(id, ResourceState::PendingDelete);
                Ok(())
            })
        })
    }

    fn start_server<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("start_server", id, |state| {
                state.server_mut(id)?.started = true;
                state.begin_operation(id, ResourceState::PendingChange);
                Ok(())
            })
        })
    }

    fn shutdown_server<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("shutdown_server", id, |state| {
                state.server_mut(id)?.started = false;
                state.begin_operation(id, ResourceState::PendingChange);
                Ok(())
            })
        })
    }

    fn power_off_server<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("power_off_server", id, |state| {
                state.server_mut(id)?.started = false;
                state.begin_operation(id, ResourceState::PendingChange);
                Ok(())
            })
        })
    }

    fn add_disk<'a>(
        &'a self,
        server_id: &'a str,
        disk: &'a VirtualMachineDisk,
    ) -> ApiFuture<'a, String> {
        Box::pin(async move {
            self.run("add_disk", server_id, |state| {
                let server = state.server_mut(server_id)?;
                if server
                    .disks
                    .iter()
                    .any(|existing| existing.scsi_unit_id == disk.scsi_unit_id)
                {
                    return Err(ApiError::response(
                        "SCSI_UNIT_IN_USE",
                        format!("SCSI unit {} is already in use", disk.scsi_unit_id),
                    ));
                }
                let id = new_id();
                server.disks.push(VirtualMachineDisk {
                    id: Some(id.clone()),
                    ..disk.clone()
                });
                state.begin_operation(server_id, ResourceState::PendingChange);
                Ok(id)
            })
        })
    }

    fn resize_disk<'a>(
        &'a self,
        server_id: &'a str,
        disk_id: &'a str,
        size_gb: u32,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("resize_disk", disk_id, |state| {
                let server = state.server_mut(server_id)?;
                let disk = server
                    .disks
                    .iter_mut()
                    .find(|disk| disk.id.as_deref() == Some(disk_id))
                    .ok_or_else(|| not_found("disk", disk_id))?;
                disk.size_gb = size_gb;
                state.begin_operation(server_id, ResourceState::PendingChange);
                Ok(())
            })
        })
    }

    fn change_disk_speed<'a>(
        &'a self,
        server_id: &'a str,
        disk_id: &'a str,
        speed: &'a str,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("change_disk_speed", disk_id, |state| {
                let server = state.server_mut(server_id)?;
                let disk = server
                    .disks
                    .iter_mut()
                    .find(|disk| disk.id.as_deref() == Some(disk_id))
                    .ok_or_else(|| not_found("disk", disk_id))?;
                speed.clone_into(&mut disk.speed);
                state.begin_operation(server_id, ResourceState::PendingChange);
                Ok(())
            })
        })
    }

    fn remove_disk<'a>(&'a self, server_id: &'a str, disk_id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("remove_disk", disk_id, |state| {
                let server = state.server_mut(server_id)?;
                let before = server.disks.len();
                server
                    .disks
                    .retain(|disk| disk.id.as_deref() != Some(disk_id));
                if server.disks.len() == before {
                    return Err(not_found("disk", disk_id));
                }
                state.begin_operation(server_id, ResourceState::PendingChange);
                Ok(())
            })
        })
    }

    fn add_network_adapter<'a>(
        &'a self,
        server_id: &'a str,
        adapter: &'a VirtualMachineNetworkAdapter,
    ) -> ApiFuture<'a, String> {
        Box::pin(async move {
            let target = adapter.vlan_id.as_deref().unwrap_or_default();
            self.run("add_network_adapter", target, |state| {
                state.server_mut(server_id)?;
                let realised = state.realise_adapter(adapter);
                let id = realised.id.clone().unwrap_or_default();
                state
                    .server_mut(server_id)?
                    .network
                    .additional_adapters
                    .push(realised);
                state.begin_operation(server_id, ResourceState::PendingChange);
                Ok(id)
            })
        })
    }

    fn change_network_adapter<'a>(
        &'a self,
        server_id: &'a str,
        adapter: &'a VirtualMachineNetworkAdapter,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let target = adapter.id.as_deref().unwrap_or_default();
            self.run("change_network_adapter", target, |state| {
                let server = state.server_mut(server_id)?;
                let network = &mut server.network;
                let existing = std::iter::once(&mut network.primary_adapter)
                    .chain(network.additional_adapters.iter_mut())
                    .find(|existing| existing.id.is_some() && existing.id == adapter.id)
                    .ok_or_else(|| not_found("network adapter", target))?;
                if adapter.vlan_id.is_some() {
                    existing.vlan_id.clone_from(&adapter.vlan_id);
                }
                if adapter.private_ipv4.is_some() {
                    existing.private_ipv4.clone_from(&adapter.private_ipv4);
                }
                if adapter.adapter_type.is_some() {
                    existing.adapter_type.clone_from(&adapter.adapter_type);
                }
                state.begin_operation(server_id, ResourceState::PendingChange);
                Ok(())
            })
        })
    }

    fn remove_network_adapter<'a>(
        &'a self,
        server_id: &'a str,
        adapter_id: &'a str,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("remove_network_adapter", adapter_id, |state| {
                let server = state.server_mut(server_id)?;
                if server.network.primary_adapter.id.as_deref() == Some(adapter_id) {
                    return Err(ApiError::response(
                        "CANNOT_REMOVE_PRIMARY_NIC",
                        "the primary network adapter cannot be removed",
                    ));
                }
                let adapters = &mut server.network.additional_adapters;
                let before = adapters.len();
                adapters.retain(|adapter| adapter.id.as_deref() != Some(adapter_id));
                if adapters.len() == before {
                    return Err(not_found("network adapter", adapter_id));
                }
                state.begin_operation(server_id, ResourceState::PendingChange);
                Ok(())
            })
        })
    }

    fn list_nat_rules<'a>(
        &'a self,
        network_domain_id: &'a str,
        paging: &'a Paging,
    ) -> ApiFuture<'a, NatRulePage> {
        Box::pin(async move {
            self.run("list_nat_rules", network_domain_id, |state| {
                let size = usize::try_from(paging.page_size).unwrap_or(usize::MAX).max(1);
                let skip = usize::try_from(paging.page_number.saturating_sub(1))
                    .unwrap_or(usize::MAX)
                    .saturating_mul(size);
                let rules = state
                    .nat_rules
                    .get(network_domain_id)
                    .map(|rules| rules.iter().skip(skip).take(size).cloned().collect())
                    .unwrap_or_default();
                Ok(NatRulePage {
                    rules,
                    page_number: paging.page_number,
                    page_size: paging.page_size,
                })
            })
        })
    }

    fn list_os_images<'a>(&'a self, datacenter_id: &'a str) -> ApiFuture<'a, Vec<Image>> {
        Box::pin(async move {
            self.run("list_os_images", datacenter_id, |_state| Ok(()))?;
            Ok(self.list_images(datacenter_id, ImageKind::Os))
        })
    }

    fn list_customer_images<'a>(&'a self, datacenter_id: &'a str) -> ApiFuture<'a, Vec<Image>> {
        Box::pin(async move {
            self.run("list_customer_images", datacenter_id, |_state| Ok(()))?;
            Ok(self.list_images(datacenter_id, ImageKind::Customer))
        })
    }

    fn get_server_tags<'a>(&'a self, server_id: &'a str) -> ApiFuture<'a, Vec<ServerTag>> {
        Box::pin(async move {
            self.run("get_server_tags", server_id, |state| {
                Ok(state.tags.get(server_id).cloned().unwrap_or_default())
            })
        })
    }

    fn apply_server_tags<'a>(
        &'a self,
        server_id: &'a str,
        tags: &'a [ServerTag],
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("apply_server_tags", server_id, |state| {
                if let Some(unknown) = tags
                    .iter()
                    .find(|tag| !state.tag_keys.contains_key(&tag.name))
                {
                    return Err(not_found("tag key", &unknown.name));
                }
                let applied = state.tags.entry(server_id.to_owned()).or_default();
                for tag in tags {
                    applied.retain(|existing| existing.name != tag.name);
                    applied.push(tag.clone());
                }
                Ok(())
            })
        })
    }

    fn remove_server_tags<'a>(
        &'a self,
        server_id: &'a str,
        names: &'a [String],
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("remove_server_tags", server_id, |state| {
                if let Some(applied) = state.tags.get_mut(server_id) {
                    applied.retain(|tag| !names.contains(&tag.name));
                }
                Ok(())
            })
        })
    }

    fn get_tag_key_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<String>> {
        Box::pin(async move {
            self.run("get_tag_key_by_name", name, |state| {
                Ok(state.tag_keys.get(name).cloned())
            })
        })
    }

    fn create_tag_key<'a>(&'a self, name: &'a str) -> ApiFuture<'a, String> {
        Box::pin(async move {
            self.run("create_tag_key", name, |state| {
                let id = new_id();
                state.tag_keys.insert(name.to_owned(), id.clone());
                Ok(id)
            })
        })
    }

    fn enable_server_backup<'a>(
        &'a self,
        server_id: &'a str,
        service_plan: &'a str,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("enable_server_backup", server_id, |state| {
                state.server_mut(server_id)?;
                if state.backups.contains_key(server_id) {
                    return Err(ApiError::response(
                        "BACKUP_ALREADY_ENABLED",
                        format!("backup is already enabled for server '{server_id}'"),
                    ));
                }
                state.backups.insert(
                    server_id.to_owned(),
                    BackupDetails {
                        asset_id: new_id(),
                        service_plan: service_plan.to_owned(),
                        state: String::from("NORMAL"),
                    },
                );
                Ok(())
            })
        })
    }

    fn change_server_backup_service_plan<'a>(
        &'a self,
        server_id: &'a str,
        service_plan: &'a str,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("change_server_backup_service_plan", server_id, |state| {
                let details = state
                    .backups
                    .get_mut(server_id)
                    .ok_or_else(|| not_found("backup", server_id))?;
                service_plan.clone_into(&mut details.service_plan);
                Ok(())
            })
        })
    }

    fn disable_server_backup<'a>(&'a self, server_id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.run("disable_server_backup", server_id, |state| {
                state
                    .backups
                    .remove(server_id)
                    .map(|_details| ())
                    .ok_or_else(|| not_found("backup", server_id))
            })
        })
    }

    fn get_server_backup_details<'a>(
        &'a self,
        server_id: &'a str,
    ) -> ApiFuture<'a, Option<BackupDetails>> {
        Box::pin(async move {
            self.run("get_server_backup_details", server_id, |state| {
                Ok(state.backups.get(server_id).cloned())
            })
        })
    }
}

/// Builds an image with a single 10 GB disk on SCSI unit 0.
#[must_use]
pub fn image(id: &str, name: &str, kind: ImageKind, datacenter_id: &str, os_id: &str) -> Image {
    let family = if os_id.starts_with("WIN") { "WINDOWS" } else { "UNIX" };
    Image {
        id: id.to_owned(),
        name: name.to_owned(),
        kind,
        datacenter_id: datacenter_id.to_owned(),
        os: crate::compute::OperatingSystem {
            id: os_id.to_owned(),
            family: family.to_owned(),
        },
        cpu: crate::compute::VirtualMachineCpu {
            count: 2,
            cores_per_socket: 1,
            speed: String::from("STANDARD"),
        },
        memory_gb: 4,
        disks: vec![VirtualMachineDisk {
            id: None,
            scsi_unit_id: 0,
            size_gb: 10,
            speed: String::from("STANDARD"),
        }],
    }
}

/// Settings with millisecond delays so retries and waits finish quickly.
#[must_use]
pub fn fast_settings() -> ProviderSettings {
    ProviderSettings {
        retry_timeout: Duration::from_secs(2),
        retry_delay: Duration::from_millis(1),
        max_retry_delay: Duration::from_millis(5),
        poll_interval: Duration::from_millis(1),
        ..ProviderSettings::default()
    }
}

/// Builds a session over `api` with short lifecycle timeouts and a private
/// lock, so tests running in parallel do not contend for the global one.
#[must_use]
pub fn fast_provider<A: ComputeApi>(api: A, settings: ProviderSettings) -> Provider<A> {
    let wait = Duration::from_secs(2);
    Provider::new(api, settings)
        .with_lock(AsyncOperationLock::new())
        .with_timeouts(LifecycleTimeouts {
            create: wait,
            update: wait,
            delete: wait,
            shutdown: wait,
        })
}

/// Builds a running server with a primary adapter on `vlan-1` at
/// `10.0.0.5` and a 10 GB disk on SCSI unit 0.
#[must_use]
pub fn server(id: &str, network_domain_id: &str, datacenter_id: &str) -> Server {
    Server {
        id: id.to_owned(),
        name: format!("server-{id}"),
        description: String::new(),
        datacenter_id: datacenter_id.to_owned(),
        memory_gb: 4,
        cpu: crate::compute::VirtualMachineCpu {
            count: 2,
            cores_per_socket: 1,
            speed: String::from("STANDARD"),
        },
        disks: vec![VirtualMachineDisk {
            id: Some(String::from("disk-0")),
            scsi_unit_id: 0,
            size_gb: 10,
            speed: String::from("STANDARD"),
        }],
        network: crate::compute::VirtualMachineNetwork {
            network_domain_id: network_domain_id.to_owned(),
            primary_adapter: VirtualMachineNetworkAdapter {
                id: Some(String::from("nic-primary")),
                vlan_id: Some(String::from("vlan-1")),
                private_ipv4: Some(String::from("10.0.0.5")),
                private_ipv6: Some(String::from("2001:db8::5")),
                adapter_type: Some(String::from("E1000")),
            },
            additional_adapters: Vec::new(),
        },
        started: true,
        state: ResourceState::Normal,
    }
}
