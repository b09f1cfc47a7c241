//! Domain objects exchanged with the compute API.

use std::fmt;

/// Provisioning state reported for a server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResourceState {
    /// No operation is in progress.
    Normal,
    /// The server is being deployed.
    PendingAdd,
    /// An asynchronous change is in progress.
    PendingChange,
    /// The server is being deleted.
    PendingDelete,
    /// The last operation failed; carries the platform's state name.
    Failed(String),
}

impl ResourceState {
    /// Returns `true` when an asynchronous operation is still running.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::PendingAdd | Self::PendingChange | Self::PendingDelete
        )
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => formatter.write_str("NORMAL"),
            Self::PendingAdd => formatter.write_str("PENDING_ADD"),
            Self::PendingChange => formatter.write_str("PENDING_CHANGE"),
            Self::PendingDelete => formatter.write_str("PENDING_DELETE"),
            Self::Failed(state) => formatter.write_str(state),
        }
    }
}

/// CPU allocation for a server or image.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VirtualMachineCpu {
    /// Number of virtual CPUs.
    pub count: u32,
    /// Cores per CPU socket.
    pub cores_per_socket: u32,
    /// CPU speed class (for example `STANDARD` or `HIGHPERFORMANCE`).
    pub speed: String,
}

/// A disk attached to a server or defined by an image.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VirtualMachineDisk {
    /// Platform-assigned identifier; absent until the disk exists.
    pub id: Option<String>,
    /// SCSI unit the disk occupies.
    pub scsi_unit_id: u32,
    /// Disk size in gigabytes.
    pub size_gb: u32,
    /// Storage tier (for example `STANDARD`).
    pub speed: String,
}

/// A network adapter attached to a server.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VirtualMachineNetworkAdapter {
    /// Platform-assigned identifier; absent until the adapter exists.
    pub id: Option<String>,
    /// VLAN the adapter is attached to.
    pub vlan_id: Option<String>,
    /// Private IPv4 address.
    pub private_ipv4: Option<String>,
    /// Private IPv6 address (always platform-assigned).
    pub private_ipv6: Option<String>,
    /// Adapter type (`E1000` or `VMXNET3`).
    pub adapter_type: Option<String>,
}

/// Network configuration of a server.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VirtualMachineNetwork {
    /// Network domain the server belongs to.
    pub network_domain_id: String,
    /// The adapter created with the server; it cannot be removed.
    pub primary_adapter: VirtualMachineNetworkAdapter,
    /// Adapters added after (or alongside) the primary one.
    pub additional_adapters: Vec<VirtualMachineNetworkAdapter>,
}

/// A deployed server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Server {
    /// Server identifier.
    pub id: String,
    /// Server name.
    pub name: String,
    /// Server description.
    pub description: String,
    /// Datacenter hosting the server.
    pub datacenter_id: String,
    /// Memory in gigabytes.
    pub memory_gb: u32,
    /// CPU allocation.
    pub cpu: VirtualMachineCpu,
    /// Attached disks.
    pub disks: Vec<VirtualMachineDisk>,
    /// Network configuration.
    pub network: VirtualMachineNetwork,
    /// Whether the server is powered on.
    pub started: bool,
    /// Provisioning state.
    pub state: ResourceState,
}

/// Whether an image is supplied by the platform or by the customer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageKind {
    /// Built-in OS image.
    Os,
    /// Customer-provided image.
    Customer,
}

impl ImageKind {
    /// Name used in configuration and log messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Os => "os",
            Self::Customer => "customer",
        }
    }
}

/// Operating system installed on an image.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OperatingSystem {
    /// OS identifier (for example `WIN2012R2DC64` or `UBUNTU1464`).
    pub id: String,
    /// OS family (`WINDOWS` or `UNIX`).
    pub family: String,
}

/// An image servers can be deployed from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Image {
    /// Image identifier.
    pub id: String,
    /// Image name.
    pub name: String,
    /// OS or customer image.
    pub kind: ImageKind,
    /// Datacenter the image lives in.
    pub datacenter_id: String,
    /// Installed operating system.
    pub os: OperatingSystem,
    /// Default CPU allocation.
    pub cpu: VirtualMachineCpu,
    /// Default memory in gigabytes.
    pub memory_gb: u32,
    /// Disk layout deployed with the image.
    pub disks: Vec<VirtualMachineDisk>,
}

impl Image {
    /// Copies the image's identifier and defaults into a deployment.
    pub fn apply_to(&self, deployment: &mut ServerDeploymentConfiguration) {
        deployment.image_id.clone_from(&self.id);
        deployment.cpu = self.cpu.clone();
        deployment.memory_gb = self.memory_gb;
        deployment.disks = self.disks.clone();
    }
}

/// Everything needed to deploy a new server.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct ServerDeploymentConfiguration {
    /// Server name.
    pub name: String,
    /// Server description.
    pub description: String,
    /// Initial administrator password (may be empty for some images).
    pub administrator_password: String,
    /// Image to deploy from.
    pub image_id: String,
    /// Memory in gigabytes.
    pub memory_gb: u32,
    /// CPU allocation.
    pub cpu: VirtualMachineCpu,
    /// Disk layout.
    pub disks: Vec<VirtualMachineDisk>,
    /// Network configuration.
    pub network: VirtualMachineNetwork,
    /// Primary DNS server address.
    pub primary_dns: String,
    /// Secondary DNS server address.
    pub secondary_dns: String,
    /// Whether to power the server on once deployed.
    pub start: bool,
}

impl fmt::Debug for ServerDeploymentConfiguration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServerDeploymentConfiguration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("administrator_password", &"<redacted>")
            .field("image_id", &self.image_id)
            .field("memory_gb", &self.memory_gb)
            .field("cpu", &self.cpu)
            .field("disks", &self.disks)
            .field("network", &self.network)
            .field("primary_dns", &self.primary_dns)
            .field("secondary_dns", &self.secondary_dns)
            .field("start", &self.start)
            .finish()
    }
}

/// Memory/CPU changes for an existing server; `None` leaves a value as is.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ServerReconfiguration {
    /// New memory size in gigabytes.
    pub memory_gb: Option<u32>,
    /// New CPU count.
    pub cpu_count: Option<u32>,
    /// New cores per socket.
    pub cores_per_socket: Option<u32>,
    /// New CPU speed class.
    pub cpu_speed: Option<String>,
}

impl ServerReconfiguration {
    /// Returns `true` when nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.memory_gb.is_none()
            && self.cpu_count.is_none()
            && self.cores_per_socket.is_none()
            && self.cpu_speed.is_none()
    }

    /// Returns `true` when the CPU allocation would change.
    #[must_use]
    pub const fn changes_cpu(&self) -> bool {
        self.cpu_count.is_some() || self.cores_per_socket.is_some() || self.cpu_speed.is_some()
    }
}

/// A network domain (the container for VLANs, firewall and NAT rules).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NetworkDomain {
    /// Network domain identifier.
    pub id: String,
    /// Network domain name.
    pub name: String,
    /// Datacenter hosting the network domain.
    pub datacenter_id: String,
}

/// A NAT rule mapping a public address to a private one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NatRule {
    /// Rule identifier.
    pub id: String,
    /// Private (internal) IPv4 address.
    pub internal_ip_address: String,
    /// Public (external) IPv4 address.
    pub external_ip_address: String,
}

/// Paging parameters for list operations; page numbers start at 1.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Paging {
    /// Page to request.
    pub page_number: u32,
    /// Maximum entries per page.
    pub page_size: u32,
}

impl Paging {
    /// Default page size used by the platform.
    pub const DEFAULT_PAGE_SIZE: u32 = 50;

    /// Advances to the next page.
    pub const fn next(&mut self) {
        self.page_number = self.page_number.saturating_add(1);
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of NAT rules.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NatRulePage {
    /// Rules on this page.
    pub rules: Vec<NatRule>,
    /// Page number that was returned.
    pub page_number: u32,
    /// Page size that was applied.
    pub page_size: u32,
}

impl NatRulePage {
    /// Returns `true` once the listing is exhausted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A tag applied to a server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerTag {
    /// Tag key name.
    pub name: String,
    /// Tag value; some keys carry no value.
    pub value: Option<String>,
}

/// Cloud Backup details for a server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackupDetails {
    /// Cloud Backup asset identifier.
    pub asset_id: String,
    /// Active service plan.
    pub service_plan: String,
    /// Backup provisioning state.
    pub state: String,
}
