//! Snapshot keys for the server resource.

/// Server name.
pub const NAME: &str = "name";
/// Server description.
pub const DESCRIPTION: &str = "description";
/// Initial administrator password.
pub const ADMIN_PASSWORD: &str = "admin_password";
/// Network domain the server is deployed into.
pub const NETWORK_DOMAIN_ID: &str = "networkdomain";
/// Memory in gigabytes.
pub const MEMORY_GB: &str = "memory_gb";
/// Number of CPUs.
pub const CPU_COUNT: &str = "cpu_count";
/// Cores per CPU.
pub const CPU_CORE_COUNT: &str = "cores_per_cpu";
/// CPU speed class.
pub const CPU_SPEED: &str = "cpu_speed";
/// Disk list.
pub const DISK: &str = "disk";
/// Network adapter list; the first entry is the primary adapter.
pub const NETWORK_ADAPTER: &str = "network_adapter";
/// VLAN of the primary adapter (computed).
pub const PRIMARY_ADAPTER_VLAN: &str = "primary_adapter_vlan";
/// IPv4 address of the primary adapter (computed).
pub const PRIMARY_ADAPTER_IPV4: &str = "primary_adapter_ipv4";
/// IPv6 address of the primary adapter (computed).
pub const PRIMARY_ADAPTER_IPV6: &str = "primary_adapter_ipv6";
/// Public IPv4 address mapped by NAT, if any (computed).
pub const PUBLIC_IPV4: &str = "public_ipv4";
/// Primary DNS server.
pub const PRIMARY_DNS: &str = "dns_primary";
/// Secondary DNS server.
pub const SECONDARY_DNS: &str = "dns_secondary";
/// Image selector block.
pub const IMAGE: &str = "image";
/// Power the server on after deployment.
pub const AUTO_START: &str = "auto_start";
/// Tag list.
pub const TAG: &str = "tag";
