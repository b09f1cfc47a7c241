//! Server network adapters.
//!
//! The first adapter in a configured list is the server's primary adapter;
//! the rest are additional adapters. Conversions to and from
//! [`VirtualMachineNetwork`] preserve that order.

use serde_json::{Map, Value};

use super::maps::{MapReader, MapWriter};
use crate::compute::{VirtualMachineNetwork, VirtualMachineNetworkAdapter};
use crate::reconcile::SubResource;

/// Configured or observed state of one network adapter.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NetworkAdapter {
    /// Platform-assigned identifier; absent until the adapter exists.
    pub id: Option<String>,
    /// VLAN the adapter is attached to.
    pub vlan_id: Option<String>,
    /// Private IPv4 address.
    pub private_ipv4: Option<String>,
    /// Private IPv6 address; always assigned by the platform.
    pub private_ipv6: Option<String>,
    /// Adapter type (`E1000` or `VMXNET3`).
    pub adapter_type: Option<String>,
}

impl NetworkAdapter {
    /// Reads an adapter from its snapshot map.
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let reader = MapReader::new(map);
        Self {
            id: reader.string("id"),
            vlan_id: reader.string("vlan"),
            private_ipv4: reader.string("ipv4"),
            private_ipv6: reader.string("ipv6"),
            adapter_type: reader.string("type"),
        }
    }

    /// Writes the adapter as a snapshot map.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        MapWriter::new()
            .string("id", self.id.as_deref())
            .string("vlan", self.vlan_id.as_deref())
            .string("ipv4", self.private_ipv4.as_deref())
            .string("ipv6", self.private_ipv6.as_deref())
            .string("type", self.adapter_type.as_deref())
            .finish()
    }

    /// Converts an API adapter.
    #[must_use]
    pub fn from_compute(adapter: &VirtualMachineNetworkAdapter) -> Self {
        Self {
            id: adapter.id.clone(),
            vlan_id: adapter.vlan_id.clone(),
            private_ipv4: adapter.private_ipv4.clone(),
            private_ipv6: adapter.private_ipv6.clone(),
            adapter_type: adapter.adapter_type.clone(),
        }
    }

    /// Converts the adapter into its API form.
    #[must_use]
    pub fn to_compute(&self) -> VirtualMachineNetworkAdapter {
        VirtualMachineNetworkAdapter {
            id: self.id.clone(),
            vlan_id: self.vlan_id.clone(),
            private_ipv4: self.private_ipv4.clone(),
            private_ipv6: self.private_ipv6.clone(),
            adapter_type: self.adapter_type.clone(),
        }
    }

    /// Copies platform-assigned values from `actual`, keeping configured
    /// values where the configuration specifies them.
    pub fn capture(&mut self, actual: &VirtualMachineNetworkAdapter) {
        self.id.clone_from(&actual.id);
        self.private_ipv6.clone_from(&actual.private_ipv6);
        if self.vlan_id.is_none() {
            self.vlan_id.clone_from(&actual.vlan_id);
        }
        if self.private_ipv4.is_none() {
            self.private_ipv4.clone_from(&actual.private_ipv4);
        }
        if self.adapter_type.is_none() {
            self.adapter_type.clone_from(&actual.adapter_type);
        }
    }
}

fn specified_and_differs(desired: Option<&String>, actual: Option<&String>) -> bool {
    desired.is_some_and(|value| Some(value) != actual)
}

impl SubResource for NetworkAdapter {
    type Key = String;

    fn remote_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn slot_key(&self) -> Option<String> {
        self.vlan_id.clone().or_else(|| self.private_ipv4.clone())
    }

    // An adapter configured by IPv4 address alone claims whichever adapter
    // holds that address.
    fn occupies_slot_of(&self, actual: &Self) -> bool {
        match (&self.vlan_id, &self.private_ipv4) {
            (Some(vlan), _) => actual.vlan_id.as_ref() == Some(vlan),
            (None, Some(ipv4)) => actual.private_ipv4.as_ref() == Some(ipv4),
            (None, None) => false,
        }
    }

    fn differs_from(&self, actual: &Self) -> bool {
        specified_and_differs(self.vlan_id.as_ref(), actual.vlan_id.as_ref())
            || specified_and_differs(self.private_ipv4.as_ref(), actual.private_ipv4.as_ref())
            || specified_and_differs(self.adapter_type.as_ref(), actual.adapter_type.as_ref())
    }

    fn with_remote_id(self, id: Option<String>) -> Self {
        Self { id, ..self }
    }
}

/// Reads every adapter in a snapshot list.
#[must_use]
pub fn adapters_from_maps(maps: &[Map<String, Value>]) -> Vec<NetworkAdapter> {
    maps.iter().map(NetworkAdapter::from_map).collect()
}

/// Writes adapters as a snapshot list.
#[must_use]
pub fn adapters_to_maps(adapters: &[NetworkAdapter]) -> Vec<Map<String, Value>> {
    adapters.iter().map(NetworkAdapter::to_map).collect()
}

/// Lists a server's adapters, primary first.
#[must_use]
pub fn adapters_from_network(network: &VirtualMachineNetwork) -> Vec<NetworkAdapter> {
    std::iter::once(&network.primary_adapter)
        .chain(&network.additional_adapters)
        .map(NetworkAdapter::from_compute)
        .collect()
}

/// Writes configured adapters into a deployment's network: the first becomes
/// the primary adapter, the rest additional adapters.
pub fn apply_adapters_to_network(adapters: &[NetworkAdapter], network: &mut VirtualMachineNetwork) {
    let mut converted = adapters.iter().map(NetworkAdapter::to_compute);
    network.primary_adapter = converted.next().unwrap_or_default();
    network.additional_adapters = converted.collect();
}

/// Copies platform-assigned identifiers and addresses into configured
/// adapters, matching by position.
pub fn capture_adapter_ids(adapters: &mut [NetworkAdapter], network: &VirtualMachineNetwork) {
    let actual = std::iter::once(&network.primary_adapter).chain(&network.additional_adapters);
    for (adapter, observed) in adapters.iter_mut().zip(actual) {
        adapter.capture(observed);
    }
}
