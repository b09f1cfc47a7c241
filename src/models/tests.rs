//! Unit tests for the entity converters.

use rstest::rstest;
use serde_json::json;

use super::*;
use crate::compute::{
    Image, ImageKind, OperatingSystem, VirtualMachineCpu, VirtualMachineNetwork,
    VirtualMachineNetworkAdapter,
};
use crate::reconcile::SubResource;

fn map(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(inner) => inner,
        other => panic!("expected a map, got {other}"),
    }
}

fn adapter(id: &str, vlan: &str, ipv4: &str) -> VirtualMachineNetworkAdapter {
    VirtualMachineNetworkAdapter {
        id: Some(id.to_owned()),
        vlan_id: Some(vlan.to_owned()),
        private_ipv4: Some(ipv4.to_owned()),
        private_ipv6: Some(format!("2001:db8::{id}")),
        adapter_type: Some(String::from("VMXNET3")),
    }
}

#[test]
fn disk_reads_map_and_defaults_speed() {
    let disk = Disk::from_map(&map(json!({ "scsi_unit_id": 1, "size_gb": 20 })));
    assert_eq!(disk, Disk::new(1, 20, DEFAULT_DISK_SPEED));
}

#[test]
fn disk_map_keeps_identifier() {
    let disk = Disk {
        id: Some(String::from("d1")),
        ..Disk::new(0, 50, "HIGHPERFORMANCE")
    };
    let written = disk.to_map();
    assert_eq!(written.get("id"), Some(&json!("d1")));
    assert_eq!(Disk::from_map(&written), disk);
}

#[rstest]
#[case::same(Disk::new(0, 50, "STANDARD"), false)]
#[case::speed_case_insensitive(Disk::new(0, 50, "standard"), false)]
#[case::grown(Disk::new(0, 60, "STANDARD"), true)]
#[case::new_speed(Disk::new(0, 50, "ECONOMY"), true)]
fn disk_difference_covers_size_and_speed(#[case] desired: Disk, #[case] differs: bool) {
    let actual = Disk::new(0, 50, "STANDARD");
    assert_eq!(desired.differs_from(&actual), differs);
}

#[test]
fn tags_without_names_are_skipped() {
    let tags = tags_from_maps(&[
        map(json!({ "name": "role", "value": "web" })),
        map(json!({ "value": "orphan" })),
    ]);
    assert_eq!(
        tags,
        vec![Tag {
            name: String::from("role"),
            value: Some(String::from("web")),
        }]
    );
}

#[test]
fn adapters_list_primary_first() {
    let network = VirtualMachineNetwork {
        network_domain_id: String::from("nd1"),
        primary_adapter: adapter("n1", "vlan-a", "10.0.0.5"),
        additional_adapters: vec![adapter("n2", "vlan-b", "10.0.1.5")],
    };
    let adapters = adapters_from_network(&network);
    let ids: Vec<_> = adapters.iter().filter_map(|item| item.id.as_deref()).collect();
    assert_eq!(ids, ["n1", "n2"]);
}

#[test]
fn applying_adapters_splits_primary_from_additional() {
    let configured = vec![
        NetworkAdapter {
            vlan_id: Some(String::from("vlan-a")),
            ..NetworkAdapter::default()
        },
        NetworkAdapter {
            private_ipv4: Some(String::from("10.0.1.9")),
            ..NetworkAdapter::default()
        },
    ];
    let mut network = VirtualMachineNetwork::default();
    apply_adapters_to_network(&configured, &mut network);
    assert_eq!(network.primary_adapter.vlan_id.as_deref(), Some("vlan-a"));
    assert_eq!(network.additional_adapters.len(), 1);
}

#[test]
fn capture_copies_platform_values_by_position() {
    let mut configured = vec![NetworkAdapter {
        vlan_id: Some(String::from("vlan-a")),
        ..NetworkAdapter::default()
    }];
    let network = VirtualMachineNetwork {
        network_domain_id: String::from("nd1"),
        primary_adapter: adapter("n1", "vlan-a", "10.0.0.5"),
        additional_adapters: Vec::new(),
    };
    capture_adapter_ids(&mut configured, &network);
    let captured = configured.first().expect("one adapter");
    assert_eq!(captured.id.as_deref(), Some("n1"));
    assert_eq!(captured.private_ipv4.as_deref(), Some("10.0.0.5"));
}

#[test]
fn adapter_configured_by_address_claims_matching_slot() {
    let desired = NetworkAdapter {
        private_ipv4: Some(String::from("10.0.1.5")),
        ..NetworkAdapter::default()
    };
    let actual = NetworkAdapter::from_compute(&adapter("n2", "vlan-b", "10.0.1.5"));
    assert!(desired.occupies_slot_of(&actual));
    assert!(!desired.differs_from(&actual));
}

#[rstest]
#[case::id_only(Some("img-1"), None, true)]
#[case::name_only(None, Some("Ubuntu 14.04"), true)]
#[case::both(Some("img-1"), Some("Ubuntu 14.04"), false)]
#[case::neither(None, None, false)]
fn configured_image_requires_exactly_one_selector(
    #[case] id: Option<&str>,
    #[case] name: Option<&str>,
    #[case] valid: bool,
) {
    let image = ConfiguredImage {
        id: id.map(str::to_owned),
        name: name.map(str::to_owned),
        kind: ImageSelectorKind::Auto,
    };
    assert_eq!(image.validate().is_ok(), valid);
}

#[test]
fn configured_image_records_resolved_identity() {
    let mut selector = ConfiguredImage::from_map(&map(json!({ "name": "CentOS 7" })));
    let image = Image {
        id: String::from("img-7"),
        name: String::from("CentOS 7"),
        kind: ImageKind::Customer,
        datacenter_id: String::from("AU9"),
        os: OperatingSystem::default(),
        cpu: VirtualMachineCpu::default(),
        memory_gb: 4,
        disks: Vec::new(),
    };
    assert!(selector.matches(&image));
    selector.read_image(&image);
    let written = selector.to_map();
    assert_eq!(written.get("id"), Some(&json!("img-7")));
    assert_eq!(written.get("type"), Some(&json!("customer")));
}
