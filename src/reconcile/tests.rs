//! Unit tests for the diff engine.

use rstest::rstest;

use super::*;
use crate::models::{Disk, NetworkAdapter, Tag};

#[derive(Clone, Debug, PartialEq)]
struct Slot {
    id: Option<&'static str>,
    key: u32,
    size: u32,
}

const fn slot(id: Option<&'static str>, key: u32, size: u32) -> Slot {
    Slot { id, key, size }
}

impl SubResource for Slot {
    type Key = u32;

    fn remote_id(&self) -> Option<&str> {
        self.id
    }

    fn slot_key(&self) -> Option<u32> {
        Some(self.key)
    }

    fn differs_from(&self, actual: &Self) -> bool {
        self.key != actual.key || self.size != actual.size
    }

    fn with_remote_id(self, id: Option<String>) -> Self {
        let id = id.map(|value| &*Box::leak(value.into_boxed_str()));
        Self { id, ..self }
    }
}

fn disk_with_id(id: &str, scsi_unit_id: u32, size_gb: u32) -> Disk {
    Disk {
        id: Some(id.to_owned()),
        ..Disk::new(scsi_unit_id, size_gb, "STANDARD")
    }
}

#[test]
fn new_disk_is_added_and_existing_disk_untouched() {
    let desired = vec![Disk::new(0, 50, "STANDARD"), Disk::new(1, 100, "STANDARD")];
    let actual = vec![disk_with_id("d1", 0, 50)];

    let changes = split_by_action(&desired, &actual);

    assert_eq!(changes.to_add, vec![Disk::new(1, 100, "STANDARD")]);
    assert!(changes.to_modify.is_empty());
    assert!(changes.to_remove.is_empty());
}

#[test]
fn identifier_match_wins_over_slot_change() {
    let desired = vec![slot(Some("A1"), 7, 10)];
    let actual = vec![slot(Some("A1"), 5, 10)];

    let changes = split_by_action(&desired, &actual);

    assert_eq!(changes.to_modify, vec![slot(Some("A1"), 7, 10)]);
    assert!(changes.to_add.is_empty());
    assert!(changes.to_remove.is_empty());
}

#[test]
fn identifier_match_ignores_reused_slot() {
    // A2 took over slot 5 after A1 moved; neither should be re-slotted by key.
    let desired = vec![slot(Some("A1"), 7, 10), slot(None, 5, 20)];
    let actual = vec![slot(Some("A2"), 5, 20), slot(Some("A1"), 7, 10)];

    let planned = plan(&desired, &actual);

    assert_eq!(
        planned,
        vec![
            PlannedChange {
                action: ReconciliationAction::None,
                item: slot(Some("A1"), 7, 10),
            },
            PlannedChange {
                action: ReconciliationAction::None,
                item: slot(Some("A2"), 5, 20),
            },
        ]
    );
}

#[test]
fn modified_item_is_addressed_by_actual_identifier() {
    let desired = vec![Disk::new(0, 80, "STANDARD")];
    let actual = vec![disk_with_id("d1", 0, 50)];

    let changes = split_by_action(&desired, &actual);

    assert_eq!(changes.to_modify, vec![disk_with_id("d1", 0, 80)]);
}

#[test]
fn stale_identifier_falls_back_to_slot() {
    let desired = vec![disk_with_id("gone", 0, 50)];
    let actual = vec![disk_with_id("d9", 0, 50)];

    let planned = plan(&desired, &actual);

    assert_eq!(
        planned,
        vec![PlannedChange {
            action: ReconciliationAction::None,
            item: disk_with_id("d9", 0, 50),
        }]
    );
}

#[test]
fn unmatched_actual_items_are_removed() {
    let desired = vec![Tag {
        name: String::from("role"),
        value: Some(String::from("db")),
    }];
    let actual = vec![
        Tag {
            name: String::from("role"),
            value: Some(String::from("web")),
        },
        Tag {
            name: String::from("owner"),
            value: None,
        },
    ];

    let changes = split_by_action(&desired, &actual);

    assert_eq!(changes.to_modify.len(), 1);
    assert_eq!(
        changes.to_remove,
        vec![Tag {
            name: String::from("owner"),
            value: None,
        }]
    );
}

#[test]
fn adapters_already_present_are_not_added_twice() {
    // Fresh state after the removal pass already holds the wanted VLAN.
    let desired = vec![NetworkAdapter {
        vlan_id: Some(String::from("vlan-b")),
        ..NetworkAdapter::default()
    }];
    let actual = vec![NetworkAdapter {
        id: Some(String::from("n2")),
        vlan_id: Some(String::from("vlan-b")),
        private_ipv4: Some(String::from("10.0.1.5")),
        ..NetworkAdapter::default()
    }];

    let changes = split_by_action(&desired, &actual);

    assert!(changes.is_empty());
}

fn cases() -> Vec<(Vec<Slot>, Vec<Slot>)> {
    vec![
        (vec![], vec![]),
        (vec![slot(None, 0, 1)], vec![]),
        (vec![], vec![slot(Some("a"), 0, 1)]),
        (
            vec![slot(Some("a"), 0, 1), slot(None, 1, 2), slot(None, 2, 3)],
            vec![slot(Some("a"), 0, 9), slot(Some("b"), 2, 3), slot(Some("c"), 4, 4)],
        ),
        (
            vec![slot(Some("x"), 3, 1), slot(None, 4, 1)],
            vec![slot(Some("y"), 3, 1), slot(Some("z"), 5, 1)],
        ),
        (
            vec![slot(Some("a"), 7, 1), slot(None, 5, 1)],
            vec![slot(Some("a"), 5, 1), slot(Some("b"), 7, 1)],
        ),
    ]
}

#[rstest]
#[case::all(0)]
#[case::add_only(1)]
#[case::remove_only(2)]
#[case::mixed(3)]
#[case::stale_ids(4)]
#[case::swapped_slots(5)]
fn every_item_lands_in_one_set_and_desired_slots_are_unique(#[case] index: usize) {
    let (desired, actual) = cases().swap_remove(index);

    let planned = plan(&desired, &actual);
    let changes = split_by_action(&desired, &actual);

    let desired_side = planned
        .iter()
        .filter(|change| change.action != ReconciliationAction::Delete)
        .count();
    assert_eq!(desired_side, desired.len());
    let claimed_actual = planned
        .iter()
        .filter(|change| change.item.remote_id().is_some())
        .filter(|change| change.action != ReconciliationAction::Create)
        .count();
    assert_eq!(claimed_actual, actual.len());

    let mut keys: Vec<u32> = changes
        .to_add
        .iter()
        .chain(&changes.to_modify)
        .map(|item| item.key)
        .collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), changes.to_add.len() + changes.to_modify.len());

    // A modify may move an item onto the slot of an item being removed:
    // the identifier match wins, and removals are applied first. Only
    // additions must never reuse a removed slot.
    for added in &changes.to_add {
        assert!(
            changes.to_remove.iter().all(|removed| removed.key != added.key),
            "slot {} is both removed and added",
            added.key
        );
    }
    for removed in &changes.to_remove {
        let shared = changes
            .to_modify
            .iter()
            .filter(|modified| modified.key == removed.key)
            .count();
        assert!(shared <= 1, "slot {} claimed more than once", removed.key);
        assert!(
            changes.to_modify.iter().all(|modified| modified.id != removed.id),
            "item {:?} is both modified and removed",
            removed.id
        );
    }
}

#[rstest]
#[case::mixed(3)]
#[case::stale_ids(4)]
#[case::swapped_slots(5)]
fn applying_in_order_only_modifies_surviving_items(#[case] index: usize) {
    let (desired, actual) = cases().swap_remove(index);
    let changes = split_by_action(&desired, &actual);

    let mut remote: Vec<Slot> = actual.clone();
    remote.retain(|item| !changes.to_remove.iter().any(|removed| removed.id == item.id));
    for modified in &changes.to_modify {
        let target = remote
            .iter_mut()
            .find(|item| item.id == modified.id)
            .expect("modify must reference a surviving item");
        *target = modified.clone();
    }
    for (counter, added) in changes.to_add.iter().enumerate() {
        assert!(added.id.is_none());
        let id: &'static str = Box::leak(format!("new-{counter}").into_boxed_str());
        remote.push(Slot {
            id: Some(id),
            ..added.clone()
        });
    }

    assert!(split_by_action(&desired, &remote).is_empty());
}
