//! Diff engine for sub-resource collections.
//!
//! Disks, network adapters, and tags are reconciled the same way: desired
//! items are matched against actual items, first by remote identifier and
//! then by slot key, and every item ends up in exactly one of no-op, add,
//! modify, or remove. Callers apply the resulting [`Changes`] in the order
//! remove, modify, add.

use std::fmt::Debug;

use tracing::debug;

/// A sub-resource that can be reconciled against its remote counterpart.
pub trait SubResource: Clone + Debug {
    /// Caller-assigned key used to match items that have no remote
    /// identifier yet.
    type Key: Debug + PartialEq;

    /// Remote identifier, once the platform has assigned one.
    fn remote_id(&self) -> Option<&str>;

    /// Slot key (SCSI unit, VLAN, tag name), if the item has one.
    fn slot_key(&self) -> Option<Self::Key>;

    /// Reports whether this (desired) item claims the slot `actual` occupies.
    fn occupies_slot_of(&self, actual: &Self) -> bool {
        self.slot_key()
            .is_some_and(|key| actual.slot_key().as_ref() == Some(&key))
    }

    /// Reports whether any mutable attribute differs from `actual`.
    fn differs_from(&self, actual: &Self) -> bool;

    /// Returns a copy addressed at `id`.
    #[must_use]
    fn with_remote_id(self, id: Option<String>) -> Self;
}

/// Action attached to a sub-resource during diffing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReconciliationAction {
    /// Desired and actual state already agree.
    None,
    /// The item must be created.
    Create,
    /// The item exists and must be changed.
    Update,
    /// The item exists but is no longer desired.
    Delete,
}

/// One item of a reconciliation plan.
///
/// For [`ReconciliationAction::Update`] and [`ReconciliationAction::None`]
/// the item carries the desired attributes addressed at the matched remote
/// identifier; for [`ReconciliationAction::Delete`] it is the actual item.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedChange<T> {
    /// What must happen to the item.
    pub action: ReconciliationAction,
    /// The item to act on.
    pub item: T,
}

/// Partitioned output of [`split_by_action`].
#[derive(Clone, Debug, PartialEq)]
pub struct Changes<T> {
    /// Items to create.
    pub to_add: Vec<T>,
    /// Items to modify, addressed by remote identifier.
    pub to_modify: Vec<T>,
    /// Items to remove.
    pub to_remove: Vec<T>,
}

impl<T> Default for Changes<T> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_modify: Vec::new(),
            to_remove: Vec::new(),
        }
    }
}

impl<T> Changes<T> {
    /// Reports whether nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_modify.is_empty() && self.to_remove.is_empty()
    }
}

/// Matches `desired` against `actual` and attaches an action to every item.
///
/// Remote identifiers are authoritative. Slot keys are consulted only for
/// desired items whose identifier is unknown or no longer present remotely,
/// and only against actual items not already claimed by identifier.
#[must_use]
pub fn plan<T: SubResource>(desired: &[T], actual: &[T]) -> Vec<PlannedChange<T>> {
    let mut claimed = vec![false; actual.len()];
    let mut matched: Vec<Option<usize>> = vec![None; desired.len()];

    for (slot, wanted) in matched.iter_mut().zip(desired) {
        let Some(id) = wanted.remote_id() else {
            continue;
        };
        if let Some(index) = find_unclaimed(actual, &claimed, |item| item.remote_id() == Some(id)) {
            mark(&mut claimed, index);
            *slot = Some(index);
        }
    }

    for (slot, wanted) in matched.iter_mut().zip(desired) {
        if slot.is_some() {
            continue;
        }
        if let Some(index) = find_unclaimed(actual, &claimed, |item| wanted.occupies_slot_of(item)) {
            mark(&mut claimed, index);
            *slot = Some(index);
        }
    }

    let mut planned = Vec::with_capacity(desired.len() + actual.len());
    for (wanted, slot) in desired.iter().zip(&matched) {
        let change = match slot.and_then(|index| actual.get(index)) {
            Some(existing) => {
                let action = if wanted.differs_from(existing) {
                    ReconciliationAction::Update
                } else {
                    ReconciliationAction::None
                };
                let id = existing.remote_id().map(str::to_owned);
                PlannedChange {
                    action,
                    item: wanted.clone().with_remote_id(id),
                }
            }
            None => PlannedChange {
                action: ReconciliationAction::Create,
                item: wanted.clone().with_remote_id(None),
            },
        };
        planned.push(change);
    }

    planned.extend(
        actual
            .iter()
            .zip(&claimed)
            .filter(|(_, taken)| !**taken)
            .map(|(item, _)| PlannedChange {
                action: ReconciliationAction::Delete,
                item: item.clone(),
            }),
    );

    debug!(
        desired = desired.len(),
        actual = actual.len(),
        planned = planned.len(),
        "computed reconciliation plan"
    );
    planned
}

/// Computes the add, modify, and remove sets that converge `actual` to
/// `desired`. No-op items are dropped.
#[must_use]
pub fn split_by_action<T: SubResource>(desired: &[T], actual: &[T]) -> Changes<T> {
    let mut changes = Changes::default();
    for change in plan(desired, actual) {
        match change.action {
            ReconciliationAction::None => {}
            ReconciliationAction::Create => changes.to_add.push(change.item),
            ReconciliationAction::Update => changes.to_modify.push(change.item),
            ReconciliationAction::Delete => changes.to_remove.push(change.item),
        }
    }
    changes
}

fn find_unclaimed<T>(actual: &[T], claimed: &[bool], predicate: impl Fn(&T) -> bool) -> Option<usize> {
    actual
        .iter()
        .zip(claimed)
        .position(|(item, taken)| !*taken && predicate(item))
}

fn mark(claimed: &mut [bool], index: usize) {
    if let Some(flag) = claimed.get_mut(index) {
        *flag = true;
    }
}

#[cfg(test)]
mod tests;
