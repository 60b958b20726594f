//! Collection deltas.
//!
//! [`compute_delta`] partitions two versions of a collection into added,
//! removed and modified elements by id. [`plan_positional`] complements it
//! with the ordering work a view has to do once removals are applied: which
//! surviving children move, and where new children go.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::Identified;
use crate::types::DbId;

/// The status of an item in a diff comparison.
///
/// - `Added`     -- present only in the new collection.
/// - `Removed`   -- present only in the old collection.
/// - `Changed`   -- present in both with different field values.
/// - `Unchanged` -- present in both with identical field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
    Unchanged,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// Added / removed / modified partition between two collection versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta<T> {
    /// New elements whose id does not occur in the old collection.
    pub added: Vec<T>,
    /// Old elements whose id does not occur in the new collection.
    pub removed: Vec<T>,
    /// One element per id present on both sides, in new-collection order.
    ///
    /// Equal elements are not filtered out; applying an unchanged element is
    /// expected to be a no-op downstream.
    pub modified: Vec<T>,
}

impl<T> Delta<T> {
    /// True when nothing was added or removed and no id is shared.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Partition `old` and `new` by id.
///
/// `modified` is collected by scanning `new` first and then `old`, keeping
/// each shared id once. Every shared id therefore contributes its `new`
/// copy, in `new`'s order.
pub fn compute_delta<T: Identified + Clone>(old: &[T], new: &[T]) -> Delta<T> {
    let old_ids: HashSet<DbId> = old.iter().map(Identified::id).collect();
    let new_ids: HashSet<DbId> = new.iter().map(Identified::id).collect();

    let added = new
        .iter()
        .filter(|item| !old_ids.contains(&item.id()))
        .cloned()
        .collect();
    let removed = old
        .iter()
        .filter(|item| !new_ids.contains(&item.id()))
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let modified = new
        .iter()
        .chain(old.iter())
        .filter(|item| old_ids.contains(&item.id()) && new_ids.contains(&item.id()))
        .filter(|item| seen.insert(item.id()))
        .cloned()
        .collect();

    Delta {
        added,
        removed,
        modified,
    }
}

/// Per-id status, new-collection order first, then removed ids in old order.
pub fn classify<T: Identified + PartialEq>(old: &[T], new: &[T]) -> Vec<(DbId, DiffStatus)> {
    let mut statuses: Vec<(DbId, DiffStatus)> = new
        .iter()
        .map(|item| {
            let status = match old.iter().find(|o| o.id() == item.id()) {
                None => DiffStatus::Added,
                Some(previous) if previous == item => DiffStatus::Unchanged,
                Some(_) => DiffStatus::Changed,
            };
            (item.id(), status)
        })
        .collect();

    statuses.extend(
        old.iter()
            .filter(|o| !new.iter().any(|n| n.id() == o.id()))
            .map(|o| (o.id(), DiffStatus::Removed)),
    );
    statuses
}

// ---------------------------------------------------------------------------
// Positional plan
// ---------------------------------------------------------------------------

/// One step of the position-aware walk.
///
/// Indices refer to the child sequence as it stands when the step is
/// applied, starting from the old sequence with removed ids dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionalOp {
    /// Same id and equal fields at this index.
    Keep { index: usize, id: DbId },
    /// Same id at this index, fields differ.
    Patch { index: usize, id: DbId },
    /// A later child with this id moves up to `to`.
    Move {
        from: usize,
        to: usize,
        id: DbId,
        changed: bool,
    },
    /// A child that did not exist before goes to `index`.
    Insert { index: usize, id: DbId },
}

impl PositionalOp {
    pub fn id(&self) -> DbId {
        match *self {
            Self::Keep { id, .. }
            | Self::Patch { id, .. }
            | Self::Move { id, .. }
            | Self::Insert { id, .. } => id,
        }
    }

    /// Apply the ordering effect of this step to a child-id sequence.
    pub fn apply_to(&self, ids: &mut Vec<DbId>) {
        match *self {
            Self::Keep { .. } | Self::Patch { .. } => {}
            Self::Move { from, to, .. } => {
                let id = ids.remove(from);
                ids.insert(to, id);
            }
            Self::Insert { index, id } => ids.insert(index.min(ids.len()), id),
        }
    }
}

/// Walk `old` and `new` in parallel and describe how to turn the surviving
/// old children into `new`'s order.
///
/// Removed ids are assumed to be gone already. At each index: matching id
/// and fields keep, matching id only patches, otherwise the id is searched
/// further down the old sequence and moved up, or inserted fresh when it is
/// not there. New elements past the end of the old sequence are inserted at
/// the tail.
pub fn plan_positional<T: Identified + PartialEq>(old: &[T], new: &[T]) -> Vec<PositionalOp> {
    let new_ids: HashSet<DbId> = new.iter().map(Identified::id).collect();
    let mut current: Vec<&T> = old
        .iter()
        .filter(|item| new_ids.contains(&item.id()))
        .collect();
    let mut ops = Vec::with_capacity(new.len());

    for (index, item) in new.iter().enumerate() {
        let id = item.id();
        match current.get(index) {
            Some(&existing) if existing.id() == id => {
                if existing == item {
                    ops.push(PositionalOp::Keep { index, id });
                } else {
                    ops.push(PositionalOp::Patch { index, id });
                }
            }
            _ => {
                let found = current
                    .iter()
                    .enumerate()
                    .skip(index)
                    .find(|(_, candidate)| candidate.id() == id)
                    .map(|(from, _)| from);
                match found {
                    Some(from) => {
                        let moved = current.remove(from);
                        let changed = moved != item;
                        current.insert(index, moved);
                        ops.push(PositionalOp::Move {
                            from,
                            to: index,
                            id,
                            changed,
                        });
                    }
                    None => {
                        current.insert(index.min(current.len()), item);
                        ops.push(PositionalOp::Insert { index, id });
                    }
                }
            }
        }
    }
    ops
}
