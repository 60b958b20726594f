//! Board value trees.
//!
//! Entities are plain owned values. `Clone` is the deep copy every mutation
//! path starts from: take a clone, mutate it, hand it to the server, then
//! reconcile the server's canonical copy back into the views. Two values are
//! equal when every field is equal; two values are the *same entity* when
//! their ids match (see [`Identified`]).

mod board;
mod color;
mod subtask;
mod tag;
mod task;
mod task_list;

pub use board::Board;
pub use color::ColorEntity;
pub use subtask::SubTask;
pub use tag::Tag;
pub use task::Task;
pub use task_list::TaskList;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// An entity with a stable numeric identity.
pub trait Identified {
    fn id(&self) -> DbId;
}

/// Where to insert an element relative to an anchor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Before,
    After,
}

/// Replace the element with the same id as `item`, or append it.
///
/// Returns `true` when an existing element was replaced.
pub fn upsert_by_id<T: Identified>(items: &mut Vec<T>, item: T) -> bool {
    match items.iter().position(|existing| existing.id() == item.id()) {
        Some(index) => {
            items[index] = item;
            true
        }
        None => {
            items.push(item);
            false
        }
    }
}

/// Remove and return the element with the given id.
pub fn remove_by_id<T: Identified>(items: &mut Vec<T>, id: DbId) -> Option<T> {
    let index = items.iter().position(|item| item.id() == id)?;
    Some(items.remove(index))
}

/// Insert `item` next to the element identified by `anchor`.
///
/// Any element already carrying `item`'s id is removed first so the result
/// never holds duplicates. Returns `false` (and leaves `items` untouched)
/// when the anchor is missing.
pub fn insert_relative<T: Identified>(
    items: &mut Vec<T>,
    item: T,
    anchor: DbId,
    placement: Placement,
) -> bool {
    if !items.iter().any(|existing| existing.id() == anchor) {
        return false;
    }
    items.retain(|existing| existing.id() != item.id());
    let Some(anchor_index) = items.iter().position(|existing| existing.id() == anchor) else {
        // The anchor was the item itself.
        items.push(item);
        return true;
    };
    let index = match placement {
        Placement::Before => anchor_index,
        Placement::After => anchor_index + 1,
    };
    items.insert(index, item);
    true
}
