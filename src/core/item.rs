//! # Item References
//!
//! An item is a browser tab; a container is the window holding it.
//! Both are identified by the numeric ids the browser hands out.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ItemId(pub u64);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ContainerId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab {}", self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window {}", self.0)
    }
}

/// One tracked item and the container it was last seen in.
///
/// Equality is by `id` alone: the same tab dragged to another window is
/// still the same history entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ItemRef {
    pub id: ItemId,
    pub container: ContainerId,
}

impl ItemRef {
    pub fn new(id: u64, container: u64) -> Self {
        Self {
            id: ItemId(id),
            container: ContainerId(container),
        }
    }
}

impl PartialEq for ItemRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ItemRef {}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.container)
    }
}
