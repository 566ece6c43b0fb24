//! # Host Adapter
//!
//! Everything the engine needs from the browser it runs inside of.
//! The engine only talks to the [`Browser`] trait and consumes [`HostEvent`]s;
//! a real extension host or the bundled [`sim::SimulatedBrowser`] provide them.

pub mod script;
pub mod sim;

use std::fmt;

use async_trait::async_trait;

use crate::core::item::{ContainerId, ItemId, ItemRef};

#[derive(Debug)]
pub enum BrowserError {
    /// The item or container was destroyed before the request landed.
    Gone(String),
    /// The browser couldn't be reached.
    Unavailable(String),
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserError::Gone(msg) => write!(f, "no longer exists: {msg}"),
            BrowserError::Unavailable(msg) => write!(f, "browser unavailable: {msg}"),
        }
    }
}

impl std::error::Error for BrowserError {}

#[async_trait]
pub trait Browser: Send + Sync {
    /// Liveness check: the item's current container, or `None` if it's gone.
    async fn lookup(&self, id: ItemId) -> Result<Option<ContainerId>, BrowserError>;

    /// Whether any of the browser's containers has OS focus right now.
    async fn any_container_focused(&self) -> Result<bool, BrowserError>;

    /// The active item in `container`, if the container exists and has one.
    async fn active_item(&self, container: ContainerId) -> Result<Option<ItemId>, BrowserError>;

    async fn focus_container(&self, container: ContainerId) -> Result<(), BrowserError>;

    async fn activate_item(&self, id: ItemId) -> Result<(), BrowserError>;
}

/// Notifications delivered by the host, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// An item became the active one in its container.
    Activated(ItemRef),
    /// Container focus moved; `None` means focus left the browser.
    ContainerFocused(Option<ContainerId>),
    /// An item was permanently closed.
    Removed(ItemId),
    /// A named keyboard command fired.
    Command(String),
    /// No more events will arrive.
    Shutdown,
}
