//! # Simulated Browser
//!
//! An in-memory browser: windows holding tabs, one active tab per window,
//! at most one focused window. User actions (`open`, `activate`, `close`, ...)
//! and actuator calls from the engine both change it, and both report what
//! happened as [`HostEvent`]s, the way a real browser fires its listeners
//! regardless of who caused the change.
//!
//! ```text
//! SimState
//! ├── windows: BTreeMap<ContainerId, Window>
//! │   └── Window { tabs: Vec<ItemId>, active: Option<ItemId> }
//! ├── focused: Option<ContainerId>
//! └── actuations: Vec<Actuation>     // what the engine asked for
//! ```

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use log::debug;
use tokio::sync::mpsc::UnboundedSender;

use super::{Browser, BrowserError, HostEvent};
use crate::core::item::{ContainerId, ItemId, ItemRef};

/// A request the engine made through the actuator half of [`Browser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    FocusContainer(ContainerId),
    ActivateItem(ItemId),
}

#[derive(Debug, Default)]
struct Window {
    tabs: Vec<ItemId>,
    active: Option<ItemId>,
}

#[derive(Debug, Default)]
struct SimState {
    windows: BTreeMap<ContainerId, Window>,
    focused: Option<ContainerId>,
    actuations: Vec<Actuation>,
}

impl SimState {
    fn container_of(&self, id: ItemId) -> Option<ContainerId> {
        self.windows
            .iter()
            .find(|(_, window)| window.tabs.contains(&id))
            .map(|(container, _)| *container)
    }
}

#[derive(Default)]
pub struct SimulatedBrowser {
    state: Mutex<SimState>,
    events: Option<UnboundedSender<HostEvent>>,
}

impl SimulatedBrowser {
    /// A browser that reports nothing; handy when only the engine's view matters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A browser that reports every change on `events`.
    pub fn with_events(events: UnboundedSender<HostEvent>) -> Self {
        Self {
            state: Mutex::default(),
            events: Some(events),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: HostEvent) {
        if let Some(ref events) = self.events {
            debug!("sim: {:?}", event);
            let _ = events.send(event);
        }
    }

    /// Opens a tab in the background of `item.container`, creating the window
    /// if needed. The first tab of a window becomes its active tab.
    pub fn open(&self, item: ItemRef) {
        let mut state = self.state();
        if let Some(old) = state.container_of(item.id)
            && let Some(window) = state.windows.get_mut(&old)
        {
            window.tabs.retain(|tab| *tab != item.id);
            if window.active == Some(item.id) {
                window.active = window.tabs.first().copied();
            }
        }
        let window = state.windows.entry(item.container).or_default();
        window.tabs.push(item.id);
        if window.active.is_none() {
            window.active = Some(item.id);
        }
    }

    /// The user clicks a tab: its window takes focus, then the tab activates.
    pub fn activate(&self, item: ItemRef) {
        if self.state().container_of(item.id) != Some(item.container) {
            self.open(item);
        }
        self.focus(item.container);
        self.state()
            .windows
            .entry(item.container)
            .or_default()
            .active = Some(item.id);
        self.emit(HostEvent::Activated(item));
    }

    /// The user focuses a window without touching its tabs.
    pub fn focus(&self, container: ContainerId) {
        let changed = {
            let mut state = self.state();
            state.windows.entry(container).or_default();
            let changed = state.focused != Some(container);
            state.focused = Some(container);
            changed
        };
        if changed {
            self.emit(HostEvent::ContainerFocused(Some(container)));
        }
    }

    /// Focus leaves the browser entirely.
    pub fn blur(&self) {
        let changed = self.state().focused.take().is_some();
        if changed {
            self.emit(HostEvent::ContainerFocused(None));
        }
    }

    /// The user closes a tab. The window picks a neighbor as its new active tab.
    pub fn close(&self, id: ItemId) {
        let successor = self.remove_tab(id);
        self.emit(HostEvent::Removed(id));
        if let Some(next) = successor {
            self.emit(HostEvent::Activated(next));
        }
    }

    /// The tab disappears without the browser reporting it.
    pub fn vanish(&self, id: ItemId) {
        self.remove_tab(id);
    }

    /// Removes `id`, returning the tab that took over as active in a focused window.
    fn remove_tab(&self, id: ItemId) -> Option<ItemRef> {
        let mut state = self.state();
        let container = state.container_of(id)?;
        let focused = state.focused == Some(container);
        let window = state.windows.get_mut(&container)?;
        let position = window.tabs.iter().position(|tab| *tab == id)?;
        window.tabs.remove(position);
        if window.active != Some(id) {
            return None;
        }
        let next = window
            .tabs
            .get(position)
            .or_else(|| window.tabs.last())
            .copied();
        window.active = next;
        if focused {
            next.map(|next| ItemRef { id: next, container })
        } else {
            None
        }
    }

    pub fn actuations(&self) -> Vec<Actuation> {
        self.state().actuations.clone()
    }

    /// The active tab of the focused window: what the user is looking at.
    pub fn current(&self) -> Option<ItemRef> {
        let state = self.state();
        let container = state.focused?;
        let id = state.windows.get(&container)?.active?;
        Some(ItemRef { id, container })
    }
}

#[async_trait]
impl Browser for SimulatedBrowser {
    async fn lookup(&self, id: ItemId) -> Result<Option<ContainerId>, BrowserError> {
        Ok(self.state().container_of(id))
    }

    async fn any_container_focused(&self) -> Result<bool, BrowserError> {
        Ok(self.state().focused.is_some())
    }

    async fn active_item(&self, container: ContainerId) -> Result<Option<ItemId>, BrowserError> {
        Ok(self
            .state()
            .windows
            .get(&container)
            .and_then(|window| window.active))
    }

    async fn focus_container(&self, container: ContainerId) -> Result<(), BrowserError> {
        {
            let mut state = self.state();
            if !state.windows.contains_key(&container) {
                return Err(BrowserError::Gone(container.to_string()));
            }
            state.actuations.push(Actuation::FocusContainer(container));
        }
        self.focus(container);
        Ok(())
    }

    async fn activate_item(&self, id: ItemId) -> Result<(), BrowserError> {
        let container = {
            let mut state = self.state();
            let container = state
                .container_of(id)
                .ok_or_else(|| BrowserError::Gone(id.to_string()))?;
            state.actuations.push(Actuation::ActivateItem(id));
            if let Some(window) = state.windows.get_mut(&container) {
                window.active = Some(id);
            }
            container
        };
        self.emit(HostEvent::Activated(ItemRef { id, container }));
        Ok(())
    }
}
