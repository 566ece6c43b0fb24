//! # Navigation Engine
//!
//! Owns the durable pair (recent items, current anchor) and decides which tab
//! a classified press switches to.
//!
//! ```text
//! host events ──► record_activation / record_removal ──┐
//!                                                      ├──► Store (queue + anchor)
//! presses ─────► navigate ─────────────────────────────┘
//!                   │
//!                   └──► Browser: focus_container, then activate_item
//! ```
//!
//! The engine caches nothing. Each handler loads the persisted state, mutates
//! it, and writes it back before returning; handlers take turns through an
//! async mutex so two of them never interleave between read and write.
//!
//! The anchor doubles as an idempotency token: `navigate` sets it to the tab
//! it is about to activate, so the browser's echo of that activation is a
//! no-op in `record_activation`.

use std::fmt;
use std::sync::Arc;

use log::{debug, error, info};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::core::config::ResolvedConfig;
use crate::core::item::{ContainerId, ItemId, ItemRef};
use crate::core::press::Press;
use crate::core::queue::RecencyQueue;
use crate::core::store::{Store, StoreError};
use crate::host::{Browser, BrowserError};

/// Maximum number of tabs to remember.
pub const CAPACITY: usize = 20;

pub const RECENT_ITEMS_KEY: &str = "recent_items";
pub const CURRENT_ITEM_KEY: &str = "current_item";

#[derive(Debug)]
pub enum EngineError {
    /// The anchor can't be found in the history. Nothing was changed.
    AnchorNotInHistory(Option<ItemId>),
    Store(StoreError),
    Browser(BrowserError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::AnchorNotInHistory(Some(id)) => {
                write!(f, "current {id} is missing from history")
            }
            EngineError::AnchorNotInHistory(None) => write!(f, "no current tab recorded"),
            EngineError::Store(e) => write!(f, "{e}"),
            EngineError::Browser(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e)
    }
}

impl From<BrowserError> for EngineError {
    fn from(e: BrowserError) -> Self {
        EngineError::Browser(e)
    }
}

/// What a `navigate` call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Switched(ItemRef),
    /// Every remembered tab is gone; nothing to switch to.
    EmptyHistory,
}

/// The persisted state, as loaded at the start of a handler.
#[derive(Debug, Clone)]
pub struct History {
    pub queue: RecencyQueue<ItemRef>,
    pub anchor: Option<ItemId>,
}

impl History {
    pub fn anchor_index(&self) -> Option<usize> {
        let anchor = self.anchor?;
        self.queue.position(|entry| entry.id == anchor)
    }

    /// Evicts the oldest entries until at most `capacity` remain, skipping
    /// over the anchor.
    fn trim(&mut self, capacity: usize) -> Vec<ItemRef> {
        let mut evicted = Vec::new();
        while self.queue.len() > capacity {
            let anchor = self.anchor;
            let Some(oldest) = self
                .queue
                .iter()
                .rev()
                .find(|entry| Some(entry.id) != anchor)
                .copied()
            else {
                break;
            };
            self.queue.remove(&oldest);
            evicted.push(oldest);
        }
        evicted
    }
}

/// Moves the stored entry for `id` (container and all) to the front.
fn promote(queue: &mut RecencyQueue<ItemRef>, id: ItemId) {
    if let Some(entry) = queue.remove_where(|entry| entry.id == id) {
        queue.add_first(entry);
    }
}

/// Drops `id` from history, clearing the anchor if it pointed there.
fn forget(history: &mut History, id: ItemId) {
    history.queue.remove_where(|entry| entry.id == id);
    if history.anchor == Some(id) {
        history.anchor = None;
    }
}

pub struct NavigationEngine {
    store: Arc<dyn Store>,
    browser: Arc<dyn Browser>,
    capacity: usize,
    turn: Mutex<()>,
}

impl NavigationEngine {
    pub fn new(store: Arc<dyn Store>, browser: Arc<dyn Browser>) -> Self {
        Self {
            store,
            browser,
            capacity: CAPACITY,
            turn: Mutex::new(()),
        }
    }

    pub fn from_config(
        store: Arc<dyn Store>,
        browser: Arc<dyn Browser>,
        config: &ResolvedConfig,
    ) -> Self {
        Self::new(store, browser).with_capacity(config.capacity)
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    async fn load(&self) -> Result<History, EngineError> {
        let items: Vec<ItemRef> = match self.store.get(RECENT_ITEMS_KEY).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| StoreError::Corrupt(format!("{RECENT_ITEMS_KEY}: {e}")))?,
            None => Vec::new(),
        };
        let anchor: Option<ItemId> = match self.store.get(CURRENT_ITEM_KEY).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| StoreError::Corrupt(format!("{CURRENT_ITEM_KEY}: {e}")))?,
            None => None,
        };
        Ok(History {
            queue: RecencyQueue::from_vec(items),
            anchor,
        })
    }

    async fn save_queue(&self, queue: &RecencyQueue<ItemRef>) -> Result<(), EngineError> {
        let value = serde_json::to_value(queue.as_slice())
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.store.set(RECENT_ITEMS_KEY, value).await?;
        Ok(())
    }

    async fn save_anchor(&self, anchor: Option<ItemId>) -> Result<(), EngineError> {
        let value = anchor.map_or(Value::Null, |id| Value::from(id.0));
        self.store.set(CURRENT_ITEM_KEY, value).await?;
        Ok(())
    }

    /// Writes queue then anchor, first trimming the queue to capacity. A
    /// state file written under a larger capacity shrinks on its first save.
    async fn save(&self, history: &mut History) -> Result<(), EngineError> {
        for evicted in history.trim(self.capacity) {
            debug!("Evicted {} from history", evicted.id);
        }
        self.save_queue(&history.queue).await?;
        self.save_anchor(history.anchor).await
    }

    /// The persisted history, without changing it.
    pub async fn snapshot(&self) -> Result<History, EngineError> {
        let _turn = self.turn.lock().await;
        self.load().await
    }

    // ------------------------------------------------------------------------
    // Host events
    // ------------------------------------------------------------------------

    /// Records that `item` became the active tab.
    ///
    /// The outgoing tab is promoted first, with the container it was stored
    /// under, so it ends up second most recent.
    pub async fn record_activation(&self, item: ItemRef) -> Result<(), EngineError> {
        let _turn = self.turn.lock().await;
        let mut history = self.load().await?;

        if history.anchor == Some(item.id) {
            debug!("Ignoring activation of current {}", item.id);
            return Ok(());
        }

        if let Some(previous) = history.anchor {
            promote(&mut history.queue, previous);
        }
        history.queue.add_first(item);
        history.anchor = Some(item.id);

        self.save(&mut history).await?;
        debug!("Recorded activation of {}", item);
        Ok(())
    }

    /// Records a container focus change. `None` means focus left the browser,
    /// which leaves the history alone.
    pub async fn record_container_focus(
        &self,
        container: Option<ContainerId>,
    ) -> Result<(), EngineError> {
        let Some(container) = container else {
            debug!("Focus left the browser");
            return Ok(());
        };
        match self.browser.active_item(container).await? {
            Some(id) => self.record_activation(ItemRef { id, container }).await,
            None => {
                debug!("{} has no active tab", container);
                Ok(())
            }
        }
    }

    /// Forgets a closed tab, clearing the anchor if it pointed at it.
    pub async fn record_removal(&self, id: ItemId) -> Result<(), EngineError> {
        let _turn = self.turn.lock().await;
        let mut history = self.load().await?;

        let removed = history.queue.remove_where(|entry| entry.id == id).is_some();
        let was_anchor = history.anchor == Some(id);
        if was_anchor {
            history.anchor = None;
        }
        if !removed && !was_anchor {
            return Ok(());
        }

        self.save(&mut history).await?;
        debug!("Removed {} from history", id);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Switches tabs in response to a classified press.
    ///
    /// - Focus outside the browser: return to the current tab.
    /// - Double press, or the current tab is the most recent: step one deeper.
    /// - Otherwise: jump to the most recent tab and commit the reorder.
    ///
    /// A target that no longer exists is dropped from history and the decision
    /// is made again. That includes a target that passed the liveness check
    /// but was gone by the time the browser was asked to show it. Each retry
    /// shrinks the history by one entry.
    pub async fn navigate(&self, press: Press) -> Result<Navigation, EngineError> {
        let _turn = self.turn.lock().await;
        let mut history = self.load().await?;

        loop {
            if history.queue.is_empty() {
                debug!("No history to switch to");
                return Ok(Navigation::EmptyHistory);
            }

            let Some(current) = history.anchor_index() else {
                error!(
                    "Current tab {:?} is not in history {:?}; not switching",
                    history.anchor, history.queue
                );
                return Err(EngineError::AnchorNotInHistory(history.anchor));
            };

            let focused = self.browser.any_container_focused().await?;
            let target = if !focused {
                current
            } else if press == Press::Double || current == 0 {
                current + 1
            } else {
                0
            };
            let target = target.min(history.queue.len() - 1);

            let Some(candidate) = history.queue.at(target).copied() else {
                return Ok(Navigation::EmptyHistory);
            };

            let Some(container) = self.browser.lookup(candidate.id).await? else {
                info!("{} no longer exists, dropping it from history", candidate.id);
                forget(&mut history, candidate.id);
                self.save(&mut history).await?;
                continue;
            };
            let chosen = ItemRef {
                id: candidate.id,
                container,
            };

            if press == Press::Single && target == 0 && target != current {
                // Do now what record_activation would do for this switch; its
                // echo will be suppressed by the anchor below.
                if let Some(outgoing) = history.queue.at(current).copied() {
                    promote(&mut history.queue, outgoing.id);
                }
                history.queue.add_first(chosen);
            }
            let outgoing = history.anchor;
            history.anchor = Some(chosen.id);
            self.save(&mut history).await?;

            match self.actuate(chosen).await {
                Ok(()) => {
                    info!("Switched to {} ({:?} press)", chosen, press);
                    return Ok(Navigation::Switched(chosen));
                }
                Err(BrowserError::Gone(what)) => {
                    info!("{} went away before it could be shown ({})", chosen.id, what);
                    forget(&mut history, chosen.id);
                    history.anchor = outgoing.filter(|id| *id != chosen.id);
                    self.save(&mut history).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn actuate(&self, item: ItemRef) -> Result<(), BrowserError> {
        self.browser.focus_container(item.container).await?;
        self.browser.activate_item(item.id).await
    }
}
