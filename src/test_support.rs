//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::core::engine::NavigationEngine;
use crate::core::item::{ContainerId, ItemId, ItemRef};
use crate::core::store::{MemoryStore, Store, StoreError};
use crate::host::sim::SimulatedBrowser;
use crate::host::{Browser, BrowserError};

/// A memory store that counts writes, so tests can assert "nothing changed".
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }
}

/// Reads through to `inner` but refuses every write.
pub struct FailingStore {
    inner: Arc<dyn Store>,
}

impl FailingStore {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(format!("refusing to write {key}")))
    }
}

/// A browser whose liveness check still finds `ghost` in `container` after
/// the tab is gone, as if it closed between the check and the switch.
pub struct LaggingBrowser {
    sim: Arc<SimulatedBrowser>,
    ghost: ItemId,
    container: ContainerId,
}

impl LaggingBrowser {
    pub fn new(sim: Arc<SimulatedBrowser>, ghost: u64, container: u64) -> Self {
        Self {
            sim,
            ghost: ItemId(ghost),
            container: ContainerId(container),
        }
    }
}

#[async_trait]
impl Browser for LaggingBrowser {
    async fn lookup(&self, id: ItemId) -> Result<Option<ContainerId>, BrowserError> {
        if id == self.ghost {
            return Ok(Some(self.container));
        }
        self.sim.lookup(id).await
    }

    async fn any_container_focused(&self) -> Result<bool, BrowserError> {
        self.sim.any_container_focused().await
    }

    async fn active_item(&self, container: ContainerId) -> Result<Option<ItemId>, BrowserError> {
        self.sim.active_item(container).await
    }

    async fn focus_container(&self, container: ContainerId) -> Result<(), BrowserError> {
        self.sim.focus_container(container).await
    }

    async fn activate_item(&self, id: ItemId) -> Result<(), BrowserError> {
        self.sim.activate_item(id).await
    }
}

pub struct Fixture {
    pub engine: NavigationEngine,
    pub sim: Arc<SimulatedBrowser>,
    pub store: Arc<CountingStore>,
}

impl Fixture {
    /// Clicks each tab in `container` in order, recording every activation.
    /// The last id ends up first in history and current.
    pub async fn visit(&self, ids: &[u64], container: u64) {
        for &id in ids {
            let item = ItemRef::new(id, container);
            self.sim.activate(item);
            self.engine
                .record_activation(item)
                .await
                .expect("recording a visit");
        }
    }
}

/// An engine over a fresh counting store and a silent simulated browser.
pub fn fixture() -> Fixture {
    let sim = Arc::new(SimulatedBrowser::new());
    let store = Arc::new(CountingStore::default());
    Fixture {
        engine: NavigationEngine::new(store.clone(), sim.clone()),
        sim,
        store,
    }
}
