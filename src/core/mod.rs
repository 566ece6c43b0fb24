//! # Core Navigation Logic
//!
//! This module contains tabhop's business logic.
//! It knows nothing about any specific browser.
//!
//! ```text
//!                    ┌──────────────────────────┐
//!                    │          CORE            │
//!                    │  (this module)           │
//!                    │                          │
//!                    │  • RecencyQueue (MRU)    │
//!                    │  • PressDisambiguator    │
//!                    │  • NavigationEngine      │
//!                    │  • Store (persistence)   │
//!                    └────────────┬─────────────┘
//!                                 │ host::Browser
//!            ┌────────────────────┼────────────────────┐
//!            ▼                    ▼                    ▼
//!     ┌────────────┐       ┌────────────┐       ┌────────────┐
//!     │ Simulated  │       │ Extension  │       │   Tests    │
//!     │  browser   │       │  host      │       │            │
//!     │  (replay)  │       │  (future)  │       │            │
//!     └────────────┘       └────────────┘       └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`item`]: `ItemRef`, a tab and the window it lives in
//! - [`queue`]: `RecencyQueue`, the unique most-recently-used list
//! - [`press`]: `PressDisambiguator`, single vs. double press
//! - [`engine`]: `NavigationEngine`, history bookkeeping and tab switching
//! - [`store`]: the key-value persistence the engine writes through
//! - [`config`]: layered settings

pub mod config;
pub mod engine;
pub mod item;
pub mod press;
pub mod queue;
pub mod store;

// Re-export commonly used types for convenience
pub use engine::{History, Navigation, NavigationEngine};
pub use item::{ContainerId, ItemId, ItemRef};
pub use press::{Press, PressDisambiguator};
