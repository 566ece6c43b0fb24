use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use log::LevelFilter;
use tabhop::core::config::ResolvedConfig;
use tabhop::core::engine::CAPACITY;
use tabhop::core::item::{ItemId, ItemRef};
use tabhop::core::store::{FileStore, MemoryStore};
use tabhop::runtime::{Replay, replay};

// ============================================================================
// Helper Functions
// ============================================================================

fn test_config(window_ms: u64) -> ResolvedConfig {
    ResolvedConfig {
        capacity: CAPACITY,
        double_press_window: Duration::from_millis(window_ms),
        state_file: None,
        log_file: None,
        log_level: LevelFilter::Off,
    }
}

async fn run(script: &str) -> Replay {
    let input = Cursor::new(script.as_bytes().to_vec());
    replay(&test_config(300), Arc::new(MemoryStore::new()), input)
        .await
        .expect("replay should succeed")
}

fn switched_ids(replay: &Replay) -> Vec<u64> {
    replay.switches.iter().map(|item| item.id.0).collect()
}

fn history_ids(replay: &Replay) -> Vec<u64> {
    replay.history.queue.iter().map(|item| item.id.0).collect()
}

// ============================================================================
// Press handling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_single_presses_flip_between_two_tabs() {
    let replay = run("\
activate 1 1
activate 2 1
activate 3 1
press
wait 400
press
wait 400
press
")
    .await;

    assert_eq!(switched_ids(&replay), vec![2, 3, 2]);
    assert_eq!(history_ids(&replay), vec![3, 2, 1]);
    assert_eq!(replay.history.anchor, Some(ItemId(2)));
    assert_eq!(replay.errors, 0);
}

#[tokio::test(start_paused = true)]
async fn test_double_presses_walk_back_then_single_commits() {
    let replay = run("\
activate 1 1
activate 2 1
activate 3 1
activate 4 1
press
press
wait 400
press
press
wait 400
press
")
    .await;

    // 4 → 3 → 2 by doubles, then a single lands back on 4
    assert_eq!(switched_ids(&replay), vec![3, 2, 4]);
    // 2 was the selection being left, so it is now second most recent
    assert_eq!(history_ids(&replay), vec![4, 2, 3, 1]);
    assert_eq!(replay.history.anchor, Some(ItemId(4)));
}

#[tokio::test(start_paused = true)]
async fn test_press_with_no_history_does_nothing() {
    let replay = run("press\n").await;
    assert!(replay.switches.is_empty());
    assert!(replay.history.queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_press_while_browser_unfocused_returns_to_current_tab() {
    let replay = run("\
activate 1 1
activate 2 1
blur
press
")
    .await;

    assert_eq!(switched_ids(&replay), vec![2]);
    assert_eq!(history_ids(&replay), vec![2, 1]);
}

// ============================================================================
// Tabs that go away
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_closed_tab_is_forgotten() {
    let replay = run("\
activate 1 1
activate 2 1
activate 3 1
close 2
press
")
    .await;

    assert_eq!(switched_ids(&replay), vec![1]);
    assert_eq!(history_ids(&replay), vec![3, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_closing_current_tab_moves_anchor_to_successor() {
    let replay = run("\
activate 1 1
activate 2 1
activate 3 1
close 3
press
")
    .await;

    // The browser activates tab 2 after 3 closes; the press then goes to 1
    assert_eq!(switched_ids(&replay), vec![1]);
    assert_eq!(history_ids(&replay), vec![2, 1]);
    assert_eq!(replay.history.anchor, Some(ItemId(1)));
}

#[tokio::test(start_paused = true)]
async fn test_silently_vanished_tab_is_skipped() {
    let replay = run("\
activate 1 1
activate 2 1
activate 3 1
vanish 2
press
press
")
    .await;

    assert_eq!(switched_ids(&replay), vec![1]);
    assert_eq!(history_ids(&replay), vec![3, 1]);
    assert_eq!(replay.history.anchor, Some(ItemId(1)));
}

// ============================================================================
// Windows and capacity
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_switch_crosses_windows() {
    let replay = run("\
activate 1 1
activate 2 2
press
")
    .await;

    assert_eq!(replay.switches, vec![ItemRef::new(1, 1)]);
    assert_eq!(
        replay.switches[0].container,
        tabhop::core::item::ContainerId(1)
    );
}

#[tokio::test(start_paused = true)]
async fn test_history_is_capped() {
    let mut script = String::new();
    for id in 0..(CAPACITY + 5) {
        script.push_str(&format!("activate {id} 1\n"));
    }
    let replay = run(&script).await;
    assert_eq!(replay.history.queue.len(), CAPACITY);
    assert_eq!(
        replay.history.queue.first().map(|item| item.id.0),
        Some(CAPACITY as u64 + 4)
    );
    assert_eq!(replay.history.queue.last().map(|item| item.id.0), Some(5));
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_history_survives_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let config = test_config(30);

    let first = replay(
        &config,
        Arc::new(FileStore::new(&path)),
        "activate 1 1\nactivate 2 1\n".as_bytes(),
    )
    .await
    .unwrap();
    assert_eq!(history_ids(&first), vec![2, 1]);

    // A fresh browser session reopens the old tabs and adds a new one
    let second = replay(
        &config,
        Arc::new(FileStore::new(&path)),
        "open 1 1\nopen 2 1\nactivate 3 1\npress\n".as_bytes(),
    )
    .await
    .unwrap();
    assert_eq!(switched_ids(&second), vec![2]);
    assert_eq!(history_ids(&second), vec![3, 2, 1]);
    assert_eq!(second.history.anchor, Some(ItemId(2)));
}
