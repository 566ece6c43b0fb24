//! # Press Disambiguator
//!
//! Turns raw command triggers into classified `Single` / `Double` presses.
//!
//! ```text
//!   press ──► Idle ──────────────► Armed { since, timer }
//!                                    │            │
//!          press within window ◄─────┘            └── window elapses
//!          emit Double, go Idle                        emit Single
//! ```
//!
//! A `Double` is emitted synchronously from `press()`. A `Single` is emitted
//! by a spawned timer task exactly one window after the first press. A press
//! inside the window aborts that timer; a later press leaves it to fire, so
//! at most one timer is ever waiting on an unexpired deadline.

use log::debug;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Default gap under which two presses count as one double press.
pub const DOUBLE_PRESS_WINDOW: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Single,
    Double,
}

#[derive(Debug)]
enum PressState {
    Idle,
    /// `since` is left in place after the timer fires; a later press compares
    /// against it and lands outside the window.
    Armed { since: Instant, timer: AbortHandle },
}

pub struct PressDisambiguator {
    window: Duration,
    state: PressState,
    sender: UnboundedSender<Press>,
}

impl PressDisambiguator {
    pub fn new(window: Duration, sender: UnboundedSender<Press>) -> Self {
        Self {
            window,
            state: PressState::Idle,
            sender,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Feeds one raw trigger observed at `now`. Must be called from within a
    /// tokio runtime, since a first press spawns the deferred `Single`.
    pub fn press(&mut self, now: Instant) {
        let previous = std::mem::replace(&mut self.state, PressState::Idle);

        if let PressState::Armed { since, timer } = previous {
            let gap = now.saturating_duration_since(since);
            if gap < self.window {
                timer.abort();
                debug!("Double press ({:?} apart)", gap);
                let _ = self.sender.send(Press::Double);
                return;
            }
            // The earlier press is a single even if its timer hasn't been
            // polled yet; its deadline is earlier, so it still fires first.
        }

        let sender = self.sender.clone();
        let deadline = now + self.window;
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            debug!("Single press (window elapsed)");
            let _ = sender.send(Press::Single);
        });
        self.state = PressState::Armed {
            since: now,
            timer: task.abort_handle(),
        };
    }

    /// Whether a first press is still waiting to become a `Single`.
    pub fn is_pending(&self) -> bool {
        matches!(&self.state, PressState::Armed { timer, .. } if !timer.is_finished())
    }

    /// Aborts any pending `Single` and forgets the last press.
    pub fn reset(&mut self) {
        if let PressState::Armed { timer, .. } =
            std::mem::replace(&mut self.state, PressState::Idle)
        {
            timer.abort();
        }
    }
}

impl Drop for PressDisambiguator {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use tokio::time::advance;

    fn disambiguator() -> (PressDisambiguator, UnboundedReceiver<Press>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PressDisambiguator::new(DOUBLE_PRESS_WINDOW, tx), rx)
    }

    /// Lets spawned timer tasks run after the clock moved.
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lone_press_is_single_after_window() {
        let (mut presses, mut rx) = disambiguator();
        presses.press(Instant::now());

        advance(Duration::from_millis(299)).await;
        settle().await;
        assert!(rx.try_recv().is_err());

        advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(rx.try_recv(), Ok(Press::Single));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_quick_presses_are_one_double() {
        let (mut presses, mut rx) = disambiguator();
        presses.press(Instant::now());
        advance(Duration::from_millis(120)).await;
        presses.press(Instant::now());

        // Double is delivered synchronously
        assert_eq!(rx.try_recv(), Ok(Press::Double));

        // The first press's deferred single was cancelled
        advance(Duration::from_secs(1)).await;
        settle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_presses_exactly_one_window_apart_are_two_singles() {
        let (mut presses, mut rx) = disambiguator();
        presses.press(Instant::now());
        advance(Duration::from_millis(300)).await;
        settle().await;
        assert_eq!(rx.try_recv(), Ok(Press::Single));

        presses.press(Instant::now());
        advance(Duration::from_millis(299)).await;
        settle().await;
        assert!(rx.try_recv().is_err());

        advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(rx.try_recv(), Ok(Press::Single));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overdue_single_survives_next_press() {
        let (mut presses, mut rx) = disambiguator();
        let start = Instant::now();
        presses.press(start);
        tokio::task::yield_now().await;

        // The caller reaches the next press before the first timer was polled
        presses.press(start + Duration::from_millis(350));
        assert!(rx.try_recv().is_err());

        advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(rx.try_recv(), Ok(Press::Single));
        assert_eq!(rx.try_recv(), Ok(Press::Single));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_press_starts_a_new_pair() {
        let (mut presses, mut rx) = disambiguator();
        presses.press(Instant::now());
        advance(Duration::from_millis(50)).await;
        presses.press(Instant::now());
        assert_eq!(rx.try_recv(), Ok(Press::Double));

        // Third press right after a double is a fresh first press
        advance(Duration::from_millis(50)).await;
        presses.press(Instant::now());
        assert!(rx.try_recv().is_err());

        advance(Duration::from_millis(300)).await;
        settle().await;
        assert_eq!(rx.try_recv(), Ok(Press::Single));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_until_single_fires() {
        let (mut presses, mut rx) = disambiguator();
        assert!(!presses.is_pending());

        presses.press(Instant::now());
        assert!(presses.is_pending());

        advance(Duration::from_millis(300)).await;
        settle().await;
        assert_eq!(rx.try_recv(), Ok(Press::Single));
        assert!(!presses.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_single() {
        let (mut presses, mut rx) = disambiguator();
        presses.press(Instant::now());
        presses.reset();

        advance(Duration::from_secs(1)).await;
        settle().await;
        assert!(rx.try_recv().is_err());
    }
}
