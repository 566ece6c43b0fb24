//! # Replay Runtime
//!
//! Wires a script, the simulated browser, the press disambiguator, and the
//! engine into one event loop.
//!
//! ```text
//! script lines ─► reader task ─► SimulatedBrowser ─┐
//!                      │                            ├─► host events ─┐
//!                      └── commands, Shutdown ──────┘                │
//!                                                                    ▼
//!               PressDisambiguator ◄── SwitchTab ────────────── event loop
//!                      │                                             │
//!                      └── Single / Double ─────────► engine.navigate
//! ```
//!
//! Everything runs on one thread. The engine's echo of its own activations
//! comes back through the same host event channel as user actions.

use std::fmt;
use std::io;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::Instant;

use crate::command::Command;
use crate::core::config::ResolvedConfig;
use crate::core::engine::{EngineError, History, Navigation, NavigationEngine};
use crate::core::item::ItemRef;
use crate::core::press::{Press, PressDisambiguator};
use crate::core::store::{Store, StoreError};
use crate::host::script::{self, ScriptError, Step};
use crate::host::sim::SimulatedBrowser;
use crate::host::HostEvent;

#[derive(Debug)]
pub enum RuntimeError {
    Io(io::Error),
    Script(ScriptError),
    Store(StoreError),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Io(e) => write!(f, "I/O error: {e}"),
            RuntimeError::Script(e) => write!(f, "script error: {e}"),
            RuntimeError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// What happened during a replay.
#[derive(Debug)]
pub struct Replay {
    /// Every tab a press switched to, in order.
    pub switches: Vec<ItemRef>,
    /// Handler failures that were logged and skipped.
    pub errors: usize,
    /// The persisted history once the script finished.
    pub history: History,
}

/// Reads script lines, applies user actions to the simulated browser, and
/// forwards commands. Sends `Shutdown` when done, even on a bad line.
async fn feed<R>(
    input: R,
    sim: Arc<SimulatedBrowser>,
    events: UnboundedSender<HostEvent>,
) -> Result<(), RuntimeError>
where
    R: AsyncBufRead + Unpin,
{
    let result = feed_lines(input, &sim, &events).await;
    let _ = events.send(HostEvent::Shutdown);
    result
}

async fn feed_lines<R>(
    input: R,
    sim: &SimulatedBrowser,
    events: &UnboundedSender<HostEvent>,
) -> Result<(), RuntimeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut line_number = 0;
    while let Some(line) = lines.next_line().await.map_err(RuntimeError::Io)? {
        line_number += 1;
        let Some(step) = script::parse_line(line_number, &line).map_err(RuntimeError::Script)?
        else {
            continue;
        };
        debug!("step {}: {:?}", line_number, step);
        match step {
            Step::Open(item) => sim.open(item),
            Step::Activate(item) => sim.activate(item),
            Step::Focus(container) => sim.focus(container),
            Step::Blur => sim.blur(),
            Step::Close(id) => sim.close(id),
            Step::Vanish(id) => sim.vanish(id),
            Step::Command(name) => {
                let _ = events.send(HostEvent::Command(name));
            }
            Step::Wait(duration) => tokio::time::sleep(duration).await,
        }
        // Let the event loop catch up, so the engine queries the browser
        // in about the state the step left it in
        tokio::task::yield_now().await;
    }
    Ok(())
}

/// Logs a handler failure. Store failures end the run; anything else is
/// counted and skipped.
fn settle(result: Result<(), EngineError>, errors: &mut usize) -> Result<(), RuntimeError> {
    match result {
        Ok(()) => Ok(()),
        Err(EngineError::Store(e)) => {
            error!("Store failed: {}", e);
            Err(RuntimeError::Store(e))
        }
        Err(e) => {
            warn!("Handler failed: {}", e);
            *errors += 1;
            Ok(())
        }
    }
}

async fn dispatch(
    engine: &NavigationEngine,
    presses: &mut PressDisambiguator,
    event: HostEvent,
    errors: &mut usize,
) -> Result<(), RuntimeError> {
    let result = match event {
        HostEvent::Activated(item) => engine.record_activation(item).await,
        HostEvent::ContainerFocused(container) => engine.record_container_focus(container).await,
        HostEvent::Removed(id) => engine.record_removal(id).await,
        HostEvent::Command(name) => {
            match Command::from_name(&name) {
                Some(Command::SwitchTab) => presses.press(Instant::now()),
                None => debug!("Ignoring command {:?}", name),
            }
            Ok(())
        }
        HostEvent::Shutdown => Ok(()),
    };
    settle(result, errors)
}

async fn switch(
    engine: &NavigationEngine,
    press: Press,
    switches: &mut Vec<ItemRef>,
    errors: &mut usize,
) -> Result<(), RuntimeError> {
    let result = match engine.navigate(press).await {
        Ok(Navigation::Switched(item)) => {
            switches.push(item);
            Ok(())
        }
        Ok(Navigation::EmptyHistory) => {
            debug!("{:?} press with nothing to switch to", press);
            Ok(())
        }
        Err(e) => Err(e),
    };
    settle(result, errors)
}

/// Replays `input` against a fresh simulated browser, persisting history in
/// `store`. Returns once the script is exhausted and pending presses fired.
pub async fn replay<R>(
    config: &ResolvedConfig,
    store: Arc<dyn Store>,
    input: R,
) -> Result<Replay, RuntimeError>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (host_tx, mut host_rx) = mpsc::unbounded_channel();
    let (press_tx, mut press_rx) = mpsc::unbounded_channel();

    let sim = Arc::new(SimulatedBrowser::with_events(host_tx.clone()));
    let engine = NavigationEngine::from_config(store, sim.clone(), config);
    let mut presses = PressDisambiguator::new(config.double_press_window, press_tx);

    let reader = tokio::spawn(feed(input, sim.clone(), host_tx));

    info!(
        "Replay started (capacity {}, double press window {:?})",
        engine.capacity(),
        presses.window()
    );

    let mut switches = Vec::new();
    let mut errors = 0;
    let mut shutting_down = false;

    loop {
        tokio::select! {
            biased;
            Some(press) = press_rx.recv() => {
                switch(&engine, press, &mut switches, &mut errors).await?;
            }
            Some(event) = host_rx.recv() => {
                if event == HostEvent::Shutdown {
                    shutting_down = true;
                } else {
                    dispatch(&engine, &mut presses, event, &mut errors).await?;
                }
            }
            else => break,
        }
        // Input is over, but a first press may still turn into a single
        if shutting_down && !presses.is_pending() {
            break;
        }
    }

    presses.reset();
    while let Ok(press) = press_rx.try_recv() {
        switch(&engine, press, &mut switches, &mut errors).await?;
    }
    // Echoes of the last switch, if any
    while let Ok(event) = host_rx.try_recv() {
        dispatch(&engine, &mut presses, event, &mut errors).await?;
    }

    match reader.await {
        Ok(result) => result?,
        Err(e) => return Err(RuntimeError::Io(io::Error::other(e))),
    }

    let history = engine.snapshot().await.map_err(|e| match e {
        EngineError::Store(e) => RuntimeError::Store(e),
        other => RuntimeError::Io(io::Error::other(other.to_string())),
    })?;
    info!(
        "Replay finished: {} switch(es), {} error(s), {} tab(s) remembered",
        switches.len(),
        errors,
        history.queue.len()
    );

    Ok(Replay {
        switches,
        errors,
        history,
    })
}
