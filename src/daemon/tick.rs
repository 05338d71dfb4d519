//! Tick source for the Pomodoro tab timer.
//!
//! This module provides the single shared clock that drives every countdown:
//! - `Clock`: arm/disarm/subscribe contract used by countdowns
//! - `TickSource`: interval timer running on a dedicated worker thread
//! - `ManualClock`: deterministic clock driven by hand (tests, offline use)
//!
//! The worker thread only owns timing. It receives `Start`/`Stop` commands
//! and answers with `Tick` messages; all countdown state is mutated by
//! whoever drains the tick receiver.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{never, select, tick, Receiver, Sender};
use tokio::sync::mpsc;

use crate::types::SessionKind;

// ============================================================================
// Constants
// ============================================================================

/// Default tick period (one second)
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// Tick
// ============================================================================

/// One elapsed period, stamped with the epoch of the interval that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Interval identity; bumped on every `arm()`
    pub epoch: u64,
}

/// Commands sent to the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickCommand {
    /// (Re)start the interval for the given epoch
    Start { epoch: u64 },
    /// Stop the interval
    Stop,
    /// Terminate the worker
    Shutdown,
}

// ============================================================================
// Subscribers
// ============================================================================

/// Ordered set of countdowns that receive ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscribers(Vec<SessionKind>);

impl Subscribers {
    /// Adds `kind`; ignored if already present.
    pub fn insert(&mut self, kind: SessionKind) {
        if !self.0.contains(&kind) {
            self.0.push(kind);
        }
    }

    /// Removes `kind`; ignored if absent.
    pub fn remove(&mut self, kind: SessionKind) {
        self.0.retain(|k| *k != kind);
    }

    pub fn as_slice(&self) -> &[SessionKind] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Clock
// ============================================================================

/// The contract a countdown relies on to receive ticks.
///
/// None of the operations fail. `arm` on an armed clock restarts the interval,
/// `disarm` on a disarmed clock does nothing.
pub trait Clock {
    /// Starts (or restarts) periodic ticking.
    fn arm(&mut self);

    /// Stops ticking immediately. Ticks already in flight are no longer admitted.
    fn disarm(&mut self);

    /// Registers a subscriber. Does not arm the clock.
    fn subscribe(&mut self, kind: SessionKind);

    /// Removes a subscriber.
    fn unsubscribe(&mut self, kind: SessionKind);

    /// Returns true while ticks are being emitted.
    fn is_armed(&self) -> bool;

    /// Epoch of the current (or last) armed interval.
    fn epoch(&self) -> u64;

    /// Current subscribers, in subscription order.
    fn subscribers(&self) -> &[SessionKind];

    /// Returns true if `tick` belongs to the interval currently armed.
    fn admits(&self, tick: Tick) -> bool {
        self.is_armed() && tick.epoch == self.epoch()
    }
}

// ============================================================================
// TickSource
// ============================================================================

/// Interval timer backed by a dedicated worker thread.
pub struct TickSource {
    /// Command channel to the worker
    commands: Sender<TickCommand>,
    /// Registered subscribers
    subscribers: Subscribers,
    /// Whether ticks are currently admitted
    armed: bool,
    /// Epoch of the current interval
    epoch: u64,
    /// Worker thread handle (joined on drop)
    worker: Option<JoinHandle<()>>,
}

impl TickSource {
    /// Spawns the worker thread and returns the source with its tick receiver.
    ///
    /// The source starts disarmed. Ticks arrive on the receiver once per
    /// `period` while armed.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn spawn(period: Duration) -> Result<(Self, mpsc::UnboundedReceiver<Tick>)> {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let worker = thread::Builder::new()
            .name("tick-source".to_string())
            .spawn(move || run_worker(command_rx, tick_tx, period))
            .context("Failed to spawn tick source thread")?;

        tracing::debug!(?period, "tick source started");

        let source = Self {
            commands: command_tx,
            subscribers: Subscribers::default(),
            armed: false,
            epoch: 0,
            worker: Some(worker),
        };
        Ok((source, tick_rx))
    }

    fn send(&self, command: TickCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!(?command, "tick source worker is not running");
        }
    }
}

impl Clock for TickSource {
    fn arm(&mut self) {
        self.epoch += 1;
        self.armed = true;
        self.send(TickCommand::Start { epoch: self.epoch });
        tracing::trace!(epoch = self.epoch, "tick source armed");
    }

    fn disarm(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        self.send(TickCommand::Stop);
        tracing::trace!(epoch = self.epoch, "tick source disarmed");
    }

    fn subscribe(&mut self, kind: SessionKind) {
        self.subscribers.insert(kind);
    }

    fn unsubscribe(&mut self, kind: SessionKind) {
        self.subscribers.remove(kind);
    }

    fn is_armed(&self) -> bool {
        self.armed
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn subscribers(&self) -> &[SessionKind] {
        self.subscribers.as_slice()
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        let _ = self.commands.send(TickCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Worker loop: waits on the command channel and, while started, on a ticker.
fn run_worker(
    commands: Receiver<TickCommand>,
    ticks: mpsc::UnboundedSender<Tick>,
    period: Duration,
) {
    let mut ticker: Receiver<Instant> = never();
    let mut epoch = 0;

    loop {
        // None means the ticker fired
        let command = select! {
            recv(commands) -> command => Some(command),
            recv(ticker) -> _ => None,
        };

        match command {
            None => {
                if ticks.send(Tick { epoch }).is_err() {
                    break;
                }
            }
            Some(Ok(TickCommand::Start { epoch: next })) => {
                epoch = next;
                ticker = tick(period);
            }
            Some(Ok(TickCommand::Stop)) => ticker = never(),
            Some(Ok(TickCommand::Shutdown)) | Some(Err(_)) => break,
        }
    }

    tracing::debug!("tick source worker stopped");
}

// ============================================================================
// ManualClock
// ============================================================================

/// Clock without a thread; ticks are produced on demand with [`ManualClock::tick`].
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    subscribers: Subscribers,
    armed: bool,
    epoch: u64,
    arm_count: u32,
    disarm_count: u32,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces a tick for the current epoch.
    ///
    /// The tick is only admitted if the clock is armed when it is delivered.
    pub fn tick(&self) -> Tick {
        Tick { epoch: self.epoch }
    }

    /// Number of times the clock was armed.
    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }

    /// Number of times an armed clock was disarmed.
    pub fn disarm_count(&self) -> u32 {
        self.disarm_count
    }
}

impl Clock for ManualClock {
    fn arm(&mut self) {
        self.epoch += 1;
        self.armed = true;
        self.arm_count += 1;
    }

    fn disarm(&mut self) {
        if self.armed {
            self.armed = false;
            self.disarm_count += 1;
        }
    }

    fn subscribe(&mut self, kind: SessionKind) {
        self.subscribers.insert(kind);
    }

    fn unsubscribe(&mut self, kind: SessionKind) {
        self.subscribers.remove(kind);
    }

    fn is_armed(&self) -> bool {
        self.armed
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn subscribers(&self) -> &[SessionKind] {
        self.subscribers.as_slice()
    }
}

// ============================================================================
// Tests
// ============================================================================
