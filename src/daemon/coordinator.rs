//! Tab coordinator for the Pomodoro tab timer.
//!
//! This module owns the three countdowns and decides which one is live:
//! - Active tab tracking and the fixed rotation used by "next"
//! - Tab switches (outgoing countdown is always reset)
//! - Settings application (every countdown is reconfigured)
//! - Tick routing to the subscribed countdown
//! - Event firing for notifications and other observers
//!
//! Every mutation that changes which countdown is live disarms the clock
//! before doing anything else, so at most one countdown ticks at a time.

use tokio::sync::mpsc;

use crate::types::{SessionKind, SessionRegistry, SessionUpdate, TimerSnapshot};

use super::countdown::{Countdown, CountdownEvent, CountdownTransition};
use super::tick::{Clock, Tick};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for notifications and external integrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A countdown started from idle
    Started { kind: SessionKind },
    /// A countdown was paused
    Paused { kind: SessionKind },
    /// A countdown was resumed
    Resumed { kind: SessionKind },
    /// One second elapsed on a running countdown
    Tick {
        kind: SessionKind,
        /// Remaining seconds after the tick
        remaining_seconds: u32,
    },
    /// A countdown reached zero (emitted once per transition)
    Finished { kind: SessionKind },
    /// A countdown returned to idle with a full session
    Reset { kind: SessionKind },
    /// The active tab changed
    TabChanged {
        from: SessionKind,
        to: SessionKind,
    },
    /// New session durations were applied
    SettingsApplied { sessions: SessionRegistry },
}

impl TimerEvent {
    fn from_transition(kind: SessionKind, transition: CountdownTransition) -> Self {
        match transition {
            CountdownTransition::Started => TimerEvent::Started { kind },
            CountdownTransition::Paused => TimerEvent::Paused { kind },
            CountdownTransition::Resumed => TimerEvent::Resumed { kind },
            CountdownTransition::Finished => TimerEvent::Finished { kind },
            CountdownTransition::Reset => TimerEvent::Reset { kind },
        }
    }
}

// ============================================================================
// TabCoordinator
// ============================================================================

/// Owns one countdown per session kind and the shared clock.
pub struct TabCoordinator<C: Clock> {
    /// Currently selected tab
    active: SessionKind,
    /// Configured durations
    registry: SessionRegistry,
    /// Countdowns indexed by `SessionKind::index`
    countdowns: [Countdown; 3],
    /// Shared tick source
    clock: C,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl<C: Clock> TabCoordinator<C> {
    /// Creates a coordinator with the work tab active and every countdown idle.
    pub fn new(
        registry: SessionRegistry,
        clock: C,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let countdowns = SessionKind::ALL.map(|kind| Countdown::new(kind, registry.get(kind)));
        Self {
            active: SessionKind::Work,
            registry,
            countdowns,
            clock,
            event_tx,
        }
    }

    /// Selects the initial tab, e.g. the one restored from the settings file.
    ///
    /// Every countdown is still idle at construction, so nothing is reset.
    pub fn with_active(mut self, kind: SessionKind) -> Self {
        self.active = kind;
        self
    }

    // ------------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------------

    pub fn active_kind(&self) -> SessionKind {
        self.active
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The countdown of the active tab.
    pub fn active(&self) -> &Countdown {
        self.countdown(self.active)
    }

    pub fn countdown(&self, kind: SessionKind) -> &Countdown {
        &self.countdowns[kind.index()]
    }

    /// Live state of the active countdown.
    pub fn snapshot(&self) -> TimerSnapshot {
        let countdown = self.active();
        TimerSnapshot {
            active_kind: self.active,
            session: countdown.session(),
            remaining: countdown.remaining(),
            status: countdown.status(),
        }
    }

    // ------------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------------

    /// Starts the active countdown. No-op unless it is idle.
    pub fn begin(&mut self) -> Option<CountdownTransition> {
        self.dispatch(self.active, CountdownEvent::Begin)
    }

    /// Pauses the active countdown. No-op unless it is running.
    pub fn pause(&mut self) -> Option<CountdownTransition> {
        self.dispatch(self.active, CountdownEvent::Pause)
    }

    /// Resumes the active countdown. No-op unless it is paused.
    pub fn resume(&mut self) -> Option<CountdownTransition> {
        self.dispatch(self.active, CountdownEvent::Resume)
    }

    /// Resets the active countdown to a full, idle session.
    pub fn reset(&mut self) -> Option<CountdownTransition> {
        self.dispatch(self.active, CountdownEvent::Reset)
    }

    /// Begins, pauses or resumes the active countdown depending on its status.
    pub fn toggle(&mut self) -> Option<CountdownTransition> {
        let kind = self.active;
        let transition = self.countdowns[kind.index()].toggle(&mut self.clock);
        self.emit_transition(kind, transition);
        transition
    }

    // ------------------------------------------------------------------------
    // Tabs and settings
    // ------------------------------------------------------------------------

    /// Makes `kind` the active tab.
    ///
    /// The outgoing countdown is reset; the incoming one is not started.
    pub fn change_active_tab(&mut self, kind: SessionKind) {
        self.clock.disarm();

        let from = self.active;
        self.dispatch(from, CountdownEvent::Reset);
        self.active = kind;

        tracing::debug!(%from, to = %kind, "active tab changed");
        self.emit(TimerEvent::TabChanged { from, to: kind });
    }

    /// Switches to the next tab in the rotation (work → short break → long break → work).
    pub fn next_tab(&mut self) {
        self.change_active_tab(self.active.next());
    }

    /// Applies new durations. Kinds missing from `update` keep their current
    /// length. Every countdown is reset to idle; in-progress time is
    /// discarded. The active tab is unchanged.
    pub fn apply_settings(&mut self, update: &SessionUpdate) {
        self.clock.disarm();

        self.registry = self.registry.merged(update);
        for kind in SessionKind::ALL {
            let seconds = self.registry.get(kind);
            self.dispatch(kind, CountdownEvent::SetSession(seconds));
        }

        tracing::debug!(sessions = ?self.registry, "settings applied");
        self.emit(TimerEvent::SettingsApplied {
            sessions: self.registry,
        });
    }

    // ------------------------------------------------------------------------
    // Ticks
    // ------------------------------------------------------------------------

    /// Delivers a tick to every subscribed countdown.
    ///
    /// Ticks from a disarmed or superseded interval are dropped.
    pub fn on_tick(&mut self, tick: Tick) {
        if !self.clock.admits(tick) {
            tracing::trace!(epoch = tick.epoch, "stale tick dropped");
            return;
        }

        let subscribers = self.clock.subscribers().to_vec();
        for kind in subscribers {
            let countdown = &mut self.countdowns[kind.index()];
            let transition = countdown.tick(&mut self.clock);
            let remaining_seconds = countdown.remaining();

            self.emit(TimerEvent::Tick {
                kind,
                remaining_seconds,
            });
            self.emit_transition(kind, transition);
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn dispatch(&mut self, kind: SessionKind, event: CountdownEvent) -> Option<CountdownTransition> {
        let transition = self.countdowns[kind.index()].dispatch(event, &mut self.clock);
        self.emit_transition(kind, transition);
        transition
    }

    fn emit_transition(&self, kind: SessionKind, transition: Option<CountdownTransition>) {
        if let Some(transition) = transition {
            if transition == CountdownTransition::Finished {
                tracing::info!(%kind, "session finished");
            }
            self.emit(TimerEvent::from_transition(kind, transition));
        }
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("timer event receiver dropped");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
