//! Countdown state machine for a single session.
//!
//! The transition logic is a plain total function, [`reduce`], over
//! [`CountdownState`] and [`CountdownEvent`]. [`Countdown`] wraps it and
//! keeps the shared [`Clock`] in step with the status change:
//! - entering `running` subscribes and arms
//! - leaving `running`, `reset` and `set_session` disarm and unsubscribe

use crate::types::{CountdownStatus, SessionKind};

use super::tick::Clock;

// ============================================================================
// CountdownState / CountdownEvent
// ============================================================================

/// Remaining time and status of one countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    /// Configured length in seconds
    pub session: u32,
    /// Seconds left (`0 <= remaining <= session`)
    pub remaining: u32,
    /// Lifecycle status
    pub status: CountdownStatus,
}

impl CountdownState {
    /// A fresh, idle countdown of `session` seconds.
    pub fn new(session: u32) -> Self {
        Self {
            session,
            remaining: session,
            status: CountdownStatus::Idle,
        }
    }
}

/// Inputs to the countdown state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Begin,
    Pause,
    Resume,
    /// One second elapsed
    Tick,
    Reset,
    /// Replace the session length, discarding progress
    SetSession(u32),
}

/// Observable result of an event, at most one per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTransition {
    Started,
    Paused,
    Resumed,
    /// Remaining time reached zero
    Finished,
    /// Returned to idle with a full session
    Reset,
}

/// Applies `event` to `state`.
///
/// Events that make no sense for the current status leave the state untouched.
/// `done` is only ever reached through `remaining` hitting zero.
pub fn reduce(state: CountdownState, event: CountdownEvent) -> CountdownState {
    use CountdownStatus::{Done, Idle, Paused, Running};

    match (state.status, event) {
        // A zero-length session finishes without ticking.
        (Idle, CountdownEvent::Begin) if state.remaining == 0 => CountdownState {
            status: Done,
            ..state
        },
        (Idle, CountdownEvent::Begin) => CountdownState {
            status: Running,
            ..state
        },
        (Running, CountdownEvent::Pause) => CountdownState {
            status: Paused,
            ..state
        },
        (Paused, CountdownEvent::Resume) => CountdownState {
            status: Running,
            ..state
        },
        (Running, CountdownEvent::Tick) => {
            let remaining = state.remaining.saturating_sub(1);
            CountdownState {
                remaining,
                status: if remaining == 0 { Done } else { Running },
                ..state
            }
        }
        (_, CountdownEvent::Reset) => CountdownState::new(state.session),
        (_, CountdownEvent::SetSession(session)) => CountdownState::new(session),
        _ => state,
    }
}

/// Derives the observable transition from a before/after pair.
fn transition(
    before: CountdownState,
    after: CountdownState,
    event: CountdownEvent,
) -> Option<CountdownTransition> {
    use CountdownStatus::{Done, Idle, Paused, Running};

    if matches!(event, CountdownEvent::Reset | CountdownEvent::SetSession(_)) {
        return Some(CountdownTransition::Reset);
    }

    match (before.status, after.status) {
        (Idle, Running) => Some(CountdownTransition::Started),
        (Running, Paused) => Some(CountdownTransition::Paused),
        (Paused, Running) => Some(CountdownTransition::Resumed),
        (from, Done) if from != Done => Some(CountdownTransition::Finished),
        _ => None,
    }
}

// ============================================================================
// Countdown
// ============================================================================

/// One session's countdown, bound to its session kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    kind: SessionKind,
    state: CountdownState,
}

impl Countdown {
    /// Creates an idle countdown of `session` seconds.
    pub fn new(kind: SessionKind, session: u32) -> Self {
        Self {
            kind,
            state: CountdownState::new(session),
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn session(&self) -> u32 {
        self.state.session
    }

    pub fn remaining(&self) -> u32 {
        self.state.remaining
    }

    pub fn status(&self) -> CountdownStatus {
        self.state.status
    }

    /// Applies `event` and updates the clock subscription to match.
    pub fn dispatch<C: Clock + ?Sized>(
        &mut self,
        event: CountdownEvent,
        clock: &mut C,
    ) -> Option<CountdownTransition> {
        let before = self.state;
        let after = reduce(before, event);
        self.state = after;

        let was_running = before.status == CountdownStatus::Running;
        let is_running = after.status == CountdownStatus::Running;
        let resets = matches!(event, CountdownEvent::Reset | CountdownEvent::SetSession(_));

        if resets || (was_running && !is_running) {
            clock.disarm();
            clock.unsubscribe(self.kind);
        } else if !was_running && is_running {
            clock.subscribe(self.kind);
            clock.arm();
        }

        transition(before, after, event)
    }

    pub fn begin<C: Clock + ?Sized>(&mut self, clock: &mut C) -> Option<CountdownTransition> {
        self.dispatch(CountdownEvent::Begin, clock)
    }

    pub fn pause<C: Clock + ?Sized>(&mut self, clock: &mut C) -> Option<CountdownTransition> {
        self.dispatch(CountdownEvent::Pause, clock)
    }

    pub fn resume<C: Clock + ?Sized>(&mut self, clock: &mut C) -> Option<CountdownTransition> {
        self.dispatch(CountdownEvent::Resume, clock)
    }

    pub fn tick<C: Clock + ?Sized>(&mut self, clock: &mut C) -> Option<CountdownTransition> {
        self.dispatch(CountdownEvent::Tick, clock)
    }

    pub fn reset<C: Clock + ?Sized>(&mut self, clock: &mut C) -> Option<CountdownTransition> {
        self.dispatch(CountdownEvent::Reset, clock)
    }

    pub fn set_session<C: Clock + ?Sized>(
        &mut self,
        session: u32,
        clock: &mut C,
    ) -> Option<CountdownTransition> {
        self.dispatch(CountdownEvent::SetSession(session), clock)
    }

    /// Playback button: begin when idle, pause when running, resume when paused.
    ///
    /// A finished countdown stays finished until reset.
    pub fn toggle<C: Clock + ?Sized>(&mut self, clock: &mut C) -> Option<CountdownTransition> {
        let event = match self.state.status {
            CountdownStatus::Idle => CountdownEvent::Begin,
            CountdownStatus::Running => CountdownEvent::Pause,
            CountdownStatus::Paused => CountdownEvent::Resume,
            CountdownStatus::Done => return None,
        };
        self.dispatch(event, clock)
    }
}

// ============================================================================
// Tests
// ============================================================================
