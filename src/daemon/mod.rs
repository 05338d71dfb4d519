//! Daemon module for the Pomodoro tab timer.
//!
//! This module contains the core daemon functionality:
//! - `tick`: Shared one-second tick source and the `Clock` contract
//! - `countdown`: Per-tab countdown state machine
//! - `coordinator`: Active tab tracking, tick routing and timer events
//! - `ipc`: Unix socket server and request handling
//! - `server`: Event loop wiring everything together

pub mod coordinator;
pub mod countdown;
pub mod ipc;
pub mod server;
pub mod tick;

pub use coordinator::{TabCoordinator, TimerEvent};
pub use countdown::{reduce, Countdown, CountdownEvent, CountdownState, CountdownTransition};
pub use ipc::{IpcServer, RequestHandler};
pub use server::{default_socket_path, run, run_until, DaemonConfig};
pub use tick::{Clock, ManualClock, Tick, TickSource, DEFAULT_TICK_PERIOD};
