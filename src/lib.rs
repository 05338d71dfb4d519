//! Pomotab Library
//!
//! This library provides the core functionality for the pomotab timer.
//! It includes:
//! - A shared tick source with stale-tick rejection
//! - One countdown state machine per tab (Pomodoro, Short Break, Long Break)
//! - Tab coordination: a single active tab, reset on switch
//! - IPC server/client for daemon-CLI communication
//! - Persisted session durations and mute preference
//! - Desktop completion alerts

pub mod cli;
pub mod daemon;
pub mod notification;
pub mod settings;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    CountdownStatus, IpcRequest, IpcResponse, ResponseData, SessionKind, SessionRegistry,
    SessionUpdate, TimerSnapshot,
};

pub use daemon::{Clock, Countdown, ManualClock, TabCoordinator, TickSource, TimerEvent};

pub use notification::{
    AlertDispatcher, DesktopNotifier, MockNotifier, NotificationError, Notifier, SessionAlert,
};

pub use settings::{Settings, SettingsError, SettingsStore};
