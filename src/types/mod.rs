//! Core data types for the Pomodoro tab timer.
//!
//! This module defines the data structures used for:
//! - Session kinds and their fixed rotation order
//! - Countdown status and live timer snapshots
//! - The session registry (kind → duration) and settings updates
//! - IPC request/response serialization

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Default work session length in seconds (25 minutes)
pub const DEFAULT_WORK_SECONDS: u32 = 25 * 60;

/// Default short break length in seconds (5 minutes)
pub const DEFAULT_SHORT_BREAK_SECONDS: u32 = 5 * 60;

/// Default long break length in seconds (15 minutes)
pub const DEFAULT_LONG_BREAK_SECONDS: u32 = 15 * 60;

/// Upper bound of the minutes part accepted at the settings input boundary
pub const MAX_INPUT_MINUTES: u32 = 999;

/// Upper bound of the seconds part accepted at the settings input boundary
pub const MAX_INPUT_SECONDS: u32 = 99;

/// Largest session duration that can be entered, in seconds
pub const MAX_SESSION_SECONDS: u32 = MAX_INPUT_MINUTES * 60 + MAX_INPUT_SECONDS;

// ============================================================================
// SessionKind
// ============================================================================

/// One of the three timer tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Focused work session (a "pomodoro")
    Work,
    /// Short break
    ShortBreak,
    /// Long break
    LongBreak,
}

impl SessionKind {
    /// All kinds, in rotation order.
    pub const ALL: [SessionKind; 3] = [
        SessionKind::Work,
        SessionKind::ShortBreak,
        SessionKind::LongBreak,
    ];

    /// Returns the kind that follows this one in the cyclic rotation.
    pub fn next(self) -> SessionKind {
        match self {
            SessionKind::Work => SessionKind::ShortBreak,
            SessionKind::ShortBreak => SessionKind::LongBreak,
            SessionKind::LongBreak => SessionKind::Work,
        }
    }

    /// Position of this kind in [`SessionKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            SessionKind::Work => 0,
            SessionKind::ShortBreak => 1,
            SessionKind::LongBreak => 2,
        }
    }

    /// Returns the wire representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Work => "work",
            SessionKind::ShortBreak => "short_break",
            SessionKind::LongBreak => "long_break",
        }
    }

    /// Returns the tab label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            SessionKind::Work => "Pomodoro",
            SessionKind::ShortBreak => "Short Break",
            SessionKind::LongBreak => "Long Break",
        }
    }

    /// Returns true for the two break kinds.
    pub fn is_break(&self) -> bool {
        !matches!(self, SessionKind::Work)
    }
}

impl Default for SessionKind {
    fn default() -> Self {
        SessionKind::Work
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "work" | "pomodoro" => Ok(SessionKind::Work),
            "short_break" | "shortbreak" | "short" => Ok(SessionKind::ShortBreak),
            "long_break" | "longbreak" | "long" => Ok(SessionKind::LongBreak),
            _ => Err(format!(
                "不明なタブです: {} (work, short-break, long-break のいずれかを指定してください)",
                s
            )),
        }
    }
}

// ============================================================================
// CountdownStatus
// ============================================================================

/// Lifecycle status of a single countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownStatus {
    /// Not started, `remaining == session`
    Idle,
    /// Counting down
    Running,
    /// Stopped mid-session, progress kept
    Paused,
    /// Reached zero
    Done,
}

impl CountdownStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CountdownStatus::Idle => "idle",
            CountdownStatus::Running => "running",
            CountdownStatus::Paused => "paused",
            CountdownStatus::Done => "done",
        }
    }
}

impl Default for CountdownStatus {
    fn default() -> Self {
        CountdownStatus::Idle
    }
}

// ============================================================================
// SessionRegistry
// ============================================================================

/// Configured duration, in seconds, of every session kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRegistry {
    /// Work session length in seconds
    pub work: u32,
    /// Short break length in seconds
    pub short_break: u32,
    /// Long break length in seconds
    pub long_break: u32,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self {
            work: DEFAULT_WORK_SECONDS,
            short_break: DEFAULT_SHORT_BREAK_SECONDS,
            long_break: DEFAULT_LONG_BREAK_SECONDS,
        }
    }
}

impl SessionRegistry {
    /// Returns the configured duration of `kind`.
    pub fn get(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Work => self.work,
            SessionKind::ShortBreak => self.short_break,
            SessionKind::LongBreak => self.long_break,
        }
    }

    /// Returns a copy with the duration of `kind` replaced.
    pub fn with(mut self, kind: SessionKind, seconds: u32) -> Self {
        match kind {
            SessionKind::Work => self.work = seconds,
            SessionKind::ShortBreak => self.short_break = seconds,
            SessionKind::LongBreak => self.long_break = seconds,
        }
        self
    }

    /// Returns a copy with every duration capped at [`MAX_SESSION_SECONDS`].
    pub fn clamped(self) -> Self {
        Self {
            work: self.work.min(MAX_SESSION_SECONDS),
            short_break: self.short_break.min(MAX_SESSION_SECONDS),
            long_break: self.long_break.min(MAX_SESSION_SECONDS),
        }
    }

    /// Returns a copy with every duration supplied by `update` replaced.
    pub fn merged(self, update: &SessionUpdate) -> Self {
        SessionKind::ALL
            .iter()
            .fold(self, |registry, &kind| match update.get(kind) {
                Some(seconds) => registry.with(kind, seconds),
                None => registry,
            })
    }
}

// ============================================================================
// SessionUpdate
// ============================================================================

/// A partial set of new session durations, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    /// New work session length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work: Option<u32>,
    /// New short break length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_break: Option<u32>,
    /// New long break length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break: Option<u32>,
}

impl SessionUpdate {
    /// An update that sets every kind from `registry`.
    pub fn from_registry(registry: &SessionRegistry) -> Self {
        Self {
            work: Some(registry.work),
            short_break: Some(registry.short_break),
            long_break: Some(registry.long_break),
        }
    }

    /// Returns the new duration for `kind`, if one was supplied.
    pub fn get(&self, kind: SessionKind) -> Option<u32> {
        match kind {
            SessionKind::Work => self.work,
            SessionKind::ShortBreak => self.short_break,
            SessionKind::LongBreak => self.long_break,
        }
    }

    /// Returns true if no duration was supplied.
    pub fn is_empty(&self) -> bool {
        self.work.is_none() && self.short_break.is_none() && self.long_break.is_none()
    }

    /// Validates the update against the input bounds.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        for kind in SessionKind::ALL {
            if let Some(seconds) = self.get(kind) {
                if seconds > MAX_SESSION_SECONDS {
                    return Err(format!(
                        "{}の時間は{}秒以内で指定してください",
                        kind.label(),
                        MAX_SESSION_SECONDS
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Builds a duration from a minutes/seconds pair, clamping each part to the
/// input bounds (0-999 minutes, 0-99 seconds).
pub fn duration_from_parts(minutes: u32, seconds: u32) -> u32 {
    minutes.min(MAX_INPUT_MINUTES) * 60 + seconds.min(MAX_INPUT_SECONDS)
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Live state of the active countdown, as observed by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Currently selected tab
    pub active_kind: SessionKind,
    /// Configured length of the active countdown, in seconds
    pub session: u32,
    /// Seconds left on the active countdown
    pub remaining: u32,
    /// Status of the active countdown
    pub status: CountdownStatus,
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start the active countdown
    Begin,
    /// Pause the active countdown
    Pause,
    /// Resume the active countdown
    Resume,
    /// Reset the active countdown
    Reset,
    /// Begin, pause or resume depending on the current status
    Toggle,
    /// Switch to the next tab in the rotation
    Next,
    /// Switch to a specific tab
    Tab {
        /// Tab to activate
        kind: SessionKind,
    },
    /// Apply new session durations
    Settings {
        /// New durations (seconds)
        #[serde(flatten)]
        update: SessionUpdate,
    },
    /// Set the mute preference
    Mute {
        /// Whether completion alerts should be silent
        muted: bool,
    },
    /// Query the current status
    Status,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Active tab
    #[serde(rename = "activeKind", skip_serializing_if = "Option::is_none")]
    pub active_kind: Option<SessionKind>,
    /// Status of the active countdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Remaining seconds
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    /// Session length in seconds
    #[serde(rename = "sessionSeconds", skip_serializing_if = "Option::is_none")]
    pub session_seconds: Option<u32>,
    /// Mute preference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    /// Configured durations of every tab
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<SessionRegistry>,
}

impl ResponseData {
    /// Creates response data from a timer snapshot.
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        Self {
            active_kind: Some(snapshot.active_kind),
            state: Some(snapshot.status.as_str().to_string()),
            remaining_seconds: Some(snapshot.remaining),
            session_seconds: Some(snapshot.session),
            ..Self::default()
        }
    }

    /// Fraction of the session still remaining, as a percentage (0-100).
    ///
    /// A zero-length session reports 0.
    pub fn remaining_percent(&self) -> Option<f64> {
        let remaining = self.remaining_seconds?;
        let session = self.session_seconds?;
        if session == 0 {
            return Some(0.0);
        }
        Some(f64::from(remaining) / f64::from(session) * 100.0)
    }

    /// Attaches the registry and mute preference.
    pub fn with_preferences(mut self, sessions: SessionRegistry, muted: bool) -> Self {
        self.sessions = Some(sessions);
        self.muted = Some(muted);
        self
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for error responses.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // SessionKind Tests
    // ------------------------------------------------------------------------

    mod session_kind_tests {
        use super::*;

        #[test]
        fn test_default_is_work() {
            assert_eq!(SessionKind::default(), SessionKind::Work);
        }

        #[test]
        fn test_rotation_is_cyclic() {
            assert_eq!(SessionKind::Work.next(), SessionKind::ShortBreak);
            assert_eq!(SessionKind::ShortBreak.next(), SessionKind::LongBreak);
            assert_eq!(SessionKind::LongBreak.next(), SessionKind::Work);
        }

        #[test]
        fn test_three_steps_return_to_start() {
            for kind in SessionKind::ALL {
                assert_eq!(kind.next().next().next(), kind);
            }
        }

        #[test]
        fn test_index_matches_all_order() {
            for (i, kind) in SessionKind::ALL.iter().enumerate() {
                assert_eq!(kind.index(), i);
            }
        }

        #[test]
        fn test_labels() {
            assert_eq!(SessionKind::Work.label(), "Pomodoro");
            assert_eq!(SessionKind::ShortBreak.label(), "Short Break");
            assert_eq!(SessionKind::LongBreak.label(), "Long Break");
        }

        #[test]
        fn test_is_break() {
            assert!(!SessionKind::Work.is_break());
            assert!(SessionKind::ShortBreak.is_break());
            assert!(SessionKind::LongBreak.is_break());
        }

        #[test]
        fn test_from_str_aliases() {
            assert_eq!("work".parse::<SessionKind>(), Ok(SessionKind::Work));
            assert_eq!("pomodoro".parse::<SessionKind>(), Ok(SessionKind::Work));
            assert_eq!(
                "short-break".parse::<SessionKind>(),
                Ok(SessionKind::ShortBreak)
            );
            assert_eq!(
                "short_break".parse::<SessionKind>(),
                Ok(SessionKind::ShortBreak)
            );
            assert_eq!("Long".parse::<SessionKind>(), Ok(SessionKind::LongBreak));
            assert!("lunch".parse::<SessionKind>().is_err());
        }

        #[test]
        fn test_serialize_snake_case() {
            let json = serde_json::to_string(&SessionKind::ShortBreak).unwrap();
            assert_eq!(json, "\"short_break\"");
            assert_eq!(SessionKind::ShortBreak.to_string(), "short_break");
        }
    }

    // ------------------------------------------------------------------------
    // CountdownStatus Tests
    // ------------------------------------------------------------------------

    mod countdown_status_tests {
        use super::*;

        #[test]
        fn test_default_is_idle() {
            assert_eq!(CountdownStatus::default(), CountdownStatus::Idle);
        }

        #[test]
        fn test_as_str() {
            assert_eq!(CountdownStatus::Idle.as_str(), "idle");
            assert_eq!(CountdownStatus::Running.as_str(), "running");
            assert_eq!(CountdownStatus::Paused.as_str(), "paused");
            assert_eq!(CountdownStatus::Done.as_str(), "done");
        }
    }

    // ------------------------------------------------------------------------
    // SessionRegistry Tests
    // ------------------------------------------------------------------------

    mod session_registry_tests {
        use super::*;

        #[test]
        fn test_default_values() {
            let registry = SessionRegistry::default();
            assert_eq!(registry.get(SessionKind::Work), 1500);
            assert_eq!(registry.get(SessionKind::ShortBreak), 300);
            assert_eq!(registry.get(SessionKind::LongBreak), 900);
        }

        #[test]
        fn test_with_replaces_one_kind() {
            let registry = SessionRegistry::default().with(SessionKind::LongBreak, 1200);
            assert_eq!(registry.long_break, 1200);
            assert_eq!(registry.work, 1500);
        }

        #[test]
        fn test_merged_keeps_missing_entries() {
            let update = SessionUpdate {
                short_break: Some(120),
                ..SessionUpdate::default()
            };
            let registry = SessionRegistry::default().merged(&update);
            assert_eq!(registry.work, 1500);
            assert_eq!(registry.short_break, 120);
            assert_eq!(registry.long_break, 900);
        }

        #[test]
        fn test_clamped_caps_durations() {
            let registry = SessionRegistry {
                work: MAX_SESSION_SECONDS + 10,
                short_break: 60,
                long_break: 0,
            }
            .clamped();
            assert_eq!(registry.work, MAX_SESSION_SECONDS);
            assert_eq!(registry.short_break, 60);
            assert_eq!(registry.long_break, 0);
        }

        #[test]
        fn test_deserialize_missing_fields_use_defaults() {
            let registry: SessionRegistry = serde_json::from_str(r#"{"work":600}"#).unwrap();
            assert_eq!(registry.work, 600);
            assert_eq!(registry.short_break, 300);
            assert_eq!(registry.long_break, 900);
        }

        #[test]
        fn test_serialize_camel_case() {
            let json = serde_json::to_value(SessionRegistry::default()).unwrap();
            assert_eq!(json["work"], 1500);
            assert_eq!(json["shortBreak"], 300);
            assert_eq!(json["longBreak"], 900);
        }
    }

    // ------------------------------------------------------------------------
    // SessionUpdate Tests
    // ------------------------------------------------------------------------

    mod session_update_tests {
        use super::*;

        #[test]
        fn test_default_is_empty() {
            assert!(SessionUpdate::default().is_empty());
        }

        #[test]
        fn test_from_registry_sets_every_kind() {
            let registry = SessionRegistry::default().with(SessionKind::LongBreak, 1200);
            let update = SessionUpdate::from_registry(&registry);

            assert_eq!(registry.merged(&update), registry);
            for kind in SessionKind::ALL {
                assert_eq!(update.get(kind), Some(registry.get(kind)));
            }
        }

        #[test]
        fn test_validate_bounds() {
            let update = SessionUpdate {
                work: Some(MAX_SESSION_SECONDS),
                short_break: Some(0),
                long_break: None,
            };
            assert!(update.validate().is_ok());

            let update = SessionUpdate {
                long_break: Some(MAX_SESSION_SECONDS + 1),
                ..SessionUpdate::default()
            };
            assert!(update.validate().is_err());
        }

        #[test]
        fn test_duration_from_parts_clamps() {
            assert_eq!(duration_from_parts(25, 0), 1500);
            assert_eq!(duration_from_parts(1, 30), 90);
            assert_eq!(duration_from_parts(5000, 0), 999 * 60);
            assert_eq!(duration_from_parts(0, 500), 99);
        }
    }

    // ------------------------------------------------------------------------
    // ResponseData Tests
    // ------------------------------------------------------------------------

    mod response_data_tests {
        use super::*;

        fn snapshot(session: u32, remaining: u32) -> TimerSnapshot {
            TimerSnapshot {
                active_kind: SessionKind::Work,
                session,
                remaining,
                status: CountdownStatus::Running,
            }
        }

        #[test]
        fn test_remaining_percent() {
            let data = ResponseData::from_snapshot(&snapshot(200, 50));
            let percent = data.remaining_percent().unwrap();
            assert!((percent - 25.0).abs() < f64::EPSILON);
        }

        #[test]
        fn test_remaining_percent_zero_session() {
            let data = ResponseData::from_snapshot(&snapshot(0, 0));
            assert_eq!(data.remaining_percent(), Some(0.0));
        }

        #[test]
        fn test_remaining_percent_without_data() {
            assert_eq!(ResponseData::default().remaining_percent(), None);
        }
    }

    // ------------------------------------------------------------------------
    // IPC Tests
    // ------------------------------------------------------------------------

    mod ipc_tests {
        use super::*;

        #[test]
        fn test_ipc_request_simple_commands_serialize() {
            let cases = [
                (IpcRequest::Begin, "begin"),
                (IpcRequest::Pause, "pause"),
                (IpcRequest::Resume, "resume"),
                (IpcRequest::Reset, "reset"),
                (IpcRequest::Toggle, "toggle"),
                (IpcRequest::Next, "next"),
                (IpcRequest::Status, "status"),
            ];
            for (request, command) in cases {
                let json = serde_json::to_string(&request).unwrap();
                assert_eq!(json, format!(r#"{{"command":"{}"}}"#, command));
            }
        }

        #[test]
        fn test_ipc_request_tab_deserialize() {
            let json = r#"{"command":"tab","kind":"long_break"}"#;
            let request: IpcRequest = serde_json::from_str(json).unwrap();
            assert_eq!(
                request,
                IpcRequest::Tab {
                    kind: SessionKind::LongBreak
                }
            );
        }

        #[test]
        fn test_ipc_request_settings_flattened() {
            let request = IpcRequest::Settings {
                update: SessionUpdate {
                    work: Some(600),
                    short_break: None,
                    long_break: Some(900),
                },
            };
            let json = serde_json::to_value(&request).unwrap();
            assert_eq!(json["command"], "settings");
            assert_eq!(json["work"], 600);
            assert_eq!(json["longBreak"], 900);
            assert!(json.get("shortBreak").is_none());
        }

        #[test]
        fn test_ipc_request_settings_partial_deserialize() {
            let json = r#"{"command":"settings","shortBreak":120}"#;
            let request: IpcRequest = serde_json::from_str(json).unwrap();
            match request {
                IpcRequest::Settings { update } => {
                    assert_eq!(update.short_break, Some(120));
                    assert_eq!(update.work, None);
                    assert_eq!(update.long_break, None);
                }
                other => panic!("Expected Settings, got {:?}", other),
            }
        }

        #[test]
        fn test_ipc_request_mute_deserialize() {
            let json = r#"{"command":"mute","muted":true}"#;
            let request: IpcRequest = serde_json::from_str(json).unwrap();
            assert_eq!(request, IpcRequest::Mute { muted: true });
        }

        #[test]
        fn test_response_data_from_snapshot() {
            let snapshot = TimerSnapshot {
                active_kind: SessionKind::ShortBreak,
                session: 300,
                remaining: 120,
                status: CountdownStatus::Paused,
            };
            let data = ResponseData::from_snapshot(&snapshot)
                .with_preferences(SessionRegistry::default(), true);

            assert_eq!(data.active_kind, Some(SessionKind::ShortBreak));
            assert_eq!(data.state, Some("paused".to_string()));
            assert_eq!(data.remaining_seconds, Some(120));
            assert_eq!(data.session_seconds, Some(300));
            assert_eq!(data.muted, Some(true));
            assert_eq!(data.sessions, Some(SessionRegistry::default()));
        }

        #[test]
        fn test_ipc_response_success() {
            let response = IpcResponse::success("ok", None);
            assert_eq!(response.status, "success");
            assert!(!response.is_error());
        }

        #[test]
        fn test_ipc_response_error() {
            let response = IpcResponse::error("bad");
            assert_eq!(response.status, "error");
            assert_eq!(response.message, "bad");
            assert!(response.is_error());
            assert!(response.data.is_none());
        }

        #[test]
        fn test_ipc_response_serialize_camel_case() {
            let snapshot = TimerSnapshot {
                active_kind: SessionKind::Work,
                session: 1500,
                remaining: 1499,
                status: CountdownStatus::Running,
            };
            let response = IpcResponse::success("", Some(ResponseData::from_snapshot(&snapshot)));
            let json = serde_json::to_value(&response).unwrap();
            assert_eq!(json["data"]["activeKind"], "work");
            assert_eq!(json["data"]["remainingSeconds"], 1499);
            assert_eq!(json["data"]["sessionSeconds"], 1500);
            assert!(json["data"].get("muted").is_none());
        }
    }
}
