//! Completion alerts for the Pomodoro tab timer.
//!
//! The timer core only emits [`TimerEvent::Finished`]; this module turns that
//! event into a user-facing alert. Delivery failures never affect the timer:
//! they are logged and dropped.
//!
//! - `Notifier`: the delivery seam (desktop notifications, mock for tests)
//! - `SessionAlert`: what to tell the user about a finished session
//! - `AlertDispatcher`: filters timer events and applies the mute preference

mod desktop;
mod error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::daemon::coordinator::TimerEvent;
use crate::types::SessionKind;

pub use desktop::DesktopNotifier;
pub use error::NotificationError;

// ============================================================================
// SessionAlert
// ============================================================================

/// Alert raised when a session reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionAlert {
    /// The session that finished
    pub kind: SessionKind,
    /// Whether the alert should be silent
    pub muted: bool,
}

impl SessionAlert {
    pub fn new(kind: SessionKind, muted: bool) -> Self {
        Self { kind, muted }
    }

    /// Notification title.
    pub fn title(&self) -> String {
        match self.kind {
            SessionKind::Work => "ポモドーロ完了".to_string(),
            SessionKind::ShortBreak | SessionKind::LongBreak => {
                format!("{} 終了", self.kind.label())
            }
        }
    }

    /// Notification body, suggesting the next tab in the rotation.
    pub fn body(&self) -> String {
        let next = self.kind.next();
        if self.kind.is_break() {
            format!("休憩は終わりです。次は {} です", next.label())
        } else {
            format!("お疲れさまでした。次は {} です", next.label())
        }
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// Trait for alert delivery implementations.
pub trait Notifier: Send + Sync {
    /// Delivers `alert` to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    fn notify(&self, alert: &SessionAlert) -> Result<(), NotificationError>;

    /// Returns true if alerts can currently be delivered.
    fn is_available(&self) -> bool {
        true
    }
}

/// Mock notifier for testing.
#[derive(Debug)]
pub struct MockNotifier {
    alerts: Mutex<Vec<SessionAlert>>,
    available: AtomicBool,
    should_fail: AtomicBool,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get_alerts(&self) -> Vec<SessionAlert> {
        self.alerts.lock().unwrap().clone()
    }

    #[must_use]
    pub fn alert_count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, alert: &SessionAlert) -> Result<(), NotificationError> {
        if !self.is_available() {
            return Err(NotificationError::NotAvailable);
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }
        self.alerts.lock().unwrap().push(*alert);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

// ============================================================================
// AlertDispatcher
// ============================================================================

/// Forwards finished sessions to a [`Notifier`].
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    muted: Arc<AtomicBool>,
}

impl AlertDispatcher {
    /// Creates a dispatcher sharing the mute flag with the request handler.
    pub fn new(notifier: Arc<dyn Notifier>, muted: Arc<AtomicBool>) -> Self {
        Self { notifier, muted }
    }

    /// Returns the alert `event` should raise, if any.
    pub fn alert_for(&self, event: &TimerEvent) -> Option<SessionAlert> {
        match event {
            TimerEvent::Finished { kind } => {
                Some(SessionAlert::new(*kind, self.muted.load(Ordering::SeqCst)))
            }
            _ => None,
        }
    }

    /// Delivers the alert for `event`, if any. Failures are logged, never returned.
    ///
    /// Returns true if an alert was delivered.
    pub fn dispatch(&self, event: &TimerEvent) -> bool {
        let Some(alert) = self.alert_for(event) else {
            return false;
        };

        if !self.notifier.is_available() {
            let e = NotificationError::NotAvailable;
            tracing::debug!(kind = %alert.kind, "{} ({})", e, e.suggestion());
            return false;
        }

        match self.notifier.notify(&alert) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{} ({})", e, e.suggestion());
                false
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(muted: bool) -> (Arc<MockNotifier>, AlertDispatcher) {
        let mock = Arc::new(MockNotifier::new());
        let dispatcher = AlertDispatcher::new(mock.clone(), Arc::new(AtomicBool::new(muted)));
        (mock, dispatcher)
    }

    mod session_alert_tests {
        use super::*;

        #[test]
        fn test_work_alert_suggests_short_break() {
            let alert = SessionAlert::new(SessionKind::Work, false);
            assert_eq!(alert.title(), "ポモドーロ完了");
            assert!(alert.body().contains("Short Break"));
        }

        #[test]
        fn test_long_break_alert_suggests_work() {
            let alert = SessionAlert::new(SessionKind::LongBreak, false);
            assert!(alert.title().contains("Long Break"));
            assert!(alert.body().contains("Pomodoro"));
        }
    }

    mod dispatcher_tests {
        use super::*;

        #[test]
        fn test_finished_event_raises_alert() {
            let (mock, dispatcher) = dispatcher(false);

            let delivered = dispatcher.dispatch(&TimerEvent::Finished {
                kind: SessionKind::Work,
            });

            assert!(delivered);
            assert_eq!(
                mock.get_alerts(),
                vec![SessionAlert::new(SessionKind::Work, false)]
            );
        }

        #[test]
        fn test_other_events_are_ignored() {
            let (mock, dispatcher) = dispatcher(false);

            dispatcher.dispatch(&TimerEvent::Started {
                kind: SessionKind::Work,
            });
            dispatcher.dispatch(&TimerEvent::Tick {
                kind: SessionKind::Work,
                remaining_seconds: 3,
            });

            assert_eq!(mock.alert_count(), 0);
        }

        #[test]
        fn test_mute_flag_is_carried() {
            let (mock, dispatcher) = dispatcher(true);

            dispatcher.dispatch(&TimerEvent::Finished {
                kind: SessionKind::ShortBreak,
            });

            assert!(mock.get_alerts()[0].muted);
        }

        #[test]
        fn test_failure_degrades_silently() {
            let (mock, dispatcher) = dispatcher(false);
            mock.set_should_fail(true);

            let delivered = dispatcher.dispatch(&TimerEvent::Finished {
                kind: SessionKind::Work,
            });

            assert!(!delivered);
        }

        #[test]
        fn test_unavailable_notifier_is_skipped() {
            let (mock, dispatcher) = dispatcher(false);
            mock.set_available(false);

            let delivered = dispatcher.dispatch(&TimerEvent::Finished {
                kind: SessionKind::Work,
            });

            assert!(!delivered);
            assert_eq!(mock.alert_count(), 0);
        }

        #[test]
        fn test_unavailable_mock_reports_not_available() {
            let mock = MockNotifier::new();
            mock.set_available(false);

            let err = mock
                .notify(&SessionAlert::new(SessionKind::Work, false))
                .unwrap_err();

            assert!(matches!(err, NotificationError::NotAvailable));
            assert_eq!(mock.alert_count(), 0);
        }
    }
}
