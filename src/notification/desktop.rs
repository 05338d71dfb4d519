//! Desktop notifications through the operating system's notification service.

use notify_rust::Notification;

use super::{NotificationError, Notifier, SessionAlert};

/// Application name shown by the notification service
const APP_NAME: &str = "pomotab";

/// Sound hint attached to unmuted alerts
#[cfg(target_os = "macos")]
const ALERT_SOUND: &str = "Glass";
#[cfg(not(target_os = "macos"))]
const ALERT_SOUND: &str = "message-new-instant";

/// Sends alerts with `notify-rust`.
#[derive(Debug, Clone, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, alert: &SessionAlert) -> Result<(), NotificationError> {
        let mut notification = Notification::new();
        notification
            .appname(APP_NAME)
            .summary(&alert.title())
            .body(&alert.body());

        if !alert.muted {
            notification.sound_name(ALERT_SOUND);
        }

        notification
            .show()
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        Ok(())
    }
}
