//! Notification system error types.

use thiserror::Error;

/// Errors that can occur while delivering a completion alert.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The desktop notification service rejected or failed the request.
    #[error("通知の送信に失敗しました: {0}")]
    SendFailed(String),

    /// No notification service is reachable.
    #[error("通知サービスが利用できません")]
    NotAvailable,
}

impl NotificationError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::SendFailed(_) => "通知デーモンが起動しているか確認してください",
            Self::NotAvailable => "タイマーは通知なしで動作を続けます",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NotificationError::SendFailed("dbus down".to_string());
        assert!(err.to_string().contains("dbus down"));
        assert!(err.to_string().contains("通知の送信に失敗しました"));
    }

    #[test]
    fn test_suggestion_not_empty() {
        assert!(!NotificationError::NotAvailable.suggestion().is_empty());
        assert!(!NotificationError::SendFailed(String::new())
            .suggestion()
            .is_empty());
    }
}
