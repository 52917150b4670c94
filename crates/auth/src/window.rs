use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validity window of a login session.
///
/// The backend may omit the expiry, in which case the session lasts until
/// logout or an HTTP 401 from any API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionWindowError {
    #[error("session has expired")]
    Expired,

    #[error("session not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid session window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

impl SessionWindow {
    pub fn open_ended(issued_at: DateTime<Utc>) -> Self {
        Self {
            issued_at,
            expires_at: None,
        }
    }

    /// Check that the window is well-formed, independent of the clock.
    pub fn check_shape(&self) -> Result<(), SessionWindowError> {
        match self.expires_at {
            Some(expires_at) if expires_at <= self.issued_at => {
                Err(SessionWindowError::InvalidTimeWindow)
            }
            _ => Ok(()),
        }
    }

    /// Deterministically validate the window against `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), SessionWindowError> {
        self.check_shape()?;
        if now < self.issued_at {
            return Err(SessionWindowError::NotYetValid);
        }
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                return Err(SessionWindowError::Expired);
            }
        }
        Ok(())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.validate(now).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn open_ended_window_never_expires() {
        let issued = Utc::now();
        let window = SessionWindow::open_ended(issued);
        assert!(window.is_valid_at(issued));
        assert!(window.is_valid_at(issued + Duration::days(365)));
    }

    #[test]
    fn expiry_is_exclusive() {
        let issued = Utc::now();
        let window = SessionWindow {
            issued_at: issued,
            expires_at: Some(issued + Duration::hours(8)),
        };
        assert!(window.is_valid_at(issued + Duration::hours(7)));
        assert_eq!(
            window.validate(issued + Duration::hours(8)),
            Err(SessionWindowError::Expired)
        );
    }

    #[test]
    fn rejects_future_issue_and_inverted_window() {
        let issued = Utc::now();
        let window = SessionWindow::open_ended(issued);
        assert_eq!(
            window.validate(issued - Duration::seconds(1)),
            Err(SessionWindowError::NotYetValid)
        );

        let inverted = SessionWindow {
            issued_at: issued,
            expires_at: Some(issued),
        };
        assert_eq!(inverted.check_shape(), Err(SessionWindowError::InvalidTimeWindow));
    }
}
