use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hrms_core::{SessionId, UserId};

use crate::SessionWindow;

/// Authenticated identity as seen by the route gate.
///
/// "No identity" and `is_authenticated() == false` are treated identically
/// by every consumer.
pub trait Identity {
    fn user_id(&self) -> &UserId;

    fn is_authenticated(&self) -> bool;
}

/// One login session, created on login and dropped on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub window: SessionWindow,
}

impl Session {
    pub fn new(user_id: UserId, window: SessionWindow) -> Self {
        Self {
            session_id: SessionId::new(),
            user_id,
            display_name: None,
            window,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.window.is_valid_at(now)
    }
}

impl Identity for Session {
    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }
}
