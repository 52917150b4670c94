//! Identity/session provider: the single writer of the [`PermissionStore`].
//!
//! Lifecycle:
//! - `login` establishes a [`Session`] and populates the store once.
//! - `refresh_permissions` swaps the whole map for the active session.
//! - `logout` / `expire` drop the session and install the empty map, so the
//!   gate denies every protected route and the menu collapses to public items.
//! - `active_session` does the same once the session window has lapsed.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use hrms_core::{DomainError, UserId};

use crate::{
    Identity, PermissionMap, PermissionPayloadError, PermissionStore, Session, SessionWindow,
    SessionWindowError,
};

/// Login response as delivered by the HR backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "userId", alias = "id", deserialize_with = "user_id_from_json")]
    pub user_id: UserId,

    #[serde(default, alias = "name", alias = "displayName")]
    pub display_name: Option<String>,

    /// Flat `{key: 0|1|bool}` object; normalized on login.
    #[serde(default = "empty_object")]
    pub permissions: Value,

    #[serde(default, alias = "issuedAt")]
    pub issued_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "expiresAt")]
    pub expires_at: Option<DateTime<Utc>>,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

fn user_id_from_json<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    UserId::try_from(&raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a session is already established for user '{0}'")]
    AlreadyEstablished(UserId),

    #[error("no active session")]
    NoActiveSession,

    #[error("malformed permission payload: {0}")]
    Payload(#[from] PermissionPayloadError),

    #[error("invalid session: {0}")]
    Window(#[from] SessionWindowError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Supplies the authenticated identity and owns writes to the permission store.
#[derive(Debug)]
pub struct SessionProvider {
    store: Arc<PermissionStore>,
    session: RwLock<Option<Session>>,
}

impl SessionProvider {
    pub fn new(store: Arc<PermissionStore>) -> Self {
        Self {
            store,
            session: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &Arc<PermissionStore> {
        &self.store
    }

    /// Current session, if any (expired sessions included).
    pub fn current(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some_and(|s| s.is_authenticated())
    }

    pub fn active_session(&self) -> Option<Session> {
        self.active_session_at(Utc::now())
    }

    /// Session still valid at `now`.
    ///
    /// A lapsed session is dropped and the empty map installed, so no
    /// permission outlives its identity.
    pub fn active_session_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let lapsed = {
            let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref().map(|s| s.is_authenticated_at(now)) {
                Some(true) => return slot.clone(),
                Some(false) => slot.take(),
                None => return None,
            }
        };
        self.store.replace(PermissionMap::new());
        if let Some(session) = &lapsed {
            tracing::warn!(
                session_id = %session.session_id,
                user_id = %session.user_id,
                "session window lapsed"
            );
        }
        None
    }

    pub fn login(&self, response: &LoginResponse) -> Result<Session, SessionError> {
        self.login_at(response, Utc::now())
    }

    /// Establish a session from a login response.
    ///
    /// The payload is validated in full before anything is written, so a
    /// rejected login leaves the previous state untouched. An `issued_at`
    /// ahead of the local clock is clamped to `now`.
    pub fn login_at(
        &self,
        response: &LoginResponse,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        if let Some(existing) = self.current() {
            if existing.is_authenticated_at(now) {
                return Err(SessionError::AlreadyEstablished(existing.user_id));
            }
        }

        let permissions = PermissionMap::from_payload(&response.permissions)?;
        let window = SessionWindow {
            issued_at: response.issued_at.map_or(now, |issued| issued.min(now)),
            expires_at: response.expires_at,
        };
        window.validate(now)?;

        let mut session = Session::new(response.user_id.clone(), window);
        session.display_name = response.display_name.clone();

        self.install(session.clone(), permissions);
        tracing::info!(
            session_id = %session.session_id,
            user_id = %session.user_id,
            "session established"
        );
        Ok(session)
    }

    /// Re-install a session persisted by the screen layer (e.g. after reload).
    ///
    /// The restored map always goes through [`PermissionStore::replace`].
    pub fn restore(
        &self,
        session: Session,
        permissions: PermissionMap,
    ) -> Result<(), SessionError> {
        self.restore_at(session, permissions, Utc::now())
    }

    pub fn restore_at(
        &self,
        session: Session,
        permissions: PermissionMap,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        session.window.validate(now)?;
        tracing::info!(
            session_id = %session.session_id,
            user_id = %session.user_id,
            "session restored"
        );
        self.install(session, permissions);
        Ok(())
    }

    /// Replace the permission map of the active session wholesale.
    pub fn refresh_permissions(&self, payload: &Value) -> Result<(), SessionError> {
        let Some(session) = self.current().filter(|s| s.is_authenticated()) else {
            return Err(SessionError::NoActiveSession);
        };
        let permissions = PermissionMap::from_payload(payload)?;
        let snapshot = self.store.replace(permissions);
        tracing::info!(
            session_id = %session.session_id,
            generation = snapshot.generation(),
            "permissions refreshed"
        );
        Ok(())
    }

    /// Drop the session and clear all permissions.
    pub fn logout(&self) -> Option<Session> {
        let previous = self.clear();
        if let Some(session) = &previous {
            tracing::info!(
                session_id = %session.session_id,
                user_id = %session.user_id,
                "session closed"
            );
        }
        previous
    }

    /// Implicit logout after the backend rejected the session (HTTP 401).
    pub fn expire(&self) -> Option<Session> {
        let previous = self.clear();
        if let Some(session) = &previous {
            tracing::warn!(
                session_id = %session.session_id,
                user_id = %session.user_id,
                "session expired by backend"
            );
        }
        previous
    }

    fn install(&self, session: Session, permissions: PermissionMap) {
        {
            let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
            *slot = Some(session);
        }
        self.store.replace(permissions);
    }

    fn clear(&self) -> Option<Session> {
        let previous = {
            let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
            slot.take()
        };
        self.store.replace(PermissionMap::new());
        previous
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn provider() -> SessionProvider {
        SessionProvider::new(Arc::new(PermissionStore::new()))
    }

    fn login_response(permissions: Value) -> LoginResponse {
        serde_json::from_value(json!({
            "userId": 42,
            "name": "Grace Obi",
            "permissions": permissions,
        }))
        .unwrap()
    }

    #[test]
    fn login_populates_store() {
        let provider = provider();
        let session = provider
            .login(&login_response(json!({"employee_view": 1, "employee_create": 0})))
            .unwrap();

        assert_eq!(session.user_id.as_str(), "42");
        assert_eq!(session.display_name.as_deref(), Some("Grace Obi"));
        assert!(provider.is_authenticated());
        assert!(provider.store().get("employee_view"));
        assert!(!provider.store().get("employee_create"));
    }

    #[test]
    fn second_login_is_rejected_while_active() {
        let provider = provider();
        provider.login(&login_response(json!({"employee_view": 1}))).unwrap();

        let err = provider.login(&login_response(json!({}))).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyEstablished(_)));
        assert!(provider.store().get("employee_view"));
    }

    #[test]
    fn malformed_payload_leaves_state_untouched() {
        let provider = provider();
        let err = provider.login(&login_response(json!(["employee_view"]))).unwrap_err();
        assert_eq!(err, SessionError::Payload(PermissionPayloadError::NotAnObject("array")));
        assert!(provider.current().is_none());
        assert_eq!(provider.store().generation(), 0);
    }

    #[test]
    fn missing_permissions_means_empty_map() {
        let provider = provider();
        let response: LoginResponse = serde_json::from_value(json!({"id": "hr-admin"})).unwrap();
        provider.login(&response).unwrap();
        assert!(provider.is_authenticated());
        assert!(provider.store().snapshot().map().is_empty());
    }

    #[test]
    fn logout_clears_identity_and_permissions() {
        let provider = provider();
        provider.login(&login_response(json!({"user_view": true}))).unwrap();

        let closed = provider.logout().unwrap();
        assert_eq!(closed.user_id.as_str(), "42");
        assert!(!provider.is_authenticated());
        assert!(!provider.store().get("user_view"));
        assert!(provider.logout().is_none());
    }

    #[test]
    fn expire_acts_as_logout() {
        let provider = provider();
        provider.login(&login_response(json!({"leave_view": 1}))).unwrap();
        assert!(provider.expire().is_some());
        assert!(provider.current().is_none());
        assert!(!provider.store().get("leave_view"));
    }

    #[test]
    fn refresh_requires_active_session() {
        let provider = provider();
        assert_eq!(
            provider.refresh_permissions(&json!({"shift_view": 1})),
            Err(SessionError::NoActiveSession)
        );

        provider.login(&login_response(json!({"shift_view": 1}))).unwrap();
        provider.refresh_permissions(&json!({"shift_create": "1"})).unwrap();
        assert!(!provider.store().get("shift_view"));
        assert!(provider.store().get("shift_create"));
    }

    #[test]
    fn expired_login_window_is_rejected() {
        let provider = provider();
        let now = Utc::now();
        let mut response = login_response(json!({}));
        response.issued_at = Some(now - Duration::hours(9));
        response.expires_at = Some(now - Duration::hours(1));

        assert_eq!(
            provider.login_at(&response, now),
            Err(SessionError::Window(SessionWindowError::Expired))
        );
    }

    #[test]
    fn relogin_allowed_after_session_lapses() {
        let provider = provider();
        let now = Utc::now();
        let mut response = login_response(json!({"branch_view": 1}));
        response.expires_at = Some(now + Duration::minutes(5));
        provider.login_at(&response, now).unwrap();

        let later = now + Duration::minutes(10);
        let fresh = login_response(json!({"designation_view": 1}));
        provider.login_at(&fresh, later).unwrap();
        assert!(!provider.store().get("branch_view"));
        assert!(provider.store().get("designation_view"));
    }

    #[test]
    fn issued_at_ahead_of_local_clock_is_clamped() {
        let provider = provider();
        let now = Utc::now();
        let mut response = login_response(json!({"branch_view": 1}));
        response.issued_at = Some(now + Duration::seconds(3));
        response.expires_at = Some(now + Duration::hours(8));

        let session = provider.login_at(&response, now).unwrap();
        assert_eq!(session.window.issued_at, now);
        assert!(provider.store().get("branch_view"));
    }

    #[test]
    fn lapsed_session_is_dropped_with_its_permissions() {
        let provider = provider();
        let now = Utc::now();
        let mut response = login_response(json!({"employee_view": 1}));
        response.expires_at = Some(now + Duration::minutes(5));
        provider.login_at(&response, now).unwrap();

        assert!(provider.active_session_at(now + Duration::minutes(1)).is_some());
        assert!(provider.store().get("employee_view"));

        assert!(provider.active_session_at(now + Duration::minutes(6)).is_none());
        assert!(provider.current().is_none());
        assert!(!provider.store().get("employee_view"));
        assert_eq!(provider.store().generation(), 2);
    }

    #[test]
    fn restore_goes_through_replace() {
        let provider = provider();
        let session = Session::new(
            UserId::new("7").unwrap(),
            SessionWindow::open_ended(Utc::now() - Duration::minutes(1)),
        );
        provider
            .restore(session.clone(), PermissionMap::granting(["payroll_create"]))
            .unwrap();

        assert_eq!(provider.current(), Some(session));
        assert_eq!(provider.store().generation(), 1);
        assert!(provider.store().get("payroll_create"));
    }
}
