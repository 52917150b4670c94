//! Browser local-storage persistence of the session.

use crate::PersistedSession;

const SESSION_KEY: &str = "hrms.session";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// Saved session, if one exists and parses.
pub fn load() -> Option<PersistedSession> {
    let raw = local_storage()?.get_item(SESSION_KEY).ok()??;
    match PersistedSession::from_json(&raw) {
        Ok(saved) => Some(saved),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring corrupt saved session");
            clear();
            None
        }
    }
}

pub fn save(saved: &PersistedSession) {
    let Some(storage) = local_storage() else {
        return;
    };
    match saved.to_json() {
        Ok(json) => {
            if let Err(err) = storage.set_item(SESSION_KEY, &json) {
                tracing::warn!(error = ?err, "failed to save session to local storage");
            }
        }
        Err(err) => tracing::warn!(error = %err, "failed to serialize session"),
    }
}

pub fn clear() {
    let Some(storage) = local_storage() else {
        return;
    };
    if let Err(err) = storage.remove_item(SESSION_KEY) {
        tracing::warn!(error = ?err, "failed to remove saved session from local storage");
    }
}
