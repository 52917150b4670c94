//! Session persistence across reloads.
//!
//! Whatever is restored must flow through `SessionProvider::restore` (and so
//! `PermissionStore::replace`) before any route is resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hrms_auth::{PermissionMap, Session, SessionProvider};

/// Serialized form of the identity plus its permission map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub session: Session,
    pub permissions: PermissionMap,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSession {
    /// Snapshot the provider's current state, if a session is active.
    pub fn capture(provider: &SessionProvider) -> Option<Self> {
        let session = provider.active_session()?;
        Some(Self {
            session,
            permissions: provider.store().snapshot().map().clone(),
            saved_at: Utc::now(),
        })
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::{clear, load, save};

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::path::Path;

    use anyhow::Context;

    use super::PersistedSession;

    pub fn save(path: &Path, session: &PersistedSession) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create session directory at {:?}", parent))?;
        }
        let json = session.to_json().context("failed to serialize session")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write session file at {:?}", path))?;
        Ok(())
    }

    /// Load a saved session; a missing file is `Ok(None)`.
    pub fn load(path: &Path) -> anyhow::Result<Option<PersistedSession>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read session file at {:?}", path));
            }
        };
        let session = PersistedSession::from_json(&raw)
            .with_context(|| format!("corrupt session file at {:?}", path))?;
        Ok(Some(session))
    }

    pub fn clear(path: &Path) -> anyhow::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove session file at {:?}", path))
            }
        }
    }
}
