//! Console configuration, read from the environment.

use std::path::PathBuf;

/// Default log filter when neither `RUST_LOG` nor `HRMS_LOG_FILTER` is set.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Where the session snapshot is kept between runs (`HRMS_SESSION_PATH`).
    /// `None` disables persistence.
    pub session_path: Option<PathBuf>,

    /// Fallback tracing filter (`HRMS_LOG_FILTER`); `RUST_LOG` still wins.
    pub log_filter: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            session_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            session_path: get("HRMS_SESSION_PATH").map(PathBuf::from),
            log_filter: get("HRMS_LOG_FILTER").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}
