//! Shared types for both native and frontend builds (WASM-compatible).

use serde::Serialize;

use hrms_navigation::{RedirectReason, RouteParams, VisibleMenu};

/// Result of one navigation through the console shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationOutcome {
    /// Path as requested (normalized).
    pub requested: String,
    /// Path actually rendered; differs from `requested` after a redirect.
    pub path: String,
    pub screen: String,
    pub params: RouteParams,
    /// Why the gate redirected, if it did.
    pub redirected: Option<RedirectReason>,
    pub menu: VisibleMenu,
}

impl NavigationOutcome {
    pub fn was_redirected(&self) -> bool {
        self.redirected.is_some()
    }
}
