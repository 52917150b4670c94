//! Navigation driver for the screen layer.
//!
//! Every navigation takes one snapshot of the permission map and feeds it to
//! both the route gate and the menu filter, so the two always agree. A lapsed
//! session is dropped before the snapshot is taken.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hrms_auth::{Identity, SessionProvider, SubscriptionId};
use hrms_navigation::{
    ExpansionState, GateDecision, GateExplanation, MenuItem, RouteGate, RouteParams, RouteTable,
    VisibleMenu, audit_consistency, catalog, filter_menu, normalize_path,
};

use crate::types::NavigationOutcome;

pub struct ConsoleShell {
    provider: Arc<SessionProvider>,
    gate: RouteGate,
    menu_tree: Vec<MenuItem>,
    expansion: ExpansionState,
    current_path: String,
    rendered_generation: u64,
    latest_generation: Arc<AtomicU64>,
    subscription: SubscriptionId,
}

impl core::fmt::Debug for ConsoleShell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConsoleShell")
            .field("current_path", &self.current_path)
            .field("rendered_generation", &self.rendered_generation)
            .field("expansion", &self.expansion)
            .finish_non_exhaustive()
    }
}

impl ConsoleShell {
    /// Wire a shell to `provider`.
    ///
    /// The route table and menu tree are audited once; links that could lead
    /// to a denied route are logged.
    pub fn new(provider: Arc<SessionProvider>, table: RouteTable, menu_tree: Vec<MenuItem>) -> Self {
        let report = audit_consistency(&table, &menu_tree);
        for divergence in report.violations() {
            tracing::warn!(item_id = divergence.item_id(), ?divergence, "menu link diverges from route table");
        }

        let latest_generation = Arc::new(AtomicU64::new(provider.store().generation()));
        let observed = Arc::clone(&latest_generation);
        let subscription = provider.store().subscribe(move |snapshot| {
            observed.store(snapshot.generation(), Ordering::Release);
        });

        Self {
            rendered_generation: provider.store().generation(),
            provider,
            gate: RouteGate::new(table),
            menu_tree,
            expansion: ExpansionState::new(),
            current_path: hrms_navigation::LOGIN_PATH.to_string(),
            latest_generation,
            subscription,
        }
    }

    /// Shell over the HR console's route table and sidebar.
    pub fn hr_console(provider: Arc<SessionProvider>) -> Self {
        Self::new(provider, catalog::route_table(), catalog::menu_tree())
    }

    pub fn provider(&self) -> &Arc<SessionProvider> {
        &self.provider
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// The permission map changed since the last render.
    pub fn needs_refresh(&self) -> bool {
        self.latest_generation.load(Ordering::Acquire) != self.rendered_generation
    }

    /// Resolve `path`, following at most one redirect.
    pub fn navigate(&mut self, path: &str) -> NavigationOutcome {
        let requested = normalize_path(path);
        let session = self.provider.active_session();
        let snapshot = self.provider.store().snapshot();
        let identity = session.as_ref().map(|s| s as &dyn Identity);

        let (decision, redirected) = match self.gate.resolve(&requested, identity, snapshot.map()) {
            GateDecision::Redirect { to, reason } => {
                (self.gate.resolve(to, identity, snapshot.map()), Some(reason))
            }
            render => (render, None),
        };

        let (path, screen, params) = match decision {
            GateDecision::Render { path, screen, params } => (path, screen.into_owned(), params),
            // Redirect targets are public and always render.
            GateDecision::Redirect { to, .. } => {
                (to.to_string(), "unauthorized".to_string(), RouteParams::default())
            }
        };

        let menu = filter_menu(&self.menu_tree, snapshot.map(), &path);
        self.expansion.sync(&menu);
        self.current_path = path.clone();
        self.rendered_generation = snapshot.generation();

        NavigationOutcome {
            requested,
            path,
            screen,
            params,
            redirected,
            menu,
        }
    }

    /// Re-resolve the current path, e.g. after the permission map changed.
    pub fn refresh(&mut self) -> NavigationOutcome {
        let path = self.current_path.clone();
        self.navigate(&path)
    }

    /// Filtered menu for the current path and permission map.
    pub fn menu(&self) -> VisibleMenu {
        self.provider.active_session();
        let snapshot = self.provider.store().snapshot();
        filter_menu(&self.menu_tree, snapshot.map(), &self.current_path)
    }

    /// Toggle a visible group; `None` if `id` is not one.
    pub fn toggle_menu(&mut self, id: &str) -> Option<bool> {
        let menu = self.menu();
        let item = menu.find(id)?;
        if !item.has_children() {
            return None;
        }
        Some(self.expansion.toggle(id))
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expansion.is_expanded(id)
    }

    pub fn explain(&self, path: &str) -> GateExplanation {
        let session = self.provider.active_session();
        let snapshot = self.provider.store().snapshot();
        let identity = session.as_ref().map(|s| s as &dyn Identity);
        self.gate.explain(path, identity, snapshot.map())
    }

    /// Logout and land on the login page.
    pub fn logout(&mut self) -> NavigationOutcome {
        self.provider.logout();
        self.expansion.collapse_all();
        self.navigate(hrms_navigation::LOGIN_PATH)
    }
}

impl Drop for ConsoleShell {
    fn drop(&mut self) {
        self.provider.store().unsubscribe(self.subscription);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::Path;
    use std::sync::Arc;

    use anyhow::Context;
    use hrms_auth::{PermissionStore, SessionError};

    use super::*;
    use crate::ConsoleConfig;
    use crate::persist::{self, PersistedSession};

    impl ConsoleShell {
        /// Restore a saved session into the provider and re-render.
        ///
        /// Returns `false` when there was nothing (valid) to restore; a
        /// lapsed session file is removed.
        pub fn restore_from(&mut self, path: &Path) -> anyhow::Result<bool> {
            let Some(saved) = persist::load(path)? else {
                return Ok(false);
            };

            match self.provider.restore(saved.session, saved.permissions) {
                Ok(()) => {
                    self.refresh();
                    Ok(true)
                }
                Err(SessionError::Window(err)) => {
                    tracing::warn!(error = %err, path = ?path, "discarding lapsed session");
                    persist::clear(path)?;
                    Ok(false)
                }
                Err(err) => Err(err).context("failed to restore session"),
            }
        }

        /// Save the active session, or remove the file when logged out.
        pub fn persist_to(&self, path: &Path) -> anyhow::Result<()> {
            match PersistedSession::capture(&self.provider) {
                Some(saved) => persist::save(path, &saved),
                None => persist::clear(path),
            }
        }
    }

    /// Initialize logging, build the HR console shell and restore any saved
    /// session named by `config`.
    pub fn bootstrap(config: &ConsoleConfig) -> anyhow::Result<ConsoleShell> {
        hrms_observability::tracing::init(&config.log_filter);

        let provider = Arc::new(SessionProvider::new(Arc::new(PermissionStore::new())));
        let mut shell = ConsoleShell::hr_console(provider);
        if let Some(path) = &config.session_path {
            let restored = shell.restore_from(path)?;
            tracing::info!(restored, path = ?path, "console started");
        }
        Ok(shell)
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::bootstrap;

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use hrms_auth::{LoginResponse, PermissionMap, PermissionStore, Session, SessionWindow};
    use hrms_core::UserId;
    use hrms_navigation::{RedirectReason, UNAUTHORIZED_PATH};
    use serde_json::json;

    use super::*;

    fn shell() -> ConsoleShell {
        ConsoleShell::hr_console(Arc::new(SessionProvider::new(Arc::new(PermissionStore::new()))))
    }

    fn login(shell: &ConsoleShell, permissions: serde_json::Value) {
        let response: LoginResponse =
            serde_json::from_value(json!({"userId": 5, "permissions": permissions})).unwrap();
        shell.provider().login(&response).unwrap();
    }

    #[test]
    fn anonymous_navigation_lands_on_login() {
        let mut shell = shell();
        let outcome = shell.navigate("/employee?page=3");
        assert_eq!(outcome.requested, "/employee");
        assert_eq!(outcome.path, "/login");
        assert_eq!(outcome.screen, "login");
        assert_eq!(outcome.redirected, Some(RedirectReason::Unauthenticated));
        assert!(outcome.menu.reachable_paths().contains(&"/home"));
    }

    #[test]
    fn authorized_navigation_renders_and_expands_group() {
        let mut shell = shell();
        login(&shell, json!({"employee_view": 1}));

        let outcome = shell.navigate("/employee");
        assert!(!outcome.was_redirected());
        assert_eq!(outcome.screen, "employee_list");
        assert_eq!(outcome.menu.active_id.as_deref(), Some("employee-list"));
        assert!(shell.is_expanded("employees"));
        assert_eq!(shell.current_path(), "/employee");
    }

    #[test]
    fn forbidden_navigation_is_a_hard_redirect() {
        let mut shell = shell();
        login(&shell, json!({"employee_view": 1}));

        let outcome = shell.navigate("/add-employee?draft=1");
        assert_eq!(outcome.path, UNAUTHORIZED_PATH);
        assert_eq!(outcome.screen, "unauthorized");
        assert!(matches!(outcome.redirected, Some(RedirectReason::Forbidden { .. })));
        assert_eq!(shell.current_path(), UNAUTHORIZED_PATH);
    }

    #[test]
    fn templated_route_carries_params() {
        let mut shell = shell();
        login(&shell, json!({"employee_view": true}));
        let outcome = shell.navigate("/employee/details/88");
        assert_eq!(outcome.screen, "employee_details");
        assert_eq!(outcome.params.get("id"), Some("88"));
    }

    #[test]
    fn permission_change_requests_refresh() {
        let mut shell = shell();
        login(&shell, json!({"shift_view": 1}));
        shell.navigate("/shift");
        assert!(!shell.needs_refresh());

        shell.provider().refresh_permissions(&json!({"leave_view": 1})).unwrap();
        assert!(shell.needs_refresh());

        let outcome = shell.refresh();
        assert_eq!(outcome.requested, "/shift");
        assert_eq!(outcome.path, UNAUTHORIZED_PATH);
        assert!(!shell.needs_refresh());
    }

    #[test]
    fn toggle_only_applies_to_visible_groups() {
        let mut shell = shell();
        login(&shell, json!({"leave_view": 1, "shift_view": 1}));
        shell.navigate("/leave");
        assert!(shell.is_expanded("leave"));

        assert_eq!(shell.toggle_menu("shifts"), Some(true));
        assert_eq!(shell.toggle_menu("leave"), Some(false));
        assert_eq!(shell.toggle_menu("leave-list"), None);
        assert_eq!(shell.toggle_menu("employees"), None);
        assert_eq!(shell.current_path(), "/leave");
        assert_eq!(shell.menu().active_id.as_deref(), Some("leave-list"));
    }

    #[test]
    fn logout_returns_to_login_with_public_menu() {
        let mut shell = shell();
        login(&shell, json!({"user_view": 1}));
        shell.navigate("/usermanage");

        let outcome = shell.logout();
        assert_eq!(outcome.path, "/login");
        assert!(outcome.menu.find("user-list").is_none());
        assert_eq!(shell.navigate("/usermanage").path, "/login");
    }

    #[test]
    fn lapsed_session_collapses_menu_with_the_gate() {
        let mut shell = shell();
        let issued = Utc::now() - Duration::hours(2);
        let session = Session::new(
            UserId::new("11").unwrap(),
            SessionWindow {
                issued_at: issued,
                expires_at: Some(issued + Duration::hours(1)),
            },
        );
        shell
            .provider()
            .restore_at(
                session,
                PermissionMap::granting(["user_view", "employee_view"]),
                issued + Duration::minutes(5),
            )
            .unwrap();
        assert!(shell.provider().store().get("user_view"));

        let outcome = shell.navigate("/usermanage");
        assert_eq!(outcome.path, "/login");
        assert_eq!(outcome.redirected, Some(RedirectReason::Unauthenticated));
        assert!(outcome.menu.find("user-list").is_none());
        assert!(outcome.menu.find("employee-list").is_none());
        assert!(shell.provider().current().is_none());
        assert!(shell.menu().find("user-list").is_none());
    }

    #[test]
    fn explain_uses_live_session() {
        let shell = shell();
        let session = Session::new(
            UserId::new("9").unwrap(),
            SessionWindow::open_ended(Utc::now() - Duration::minutes(1)),
        );
        shell
            .provider()
            .restore(session, PermissionMap::granting(["payroll_create"]))
            .unwrap();

        let explanation = shell.explain("/payroll/generate");
        assert!(explanation.allowed);
        assert!(explanation.authenticated);
    }

    #[test]
    fn dropping_the_shell_unsubscribes() {
        let provider = Arc::new(SessionProvider::new(Arc::new(PermissionStore::new())));
        let shell = ConsoleShell::hr_console(Arc::clone(&provider));
        let generation = Arc::clone(&shell.latest_generation);
        drop(shell);

        provider.store().replace(PermissionMap::granting(["branch_view"]));
        assert_eq!(generation.load(Ordering::Acquire), 0);
    }
}
