//! Route authorization gate.
//!
//! Maps (path, identity, permission map) to either a screen to render or a
//! hard redirect. The decision order is:
//!
//! 1. public paths always render;
//! 2. missing or unauthenticated identity redirects to the login page;
//! 3. a path with no rule redirects to the unauthorized page (fail-closed;
//!    "not found" and "forbidden" share the same target);
//! 4. ungated rules render for any authenticated user;
//! 5. otherwise the rule's [`MatchMode`] decides.

use std::borrow::Cow;

use serde::Serialize;

use hrms_auth::{Identity, PermissionKey, PermissionMap};

use crate::path::{RouteParams, normalize_path};
use crate::routes::{LOGIN_PATH, MatchMode, RouteTable, UNAUTHORIZED_PATH};

/// Why the gate redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedirectReason {
    Unauthenticated,
    Forbidden { missing: Vec<PermissionKey> },
    UnknownRoute,
}

/// Outcome of one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Render {
        /// Normalized path that was authorized.
        path: String,
        screen: Cow<'static, str>,
        params: RouteParams,
    },
    /// Hard redirect; the original query and history state are dropped.
    Redirect {
        to: &'static str,
        reason: RedirectReason,
    },
}

impl GateDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, GateDecision::Render { .. })
    }

    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            GateDecision::Redirect { to, .. } => Some(to),
            GateDecision::Render { .. } => None,
        }
    }
}

/// Audit view of a gate decision.
#[derive(Debug, Clone, Serialize)]
pub struct GateExplanation {
    pub path: String,
    pub authenticated: bool,
    pub public: bool,
    pub matched_rule: Option<String>,
    pub match_mode: Option<MatchMode>,
    pub required: Vec<String>,
    pub granted: Vec<String>,
    pub missing: Vec<String>,
    pub allowed: bool,
    pub reason: String,
}

/// Per-navigation decision function over a static [`RouteTable`].
#[derive(Debug, Clone)]
pub struct RouteGate {
    table: RouteTable,
}

impl RouteGate {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    /// Decide whether `path` renders.
    ///
    /// Pure and synchronous; never fails.
    pub fn resolve(
        &self,
        path: &str,
        identity: Option<&dyn Identity>,
        permissions: &PermissionMap,
    ) -> GateDecision {
        let normalized = normalize_path(path);

        let decision = if let Some(public) = self.table.public_route(&normalized) {
            GateDecision::Render {
                screen: public.screen.clone(),
                path: normalized.clone(),
                params: RouteParams::default(),
            }
        } else if !identity.is_some_and(|i| i.is_authenticated()) {
            GateDecision::Redirect {
                to: LOGIN_PATH,
                reason: RedirectReason::Unauthenticated,
            }
        } else {
            self.decide_authenticated(normalized.clone(), permissions)
        };

        let (outcome, destination, reason) = match &decision {
            GateDecision::Render { screen, .. } => ("render", &**screen, None),
            GateDecision::Redirect { to, reason } => ("redirect", *to, Some(reason)),
        };
        tracing::debug!(path = %normalized, outcome, destination, ?reason, "gate decision");
        decision
    }

    /// Whether an authenticated user holding `permissions` may open `path`.
    pub fn allows_authenticated(&self, path: &str, permissions: &PermissionMap) -> bool {
        let normalized = normalize_path(path);
        self.table.public_route(&normalized).is_some()
            || self.decide_authenticated(normalized, permissions).is_render()
    }

    fn decide_authenticated(&self, normalized: String, permissions: &PermissionMap) -> GateDecision {
        let Some((rule, params)) = self.table.lookup(&normalized) else {
            return GateDecision::Redirect {
                to: UNAUTHORIZED_PATH,
                reason: RedirectReason::UnknownRoute,
            };
        };

        if rule.is_satisfied_by(permissions) {
            GateDecision::Render {
                path: normalized,
                screen: rule.screen.clone(),
                params,
            }
        } else {
            GateDecision::Redirect {
                to: UNAUTHORIZED_PATH,
                reason: RedirectReason::Forbidden {
                    missing: rule.missing_keys(permissions),
                },
            }
        }
    }

    /// Explain the decision [`resolve`](Self::resolve) would make.
    pub fn explain(
        &self,
        path: &str,
        identity: Option<&dyn Identity>,
        permissions: &PermissionMap,
    ) -> GateExplanation {
        let normalized = normalize_path(path);
        let authenticated = identity.is_some_and(|i| i.is_authenticated());
        let public = self.table.public_route(&normalized).is_some();
        let lookup = self.table.lookup(&normalized);

        let required: Vec<String> = lookup
            .as_ref()
            .map(|(rule, _)| rule.required.iter().map(|k| k.to_string()).collect())
            .unwrap_or_default();
        let (granted, missing): (Vec<String>, Vec<String>) = required
            .iter()
            .cloned()
            .partition(|k| permissions.is_granted(k));

        let decision = self.resolve(path, identity, permissions);
        let reason = match (&decision, &lookup) {
            (GateDecision::Render { .. }, _) if public => "public route".to_string(),
            (GateDecision::Render { .. }, Some((rule, _))) if !rule.is_gated() => {
                "route is open to every authenticated user".to_string()
            }
            (GateDecision::Render { .. }, Some((rule, _))) => match rule.match_mode {
                MatchMode::Exact => "every required permission is granted".to_string(),
                MatchMode::AnyOf => format!("granted one of the required permissions: {granted:?}"),
            },
            (GateDecision::Render { .. }, None) => "route rendered".to_string(),
            (GateDecision::Redirect { reason, .. }, _) => match reason {
                RedirectReason::Unauthenticated => "no authenticated identity".to_string(),
                RedirectReason::UnknownRoute => {
                    format!("no route rule matches '{normalized}'")
                }
                RedirectReason::Forbidden { missing } => {
                    let missing: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
                    format!("missing required permission(s): {missing:?}")
                }
            },
        };

        GateExplanation {
            allowed: decision.is_render(),
            matched_rule: lookup.as_ref().map(|(rule, _)| rule.pattern.to_string()),
            match_mode: lookup.as_ref().map(|(rule, _)| rule.match_mode),
            path: normalized,
            authenticated,
            public,
            required,
            granted,
            missing,
            reason,
        }
    }
}
