//! Declarative route rules.

use std::borrow::Cow;

use serde::Serialize;

use hrms_auth::{PermissionKey, PermissionMap};

use crate::path::{RouteParams, RoutePattern, normalize_path};

/// Public entry path; unauthenticated navigation lands here.
pub const LOGIN_PATH: &str = "/login";

/// Target of every denied or unknown protected path.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// How a rule's required keys combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Every required key must be granted.
    Exact,
    /// At least one required key must be granted.
    AnyOf,
}

/// Which permission keys gate a path and which screen it renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub pattern: RoutePattern,
    pub screen: Cow<'static, str>,
    pub required: Vec<PermissionKey>,
    pub match_mode: MatchMode,
}

impl RouteRule {
    /// A route open to every authenticated user.
    pub fn new(path: impl Into<Cow<'static, str>>, screen: impl Into<Cow<'static, str>>) -> Self {
        Self {
            pattern: RoutePattern::new(path),
            screen: screen.into(),
            required: Vec::new(),
            match_mode: MatchMode::Exact,
        }
    }

    /// Require every key.
    pub fn requires<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PermissionKey>,
    {
        self.required = keys.into_iter().map(Into::into).collect();
        self.match_mode = MatchMode::Exact;
        self
    }

    /// Require at least one key.
    pub fn requires_any<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PermissionKey>,
    {
        self.required = keys.into_iter().map(Into::into).collect();
        self.match_mode = MatchMode::AnyOf;
        self
    }

    pub fn is_gated(&self) -> bool {
        !self.required.is_empty()
    }

    pub fn is_satisfied_by(&self, permissions: &PermissionMap) -> bool {
        if self.required.is_empty() {
            return true;
        }
        let mut granted = self.required.iter().map(|k| permissions.is_granted(k.as_str()));
        match self.match_mode {
            MatchMode::Exact => granted.all(|g| g),
            MatchMode::AnyOf => granted.any(|g| g),
        }
    }

    /// Required keys that are not granted.
    pub fn missing_keys(&self, permissions: &PermissionMap) -> Vec<PermissionKey> {
        if self.is_satisfied_by(permissions) {
            return Vec::new();
        }
        self.required
            .iter()
            .filter(|k| !permissions.is_granted(k.as_str()))
            .cloned()
            .collect()
    }
}

/// A public path rendered without identity or permission checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicRoute {
    pub path: Cow<'static, str>,
    pub screen: Cow<'static, str>,
}

/// The static, enumerable table of routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    public: Vec<PublicRoute>,
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Table with the login and unauthorized pages as the public set.
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self {
            public: vec![
                PublicRoute {
                    path: Cow::Borrowed(LOGIN_PATH),
                    screen: Cow::Borrowed("login"),
                },
                PublicRoute {
                    path: Cow::Borrowed(UNAUTHORIZED_PATH),
                    screen: Cow::Borrowed("unauthorized"),
                },
            ],
            rules,
        }
    }

    pub fn with_public(
        mut self,
        path: impl Into<Cow<'static, str>>,
        screen: impl Into<Cow<'static, str>>,
    ) -> Self {
        let path = Cow::Owned(normalize_path(&path.into()));
        self.public.push(PublicRoute {
            path,
            screen: screen.into(),
        });
        self
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Public route for an already-normalized path.
    pub fn public_route(&self, normalized: &str) -> Option<&PublicRoute> {
        self.public.iter().find(|p| p.path == normalized)
    }

    /// Rule for an already-normalized path.
    ///
    /// Literal rules win over templates; among templates the one with more
    /// literal segments wins, then declaration order.
    pub fn lookup(&self, normalized: &str) -> Option<(&RouteRule, RouteParams)> {
        if let Some(rule) = self
            .rules
            .iter()
            .find(|r| r.pattern.is_literal() && r.pattern.as_str() == normalized)
        {
            return Some((rule, RouteParams::default()));
        }

        let mut best: Option<(&RouteRule, RouteParams)> = None;
        for rule in self.rules.iter().filter(|r| !r.pattern.is_literal()) {
            let Some(params) = rule.pattern.matches(normalized) else {
                continue;
            };
            let better = match &best {
                Some((current, _)) => {
                    rule.pattern.literal_segments() > current.pattern.literal_segments()
                }
                None => true,
            };
            if better {
                best = Some((rule, params));
            }
        }
        best
    }
}
