//! Gate/menu consistency.
//!
//! Every path reachable through the filtered menu must be a path the gate
//! allows under the same permission map. [`audit_consistency`] proves this
//! statically for a route table and menu tree; [`visible_but_denied`] checks
//! one concrete map.

use std::collections::BTreeSet;

use serde::Serialize;

use hrms_auth::{PermissionKey, PermissionMap};

use crate::gate::RouteGate;
use crate::menu::{MenuItem, filter_menu};
use crate::path::normalize_path;
use crate::routes::{MatchMode, RouteRule, RouteTable};

/// A disagreement between a menu link and the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Divergence {
    /// The link targets a path no rule matches; the gate always denies it.
    UnroutedLink { item_id: String, path: String },

    /// The link is always shown but the route requires permissions.
    UngatedLinkToGatedRoute {
        item_id: String,
        path: String,
        required: Vec<PermissionKey>,
    },

    /// The keys that make the link visible do not satisfy the rule.
    KeyDoesNotSatisfyRule {
        item_id: String,
        path: String,
        link_keys: Vec<PermissionKey>,
        required: Vec<PermissionKey>,
        match_mode: MatchMode,
    },

    /// Advisory: some permission maps allow the route while hiding the link.
    HiddenWhileAllowed {
        item_id: String,
        path: String,
        link_keys: Vec<PermissionKey>,
        required: Vec<PermissionKey>,
    },
}

impl Divergence {
    /// Whether this divergence lets a visible link lead to a denied route.
    pub fn breaks_subset_guarantee(&self) -> bool {
        !matches!(self, Divergence::HiddenWhileAllowed { .. })
    }

    pub fn item_id(&self) -> &str {
        match self {
            Divergence::UnroutedLink { item_id, .. }
            | Divergence::UngatedLinkToGatedRoute { item_id, .. }
            | Divergence::KeyDoesNotSatisfyRule { item_id, .. }
            | Divergence::HiddenWhileAllowed { item_id, .. } => item_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub divergences: Vec<Divergence>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.violations().next().is_none()
    }

    pub fn violations(&self) -> impl Iterator<Item = &Divergence> {
        self.divergences.iter().filter(|d| d.breaks_subset_guarantee())
    }

    pub fn advisories(&self) -> impl Iterator<Item = &Divergence> {
        self.divergences.iter().filter(|d| !d.breaks_subset_guarantee())
    }
}

/// Check every menu link against the route table.
///
/// A link is visible exactly when its own key and every ancestor's key are
/// granted, so those keys are what the rule is checked against.
pub fn audit_consistency(table: &RouteTable, tree: &[MenuItem]) -> ConsistencyReport {
    let mut report = ConsistencyReport::default();
    let mut trail = Vec::new();
    audit_level(table, tree, &mut trail, &mut report);
    report
}

fn audit_level<'a>(
    table: &RouteTable,
    items: &'a [MenuItem],
    trail: &mut Vec<&'a PermissionKey>,
    report: &mut ConsistencyReport,
) {
    for item in items {
        if let Some(key) = &item.required {
            trail.push(key);
        }
        if let Some(path) = &item.path {
            if let Some(divergence) = audit_link(table, &item.id, path, &trail[..]) {
                report.divergences.push(divergence);
            }
        }
        audit_level(table, &item.children, trail, report);
        if item.required.is_some() {
            trail.pop();
        }
    }
}

fn audit_link(
    table: &RouteTable,
    item_id: &str,
    path: &str,
    trail: &[&PermissionKey],
) -> Option<Divergence> {
    let normalized = normalize_path(path);
    if table.public_route(&normalized).is_some() {
        return None;
    }

    let Some((rule, _)) = table.lookup(&normalized) else {
        return Some(Divergence::UnroutedLink {
            item_id: item_id.to_string(),
            path: normalized,
        });
    };

    let link_keys: BTreeSet<&str> = trail.iter().map(|k| k.as_str()).collect();
    if rule.is_gated() && link_keys.is_empty() {
        return Some(Divergence::UngatedLinkToGatedRoute {
            item_id: item_id.to_string(),
            path: normalized,
            required: rule.required.clone(),
        });
    }

    let owned_keys = || trail.iter().map(|k| (*k).clone()).collect::<Vec<_>>();
    if !link_keys_satisfy(rule, &link_keys) {
        return Some(Divergence::KeyDoesNotSatisfyRule {
            item_id: item_id.to_string(),
            path: normalized,
            link_keys: owned_keys(),
            required: rule.required.clone(),
            match_mode: rule.match_mode,
        });
    }

    if can_hide_while_allowed(rule, &link_keys) {
        return Some(Divergence::HiddenWhileAllowed {
            item_id: item_id.to_string(),
            path: normalized,
            link_keys: owned_keys(),
            required: rule.required.clone(),
        });
    }

    None
}

/// Granting exactly the link's keys satisfies the rule.
fn link_keys_satisfy(rule: &RouteRule, link_keys: &BTreeSet<&str>) -> bool {
    match rule.match_mode {
        _ if rule.required.is_empty() => true,
        MatchMode::Exact => rule.required.iter().all(|k| link_keys.contains(k.as_str())),
        MatchMode::AnyOf => rule.required.iter().any(|k| link_keys.contains(k.as_str())),
    }
}

/// Some map satisfies the rule while denying one of the link's keys.
fn can_hide_while_allowed(rule: &RouteRule, link_keys: &BTreeSet<&str>) -> bool {
    let required: BTreeSet<&str> = rule.required.iter().map(|k| k.as_str()).collect();
    match rule.match_mode {
        _ if required.is_empty() => !link_keys.is_empty(),
        MatchMode::Exact => !link_keys.is_subset(&required),
        MatchMode::AnyOf => required
            .iter()
            .any(|granted| link_keys.iter().any(|k| k != granted)),
    }
}

/// Paths the menu shows under `permissions` that the gate would deny to an
/// authenticated user. Empty whenever the audit reports no violations.
pub fn visible_but_denied(
    gate: &RouteGate,
    tree: &[MenuItem],
    permissions: &PermissionMap,
) -> Vec<String> {
    let menu = filter_menu(tree, permissions, "/");
    menu.reachable_paths()
        .into_iter()
        .filter(|path| !gate.allows_authenticated(path, permissions))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new(vec![
            RouteRule::new("/home", "home"),
            RouteRule::new("/employee", "employee_list").requires(["employee_view"]),
            RouteRule::new("/add-role", "add_role")
                .requires_any(["user_roles_create", "user_roles_edit"]),
            RouteRule::new("/payroll/generate", "payroll_generate")
                .requires(["payroll_view", "payroll_create"]),
        ])
    }

    #[test]
    fn matching_keys_are_consistent() {
        let tree = vec![
            MenuItem::link("dashboard", "Dashboard", "/home"),
            MenuItem::link("employee-list", "Employees", "/employee").requires("employee_view"),
            MenuItem::link("login", "Sign in", "/login"),
        ];
        let report = audit_consistency(&table(), &tree);
        assert!(report.is_consistent());
        assert!(report.divergences.is_empty());
    }

    #[test]
    fn flags_unrouted_and_ungated_links() {
        let tree = vec![
            MenuItem::link("ghost", "Ghost", "/does-not-exist"),
            MenuItem::link("employee-list", "Employees", "/employee"),
        ];
        let report = audit_consistency(&table(), &tree);
        assert!(!report.is_consistent());
        let ids: Vec<&str> = report.violations().map(|d| d.item_id()).collect();
        assert_eq!(ids, vec!["ghost", "employee-list"]);
        assert!(matches!(report.divergences[1], Divergence::UngatedLinkToGatedRoute { .. }));
    }

    #[test]
    fn flags_insufficient_key_for_exact_rule() {
        let tree = vec![
            MenuItem::link("generate", "Generate", "/payroll/generate").requires("payroll_create"),
        ];
        let report = audit_consistency(&table(), &tree);
        assert!(matches!(
            report.divergences.as_slice(),
            [Divergence::KeyDoesNotSatisfyRule { match_mode: MatchMode::Exact, .. }]
        ));
    }

    #[test]
    fn ancestor_keys_count_towards_the_link() {
        let tree = vec![
            MenuItem::group("payroll", "Payroll")
                .requires("payroll_view")
                .with_children(vec![
                    MenuItem::link("generate", "Generate", "/payroll/generate")
                        .requires("payroll_create"),
                ]),
        ];
        assert!(audit_consistency(&table(), &tree).divergences.is_empty());
    }

    #[test]
    fn any_of_link_is_advisory_only() {
        let tree = vec![
            MenuItem::link("add-role", "Add Role", "/add-role").requires("user_roles_create"),
        ];
        let report = audit_consistency(&table(), &tree);
        assert!(report.is_consistent());
        assert_eq!(report.advisories().count(), 1);
    }

    #[test]
    fn keyed_link_to_open_route_is_advisory() {
        let tree = vec![MenuItem::link("dashboard", "Dashboard", "/home").requires("dashboard_view")];
        let report = audit_consistency(&table(), &tree);
        assert!(report.is_consistent());
        assert!(matches!(
            report.divergences.as_slice(),
            [Divergence::HiddenWhileAllowed { .. }]
        ));
    }

    #[test]
    fn visible_but_denied_reports_concrete_leaks() {
        let gate = RouteGate::new(table());
        let tree = vec![
            MenuItem::link("employee-list", "Employees", "/employee"),
            MenuItem::link("dashboard", "Dashboard", "/home"),
        ];
        assert_eq!(
            visible_but_denied(&gate, &tree, &PermissionMap::new()),
            vec!["/employee".to_string()]
        );
        assert!(visible_but_denied(&gate, &tree, &PermissionMap::granting(["employee_view"])).is_empty());
    }
}
