//! Sidebar menu tree and its permission filter.

use std::borrow::Cow;

use serde::Serialize;

use hrms_auth::{PermissionKey, PermissionMap};

use crate::path::normalize_path;

/// Static declaration of one sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: Cow<'static, str>,
    pub label: Cow<'static, str>,
    pub path: Option<Cow<'static, str>>,
    pub required: Option<PermissionKey>,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    /// A navigable entry.
    pub fn link(
        id: impl Into<Cow<'static, str>>,
        label: impl Into<Cow<'static, str>>,
        path: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            path: Some(path.into()),
            required: None,
            children: Vec::new(),
        }
    }

    /// A container without a standalone path.
    pub fn group(id: impl Into<Cow<'static, str>>, label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            path: None,
            required: None,
            children: Vec::new(),
        }
    }

    pub fn requires(mut self, key: impl Into<PermissionKey>) -> Self {
        self.required = Some(key.into());
        self
    }

    pub fn with_children(mut self, children: Vec<MenuItem>) -> Self {
        self.children = children;
        self
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A menu entry that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleMenuItem {
    pub id: String,
    pub label: String,
    pub path: Option<String>,
    /// The item's own path is the current path, or a descendant's is.
    pub active: bool,
    /// Seed for the expansion state: a descendant is active.
    pub expanded: bool,
    pub children: Vec<VisibleMenuItem>,
}

impl VisibleMenuItem {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The filtered menu for one (permission map, current path) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisibleMenu {
    pub items: Vec<VisibleMenuItem>,
    /// Id of the first item (depth-first) whose own path is the current path.
    pub active_id: Option<String>,
}

impl VisibleMenu {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every path a user can click through to, depth-first.
    pub fn reachable_paths(&self) -> Vec<&str> {
        fn walk<'a>(items: &'a [VisibleMenuItem], out: &mut Vec<&'a str>) {
            for item in items {
                if let Some(path) = &item.path {
                    out.push(path);
                }
                walk(&item.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.items, &mut out);
        out
    }

    pub fn find(&self, id: &str) -> Option<&VisibleMenuItem> {
        fn walk<'a>(items: &'a [VisibleMenuItem], id: &str) -> Option<&'a VisibleMenuItem> {
            items.iter().find_map(|item| {
                if item.id == id {
                    Some(item)
                } else {
                    walk(&item.children, id)
                }
            })
        }
        walk(&self.items, id)
    }

    /// Ids of the items seeded as expanded.
    pub fn expanded_ids(&self) -> Vec<&str> {
        fn walk<'a>(items: &'a [VisibleMenuItem], out: &mut Vec<&'a str>) {
            for item in items {
                if item.expanded {
                    out.push(&item.id);
                }
                walk(&item.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.items, &mut out);
        out
    }

    /// Ids of every visible item.
    pub fn ids(&self) -> Vec<&str> {
        fn walk<'a>(items: &'a [VisibleMenuItem], out: &mut Vec<&'a str>) {
            for item in items {
                out.push(&item.id);
                walk(&item.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.items, &mut out);
        out
    }
}

/// Filter the static tree against `permissions` and mark the active trail
/// for `current_path`.
///
/// An item whose own key is denied is hidden together with its subtree. A
/// group without a standalone path is hidden when none of its children
/// survive.
pub fn filter_menu(tree: &[MenuItem], permissions: &PermissionMap, current_path: &str) -> VisibleMenu {
    let current = normalize_path(current_path);
    let mut active_id = None;
    let items = filter_level(tree, permissions, &current, &mut active_id);
    VisibleMenu { items, active_id }
}

fn filter_level(
    items: &[MenuItem],
    permissions: &PermissionMap,
    current: &str,
    active_id: &mut Option<String>,
) -> Vec<VisibleMenuItem> {
    items
        .iter()
        .filter_map(|item| filter_item(item, permissions, current, active_id))
        .collect()
}

fn filter_item(
    item: &MenuItem,
    permissions: &PermissionMap,
    current: &str,
    active_id: &mut Option<String>,
) -> Option<VisibleMenuItem> {
    if let Some(key) = &item.required {
        if !permissions.is_granted(key.as_str()) {
            return None;
        }
    }

    let path = item.path.as_deref().map(normalize_path);
    let self_active = path.as_deref() == Some(current);
    if self_active && active_id.is_none() {
        *active_id = Some(item.id.to_string());
    }

    let children = filter_level(&item.children, permissions, current, active_id);
    if item.is_group() && children.is_empty() && path.is_none() {
        return None;
    }

    let child_active = children.iter().any(|c| c.active);
    Some(VisibleMenuItem {
        id: item.id.to_string(),
        label: item.label.to_string(),
        path,
        active: self_active || child_active,
        expanded: child_active,
        children,
    })
}
