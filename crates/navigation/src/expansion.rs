use std::collections::BTreeSet;

use crate::menu::VisibleMenu;

/// User-toggleable expansion state of sidebar groups.
///
/// Seeded from active-item resolution; toggling a group never changes the
/// active path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: BTreeSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded_from(menu: &VisibleMenu) -> Self {
        let mut state = Self::new();
        state.sync(menu);
        state
    }

    /// Reconcile with a freshly filtered menu.
    ///
    /// Groups on the active trail are expanded; ids no longer visible are
    /// forgotten. Everything else keeps the user's choice.
    pub fn sync(&mut self, menu: &VisibleMenu) {
        let visible: BTreeSet<&str> = menu.ids().into_iter().collect();
        self.expanded.retain(|id| visible.contains(id.as_str()));
        for id in menu.expanded_ids() {
            self.expanded.insert(id.to_string());
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Flip a group; returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn expanded(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use hrms_auth::PermissionMap;

    use super::*;
    use crate::menu::{MenuItem, filter_menu};

    fn tree() -> Vec<MenuItem> {
        vec![
            MenuItem::link("dashboard", "Dashboard", "/home"),
            MenuItem::group("leave", "Leave").with_children(vec![
                MenuItem::link("leave-list", "Leave Requests", "/leave").requires("leave_view"),
            ]),
            MenuItem::group("shifts", "Shifts").with_children(vec![
                MenuItem::link("shift-list", "Shift List", "/shift").requires("shift_view"),
            ]),
        ]
    }

    #[test]
    fn seeded_from_active_trail() {
        let perms = PermissionMap::granting(["leave_view", "shift_view"]);
        let state = ExpansionState::seeded_from(&filter_menu(&tree(), &perms, "/leave"));
        assert!(state.is_expanded("leave"));
        assert!(!state.is_expanded("shifts"));
    }

    #[test]
    fn toggle_survives_navigation_elsewhere() {
        let perms = PermissionMap::granting(["leave_view", "shift_view"]);
        let mut state = ExpansionState::seeded_from(&filter_menu(&tree(), &perms, "/leave"));

        assert!(state.toggle("shifts"));
        assert!(!state.toggle("leave"));

        state.sync(&filter_menu(&tree(), &perms, "/home"));
        assert!(state.is_expanded("shifts"));
        assert!(!state.is_expanded("leave"));
    }

    #[test]
    fn navigation_re_expands_active_group() {
        let perms = PermissionMap::granting(["leave_view"]);
        let mut state = ExpansionState::seeded_from(&filter_menu(&tree(), &perms, "/leave"));
        state.toggle("leave");
        state.sync(&filter_menu(&tree(), &perms, "/leave"));
        assert!(state.is_expanded("leave"));
    }

    #[test]
    fn hidden_groups_are_forgotten() {
        let perms = PermissionMap::granting(["leave_view", "shift_view"]);
        let mut state = ExpansionState::new();
        state.toggle("shifts");

        state.sync(&filter_menu(&tree(), &PermissionMap::granting(["leave_view"]), "/home"));
        assert!(!state.is_expanded("shifts"));

        state.sync(&filter_menu(&tree(), &perms, "/home"));
        assert_eq!(state.expanded().count(), 0);
    }
}
