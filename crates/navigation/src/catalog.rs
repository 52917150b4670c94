//! Route table and sidebar tree of the HR console.
//!
//! Both are keyed by the backend's permission vocabulary. Listing pages for
//! roles, payroll and reports are open to every authenticated user while
//! their add/edit actions are gated; that asymmetry is how the product
//! currently behaves.

use std::collections::BTreeMap;

use hrms_auth::PermissionKey;

use crate::menu::MenuItem;
use crate::routes::{RouteRule, RouteTable};

/// The HR console's protected routes.
pub fn route_table() -> RouteTable {
    RouteTable::new(vec![
        RouteRule::new("/home", "dashboard"),
        RouteRule::new("/profile", "profile"),
        // Employees
        RouteRule::new("/employee", "employee_list").requires(["employee_view"]),
        RouteRule::new("/add-employee", "employee_create").requires(["employee_create"]),
        RouteRule::new("/employee/details/:id", "employee_details").requires(["employee_view"]),
        RouteRule::new("/employee/edit/:id", "employee_edit").requires(["employee_edit"]),
        // Organization
        RouteRule::new("/department", "department_list").requires(["department_view"]),
        RouteRule::new("/add-department", "department_create").requires(["department_create"]),
        RouteRule::new("/department/edit/:id", "department_edit").requires(["department_edit"]),
        RouteRule::new("/branch", "branch_list").requires(["branch_view"]),
        RouteRule::new("/add-branch", "branch_create").requires(["branch_create"]),
        RouteRule::new("/branch/edit/:id", "branch_edit").requires(["branch_edit"]),
        RouteRule::new("/designation", "designation_list").requires(["designation_view"]),
        RouteRule::new("/add-designation", "designation_create").requires(["designation_create"]),
        RouteRule::new("/designation/edit/:id", "designation_edit").requires(["designation_edit"]),
        // Shifts
        RouteRule::new("/shift", "shift_list").requires(["shift_view"]),
        RouteRule::new("/add-shift", "shift_create").requires(["shift_create"]),
        RouteRule::new("/shift/edit/:id", "shift_edit").requires(["shift_edit"]),
        RouteRule::new("/shift/assign", "shift_assign").requires(["shift_assign"]),
        // Leave
        RouteRule::new("/leave", "leave_list").requires(["leave_view"]),
        RouteRule::new("/apply-leave", "leave_apply").requires(["leave_create"]),
        RouteRule::new("/leave/approve", "leave_approve")
            .requires_any(["leave_approve", "leave_reject"]),
        RouteRule::new("/leave/details/:id", "leave_details").requires(["leave_view"]),
        // Payroll
        RouteRule::new("/payroll", "payroll_list"),
        RouteRule::new("/payroll/details/:id", "payroll_details"),
        RouteRule::new("/payroll/generate", "payroll_generate").requires(["payroll_create"]),
        // Reports
        RouteRule::new("/reports", "reports"),
        RouteRule::new("/reports/attendance", "attendance_report"),
        RouteRule::new("/reports/payroll", "payroll_report"),
        // Users and roles
        RouteRule::new("/usermanage", "user_list").requires(["user_view"]),
        RouteRule::new("/add-user", "user_create").requires(["user_create"]),
        RouteRule::new("/user/edit/:id", "user_edit").requires(["user_edit"]),
        RouteRule::new("/role", "role_list"),
        RouteRule::new("/add-role", "role_create")
            .requires_any(["user_roles_create", "user_roles_edit"]),
        RouteRule::new("/role/edit/:id", "role_edit").requires(["user_roles_edit"]),
    ])
}

/// The HR console's sidebar.
pub fn menu_tree() -> Vec<MenuItem> {
    vec![
        MenuItem::link("dashboard", "Dashboard", "/home"),
        MenuItem::group("employees", "Employees").with_children(vec![
            MenuItem::link("employee-list", "Employee List", "/employee").requires("employee_view"),
            MenuItem::link("employee-add", "Add Employee", "/add-employee")
                .requires("employee_create"),
        ]),
        MenuItem::group("organization", "Organization").with_children(vec![
            MenuItem::link("department-list", "Departments", "/department")
                .requires("department_view"),
            MenuItem::link("department-add", "Add Department", "/add-department")
                .requires("department_create"),
            MenuItem::link("branch-list", "Branches", "/branch").requires("branch_view"),
            MenuItem::link("branch-add", "Add Branch", "/add-branch").requires("branch_create"),
            MenuItem::link("designation-list", "Designations", "/designation")
                .requires("designation_view"),
            MenuItem::link("designation-add", "Add Designation", "/add-designation")
                .requires("designation_create"),
        ]),
        MenuItem::group("shifts", "Shifts").with_children(vec![
            MenuItem::link("shift-list", "Shift List", "/shift").requires("shift_view"),
            MenuItem::link("shift-add", "Add Shift", "/add-shift").requires("shift_create"),
            MenuItem::link("shift-assign", "Assign Shift", "/shift/assign").requires("shift_assign"),
        ]),
        MenuItem::group("leave", "Leave").with_children(vec![
            MenuItem::link("leave-list", "Leave Requests", "/leave").requires("leave_view"),
            MenuItem::link("leave-apply", "Apply Leave", "/apply-leave").requires("leave_create"),
            MenuItem::link("leave-approve", "Approvals", "/leave/approve").requires("leave_approve"),
        ]),
        MenuItem::link("payroll", "Payroll", "/payroll").with_children(vec![
            MenuItem::link("payroll-generate", "Generate Payroll", "/payroll/generate")
                .requires("payroll_create"),
        ]),
        MenuItem::link("reports", "Reports", "/reports").with_children(vec![
            MenuItem::link("report-attendance", "Attendance Report", "/reports/attendance"),
            MenuItem::link("report-payroll", "Payroll Report", "/reports/payroll"),
        ]),
        MenuItem::group("user-management", "User Management").with_children(vec![
            MenuItem::link("user-list", "Users", "/usermanage").requires("user_view"),
            MenuItem::link("user-add", "Add User", "/add-user").requires("user_create"),
            MenuItem::link("role-list", "Roles", "/role"),
            MenuItem::link("role-add", "Add Role", "/add-role").requires("user_roles_create"),
        ]),
    ]
}

/// Every permission key the console references, grouped by module.
pub fn permission_catalog() -> BTreeMap<String, Vec<PermissionKey>> {
    let mut keys: Vec<PermissionKey> = route_table()
        .rules()
        .iter()
        .flat_map(|r| r.required.iter().cloned())
        .collect();

    fn collect(items: &[MenuItem], out: &mut Vec<PermissionKey>) {
        for item in items {
            out.extend(item.required.iter().cloned());
            collect(&item.children, out);
        }
    }
    collect(&menu_tree(), &mut keys);

    keys.sort();
    keys.dedup();

    let mut grouped: BTreeMap<String, Vec<PermissionKey>> = BTreeMap::new();
    for key in keys {
        grouped.entry(key.module().to_string()).or_default().push(key);
    }
    grouped
}
