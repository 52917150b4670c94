//! `hrms-navigation` — permission-gated routing and sidebar navigation.
//!
//! Two consumers read the same permission vocabulary:
//! - the [`RouteGate`] decides whether a path renders or redirects;
//! - the menu filter ([`filter_menu`]) decides which sidebar links are shown.
//!
//! Both are pure, synchronous and total over their inputs. The
//! [`audit_consistency`] check verifies statically that a visible link never
//! leads to a route the gate would deny.

pub mod catalog;
pub mod consistency;
pub mod expansion;
pub mod gate;
pub mod menu;
pub mod path;
pub mod routes;

pub use consistency::{ConsistencyReport, Divergence, audit_consistency, visible_but_denied};
pub use expansion::ExpansionState;
pub use gate::{GateDecision, GateExplanation, RedirectReason, RouteGate};
pub use menu::{MenuItem, VisibleMenu, VisibleMenuItem, filter_menu};
pub use path::{RouteParams, RoutePattern, normalize_path};
pub use routes::{LOGIN_PATH, MatchMode, RouteRule, RouteTable, UNAUTHORIZED_PATH};
