//! `hrms-auth` — session identity and permission state for the HR console.
//!
//! This crate is intentionally decoupled from HTTP, routing and rendering:
//! it owns the permission vocabulary, the process-wide [`PermissionStore`]
//! and its single writer, the [`SessionProvider`].

pub mod identity;
pub mod permissions;
pub mod session;
pub mod store;
pub mod window;

pub use identity::{Identity, Session};
pub use permissions::{PermissionKey, PermissionMap, PermissionPayloadError, is_truthy};
pub use session::{LoginResponse, SessionError, SessionProvider};
pub use store::{PermissionSnapshot, PermissionStore, SubscriptionId};
pub use window::{SessionWindow, SessionWindowError};
