//! `hrms-console`
//!
//! **Responsibility:** glue between the authorization core and the screens.
//!
//! This crate provides:
//! - `ConsoleShell`: navigation driver wiring the route gate, the menu filter
//!   and the expansion state to the session provider
//! - Session persistence across reloads (file on native, local storage in
//!   the browser)
//! - A Leptos frontend (wasm32) rendering the sidebar and guarded routes
//!
//! Screens themselves (CRUD forms, payroll, reports) are external.

pub mod config;
pub mod persist;
pub mod shell;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod frontend;

pub use config::ConsoleConfig;
pub use persist::PersistedSession;
pub use shell::ConsoleShell;
pub use types::NavigationOutcome;

#[cfg(not(target_arch = "wasm32"))]
pub use shell::bootstrap;
