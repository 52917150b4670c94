//! `hrms-core` — foundation building blocks shared by the HR console crates.
//!
//! This crate contains **pure** primitives (no I/O, no UI concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{SessionId, UserId};
