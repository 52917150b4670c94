//! Process-wide logging setup for the HR console.

/// Tracing configuration (filters, layers).
pub mod tracing;
