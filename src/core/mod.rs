//! Core types shared across jbpm's dependency-resolution engine.
//!
//! - [`error`] — strongly-typed [`error::JbError`] plus a user-facing
//!   [`error::ErrorContext`] wrapper, in the same two-layer style the
//!   teacher project uses for CLI error reporting.

pub mod error;

pub use error::{ErrorContext, JbError, user_friendly_error};
