//! Structured SQL builders.
//!
//! ## Design
//!
//! - SQL is still explicit (strings), but common patterns are structured.
//! - Placeholders are the positional, untyped `?`; the Nth `?` binds the Nth
//!   argument of the rendered [`Statement`](crate::Statement).
//! - WHERE conditions live in a [`Predicate`] that SELECT, UPDATE and DELETE
//!   borrow at build time, so one set of conditions drives all three.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;
pub mod where_builder;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;
pub use where_builder::{Op, Predicate};

use crate::error::RunnerError;

/// Message of an error deferred to `build()`, without a second "Build error:" prefix.
fn build_message(err: RunnerError) -> String {
    match err {
        RunnerError::Build(message) => message,
        other => other.to_string(),
    }
}
