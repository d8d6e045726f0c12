//! # sqlrunner
//!
//! A fluent SQL statement builder with record mapping, for `?`-placeholder
//! dialects.
//!
//! ## Features
//!
//! - **SQL explicit**: statements are plain text with positional `?` arguments
//! - **Compile-time mapping**: `#[derive(Record)]` maps fields to columns per tag family
//! - **Shared predicate**: one set of conditions drives SELECT, UPDATE and DELETE
//! - **Executor-agnostic**: anything implementing [`Executor`] can run statements
//! - **Statement diagnostics**: opt-in events to a [`SqlSink`](monitor::SqlSink)
//!
//! ## Example
//!
//! ```ignore
//! use sqlrunner::prelude::*;
//!
//! #[derive(Debug, Default, Record)]
//! #[orm(table = "users")]
//! struct User {
//!     #[orm(db = "id")]
//!     id: i64,
//!     #[orm(db = "user_name")]
//!     name: String,
//! }
//!
//! let db = SqliteExecutor::open_in_memory()?;
//! let mut runner = Runner::new(&db);
//! runner.table_of::<User>();
//! runner.insert(&User { id: 1, name: "alice".into() }).await?;
//!
//! runner.and_eq("id", 1);
//! let user: User = runner.get().await?;
//! runner.update_values([("user_name", "alicia")]).await?;
//! ```

extern crate self as sqlrunner;

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod mapper;
pub mod monitor;
pub mod prelude;
pub mod record;
pub mod row;
pub mod runner;
pub mod statement;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use builder::{DeleteBuilder, InsertBuilder, Op, Predicate, SelectBuilder, UpdateBuilder};
pub use client::{ExecResult, Executor};
pub use config::RunnerConfig;
pub use error::{RunnerError, RunnerResult};
pub use monitor::{NoopSink, QueryType, SqlEvent, SqlOutcome, SqlSink, StatsSink, TracingSink};
pub use record::{Embedded, Record, ScanSlot, ScanTarget, TableName, TagFamily};
pub use row::Row;
pub use runner::Runner;
pub use statement::Statement;
pub use value::{FromValue, ToValue, Value};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;

#[cfg(feature = "derive")]
pub use sqlrunner_derive::Record;
