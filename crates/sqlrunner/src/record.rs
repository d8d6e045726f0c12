//! Record definitions: compile-time column mappings for structs.
//!
//! A record maps some of its fields to columns. Which column a field maps to
//! depends on the active [`TagFamily`]; a field with no name for the family is
//! left out of every statement and every scan. Embedded records are flattened
//! in place, in declaration order.
//!
//! Records are normally derived:
//!
//! ```ignore
//! use sqlrunner::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct Audit {
//!     #[orm(db = "created_by", json = "createdBy")]
//!     created_by: String,
//! }
//!
//! #[derive(Debug, Default, Record)]
//! #[orm(table = "users")]
//! struct User {
//!     #[orm(db = "id", json = "id")]
//!     id: i64,
//!     #[orm(db = "user_name", json = "userName")]
//!     name: String,
//!     #[orm(db = "-", json = "secret")]
//!     secret: String,
//!     #[orm(flatten)]
//!     audit: Option<Audit>,
//! }
//! ```

use crate::error::{RunnerError, RunnerResult};
use crate::value::{FromValue, Value};
use std::fmt;

/// Naming convention used to resolve a field's column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagFamily {
    /// Database column names (`#[orm(db = "...")]`).
    #[default]
    Db,
    /// JSON-style names (`#[orm(json = "...")]`).
    Json,
}

impl TagFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            TagFamily::Db => "db",
            TagFamily::Json => "json",
        }
    }
}

impl fmt::Display for TagFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A struct whose fields map to columns.
///
/// Usually implemented with `#[derive(Record)]`. All three methods must visit
/// fields in the same order so that columns, values and scan targets line up.
pub trait Record: Default {
    /// Push every mapped column name for `family`.
    fn push_columns(family: TagFamily, out: &mut Vec<&'static str>);

    /// Push `(column, value)` for every mapped field.
    ///
    /// Fails when an optional embed is `None`.
    fn push_values(
        &self,
        family: TagFamily,
        out: &mut Vec<(&'static str, Value)>,
    ) -> RunnerResult<()>;

    /// Push a scan target for every mapped field.
    fn push_targets<'a>(&'a mut self, family: TagFamily, out: &mut Vec<ScanTarget<'a>>);
}

/// A record type bound to a table.
pub trait TableName {
    fn table_name() -> &'static str;
}

/// Something that can be flattened into an enclosing record.
///
/// Implemented by every derived record, and for `Option<R>` and `Box<R>`.
pub trait Embedded {
    fn embed_columns(family: TagFamily, out: &mut Vec<&'static str>);

    fn embed_values(
        &self,
        family: TagFamily,
        out: &mut Vec<(&'static str, Value)>,
    ) -> RunnerResult<()>;

    fn embed_targets<'a>(&'a mut self, family: TagFamily, out: &mut Vec<ScanTarget<'a>>);
}

/// An optional embed must be `Some` to be written; scanning materializes
/// `R::default()` before filling its fields.
impl<R: Record> Embedded for Option<R> {
    fn embed_columns(family: TagFamily, out: &mut Vec<&'static str>) {
        R::push_columns(family, out);
    }

    fn embed_values(
        &self,
        family: TagFamily,
        out: &mut Vec<(&'static str, Value)>,
    ) -> RunnerResult<()> {
        match self {
            Some(inner) => inner.push_values(family, out),
            None => {
                let mut columns = Vec::new();
                R::push_columns(family, &mut columns);
                Err(RunnerError::build(format!(
                    "embedded `{}` is None; set it before writing its columns ({})",
                    std::any::type_name::<R>(),
                    columns.join(", ")
                )))
            }
        }
    }

    fn embed_targets<'a>(&'a mut self, family: TagFamily, out: &mut Vec<ScanTarget<'a>>) {
        self.get_or_insert_with(R::default).push_targets(family, out);
    }
}

impl<R: Record> Embedded for Box<R> {
    fn embed_columns(family: TagFamily, out: &mut Vec<&'static str>) {
        R::push_columns(family, out);
    }

    fn embed_values(
        &self,
        family: TagFamily,
        out: &mut Vec<(&'static str, Value)>,
    ) -> RunnerResult<()> {
        (**self).push_values(family, out)
    }

    fn embed_targets<'a>(&'a mut self, family: TagFamily, out: &mut Vec<ScanTarget<'a>>) {
        (**self).push_targets(family, out);
    }
}

/// A field location a result column is decoded into.
pub trait ScanSlot {
    fn scan(&mut self, value: Value) -> RunnerResult<()>;
}

impl<T: FromValue> ScanSlot for T {
    fn scan(&mut self, value: Value) -> RunnerResult<()> {
        *self = T::from_value(value)?;
        Ok(())
    }
}

/// Column name plus a mutable borrow of the field it fills.
pub struct ScanTarget<'a> {
    column: &'static str,
    slot: &'a mut (dyn ScanSlot + 'a),
}

impl<'a> ScanTarget<'a> {
    pub fn new<T: FromValue>(column: &'static str, slot: &'a mut T) -> Self {
        Self { column, slot }
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    /// Decode `value` into the field; decode errors carry this target's column.
    pub fn scan(&mut self, value: Value) -> RunnerResult<()> {
        self.slot.scan(value).map_err(|e| e.for_column(self.column))
    }
}

impl fmt::Debug for ScanTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanTarget")
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}
