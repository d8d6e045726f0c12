//! Derive macros for sqlrunner
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod common;
mod record;

/// Derive `Record` (and `Embedded`) for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use sqlrunner::Record;
///
/// #[derive(Debug, Default, Record)]
/// #[orm(table = "users")]
/// struct User {
///     #[orm(db = "id", json = "id")]
///     id: i64,
///     #[orm(db = "user_name", json = "userName")]
///     name: String,
///     #[orm(column = "email")]
///     email: Option<String>,
///     #[orm(db = "-", json = "token")]
///     token: String,
///     #[orm(flatten)]
///     audit: Option<Audit>,
///     // no attribute: never mapped
///     cache: Vec<u8>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Bind the struct to a table (generates `TableName`)
/// - `#[orm(db = "name")]` - Column name for the `db` tag family
/// - `#[orm(json = "name")]` - Column name for the `json` tag family
/// - `#[orm(column = "name")]` - Column name for both families
/// - `#[orm(flatten)]` - Expand an embedded record in place (`R`, `Option<R>` or `Box<R>`)
///
/// An empty name or `"-"` excludes the field from that family.
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
