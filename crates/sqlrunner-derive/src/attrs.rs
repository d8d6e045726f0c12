//! Attribute parsing for the Record derive macro.
//!
//! Handles struct-level and field-level `#[orm(...)]` attributes.

use syn::{DeriveInput, Field, LitStr, Result};

/// Marker excluding a field from one tag family.
const SKIP: &str = "-";

/// Struct-level attributes.
#[derive(Default)]
pub(crate) struct StructAttrs {
    pub table: Option<String>,
}

/// Field-level attributes.
///
/// `db`/`json` name the column per tag family; `column` names both.
#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub db: Option<String>,
    pub json: Option<String>,
    pub flatten: bool,
}

fn normalize(name: Option<String>) -> Option<String> {
    name.filter(|n| !n.is_empty() && n != SKIP)
}

impl FieldAttrs {
    /// Column for the `db` family, `None` when excluded.
    pub fn db_column(&self) -> Option<String> {
        normalize(self.db.clone())
    }

    /// Column for the `json` family, `None` when excluded.
    pub fn json_column(&self) -> Option<String> {
        normalize(self.json.clone())
    }
}

pub(crate) fn parse_struct_attrs(input: &DeriveInput) -> Result<StructAttrs> {
    let mut attrs = StructAttrs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().trim().is_empty() {
                    return Err(meta.error("table name cannot be empty"));
                }
                attrs.table = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported #[orm] struct attribute; expected `table`"))
            }
        })?;
    }
    Ok(attrs)
}

pub(crate) fn parse_field_attrs(field: &Field) -> Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    let mut column: Option<String> = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("db") {
                attrs.db = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("json") {
                attrs.json = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("column") {
                column = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("flatten") {
                attrs.flatten = true;
            } else {
                return Err(meta.error(
                    "unsupported #[orm] field attribute; expected `db`, `json`, `column` or `flatten`",
                ));
            }
            Ok(())
        })?;
    }

    if let Some(column) = column {
        attrs.db.get_or_insert_with(|| column.clone());
        attrs.json.get_or_insert(column);
    }
    if attrs.flatten && (attrs.db.is_some() || attrs.json.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "#[orm(flatten)] cannot be combined with column names",
        ));
    }
    Ok(attrs)
}
