//! Field mapping between records, column lists and result rows.
//!
//! Row scanning is purely positional: the Nth result column is decoded into
//! the Nth scan target. Everything here preserves declaration order, and
//! [`align_targets`] re-orders targets to an explicit SELECT column order.

use crate::error::{RunnerError, RunnerResult};
use crate::record::{Record, ScanTarget, TagFamily};
use crate::row::Row;
use crate::value::Value;

fn allowed(allow: &[String], column: &str) -> bool {
    allow.is_empty() || allow.iter().any(|c| c == column)
}

/// All mapped columns of `R` for `family`, embeds flattened in place.
pub fn mapped_columns<R: Record>(family: TagFamily) -> Vec<&'static str> {
    let mut out = Vec::new();
    R::push_columns(family, &mut out);
    out
}

/// `(column, value)` pairs of `record`.
///
/// A non-empty `allow` list keeps only the listed columns. A `None` optional
/// embed is a build error.
pub fn column_values<R: Record>(
    record: &R,
    family: TagFamily,
    allow: &[String],
) -> RunnerResult<Vec<(&'static str, Value)>> {
    let mut out = Vec::new();
    record.push_values(family, &mut out)?;
    out.retain(|(column, _)| allowed(allow, column));
    Ok(out)
}

/// Scan targets into `record`, in declaration order.
///
/// A non-empty `allow` list keeps only the listed columns.
pub fn scan_targets<'a, R: Record>(
    record: &'a mut R,
    family: TagFamily,
    allow: &[String],
) -> Vec<ScanTarget<'a>> {
    let mut out = Vec::new();
    record.push_targets(family, &mut out);
    out.retain(|target| allowed(allow, target.column()));
    out
}

/// Re-order `targets` to follow `selected`.
///
/// Every selected column must have a target.
pub fn align_targets<'a>(
    targets: Vec<ScanTarget<'a>>,
    selected: &[String],
) -> RunnerResult<Vec<ScanTarget<'a>>> {
    let mut pending: Vec<Option<ScanTarget<'a>>> = targets.into_iter().map(Some).collect();
    let mut aligned = Vec::with_capacity(selected.len());
    for column in selected {
        let slot = pending
            .iter_mut()
            .find(|t| t.as_ref().is_some_and(|t| t.column() == column.as_str()))
            .and_then(Option::take)
            .ok_or_else(|| {
                RunnerError::usage(format!(
                    "selected column `{column}` is not mapped by the destination record"
                ))
            })?;
        aligned.push(slot);
    }
    Ok(aligned)
}

/// Copy `row` into `targets` position by position.
pub fn scan_row(targets: Vec<ScanTarget<'_>>, row: Row) -> RunnerResult<()> {
    if targets.len() != row.len() {
        let column = targets.first().map(|t| t.column()).unwrap_or("*");
        return Err(RunnerError::decode(
            column,
            format!(
                "query returned {} columns but the destination maps {}",
                row.len(),
                targets.len()
            ),
        ));
    }
    for (mut target, value) in targets.into_iter().zip(row.into_values()) {
        target.scan(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Embedded, ScanTarget};

    #[derive(Debug, Default, PartialEq)]
    struct Keys {
        key1: String,
        key2: String,
    }

    impl Record for Keys {
        fn push_columns(family: TagFamily, out: &mut Vec<&'static str>) {
            match family {
                TagFamily::Json => out.extend(["key1", "key2"]),
                TagFamily::Db => out.push("k1"),
            }
        }

        fn push_values(
            &self,
            family: TagFamily,
            out: &mut Vec<(&'static str, Value)>,
        ) -> RunnerResult<()> {
            match family {
                TagFamily::Json => {
                    out.push(("key1", Value::from(self.key1.as_str())));
                    out.push(("key2", Value::from(self.key2.as_str())));
                }
                TagFamily::Db => out.push(("k1", Value::from(self.key1.as_str()))),
            }
            Ok(())
        }

        fn push_targets<'a>(&'a mut self, family: TagFamily, out: &mut Vec<ScanTarget<'a>>) {
            match family {
                TagFamily::Json => {
                    out.push(ScanTarget::new("key1", &mut self.key1));
                    out.push(ScanTarget::new("key2", &mut self.key2));
                }
                TagFamily::Db => out.push(ScanTarget::new("k1", &mut self.key1)),
            }
        }
    }

    #[derive(Debug, Default)]
    struct Outer {
        id: i64,
        keys: Option<Keys>,
    }

    impl Record for Outer {
        fn push_columns(family: TagFamily, out: &mut Vec<&'static str>) {
            out.push("id");
            <Option<Keys> as Embedded>::embed_columns(family, out);
        }

        fn push_values(
            &self,
            family: TagFamily,
            out: &mut Vec<(&'static str, Value)>,
        ) -> RunnerResult<()> {
            out.push(("id", Value::Int(self.id)));
            self.keys.embed_values(family, out)
        }

        fn push_targets<'a>(&'a mut self, family: TagFamily, out: &mut Vec<ScanTarget<'a>>) {
            out.push(ScanTarget::new("id", &mut self.id));
            self.keys.embed_targets(family, out);
        }
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn family_selects_the_mapping() {
        assert_eq!(mapped_columns::<Keys>(TagFamily::Json), ["key1", "key2"]);
        assert_eq!(mapped_columns::<Keys>(TagFamily::Db), ["k1"]);
    }

    #[test]
    fn embeds_flatten_in_declaration_order() {
        assert_eq!(
            mapped_columns::<Outer>(TagFamily::Json),
            ["id", "key1", "key2"]
        );
    }

    #[test]
    fn present_optional_embed_writes_its_fields() {
        let outer = Outer {
            id: 9,
            keys: Some(Keys {
                key1: "a".into(),
                key2: "b".into(),
            }),
        };
        let values = column_values(&outer, TagFamily::Json, &[]).unwrap();
        assert_eq!(
            values,
            vec![
                ("id", Value::Int(9)),
                ("key1", Value::from("a")),
                ("key2", Value::from("b")),
            ]
        );
    }

    #[test]
    fn absent_optional_embed_is_a_build_error() {
        let outer = Outer { id: 9, keys: None };
        let err = column_values(&outer, TagFamily::Json, &[]).unwrap_err();
        assert!(err.is_build());
        assert!(err.to_string().contains("key1, key2"));
    }

    #[test]
    fn optional_embed_is_materialized_for_scanning() {
        let mut outer = Outer::default();
        let targets = scan_targets(&mut outer, TagFamily::Json, &[]);
        assert_eq!(targets.len(), mapped_columns::<Outer>(TagFamily::Json).len());
        drop(targets);
        assert!(outer.keys.is_some());
    }

    #[test]
    fn allow_list_filters_values_and_targets() {
        let keys = Keys {
            key1: "a".into(),
            key2: "b".into(),
        };
        let values = column_values(&keys, TagFamily::Json, &cols(&["key2"])).unwrap();
        assert_eq!(values, vec![("key2", Value::from("b"))]);

        let mut dest = Keys::default();
        let targets = scan_targets(&mut dest, TagFamily::Json, &cols(&["key2"]));
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].column(), "key2");
    }

    #[test]
    fn subset_scan_leaves_other_fields_default() {
        let mut dest = Keys::default();
        let selected = cols(&["key1"]);
        let targets = scan_targets(&mut dest, TagFamily::Json, &selected);
        scan_row(targets, Row::from_pairs([("key1", "value1")])).unwrap();
        assert_eq!(
            dest,
            Keys {
                key1: "value1".into(),
                key2: String::new(),
            }
        );
    }

    #[test]
    fn align_follows_select_order() {
        let mut dest = Keys::default();
        let selected = cols(&["key2", "key1"]);
        let targets = scan_targets(&mut dest, TagFamily::Json, &selected);
        let aligned = align_targets(targets, &selected).unwrap();
        scan_row(aligned, Row::from_pairs([("key2", "two"), ("key1", "one")])).unwrap();
        assert_eq!(dest.key1, "one");
        assert_eq!(dest.key2, "two");
    }

    #[test]
    fn align_rejects_unmapped_column() {
        let mut dest = Keys::default();
        let selected = cols(&["key1", "missing"]);
        let targets = scan_targets(&mut dest, TagFamily::Json, &selected);
        let err = align_targets(targets, &selected).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn column_count_mismatch_is_a_decode_error() {
        let mut dest = Keys::default();
        let targets = scan_targets(&mut dest, TagFamily::Json, &[]);
        let err = scan_row(targets, Row::from_pairs([("key1", "x")])).unwrap_err();
        assert!(matches!(err, RunnerError::Decode { .. }));
    }
}
