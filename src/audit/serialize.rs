//! Value conversion for audit payloads
//!
//! Column values are reduced to a display-safe form before they reach the
//! log: enumerations become their symbolic name and lists are converted
//! element-wise. The result only needs to read well, not round-trip into the
//! original typed value.

use serde_json::{Number, Value};
use tracing::warn;

use crate::session::ColumnValue;

use super::record::ChangeSet;

/// Longest string shown verbatim by [`format_value`]
const MAX_DISPLAY_LEN: usize = 50;

/// Reduce a column value to its display-safe form
pub fn display_safe(value: &ColumnValue) -> ColumnValue {
    match value {
        ColumnValue::Enum { name, .. } => ColumnValue::Text((*name).to_string()),
        ColumnValue::List(items) => ColumnValue::List(items.iter().map(display_safe).collect()),
        other => other.clone(),
    }
}

/// Convert a column value to JSON
///
/// Never fails: a float JSON cannot represent is written as its string form.
pub fn to_json_value(value: &ColumnValue) -> Value {
    match display_safe(value) {
        ColumnValue::Null => Value::Null,
        ColumnValue::Bool(b) => Value::Bool(b),
        ColumnValue::Integer(i) => Value::Number(i.into()),
        ColumnValue::Float(f) => match Number::from_f64(f) {
            Some(n) => Value::Number(n),
            None => {
                warn!(value = %f, "non-finite float written to audit log as text");
                Value::String(f.to_string())
            }
        },
        ColumnValue::Text(s) => Value::String(s),
        ColumnValue::Timestamp(ts) => Value::String(ts.to_rfc3339()),
        ColumnValue::Enum { name, .. } => Value::String(name.to_string()),
        ColumnValue::List(items) => Value::Array(items.iter().map(to_json_value).collect()),
    }
}

/// Format a JSON value for human-readable display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            // Truncate long strings
            if s.chars().count() > MAX_DISPLAY_LEN {
                let head: String = s.chars().take(MAX_DISPLAY_LEN - 3).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

/// One-line summary of a change set: `col: old -> new, ...`
pub fn summarize_changes(changes: &ChangeSet) -> String {
    changes
        .iter()
        .map(|(column, change)| {
            format!(
                "{}: {} -> {}",
                column,
                format_value(&change.old),
                format_value(&change.new)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::record::FieldChange;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn status(name: &'static str) -> ColumnValue {
        ColumnValue::Enum {
            type_name: "IncidentStatus",
            name,
            value: "ignored",
        }
    }

    #[test]
    fn test_enum_reduced_to_name() {
        assert_eq!(display_safe(&status("Filed")), ColumnValue::Text("Filed".into()));
        assert_eq!(to_json_value(&status("Filed")), json!("Filed"));
    }

    #[test]
    fn test_list_mapped_element_wise() {
        let roles = ColumnValue::List(vec![status("Active"), ColumnValue::Integer(1)]);
        assert_eq!(to_json_value(&roles), json!(["Active", 1]));
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(to_json_value(&ColumnValue::Null), Value::Null);
        assert_eq!(to_json_value(&ColumnValue::Bool(true)), json!(true));
        assert_eq!(to_json_value(&ColumnValue::Float(1.5)), json!(1.5));
        assert_eq!(to_json_value(&ColumnValue::Text("A".into())), json!("A"));

        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            to_json_value(&ColumnValue::Timestamp(ts)),
            json!("2024-03-01T12:00:00+00:00")
        );
    }

    #[test]
    fn test_non_finite_float_falls_back_to_text() {
        assert_eq!(to_json_value(&ColumnValue::Float(f64::NAN)), json!("NaN"));
        assert_eq!(to_json_value(&ColumnValue::Float(f64::INFINITY)), json!("inf"));
    }

    #[test]
    fn test_format_truncates_long_strings() {
        let long = "x".repeat(80);
        let formatted = format_value(&json!(long));
        assert!(formatted.ends_with("...\""));
        assert_eq!(formatted.len(), 47 + 5);
    }

    #[test]
    fn test_summarize_is_deterministic() {
        let mut changes = ChangeSet::new();
        changes.insert("summary".into(), FieldChange::new(json!("A"), json!("B")));
        changes.insert("city".into(), FieldChange::new(json!(""), json!("Austin")));

        assert_eq!(
            summarize_changes(&changes),
            "city: \"\" -> \"Austin\", summary: \"A\" -> \"B\""
        );
    }
}
