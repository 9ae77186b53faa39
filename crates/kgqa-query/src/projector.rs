//! Answer projection: fills the open tokens of an answer pattern from a record.

use std::collections::HashMap;

use kgqa_core::store::{FieldValue, ResultRow};
use kgqa_parser::Pattern;

/// Render `answer` with each `%KEY%` replaced by the record's field `KEY`.
///
/// Tokens with no matching field are left as written.
#[must_use]
pub fn project(answer: &Pattern, row: &ResultRow) -> String {
    let values: HashMap<String, String> = row
        .fields
        .iter()
        .filter_map(|(name, value)| field_text(value).map(|text| (name.clone(), text)))
        .collect();

    let projected = answer.substitute(&values);
    if !projected.is_resolved() {
        tracing::debug!(
            open = ?projected.placeholders().collect::<Vec<_>>(),
            "answer tokens without a matching field"
        );
    }
    projected.render()
}

/// Display text of a field. A relationship shows its first type name.
#[must_use]
pub fn field_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Scalar(v) => Some(value_to_display(v)),
        FieldValue::Relationship(types) => types.first().cloned(),
    }
}

pub(crate) fn value_to_display(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgqa_parser::parse_pattern;
    use serde_json::json;

    #[test]
    fn fills_scalar_fields() {
        let answer = parse_pattern("周杰伦的身高是%ANS%").unwrap();
        let row = ResultRow::new().with("ANS", "175cm");
        assert_eq!(project(&answer, &row), "周杰伦的身高是175cm");
    }

    #[test]
    fn relationship_uses_first_type() {
        let answer = parse_pattern("X和Y的关系是%REL%").unwrap();
        let row = ResultRow::new().with(
            "REL",
            FieldValue::Relationship(vec!["同学".to_string(), "朋友".to_string()]),
        );
        assert_eq!(project(&answer, &row), "X和Y的关系是同学");
    }

    #[test]
    fn non_string_scalars_render_as_json() {
        let answer = parse_pattern("%N% / %F% / %Z%").unwrap();
        let row = ResultRow::new()
            .with("N", json!(3))
            .with("F", json!(true))
            .with("Z", json!(null));
        assert_eq!(project(&answer, &row), "3 / true / null");
    }

    #[test]
    fn unknown_tokens_stay_open() {
        let answer = parse_pattern("%ANS% and %MISSING%").unwrap();
        let row = ResultRow::new().with("ANS", "a");
        assert_eq!(project(&answer, &row), "a and %MISSING%");

        let empty_rel = ResultRow::new().with("ANS", FieldValue::Relationship(vec![]));
        assert_eq!(project(&answer, &empty_rel), "%ANS% and %MISSING%");
    }
}
