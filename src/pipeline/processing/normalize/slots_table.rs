use serde_json::Value;

use super::fields::Object;
use super::warning::{Context, Warning};

/// Canonicalize a spell-slot table into a mapping.
///
/// Accepts a mapping as-is or a JSON-encoded mapping string. Every other
/// shape degrades to an empty mapping plus a warning; this never fails.
pub fn normalize_slots_table(raw: Option<&Value>, ctx: &Context, warnings: &mut Vec<Warning>) -> Object {
    match raw {
        None | Some(Value::Null) => Object::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warnings.push(Warning::SlotsTableParseNonObject {
                    context: ctx.clone(),
                    value: Value::String(s.clone()),
                });
                Object::new()
            }
            Err(e) => {
                warnings.push(Warning::SlotsTableParseError {
                    context: ctx.clone(),
                    value: Value::String(s.clone()),
                    message: e.to_string(),
                });
                Object::new()
            }
        },
        Some(other) => {
            warnings.push(Warning::SlotsTableUnknown {
                context: ctx.clone(),
                value: other.clone(),
            });
            Object::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Context {
        Context::for_file("classes/wizard.json")
    }

    #[test]
    fn test_mapping_passes_through() {
        let mut warnings = Vec::new();
        let raw = json!({ "1": 2, "2": 0 });
        let table = normalize_slots_table(Some(&raw), &ctx(), &mut warnings);
        assert_eq!(Value::Object(table), raw);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_encoded_mapping_is_parsed() {
        let mut warnings = Vec::new();
        let raw = json!(r#"{"1": 4, "2": 3}"#);
        let table = normalize_slots_table(Some(&raw), &ctx(), &mut warnings);
        assert_eq!(table.get("1"), Some(&json!(4)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_malformed_string_reports_parse_error() {
        let mut warnings = Vec::new();
        let raw = json!("{1: four");
        let table = normalize_slots_table(Some(&raw), &ctx(), &mut warnings);

        assert!(table.is_empty());
        assert_eq!(warnings.len(), 1);
        match &warnings[0] {
            Warning::SlotsTableParseError { message, value, .. } => {
                assert!(!message.is_empty());
                assert_eq!(value, &raw);
            }
            other => panic!("unexpected warning {:?}", other),
        }
    }

    #[test]
    fn test_encoded_non_mapping_is_rejected() {
        let mut warnings = Vec::new();
        let table = normalize_slots_table(Some(&json!("[1, 2]")), &ctx(), &mut warnings);
        assert!(table.is_empty());
        assert_eq!(warnings[0].kind(), "slots_table_parse_non_object");
    }

    #[test]
    fn test_other_shapes_are_unknown() {
        let mut warnings = Vec::new();
        assert!(normalize_slots_table(Some(&json!([2, 3])), &ctx(), &mut warnings).is_empty());
        assert!(normalize_slots_table(Some(&json!(4)), &ctx(), &mut warnings).is_empty());
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.kind() == "slots_table_unknown"));
    }
}
