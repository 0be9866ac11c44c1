use serde::Serialize;
use serde_json::Value;

use super::fields::{resolve, to_id_string, Object};
use super::warning::{Context, Warning};

/// One option of a choice, with the label authors gave it (if any)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FromLabel {
    pub id: String,
    pub label: Option<String>,
}

/// Canonical "choose from" list: identifiers plus parallel labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FromList {
    pub ids: Vec<String>,
    pub labels: Vec<FromLabel>,
}

impl FromList {
    fn push(&mut self, id: String, label: Option<String>) {
        self.labels.push(FromLabel {
            id: id.clone(),
            label,
        });
        self.ids.push(id);
    }

    /// Labels are worth keeping only if some differ from their identifier
    pub fn has_meaningful_labels(&self) -> bool {
        self.labels
            .iter()
            .any(|l| l.label.as_deref() != Some(l.id.as_str()))
    }

    /// Write `from` (and `from_labels` when meaningful) into a payload
    pub fn attach_to(self, payload: &mut Object) {
        let keep_labels = self.has_meaningful_labels();
        let ids = self.ids.into_iter().map(Value::String).collect();
        payload.insert("from".to_string(), Value::Array(ids));
        if keep_labels {
            let labels = serde_json::to_value(&self.labels).unwrap_or(Value::Null);
            payload.insert("from_labels".to_string(), labels);
        }
    }
}

/// Canonicalize a heterogeneous "choose from" value.
///
/// Every list element yields exactly one identifier, malformed ones included.
/// A missing value is an empty list; any other non-list shape is reported as
/// `from_not_array`.
pub fn normalize_from(raw: Option<&Value>, ctx: &Context, warnings: &mut Vec<Warning>) -> FromList {
    let mut out = FromList::default();

    let items = match raw {
        None | Some(Value::Null) => return out,
        Some(Value::Array(items)) => items,
        Some(other) => {
            warnings.push(Warning::FromNotArray {
                context: ctx.clone(),
                value: other.clone(),
            });
            if let Value::String(s) = other {
                out.push(s.clone(), Some(s.clone()));
            }
            return out;
        }
    };

    for item in items {
        match item {
            Value::String(s) => out.push(s.clone(), Some(s.clone())),
            Value::Object(map) => match option_id(map) {
                Some(id) => {
                    let label = resolve([(Some(map), "label"), (Some(map), "name"), (Some(map), "title")])
                        .map(to_id_string);
                    out.push(id, label);
                }
                None => {
                    let s = item.to_string();
                    out.push(s.clone(), Some(s));
                }
            },
            other => {
                let s = to_id_string(other);
                out.push(s.clone(), Some(s));
            }
        }
    }

    out
}

fn option_id(map: &Object) -> Option<String> {
    resolve([
        (Some(map), "id"),
        (Some(map), "value"),
        (Some(map), "key"),
        (Some(map), "name"),
    ])
    .map(to_id_string)
    .filter(|id| !id.is_empty())
}
