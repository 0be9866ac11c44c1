//! Normalization engine for legacy content records.
//!
//! A parsed file goes through [`dispatch::normalize_file`], which picks a
//! transformation by the file's top-level shape and hands every feature or
//! effect it finds to [`effect::normalize_effect`]. That function recurses
//! into nested `effects`, leaning on [`from_list`] and [`slots_table`] for
//! the two fields with irregular container shapes. Anomalies never fail a
//! file: they are pushed onto the caller's warning list and a best-effort
//! canonical value is produced instead.

pub mod dispatch;
pub mod effect;
pub mod fields;
pub mod from_list;
pub mod slots_table;
pub mod warning;

use serde_json::Value;

pub use dispatch::{normalize_file, FileShape};
pub use effect::{normalize_effect, normalize_effect_object, CanonicalEffect};
pub use from_list::{normalize_from, FromLabel, FromList};
pub use slots_table::normalize_slots_table;
pub use warning::{Context, Warning};

use fields::Object;

/// A JSON value refined by its structural kind, checked once at the boundary
#[derive(Debug, Clone, Copy)]
pub enum RawValue<'a> {
    Scalar(&'a Value),
    Object(&'a Object),
    List(&'a [Value]),
}

impl<'a> From<&'a Value> for RawValue<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => RawValue::Object(map),
            Value::Array(items) => RawValue::List(items),
            other => RawValue::Scalar(other),
        }
    }
}

/// Canonical output for one file plus the warnings raised producing it
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    pub value: Value,
    pub warnings: Vec<Warning>,
}

/// Normalize one parsed file with a fresh warning list
pub fn normalize_document(value: &Value, ctx: &Context) -> NormalizedDocument {
    let mut warnings = Vec::new();
    let value = normalize_file(value, ctx, &mut warnings);
    NormalizedDocument { value, warnings }
}
