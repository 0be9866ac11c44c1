use serde_json::Value;

use super::effect::{as_list, normalize_effect, normalize_effect_object};
use super::fields::{field, has, has_any, object_at, Object};
use super::warning::{Context, Warning};
use super::RawValue;

/// Author-facing prose restored verbatim on single-record files
const METADATA_FIELDS: [&str; 3] = ["nom", "name", "description"];

/// The top-level shapes a content file can take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileShape {
    /// An object with a `features` list (class and race files)
    FeatureWrapper,
    /// A bare list of effects or other values
    EffectList,
    /// A single feature or effect object
    SingleRecord,
    Unknown,
}

impl FileShape {
    pub fn classify(value: &Value) -> Self {
        match RawValue::from(value) {
            RawValue::Object(map) if matches!(map.get("features"), Some(Value::Array(_))) => {
                FileShape::FeatureWrapper
            }
            RawValue::List(_) => FileShape::EffectList,
            RawValue::Object(map) if has_any(map, &["id", "type", "effects", "mecanique"]) => {
                FileShape::SingleRecord
            }
            RawValue::Object(_) | RawValue::Scalar(_) => FileShape::Unknown,
        }
    }
}

/// Normalize a whole parsed file, choosing the transformation by its shape.
///
/// Always produces output: unrecognized shapes are returned unchanged with a
/// `file_unknown_shape` warning.
pub fn normalize_file(value: &Value, ctx: &Context, warnings: &mut Vec<Warning>) -> Value {
    match (FileShape::classify(value), value) {
        (FileShape::FeatureWrapper, Value::Object(map)) => normalize_feature_wrapper(map, ctx, warnings),
        (FileShape::EffectList, Value::Array(items)) => normalize_effect_list(items, ctx, warnings),
        (FileShape::SingleRecord, Value::Object(map)) => normalize_single_record(map, ctx, warnings),
        _ => {
            warnings.push(Warning::FileUnknownShape {
                context: ctx.clone(),
                file: ctx.file.clone(),
            });
            value.clone()
        }
    }
}

fn normalize_feature_wrapper(map: &Object, ctx: &Context, warnings: &mut Vec<Warning>) -> Value {
    let mut out = map.clone();
    let features = map.get("features").and_then(Value::as_array).cloned().unwrap_or_default();

    let mut normalized = Vec::with_capacity(features.len());
    for feature in &features {
        normalized.push(normalize_feature(feature, ctx, warnings));
    }

    out.insert("features".to_string(), Value::Array(normalized));
    Value::Object(out)
}

fn normalize_feature(feature: &Value, ctx: &Context, warnings: &mut Vec<Warning>) -> Value {
    let Value::Object(original) = feature else {
        return normalize_effect(feature, ctx, warnings);
    };

    let feature_id = field(Some(original), "id").cloned();
    let feature_ctx = ctx.clone().with_feature_id(feature_id.clone());

    let mut nf = original.clone();
    if promote_mecanique(&mut nf) {
        warnings.push(Warning::FeatureMecaniqueMapped {
            context: feature_ctx.clone(),
            file: ctx.file.clone(),
            feature_id: feature_id.clone(),
        });
    }
    normalize_nested_effects(&mut nf, &feature_ctx, warnings);

    let mut out = normalize_effect_object(&nf, &feature_ctx, warnings).into_object();

    // The authored id wins over anything the fallback chains produced
    let id = feature_id
        .or_else(|| field(Some(&out), "id").cloned())
        .or_else(|| field(object_at(&out, "payload"), "feature_id").cloned())
        .unwrap_or(Value::Null);
    out.insert("id".to_string(), id);

    Value::Object(out)
}

fn normalize_effect_list(items: &[Value], ctx: &Context, warnings: &mut Vec<Warning>) -> Value {
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let normalized = match item {
            Value::Object(map) if has_any(map, &["type", "effects", "mecanique"]) => {
                let item_ctx = ctx.clone().with_idx(idx);
                normalize_effect_object(map, &item_ctx, warnings).into_value()
            }
            other => other.clone(),
        };
        out.push(normalized);
    }
    Value::Array(out)
}

fn normalize_single_record(map: &Object, ctx: &Context, warnings: &mut Vec<Warning>) -> Value {
    let mut out = map.clone();
    promote_mecanique(&mut out);
    normalize_nested_effects(&mut out, ctx, warnings);

    let mut top = normalize_effect_object(&out, ctx, warnings).into_object();
    for key in METADATA_FIELDS {
        if let Some(value) = field(Some(map), key) {
            top.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(top)
}

/// Copy `mecanique` into `effects` when no effects exist yet
fn promote_mecanique(map: &mut Object) -> bool {
    if has(map, "effects") {
        return false;
    }
    let Some(mecanique) = field(Some(map), "mecanique") else {
        return false;
    };
    let effects = as_list(mecanique);
    map.insert("effects".to_string(), Value::Array(effects));
    true
}

fn normalize_nested_effects(map: &mut Object, ctx: &Context, warnings: &mut Vec<Warning>) {
    if let Some(Value::Array(effects)) = map.get_mut("effects") {
        for (idx, effect) in effects.iter_mut().enumerate() {
            let effect_ctx = ctx.clone().with_idx(idx);
            let normalized = normalize_effect(effect, &effect_ctx, warnings);
            *effect = normalized;
        }
    }
}
