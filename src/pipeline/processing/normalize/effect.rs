use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use super::fields::{field, has, has_any, is_truthy, object_at, resolve, resolve_or, to_id_string, to_number, Object};
use super::from_list::normalize_from;
use super::slots_table::normalize_slots_table;
use super::warning::{Context, Warning};
use super::RawValue;

const CHOICE_TYPE: &str = "choice";
const GRANT_FEATURE_TYPE: &str = "grant_feature";
const SPELL_GRANT_TYPE: &str = "spell_grant";
const SPELLCASTING_TYPE: &str = "spellcasting_feature";

/// An effect (or effect-shaped feature) in canonical form.
///
/// Always carries `id`, `type`, `source`, `priority`, an object `payload`
/// and a `_normalized_from` trail. Unknown author fields are kept in place.
/// The payload is held apart from the other fields until the effect is
/// turned back into JSON, where it lands in its reserved key position.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEffect {
    fields: Object,
    payload: Object,
}

impl CanonicalEffect {
    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    pub fn kind(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    pub fn payload(&self) -> &Object {
        &self.payload
    }

    /// A top-level field other than `payload`
    pub fn get(&self, key: &str) -> Option<&Value> {
        match key {
            "payload" => None,
            _ => self.fields.get(key),
        }
    }

    pub fn effects(&self) -> Option<&Vec<Value>> {
        self.fields.get("effects").and_then(Value::as_array)
    }

    pub fn normalized_from(&self) -> &[Value] {
        self.fields
            .get("_normalized_from")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn into_object(self) -> Object {
        let mut fields = self.fields;
        fields.insert("payload".to_string(), Value::Object(self.payload));
        fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.into_object())
    }
}

impl Serialize for CanonicalEffect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.clone().into_object().serialize(serializer)
    }
}

/// Normalize any JSON value that might be an effect.
///
/// Non-objects are reported as `effect_not_object` and returned unchanged.
pub fn normalize_effect(raw: &Value, ctx: &Context, warnings: &mut Vec<Warning>) -> Value {
    match RawValue::from(raw) {
        RawValue::Object(map) => normalize_effect_object(map, ctx, warnings).into_value(),
        RawValue::List(_) | RawValue::Scalar(_) => {
            warnings.push(Warning::EffectNotObject {
                context: ctx.clone(),
                value: raw.clone(),
            });
            raw.clone()
        }
    }
}

/// Normalize one effect-shaped object, recursing into its nested `effects`.
///
/// `raw` is never modified; the result is built from a copy of it.
pub fn normalize_effect_object(raw: &Object, ctx: &Context, warnings: &mut Vec<Warning>) -> CanonicalEffect {
    let mut e = raw.clone();

    let mut payload = initial_payload(raw, ctx, warnings);

    let id = resolve_or(
        [
            (Some(raw), "id"),
            (Some(&payload), "id"),
            (Some(&payload), "feature_id"),
            (Some(&payload), "featureId"),
        ],
        Value::Null,
    );
    let kind = resolve_or([(Some(raw), "type"), (Some(&payload), "type")], Value::Null);
    let source = resolve([(Some(raw), "source"), (Some(&payload), "source")])
        .cloned()
        .or_else(|| ctx.source.clone().map(Value::String))
        .unwrap_or(Value::Null);
    let priority = resolve_or([(Some(raw), "priority"), (Some(&payload), "priority")], json!(0));

    e.insert("id".to_string(), id);
    e.insert("type".to_string(), kind);
    e.insert("source".to_string(), source);
    e.insert("priority".to_string(), priority);
    // Reserve the key's position; the payload itself travels beside the fields
    e.insert("payload".to_string(), Value::Null);

    match e.get("effects") {
        Some(Value::Array(_)) => {}
        Some(Value::Null) | None => {
            if let Some(mecanique) = field(Some(raw), "mecanique") {
                e.insert("effects".to_string(), Value::Array(as_list(mecanique)));
                warnings.push(Warning::MecaniqueMappedToEffects {
                    context: ctx.clone(),
                    file: ctx.file.clone(),
                });
            }
        }
        Some(lone) => {
            let wrapped = as_list(lone);
            e.insert("effects".to_string(), Value::Array(wrapped));
        }
    }

    let type_name = e.get("type").and_then(Value::as_str).map(str::to_string);
    let is_type = |name: &str| type_name.as_deref() == Some(name);

    if is_type(GRANT_FEATURE_TYPE) || has_any(&payload, &["feature_id", "featureId", "id", "feature"]) {
        let feature_id = resolve_or(
            [
                (Some(&payload), "feature_id"),
                (Some(&payload), "featureId"),
                (Some(&payload), "id"),
                (Some(&payload), "feature"),
            ],
            Value::Null,
        );
        if feature_id.is_null() {
            warnings.push(Warning::GrantFeatureNoId { context: ctx.clone() });
        }
        payload.insert("feature_id".to_string(), feature_id);
    }

    if is_type(SPELL_GRANT_TYPE) || has_any(&payload, &["spell_id", "spellId", "id"]) {
        let spell_id = resolve_or(
            [
                (Some(&payload), "spell_id"),
                (Some(&payload), "spellId"),
                (Some(&payload), "id"),
            ],
            Value::Null,
        );
        payload.insert("spell_id".to_string(), spell_id);
    }

    // A granted id found under an alias outside the id chain becomes the id
    if !has(&e, "id") {
        if let Some(feature_id) = field(Some(&payload), "feature_id") {
            e.insert("id".to_string(), feature_id.clone());
        }
    }

    if lowered_type(e.get("type")).contains(CHOICE_TYPE) {
        e.insert("type".to_string(), Value::String(CHOICE_TYPE.to_string()));

        let choose = resolve([
            (Some(&payload), "choose"),
            (Some(raw), "choose"),
            (Some(&payload), "count"),
            (Some(raw), "count"),
        ])
        .cloned();
        payload.insert("choose".to_string(), canonical_choose(choose, ctx, warnings));

        let from = resolve([(Some(&payload), "from"), (Some(raw), "from")]).cloned();
        normalize_from(from.as_ref(), ctx, warnings).attach_to(&mut payload);

        if !payload.contains_key("expertise") {
            if let Some(expertise) = field(Some(raw), "expertise") {
                payload.insert("expertise".to_string(), Value::Bool(is_truthy(expertise)));
            }
        }
    } else if has(&payload, "choose") || has(&payload, "from") {
        // Partially tagged legacy choices still get canonical shapes
        let choose = field(Some(&payload), "choose").cloned();
        payload.insert("choose".to_string(), canonical_choose(choose, ctx, warnings));

        if let Some(from) = field(Some(&payload), "from").cloned() {
            normalize_from(Some(&from), ctx, warnings).attach_to(&mut payload);
        }
    }

    let is_spellcasting = e.get("type").and_then(Value::as_str) == Some(SPELLCASTING_TYPE);
    if is_spellcasting || has(&payload, "slots_table") {
        let raw_payload = object_at(raw, "payload");
        let table = resolve([
            (Some(&payload), "slots_table"),
            (raw_payload, "slots_table"),
            (Some(raw), "slots_table"),
        ])
        .cloned();
        let table = normalize_slots_table(table.as_ref(), ctx, warnings);
        payload.insert("slots_table".to_string(), Value::Object(table));
    }

    if !has(&e, "conditions") {
        if let Some(conditions) = field(Some(&payload), "conditions") {
            e.insert("conditions".to_string(), conditions.clone());
        }
    }

    if let Some(Value::Array(children)) = e.get_mut("effects") {
        for (idx, child) in children.iter_mut().enumerate() {
            let child_ctx = ctx.clone().with_nested_index(idx);
            let normalized = normalize_effect(child, &child_ctx, warnings);
            *child = normalized;
        }
    }

    let entry = json!({ "file": ctx.file });
    let trail = match e.get("_normalized_from") {
        Some(Value::Array(previous)) => {
            let mut trail = previous.clone();
            trail.push(entry);
            trail
        }
        Some(Value::Null) | None => vec![entry],
        Some(other) => vec![other.clone(), entry],
    };
    e.insert("_normalized_from".to_string(), Value::Array(trail));

    CanonicalEffect { fields: e, payload }
}

fn initial_payload(raw: &Object, ctx: &Context, warnings: &mut Vec<Warning>) -> Object {
    match raw.get("payload") {
        Some(Value::Object(payload)) => payload.clone(),
        Some(Value::Null) | None => match raw.get("mecanique") {
            Some(Value::Object(mecanique)) => mecanique.clone(),
            _ => Object::new(),
        },
        Some(other) => {
            warnings.push(Warning::PayloadNotObject {
                context: ctx.clone(),
                value: other.clone(),
            });
            Object::new()
        }
    }
}

/// Wrap anything that is not already a list into a one-element list
pub(crate) fn as_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn lowered_type(kind: Option<&Value>) -> String {
    match kind {
        None | Some(Value::Null) => String::new(),
        Some(other) => to_id_string(other).to_lowercase(),
    }
}

fn canonical_choose(choose: Option<Value>, ctx: &Context, warnings: &mut Vec<Warning>) -> Value {
    let Some(choose) = choose else {
        return json!(1);
    };
    match to_number(&choose) {
        Some(n) => Value::Number(n),
        None => {
            warnings.push(Warning::ChooseNotNumeric {
                context: ctx.clone(),
                value: choose,
            });
            json!(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::for_file("features/test.json")
    }

    fn normalize(value: Value) -> (CanonicalEffect, Vec<Warning>) {
        let mut warnings = Vec::new();
        let map = value.as_object().cloned().unwrap();
        let effect = normalize_effect_object(&map, &ctx(), &mut warnings);
        (effect, warnings)
    }

    #[test]
    fn test_empty_object_gets_canonical_fields() {
        let (effect, warnings) = normalize(json!({}));
        assert_eq!(
            effect.clone().into_value(),
            json!({
                "id": null,
                "type": null,
                "source": null,
                "priority": 0,
                "payload": {},
                "_normalized_from": [{ "file": "features/test.json" }]
            })
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_identity_falls_back_to_payload() {
        let (effect, _) = normalize(json!({
            "payload": { "featureId": "second-wind", "type": "grant_feature", "priority": 5, "source": "phb" }
        }));
        assert_eq!(effect.id(), Some("second-wind"));
        assert_eq!(effect.kind(), Some("grant_feature"));
        assert_eq!(effect.get("priority"), Some(&json!(5)));
        assert_eq!(effect.get("source"), Some(&json!("phb")));
        assert_eq!(effect.payload()["feature_id"], json!("second-wind"));
    }

    #[test]
    fn test_context_source_is_last_resort() {
        let mut warnings = Vec::new();
        let map = json!({ "type": "note" }).as_object().cloned().unwrap();
        let ctx = ctx().with_source(Some("srd".to_string()));
        let effect = normalize_effect_object(&map, &ctx, &mut warnings);
        assert_eq!(effect.get("source"), Some(&json!("srd")));
    }

    #[test]
    fn test_grant_feature_without_id_warns() {
        let (effect, warnings) = normalize(json!({ "type": "grant_feature" }));
        assert_eq!(effect.payload()["feature_id"], Value::Null);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind(), "grant_feature_no_id");
    }

    #[test]
    fn test_grant_feature_aliases_unify() {
        for alias in ["feature_id", "featureId", "id", "feature"] {
            let (effect, warnings) = normalize(json!({
                "type": "grant_feature",
                "payload": { alias: "extra-attack" }
            }));
            assert_eq!(effect.payload()["feature_id"], json!("extra-attack"), "alias {}", alias);
            assert!(warnings.is_empty());
        }
    }

    #[test]
    fn test_granted_feature_alias_fills_missing_id() {
        let (effect, _) = normalize(json!({ "type": "grant_feature", "payload": { "feature": "darkvision" } }));
        assert_eq!(effect.id(), Some("darkvision"));

        let (again, _) = normalize(effect.into_value());
        assert_eq!(again.id(), Some("darkvision"));

        let (own, _) = normalize(json!({ "id": "racial", "payload": { "feature": "darkvision" } }));
        assert_eq!(own.id(), Some("racial"));
    }

    #[test]
    fn test_payload_is_held_beside_fields() {
        let (effect, _) = normalize(json!({ "zeta": 1, "payload": { "a": 1 }, "alpha": 2 }));
        assert_eq!(effect.payload(), json!({ "a": 1 }).as_object().unwrap());
        assert_eq!(effect.get("payload"), None);

        let keys: Vec<String> = effect.into_object().keys().cloned().collect();
        assert_eq!(keys[..3], ["zeta", "payload", "alpha"]);
    }

    #[test]
    fn test_spell_grant_aliases_unify_without_warning() {
        let (effect, warnings) = normalize(json!({ "type": "spell_grant", "payload": { "spellId": "light" } }));
        assert_eq!(effect.payload()["spell_id"], json!("light"));
        assert!(warnings.is_empty());

        let (effect, warnings) = normalize(json!({ "type": "spell_grant" }));
        assert_eq!(effect.payload()["spell_id"], Value::Null);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_choice_variants_are_canonicalized() {
        let (effect, warnings) = normalize(json!({
            "type": "Language_Choice",
            "payload": { "count": "2", "from": [{ "id": "elvish", "label": "Elvish" }, "dwarvish"] },
            "expertise": 1
        }));
        assert_eq!(effect.kind(), Some("choice"));
        assert_eq!(effect.payload()["choose"], json!(2));
        assert_eq!(effect.payload()["from"], json!(["elvish", "dwarvish"]));
        assert_eq!(
            effect.payload()["from_labels"],
            json!([{ "id": "elvish", "label": "Elvish" }, { "id": "dwarvish", "label": "dwarvish" }])
        );
        assert_eq!(effect.payload()["expertise"], json!(true));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_choice_without_from_defaults() {
        let (effect, warnings) = normalize(json!({ "type": "tool_choice" }));
        assert_eq!(effect.payload()["choose"], json!(1));
        assert_eq!(effect.payload()["from"], json!([]));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_non_numeric_choose_warns_and_defaults() {
        let (effect, warnings) = normalize(json!({ "type": "choice", "payload": { "choose": "two", "from": ["a"] } }));
        assert_eq!(effect.payload()["choose"], json!(1));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind(), "choose_not_numeric");
    }

    #[test]
    fn test_untagged_choice_shape_is_canonicalized() {
        let (effect, warnings) = normalize(json!({ "type": "bonus", "payload": { "from": "athletics" } }));
        assert_eq!(effect.kind(), Some("bonus"));
        assert_eq!(effect.payload()["choose"], json!(1));
        assert_eq!(effect.payload()["from"], json!(["athletics"]));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind(), "from_not_array");
    }

    #[test]
    fn test_spellcasting_slots_are_normalized() {
        let (effect, warnings) = normalize(json!({
            "type": "spellcasting_feature",
            "slots_table": "{\"1\": 2}"
        }));
        assert_eq!(effect.payload()["slots_table"], json!({ "1": 2 }));
        assert!(warnings.is_empty());

        let (effect, warnings) = normalize(json!({ "payload": { "slots_table": "oops" } }));
        assert_eq!(effect.payload()["slots_table"], json!({}));
        assert_eq!(warnings[0].kind(), "slots_table_parse_error");
    }

    #[test]
    fn test_conditions_are_promoted() {
        let (effect, _) = normalize(json!({ "payload": { "conditions": [{ "level": 3 }] } }));
        assert_eq!(effect.get("conditions"), Some(&json!([{ "level": 3 }])));

        let (effect, _) = normalize(json!({ "conditions": "keep", "payload": { "conditions": "other" } }));
        assert_eq!(effect.get("conditions"), Some(&json!("keep")));
    }

    #[test]
    fn test_mecanique_bridges_to_effects_and_payload() {
        let (effect, warnings) = normalize(json!({
            "id": "fighting-style",
            "mecanique": { "type": "grant_feature", "feature_id": "archery" }
        }));
        assert_eq!(effect.kind(), Some("grant_feature"));
        assert_eq!(effect.payload()["feature_id"], json!("archery"));

        let effects = effect.effects().unwrap();
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0]["payload"], json!({ "feature_id": null }));
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind(), "mecanique_mapped_to_effects");
        // Only the payload is searched for the granted id, and the nested copy has none
        assert_eq!(warnings[1].kind(), "grant_feature_no_id");
        assert_eq!(warnings[1].context().nested_index, Some(0));
    }

    #[test]
    fn test_existing_effects_win_over_mecanique() {
        let (effect, warnings) = normalize(json!({
            "effects": [{ "type": "a" }],
            "mecanique": [{ "type": "b" }, { "type": "c" }]
        }));
        let effects = effect.effects().unwrap();
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0]["type"], json!("a"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_lone_effects_object_is_wrapped() {
        let (effect, _) = normalize(json!({ "effects": { "type": "bonus" } }));
        let effects = effect.effects().unwrap();
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0]["type"], json!("bonus"));
    }

    #[test]
    fn test_deep_nesting_normalizes_every_level() {
        let (effect, warnings) = normalize(json!({
            "type": "bundle",
            "effects": [{
                "type": "bundle",
                "effects": [{ "type": "skill_choice", "from": ["arcana"] }]
            }]
        }));
        let inner = &effect.effects().unwrap()[0]["effects"][0];
        assert_eq!(inner["type"], json!("choice"));
        assert_eq!(inner["payload"]["from"], json!(["arcana"]));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_non_object_effects_pass_through_with_warning() {
        let (effect, warnings) = normalize(json!({ "effects": ["darkvision", { "type": "x" }] }));
        let effects = effect.effects().unwrap();
        assert_eq!(effects[0], json!("darkvision"));
        assert_eq!(effects[1]["type"], json!("x"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind(), "effect_not_object");
        assert_eq!(warnings[0].context().nested_index, Some(0));
    }

    #[test]
    fn test_non_object_payload_is_replaced() {
        let (effect, warnings) = normalize(json!({ "payload": "legacy" }));
        assert_eq!(effect.payload(), &Object::new());
        assert_eq!(warnings[0].kind(), "payload_not_object");
    }

    #[test]
    fn test_audit_trail_accumulates() {
        let (once, _) = normalize(json!({ "type": "bonus" }));
        let (twice, _) = normalize(once.into_value());
        assert_eq!(twice.normalized_from().len(), 2);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let raw = json!({ "type": "skill_choice", "from": ["a"] });
        let map = raw.as_object().cloned().unwrap();
        let mut warnings = Vec::new();
        let _ = normalize_effect_object(&map, &ctx(), &mut warnings);
        assert_eq!(Value::Object(map), raw);
    }

    #[test]
    fn test_scalar_input_passes_through() {
        let mut warnings = Vec::new();
        let out = normalize_effect(&json!("rage"), &ctx(), &mut warnings);
        assert_eq!(out, json!("rage"));
        assert_eq!(warnings[0].kind(), "effect_not_object");
    }
}
