use serde::Serialize;
use serde_json::Value;

/// Where in a file a normalization step is happening
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idx: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_index: Option<usize>,
}

impl Context {
    pub fn for_file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn with_feature_id(mut self, feature_id: Option<Value>) -> Self {
        self.feature_id = feature_id;
        self
    }

    pub fn with_idx(mut self, idx: usize) -> Self {
        self.idx = Some(idx);
        self
    }

    pub fn with_nested_index(mut self, nested_index: usize) -> Self {
        self.nested_index = Some(nested_index);
        self
    }
}

/// A non-fatal data-quality finding. Never aborts normalization of a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    FromNotArray {
        context: Context,
        value: Value,
    },
    SlotsTableParseNonObject {
        context: Context,
        value: Value,
    },
    SlotsTableParseError {
        context: Context,
        value: Value,
        message: String,
    },
    SlotsTableUnknown {
        context: Context,
        value: Value,
    },
    EffectNotObject {
        context: Context,
        value: Value,
    },
    MecaniqueMappedToEffects {
        context: Context,
        file: Option<String>,
    },
    GrantFeatureNoId {
        context: Context,
    },
    FeatureMecaniqueMapped {
        context: Context,
        file: Option<String>,
        #[serde(rename = "featureId")]
        feature_id: Option<Value>,
    },
    FileUnknownShape {
        context: Context,
        file: Option<String>,
    },
    ChooseNotNumeric {
        context: Context,
        value: Value,
    },
    PayloadNotObject {
        context: Context,
        value: Value,
    },
}

impl Warning {
    /// The serialized `kind` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::FromNotArray { .. } => "from_not_array",
            Warning::SlotsTableParseNonObject { .. } => "slots_table_parse_non_object",
            Warning::SlotsTableParseError { .. } => "slots_table_parse_error",
            Warning::SlotsTableUnknown { .. } => "slots_table_unknown",
            Warning::EffectNotObject { .. } => "effect_not_object",
            Warning::MecaniqueMappedToEffects { .. } => "mecanique_mapped_to_effects",
            Warning::GrantFeatureNoId { .. } => "grant_feature_no_id",
            Warning::FeatureMecaniqueMapped { .. } => "feature_mecanique_mapped",
            Warning::FileUnknownShape { .. } => "file_unknown_shape",
            Warning::ChooseNotNumeric { .. } => "choose_not_numeric",
            Warning::PayloadNotObject { .. } => "payload_not_object",
        }
    }

    pub fn context(&self) -> &Context {
        match self {
            Warning::FromNotArray { context, .. }
            | Warning::SlotsTableParseNonObject { context, .. }
            | Warning::SlotsTableParseError { context, .. }
            | Warning::SlotsTableUnknown { context, .. }
            | Warning::EffectNotObject { context, .. }
            | Warning::MecaniqueMappedToEffects { context, .. }
            | Warning::GrantFeatureNoId { context }
            | Warning::FeatureMecaniqueMapped { context, .. }
            | Warning::FileUnknownShape { context, .. }
            | Warning::ChooseNotNumeric { context, .. }
            | Warning::PayloadNotObject { context, .. } => context,
        }
    }
}
