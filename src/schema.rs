use serde_json::{ json, Map, Value };
use std::collections::BTreeMap;

/// Date format accepted by every date field: ISO date-time or raw epoch millis.
pub const DATE_FORMAT: &str = "strict_date_optional_time||epoch_millis";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Date,
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    /// Any type found on the cluster that declarations cannot produce.
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Other(name) => name,
        }
    }

    pub fn parse(value: &str) -> FieldType {
        match value {
            "string" => FieldType::String,
            "date" => FieldType::Date,
            "boolean" => FieldType::Boolean,
            "integer" => FieldType::Integer,
            "long" => FieldType::Long,
            "float" => FieldType::Float,
            "double" => FieldType::Double,
            other => FieldType::Other(other.to_string()),
        }
    }

    /// Indexing mode the cluster applies when a mapping omits `index`.
    pub fn default_index_mode(&self) -> IndexMode {
        match self {
            FieldType::String => IndexMode::Analyzed,
            _ => IndexMode::NotAnalyzed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    Analyzed,
    NotAnalyzed,
    No,
}

impl IndexMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexMode::Analyzed => "analyzed",
            IndexMode::NotAnalyzed => "not_analyzed",
            IndexMode::No => "no",
        }
    }

    pub fn parse(value: &str) -> Option<IndexMode> {
        match value {
            "analyzed" => Some(IndexMode::Analyzed),
            "not_analyzed" => Some(IndexMode::NotAnalyzed),
            "no" => Some(IndexMode::No),
            _ => None,
        }
    }
}

/// How the cluster treats document fields absent from the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicMapping {
    Strict,
    True,
    False,
}

impl DynamicMapping {
    pub fn as_str(&self) -> &'static str {
        match self {
            DynamicMapping::Strict => "strict",
            DynamicMapping::True => "true",
            DynamicMapping::False => "false",
        }
    }

    /// Accepts both the string and the boolean JSON forms.
    pub fn from_json(value: &Value) -> Option<DynamicMapping> {
        match value {
            Value::Bool(true) => Some(DynamicMapping::True),
            Value::Bool(false) => Some(DynamicMapping::False),
            Value::String(s) =>
                match s.as_str() {
                    "strict" => Some(DynamicMapping::Strict),
                    "true" => Some(DynamicMapping::True),
                    "false" => Some(DynamicMapping::False),
                    _ => None,
                }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub name: String,
    pub field_type: FieldType,
    pub index: IndexMode,
    pub store: bool,
    pub analyzer: Option<String>,
    pub format: Option<String>,
}

impl FieldMapping {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            index: field_type.default_index_mode(),
            field_type,
            store: false,
            analyzer: None,
            format: None,
        }
    }

    pub fn with_index(mut self, index: IndexMode) -> Self {
        self.index = index;
        self
    }

    pub fn stored(mut self, store: bool) -> Self {
        self.store = store;
        self
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Cluster representation. Defaults are omitted so that the output matches
    /// what the cluster echoes back.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("type".to_string(), json!(self.field_type.as_str()));
        if self.index != self.field_type.default_index_mode() {
            body.insert("index".to_string(), json!(self.index.as_str()));
        }
        if self.store {
            body.insert("store".to_string(), json!(true));
        }
        if let Some(analyzer) = &self.analyzer {
            body.insert("analyzer".to_string(), json!(analyzer));
        }
        if let Some(format) = &self.format {
            body.insert("format".to_string(), json!(format));
        }
        Value::Object(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    CharFilter,
    Tokenizer,
    TokenFilter,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [
        ComponentKind::CharFilter,
        ComponentKind::Tokenizer,
        ComponentKind::TokenFilter,
    ];

    /// Key of this component section inside `index.analysis`.
    pub fn settings_key(&self) -> &'static str {
        match self {
            ComponentKind::CharFilter => "char_filter",
            ComponentKind::Tokenizer => "tokenizer",
            ComponentKind::TokenFilter => "filter",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::CharFilter => "char filter",
            ComponentKind::Tokenizer => "tokenizer",
            ComponentKind::TokenFilter => "token filter",
        }
    }
}

/// Canonical parameter value. Numbers and booleans are held as strings, lists
/// keep their order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(text) => json!(text),
            ParamValue::List(items) => json!(items),
        }
    }

    /// Returns `None` for objects and nulls, which no component parameter uses.
    pub fn from_json(value: &Value) -> Option<ParamValue> {
        match value {
            Value::Array(items) => {
                let items: Option<Vec<String>> = items.iter().map(scalar_to_string).collect();
                items.map(ParamValue::List)
            }
            other => scalar_to_string(other).map(ParamValue::Text),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDefinition {
    pub name: String,
    pub type_name: String,
    pub params: BTreeMap<String, ParamValue>,
}

impl ComponentDefinition {
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("type".to_string(), json!(self.type_name));
        for (key, value) in &self.params {
            body.insert(key.clone(), value.to_json());
        }
        Value::Object(body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerDefinition {
    pub name: String,
    pub char_filters: Vec<String>,
    pub tokenizer: String,
    pub filters: Vec<String>,
}

impl AnalyzerDefinition {
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if !self.char_filters.is_empty() {
            body.insert("char_filter".to_string(), json!(self.char_filters));
        }
        body.insert("tokenizer".to_string(), json!(self.tokenizer));
        if !self.filters.is_empty() {
            body.insert("filter".to_string(), json!(self.filters));
        }
        Value::Object(body)
    }
}

/// Content of the `index.analysis` settings block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisSettings {
    pub analyzers: BTreeMap<String, AnalyzerDefinition>,
    pub char_filters: BTreeMap<String, ComponentDefinition>,
    pub tokenizers: BTreeMap<String, ComponentDefinition>,
    pub token_filters: BTreeMap<String, ComponentDefinition>,
}

impl AnalysisSettings {
    pub fn components(&self, kind: ComponentKind) -> &BTreeMap<String, ComponentDefinition> {
        match kind {
            ComponentKind::CharFilter => &self.char_filters,
            ComponentKind::Tokenizer => &self.tokenizers,
            ComponentKind::TokenFilter => &self.token_filters,
        }
    }

    pub fn components_mut(
        &mut self,
        kind: ComponentKind
    ) -> &mut BTreeMap<String, ComponentDefinition> {
        match kind {
            ComponentKind::CharFilter => &mut self.char_filters,
            ComponentKind::Tokenizer => &mut self.tokenizers,
            ComponentKind::TokenFilter => &mut self.token_filters,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty() &&
            ComponentKind::ALL.iter().all(|kind| self.components(*kind).is_empty())
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if !self.analyzers.is_empty() {
            let analyzers: Map<String, Value> = self.analyzers
                .iter()
                .map(|(name, analyzer)| (name.clone(), analyzer.to_json()))
                .collect();
            body.insert("analyzer".to_string(), Value::Object(analyzers));
        }
        for kind in ComponentKind::ALL {
            let components = self.components(kind);
            if components.is_empty() {
                continue;
            }
            let section: Map<String, Value> = components
                .iter()
                .map(|(name, component)| (name.clone(), component.to_json()))
                .collect();
            body.insert(kind.settings_key().to_string(), Value::Object(section));
        }
        Value::Object(body)
    }
}

/// Schema of a single index: its mapping plus its analysis settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub index_name: String,
    pub mapping_type: String,
    pub dynamic: Option<DynamicMapping>,
    pub fields: BTreeMap<String, FieldMapping>,
    pub analysis: AnalysisSettings,
}

impl IndexSchema {
    pub fn new(index_name: impl Into<String>, mapping_type: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            mapping_type: mapping_type.into(),
            dynamic: None,
            fields: BTreeMap::new(),
            analysis: AnalysisSettings::default(),
        }
    }

    pub fn mapping_json(&self) -> Value {
        mapping_json(self.dynamic, self.fields.values())
    }

    pub fn analysis_json(&self) -> Value {
        self.analysis.to_json()
    }

    /// Body of the create-index request.
    pub fn create_index_body(&self) -> Value {
        let mut mappings = Map::new();
        mappings.insert(self.mapping_type.clone(), self.mapping_json());
        let mut body = Map::new();
        if !self.analysis.is_empty() {
            body.insert("settings".to_string(), json!({ "analysis": self.analysis_json() }));
        }
        body.insert("mappings".to_string(), Value::Object(mappings));
        Value::Object(body)
    }
}

pub(crate) fn mapping_json<'a>(
    dynamic: Option<DynamicMapping>,
    fields: impl Iterator<Item = &'a FieldMapping>
) -> Value {
    let mut body = Map::new();
    if let Some(dynamic) = dynamic {
        body.insert("dynamic".to_string(), json!(dynamic.as_str()));
    }
    let properties: Map<String, Value> = fields
        .map(|field| (field.name.clone(), field.to_json()))
        .collect();
    body.insert("properties".to_string(), Value::Object(properties));
    Value::Object(body)
}
