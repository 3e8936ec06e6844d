use serde::{ Deserialize, Serialize };
use std::path::Path;
use log::info;

use crate::error::SchemaResult;

/// Type of the value a field is populated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    String,
    Date,
    Boolean,
    Integer,
    Long,
    Float,
    Double,
}

/// A single configuration parameter of an analysis component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// A char filter, tokenizer or token filter used by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDeclaration {
    /// Explicit name. Named components are shared between analyzers.
    #[serde(default)]
    pub name: Option<String>,
    /// Implementation type, e.g. `WordDelimiterFilterFactory`.
    pub factory: String,
    #[serde(default)]
    pub params: Vec<Parameter>,
}

impl ComponentDeclaration {
    pub fn new(factory: impl Into<String>) -> Self {
        Self {
            name: None,
            factory: factory.into(),
            params: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerDeclaration {
    pub name: String,
    #[serde(default)]
    pub char_filters: Vec<ComponentDeclaration>,
    pub tokenizer: ComponentDeclaration,
    #[serde(default)]
    pub filters: Vec<ComponentDeclaration>,
}

impl AnalyzerDeclaration {
    pub fn new(name: impl Into<String>, tokenizer: ComponentDeclaration) -> Self {
        Self {
            name: name.into(),
            char_filters: Vec::new(),
            tokenizer,
            filters: Vec::new(),
        }
    }

    pub fn char_filter(mut self, char_filter: ComponentDeclaration) -> Self {
        self.char_filters.push(char_filter);
        self
    }

    pub fn filter(mut self, filter: ComponentDeclaration) -> Self {
        self.filters.push(filter);
        self
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    pub source_type: SourceType,
    /// Name of a declared or built-in analyzer.
    #[serde(default)]
    pub analyzer: Option<String>,
    #[serde(default = "default_true")]
    pub analyze: bool,
    #[serde(default)]
    pub store: bool,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            name: name.into(),
            source_type,
            analyzer: None,
            analyze: true,
            store: false,
        }
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn not_analyzed(mut self) -> Self {
        self.analyze = false;
        self
    }

    pub fn stored(mut self) -> Self {
        self.store = true;
        self
    }
}

fn default_id_field() -> String {
    "id".to_string()
}

/// Everything needed to derive the schema of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDeclaration {
    pub index_name: String,
    /// Mapping type inside the index. Defaults to the index name.
    #[serde(default)]
    pub mapping_type: Option<String>,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
    #[serde(default)]
    pub analyzers: Vec<AnalyzerDeclaration>,
}

impl EntityDeclaration {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            mapping_type: None,
            id_field: default_id_field(),
            fields: Vec::new(),
            analyzers: Vec::new(),
        }
    }

    pub fn with_mapping_type(mut self, mapping_type: impl Into<String>) -> Self {
        self.mapping_type = Some(mapping_type.into());
        self
    }

    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    pub fn analyzer(mut self, analyzer: AnalyzerDeclaration) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn mapping_type(&self) -> &str {
        self.mapping_type.as_deref().unwrap_or(&self.index_name)
    }
}

/// Structure of a declaration file (e.g., indexes.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarationFile {
    pub indexes: Vec<EntityDeclaration>,
}

pub fn load_declarations(path: impl AsRef<Path>) -> SchemaResult<Vec<EntityDeclaration>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let file: DeclarationFile = serde_json::from_str(&text)?;
    info!("Loaded {} index declarations from {}", file.indexes.len(), path.display());
    Ok(file.indexes)
}
