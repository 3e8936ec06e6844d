#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{ json, Map, Value };
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use index_schema_sync::declaration::{
    AnalyzerDeclaration,
    ComponentDeclaration as Component,
    EntityDeclaration,
    FieldDeclaration as Field,
    SourceType,
};
use index_schema_sync::{ IndexStatus, SchemaError, SchemaResult, SearchCluster };

#[derive(Debug, Clone)]
struct StoredIndex {
    mappings: Map<String, Value>,
    analysis: Option<Value>,
    open: bool,
}

/// Cluster double that keeps index documents in memory and enforces the same
/// update rules as a real cluster: existing fields cannot change and analysis
/// settings only change on closed indices.
#[derive(Default)]
pub struct InMemoryCluster {
    indices: Mutex<HashMap<String, StoredIndex>>,
    operations: Mutex<Vec<String>>,
    failing_operation: Mutex<Option<String>>,
}

fn cluster_error(operation: &str, message: impl Into<String>) -> SchemaError {
    SchemaError::ClusterCommunication {
        operation: operation.to_string(),
        message: message.into(),
    }
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(self, index: &str, mapping_type: &str, mapping: Value, analysis: Option<Value>) -> Self {
        let mut mappings = Map::new();
        mappings.insert(mapping_type.to_string(), mapping);
        self.indices.lock().unwrap().insert(index.to_string(), StoredIndex {
            mappings,
            analysis,
            open: true,
        });
        self
    }

    /// Makes every later call of `operation` fail.
    pub fn fail_on(&self, operation: &str) {
        *self.failing_operation.lock().unwrap() = Some(operation.to_string());
    }

    /// Mutating operations performed so far, e.g. `put_mapping books`.
    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    pub fn exists(&self, index: &str) -> bool {
        self.indices.lock().unwrap().contains_key(index)
    }

    pub fn is_open(&self, index: &str) -> bool {
        self.indices.lock().unwrap().get(index).map(|stored| stored.open).unwrap_or(false)
    }

    pub fn mapping(&self, index: &str, mapping_type: &str) -> Option<Value> {
        self.indices.lock().unwrap().get(index).and_then(|stored| stored.mappings.get(mapping_type).cloned())
    }

    pub fn analysis(&self, index: &str) -> Option<Value> {
        self.indices.lock().unwrap().get(index).and_then(|stored| stored.analysis.clone())
    }

    fn record(&self, operation: &str, index: &str) -> SchemaResult<()> {
        self.operations.lock().unwrap().push(format!("{} {}", operation, index));
        if self.failing_operation.lock().unwrap().as_deref() == Some(operation) {
            return Err(cluster_error(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchCluster for InMemoryCluster {
    async fn index_exists(&self, index: &str) -> SchemaResult<bool> {
        Ok(self.exists(index))
    }

    async fn create_index(&self, index: &str, body: &Value) -> SchemaResult<()> {
        self.record("create", index)?;
        let mut indices = self.indices.lock().unwrap();
        if indices.contains_key(index) {
            return Err(cluster_error("create", "resource_already_exists_exception"));
        }
        let mappings = body.get("mappings").and_then(Value::as_object).cloned().unwrap_or_default();
        let analysis = body.pointer("/settings/analysis").cloned();
        indices.insert(index.to_string(), StoredIndex { mappings, analysis, open: true });
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> SchemaResult<()> {
        self.record("delete", index)?;
        self.indices.lock().unwrap().remove(index);
        Ok(())
    }

    async fn get_mapping(&self, index: &str, mapping_type: &str) -> SchemaResult<Option<Value>> {
        let indices = self.indices.lock().unwrap();
        let stored = indices.get(index).ok_or_else(|| cluster_error("get_mapping", "index_not_found"))?;
        Ok(stored.mappings.get(mapping_type).cloned())
    }

    async fn get_analysis(&self, index: &str) -> SchemaResult<Option<Value>> {
        let indices = self.indices.lock().unwrap();
        let stored = indices.get(index).ok_or_else(|| cluster_error("get_analysis", "index_not_found"))?;
        Ok(stored.analysis.clone())
    }

    async fn put_mapping(&self, index: &str, mapping_type: &str, mapping: &Value) -> SchemaResult<()> {
        self.record("put_mapping", index)?;
        let mut indices = self.indices.lock().unwrap();
        let stored = indices.get_mut(index).ok_or_else(|| cluster_error("put_mapping", "index_not_found"))?;
        let existing = stored.mappings
            .entry(mapping_type.to_string())
            .or_insert_with(|| json!({ "properties": {} }));

        if let Some(dynamic) = mapping.get("dynamic") {
            existing["dynamic"] = dynamic.clone();
        }
        let new_properties = mapping.get("properties").and_then(Value::as_object).cloned().unwrap_or_default();
        let properties = existing
            .as_object_mut()
            .unwrap()
            .entry("properties")
            .or_insert_with(|| json!({}))
            .as_object_mut()
            .unwrap();
        for (name, definition) in new_properties {
            match properties.get(&name) {
                Some(current) if *current != definition => {
                    return Err(cluster_error("put_mapping", format!("mapper [{}] conflicts", name)));
                }
                _ => {
                    properties.insert(name, definition);
                }
            }
        }
        Ok(())
    }

    async fn close_index(&self, index: &str) -> SchemaResult<()> {
        self.record("close", index)?;
        let mut indices = self.indices.lock().unwrap();
        let stored = indices.get_mut(index).ok_or_else(|| cluster_error("close", "index_not_found"))?;
        stored.open = false;
        Ok(())
    }

    async fn open_index(&self, index: &str) -> SchemaResult<()> {
        self.record("open", index)?;
        let mut indices = self.indices.lock().unwrap();
        let stored = indices.get_mut(index).ok_or_else(|| cluster_error("open", "index_not_found"))?;
        stored.open = true;
        Ok(())
    }

    async fn put_analysis(&self, index: &str, analysis: &Value) -> SchemaResult<()> {
        self.record("put_analysis", index)?;
        let mut indices = self.indices.lock().unwrap();
        let stored = indices.get_mut(index).ok_or_else(|| cluster_error("put_analysis", "index_not_found"))?;
        if stored.open {
            return Err(cluster_error("put_analysis", "can't update non dynamic settings on an open index"));
        }
        let current = stored.analysis.get_or_insert_with(|| json!({}));
        for (section, entries) in analysis.as_object().cloned().unwrap_or_default() {
            let target = current
                .as_object_mut()
                .unwrap()
                .entry(section)
                .or_insert_with(|| json!({}))
                .as_object_mut()
                .unwrap();
            for (name, definition) in entries.as_object().cloned().unwrap_or_default() {
                target.insert(name, definition);
            }
        }
        Ok(())
    }

    async fn wait_for_status(&self, index: &str, _status: IndexStatus, _timeout: Duration) -> SchemaResult<()> {
        self.record("wait", index)?;
        if !self.is_open(index) {
            return Err(cluster_error("wait", "index is not open"));
        }
        Ok(())
    }
}

pub fn id_mapping() -> Value {
    json!({ "type": "string", "index": "not_analyzed", "store": true })
}

pub fn date_entity() -> EntityDeclaration {
    EntityDeclaration::new("simpledateentity").field(Field::new("myField", SourceType::Date))
}

pub fn boolean_entity() -> EntityDeclaration {
    EntityDeclaration::new("simplebooleanentity").field(Field::new("myField", SourceType::Boolean))
}

fn word_delimiter() -> Component {
    Component::new("WordDelimiterFilterFactory")
        .param("generateWordParts", "1")
        .param("generateNumberParts", "1")
        .param("catenateWords", "0")
        .param("catenateNumbers", "0")
        .param("catenateAll", "0")
        .param("splitOnCaseChange", "0")
        .param("splitOnNumerics", "0")
        .param("preserveOriginal", "1")
}

pub fn analyzed_entity() -> EntityDeclaration {
    EntityDeclaration::new("simpleanalyzedentity")
        .analyzer(
            AnalyzerDeclaration::new("analyzerWithSimpleComponents", Component::new("WhitespaceTokenizerFactory"))
                .char_filter(Component::new("HTMLStripCharFilterFactory"))
                .filter(Component::new("LowerCaseFilterFactory"))
        )
        .analyzer(
            AnalyzerDeclaration::new(
                "analyzerWithNamedSimpleComponents",
                Component::new("WhitespaceTokenizerFactory").named("namedTokenizer")
            )
                .char_filter(Component::new("HTMLStripCharFilterFactory").named("namedCharFilter"))
                .filter(Component::new("LowerCaseFilterFactory").named("namedTokenFilter"))
        )
        .analyzer(
            AnalyzerDeclaration::new("analyzerWithComplexComponents", Component::new("ClassicTokenizerFactory"))
                .char_filter(Component::new("HTMLStripCharFilterFactory").param("escapedTags", "br p"))
                .filter(word_delimiter())
        )
        .analyzer(
            AnalyzerDeclaration::new(
                "analyzerWithNamedComplexComponents",
                Component::new("ClassicTokenizerFactory").named("custom-classic-tokenizer")
            )
                .char_filter(
                    Component::new("HTMLStripCharFilterFactory")
                        .named("custom-html-stripper")
                        .param("escapedTags", "br p")
                )
                .filter(word_delimiter().named("custom-word-delimiter"))
        )
        .field(Field::new("myField1", SourceType::String).with_analyzer("analyzerWithSimpleComponents"))
        .field(Field::new("myField2", SourceType::String).with_analyzer("analyzerWithNamedSimpleComponents"))
        .field(Field::new("myField3", SourceType::String).with_analyzer("analyzerWithComplexComponents"))
        .field(Field::new("myField4", SourceType::String).with_analyzer("analyzerWithNamedComplexComponents"))
}

pub fn fixtures() -> Vec<EntityDeclaration> {
    vec![date_entity(), boolean_entity(), analyzed_entity()]
}
