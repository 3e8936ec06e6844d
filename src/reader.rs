use std::collections::BTreeMap;
use serde_json::Value;
use log::{ debug, info, warn };

use crate::cluster::SearchCluster;
use crate::error::{ SchemaError, SchemaResult };
use crate::factory::canonicalize_params;
use crate::schema::{
    AnalysisSettings,
    AnalyzerDefinition,
    ComponentDefinition,
    ComponentKind,
    DynamicMapping,
    FieldMapping,
    FieldType,
    IndexMode,
    IndexSchema,
    ParamValue,
};

/// Reads the schema currently deployed for `index`. Returns `None` when the
/// index does not exist.
pub async fn read(
    cluster: &dyn SearchCluster,
    index: &str,
    mapping_type: &str
) -> SchemaResult<Option<IndexSchema>> {
    if !cluster.index_exists(index).await? {
        info!("Index '{}' does not exist", index);
        return Ok(None);
    }

    let mut schema = IndexSchema::new(index, mapping_type);
    match cluster.get_mapping(index, mapping_type).await? {
        Some(mapping) => {
            let (dynamic, fields) = parse_mapping(&mapping).map_err(|reason|
                SchemaError::cluster("read mapping", format!("index '{}': {}", index, reason))
            )?;
            schema.dynamic = dynamic;
            schema.fields = fields;
        }
        None => warn!("Index '{}' exists but has no mapping for type '{}'", index, mapping_type),
    }
    if let Some(analysis) = cluster.get_analysis(index).await? {
        schema.analysis = parse_analysis(&analysis).map_err(|reason|
            SchemaError::cluster("read analysis settings", format!("index '{}': {}", index, reason))
        )?;
    }

    debug!(
        "Read schema of index '{}': {} fields, {} analyzers",
        index,
        schema.fields.len(),
        schema.analysis.analyzers.len()
    );
    Ok(Some(schema))
}

pub fn parse_mapping(
    mapping: &Value
) -> Result<(Option<DynamicMapping>, BTreeMap<String, FieldMapping>), String> {
    let dynamic = match mapping.get("dynamic") {
        Some(value) =>
            Some(
                DynamicMapping::from_json(value).ok_or_else(||
                    format!("unknown dynamic setting {}", value)
                )?
            ),
        None => None,
    };

    let mut fields = BTreeMap::new();
    if let Some(properties) = mapping.get("properties") {
        let properties = properties.as_object().ok_or("'properties' is not an object")?;
        for (name, definition) in properties {
            fields.insert(name.clone(), parse_field(name, definition)?);
        }
    }
    Ok((dynamic, fields))
}

fn parse_field(name: &str, definition: &Value) -> Result<FieldMapping, String> {
    if !definition.is_object() {
        return Err(format!("field '{}' is not an object", name));
    }
    // Object fields carry no explicit type.
    let field_type = FieldType::parse(definition.get("type").and_then(Value::as_str).unwrap_or("object"));
    let mut field = FieldMapping::new(name, field_type);

    match definition.get("index") {
        Some(Value::String(mode)) => {
            field.index = IndexMode::parse(mode).ok_or_else(||
                format!("field '{}' has unknown index mode '{}'", name, mode)
            )?;
        }
        Some(Value::Bool(false)) => field.index = IndexMode::No,
        Some(Value::Bool(true)) | None => {}
        Some(other) => return Err(format!("field '{}' has invalid index setting {}", name, other)),
    }

    field.store = match definition.get("store") {
        Some(Value::Bool(store)) => *store,
        Some(Value::String(store)) => matches!(store.as_str(), "true" | "yes"),
        _ => false,
    };
    field.analyzer = definition.get("analyzer").and_then(Value::as_str).map(String::from);
    field.format = definition.get("format").and_then(Value::as_str).map(String::from);
    Ok(field)
}

pub fn parse_analysis(analysis: &Value) -> Result<AnalysisSettings, String> {
    let mut settings = AnalysisSettings::default();

    for (name, definition) in entries(analysis, "analyzer")? {
        let tokenizer = match definition.get("tokenizer").and_then(Value::as_str) {
            Some(tokenizer) => tokenizer.to_string(),
            None => {
                // A pre-built analyzer type; it can never equal a declared one.
                let kind = definition.get("type").and_then(Value::as_str).unwrap_or("unknown");
                warn!("Analyzer '{}' has no tokenizer (type '{}')", name, kind);
                format!("<{}>", kind)
            }
        };
        settings.analyzers.insert(name.clone(), AnalyzerDefinition {
            name: name.clone(),
            char_filters: name_list(definition.get("char_filter")),
            tokenizer,
            filters: name_list(definition.get("filter")),
        });
    }

    for kind in ComponentKind::ALL {
        for (name, definition) in entries(analysis, kind.settings_key())? {
            let component = parse_component(kind, name, definition)?;
            settings.components_mut(kind).insert(name.clone(), component);
        }
    }
    Ok(settings)
}

fn entries<'a>(analysis: &'a Value, section: &str) -> Result<Vec<(&'a String, &'a Value)>, String> {
    match analysis.get(section) {
        None => Ok(Vec::new()),
        Some(Value::Object(map)) => Ok(map.iter().collect()),
        Some(_) => Err(format!("analysis section '{}' is not an object", section)),
    }
}

fn name_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(name)) => vec![name.clone()],
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).map(String::from).collect(),
        _ => Vec::new(),
    }
}

fn parse_component(kind: ComponentKind, name: &str, definition: &Value) -> Result<ComponentDefinition, String> {
    let body = definition.as_object().ok_or_else(|| format!("{} '{}' is not an object", kind.label(), name))?;
    let type_name = body
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("{} '{}' has no type", kind.label(), name))?
        .to_string();

    let mut params = BTreeMap::new();
    for (key, value) in body {
        if key == "type" {
            continue;
        }
        let param = ParamValue::from_json(value).unwrap_or_else(|| {
            warn!("Keeping structured parameter '{}' of {} '{}' as raw JSON", key, kind.label(), name);
            ParamValue::Text(value.to_string())
        });
        params.insert(key.clone(), param);
    }

    Ok(ComponentDefinition {
        name: name.to_string(),
        params: canonicalize_params(kind, &type_name, params),
        type_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_mapping_applies_type_defaults() {
        let (dynamic, fields) = parse_mapping(
            &json!({
                "dynamic": "strict",
                "properties": {
                    "id": { "type": "string", "index": "not_analyzed", "store": true },
                    "title": { "type": "string", "analyzer": "english" },
                    "count": { "type": "long" },
                    "author": { "properties": { "name": { "type": "string" } } }
                }
            })
        ).unwrap();

        assert_eq!(dynamic, Some(DynamicMapping::Strict));
        assert_eq!(fields["id"].index, IndexMode::NotAnalyzed);
        assert!(fields["id"].store);
        assert_eq!(fields["title"].index, IndexMode::Analyzed);
        assert_eq!(fields["title"].analyzer.as_deref(), Some("english"));
        assert_eq!(fields["count"].index, IndexMode::NotAnalyzed);
        assert_eq!(fields["author"].field_type, FieldType::Other("object".to_string()));
    }

    #[test]
    fn parse_mapping_accepts_string_flags() {
        let (dynamic, fields) = parse_mapping(
            &json!({
                "dynamic": false,
                "properties": { "body": { "type": "string", "store": "yes", "index": "no" } }
            })
        ).unwrap();
        assert_eq!(dynamic, Some(DynamicMapping::False));
        assert!(fields["body"].store);
        assert_eq!(fields["body"].index, IndexMode::No);

        assert!(parse_mapping(&json!({ "properties": { "x": { "type": "string", "index": "sometimes" } } })).is_err());
    }

    #[test]
    fn parse_analysis_canonicalizes_components() {
        let settings = parse_analysis(
            &json!({
                "analyzer": {
                    "custom": {
                        "type": "custom",
                        "char_filter": "strip",
                        "tokenizer": "whitespace",
                        "filter": ["delimiter", "lowercase"]
                    },
                    "prebuilt": { "type": "standard", "stopwords": "_english_" }
                },
                "char_filter": { "strip": { "type": "html_strip", "escaped_tags": ["br", "p"] } },
                "filter": {
                    "delimiter": { "type": "word_delimiter", "catenate_all": false, "generate_word_parts": "1" },
                    "grams": { "type": "nGram", "min_gram": 2 }
                }
            })
        ).unwrap();

        let custom = &settings.analyzers["custom"];
        assert_eq!(custom.char_filters, vec!["strip".to_string()]);
        assert_eq!(custom.filters, vec!["delimiter".to_string(), "lowercase".to_string()]);
        assert_eq!(settings.analyzers["prebuilt"].tokenizer, "<standard>");

        let delimiter = &settings.token_filters["delimiter"];
        assert_eq!(delimiter.params["catenate_all"], ParamValue::Text("0".to_string()));
        assert_eq!(delimiter.params["generate_word_parts"], ParamValue::Text("1".to_string()));
        assert_eq!(settings.token_filters["grams"].params["min_gram"], ParamValue::Text("2".to_string()));
        assert_eq!(
            settings.char_filters["strip"].params["escaped_tags"],
            ParamValue::List(vec!["br".to_string(), "p".to_string()])
        );
    }

    #[test]
    fn parse_analysis_rejects_untyped_components() {
        assert!(parse_analysis(&json!({ "tokenizer": { "broken": { "max_gram": 3 } } })).is_err());
    }

    #[test]
    fn structured_parameters_are_kept_as_raw_json() {
        let settings = parse_analysis(
            &json!({ "tokenizer": { "odd": { "type": "pattern", "flags": { "x": 1 }, "group": null } } })
        ).unwrap();
        let params = &settings.tokenizers["odd"].params;
        assert_eq!(params["flags"], ParamValue::Text(r#"{"x":1}"#.to_string()));
        assert_eq!(params["group"], ParamValue::Text("null".to_string()));
    }
}
