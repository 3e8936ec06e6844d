use std::collections::HashSet;
use log::{ debug, info };

use crate::declaration::{ AnalyzerDeclaration, ComponentDeclaration, EntityDeclaration, FieldDeclaration, SourceType };
use crate::error::{ SchemaError, SchemaResult };
use crate::factory::{ self, simple_name };
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
    DATE_FORMAT,
};

/// Analyzers every cluster provides without an analysis definition.
pub const BUILTIN_ANALYZERS: &[&str] = &[
    "standard",
    "simple",
    "whitespace",
    "stop",
    "keyword",
    "pattern",
    "fingerprint",
    "english",
    "french",
    "german",
    "spanish",
    "italian",
];

/// Derives the desired schema of an index from its declaration.
pub fn build(declaration: &EntityDeclaration) -> SchemaResult<IndexSchema> {
    let index = declaration.index_name.as_str();
    let mut schema = IndexSchema::new(index, declaration.mapping_type());
    schema.dynamic = Some(DynamicMapping::Strict);

    for analyzer in &declaration.analyzers {
        if schema.analysis.analyzers.contains_key(&analyzer.name) {
            return Err(
                SchemaError::invalid_declaration(
                    index,
                    format!("analyzer '{}' is declared more than once", analyzer.name)
                )
            );
        }
        let definition = build_analyzer(index, analyzer, &mut schema.analysis)?;
        schema.analysis.analyzers.insert(analyzer.name.clone(), definition);
    }

    let id = FieldMapping::new(declaration.id_field.as_str(), FieldType::String)
        .with_index(IndexMode::NotAnalyzed)
        .stored(true);
    schema.fields.insert(id.name.clone(), id);

    let mut declared = HashSet::new();
    for field in &declaration.fields {
        if !declared.insert(field.name.as_str()) {
            return Err(
                SchemaError::invalid_declaration(
                    index,
                    format!("field '{}' is declared more than once", field.name)
                )
            );
        }
        if field.name == declaration.id_field {
            debug!("Field '{}' of index '{}' is the document id, keeping id mapping", field.name, index);
            continue;
        }
        let mapping = build_field(index, field, &schema.analysis)?;
        schema.fields.insert(mapping.name.clone(), mapping);
    }

    info!(
        "Built schema for index '{}': {} fields, {} analyzers",
        index,
        schema.fields.len(),
        schema.analysis.analyzers.len()
    );
    Ok(schema)
}

fn build_field(
    index: &str,
    field: &FieldDeclaration,
    analysis: &AnalysisSettings
) -> SchemaResult<FieldMapping> {
    if field.analyzer.is_some() && (field.source_type != SourceType::String || !field.analyze) {
        return Err(
            SchemaError::invalid_declaration(
                index,
                format!("field '{}' declares an analyzer but is not an analyzed string", field.name)
            )
        );
    }

    let mapping = match field.source_type {
        SourceType::Boolean => {
            if field.store {
                debug!("Ignoring store flag on boolean field '{}'", field.name);
            }
            FieldMapping::new(field.name.as_str(), FieldType::Boolean)
        }
        SourceType::Date =>
            FieldMapping::new(field.name.as_str(), FieldType::Date)
                .with_format(DATE_FORMAT)
                .stored(field.store),
        SourceType::String => {
            let mut mapping = FieldMapping::new(field.name.as_str(), FieldType::String).stored(field.store);
            if !field.analyze {
                mapping = mapping.with_index(IndexMode::NotAnalyzed);
            }
            if let Some(analyzer) = &field.analyzer {
                if
                    !analysis.analyzers.contains_key(analyzer) &&
                    !BUILTIN_ANALYZERS.contains(&analyzer.as_str())
                {
                    return Err(
                        SchemaError::invalid_declaration(
                            index,
                            format!("field '{}' references unknown analyzer '{}'", field.name, analyzer)
                        )
                    );
                }
                mapping = mapping.with_analyzer(analyzer.as_str());
            }
            mapping
        }
        SourceType::Integer => FieldMapping::new(field.name.as_str(), FieldType::Integer).stored(field.store),
        SourceType::Long => FieldMapping::new(field.name.as_str(), FieldType::Long).stored(field.store),
        SourceType::Float => FieldMapping::new(field.name.as_str(), FieldType::Float).stored(field.store),
        SourceType::Double => FieldMapping::new(field.name.as_str(), FieldType::Double).stored(field.store),
    };
    Ok(mapping)
}

fn build_analyzer(
    index: &str,
    analyzer: &AnalyzerDeclaration,
    analysis: &mut AnalysisSettings
) -> SchemaResult<AnalyzerDefinition> {
    let mut char_filters = Vec::with_capacity(analyzer.char_filters.len());
    for declaration in &analyzer.char_filters {
        char_filters.push(
            resolve_component(index, &analyzer.name, ComponentKind::CharFilter, declaration, analysis)?
        );
    }

    let tokenizer = resolve_component(
        index,
        &analyzer.name,
        ComponentKind::Tokenizer,
        &analyzer.tokenizer,
        analysis
    )?;

    let mut filters = Vec::with_capacity(analyzer.filters.len());
    for declaration in &analyzer.filters {
        filters.push(
            resolve_component(index, &analyzer.name, ComponentKind::TokenFilter, declaration, analysis)?
        );
    }

    Ok(AnalyzerDefinition {
        name: analyzer.name.clone(),
        char_filters,
        tokenizer,
        filters,
    })
}

/// Returns the name an analyzer uses to reference the component, registering a
/// definition when the component is named or carries parameters.
fn resolve_component(
    index: &str,
    analyzer_name: &str,
    kind: ComponentKind,
    declaration: &ComponentDeclaration,
    analysis: &mut AnalysisSettings
) -> SchemaResult<String> {
    let translation = factory::lookup(&declaration.factory).ok_or_else(||
        SchemaError::invalid_declaration(
            index,
            format!(
                "analyzer '{}' uses unknown {} factory '{}'",
                analyzer_name,
                kind.label(),
                declaration.factory
            )
        )
    )?;
    if translation.kind != kind {
        return Err(
            SchemaError::invalid_declaration(
                index,
                format!(
                    "analyzer '{}' uses {} '{}' as a {}",
                    analyzer_name,
                    translation.kind.label(),
                    declaration.factory,
                    kind.label()
                )
            )
        );
    }
    let params = translation
        .translate_params(&declaration.params)
        .map_err(|reason| SchemaError::invalid_declaration(index, format!("analyzer '{}': {}", analyzer_name, reason)))?;

    let components = analysis.components_mut(kind);
    match &declaration.name {
        Some(name) if factory::is_builtin(kind, name) => {
            if translation.type_name == name.as_str() && params.is_empty() {
                return Ok(name.clone());
            }
            Err(
                SchemaError::invalid_declaration(
                    index,
                    format!(
                        "analyzer '{}' names a {} '{}', which shadows the built-in {} of that name",
                        analyzer_name,
                        declaration.factory,
                        name,
                        kind.label()
                    )
                )
            )
        }
        Some(name) => {
            let definition = ComponentDefinition {
                name: name.clone(),
                type_name: translation.type_name.to_string(),
                params,
            };
            match components.get(name) {
                Some(existing) if *existing != definition => {
                    Err(
                        SchemaError::invalid_declaration(
                            index,
                            format!("{} '{}' is declared twice with different definitions", kind.label(), name)
                        )
                    )
                }
                Some(_) => Ok(name.clone()),
                None => {
                    components.insert(name.clone(), definition);
                    Ok(name.clone())
                }
            }
        }
        None if params.is_empty() => Ok(translation.type_name.to_string()),
        None => {
            let base = format!("{}_{}", analyzer_name, simple_name(&declaration.factory));
            let mut candidate = base.clone();
            let mut suffix = 2;
            loop {
                match components.get(&candidate) {
                    None => {
                        debug!("Registering anonymous {} '{}'", kind.label(), candidate);
                        components.insert(candidate.clone(), ComponentDefinition {
                            name: candidate.clone(),
                            type_name: translation.type_name.to_string(),
                            params,
                        });
                        return Ok(candidate);
                    }
                    Some(existing) if
                        existing.type_name == translation.type_name &&
                        existing.params == params
                    => {
                        return Ok(candidate);
                    }
                    Some(_) => {
                        candidate = format!("{}_{}", base, suffix);
                        suffix += 1;
                    }
                }
            }
        }
    }
}
