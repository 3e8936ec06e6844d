use std::fmt;
use std::str::FromStr;
use serde_json::Value;
use log::{ info, warn };

use crate::diff::{ diff, SchemaDiff };
use crate::error::{ SchemaError, SchemaResult };
use crate::schema::{ mapping_json, AnalysisSettings, DynamicMapping, FieldMapping, IndexSchema };

/// How the deployed schema of an index is reconciled at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaStrategy {
    None,
    Validate,
    Create,
    CreateOrUpdate,
    DropAndCreate,
}

impl SchemaStrategy {
    pub const ALL: [SchemaStrategy; 5] = [
        SchemaStrategy::None,
        SchemaStrategy::Validate,
        SchemaStrategy::Create,
        SchemaStrategy::CreateOrUpdate,
        SchemaStrategy::DropAndCreate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaStrategy::None => "none",
            SchemaStrategy::Validate => "validate",
            SchemaStrategy::Create => "create",
            SchemaStrategy::CreateOrUpdate => "create-or-update",
            SchemaStrategy::DropAndCreate => "drop-and-create",
        }
    }
}

impl fmt::Display for SchemaStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "none" => Ok(SchemaStrategy::None),
            "validate" => Ok(SchemaStrategy::Validate),
            "create" => Ok(SchemaStrategy::Create),
            "create-or-update" => Ok(SchemaStrategy::CreateOrUpdate),
            "drop-and-create" => Ok(SchemaStrategy::DropAndCreate),
            _ => Err(format!("Unsupported schema management strategy: {}", value)),
        }
    }
}

/// The part of a desired schema that has to be pushed to an existing index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaUpdate {
    /// Set whenever the mapping has to be sent.
    pub dynamic: Option<DynamicMapping>,
    pub fields: Vec<FieldMapping>,
    pub analysis: AnalysisSettings,
}

impl SchemaUpdate {
    pub fn from_diff(desired: &IndexSchema, diff: &SchemaDiff) -> Self {
        let fields: Vec<FieldMapping> = diff.missing_fields
            .iter()
            .filter_map(|name| desired.fields.get(name).cloned())
            .collect();
        let dynamic = if diff.requires_mapping_update() { desired.dynamic } else { None };

        let mut analysis = AnalysisSettings::default();
        for name in diff.missing_analyzers.iter().chain(&diff.incompatible_analyzers) {
            if let Some(analyzer) = desired.analysis.analyzers.get(name) {
                analysis.analyzers.insert(name.clone(), analyzer.clone());
            }
        }
        for component in diff.missing_components.iter().chain(&diff.incompatible_components) {
            if let Some(definition) = desired.analysis.components(component.kind).get(&component.name) {
                analysis.components_mut(component.kind).insert(component.name.clone(), definition.clone());
            }
        }

        Self { dynamic, fields, analysis }
    }

    pub fn has_mapping_changes(&self) -> bool {
        self.dynamic.is_some() || !self.fields.is_empty()
    }

    pub fn has_analysis_changes(&self) -> bool {
        !self.analysis.is_empty()
    }

    pub fn mapping_json(&self) -> Value {
        mapping_json(self.dynamic, self.fields.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaAction {
    /// Schema management is disabled for the index.
    Skip,
    Unchanged,
    Create,
    Update(SchemaUpdate),
    DropAndCreate {
        exists: bool,
    },
}

/// Decides what to do with an index given its desired schema and the schema
/// currently deployed (`None` when the index does not exist).
pub fn resolve(
    strategy: SchemaStrategy,
    desired: &IndexSchema,
    current: Option<&IndexSchema>,
    force_drop: bool
) -> SchemaResult<SchemaAction> {
    let index = desired.index_name.as_str();
    match strategy {
        SchemaStrategy::None => Ok(SchemaAction::Skip),
        SchemaStrategy::DropAndCreate => Ok(SchemaAction::DropAndCreate { exists: current.is_some() }),
        SchemaStrategy::Validate => {
            let result = match current {
                Some(current) => diff(desired, current),
                None => SchemaDiff::against_absent(desired),
            };
            if result.is_empty() {
                info!("Index '{}' matches its declared schema", index);
                Ok(SchemaAction::Unchanged)
            } else {
                Err(SchemaError::SchemaValidation {
                    index: index.to_string(),
                    diff: result,
                })
            }
        }
        SchemaStrategy::Create =>
            match current {
                None => Ok(SchemaAction::Create),
                Some(_) => {
                    info!("Index '{}' already exists, leaving it untouched", index);
                    Ok(SchemaAction::Unchanged)
                }
            }
        SchemaStrategy::CreateOrUpdate => {
            let Some(current) = current else {
                return Ok(SchemaAction::Create);
            };
            let result = diff(desired, current);
            if result.is_empty() {
                return Ok(SchemaAction::Unchanged);
            }
            if result.requires_rebuild() {
                if force_drop {
                    warn!("Index '{}' cannot be updated in place, dropping and recreating it:\n{}", index, result);
                    return Ok(SchemaAction::DropAndCreate { exists: true });
                }
                return Err(SchemaError::UnsupportedSchemaUpdate {
                    index: index.to_string(),
                    details: result.to_string(),
                });
            }
            Ok(SchemaAction::Update(SchemaUpdate::from_diff(desired, &result)))
        }
    }
}
