use std::fmt;

use crate::schema::{ ComponentKind, DynamicMapping, FieldMapping, IndexSchema };

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConflict {
    pub name: String,
    pub desired: FieldMapping,
    pub current: FieldMapping,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComponentRef {
    pub kind: ComponentKind,
    pub name: String,
}

/// Differences between a desired and a deployed schema. Fields that only exist
/// on the cluster are not reported: they cannot be removed from a mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    pub index_missing: bool,
    /// Expected and found dynamic setting.
    pub dynamic_mismatch: Option<(DynamicMapping, Option<DynamicMapping>)>,
    pub missing_fields: Vec<String>,
    pub incompatible_fields: Vec<FieldConflict>,
    pub missing_analyzers: Vec<String>,
    pub incompatible_analyzers: Vec<String>,
    pub missing_components: Vec<ComponentRef>,
    pub incompatible_components: Vec<ComponentRef>,
    /// Changed tokenizers that a deployed analyzer still references. The
    /// cluster cannot swap them under a live analyzer.
    pub changed_tokenizers_in_use: Vec<String>,
}

impl SchemaDiff {
    /// Diff against an index that does not exist: everything is missing.
    pub fn against_absent(desired: &IndexSchema) -> Self {
        let mut diff = diff(desired, &IndexSchema::new(&desired.index_name, &desired.mapping_type));
        diff.index_missing = true;
        diff
    }

    pub fn is_empty(&self) -> bool {
        !self.index_missing &&
            self.dynamic_mismatch.is_none() &&
            self.missing_fields.is_empty() &&
            self.incompatible_fields.is_empty() &&
            !self.requires_analysis_update()
    }

    /// Existing fields or in-use tokenizers changed in a way the cluster cannot
    /// apply in place.
    pub fn requires_rebuild(&self) -> bool {
        !self.incompatible_fields.is_empty() || !self.changed_tokenizers_in_use.is_empty()
    }

    pub fn requires_mapping_update(&self) -> bool {
        self.dynamic_mismatch.is_some() || !self.missing_fields.is_empty()
    }

    /// Analysis changes need the index to be closed while they are applied.
    pub fn requires_analysis_update(&self) -> bool {
        !self.missing_analyzers.is_empty() ||
            !self.incompatible_analyzers.is_empty() ||
            !self.missing_components.is_empty() ||
            !self.incompatible_components.is_empty()
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index_missing {
            writeln!(f, "- index does not exist")?;
        }
        if let Some((expected, found)) = &self.dynamic_mismatch {
            let found = found.map(|d| d.as_str()).unwrap_or("<unset>");
            writeln!(f, "- dynamic mapping: expected '{}', found '{}'", expected.as_str(), found)?;
        }
        for name in &self.missing_fields {
            writeln!(f, "- missing field '{}'", name)?;
        }
        for conflict in &self.incompatible_fields {
            writeln!(
                f,
                "- field '{}' is incompatible: expected {}, found {}",
                conflict.name,
                conflict.desired.to_json(),
                conflict.current.to_json()
            )?;
        }
        for name in &self.missing_analyzers {
            writeln!(f, "- missing analyzer '{}'", name)?;
        }
        for name in &self.incompatible_analyzers {
            writeln!(f, "- analyzer '{}' is incompatible", name)?;
        }
        for component in &self.missing_components {
            writeln!(f, "- missing {} '{}'", component.kind.label(), component.name)?;
        }
        for component in &self.incompatible_components {
            writeln!(f, "- {} '{}' is incompatible", component.kind.label(), component.name)?;
        }
        for name in &self.changed_tokenizers_in_use {
            writeln!(f, "- tokenizer '{}' is used by a deployed analyzer and cannot change in place", name)?;
        }
        Ok(())
    }
}

/// Compares canonical schemas. Parameter maps are ordered by key, so key order
/// in the source documents never produces a difference.
pub fn diff(desired: &IndexSchema, current: &IndexSchema) -> SchemaDiff {
    let mut result = SchemaDiff::default();

    if let Some(expected) = desired.dynamic {
        if current.dynamic != Some(expected) {
            result.dynamic_mismatch = Some((expected, current.dynamic));
        }
    }

    for (name, field) in &desired.fields {
        match current.fields.get(name) {
            None => result.missing_fields.push(name.clone()),
            Some(existing) if existing != field => {
                result.incompatible_fields.push(FieldConflict {
                    name: name.clone(),
                    desired: field.clone(),
                    current: existing.clone(),
                });
            }
            Some(_) => {}
        }
    }

    for (name, analyzer) in &desired.analysis.analyzers {
        match current.analysis.analyzers.get(name) {
            None => result.missing_analyzers.push(name.clone()),
            Some(existing) if existing != analyzer => result.incompatible_analyzers.push(name.clone()),
            Some(_) => {}
        }
    }

    for kind in ComponentKind::ALL {
        let existing_components = current.analysis.components(kind);
        for (name, component) in desired.analysis.components(kind) {
            let reference = ComponentRef { kind, name: name.clone() };
            match existing_components.get(name) {
                None => result.missing_components.push(reference),
                Some(existing) if existing != component => {
                    let in_use =
                        kind == ComponentKind::Tokenizer &&
                        current.analysis.analyzers.values().any(|analyzer| analyzer.tokenizer == *name);
                    if in_use {
                        result.changed_tokenizers_in_use.push(name.clone());
                    }
                    result.incompatible_components.push(reference);
                }
                Some(_) => {}
            }
        }
    }

    result
}
