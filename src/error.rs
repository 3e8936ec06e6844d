use std::fmt;
use thiserror::Error;

use crate::diff::SchemaDiff;

pub type SchemaResult<T> = Result<T, SchemaError>;

/// A single cluster operation performed while applying a schema action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStep {
    DeleteIndex,
    CreateIndex,
    CloseIndex,
    PutSettings,
    OpenIndex,
    PutMapping,
    WaitForStatus,
}

impl fmt::Display for ApplyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplyStep::DeleteIndex => "delete index",
            ApplyStep::CreateIndex => "create index",
            ApplyStep::CloseIndex => "close index",
            ApplyStep::PutSettings => "put analysis settings",
            ApplyStep::OpenIndex => "open index",
            ApplyStep::PutMapping => "put mapping",
            ApplyStep::WaitForStatus => "wait for index status",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid schema declaration for index '{index}': {reason}")]
    InvalidDeclaration {
        index: String,
        reason: String,
    },

    #[error("Index '{index}' does not match the declared schema:\n{diff}")]
    SchemaValidation {
        index: String,
        diff: SchemaDiff,
    },

    #[error("Index '{index}' cannot be updated in place: {details}")]
    UnsupportedSchemaUpdate {
        index: String,
        details: String,
    },

    #[error("Cluster request '{operation}' failed: {message}")]
    ClusterCommunication {
        operation: String,
        message: String,
    },

    #[error("Failed to {step} for index '{index}': {source}")]
    ApplyFailed {
        index: String,
        step: ApplyStep,
        #[source]
        source: Box<SchemaError>,
    },

    #[error("Invalid value '{value}' for configuration key '{key}': {reason}")]
    InvalidConfiguration {
        key: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn invalid_declaration(index: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidDeclaration {
            index: index.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn cluster(operation: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::ClusterCommunication {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
