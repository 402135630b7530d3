//! Errores de export / import.

use std::fmt;

use rf_core::{RfError, StoreError};
use thiserror::Error;

/// Fase del import en la que ocurrió un error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    ReadDocument,
    Clean,
    DeleteOrphans,
    CleanAfterDelete,
    UpsertEntities,
    UpsertBindings,
    FinalClean,
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportPhase::ReadDocument => "read document",
            ImportPhase::Clean => "clean",
            ImportPhase::DeleteOrphans => "delete orphans",
            ImportPhase::CleanAfterDelete => "clean after delete",
            ImportPhase::UpsertEntities => "upsert entities",
            ImportPhase::UpsertBindings => "upsert bindings and values",
            ImportPhase::FinalClean => "final clean",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("malformed document: {0}")] Malformed(String),
    #[error("{group} row {row}: missing column {column}")]
    MissingColumn { group: String, row: String, column: String },
    #[error("{group} row {row}: invalid {column} value {value:?}")]
    InvalidValue {
        group: String,
        row: String,
        column: String,
        value: String,
    },
    #[error("{group} has no row with {column} = {key:?}")]
    UnresolvedReference { group: String, column: String, key: String },
    #[error("{entity} {key:?} not found")] NotFound { entity: &'static str, key: String },
    #[error("{entity} code {code:?} matches {found} rows")]
    NotUnique { entity: &'static str, code: String, found: usize },
    #[error(transparent)] Store(#[from] StoreError),
    #[error(transparent)] Lookup(#[from] RfError),
    #[error("import failed during {phase}: {source}")]
    Phase {
        phase: ImportPhase,
        #[source]
        source: Box<MigrationError>,
    },
}

impl From<serde_json::Error> for MigrationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        Self::Malformed(format!("io: {err}"))
    }
}
