//! rf-migration: documento portable, limpieza de referencias, export e
//! import de definiciones del Rules Framework entre entornos.
//!
//! Dentro del documento las filas se referencian con las claves
//! subrogadas del origen; el import las traduce a claves de negocio y de
//! ahí a las claves subrogadas del destino.
pub mod clean;
pub mod columns;
pub mod convert;
pub mod document;
pub mod error;
pub mod export;
pub mod hashing;
pub mod import;

pub use clean::{clean, CleanReport};
pub use convert::PortableRow;
pub use document::{DocumentRow, PortableDocument, RowView};
pub use error::{ImportPhase, MigrationError};
pub use export::{generate_export_document, WorkflowSelection};
pub use import::{perform_import, ImportReport, SkippedRole};
