//! rulesflow: paquete raíz del workspace.
//!
//! Re-exporta el motor (`rf_core`) y la migración (`rf_migration`) y añade
//! `demo`, un workflow de ejemplo que usan `main-core` y los tests
//! end-to-end.

pub mod demo;

pub use rf_core;
pub use rf_migration;
