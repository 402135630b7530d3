//! Abstracción del colaborador relacional: definiciones + objetos rastreados.

pub mod memory;
pub mod types;

pub use memory::InMemoryRfStore;
pub use types::{ChildObject, DefinitionStore, Record, RfStore, RfTable, TrackedObjectStore};
