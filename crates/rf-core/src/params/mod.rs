//! Bundle de parámetros que recibe cada efecto.
//!
//! Tres capas, en el orden en que se construyen:
//! - `DefaultParameters`: ids de tracking, workflow, transición y estados.
//! - parámetros de transición (`WorkflowParameter` + valores por transición).
//! - parámetros custom (`ScriptParameter` + valores por efecto).

pub mod defaults;
pub mod values;

pub use defaults::{DefaultParameters, RulesFrameworkParameters};
pub use values::ParameterValues;
