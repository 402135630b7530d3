//! Servicio de lookup: accesores de sólo lectura sobre el modelo de
//! definición, elegibilidad de transiciones y validación de workflows.

pub mod dao;
pub mod eligibility;
pub mod validate;

pub use dao::{EffectNode, RfDao, TransitionNode, WorkflowGraph};
pub use eligibility::{child_transition_choices, parent_transition_choices};
pub use validate::{validate_workflow, DefinitionIssue};
