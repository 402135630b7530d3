//! Modelo de definición del Rules Framework (workflows, estados,
//! transiciones, efectos, parámetros) y referencias al host.

pub mod context;
pub mod definition;
pub mod element;

pub use context::{HostContext, StaticHost, SystemHost};
pub use definition::{
    window_contains, EffectTransition, Lookup, ParameterType, Role, Script, ScriptParameter, ScriptParameterValue,
    State, Transition, TransitionFromState, TransitionParameterValue, TransitionRole, Workflow, WorkflowEffect,
    WorkflowParameter,
};
pub use element::ElementRef;
