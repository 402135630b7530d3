//! Chequeo de consistencia de un workflow. No modifica nada; devuelve las
//! anomalías encontradas para que el operador decida.

use std::fmt;

use super::dao::RfDao;
use crate::errors::RfError;
use crate::model::{ElementRef, State};
use crate::repo::DefinitionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionIssue {
    NoInitialTransition,
    MultipleInitialTransitions(Vec<String>),
    /// Transición no inicial sin estados origen: nunca será elegible.
    NoFromStates { transition: String },
    ForeignToState { transition: String, state_id: i64 },
    DanglingToState { transition: String, state_id: i64 },
    UnboundEffect { effect: String },
    MissingScript { effect: String },
    UnregisteredScript { effect: String, script_object: String },
    InvalidElement { field: &'static str, value: String },
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInitialTransition => write!(f, "no initial transition"),
            Self::MultipleInitialTransitions(codes) => {
                write!(f, "multiple initial transitions: {}", codes.join(", "))
            }
            Self::NoFromStates { transition } => write!(f, "transition {transition} has no from-states"),
            Self::ForeignToState { transition, state_id } => {
                write!(f, "transition {transition} targets state {state_id} of another workflow")
            }
            Self::DanglingToState { transition, state_id } => {
                write!(f, "transition {transition} targets missing state {state_id}")
            }
            Self::UnboundEffect { effect } => write!(f, "effect {effect} is bound to no transition"),
            Self::MissingScript { effect } => write!(f, "effect {effect} references a missing script"),
            Self::UnregisteredScript { effect, script_object } => {
                write!(f, "effect {effect} uses unregistered script object {script_object}")
            }
            Self::InvalidElement { field, value } => write!(f, "{field} {value:?} is not a table.column reference"),
        }
    }
}

/// Valida el workflow `code`. `is_registered`, si se pasa, indica qué
/// `script_object` sabe resolver el registro de scripts.
pub fn validate_workflow<S: DefinitionStore>(store: &S,
                                             code: &str,
                                             is_registered: Option<&dyn Fn(&str) -> bool>)
                                             -> Result<Vec<DefinitionIssue>, RfError> {
    let graph = RfDao::new(store).load_workflow_graph(code)?;
    let mut issues = Vec::new();

    for (field, value) in [("parent_state_element", &graph.workflow.parent_state_element),
                           ("child_transition_element", &graph.workflow.child_transition_element)]
    {
        if ElementRef::parse(value).is_err() {
            issues.push(DefinitionIssue::InvalidElement { field, value: value.clone() });
        }
    }

    let initials: Vec<String> = graph.transitions
                                     .iter()
                                     .filter(|n| n.transition.initial_transition)
                                     .map(|n| n.transition.code.clone())
                                     .collect();
    match initials.len() {
        0 => issues.push(DefinitionIssue::NoInitialTransition),
        1 => {}
        _ => issues.push(DefinitionIssue::MultipleInitialTransitions(initials)),
    }

    for node in &graph.transitions {
        let t = &node.transition;
        if !t.initial_transition && node.from_state_ids.is_empty() {
            issues.push(DefinitionIssue::NoFromStates { transition: t.code.clone() });
        }
        if let Some(state_id) = t.to_state_id {
            if graph.state(state_id).is_none() {
                let issue = match store.find::<State>(state_id)? {
                    Some(_) => DefinitionIssue::ForeignToState { transition: t.code.clone(), state_id },
                    None => DefinitionIssue::DanglingToState { transition: t.code.clone(), state_id },
                };
                issues.push(issue);
            }
        }
    }

    for node in &graph.effects {
        let effect = node.effect.code.clone();
        if node.transition_ids.is_empty() {
            issues.push(DefinitionIssue::UnboundEffect { effect: effect.clone() });
        }
        match (&node.script, is_registered) {
            (None, _) => issues.push(DefinitionIssue::MissingScript { effect }),
            (Some(script), Some(known)) if !known(&script.script_object) => {
                issues.push(DefinitionIssue::UnregisteredScript { effect, script_object: script.script_object.clone() })
            }
            _ => {}
        }
    }
    Ok(issues)
}
