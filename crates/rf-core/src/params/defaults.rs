use crate::model::{State, Transition, Workflow, WorkflowEffect};

use super::values::ParameterValues;

/// Parámetros fijos de una transición disparada.
///
/// `from_state`, `to_state` y `next_state` son tres valores distintos:
/// `next_state` es `to_state` o, si la transición no mueve el estado,
/// `from_state`.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultParameters {
    pub child_tracking_id: i64,
    pub parent_tracking_id: i64,
    pub workflow: Workflow,
    pub transition: Transition,
    pub from_state: Option<State>,
    pub to_state: Option<State>,
    pub next_state: Option<State>,
}

impl DefaultParameters {
    pub fn new(child_tracking_id: i64,
               parent_tracking_id: i64,
               workflow: Workflow,
               transition: Transition,
               from_state: Option<State>,
               to_state: Option<State>)
               -> Self {
        let next_state = to_state.clone().or_else(|| from_state.clone());
        Self { child_tracking_id, parent_tracking_id, workflow, transition, from_state, to_state, next_state }
    }

    pub fn workflow_code(&self) -> &str {
        &self.workflow.code
    }

    pub fn transition_code(&self) -> &str {
        &self.transition.code
    }

    pub fn from_state_code(&self) -> Option<&str> {
        self.from_state.as_ref().map(|s| s.code.as_str())
    }

    pub fn to_state_code(&self) -> Option<&str> {
        self.to_state.as_ref().map(|s| s.code.as_str())
    }

    pub fn next_state_code(&self) -> Option<&str> {
        self.next_state.as_ref().map(|s| s.code.as_str())
    }
}

/// Lo que recibe `do_effect`: defaults y parámetros de transición
/// (compartidos por todos los efectos de la transición) más los parámetros
/// custom del efecto concreto.
#[derive(Debug, Clone)]
pub struct RulesFrameworkParameters<'a> {
    pub defaults: &'a DefaultParameters,
    pub transition: &'a ParameterValues,
    pub custom: ParameterValues,
    pub effect: &'a WorkflowEffect,
}

impl RulesFrameworkParameters<'_> {
    pub fn child_tracking_id(&self) -> i64 {
        self.defaults.child_tracking_id
    }

    pub fn parent_tracking_id(&self) -> i64 {
        self.defaults.parent_tracking_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_state_falls_back_to_from_state() {
        let from = State { id: 1, code: "OPEN".into(), ..Default::default() };
        let to = State { id: 2, code: "CLOSED".into(), ..Default::default() };
        let stay = DefaultParameters::new(10, 5, Workflow::default(), Transition::default(), Some(from.clone()), None);
        assert_eq!(stay.next_state_code(), Some("OPEN"));
        assert_eq!(stay.to_state_code(), None);
        let moving = DefaultParameters::new(10, 5, Workflow::default(), Transition::default(), Some(from), Some(to));
        assert_eq!(moving.next_state_code(), Some("CLOSED"));
        assert_eq!(moving.from_state_code(), Some("OPEN"));
    }
}
