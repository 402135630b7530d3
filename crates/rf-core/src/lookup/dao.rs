//! `RfDao`: carga por id o por código, con los órdenes garantizados.
//!
//! Órdenes:
//! - estados y transiciones: (order, name, id)
//! - efectos: (execution_order, name, id), también al dispararlos
//! - parámetros: (order, name, id)
//! - bindings: (list_order, id)
//!
//! `order` / `list_order` nulos van al final.

use crate::errors::RfError;
use crate::model::definition::*;
use crate::repo::{DefinitionStore, Record};

fn nulls_last(order: Option<i64>) -> (bool, i64) {
    (order.is_none(), order.unwrap_or_default())
}

fn unique<R>(entity: &'static str, code: &str, mut rows: Vec<R>) -> Result<R, RfError> {
    match rows.len() {
        1 => Ok(rows.remove(0)),
        0 => Err(RfError::NotFound { entity, key: code.to_string() }),
        found => Err(RfError::NotUnique { entity, code: code.to_string(), found }),
    }
}

/// Vista de un workflow completo, cargada de una vez.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowGraph {
    pub workflow: Workflow,
    pub states: Vec<State>,
    pub transitions: Vec<TransitionNode>,
    pub effects: Vec<EffectNode>,
    pub parameters: Vec<WorkflowParameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionNode {
    pub transition: Transition,
    pub from_state_ids: Vec<i64>,
    pub role_ids: Vec<i64>,
    pub parameter_values: Vec<TransitionParameterValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectNode {
    pub effect: WorkflowEffect,
    /// `None` si el script referenciado ya no existe.
    pub script: Option<Script>,
    pub transition_ids: Vec<i64>,
    pub parameter_values: Vec<ScriptParameterValue>,
}

impl WorkflowGraph {
    pub fn state(&self, id: i64) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }

    pub fn transition_by_code(&self, code: &str) -> Option<&TransitionNode> {
        self.transitions.iter().find(|t| t.transition.code == code)
    }

    pub fn effect_by_code(&self, code: &str) -> Option<&EffectNode> {
        self.effects.iter().find(|e| e.effect.code == code)
    }
}

/// Accesores de lectura sobre un `DefinitionStore`.
pub struct RfDao<'a, S> {
    store: &'a S,
}

impl<'a, S: DefinitionStore> RfDao<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn by_id<R: Record>(&self, entity: &'static str, id: i64) -> Result<R, RfError> {
        self.store.find::<R>(id)?.ok_or_else(|| RfError::NotFound { entity, key: id.to_string() })
    }

    // --- workflows ---------------------------------------------------------

    pub fn workflow(&self, id: i64) -> Result<Workflow, RfError> {
        self.by_id("workflow", id)
    }

    /// Falla con `NotFound` / `NotUnique` salvo que exista exactamente uno.
    pub fn workflow_by_code(&self, code: &str) -> Result<Workflow, RfError> {
        unique("workflow", code, self.store.load_where(|w: &Workflow| w.code == code)?)
    }

    pub fn workflows(&self) -> Result<Vec<Workflow>, RfError> {
        Ok(self.store.load()?)
    }

    // --- states / transitions ---------------------------------------------

    pub fn state(&self, id: i64) -> Result<State, RfError> {
        self.by_id("state", id)
    }

    pub fn state_by_code(&self, workflow_id: i64, code: &str) -> Result<State, RfError> {
        let rows = self.store.load_by::<State>("workflow_id", workflow_id)?;
        unique("state", code, rows.into_iter().filter(|s| s.code == code).collect())
    }

    pub fn states(&self, workflow_id: i64) -> Result<Vec<State>, RfError> {
        let mut rows = self.store.load_by::<State>("workflow_id", workflow_id)?;
        rows.sort_by(|a, b| {
                (nulls_last(a.sort_order), &a.name, a.id).cmp(&(nulls_last(b.sort_order), &b.name, b.id))
            });
        Ok(rows)
    }

    pub fn transition(&self, id: i64) -> Result<Transition, RfError> {
        self.by_id("transition", id)
    }

    pub fn transition_by_code(&self, workflow_id: i64, code: &str) -> Result<Transition, RfError> {
        unique("transition",
               code,
               self.store
                   .load_by::<Transition>("workflow_id", workflow_id)?
                   .into_iter()
                   .filter(|t| t.code == code)
                   .collect())
    }

    pub fn transitions(&self, workflow_id: i64) -> Result<Vec<Transition>, RfError> {
        let mut rows = self.store.load_by::<Transition>("workflow_id", workflow_id)?;
        rows.sort_by(|a, b| {
                (nulls_last(a.sort_order), &a.name, a.id).cmp(&(nulls_last(b.sort_order), &b.name, b.id))
            });
        Ok(rows)
    }

    pub fn from_state_ids(&self, transition_id: i64) -> Result<Vec<i64>, RfError> {
        let mut rows = self.store.load_by::<TransitionFromState>("transition_id", transition_id)?;
        rows.sort_by_key(|b| (nulls_last(b.list_order), b.id));
        Ok(rows.into_iter().map(|b| b.state_id).collect())
    }

    pub fn role_ids(&self, transition_id: i64) -> Result<Vec<i64>, RfError> {
        let mut rows = self.store.load_by::<TransitionRole>("transition_id", transition_id)?;
        rows.sort_by_key(|b| (nulls_last(b.list_order), b.id));
        Ok(rows.into_iter().map(|b| b.role_id).collect())
    }

    // --- effects / scripts -------------------------------------------------

    pub fn effect(&self, id: i64) -> Result<WorkflowEffect, RfError> {
        self.by_id("workflow effect", id)
    }

    pub fn effects(&self, workflow_id: i64) -> Result<Vec<WorkflowEffect>, RfError> {
        let mut rows = self.store.load_by::<WorkflowEffect>("workflow_id", workflow_id)?;
        rows.sort_by(|a, b| (a.execution_order, &a.name, a.id).cmp(&(b.execution_order, &b.name, b.id)));
        Ok(rows)
    }

    /// Efectos ligados a la transición, en orden de disparo.
    pub fn effects_for_transition(&self, transition_id: i64) -> Result<Vec<WorkflowEffect>, RfError> {
        let mut rows = Vec::new();
        for binding in self.store.load_by::<EffectTransition>("transition_id", transition_id)? {
            // un binding a un efecto borrado se ignora
            if let Some(effect) = self.store.find::<WorkflowEffect>(binding.effect_id)? {
                if !rows.iter().any(|e: &WorkflowEffect| e.id == effect.id) {
                    rows.push(effect);
                }
            }
        }
        rows.sort_by(|a, b| (a.execution_order, &a.name, a.id).cmp(&(b.execution_order, &b.name, b.id)));
        Ok(rows)
    }

    pub fn effect_transition_ids(&self, effect_id: i64) -> Result<Vec<i64>, RfError> {
        let mut rows = self.store.load_by::<EffectTransition>("effect_id", effect_id)?;
        rows.sort_by_key(|b| (nulls_last(b.list_order), b.id));
        Ok(rows.into_iter().map(|b| b.transition_id).collect())
    }

    pub fn script(&self, id: i64) -> Result<Script, RfError> {
        self.by_id("script", id)
    }

    pub fn script_by_code(&self, code: &str) -> Result<Script, RfError> {
        unique("script", code, self.store.load_where(|s: &Script| s.code == code)?)
    }

    // --- parameters ----------------------------------------------------------

    pub fn script_parameter(&self, id: i64) -> Result<ScriptParameter, RfError> {
        self.by_id("script parameter", id)
    }

    pub fn script_parameters(&self, script_id: i64) -> Result<Vec<ScriptParameter>, RfError> {
        let mut rows = self.store.load_by::<ScriptParameter>("script_id", script_id)?;
        rows.sort_by(|a, b| {
                (nulls_last(a.sort_order), &a.name, a.id).cmp(&(nulls_last(b.sort_order), &b.name, b.id))
            });
        Ok(rows)
    }

    pub fn workflow_parameter(&self, id: i64) -> Result<WorkflowParameter, RfError> {
        self.by_id("workflow parameter", id)
    }

    pub fn workflow_parameters(&self, workflow_id: i64) -> Result<Vec<WorkflowParameter>, RfError> {
        let mut rows = self.store.load_by::<WorkflowParameter>("workflow_id", workflow_id)?;
        rows.sort_by(|a, b| {
                (nulls_last(a.sort_order), &a.name, a.id).cmp(&(nulls_last(b.sort_order), &b.name, b.id))
            });
        Ok(rows)
    }

    pub fn script_parameter_values(&self, effect_id: i64) -> Result<Vec<ScriptParameterValue>, RfError> {
        Ok(self.store.load_by("effect_id", effect_id)?)
    }

    pub fn transition_parameter_values(&self, transition_id: i64) -> Result<Vec<TransitionParameterValue>, RfError> {
        Ok(self.store.load_by("transition_id", transition_id)?)
    }

    // --- reference data ------------------------------------------------------

    pub fn lookup(&self, id: i64) -> Result<Lookup, RfError> {
        self.by_id("lookup", id)
    }

    pub fn lookup_by_code(&self, code: &str) -> Result<Lookup, RfError> {
        unique("lookup", code, self.store.load_where(|l: &Lookup| l.code == code)?)
    }

    pub fn parameter_type(&self, id: i64) -> Result<ParameterType, RfError> {
        self.by_id("parameter type", id)
    }

    pub fn parameter_type_by_code(&self, code: &str) -> Result<ParameterType, RfError> {
        unique("parameter type", code, self.store.load_where(|p: &ParameterType| p.code == code)?)
    }

    pub fn role(&self, id: i64) -> Result<Role, RfError> {
        self.by_id("role", id)
    }

    pub fn role_by_key(&self, business_key: &str) -> Result<Role, RfError> {
        unique("role", business_key, self.store.load_where(|r: &Role| r.business_key == business_key)?)
    }

    // --- graph -------------------------------------------------------------------

    /// Carga ansiosa de un workflow con todos sus hijos.
    pub fn load_workflow_graph(&self, code: &str) -> Result<WorkflowGraph, RfError> {
        let workflow = self.workflow_by_code(code)?;
        let states = self.states(workflow.id)?;
        let transitions = self.transitions(workflow.id)?
                              .into_iter()
                              .map(|t| -> Result<TransitionNode, RfError> {
                                  Ok(TransitionNode { from_state_ids: self.from_state_ids(t.id)?,
                                                      role_ids: self.role_ids(t.id)?,
                                                      parameter_values: self.transition_parameter_values(t.id)?,
                                                      transition: t })
                              })
                              .collect::<Result<Vec<_>, RfError>>()?;
        let effects = self.effects(workflow.id)?
                          .into_iter()
                          .map(|e| -> Result<EffectNode, RfError> {
                              Ok(EffectNode { script: self.store.find::<Script>(e.script_id)?,
                                              transition_ids: self.effect_transition_ids(e.id)?,
                                              parameter_values: self.script_parameter_values(e.id)?,
                                              effect: e })
                          })
                          .collect::<Result<Vec<_>, RfError>>()?;
        let parameters = self.workflow_parameters(workflow.id)?;
        Ok(WorkflowGraph { workflow, states, transitions, effects, parameters })
    }
}
