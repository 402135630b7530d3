//! Upsert de entidades por clave de negocio, en orden de dependencias.
//!
//! Una fila que ya existe conserva su id y su código; sólo se reescribe si
//! algún campo cambió. Las referencias se resuelven contra los ids del
//! destino obtenidos en este mismo pase.

use std::collections::BTreeMap;

use rf_core::model::*;
use rf_core::{DefinitionStore, Record};

use super::plan::{ImportPlan, ParameterPlan};
use super::{unique_by, ImportReport};
use crate::columns::*;
use crate::error::MigrationError;

/// Ids del destino por código, para un workflow.
#[derive(Debug, Clone, Default)]
pub(crate) struct WorkflowTargets {
    pub id: i64,
    pub states: BTreeMap<String, i64>,
    pub transitions: BTreeMap<String, i64>,
    pub effects: BTreeMap<String, i64>,
    pub parameters: BTreeMap<String, i64>,
}

/// Ids del destino por código.
#[derive(Debug, Clone, Default)]
pub(crate) struct Targets {
    pub parameter_types: BTreeMap<String, i64>,
    pub lookups: BTreeMap<String, i64>,
    pub scripts: BTreeMap<String, i64>,
    /// Por (script, parámetro).
    pub script_parameters: BTreeMap<(String, String), i64>,
    pub workflows: BTreeMap<String, WorkflowTargets>,
}

pub(crate) fn target_of(map: &BTreeMap<String, i64>, entity: &'static str, code: &str) -> Result<i64, MigrationError> {
    map.get(code).copied().ok_or_else(|| MigrationError::NotFound { entity, key: code.to_string() })
}

fn opt_target(map: &BTreeMap<String, i64>, entity: &'static str, code: Option<&str>) -> Result<Option<i64>, MigrationError> {
    code.map(|c| target_of(map, entity, c)).transpose()
}

/// Inserta o actualiza `row` según exista `existing`. Devuelve el id destino.
fn put<S, R>(store: &mut S,
             report: &mut ImportReport,
             group: &'static str,
             existing: Option<R>,
             mut row: R)
             -> Result<i64, MigrationError>
    where S: DefinitionStore,
          R: Record + PartialEq
{
    match existing {
        Some(current) => {
            row.set_id(current.id());
            if row == current {
                ImportReport::bump(&mut report.unchanged, group, 1);
            } else {
                store.update(&row)?;
                ImportReport::bump(&mut report.updated, group, 1);
            }
            Ok(current.id())
        }
        None => {
            let id = store.insert(row)?;
            ImportReport::bump(&mut report.inserted, group, 1);
            Ok(id)
        }
    }
}

fn reference_data<S: DefinitionStore>(store: &mut S,
                                      plan: &ImportPlan,
                                      report: &mut ImportReport,
                                      targets: &mut Targets)
                                      -> Result<(), MigrationError> {
    for row in &plan.parameter_types {
        let existing = unique_by::<S, ParameterType, _>(store, "parameter type", &row.code, |r| r.code == row.code)?;
        let id = put(store, report, PARAMETER_TYPE, existing, row.clone())?;
        targets.parameter_types.insert(row.code.clone(), id);
    }
    for row in &plan.lookups {
        let existing = unique_by::<S, Lookup, _>(store, "lookup", &row.code, |r| r.code == row.code)?;
        let id = put(store, report, LOOKUP, existing, row.clone())?;
        targets.lookups.insert(row.code.clone(), id);
    }
    for row in &plan.scripts {
        let existing = unique_by::<S, Script, _>(store, "script", &row.code, |r| r.code == row.code)?;
        let id = put(store, report, SCRIPT, existing, row.clone())?;
        targets.scripts.insert(row.code.clone(), id);
    }
    for ParameterPlan { owner, parameter, parameter_type, lookup } in &plan.script_parameters {
        let script_id = target_of(&targets.scripts, "script", owner)?;
        let mut row = parameter.clone();
        row.script_id = script_id;
        row.parameter_type_id = opt_target(&targets.parameter_types, "parameter type", parameter_type.as_deref())?;
        row.lookup_id = opt_target(&targets.lookups, "lookup", lookup.as_deref())?;
        let existing = unique_by::<S, ScriptParameter, _>(store, "script parameter", &row.code, |r| {
                           r.script_id == script_id && r.code == row.code
                       })?;
        let code = row.code.clone();
        let id = put(store, report, SCRIPT_PARAMETER, existing, row)?;
        targets.script_parameters.insert((owner.clone(), code), id);
    }
    Ok(())
}

fn workflows<S: DefinitionStore>(store: &mut S,
                                 plan: &ImportPlan,
                                 report: &mut ImportReport,
                                 targets: &mut Targets)
                                 -> Result<(), MigrationError> {
    for wf in plan.workflows.values() {
        let code = wf.workflow.code.as_str();
        let existing = unique_by::<S, Workflow, _>(store, "workflow", code, |r| r.code == code)?;
        let id = put(store, report, WORKFLOW, existing, wf.workflow.clone())?;
        let mut local = WorkflowTargets { id, ..WorkflowTargets::default() };

        for state in &wf.states {
            let mut row = state.clone();
            row.workflow_id = id;
            let existing = unique_by::<S, State, _>(store, "state", &row.code, |r| r.workflow_id == id && r.code == row.code)?;
            let state_id = put(store, report, STATE, existing, row)?;
            local.states.insert(state.code.clone(), state_id);
        }

        for tp in wf.transitions.values() {
            let mut row = tp.transition.clone();
            row.workflow_id = id;
            row.to_state_id = opt_target(&local.states, "state", tp.to_state.as_deref())?;
            let existing =
                unique_by::<S, Transition, _>(store, "transition", &row.code, |r| r.workflow_id == id && r.code == row.code)?;
            let transition_id = put(store, report, TRANSITION, existing, row)?;
            local.transitions.insert(tp.transition.code.clone(), transition_id);
        }

        for ep in wf.effects.values() {
            let mut row = ep.effect.clone();
            row.workflow_id = id;
            row.script_id = target_of(&targets.scripts, "script", &ep.script)?;
            let existing =
                unique_by::<S, WorkflowEffect, _>(store, "effect", &row.code, |r| r.workflow_id == id && r.code == row.code)?;
            let effect_id = put(store, report, WORKFLOW_EFFECT, existing, row)?;
            local.effects.insert(ep.effect.code.clone(), effect_id);
        }

        for ParameterPlan { parameter, parameter_type, lookup, .. } in &wf.parameters {
            let mut row = parameter.clone();
            row.workflow_id = id;
            row.parameter_type_id = opt_target(&targets.parameter_types, "parameter type", parameter_type.as_deref())?;
            row.lookup_id = opt_target(&targets.lookups, "lookup", lookup.as_deref())?;
            let existing = unique_by::<S, WorkflowParameter, _>(store, "workflow parameter", &row.code, |r| {
                               r.workflow_id == id && r.code == row.code
                           })?;
            let parameter_id = put(store, report, WORKFLOW_PARAMETER, existing, row)?;
            local.parameters.insert(parameter.code.clone(), parameter_id);
        }

        targets.workflows.insert(code.to_string(), local);
    }
    Ok(())
}

/// Tipos, lookups, scripts, parámetros de script, workflows, estados,
/// transiciones, efectos y parámetros de workflow.
pub(crate) fn upsert_entities<S: DefinitionStore>(store: &mut S,
                                                  plan: &ImportPlan,
                                                  report: &mut ImportReport)
                                                  -> Result<Targets, MigrationError> {
    let mut targets = Targets::default();
    reference_data(store, plan, report, &mut targets)?;
    workflows(store, plan, report, &mut targets)?;
    Ok(targets)
}
