//! Bindings y valores: se borran y se vuelven a insertar desde el
//! documento. From-state y roles por transición, transiciones por efecto,
//! valores de parámetro por workflow.

use std::collections::BTreeSet;

use log::warn;
use rf_core::model::*;
use rf_core::{DefinitionStore, Record};

use super::plan::{ImportPlan, ValuePlan, WorkflowPlan};
use super::upsert::{target_of, Targets, WorkflowTargets};
use super::{delete_where, unique_by, ImportReport, SkippedRole};
use crate::columns::*;
use crate::error::MigrationError;

fn insert<S: DefinitionStore, R: Record>(store: &mut S,
                                         report: &mut ImportReport,
                                         group: &'static str,
                                         row: R)
                                         -> Result<(), MigrationError> {
    store.insert(row)?;
    ImportReport::bump(&mut report.inserted, group, 1);
    Ok(())
}

fn transition_bindings<S: DefinitionStore>(store: &mut S,
                                           wf: &WorkflowPlan,
                                           local: &WorkflowTargets,
                                           report: &mut ImportReport)
                                           -> Result<(), MigrationError> {
    for tp in wf.transitions.values() {
        let transition_id = target_of(&local.transitions, "transition", &tp.transition.code)?;

        delete_where::<S, TransitionFromState, _>(store, report, TRANSITION_FROM_STATE, |b| {
            b.transition_id == transition_id
        })?;
        for bound in &tp.from_states {
            let state_id = target_of(&local.states, "state", &bound.key)?;
            insert(store,
                   report,
                   TRANSITION_FROM_STATE,
                   TransitionFromState { id: 0, transition_id, state_id, list_order: bound.list_order })?;
        }

        delete_where::<S, TransitionRole, _>(store, report, TRANSITION_ROLE, |b| b.transition_id == transition_id)?;
        for bound in &tp.roles {
            match unique_by::<S, Role, _>(store, "role", &bound.key, |r| r.business_key == bound.key)? {
                Some(role) => insert(store,
                                     report,
                                     TRANSITION_ROLE,
                                     TransitionRole { id: 0, transition_id, role_id: role.id, list_order: bound.list_order })?,
                None => {
                    warn!("import: role {} not found in target; skipping binding on {}.{}",
                          bound.key, wf.workflow.code, tp.transition.code);
                    report.skipped_roles.push(SkippedRole { workflow: wf.workflow.code.clone(),
                                                            transition: tp.transition.code.clone(),
                                                            role: bound.key.clone() });
                }
            }
        }
    }
    Ok(())
}

fn effect_bindings<S: DefinitionStore>(store: &mut S,
                                       wf: &WorkflowPlan,
                                       local: &WorkflowTargets,
                                       report: &mut ImportReport)
                                       -> Result<(), MigrationError> {
    for ep in wf.effects.values() {
        let effect_id = target_of(&local.effects, "effect", &ep.effect.code)?;
        delete_where::<S, EffectTransition, _>(store, report, EFFECT_TRANSITION, |b| b.effect_id == effect_id)?;
        for bound in &ep.transitions {
            let transition_id = target_of(&local.transitions, "transition", &bound.key)?;
            insert(store,
                   report,
                   EFFECT_TRANSITION,
                   EffectTransition { id: 0, effect_id, transition_id, list_order: bound.list_order })?;
        }
    }
    Ok(())
}

fn script_parameter_id(targets: &Targets, value: &ValuePlan) -> Result<i64, MigrationError> {
    let script = value.script.clone().unwrap_or_default();
    targets.script_parameters
           .get(&(script.clone(), value.parameter.clone()))
           .copied()
           .ok_or_else(|| MigrationError::NotFound { entity: "script parameter",
                                                     key: format!("{script}.{}", value.parameter) })
}

fn parameter_values<S: DefinitionStore>(store: &mut S,
                                        wf: &WorkflowPlan,
                                        local: &WorkflowTargets,
                                        targets: &Targets,
                                        report: &mut ImportReport)
                                        -> Result<(), MigrationError> {
    let effects: BTreeSet<i64> = store.load_by::<WorkflowEffect>("workflow_id", local.id)?
                                      .iter()
                                      .map(|e| e.id)
                                      .collect();
    let transitions: BTreeSet<i64> = store.load_by::<Transition>("workflow_id", local.id)?
                                          .iter()
                                          .map(|t| t.id)
                                          .collect();
    delete_where::<S, ScriptParameterValue, _>(store, report, SCRIPT_PARAMETER_VALUE, |v| {
        effects.contains(&v.effect_id)
    })?;
    delete_where::<S, TransitionParameterValue, _>(store, report, TRANSITION_PARAMETER_VALUE, |v| {
        transitions.contains(&v.transition_id)
    })?;

    for ep in wf.effects.values() {
        let effect_id = target_of(&local.effects, "effect", &ep.effect.code)?;
        for value in &ep.values {
            let row = ScriptParameterValue { id: 0,
                                             effect_id,
                                             script_parameter_id: script_parameter_id(targets, value)?,
                                             value: value.value.clone() };
            insert(store, report, SCRIPT_PARAMETER_VALUE, row)?;
        }
    }
    for tp in wf.transitions.values() {
        let transition_id = target_of(&local.transitions, "transition", &tp.transition.code)?;
        for value in &tp.values {
            let row = TransitionParameterValue { id: 0,
                                                 transition_id,
                                                 workflow_parameter_id: target_of(&local.parameters,
                                                                                  "workflow parameter",
                                                                                  &value.parameter)?,
                                                 value: value.value.clone() };
            insert(store, report, TRANSITION_PARAMETER_VALUE, row)?;
        }
    }
    Ok(())
}

pub(crate) fn replace_bindings<S: DefinitionStore>(store: &mut S,
                                                   plan: &ImportPlan,
                                                   targets: &Targets,
                                                   report: &mut ImportReport)
                                                   -> Result<(), MigrationError> {
    for wf in plan.workflows.values() {
        let code = &wf.workflow.code;
        let local = targets.workflows
                           .get(code)
                           .ok_or_else(|| MigrationError::NotFound { entity: "workflow", key: code.clone() })?;
        transition_bindings(store, wf, local, report)?;
        effect_bindings(store, wf, local, report)?;
        parameter_values(store, wf, local, targets, report)?;
    }
    Ok(())
}
