//! Borrado de miembros que el documento ya no trae.
//!
//! El documento manda sobre la membresía de cada workflow que menciona:
//! estados, transiciones, efectos y parámetros del destino cuyo código no
//! aparece se borran. Workflows, scripts, lookups y tipos nunca se borran.

use std::collections::BTreeSet;

use log::info;
use rf_core::model::*;
use rf_core::DefinitionStore;

use super::plan::ImportPlan;
use super::{delete_where, unique_by, ImportReport};
use crate::columns::*;
use crate::error::MigrationError;

pub(crate) fn delete_orphans<S: DefinitionStore>(store: &mut S,
                                                 plan: &ImportPlan,
                                                 report: &mut ImportReport)
                                                 -> Result<(), MigrationError> {
    for wf in plan.workflows.values() {
        let code = wf.workflow.code.as_str();
        let Some(target) = unique_by::<S, Workflow, _>(store, "workflow", code, |w| w.code == code)? else {
            continue;
        };
        let id = target.id;

        let states: BTreeSet<&str> = wf.states.iter().map(|s| s.code.as_str()).collect();
        let transitions: BTreeSet<&str> = wf.transitions.values().map(|t| t.transition.code.as_str()).collect();
        let effects: BTreeSet<&str> = wf.effects.values().map(|e| e.effect.code.as_str()).collect();
        let parameters: BTreeSet<&str> = wf.parameters.iter().map(|p| p.parameter.code.as_str()).collect();

        let mut n = delete_where::<S, State, _>(store, report, STATE, |s| {
            s.workflow_id == id && !states.contains(s.code.as_str())
        })?;
        n += delete_where::<S, Transition, _>(store, report, TRANSITION, |t| {
            t.workflow_id == id && !transitions.contains(t.code.as_str())
        })?;
        n += delete_where::<S, WorkflowEffect, _>(store, report, WORKFLOW_EFFECT, |e| {
            e.workflow_id == id && !effects.contains(e.code.as_str())
        })?;
        n += delete_where::<S, WorkflowParameter, _>(store, report, WORKFLOW_PARAMETER, |p| {
            p.workflow_id == id && !parameters.contains(p.code.as_str())
        })?;
        if n > 0 {
            info!("import: workflow {code}: removed {n} member(s) absent from the document");
        }
    }
    Ok(())
}
