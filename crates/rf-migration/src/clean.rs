//! Limpieza de referencias colgantes en un entorno.
//!
//! Se ejecuta antes de exportar y tres veces durante el import. Cada regla
//! lee el estado actual del store, así que el orden importa: borrar efectos
//! huérfanos deja colgando sus bindings, que la regla siguiente recoge.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use rf_core::model::*;
use rf_core::{DefinitionStore, Record, StoreError};

/// Filas borradas y referencias anuladas, por tabla.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: BTreeMap<&'static str, usize>,
    pub nulled: BTreeMap<&'static str, usize>,
}

impl CleanReport {
    pub fn removed_total(&self) -> usize {
        self.removed.values().sum()
    }

    pub fn nulled_total(&self) -> usize {
        self.nulled.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.removed_total() == 0 && self.nulled_total() == 0
    }

    pub fn removed_from<R: Record>(&self) -> usize {
        self.removed.get(R::TABLE.table_name()).copied().unwrap_or_default()
    }

    /// Acumula otro informe en éste.
    pub fn absorb(&mut self, other: CleanReport) {
        for (table, n) in other.removed {
            *self.removed.entry(table).or_default() += n;
        }
        for (table, n) in other.nulled {
            *self.nulled.entry(table).or_default() += n;
        }
    }
}

fn ids<S: DefinitionStore, R: Record>(store: &S) -> Result<BTreeSet<i64>, StoreError> {
    Ok(store.load::<R>()?.iter().map(|r| r.id()).collect())
}

/// Borra las filas de `R` para las que `dangling` es verdadero.
fn purge<S, R, F>(store: &mut S, report: &mut CleanReport, dangling: F) -> Result<(), StoreError>
    where S: DefinitionStore,
          R: Record,
          F: Fn(&R) -> bool
{
    let doomed: Vec<i64> = store.load::<R>()?.iter().filter(|r| dangling(r)).map(|r| r.id()).collect();
    if doomed.is_empty() {
        return Ok(());
    }
    let n = store.delete::<R>(&doomed)?;
    debug!("clean: removed {n} row(s) from {}", R::TABLE.table_name());
    *report.removed.entry(R::TABLE.table_name()).or_default() += n;
    Ok(())
}

/// Reescribe las filas de `R` que `fix` modifica (devuelve `true`).
fn repair<S, R, F>(store: &mut S, report: &mut CleanReport, fix: F) -> Result<(), StoreError>
    where S: DefinitionStore,
          R: Record,
          F: Fn(&mut R) -> bool
{
    for mut row in store.load::<R>()? {
        if fix(&mut row) {
            store.update(&row)?;
            *report.nulled.entry(R::TABLE.table_name()).or_default() += 1;
        }
    }
    Ok(())
}

fn null_missing(slot: &mut Option<i64>, live: &BTreeSet<i64>) -> bool {
    match *slot {
        Some(id) if !live.contains(&id) => {
            *slot = None;
            true
        }
        _ => false,
    }
}

/// Repara el entorno: borra filas cuyo dueño ya no existe y anula
/// referencias opcionales colgantes. No toca workflows, scripts, lookups,
/// tipos de parámetro ni roles.
pub fn clean<S: DefinitionStore>(store: &mut S) -> Result<CleanReport, StoreError> {
    let mut report = CleanReport::default();

    // Filas estructurales sin workflow o sin script.
    let workflows = ids::<S, Workflow>(store)?;
    let scripts = ids::<S, Script>(store)?;
    purge::<S, State, _>(store, &mut report, |s| !workflows.contains(&s.workflow_id))?;
    purge::<S, Transition, _>(store, &mut report, |t| !workflows.contains(&t.workflow_id))?;
    purge::<S, WorkflowParameter, _>(store, &mut report, |p| !workflows.contains(&p.workflow_id))?;
    purge::<S, ScriptParameter, _>(store, &mut report, |p| !scripts.contains(&p.script_id))?;
    purge::<S, WorkflowEffect, _>(store, &mut report, |e| {
        !workflows.contains(&e.workflow_id) || !scripts.contains(&e.script_id)
    })?;

    let effects = ids::<S, WorkflowEffect>(store)?;
    let transitions = ids::<S, Transition>(store)?;
    purge::<S, EffectTransition, _>(store, &mut report, |b| {
        !effects.contains(&b.effect_id) || !transitions.contains(&b.transition_id)
    })?;

    let states = ids::<S, State>(store)?;
    purge::<S, TransitionFromState, _>(store, &mut report, |b| {
        !transitions.contains(&b.transition_id) || !states.contains(&b.state_id)
    })?;
    repair::<S, Transition, _>(store, &mut report, |t| null_missing(&mut t.to_state_id, &states))?;

    let roles = ids::<S, Role>(store)?;
    purge::<S, TransitionRole, _>(store, &mut report, |b| {
        !transitions.contains(&b.transition_id) || !roles.contains(&b.role_id)
    })?;

    let script_params = ids::<S, ScriptParameter>(store)?;
    purge::<S, ScriptParameterValue, _>(store, &mut report, |v| {
        !script_params.contains(&v.script_parameter_id) || !effects.contains(&v.effect_id)
    })?;
    let workflow_params = ids::<S, WorkflowParameter>(store)?;
    purge::<S, TransitionParameterValue, _>(store, &mut report, |v| {
        !workflow_params.contains(&v.workflow_parameter_id) || !transitions.contains(&v.transition_id)
    })?;

    let lookups = ids::<S, Lookup>(store)?;
    let types = ids::<S, ParameterType>(store)?;
    repair::<S, ScriptParameter, _>(store, &mut report, |p| {
        null_missing(&mut p.lookup_id, &lookups) | null_missing(&mut p.parameter_type_id, &types)
    })?;
    repair::<S, WorkflowParameter, _>(store, &mut report, |p| {
        null_missing(&mut p.lookup_id, &lookups) | null_missing(&mut p.parameter_type_id, &types)
    })?;

    if report.is_empty() {
        debug!("clean: nothing to repair");
    } else {
        info!("clean: removed {} row(s), nulled {} reference(s)", report.removed_total(), report.nulled_total());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use rf_core::InMemoryRfStore;

    use super::*;

    fn workflow(store: &mut InMemoryRfStore, code: &str) -> i64 {
        store.insert(Workflow { code: code.into(), name: code.into(), ..Default::default() }).unwrap()
    }

    #[test]
    fn removes_bindings_of_deleted_states_and_nulls_to_state() {
        let mut store = InMemoryRfStore::new();
        let wf = workflow(&mut store, "CASE");
        let open = store.insert(State { workflow_id: wf, code: "OPEN".into(), ..Default::default() }).unwrap();
        let gone = store.insert(State { workflow_id: wf, code: "GONE".into(), ..Default::default() }).unwrap();
        let t = store.insert(Transition { workflow_id: wf,
                                          code: "GO".into(),
                                          to_state_id: Some(gone),
                                          ..Default::default() })
                     .unwrap();
        store.insert(TransitionFromState { transition_id: t, state_id: open, ..Default::default() }).unwrap();
        store.insert(TransitionFromState { transition_id: t, state_id: gone, ..Default::default() }).unwrap();
        store.delete::<State>(&[gone]).unwrap();

        let report = clean(&mut store).unwrap();
        assert_eq!(report.removed_from::<TransitionFromState>(), 1);
        assert_eq!(report.nulled.get("t_rf_transition"), Some(&1));
        assert_eq!(store.find::<Transition>(t).unwrap().unwrap().to_state_id, None);
        let left = store.load::<TransitionFromState>().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].state_id, open);
    }

    #[test]
    fn cascades_from_missing_workflow_down_to_values() {
        let mut store = InMemoryRfStore::new();
        let keep = workflow(&mut store, "KEEP");
        let dropped = workflow(&mut store, "DROP");
        let script = store.insert(Script { code: "S".into(), script_object: "rf.noop".into(), ..Default::default() })
                          .unwrap();
        let param = store.insert(ScriptParameter { script_id: script, code: "P".into(), ..Default::default() })
                         .unwrap();
        let t = store.insert(Transition { workflow_id: dropped, code: "T".into(), ..Default::default() }).unwrap();
        let e = store.insert(WorkflowEffect { workflow_id: dropped, code: "E".into(), script_id: script, ..Default::default() })
                     .unwrap();
        store.insert(EffectTransition { effect_id: e, transition_id: t, ..Default::default() }).unwrap();
        store.insert(ScriptParameterValue { effect_id: e,
                                            script_parameter_id: param,
                                            value: Some("x".into()),
                                            ..Default::default() })
             .unwrap();
        store.insert(State { workflow_id: keep, code: "S1".into(), ..Default::default() }).unwrap();
        store.delete::<Workflow>(&[dropped]).unwrap();

        let report = clean(&mut store).unwrap();
        assert_eq!(report.removed_from::<Transition>(), 1);
        assert_eq!(report.removed_from::<WorkflowEffect>(), 1);
        assert_eq!(report.removed_from::<EffectTransition>(), 1);
        assert_eq!(report.removed_from::<ScriptParameterValue>(), 1);
        assert_eq!(store.load::<State>().unwrap().len(), 1);
        assert_eq!(store.load::<ScriptParameter>().unwrap().len(), 1);

        assert!(clean(&mut store).unwrap().is_empty());
    }

    #[test]
    fn skips_roles_that_were_removed() {
        let mut store = InMemoryRfStore::new();
        let wf = workflow(&mut store, "CASE");
        let t = store.insert(Transition { workflow_id: wf, code: "T".into(), ..Default::default() }).unwrap();
        let role = store.insert(Role { business_key: "CLERK".into(), ..Default::default() }).unwrap();
        store.insert(TransitionRole { transition_id: t, role_id: role, ..Default::default() }).unwrap();
        store.insert(TransitionRole { transition_id: t, role_id: 999, ..Default::default() }).unwrap();

        let report = clean(&mut store).unwrap();
        assert_eq!(report.removed_from::<TransitionRole>(), 1);
        assert_eq!(store.load::<TransitionRole>().unwrap()[0].role_id, role);
    }
}
