//! `generate_export_document`: vuelca uno o varios workflows, con todo lo
//! que referencian, a un `PortableDocument`.

use std::collections::BTreeSet;

use log::info;
use rf_core::model::*;
use rf_core::DefinitionStore;

use crate::clean::clean;
use crate::convert::PortableRow;
use crate::document::{DocumentRow, PortableDocument};
use crate::error::MigrationError;

/// Qué workflows exportar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowSelection {
    All,
    Ids(Vec<i64>),
}

impl WorkflowSelection {
    pub fn ids(ids: impl IntoIterator<Item = i64>) -> Self {
        WorkflowSelection::Ids(ids.into_iter().collect())
    }
}

fn to_rows<R: PortableRow>(rows: &[R]) -> Vec<DocumentRow> {
    rows.iter().map(PortableRow::to_row).collect()
}

fn push<R: PortableRow>(doc: &mut PortableDocument, rows: &[R]) {
    doc.push_group(R::GROUP, to_rows(rows));
}

fn select_workflows<S: DefinitionStore>(store: &S, selection: &WorkflowSelection) -> Result<Vec<Workflow>, MigrationError> {
    match selection {
        WorkflowSelection::All => Ok(store.load::<Workflow>()?),
        WorkflowSelection::Ids(ids) => {
            let wanted: BTreeSet<i64> = ids.iter().copied().collect();
            let found = store.load_where::<Workflow, _>(|w| wanted.contains(&w.id))?;
            if let Some(missing) = wanted.iter().find(|id| !found.iter().any(|w| w.id == **id)) {
                return Err(MigrationError::NotFound { entity: "workflow", key: missing.to_string() });
            }
            Ok(found)
        }
    }
}

/// Limpia el entorno de origen y exporta la selección.
///
/// Los grupos siempre aparecen, aunque estén vacíos. Tipos de parámetro y
/// roles se exportan completos; scripts y lookups, sólo los usados.
pub fn generate_export_document<S: DefinitionStore>(store: &mut S,
                                                    selection: &WorkflowSelection)
                                                    -> Result<PortableDocument, MigrationError> {
    clean(store)?;
    let store: &S = store;

    let workflows = select_workflows(store, selection)?;
    let wf_ids: BTreeSet<i64> = workflows.iter().map(|w| w.id).collect();

    let states = store.load_where::<State, _>(|s| wf_ids.contains(&s.workflow_id))?;
    let transitions = store.load_where::<Transition, _>(|t| wf_ids.contains(&t.workflow_id))?;
    let effects = store.load_where::<WorkflowEffect, _>(|e| wf_ids.contains(&e.workflow_id))?;
    let workflow_parameters = store.load_where::<WorkflowParameter, _>(|p| wf_ids.contains(&p.workflow_id))?;

    let transition_ids: BTreeSet<i64> = transitions.iter().map(|t| t.id).collect();
    let effect_ids: BTreeSet<i64> = effects.iter().map(|e| e.id).collect();
    let script_ids: BTreeSet<i64> = effects.iter().map(|e| e.script_id).collect();

    let scripts = store.load_where::<Script, _>(|s| script_ids.contains(&s.id))?;
    let script_parameters = store.load_where::<ScriptParameter, _>(|p| script_ids.contains(&p.script_id))?;
    let lookup_ids: BTreeSet<i64> = script_parameters.iter()
                                                     .filter_map(|p| p.lookup_id)
                                                     .chain(workflow_parameters.iter().filter_map(|p| p.lookup_id))
                                                     .collect();
    let lookups = store.load_where::<Lookup, _>(|l| lookup_ids.contains(&l.id))?;

    let transition_values =
        store.load_where::<TransitionParameterValue, _>(|v| transition_ids.contains(&v.transition_id))?;
    let script_values = store.load_where::<ScriptParameterValue, _>(|v| effect_ids.contains(&v.effect_id))?;
    let from_states = store.load_where::<TransitionFromState, _>(|b| transition_ids.contains(&b.transition_id))?;
    let roles_bound = store.load_where::<TransitionRole, _>(|b| transition_ids.contains(&b.transition_id))?;
    let effect_transitions = store.load_where::<EffectTransition, _>(|b| effect_ids.contains(&b.effect_id))?;

    let mut doc = PortableDocument::new();
    push(&mut doc, &store.load::<ParameterType>()?);
    push(&mut doc, &script_parameters);
    push(&mut doc, &lookups);
    push(&mut doc, &workflows);
    push(&mut doc, &states);
    push(&mut doc, &transitions);
    push(&mut doc, &transition_values);
    push(&mut doc, &workflow_parameters);
    push(&mut doc, &effects);
    push(&mut doc, &script_values);
    push(&mut doc, &scripts);
    push(&mut doc, &from_states);
    push(&mut doc, &roles_bound);
    push(&mut doc, &effect_transitions);
    push(&mut doc, &store.load::<Role>()?);

    info!("export: {} workflow(s), {} row(s) in {} group(s)",
          workflows.len(),
          doc.row_count(),
          doc.groups.len());
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use rf_core::InMemoryRfStore;

    use super::*;
    use crate::columns::*;

    fn two_workflows() -> (InMemoryRfStore, i64, i64) {
        let mut store = InMemoryRfStore::new();
        let script = store.insert(Script { code: "S".into(), script_object: "rf.noop".into(), ..Default::default() })
                          .unwrap();
        store.insert(Script { code: "UNUSED".into(), script_object: "rf.noop".into(), ..Default::default() })
             .unwrap();
        store.insert(Role { business_key: "CLERK".into(), name: "Clerk".into(), ..Default::default() }).unwrap();
        let a = store.insert(Workflow { code: "A".into(), ..Default::default() }).unwrap();
        let b = store.insert(Workflow { code: "B".into(), ..Default::default() }).unwrap();
        for wf in [a, b] {
            store.insert(State { workflow_id: wf, code: "OPEN".into(), ..Default::default() }).unwrap();
        }
        store.insert(WorkflowEffect { workflow_id: a, code: "E".into(), script_id: script, ..Default::default() })
             .unwrap();
        (store, a, b)
    }

    #[test]
    fn emits_every_group_in_a_fixed_order() {
        let (mut store, _, _) = two_workflows();
        let doc = generate_export_document(&mut store, &WorkflowSelection::All).unwrap();
        let groups: Vec<&str> = doc.groups.keys().map(String::as_str).collect();
        assert_eq!(groups,
                   vec![PARAMETER_TYPE,
                        SCRIPT_PARAMETER,
                        LOOKUP,
                        WORKFLOW,
                        STATE,
                        TRANSITION,
                        TRANSITION_PARAMETER_VALUE,
                        WORKFLOW_PARAMETER,
                        WORKFLOW_EFFECT,
                        SCRIPT_PARAMETER_VALUE,
                        SCRIPT,
                        TRANSITION_FROM_STATE,
                        TRANSITION_ROLE,
                        EFFECT_TRANSITION,
                        ROLE]);
        assert_eq!(doc.group(STATE).len(), 2);
        assert_eq!(doc.group(SCRIPT).len(), 1);
    }

    #[test]
    fn selection_limits_workflow_rows_but_keeps_roles() {
        let (mut store, _, b) = two_workflows();
        let doc = generate_export_document(&mut store, &WorkflowSelection::ids([b])).unwrap();
        assert_eq!(doc.group(WORKFLOW).len(), 1);
        assert_eq!(doc.group(WORKFLOW)[0].get(CODE), Some("B"));
        assert_eq!(doc.group(STATE)[0].get(ID_PARENT), Some(b.to_string().as_str()));
        assert!(doc.group(SCRIPT).is_empty());
        assert_eq!(doc.group(ROLE)[0].get(BUSINESS_KEY), Some("CLERK"));
    }

    #[test]
    fn unknown_workflow_id_is_an_error() {
        let (mut store, a, _) = two_workflows();
        let err = generate_export_document(&mut store, &WorkflowSelection::ids([a, 4242])).unwrap_err();
        assert!(matches!(err, MigrationError::NotFound { entity: "workflow", ref key } if key == "4242"));
    }
}
