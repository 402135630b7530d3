//! Lectura del documento a un plan expresado sólo con claves de negocio.
//!
//! Toda referencia `ID`/`ID_PARENT`/`C_*` del documento se traduce aquí
//! buscando la fila referenciada en el propio documento. Nada de esto toca
//! el entorno destino.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use rf_core::model::*;

use crate::columns::*;
use crate::document::{PortableDocument, RowView};
use crate::error::MigrationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Binding {
    pub key: String,
    pub list_order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValuePlan {
    /// Script dueño del parámetro; `None` para parámetros de workflow.
    pub script: Option<String>,
    pub parameter: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParameterPlan<P> {
    /// Código del script o workflow dueño.
    pub owner: String,
    pub parameter: P,
    pub parameter_type: Option<String>,
    pub lookup: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransitionPlan {
    pub transition: Transition,
    pub to_state: Option<String>,
    pub from_states: Vec<Binding>,
    pub roles: Vec<Binding>,
    pub values: Vec<ValuePlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EffectPlan {
    pub effect: WorkflowEffect,
    pub script: String,
    pub transitions: Vec<Binding>,
    pub values: Vec<ValuePlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkflowPlan {
    pub workflow: Workflow,
    pub states: Vec<State>,
    /// Por clave de documento.
    pub transitions: IndexMap<String, TransitionPlan>,
    pub effects: IndexMap<String, EffectPlan>,
    pub parameters: Vec<ParameterPlan<WorkflowParameter>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ImportPlan {
    pub parameter_types: Vec<ParameterType>,
    pub lookups: Vec<Lookup>,
    pub scripts: Vec<Script>,
    pub script_parameters: Vec<ParameterPlan<ScriptParameter>>,
    /// Por clave de documento, en el orden del documento.
    pub workflows: IndexMap<String, WorkflowPlan>,
}

fn unresolved(group: &str, column: &str, key: &str) -> MigrationError {
    MigrationError::UnresolvedReference { group: group.to_string(), column: column.to_string(), key: key.to_string() }
}

/// `C_CODE` de la fila `group` con `ID == key`.
fn code_of(doc: &PortableDocument, group: &str, key: &str) -> Result<String, MigrationError> {
    Ok(doc.resolve(group, ID, key)?.text(CODE)?.to_string())
}

/// Código de la fila a la que apunta `column`, si la columna tiene valor.
fn ref_code(doc: &PortableDocument, row: &RowView<'_>, column: &str, group: &str) -> Result<Option<String>, MigrationError> {
    row.opt_text(column).map(|key| code_of(doc, group, key)).transpose()
}

fn binding(row: &RowView<'_>, key: String) -> Result<Binding, MigrationError> {
    Ok(Binding { key, list_order: row.opt_int(LIST_ORDER)? })
}

fn ensure_unique<'a>(scope: &str, codes: impl IntoIterator<Item = &'a str>) -> Result<(), MigrationError> {
    let mut seen = BTreeSet::new();
    for code in codes {
        if !seen.insert(code) {
            return Err(MigrationError::Malformed(format!("{scope}: duplicate code {code:?}")));
        }
    }
    Ok(())
}

fn workflow_of<'p>(plan: &'p mut ImportPlan, row: &RowView<'_>) -> Result<&'p mut WorkflowPlan, MigrationError> {
    let key = row.text(ID_PARENT)?;
    plan.workflows.get_mut(key).ok_or_else(|| unresolved(WORKFLOW, ID, key))
}

fn transition_of<'p>(plan: &'p mut ImportPlan,
                     doc: &PortableDocument,
                     key: &str)
                     -> Result<&'p mut TransitionPlan, MigrationError> {
    let wf_key = doc.resolve(TRANSITION, ID, key)?.text(ID_PARENT)?;
    plan.workflows
        .get_mut(wf_key)
        .and_then(|wf| wf.transitions.get_mut(key))
        .ok_or_else(|| unresolved(TRANSITION, ID, key))
}

fn effect_of<'p>(plan: &'p mut ImportPlan, doc: &PortableDocument, key: &str) -> Result<&'p mut EffectPlan, MigrationError> {
    let wf_key = doc.resolve(WORKFLOW_EFFECT, ID, key)?.text(ID_PARENT)?;
    plan.workflows
        .get_mut(wf_key)
        .and_then(|wf| wf.effects.get_mut(key))
        .ok_or_else(|| unresolved(WORKFLOW_EFFECT, ID, key))
}

fn reference_rows(doc: &PortableDocument, plan: &mut ImportPlan) -> Result<(), MigrationError> {
    for row in doc.rows(PARAMETER_TYPE) {
        plan.parameter_types.push(ParameterType { id: 0,
                                                  code: row.text(CODE)?.to_string(),
                                                  name: row.string(NAME),
                                                  sort_order: row.opt_int(ORDER)? });
    }
    for row in doc.rows(LOOKUP) {
        plan.lookups.push(Lookup { id: 0,
                                   code: row.text(CODE)?.to_string(),
                                   name: row.string(NAME),
                                   sql_text: row.opt_string(SQL),
                                   start_date: row.date(START_DATE)?,
                                   end_date: row.date(END_DATE)? });
    }
    for row in doc.rows(SCRIPT) {
        plan.scripts.push(Script { id: 0,
                                   code: row.text(CODE)?.to_string(),
                                   name: row.string(NAME),
                                   description: row.opt_string(DESCRIPTION),
                                   script_object: row.text(SCRIPT_OBJECT)?.to_string() });
    }
    for row in doc.rows(SCRIPT_PARAMETER) {
        let owner = code_of(doc, SCRIPT, row.text(ID_PARENT)?)?;
        let parameter = ScriptParameter { id: 0,
                                          script_id: 0,
                                          code: row.text(CODE)?.to_string(),
                                          name: row.string(NAME),
                                          description: row.opt_string(DESCRIPTION),
                                          parameter_type_id: None,
                                          lookup_id: None,
                                          required: row.flag(REQUIRED)?,
                                          allow_multiple: row.flag(ALLOW_MULTIPLE)?,
                                          sort_order: row.opt_int(ORDER)? };
        plan.script_parameters.push(ParameterPlan { owner,
                                                    parameter,
                                                    parameter_type: ref_code(doc, &row, PARAMETER_TYPE_REF, PARAMETER_TYPE)?,
                                                    lookup: ref_code(doc, &row, LOOKUP_REF, LOOKUP)? });
    }
    ensure_unique(PARAMETER_TYPE, plan.parameter_types.iter().map(|p| p.code.as_str()))?;
    ensure_unique(LOOKUP, plan.lookups.iter().map(|l| l.code.as_str()))?;
    ensure_unique(SCRIPT, plan.scripts.iter().map(|s| s.code.as_str()))?;
    Ok(())
}

fn structural_rows(doc: &PortableDocument, plan: &mut ImportPlan) -> Result<(), MigrationError> {
    for row in doc.rows(WORKFLOW) {
        let workflow = Workflow { id: 0,
                                  code: row.text(CODE)?.to_string(),
                                  name: row.string(NAME),
                                  description: row.opt_string(DESCRIPTION),
                                  child_object: row.string(CHILD_OBJECT),
                                  parent_state_element: row.string(PARENT_STATE_ELEMENT),
                                  child_transition_element: row.string(CHILD_TRANSITION_ELEMENT),
                                  start_x_coordinate: row.opt_int(START_X_COORDINATE)?,
                                  start_y_coordinate: row.opt_int(START_Y_COORDINATE)? };
        plan.workflows.insert(row.text(ID)?.to_string(),
                              WorkflowPlan { workflow,
                                             states: Vec::new(),
                                             transitions: IndexMap::new(),
                                             effects: IndexMap::new(),
                                             parameters: Vec::new() });
    }
    ensure_unique(WORKFLOW, plan.workflows.values().map(|w| w.workflow.code.as_str()))?;

    for row in doc.rows(STATE) {
        let state = State { id: 0,
                            workflow_id: 0,
                            code: row.text(CODE)?.to_string(),
                            name: row.string(NAME),
                            description: row.opt_string(DESCRIPTION),
                            sort_order: row.opt_int(ORDER)?,
                            start_date: row.date(START_DATE)?,
                            end_date: row.date(END_DATE)?,
                            x_coordinate: row.opt_int(X_COORDINATE)?,
                            y_coordinate: row.opt_int(Y_COORDINATE)? };
        workflow_of(plan, &row)?.states.push(state);
    }
    for row in doc.rows(TRANSITION) {
        let transition = Transition { id: 0,
                                      workflow_id: 0,
                                      code: row.text(CODE)?.to_string(),
                                      name: row.string(NAME),
                                      description: row.opt_string(DESCRIPTION),
                                      sort_order: row.opt_int(ORDER)?,
                                      to_state_id: None,
                                      initial_transition: row.flag(INITIAL_TRANSITION)?,
                                      start_date: row.date(START_DATE)?,
                                      end_date: row.date(END_DATE)? };
        let to_state = ref_code(doc, &row, TO_STATE, STATE)?;
        let key = row.text(ID)?.to_string();
        workflow_of(plan, &row)?.transitions.insert(key,
                                                    TransitionPlan { transition,
                                                                     to_state,
                                                                     from_states: Vec::new(),
                                                                     roles: Vec::new(),
                                                                     values: Vec::new() });
    }
    for row in doc.rows(WORKFLOW_PARAMETER) {
        let parameter = WorkflowParameter { id: 0,
                                            workflow_id: 0,
                                            code: row.text(CODE)?.to_string(),
                                            name: row.string(NAME),
                                            description: row.opt_string(DESCRIPTION),
                                            parameter_type_id: None,
                                            lookup_id: None,
                                            required: row.flag(REQUIRED)?,
                                            allow_multiple: row.flag(ALLOW_MULTIPLE)?,
                                            sort_order: row.opt_int(ORDER)? };
        let parameter_type = ref_code(doc, &row, PARAMETER_TYPE_REF, PARAMETER_TYPE)?;
        let lookup = ref_code(doc, &row, LOOKUP_REF, LOOKUP)?;
        let wf = workflow_of(plan, &row)?;
        let owner = wf.workflow.code.clone();
        wf.parameters.push(ParameterPlan { owner, parameter, parameter_type, lookup });
    }
    for row in doc.rows(WORKFLOW_EFFECT) {
        let effect = WorkflowEffect { id: 0,
                                      workflow_id: 0,
                                      code: row.text(CODE)?.to_string(),
                                      name: row.string(NAME),
                                      execution_order: row.int(EXECUTION_ORDER)?,
                                      script_id: 0 };
        let script = code_of(doc, SCRIPT, row.text(SCRIPT_REF)?)?;
        let key = row.text(ID)?.to_string();
        workflow_of(plan, &row)?.effects.insert(key,
                                                EffectPlan { effect,
                                                             script,
                                                             transitions: Vec::new(),
                                                             values: Vec::new() });
    }
    for wf in plan.workflows.values() {
        let scope = format!("workflow {}", wf.workflow.code);
        ensure_unique(&scope, wf.states.iter().map(|s| s.code.as_str()))?;
        ensure_unique(&scope, wf.transitions.values().map(|t| t.transition.code.as_str()))?;
        ensure_unique(&scope, wf.effects.values().map(|e| e.effect.code.as_str()))?;
        ensure_unique(&scope, wf.parameters.iter().map(|p| p.parameter.code.as_str()))?;
    }
    Ok(())
}

fn binding_rows(doc: &PortableDocument, plan: &mut ImportPlan) -> Result<(), MigrationError> {
    for row in doc.rows(TRANSITION_FROM_STATE) {
        let state = code_of(doc, STATE, row.text(FROM_STATE)?)?;
        let bound = binding(&row, state)?;
        transition_of(plan, doc, row.text(ID_OWNER)?)?.from_states.push(bound);
    }
    for row in doc.rows(TRANSITION_ROLE) {
        let role_key = row.text(ROLE_REF)?;
        let role = doc.resolve(ROLE, ROLE_ID, role_key)?.text(BUSINESS_KEY)?.to_string();
        let bound = binding(&row, role)?;
        transition_of(plan, doc, row.text(ID_OWNER)?)?.roles.push(bound);
    }
    for row in doc.rows(EFFECT_TRANSITION) {
        let transition = code_of(doc, TRANSITION, row.text(TRANSITION_REF)?)?;
        let bound = binding(&row, transition)?;
        effect_of(plan, doc, row.text(ID_OWNER)?)?.transitions.push(bound);
    }
    for row in doc.rows(TRANSITION_PARAMETER_VALUE) {
        let value = ValuePlan { script: None,
                                parameter: code_of(doc, WORKFLOW_PARAMETER, row.text(WORKFLOW_PARAMETER_REF)?)?,
                                value: row.opt_string(VALUE) };
        transition_of(plan, doc, row.text(ID_PARENT)?)?.values.push(value);
    }
    for row in doc.rows(SCRIPT_PARAMETER_VALUE) {
        let parameter = doc.resolve(SCRIPT_PARAMETER, ID, row.text(SCRIPT_PARAMETER_REF)?)?;
        let value = ValuePlan { script: Some(code_of(doc, SCRIPT, parameter.text(ID_PARENT)?)?),
                                parameter: parameter.text(CODE)?.to_string(),
                                value: row.opt_string(VALUE) };
        effect_of(plan, doc, row.text(ID_PARENT)?)?.values.push(value);
    }
    Ok(())
}

/// Traduce el documento completo. Cualquier referencia que no resuelva
/// dentro del documento es un error.
pub(crate) fn read_plan(doc: &PortableDocument) -> Result<ImportPlan, MigrationError> {
    let mut plan = ImportPlan::default();
    reference_rows(doc, &mut plan)?;
    structural_rows(doc, &mut plan)?;
    binding_rows(doc, &mut plan)?;
    Ok(plan)
}
