//! Workflow de ejemplo (solicitud de compra) y scripts de demo.
//!
//! Lo usan `main-core` y los tests end-to-end del workspace.

use std::collections::BTreeMap;

use log::info;
use rf_core::model::*;
use rf_core::{DefinitionStore, EffectContext, EffectError, RulesFrameworkParameters, ScriptRegistry, StoreError};

pub const PURCHASE: &str = "PURCHASE";
pub const LOG_SCRIPT: &str = "rf.log";
pub const PARENT_TABLE: &str = "purchase";

/// Ids del workflow sembrado, por código.
#[derive(Debug, Clone, Default)]
pub struct PurchaseIds {
    pub workflow: i64,
    pub roles: BTreeMap<String, i64>,
    pub states: BTreeMap<String, i64>,
    pub transitions: BTreeMap<String, i64>,
}

impl PurchaseIds {
    pub fn role(&self, key: &str) -> Option<i64> {
        self.roles.get(key).copied()
    }
}

/// REQUESTED -> APPROVED | REJECTED, con COMMENT (sin destino) sobre
/// REQUESTED y dos efectos de log encadenados en APPROVE.
pub fn seed_purchase_workflow<S: DefinitionStore>(store: &mut S) -> Result<PurchaseIds, StoreError> {
    let mut ids = PurchaseIds::default();
    for key in ["REQUESTER", "APPROVER"] {
        let id = store.insert(Role { business_key: key.into(), name: key.to_lowercase(), ..Default::default() })?;
        ids.roles.insert(key.to_string(), id);
    }
    let text = store.insert(ParameterType { code: "TEXT".into(), name: "Text".into(), ..Default::default() })?;
    let script = store.insert(Script { code: "LOG".into(),
                                       name: "Log message".into(),
                                       script_object: LOG_SCRIPT.into(),
                                       ..Default::default() })?;
    let message = store.insert(ScriptParameter { script_id: script,
                                                 code: "MESSAGE".into(),
                                                 name: "Message".into(),
                                                 parameter_type_id: Some(text),
                                                 required: true,
                                                 ..Default::default() })?;
    ids.workflow = store.insert(Workflow { code: PURCHASE.into(),
                                           name: "Purchase request".into(),
                                           child_object: "purchase_step".into(),
                                           parent_state_element: format!("{PARENT_TABLE}.c_state"),
                                           child_transition_element: "purchase_step.c_transition".into(),
                                           ..Default::default() })?;
    for (order, code) in ["REQUESTED", "APPROVED", "REJECTED"].into_iter().enumerate() {
        let id = store.insert(State { workflow_id: ids.workflow,
                                      code: code.into(),
                                      name: code.to_lowercase(),
                                      sort_order: Some(order as i64),
                                      ..Default::default() })?;
        ids.states.insert(code.to_string(), id);
    }

    let specs: [(&str, Option<&str>, bool, &[&str]); 4] =
        [("REQUEST", Some("REQUESTED"), true, &["REQUESTER"]),
         ("APPROVE", Some("APPROVED"), false, &["APPROVER"]),
         ("REJECT", Some("REJECTED"), false, &["APPROVER"]),
         ("COMMENT", None, false, &["REQUESTER", "APPROVER"])];
    for (code, to, initial, roles) in specs {
        let id = store.insert(Transition { workflow_id: ids.workflow,
                                           code: code.into(),
                                           name: code.to_lowercase(),
                                           to_state_id: to.map(|s| ids.states[s]),
                                           initial_transition: initial,
                                           ..Default::default() })?;
        if !initial {
            store.insert(TransitionFromState { transition_id: id,
                                               state_id: ids.states["REQUESTED"],
                                               ..Default::default() })?;
        }
        for role in roles {
            store.insert(TransitionRole { transition_id: id, role_id: ids.roles[*role], ..Default::default() })?;
        }
        ids.transitions.insert(code.to_string(), id);
    }

    // Orden de ejecución invertido respecto al de inserción.
    for (code, order, text) in [("LOG_ARCHIVE", 2, "archived"), ("LOG_APPROVAL", 1, "approved")] {
        let effect = store.insert(WorkflowEffect { workflow_id: ids.workflow,
                                                   code: code.into(),
                                                   name: code.to_lowercase(),
                                                   execution_order: order,
                                                   script_id: script,
                                                   ..Default::default() })?;
        store.insert(EffectTransition { effect_id: effect,
                                        transition_id: ids.transitions["APPROVE"],
                                        ..Default::default() })?;
        store.insert(ScriptParameterValue { effect_id: effect,
                                            script_parameter_id: message,
                                            value: Some(text.into()),
                                            ..Default::default() })?;
    }
    info!("seeded workflow {PURCHASE} ({} transitions)", ids.transitions.len());
    Ok(ids)
}

/// Efecto de `rf.log`: registra el parámetro MESSAGE.
pub fn log_message<S>(_ctx: &mut EffectContext<'_, S>, params: &RulesFrameworkParameters<'_>) -> Result<(), EffectError> {
    let message = params.custom.require_single("MESSAGE")?;
    info!("[{}] {} -> {}: {message}",
          params.effect.code,
          params.defaults.transition_code(),
          params.defaults.to_state_code().unwrap_or("-"));
    Ok(())
}

pub fn demo_registry<S: 'static>() -> ScriptRegistry<S> {
    let mut registry = ScriptRegistry::new();
    registry.register_fn(LOG_SCRIPT, log_message::<S>);
    registry
}
