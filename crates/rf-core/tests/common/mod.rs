#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDate;
use rf_core::model::{
    EffectTransition, Role, Script, ScriptParameter, ScriptParameterValue, State, Transition, TransitionFromState,
    TransitionParameterValue, TransitionRole, Workflow, WorkflowEffect, WorkflowParameter,
};
use rf_core::{DefinitionStore, EffectError, InMemoryRfStore, RulesEngine, ScriptRegistry, StaticHost};

pub const CASE_TABLE: &str = "case_file";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Workflow CASE: OPEN -> REVIEW -> CLOSED, con COMMENT (sin destino).
pub struct CaseWorkflow {
    pub store: InMemoryRfStore,
    pub clerk: i64,
    pub auditor: i64,
    pub workflow_id: i64,
    pub states: BTreeMap<String, i64>,
    pub transitions: BTreeMap<String, i64>,
    pub record_script: i64,
    pub fail_script: i64,
}

impl CaseWorkflow {
    pub fn new() -> Self {
        let mut store = InMemoryRfStore::new();
        let clerk = store.insert(Role { business_key: "CLERK".into(), name: "Clerk".into(), ..Default::default() })
                         .unwrap();
        let auditor = store.insert(Role { business_key: "AUDITOR".into(), name: "Auditor".into(), ..Default::default() })
                           .unwrap();
        let workflow_id = store.insert(Workflow { code: "CASE".into(),
                                                  name: "Case review".into(),
                                                  child_object: "case_step".into(),
                                                  parent_state_element: "case_file.c_state".into(),
                                                  child_transition_element: "case_step.c_transition".into(),
                                                  ..Default::default() })
                               .unwrap();
        let record_script = store.insert(Script { code: "RECORD".into(),
                                                  name: "Record".into(),
                                                  script_object: "rf.record".into(),
                                                  ..Default::default() })
                                 .unwrap();
        let fail_script = store.insert(Script { code: "FAIL".into(),
                                                name: "Fail".into(),
                                                script_object: "rf.fail".into(),
                                                ..Default::default() })
                               .unwrap();
        let mut fx = Self { store,
                            clerk,
                            auditor,
                            workflow_id,
                            states: BTreeMap::new(),
                            transitions: BTreeMap::new(),
                            record_script,
                            fail_script };
        for (i, code) in ["OPEN", "REVIEW", "CLOSED"].into_iter().enumerate() {
            let id = fx.store
                       .insert(State { workflow_id,
                                       code: code.into(),
                                       name: code.to_lowercase(),
                                       sort_order: Some(i as i64 + 1),
                                       ..Default::default() })
                       .unwrap();
            fx.states.insert(code.to_string(), id);
        }
        fx.add_transition("CREATE", &[], Some("OPEN"), true, 1);
        fx.add_transition("SUBMIT", &["OPEN"], Some("REVIEW"), false, 2);
        fx.add_transition("COMMENT", &["OPEN", "REVIEW"], None, false, 3);
        fx.add_transition("CLOSE", &["REVIEW"], Some("CLOSED"), false, 4);
        fx
    }

    pub fn state(&self, code: &str) -> i64 {
        self.states[code]
    }

    pub fn transition(&self, code: &str) -> i64 {
        self.transitions[code]
    }

    /// Inserta la transición con sus estados origen y el rol CLERK.
    pub fn add_transition(&mut self, code: &str, from: &[&str], to: Option<&str>, initial: bool, order: i64) -> i64 {
        let to_state_id = to.map(|s| self.state(s));
        let id = self.store
                     .insert(Transition { workflow_id: self.workflow_id,
                                          code: code.into(),
                                          name: code.to_lowercase(),
                                          sort_order: Some(order),
                                          to_state_id,
                                          initial_transition: initial,
                                          ..Default::default() })
                     .unwrap();
        for (i, state) in from.iter().enumerate() {
            let state_id = self.state(state);
            self.store
                .insert(TransitionFromState { transition_id: id, state_id, list_order: Some(i as i64), ..Default::default() })
                .unwrap();
        }
        self.store
            .insert(TransitionRole { transition_id: id, role_id: self.clerk, list_order: Some(0), ..Default::default() })
            .unwrap();
        self.transitions.insert(code.to_string(), id);
        id
    }

    pub fn add_effect(&mut self, code: &str, execution_order: i64, script_id: i64, on: &[&str]) -> i64 {
        let id = self.store
                     .insert(WorkflowEffect { workflow_id: self.workflow_id,
                                              code: code.into(),
                                              name: code.to_lowercase(),
                                              execution_order,
                                              script_id,
                                              ..Default::default() })
                     .unwrap();
        for t in on {
            let transition_id = self.transition(t);
            self.store
                .insert(EffectTransition { effect_id: id, transition_id, ..Default::default() })
                .unwrap();
        }
        id
    }

    pub fn add_script_parameter(&mut self, script_id: i64, code: &str, allow_multiple: bool) -> i64 {
        self.store
            .insert(ScriptParameter { script_id, code: code.into(), name: code.into(), allow_multiple, ..Default::default() })
            .unwrap()
    }

    pub fn set_script_value(&mut self, effect_id: i64, script_parameter_id: i64, value: &str) {
        self.store
            .insert(ScriptParameterValue { effect_id, script_parameter_id, value: Some(value.into()), ..Default::default() })
            .unwrap();
    }

    pub fn add_workflow_parameter(&mut self, code: &str, allow_multiple: bool) -> i64 {
        self.store
            .insert(WorkflowParameter { workflow_id: self.workflow_id,
                                        code: code.into(),
                                        name: code.into(),
                                        allow_multiple,
                                        ..Default::default() })
            .unwrap()
    }

    pub fn set_transition_value(&mut self, transition: &str, workflow_parameter_id: i64, value: &str) {
        let transition_id = self.transition(transition);
        self.store
            .insert(TransitionParameterValue { transition_id,
                                               workflow_parameter_id,
                                               value: Some(value.into()),
                                               ..Default::default() })
            .unwrap();
    }

    pub fn new_case(&mut self) -> i64 {
        self.store.create_object(CASE_TABLE)
    }

    pub fn engine(self, role: i64, trace: &Trace) -> RulesEngine<InMemoryRfStore, StaticHost> {
        RulesEngine::new(self.store, StaticHost::new(Some(role), today()), recording_registry(trace))
    }
}

pub type Trace = Rc<RefCell<Vec<String>>>;

pub fn new_trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

/// `rf.record` anota `EFECTO:estado_siguiente`; `rf.fail` siempre falla.
pub fn recording_registry(trace: &Trace) -> ScriptRegistry<InMemoryRfStore> {
    let mut registry = ScriptRegistry::new();
    let sink = trace.clone();
    registry.register_fn("rf.record", move |_ctx, params| {
                sink.borrow_mut()
                    .push(format!("{}:{}", params.effect.code, params.defaults.next_state_code().unwrap_or("-")));
                Ok(())
            });
    registry.register_fn("rf.fail", |_ctx, params| Err(EffectError::Failed(format!("{} refused", params.effect.code))));
    registry
}

pub fn case_state(engine: &RulesEngine<InMemoryRfStore, StaticHost>, case_id: i64) -> Option<i64> {
    engine.store().object_column(CASE_TABLE, case_id, "c_state")
}
