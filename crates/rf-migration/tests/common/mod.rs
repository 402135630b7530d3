#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use rf_core::model::*;
use rf_core::{DefinitionStore, InMemoryRfStore};

/// Entorno origen: workflow LOAN (DRAFT -> APPROVED) con un efecto
/// parametrizado, y un workflow OTHER independiente.
pub struct LoanSource {
    pub store: InMemoryRfStore,
    pub loan: i64,
    pub other: i64,
    pub states: BTreeMap<String, i64>,
    pub transitions: BTreeMap<String, i64>,
    pub roles: BTreeMap<String, i64>,
    pub notify: i64,
}

impl LoanSource {
    pub fn new() -> Self {
        let mut store = InMemoryRfStore::new();
        let mut roles = BTreeMap::new();
        for key in ["CLERK", "MANAGER"] {
            let id = store.insert(Role { business_key: key.into(), name: key.to_lowercase(), ..Default::default() })
                          .unwrap();
            roles.insert(key.to_string(), id);
        }
        let text = store.insert(ParameterType { code: "TEXT".into(), name: "Text".into(), sort_order: Some(1), ..Default::default() })
                        .unwrap();
        let regions = store.insert(Lookup { code: "REGIONS".into(),
                                            name: "Regions".into(),
                                            sql_text: Some("select code, name from region".into()),
                                            start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 31),
                                            ..Default::default() })
                           .unwrap();
        let notify = store.insert(Script { code: "NOTIFY".into(),
                                           name: "Notify".into(),
                                           description: Some("Sends a notice".into()),
                                           script_object: "rf.notify".into(),
                                           ..Default::default() })
                          .unwrap();
        let template = store.insert(ScriptParameter { script_id: notify,
                                                      code: "TEMPLATE".into(),
                                                      name: "Template".into(),
                                                      parameter_type_id: Some(text),
                                                      required: true,
                                                      sort_order: Some(1),
                                                      ..Default::default() })
                            .unwrap();
        let region = store.insert(ScriptParameter { script_id: notify,
                                                    code: "REGION".into(),
                                                    name: "Region".into(),
                                                    lookup_id: Some(regions),
                                                    allow_multiple: true,
                                                    sort_order: Some(2),
                                                    ..Default::default() })
                          .unwrap();
        let loan = store.insert(Workflow { code: "LOAN".into(),
                                           name: "Loan approval".into(),
                                           child_object: "loan_step".into(),
                                           parent_state_element: "loan.c_state".into(),
                                           child_transition_element: "loan_step.c_transition".into(),
                                           start_x_coordinate: Some(40),
                                           ..Default::default() })
                        .unwrap();
        let other = store.insert(Workflow { code: "OTHER".into(), name: "Other".into(), ..Default::default() })
                         .unwrap();

        let mut fx = Self { store, loan, other, states: BTreeMap::new(), transitions: BTreeMap::new(), roles, notify };
        fx.add_state(loan, "DRAFT", 1);
        fx.add_state(loan, "APPROVED", 2);
        fx.add_state(other, "IDLE", 1);

        fx.add_transition("CREATE", &[], Some("DRAFT"), true, &["CLERK"]);
        fx.add_transition("APPROVE", &["DRAFT"], Some("APPROVED"), false, &["MANAGER", "CLERK"]);

        let effect = fx.store
                       .insert(WorkflowEffect { workflow_id: loan,
                                                code: "NOTIFY_APPROVAL".into(),
                                                name: "Notify approval".into(),
                                                execution_order: 1,
                                                script_id: notify,
                                                ..Default::default() })
                       .unwrap();
        let approve = fx.transitions["APPROVE"];
        fx.store
          .insert(EffectTransition { effect_id: effect, transition_id: approve, list_order: Some(0), ..Default::default() })
          .unwrap();
        fx.store
          .insert(ScriptParameterValue { effect_id: effect,
                                         script_parameter_id: template,
                                         value: Some("approved".into()),
                                         ..Default::default() })
          .unwrap();
        for value in ["NORTH", "SOUTH"] {
            fx.store
              .insert(ScriptParameterValue { effect_id: effect,
                                             script_parameter_id: region,
                                             value: Some(value.into()),
                                             ..Default::default() })
              .unwrap();
        }
        let channel = fx.store
                        .insert(WorkflowParameter { workflow_id: loan,
                                                    code: "CHANNEL".into(),
                                                    name: "Channel".into(),
                                                    parameter_type_id: Some(text),
                                                    ..Default::default() })
                        .unwrap();
        fx.store
          .insert(TransitionParameterValue { transition_id: approve,
                                             workflow_parameter_id: channel,
                                             value: Some("email".into()),
                                             ..Default::default() })
          .unwrap();
        fx
    }

    pub fn add_state(&mut self, workflow_id: i64, code: &str, order: i64) -> i64 {
        let id = self.store
                     .insert(State { workflow_id,
                                     code: code.into(),
                                     name: code.to_lowercase(),
                                     sort_order: Some(order),
                                     x_coordinate: Some(order * 100),
                                     ..Default::default() })
                     .unwrap();
        self.states.insert(code.to_string(), id);
        id
    }

    pub fn add_transition(&mut self, code: &str, from: &[&str], to: Option<&str>, initial: bool, roles: &[&str]) -> i64 {
        let id = self.store
                     .insert(Transition { workflow_id: self.loan,
                                          code: code.into(),
                                          name: code.to_lowercase(),
                                          to_state_id: to.map(|s| self.states[s]),
                                          initial_transition: initial,
                                          ..Default::default() })
                     .unwrap();
        for (i, state) in from.iter().enumerate() {
            self.store
                .insert(TransitionFromState { transition_id: id,
                                              state_id: self.states[*state],
                                              list_order: Some(i as i64),
                                              ..Default::default() })
                .unwrap();
        }
        for (i, role) in roles.iter().enumerate() {
            self.store
                .insert(TransitionRole { transition_id: id,
                                         role_id: self.roles[*role],
                                         list_order: Some(i as i64),
                                         ..Default::default() })
                .unwrap();
        }
        self.transitions.insert(code.to_string(), id);
        id
    }
}

/// Destino vacío con otra secuencia de ids y sólo los roles indicados.
pub fn target_with_roles(roles: &[&str]) -> InMemoryRfStore {
    let mut store = InMemoryRfStore::with_id_seed(5000);
    for key in roles {
        store.insert(Role { business_key: key.to_string(), name: key.to_lowercase(), ..Default::default() })
             .unwrap();
    }
    store
}

fn by_id<R: rf_core::Record>(store: &InMemoryRfStore) -> BTreeMap<i64, R> {
    store.load::<R>().unwrap().into_iter().map(|r| (r.id(), r)).collect()
}

/// Todo el contenido del entorno expresado con claves de negocio, sin ids.
pub fn describe(store: &InMemoryRfStore) -> BTreeSet<String> {
    let workflows = by_id::<Workflow>(store);
    let states = by_id::<State>(store);
    let transitions = by_id::<Transition>(store);
    let effects = by_id::<WorkflowEffect>(store);
    let scripts = by_id::<Script>(store);
    let script_params = by_id::<ScriptParameter>(store);
    let workflow_params = by_id::<WorkflowParameter>(store);
    let lookups = by_id::<Lookup>(store);
    let types = by_id::<ParameterType>(store);
    let roles = by_id::<Role>(store);

    let wf = |id: i64| workflows[&id].code.clone();
    let code_or_dash = |code: Option<String>| code.unwrap_or_else(|| "-".into());
    let mut out = BTreeSet::new();

    for w in workflows.values() {
        out.insert(format!("workflow {} {} {} {} {:?}",
                           w.code, w.name, w.parent_state_element, w.child_transition_element, w.start_x_coordinate));
    }
    for s in states.values() {
        out.insert(format!("state {}.{} {} {:?} {:?}", wf(s.workflow_id), s.code, s.name, s.sort_order, s.x_coordinate));
    }
    for t in transitions.values() {
        let to = code_or_dash(t.to_state_id.map(|id| states[&id].code.clone()));
        out.insert(format!("transition {}.{} to={} initial={}", wf(t.workflow_id), t.code, to, t.initial_transition));
    }
    for b in store.load::<TransitionFromState>().unwrap() {
        let t = &transitions[&b.transition_id];
        out.insert(format!("from {}.{} <- {} #{:?}", wf(t.workflow_id), t.code, states[&b.state_id].code, b.list_order));
    }
    for b in store.load::<TransitionRole>().unwrap() {
        let t = &transitions[&b.transition_id];
        out.insert(format!("role {}.{} {} #{:?}", wf(t.workflow_id), t.code, roles[&b.role_id].business_key, b.list_order));
    }
    for e in effects.values() {
        out.insert(format!("effect {}.{} order={} script={}",
                           wf(e.workflow_id), e.code, e.execution_order, scripts[&e.script_id].code));
    }
    for b in store.load::<EffectTransition>().unwrap() {
        let e = &effects[&b.effect_id];
        out.insert(format!("fires {}.{} on {}", wf(e.workflow_id), e.code, transitions[&b.transition_id].code));
    }
    for s in scripts.values() {
        out.insert(format!("script {} {} {:?} {}", s.code, s.name, s.description, s.script_object));
    }
    for p in script_params.values() {
        out.insert(format!("sparam {}.{} type={} lookup={} required={} multiple={}",
                           scripts[&p.script_id].code,
                           p.code,
                           code_or_dash(p.parameter_type_id.map(|id| types[&id].code.clone())),
                           code_or_dash(p.lookup_id.map(|id| lookups[&id].code.clone())),
                           p.required,
                           p.allow_multiple));
    }
    for p in workflow_params.values() {
        out.insert(format!("wparam {}.{} type={}",
                           wf(p.workflow_id),
                           p.code,
                           code_or_dash(p.parameter_type_id.map(|id| types[&id].code.clone()))));
    }
    for v in store.load::<ScriptParameterValue>().unwrap() {
        let e = &effects[&v.effect_id];
        out.insert(format!("svalue {}.{} {}={:?}",
                           wf(e.workflow_id),
                           e.code,
                           script_params[&v.script_parameter_id].code,
                           v.value));
    }
    for v in store.load::<TransitionParameterValue>().unwrap() {
        let t = &transitions[&v.transition_id];
        out.insert(format!("tvalue {}.{} {}={:?}",
                           wf(t.workflow_id),
                           t.code,
                           workflow_params[&v.workflow_parameter_id].code,
                           v.value));
    }
    for l in lookups.values() {
        out.insert(format!("lookup {} {:?} {:?}", l.code, l.sql_text, l.start_date));
    }
    for t in types.values() {
        out.insert(format!("type {} {:?}", t.code, t.sort_order));
    }
    out
}

/// Filas por tabla de bindings y valores. `describe` colapsa duplicados,
/// esto no.
pub fn binding_row_counts(store: &InMemoryRfStore) -> [(&'static str, usize); 5] {
    [("from_state", store.load::<TransitionFromState>().unwrap().len()),
     ("transition_role", store.load::<TransitionRole>().unwrap().len()),
     ("effect_transition", store.load::<EffectTransition>().unwrap().len()),
     ("script_value", store.load::<ScriptParameterValue>().unwrap().len()),
     ("transition_value", store.load::<TransitionParameterValue>().unwrap().len())]
}
