mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{case_state, new_trace, today, CaseWorkflow, CASE_TABLE};
use rf_core::model::{EffectTransition, ElementRef, Transition, TransitionRole, WorkflowEffect};
use rf_core::{
    validate_workflow, DefinitionIssue, DefinitionStore, EffectError, ErrorClass, InMemoryRfStore, RfDao, RfError,
    RulesEngine, ScriptRegistry, StaticHost, TrackedObjectStore,
};

#[test]
fn start_workflow_sets_initial_state_and_records_transition_on_child() {
    let mut fx = CaseWorkflow::new();
    let case_id = fx.new_case();
    let (clerk, open, create) = (fx.clerk, fx.state("OPEN"), fx.transition("CREATE"));
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);

    let child = engine.start_workflow("CASE", case_id).expect("start");

    assert_eq!(case_state(&engine, case_id), Some(open));
    let element = ElementRef::new("case_step", "c_transition").unwrap();
    let row = engine.store().child(&element, child).unwrap();
    assert_eq!((row.parent_id, row.base_id, row.transition_id), (case_id, case_id, Some(create)));
}

#[test]
fn start_workflow_without_eligible_initial_transition_fails() {
    let mut fx = CaseWorkflow::new();
    let case_id = fx.new_case();
    let auditor = fx.auditor;
    let trace = new_trace();
    let mut engine = fx.engine(auditor, &trace);

    let err = engine.start_workflow("CASE", case_id).unwrap_err();
    assert!(matches!(err, RfError::StartWorkflow { tracking_id, .. } if tracking_id == case_id));
    assert_eq!(err.root(), &RfError::InitialTransition { workflow_code: "CASE".into(), found: 0 });
    assert_eq!(err.class(), ErrorClass::Configuration);
    assert_eq!(case_state(&engine, case_id), None);
    assert!(engine.store().children_of("case_step", case_id).is_empty());
}

#[test]
fn start_workflow_with_two_initial_transitions_fails_instead_of_picking_one() {
    let mut fx = CaseWorkflow::new();
    fx.add_transition("REOPEN", &[], Some("REVIEW"), true, 9);
    let case_id = fx.new_case();
    let clerk = fx.clerk;
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);

    let err = engine.start_workflow("CASE", case_id).unwrap_err();
    assert_eq!(err.root(), &RfError::InitialTransition { workflow_code: "CASE".into(), found: 2 });
    assert!(err.to_string().contains("workflowCode: CASE"));
}

#[test]
fn expired_initial_transition_is_not_eligible() {
    let mut fx = CaseWorkflow::new();
    let create_id = fx.transition("CREATE");
    let mut create: Transition = fx.store.find(create_id).unwrap().unwrap();
    create.end_date = Some(today());
    fx.store.update(&create).unwrap();
    let case_id = fx.new_case();
    let clerk = fx.clerk;
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);

    let err = engine.start_workflow("CASE", case_id).unwrap_err();
    assert_eq!(err.root(), &RfError::InitialTransition { workflow_code: "CASE".into(), found: 0 });
}

#[test]
fn null_to_state_leaves_parent_state_untouched() {
    let mut fx = CaseWorkflow::new();
    let case_id = fx.new_case();
    let (clerk, open, review) = (fx.clerk, fx.state("OPEN"), fx.state("REVIEW"));
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);
    engine.start_workflow("CASE", case_id).unwrap();

    engine.insert_child_workflow("CASE", case_id, "COMMENT").unwrap();
    assert_eq!(case_state(&engine, case_id), Some(open));

    engine.insert_child_workflow("CASE", case_id, "SUBMIT").unwrap();
    assert_eq!(case_state(&engine, case_id), Some(review));

    engine.insert_child_workflow("CASE", case_id, "COMMENT").unwrap();
    assert_eq!(case_state(&engine, case_id), Some(review));
}

#[test]
fn effects_fire_in_execution_order_regardless_of_insertion_order() {
    let mut fx = CaseWorkflow::new();
    let script = fx.record_script;
    fx.add_effect("THIRD", 3, script, &["SUBMIT"]);
    fx.add_effect("FIRST", 1, script, &["SUBMIT"]);
    fx.add_effect("SECOND", 2, script, &["SUBMIT", "CLOSE"]);
    fx.add_effect("UNRELATED", 0, script, &["CLOSE"]);
    let case_id = fx.new_case();
    let clerk = fx.clerk;
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);
    engine.start_workflow("CASE", case_id).unwrap();
    assert!(trace.borrow().is_empty());

    engine.insert_child_workflow("CASE", case_id, "SUBMIT").unwrap();
    assert_eq!(*trace.borrow(), vec!["FIRST:REVIEW", "SECOND:REVIEW", "THIRD:REVIEW"]);
}

#[test]
fn effects_with_equal_execution_order_fire_by_name() {
    let mut fx = CaseWorkflow::new();
    let script = fx.record_script;
    let submit = fx.transition("SUBMIT");
    for (code, name) in [("A_NOTIFY", "zz notify"), ("B_STAMP", "aa stamp")] {
        let effect = fx.store
                       .insert(WorkflowEffect { workflow_id: fx.workflow_id,
                                                code: code.into(),
                                                name: name.into(),
                                                execution_order: 5,
                                                script_id: script,
                                                ..Default::default() })
                       .unwrap();
        fx.store
          .insert(EffectTransition { effect_id: effect, transition_id: submit, ..Default::default() })
          .unwrap();
    }
    let case_id = fx.new_case();
    let (clerk, workflow_id) = (fx.clerk, fx.workflow_id);
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);
    engine.start_workflow("CASE", case_id).unwrap();
    engine.insert_child_workflow("CASE", case_id, "SUBMIT").unwrap();

    assert_eq!(*trace.borrow(), vec!["B_STAMP:REVIEW", "A_NOTIFY:REVIEW"]);
    let listed: Vec<String> =
        RfDao::new(engine.store()).effects(workflow_id).unwrap().into_iter().map(|e| e.code).collect();
    assert_eq!(listed, vec!["B_STAMP", "A_NOTIFY"]);
}

#[test]
fn failing_effect_aborts_the_remaining_chain() {
    let mut fx = CaseWorkflow::new();
    let (record, fail) = (fx.record_script, fx.fail_script);
    fx.add_effect("FIRST", 1, record, &["SUBMIT"]);
    fx.add_effect("SECOND", 2, fail, &["SUBMIT"]);
    fx.add_effect("THIRD", 3, record, &["SUBMIT"]);
    let case_id = fx.new_case();
    let clerk = fx.clerk;
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);
    engine.start_workflow("CASE", case_id).unwrap();

    let err = engine.insert_child_workflow("CASE", case_id, "SUBMIT").unwrap_err();

    assert_eq!(*trace.borrow(), vec!["FIRST:REVIEW"]);
    assert_eq!(err.class(), ErrorClass::Effect);
    assert_eq!(err.root(),
               &RfError::Effect { effect_code: "SECOND".into(),
                                  script_object: "rf.fail".into(),
                                  source: EffectError::Failed("SECOND refused".into()) });
    assert!(matches!(err, RfError::InsertChildWorkflow { ref transition_code, .. } if transition_code == "SUBMIT"));
    let RfError::InsertChildWorkflow { source, .. } = &err else { unreachable!() };
    assert!(matches!(**source, RfError::TransitionEffects { .. }), "unexpected nesting: {source:?}");
}

#[test]
fn unregistered_script_object_is_a_wrapped_error() {
    let mut fx = CaseWorkflow::new();
    let record = fx.record_script;
    fx.add_effect("ONLY", 1, record, &["CREATE"]);
    let case_id = fx.new_case();
    let clerk = fx.clerk;
    let mut engine = RulesEngine::new(fx.store, StaticHost::new(Some(clerk), today()), ScriptRegistry::new());

    let err = engine.start_workflow("CASE", case_id).unwrap_err();
    assert_eq!(err.root(), &RfError::ScriptNotRegistered("rf.record".into()));
}

#[test]
fn effects_receive_default_transition_and_custom_parameters() {
    let mut fx = CaseWorkflow::new();
    let record = fx.record_script;
    let to = fx.add_script_parameter(record, "TO", true);
    fx.add_script_parameter(record, "SUBJECT", false);
    fx.add_script_parameter(record, "CC", true);
    let effect = fx.add_effect("NOTIFY", 1, record, &["COMMENT"]);
    fx.set_script_value(effect, to, "owner@example.org");
    fx.set_script_value(effect, to, "audit@example.org");
    let priority = fx.add_workflow_parameter("PRIORITY", false);
    fx.add_workflow_parameter("TAGS", true);
    fx.set_transition_value("COMMENT", priority, "low");
    let case_id = fx.new_case();
    let clerk = fx.clerk;

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut engine = RulesEngine::builder(fx.store, StaticHost::new(Some(clerk), today()))
        .script_fn("rf.record", move |_ctx, params| {
            sink.borrow_mut().push((params.defaults.from_state_code().map(String::from),
                                    params.defaults.to_state_code().map(String::from),
                                    params.defaults.next_state_code().map(String::from),
                                    params.defaults.transition_code().to_string(),
                                    params.custom.get_multiple("TO").to_vec(),
                                    params.custom.get_single("SUBJECT").map(String::from),
                                    params.custom.get_multiple("CC").len(),
                                    params.transition.get_single("PRIORITY").map(String::from),
                                    params.transition.get_multiple("TAGS").len(),
                                    params.parent_tracking_id()));
            Ok(())
        })
        .build();
    engine.start_workflow("CASE", case_id).unwrap();
    engine.insert_child_workflow("CASE", case_id, "COMMENT").unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    let (from, to_state, next, transition, to_list, subject, cc, priority, tags, parent) = &seen[0];
    assert_eq!(from.as_deref(), Some("OPEN"));
    assert_eq!(to_state.as_deref(), None);
    assert_eq!(next.as_deref(), Some("OPEN"));
    assert_eq!(transition, "COMMENT");
    assert_eq!(to_list, &vec!["owner@example.org".to_string(), "audit@example.org".to_string()]);
    assert_eq!(subject, &None);
    assert_eq!(*cc, 0);
    assert_eq!(priority.as_deref(), Some("low"));
    assert_eq!(*tags, 0);
    assert_eq!(*parent, case_id);
}

#[test]
fn effects_can_write_through_the_engine_store() {
    let mut fx = CaseWorkflow::new();
    let record = fx.record_script;
    fx.add_effect("AUTO_CLOSE", 1, record, &["SUBMIT"]);
    let closed = fx.state("CLOSED");
    let case_id = fx.new_case();
    let clerk = fx.clerk;
    let mut engine = RulesEngine::builder(fx.store, StaticHost::new(Some(clerk), today()))
        .script_fn("rf.record", move |ctx, params| {
            let element = ElementRef::new(CASE_TABLE, "c_state")?;
            ctx.store.write_state(&element, params.parent_tracking_id(), Some(closed))?;
            Ok(())
        })
        .build();
    engine.start_workflow("CASE", case_id).unwrap();
    engine.insert_child_workflow("CASE", case_id, "SUBMIT").unwrap();
    assert_eq!(case_state(&engine, case_id), Some(closed));
}

#[test]
fn update_workflow_on_unknown_child_is_wrapped_with_tracking_id() {
    let fx = CaseWorkflow::new();
    let clerk = fx.clerk;
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);
    let err = engine.update_workflow("CASE", 4242).unwrap_err();
    assert!(matches!(err, RfError::UpdateWorkflow { tracking_id: 4242, .. }));
    assert_eq!(err.class(), ErrorClass::Store);
}

#[test]
fn insert_child_with_unknown_transition_code_fails() {
    let mut fx = CaseWorkflow::new();
    let case_id = fx.new_case();
    let clerk = fx.clerk;
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);
    let err = engine.insert_child_workflow("CASE", case_id, "ESCALATE").unwrap_err();
    assert_eq!(err.root(), &RfError::NotFound { entity: "transition", key: "ESCALATE".into() });
}

#[test]
fn unknown_or_duplicated_workflow_code_is_distinguishable() {
    let mut fx = CaseWorkflow::new();
    let case_id = fx.new_case();
    fx.store
      .insert(rf_core::model::Workflow { code: "CASE".into(), ..Default::default() })
      .unwrap();
    let clerk = fx.clerk;
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);
    let dup = engine.start_workflow("CASE", case_id).unwrap_err();
    assert_eq!(dup.root(), &RfError::NotUnique { entity: "workflow", code: "CASE".into(), found: 2 });
    let missing = engine.start_workflow("NOPE", case_id).unwrap_err();
    assert_eq!(missing.root(), &RfError::NotFound { entity: "workflow", key: "NOPE".into() });
}

#[test]
fn transition_choices_follow_state_role_and_window() {
    let mut fx = CaseWorkflow::new();
    let case_id = fx.new_case();
    let (clerk, auditor) = (fx.clerk, fx.auditor);
    let close = fx.transition("CLOSE");
    fx.store
      .insert(TransitionRole { transition_id: close, role_id: auditor, ..Default::default() })
      .unwrap();
    let trace = new_trace();
    let mut engine = fx.engine(clerk, &trace);

    let codes = |ts: Vec<Transition>| ts.into_iter().map(|t| t.code).collect::<Vec<_>>();
    assert_eq!(codes(engine.child_transition_choices("CASE", case_id, None).unwrap()), vec!["CREATE"]);

    let first_child = engine.start_workflow("CASE", case_id).unwrap();
    assert_eq!(codes(engine.child_transition_choices("CASE", case_id, None).unwrap()), vec!["SUBMIT", "COMMENT"]);
    assert_eq!(codes(engine.child_transition_choices("CASE", case_id, Some(first_child)).unwrap()),
               vec!["CREATE", "SUBMIT", "COMMENT"]);
    assert_eq!(codes(engine.parent_transition_choices("CASE", case_id).unwrap()), vec!["SUBMIT"]);

    engine.insert_child_workflow("CASE", case_id, "SUBMIT").unwrap();
    engine.host_mut().role = Some(auditor);
    assert_eq!(codes(engine.child_transition_choices("CASE", case_id, None).unwrap()), vec!["CLOSE"]);
}

#[test]
fn validate_reports_structural_anomalies() {
    let mut fx = CaseWorkflow::new();
    let record = fx.record_script;
    fx.add_transition("ORPHAN", &[], None, false, 7);
    fx.add_effect("LOOSE", 1, record, &[]);
    fx.add_effect("GHOST", 2, 999_999, &["SUBMIT"]);

    let registry = ScriptRegistry::<InMemoryRfStore>::new();
    let known: &dyn Fn(&str) -> bool = &|name| registry.contains(name);
    let issues = validate_workflow(&fx.store, "CASE", Some(known)).unwrap();

    assert!(issues.contains(&DefinitionIssue::NoFromStates { transition: "ORPHAN".into() }));
    assert!(issues.contains(&DefinitionIssue::UnboundEffect { effect: "LOOSE".into() }));
    assert!(issues.contains(&DefinitionIssue::UnregisteredScript { effect: "LOOSE".into(),
                                                                    script_object: "rf.record".into() }));
    assert!(issues.contains(&DefinitionIssue::MissingScript { effect: "GHOST".into() }));
    assert!(!issues.iter().any(|i| matches!(i, DefinitionIssue::NoInitialTransition)));
}
