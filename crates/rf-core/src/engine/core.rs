//! `RulesEngine`: avanza el estado del padre y dispara los efectos ligados a
//! la transición, en orden de `execution_order`.
//!
//! Todo corre en el hilo llamador y hasta el final o hasta el primer error:
//! no hay reintentos ni rollback propio. La atomicidad la da el store
//! (`DefinitionStore::atomically`) si el llamador la pide.

use std::collections::BTreeMap;

use log::{debug, info};

use super::builder::EngineBuilder;
use crate::errors::RfError;
use crate::lookup::{child_transition_choices, parent_transition_choices, RfDao};
use crate::model::{ElementRef, HostContext, State, Transition, Workflow};
use crate::params::{DefaultParameters, ParameterValues, RulesFrameworkParameters};
use crate::repo::{DefinitionStore, RfStore};
use crate::script::{EffectContext, ScriptRegistry};

pub struct RulesEngine<S, H> {
    store: S,
    host: H,
    registry: ScriptRegistry<S>,
}

impl<S: RfStore + 'static, H: HostContext> RulesEngine<S, H> {
    pub fn new(store: S, host: H, registry: ScriptRegistry<S>) -> Self {
        Self { store, host, registry }
    }

    pub fn builder(store: S, host: H) -> EngineBuilder<S, H> {
        EngineBuilder::new(store, host)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &ScriptRegistry<S> {
        &self.registry
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Dispara la transición inicial del workflow sobre `parent_tracking_id`
    /// y devuelve el id del hijo creado.
    ///
    /// Debe haber exactamente una transición inicial activa hoy y elegible
    /// para el rol actual.
    pub fn start_workflow(&mut self, workflow_code: &str, parent_tracking_id: i64) -> Result<i64, RfError> {
        self.try_start(workflow_code, parent_tracking_id)
            .map_err(|source| RfError::StartWorkflow { workflow_code: workflow_code.to_string(),
                                                       tracking_id: parent_tracking_id,
                                                       source: Box::new(source) })
    }

    /// Aplica la transición guardada en el hijo: mueve el estado del padre
    /// si la transición tiene destino y dispara sus efectos.
    pub fn update_workflow(&mut self, workflow_code: &str, child_tracking_id: i64) -> Result<(), RfError> {
        self.try_update(workflow_code, child_tracking_id)
            .map_err(|source| RfError::UpdateWorkflow { workflow_code: workflow_code.to_string(),
                                                        tracking_id: child_tracking_id,
                                                        source: Box::new(source) })
    }

    /// Crea un hijo con la transición `transition_code` y la aplica como
    /// `update_workflow`; el error sale envuelto una sola vez.
    pub fn insert_child_workflow(&mut self,
                                 workflow_code: &str,
                                 parent_tracking_id: i64,
                                 transition_code: &str)
                                 -> Result<i64, RfError> {
        self.try_insert_child(workflow_code, parent_tracking_id, transition_code)
            .map_err(|source| RfError::InsertChildWorkflow { workflow_code: workflow_code.to_string(),
                                                             tracking_id: parent_tracking_id,
                                                             transition_code: transition_code.to_string(),
                                                             source: Box::new(source) })
    }

    pub fn child_transition_choices(&self,
                                    workflow_code: &str,
                                    parent_tracking_id: i64,
                                    child_tracking_id: Option<i64>)
                                    -> Result<Vec<Transition>, RfError> {
        child_transition_choices(&self.store, &self.host, workflow_code, parent_tracking_id, child_tracking_id)
    }

    pub fn parent_transition_choices(&self, workflow_code: &str, parent_tracking_id: i64)
                                     -> Result<Vec<Transition>, RfError> {
        parent_transition_choices(&self.store, &self.host, workflow_code, parent_tracking_id)
    }

    fn try_start(&mut self, workflow_code: &str, parent_id: i64) -> Result<i64, RfError> {
        let (workflow, initial, to_state) = {
            let dao = RfDao::new(&self.store);
            let workflow = dao.workflow_by_code(workflow_code)?;
            let today = self.host.today();
            let role = self.host.current_role();
            let mut candidates = Vec::new();
            for t in dao.transitions(workflow.id)? {
                if !t.initial_transition || !t.is_active_on(today) {
                    continue;
                }
                if let Some(r) = role {
                    if dao.role_ids(t.id)?.contains(&r) {
                        candidates.push(t);
                    }
                }
            }
            if candidates.len() != 1 {
                return Err(RfError::InitialTransition { workflow_code: workflow_code.to_string(),
                                                        found: candidates.len() });
            }
            let initial = candidates.remove(0);
            let to_state = initial.to_state_id.map(|id| dao.state(id)).transpose()?;
            (workflow, initial, to_state)
        };
        let (state_element, child_element) = elements(&workflow)?;

        self.store.write_state(&state_element, parent_id, initial.to_state_id)?;
        let child_id = self.store.insert_child(&child_element, &state_element.table, parent_id, initial.id)?;
        info!("workflow {} started on {} {} via {} (child {})",
              workflow.code, state_element.table, parent_id, initial.code, child_id);

        let defaults = DefaultParameters::new(child_id, parent_id, workflow, initial, None, to_state);
        self.fire_effects(&defaults)?;
        Ok(child_id)
    }

    fn try_update(&mut self, workflow_code: &str, child_id: i64) -> Result<(), RfError> {
        let workflow = RfDao::new(&self.store).workflow_by_code(workflow_code)?;
        let (state_element, child_element) = elements(&workflow)?;
        let child = self.store.child(&child_element, child_id)?;
        let transition_id = child.transition_id.ok_or(RfError::ChildWithoutTransition { child_id })?;
        let from_state_id = self.store.current_state(&state_element, child.parent_id)?;

        let (transition, from_state, to_state) = {
            let dao = RfDao::new(&self.store);
            let transition = dao.transition(transition_id)?;
            let from_state = match from_state_id {
                Some(id) => self.store.find::<State>(id)?,
                None => None,
            };
            let to_state = transition.to_state_id.map(|id| dao.state(id)).transpose()?;
            (transition, from_state, to_state)
        };

        if let Some(to) = transition.to_state_id {
            self.store.write_state(&state_element, child.parent_id, Some(to))?;
        }
        debug!("workflow {} child {}: {:?} -> {:?} via {}",
               workflow.code,
               child_id,
               from_state.as_ref().map(|s| &s.code),
               to_state.as_ref().map(|s| &s.code),
               transition.code);

        let defaults = DefaultParameters::new(child_id, child.parent_id, workflow, transition, from_state, to_state);
        self.fire_effects(&defaults)
    }

    fn try_insert_child(&mut self, workflow_code: &str, parent_id: i64, transition_code: &str) -> Result<i64, RfError> {
        let (workflow, transition) = {
            let dao = RfDao::new(&self.store);
            let workflow = dao.workflow_by_code(workflow_code)?;
            let transition = dao.transition_by_code(workflow.id, transition_code)?;
            (workflow, transition)
        };
        let (state_element, child_element) = elements(&workflow)?;
        let child_id = self.store.insert_child(&child_element, &state_element.table, parent_id, transition.id)?;
        self.try_update(workflow_code, child_id)?;
        Ok(child_id)
    }

    fn fire_effects(&mut self, defaults: &DefaultParameters) -> Result<(), RfError> {
        self.try_fire_effects(defaults)
            .map_err(|source| RfError::TransitionEffects { workflow_code: defaults.workflow.code.clone(),
                                                           tracking_id: defaults.child_tracking_id,
                                                           source: Box::new(source) })
    }

    fn try_fire_effects(&mut self, defaults: &DefaultParameters) -> Result<(), RfError> {
        let (effects, transition_params) = {
            let dao = RfDao::new(&self.store);
            let declared = dao.workflow_parameters(defaults.workflow.id)?;
            let codes: BTreeMap<i64, &str> = declared.iter().map(|p| (p.id, p.code.as_str())).collect();
            let values = dao.transition_parameter_values(defaults.transition.id)?;
            let params = ParameterValues::build(declared.iter().map(|p| (p.code.as_str(), p.allow_multiple)),
                                                values.into_iter()
                                                      .filter_map(|v| {
                                                          codes.get(&v.workflow_parameter_id).map(|c| (*c, v.value))
                                                      }));
            (dao.effects_for_transition(defaults.transition.id)?, params)
        };

        for effect in &effects {
            let (script, custom) = {
                let dao = RfDao::new(&self.store);
                let script = dao.script(effect.script_id)?;
                let declared = dao.script_parameters(script.id)?;
                let codes: BTreeMap<i64, &str> = declared.iter().map(|p| (p.id, p.code.as_str())).collect();
                let values = dao.script_parameter_values(effect.id)?;
                let custom = ParameterValues::build(declared.iter().map(|p| (p.code.as_str(), p.allow_multiple)),
                                                    values.into_iter().filter_map(|v| {
                                                                          codes.get(&v.script_parameter_id)
                                                                               .map(|c| (*c, v.value))
                                                                      }));
                (script, custom)
            };
            debug!("firing effect {} (order {}, script {}) for workflow {} child {}",
                   effect.code,
                   effect.execution_order,
                   script.script_object,
                   defaults.workflow.code,
                   defaults.child_tracking_id);

            let instance = self.registry.instantiate(&script.script_object)?;
            let params = RulesFrameworkParameters { defaults, transition: &transition_params, custom, effect };
            let mut ctx = EffectContext { store: &mut self.store, host: &self.host };
            instance.do_effect(&mut ctx, &params)
                    .map_err(|source| RfError::Effect { effect_code: effect.code.clone(),
                                                        script_object: script.script_object.clone(),
                                                        source })?;
        }
        Ok(())
    }
}

fn elements(workflow: &Workflow) -> Result<(ElementRef, ElementRef), RfError> {
    Ok((ElementRef::parse(&workflow.parent_state_element)?, ElementRef::parse(&workflow.child_transition_element)?))
}
