//! Transiciones que se ofrecen a un actor humano.
//!
//! Una transición es elegible si el rol actual está entre sus roles, la
//! fecha actual cae en su ventana de validez y, o bien uno de sus estados
//! origen es el estado actual del padre, o bien el padre aún no tiene estado
//! y la transición es la inicial. La transición ya guardada en el hijo se
//! ofrece siempre, para que un formulario existente siga mostrando su valor.
//!
//! `update_workflow` no repite este chequeo: confía en la transición que
//! encuentra en el hijo.

use log::debug;

use super::dao::RfDao;
use crate::errors::RfError;
use crate::model::{ElementRef, HostContext, Transition};
use crate::repo::RfStore;

fn choices<S: RfStore>(store: &S,
                       host: &dyn HostContext,
                       workflow_code: &str,
                       parent_id: i64,
                       child_id: Option<i64>,
                       require_to_state: bool)
                       -> Result<Vec<Transition>, RfError> {
    let dao = RfDao::new(store);
    let workflow = dao.workflow_by_code(workflow_code)?;
    let state_element = ElementRef::parse(&workflow.parent_state_element)?;
    let current_state = store.current_state(&state_element, parent_id)?;
    let current_transition = match child_id {
        Some(id) => {
            let transition_element = ElementRef::parse(&workflow.child_transition_element)?;
            store.child(&transition_element, id)?.transition_id
        }
        None => None,
    };
    let today = host.today();
    let role = host.current_role();

    let mut out = Vec::new();
    for t in dao.transitions(workflow.id)? {
        if require_to_state && t.to_state_id.is_none() {
            continue;
        }
        if current_transition == Some(t.id) {
            out.push(t);
            continue;
        }
        if !t.is_active_on(today) {
            continue;
        }
        let role_ok = match role {
            Some(r) => dao.role_ids(t.id)?.contains(&r),
            None => false,
        };
        if !role_ok {
            continue;
        }
        let state_ok = match current_state {
            Some(state) => dao.from_state_ids(t.id)?.contains(&state),
            None => t.initial_transition,
        };
        if state_ok {
            out.push(t);
        }
    }
    debug!("{} eligible transitions for workflow {} parent {}", out.len(), workflow_code, parent_id);
    Ok(out)
}

/// Transiciones elegibles para un hijo (nuevo si `child_id` es `None`).
pub fn child_transition_choices<S: RfStore>(store: &S,
                                            host: &dyn HostContext,
                                            workflow_code: &str,
                                            parent_id: i64,
                                            child_id: Option<i64>)
                                            -> Result<Vec<Transition>, RfError> {
    choices(store, host, workflow_code, parent_id, child_id, false)
}

/// Igual que `child_transition_choices` pero excluye las transiciones sin
/// estado destino (las que se ofrecen desde el propio padre).
pub fn parent_transition_choices<S: RfStore>(store: &S,
                                             host: &dyn HostContext,
                                             workflow_code: &str,
                                             parent_id: i64)
                                             -> Result<Vec<Transition>, RfError> {
    choices(store, host, workflow_code, parent_id, None, true)
}
