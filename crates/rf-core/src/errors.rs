//! Errores del core.
//!
//! Tres familias, igual que la taxonomía del framework:
//! - configuración (`RfError` salvo `Effect`/`Store`): fatales y con contexto.
//! - ejecución de efectos (`EffectError`, envuelto en `RfError::Effect`).
//! - colaborador relacional (`StoreError`): se propagan sin reinterpretar.

use thiserror::Error;

/// Errores devueltos por los stores (memoria o Postgres).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StoreError {
    #[error("{table} row {id} not found")] NotFound { table: String, id: i64 },
    #[error("constraint violation: {0}")] Constraint(String),
    #[error("backend error: {0}")] Backend(String),
    #[error("serialization error: {0}")] Serialization(String),
    #[error("invalid SQL identifier {0:?}")] InvalidIdentifier(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error que devuelve un script de efecto desde `do_effect`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EffectError {
    #[error("{0}")] Failed(String),
    #[error("missing required parameter {0:?}")] MissingParameter(String),
    #[error(transparent)] Store(#[from] StoreError),
}

/// Errores del motor de transiciones y del servicio de lookup.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RfError {
    #[error("{entity} {key:?} not found")] NotFound { entity: &'static str, key: String },
    #[error("{entity} code {code:?} matched {found} rows, expected exactly one")]
    NotUnique { entity: &'static str, code: String, found: usize },
    #[error("there should only be 1 matching initial transition for workflow {workflow_code:?}, found {found}")]
    InitialTransition { workflow_code: String, found: usize },
    #[error("child {child_id} has no transition recorded")] ChildWithoutTransition { child_id: i64 },
    #[error("invalid element reference {0:?}, expected table.column")] InvalidElement(String),
    #[error("script object {0:?} is not registered")] ScriptNotRegistered(String),
    #[error("effect {effect_code:?} ({script_object}) failed: {source}")]
    Effect {
        effect_code: String,
        script_object: String,
        #[source]
        source: EffectError,
    },
    #[error(transparent)] Store(#[from] StoreError),
    #[error("error starting workflow for workflowCode: {workflow_code}, trackingId: {tracking_id}: {source}")]
    StartWorkflow {
        workflow_code: String,
        tracking_id: i64,
        #[source]
        source: Box<RfError>,
    },
    #[error("error updating workflow for workflowCode: {workflow_code}, trackingId: {tracking_id}: {source}")]
    UpdateWorkflow {
        workflow_code: String,
        tracking_id: i64,
        #[source]
        source: Box<RfError>,
    },
    #[error("error inserting child workflow for workflowCode: {workflow_code}, parentTrackingId: {tracking_id}, transitionCode: {transition_code}: {source}")]
    InsertChildWorkflow {
        workflow_code: String,
        tracking_id: i64,
        transition_code: String,
        #[source]
        source: Box<RfError>,
    },
    #[error("error performing transition effects for workflowCode: {workflow_code}, trackingId: {tracking_id}: {source}")]
    TransitionEffects {
        workflow_code: String,
        tracking_id: i64,
        #[source]
        source: Box<RfError>,
    },
}

/// Clasificación gruesa de un `RfError` (ver taxonomía del módulo).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    Effect,
    Store,
}

impl RfError {
    /// Error raíz, atravesando los envoltorios de contexto.
    pub fn root(&self) -> &RfError {
        match self {
            RfError::StartWorkflow { source, .. }
            | RfError::UpdateWorkflow { source, .. }
            | RfError::InsertChildWorkflow { source, .. }
            | RfError::TransitionEffects { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self.root() {
            RfError::Effect { .. } => ErrorClass::Effect,
            RfError::Store(_) => ErrorClass::Store,
            _ => ErrorClass::Configuration,
        }
    }
}
