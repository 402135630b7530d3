//! Traits de store y mapeo fila ↔ tabla.
//!
//! `DefinitionStore` cubre las primitivas `select` / `execute` /
//! `executeForKey` sobre las tablas de definición; `TrackedObjectStore` las
//! escrituras sobre los objetos vivos (padre con columna de estado, hijo con
//! columna de transición). El motor sólo lee definiciones.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::StoreError;
use crate::model::definition::*;
use crate::model::ElementRef;

/// Tablas del modelo de definición.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RfTable {
    ParameterType,
    Lookup,
    Script,
    ScriptParameter,
    Workflow,
    State,
    Transition,
    TransitionFromState,
    TransitionRole,
    WorkflowEffect,
    EffectTransition,
    WorkflowParameter,
    ScriptParameterValue,
    TransitionParameterValue,
    Role,
}

impl RfTable {
    pub const ALL: [RfTable; 15] = [RfTable::ParameterType,
                                    RfTable::Lookup,
                                    RfTable::Script,
                                    RfTable::ScriptParameter,
                                    RfTable::Workflow,
                                    RfTable::State,
                                    RfTable::Transition,
                                    RfTable::TransitionFromState,
                                    RfTable::TransitionRole,
                                    RfTable::WorkflowEffect,
                                    RfTable::EffectTransition,
                                    RfTable::WorkflowParameter,
                                    RfTable::ScriptParameterValue,
                                    RfTable::TransitionParameterValue,
                                    RfTable::Role];

    /// Nombre físico de la tabla.
    pub const fn table_name(self) -> &'static str {
        match self {
            RfTable::ParameterType => "t_rf_parameter_type",
            RfTable::Lookup => "t_rf_lookup",
            RfTable::Script => "t_rf_script",
            RfTable::ScriptParameter => "t_rf_script_parameter",
            RfTable::Workflow => "t_rf_workflow",
            RfTable::State => "t_rf_state",
            RfTable::Transition => "t_rf_transition",
            RfTable::TransitionFromState => "m_rf_transition_from_state",
            RfTable::TransitionRole => "m_rf_transition_role",
            RfTable::WorkflowEffect => "t_rf_workflow_effect",
            RfTable::EffectTransition => "m_rf_effect_transition",
            RfTable::WorkflowParameter => "t_rf_workflow_parameter",
            RfTable::ScriptParameterValue => "t_rf_script_parameter_value",
            RfTable::TransitionParameterValue => "t_rf_transition_parameter_value",
            RfTable::Role => "rf_role",
        }
    }
}

/// Fila tipada de una tabla de definición.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned {
    const TABLE: RfTable;
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

macro_rules! impl_record {
    ($($ty:ident => $table:ident),* $(,)?) => {
        $(
            impl Record for $ty {
                const TABLE: RfTable = RfTable::$table;
                fn id(&self) -> i64 { self.id }
                fn set_id(&mut self, id: i64) { self.id = id; }
            }
        )*
    };
}

impl_record! {
    ParameterType => ParameterType,
    Lookup => Lookup,
    Script => Script,
    ScriptParameter => ScriptParameter,
    Workflow => Workflow,
    State => State,
    Transition => Transition,
    TransitionFromState => TransitionFromState,
    TransitionRole => TransitionRole,
    WorkflowEffect => WorkflowEffect,
    EffectTransition => EffectTransition,
    WorkflowParameter => WorkflowParameter,
    ScriptParameterValue => ScriptParameterValue,
    TransitionParameterValue => TransitionParameterValue,
    Role => Role,
}

/// Acceso a las tablas de definición.
pub trait DefinitionStore {
    /// Todas las filas de `R::TABLE`, ordenadas por id.
    fn load<R: Record>(&self) -> Result<Vec<R>, StoreError>;

    /// Inserta y devuelve la clave subrogada asignada (ignora `row.id()`).
    fn insert<R: Record>(&mut self, row: R) -> Result<i64, StoreError>;

    /// Reemplaza la fila con `row.id()`; `NotFound` si no existe.
    fn update<R: Record>(&mut self, row: &R) -> Result<(), StoreError>;

    /// Borra por id; ids inexistentes se ignoran. Devuelve filas borradas.
    fn delete<R: Record>(&mut self, ids: &[i64]) -> Result<usize, StoreError>;

    /// Ejecuta `f` como unidad atómica: si devuelve `Err`, nada de lo
    /// escrito dentro queda visible.
    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
        where F: FnOnce(&mut Self) -> Result<T, E>,
              E: From<StoreError>,
              Self: Sized;

    fn find<R: Record>(&self, id: i64) -> Result<Option<R>, StoreError> {
        Ok(self.load::<R>()?.into_iter().find(|r| r.id() == id))
    }

    fn load_where<R: Record, F>(&self, pred: F) -> Result<Vec<R>, StoreError>
        where F: Fn(&R) -> bool
    {
        Ok(self.load::<R>()?.into_iter().filter(|r| pred(r)).collect())
    }

    /// Filas cuya columna de clave foránea `column` vale `value`, ordenadas
    /// por id. Los backends SQL lo resuelven con un `WHERE` sobre el índice;
    /// esta versión filtra sobre el registro serializado.
    fn load_by<R: Record>(&self, column: &str, value: i64) -> Result<Vec<R>, StoreError> {
        let mut rows = Vec::new();
        for row in self.load::<R>()? {
            let doc = serde_json::to_value(&row)?;
            let field = doc.get(column).ok_or_else(|| {
                                           StoreError::Serialization(format!("{} has no column {column}",
                                                                             R::TABLE.table_name()))
                                       })?;
            if field.as_i64() == Some(value) {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

/// Fila hija tal como la ve el motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildObject {
    pub id: i64,
    pub parent_id: i64,
    pub base_id: i64,
    pub transition_id: Option<i64>,
}

/// Datos vivos: el estado del padre y la transición de cada hijo.
pub trait TrackedObjectStore {
    /// Valor de la columna de estado del padre. `NotFound` si no existe.
    fn current_state(&self, element: &ElementRef, parent_id: i64) -> Result<Option<i64>, StoreError>;

    /// Sobrescribe la columna de estado del padre (incluso con `None`).
    fn write_state(&mut self, element: &ElementRef, parent_id: i64, state_id: Option<i64>) -> Result<(), StoreError>;

    fn child(&self, element: &ElementRef, child_id: i64) -> Result<ChildObject, StoreError>;

    /// Crea un hijo de `parent_id` con la columna de transición rellena. El
    /// `id_base` del hijo es el base del padre, o el propio padre si éste es
    /// un objeto raíz.
    fn insert_child(&mut self,
                    element: &ElementRef,
                    parent_table: &str,
                    parent_id: i64,
                    transition_id: i64)
                    -> Result<i64, StoreError>;
}

/// Store completo que necesita el motor.
pub trait RfStore: DefinitionStore + TrackedObjectStore {}

impl<T: DefinitionStore + TrackedObjectStore> RfStore for T {}
