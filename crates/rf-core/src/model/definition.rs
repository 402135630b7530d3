//! Filas tipadas del modelo de definición.
//!
//! Cada struct corresponde 1:1 a una tabla; los nombres de campo son los
//! nombres de columna del backend Postgres (el store genérico mapea vía
//! serde). `id` es la clave subrogada local al entorno y `code` la clave de
//! negocio estable entre entornos.
//!
//! No existe `id_base` denormalizado: cada fila hija guarda un único puntero
//! a su dueño (`workflow_id`, `script_id`, `effect_id`, `transition_id`) y el
//! workflow se deriva siguiendo ese puntero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `true` si `day` cae en `[start, end)`; ambos extremos son opcionales.
pub fn window_contains(start: Option<NaiveDate>, end: Option<NaiveDate>, day: NaiveDate) -> bool {
    start.map_or(true, |s| s <= day) && end.map_or(true, |e| day < e)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterType {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub sort_order: Option<i64>,
}

/// Lista de valores reutilizable respaldada por SQL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub sql_text: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Unidad de código enlazable. `script_object` es el nombre que resuelve el
/// `ScriptRegistry` en tiempo de invocación.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub script_object: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptParameter {
    pub id: i64,
    pub script_id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub parameter_type_id: Option<i64>,
    pub lookup_id: Option<i64>,
    pub required: bool,
    pub allow_multiple: bool,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Tipo (tabla) de los objetos hijo que crea el workflow.
    pub child_object: String,
    /// `tabla.columna` del padre que guarda el estado actual.
    pub parent_state_element: String,
    /// `tabla.columna` del hijo que guarda la transición tomada.
    pub child_transition_element: String,
    pub start_x_coordinate: Option<i64>,
    pub start_y_coordinate: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub id: i64,
    pub workflow_id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub x_coordinate: Option<i64>,
    pub y_coordinate: Option<i64>,
}

impl State {
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        window_contains(self.start_date, self.end_date, day)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: i64,
    pub workflow_id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
    /// `None` = permanecer en el estado actual.
    pub to_state_id: Option<i64>,
    pub initial_transition: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Transition {
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        window_contains(self.start_date, self.end_date, day)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionFromState {
    pub id: i64,
    pub transition_id: i64,
    pub state_id: i64,
    pub list_order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRole {
    pub id: i64,
    pub transition_id: i64,
    pub role_id: i64,
    pub list_order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEffect {
    pub id: i64,
    pub workflow_id: i64,
    pub code: String,
    pub name: String,
    pub execution_order: i64,
    pub script_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectTransition {
    pub id: i64,
    pub effect_id: i64,
    pub transition_id: i64,
    pub list_order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowParameter {
    pub id: i64,
    pub workflow_id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub parameter_type_id: Option<i64>,
    pub lookup_id: Option<i64>,
    pub required: bool,
    pub allow_multiple: bool,
    pub sort_order: Option<i64>,
}

/// Valor configurado para (efecto, parámetro de script).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptParameterValue {
    pub id: i64,
    pub effect_id: i64,
    pub script_parameter_id: i64,
    pub value: Option<String>,
}

/// Valor configurado para (transición, parámetro de workflow).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionParameterValue {
    pub id: i64,
    pub transition_id: i64,
    pub workflow_parameter_id: i64,
    pub value: Option<String>,
}

/// Rol del host. `business_key` es la identidad entre entornos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub business_key: String,
    pub name: String,
}
