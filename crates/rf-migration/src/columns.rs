//! Nombres de grupo y de columna del documento portable.

pub const PARAMETER_TYPE: &str = "T_RF_PARAMETER_TYPE";
pub const LOOKUP: &str = "T_RF_LOOKUP";
pub const SCRIPT: &str = "T_RF_SCRIPT";
pub const SCRIPT_PARAMETER: &str = "T_RF_SCRIPT_PARAMETER";
pub const WORKFLOW: &str = "T_RF_WORKFLOW";
pub const STATE: &str = "T_RF_STATE";
pub const TRANSITION: &str = "T_RF_TRANSITION";
pub const TRANSITION_FROM_STATE: &str = "M_RF_TRANSITION_FROM_STATE";
pub const TRANSITION_ROLE: &str = "M_RF_TRANSITION_ROLE";
pub const WORKFLOW_EFFECT: &str = "T_RF_WORKFLOW_EFFECT";
pub const EFFECT_TRANSITION: &str = "M_RF_EFFECT_TRANSITION";
pub const WORKFLOW_PARAMETER: &str = "T_RF_WORKFLOW_PARAMETER";
pub const SCRIPT_PARAMETER_VALUE: &str = "T_RF_SCRIPT_PARAMETER_VALUE";
pub const TRANSITION_PARAMETER_VALUE: &str = "T_RF_TRANSITION_PARAMETER_VALUE";
pub const ROLE: &str = "RF_ROLE";

pub const ID: &str = "ID";
pub const ID_PARENT: &str = "ID_PARENT";
pub const ID_OWNER: &str = "ID_OWNER";
pub const LIST_ORDER: &str = "LIST_ORDER";
pub const CODE: &str = "C_CODE";
pub const NAME: &str = "C_NAME";
pub const DESCRIPTION: &str = "C_DESCRIPTION";
pub const ORDER: &str = "C_ORDER";
pub const START_DATE: &str = "C_START_DATE";
pub const END_DATE: &str = "C_END_DATE";
pub const X_COORDINATE: &str = "C_X_COORDINATE";
pub const Y_COORDINATE: &str = "C_Y_COORDINATE";
pub const SQL: &str = "C_SQL";
pub const SCRIPT_OBJECT: &str = "C_SCRIPT_OBJECT";
pub const PARAMETER_TYPE_REF: &str = "C_TYPE";
pub const LOOKUP_REF: &str = "C_LOOKUP";
pub const REQUIRED: &str = "C_REQUIRED";
pub const ALLOW_MULTIPLE: &str = "C_ALLOW_MULTIPLE";
pub const CHILD_OBJECT: &str = "C_CHILD_OBJECT";
pub const PARENT_STATE_ELEMENT: &str = "C_PARENT_STATE_ELEMENT";
pub const CHILD_TRANSITION_ELEMENT: &str = "C_CHILD_TRANSITION_ELEMENT";
pub const START_X_COORDINATE: &str = "C_START_STATE_X_COORDINATE";
pub const START_Y_COORDINATE: &str = "C_START_STATE_Y_COORDINATE";
pub const TO_STATE: &str = "C_TO_STATE";
pub const INITIAL_TRANSITION: &str = "C_INITIAL_TRANSITION";
pub const FROM_STATE: &str = "C_FROM_STATE";
pub const ROLE_REF: &str = "C_ROLE";
pub const EXECUTION_ORDER: &str = "C_EXECUTION_ORDER";
pub const SCRIPT_REF: &str = "C_SCRIPT";
pub const TRANSITION_REF: &str = "C_TRANSITION";
pub const SCRIPT_PARAMETER_REF: &str = "C_SCRIPT_PARAMETER";
pub const WORKFLOW_PARAMETER_REF: &str = "C_WORKFLOW_PARAMETER";
pub const VALUE: &str = "C_VALUE";
pub const ROLE_ID: &str = "ROLE_ID";
pub const BUSINESS_KEY: &str = "BUSINESS_KEY";

/// Formato de fecha del documento.
pub const DATE_FORMAT: &str = "%m/%d/%Y";
