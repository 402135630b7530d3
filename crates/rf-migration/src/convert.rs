//! Fila tipada -> fila del documento. Las referencias se emiten con las
//! claves subrogadas del origen, tal cual.

use rf_core::model::*;
use rf_core::Record;

use crate::columns::*;
use crate::document::DocumentRow;

/// Registro exportable: sabe en qué grupo va y cómo aplanarse.
pub trait PortableRow: Record {
    const GROUP: &'static str;
    fn to_row(&self) -> DocumentRow;
}

impl PortableRow for ParameterType {
    const GROUP: &'static str = PARAMETER_TYPE;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(CODE, &self.code)
                          .with(NAME, &self.name)
                          .with_opt(ORDER, self.sort_order)
    }
}

impl PortableRow for Lookup {
    const GROUP: &'static str = LOOKUP;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(CODE, &self.code)
                          .with(NAME, &self.name)
                          .with_opt(SQL, self.sql_text.as_ref())
                          .with_date(START_DATE, self.start_date)
                          .with_date(END_DATE, self.end_date)
    }
}

impl PortableRow for Script {
    const GROUP: &'static str = SCRIPT;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(CODE, &self.code)
                          .with(NAME, &self.name)
                          .with_opt(DESCRIPTION, self.description.as_ref())
                          .with(SCRIPT_OBJECT, &self.script_object)
    }
}

impl PortableRow for ScriptParameter {
    const GROUP: &'static str = SCRIPT_PARAMETER;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(ID_PARENT, self.script_id)
                          .with(CODE, &self.code)
                          .with(NAME, &self.name)
                          .with_opt(DESCRIPTION, self.description.as_ref())
                          .with_opt(PARAMETER_TYPE_REF, self.parameter_type_id)
                          .with_opt(LOOKUP_REF, self.lookup_id)
                          .with_flag(REQUIRED, self.required)
                          .with_flag(ALLOW_MULTIPLE, self.allow_multiple)
                          .with_opt(ORDER, self.sort_order)
    }
}

impl PortableRow for Workflow {
    const GROUP: &'static str = WORKFLOW;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(CODE, &self.code)
                          .with(NAME, &self.name)
                          .with_opt(DESCRIPTION, self.description.as_ref())
                          .with(CHILD_OBJECT, &self.child_object)
                          .with(PARENT_STATE_ELEMENT, &self.parent_state_element)
                          .with(CHILD_TRANSITION_ELEMENT, &self.child_transition_element)
                          .with_opt(START_X_COORDINATE, self.start_x_coordinate)
                          .with_opt(START_Y_COORDINATE, self.start_y_coordinate)
    }
}

impl PortableRow for State {
    const GROUP: &'static str = STATE;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(ID_PARENT, self.workflow_id)
                          .with(CODE, &self.code)
                          .with(NAME, &self.name)
                          .with_opt(DESCRIPTION, self.description.as_ref())
                          .with_opt(ORDER, self.sort_order)
                          .with_date(START_DATE, self.start_date)
                          .with_date(END_DATE, self.end_date)
                          .with_opt(X_COORDINATE, self.x_coordinate)
                          .with_opt(Y_COORDINATE, self.y_coordinate)
    }
}

impl PortableRow for Transition {
    const GROUP: &'static str = TRANSITION;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(ID_PARENT, self.workflow_id)
                          .with(CODE, &self.code)
                          .with(NAME, &self.name)
                          .with_opt(DESCRIPTION, self.description.as_ref())
                          .with_opt(ORDER, self.sort_order)
                          .with_opt(TO_STATE, self.to_state_id)
                          .with_flag(INITIAL_TRANSITION, self.initial_transition)
                          .with_date(START_DATE, self.start_date)
                          .with_date(END_DATE, self.end_date)
    }
}

impl PortableRow for TransitionFromState {
    const GROUP: &'static str = TRANSITION_FROM_STATE;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(ID_OWNER, self.transition_id)
                          .with(FROM_STATE, self.state_id)
                          .with_opt(LIST_ORDER, self.list_order)
    }
}

impl PortableRow for TransitionRole {
    const GROUP: &'static str = TRANSITION_ROLE;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(ID_OWNER, self.transition_id)
                          .with(ROLE_REF, self.role_id)
                          .with_opt(LIST_ORDER, self.list_order)
    }
}

impl PortableRow for WorkflowEffect {
    const GROUP: &'static str = WORKFLOW_EFFECT;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(ID_PARENT, self.workflow_id)
                          .with(CODE, &self.code)
                          .with(NAME, &self.name)
                          .with(EXECUTION_ORDER, self.execution_order)
                          .with(SCRIPT_REF, self.script_id)
    }
}

impl PortableRow for EffectTransition {
    const GROUP: &'static str = EFFECT_TRANSITION;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(ID_OWNER, self.effect_id)
                          .with(TRANSITION_REF, self.transition_id)
                          .with_opt(LIST_ORDER, self.list_order)
    }
}

impl PortableRow for WorkflowParameter {
    const GROUP: &'static str = WORKFLOW_PARAMETER;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(ID_PARENT, self.workflow_id)
                          .with(CODE, &self.code)
                          .with(NAME, &self.name)
                          .with_opt(DESCRIPTION, self.description.as_ref())
                          .with_opt(PARAMETER_TYPE_REF, self.parameter_type_id)
                          .with_opt(LOOKUP_REF, self.lookup_id)
                          .with_flag(REQUIRED, self.required)
                          .with_flag(ALLOW_MULTIPLE, self.allow_multiple)
                          .with_opt(ORDER, self.sort_order)
    }
}

impl PortableRow for ScriptParameterValue {
    const GROUP: &'static str = SCRIPT_PARAMETER_VALUE;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(ID_PARENT, self.effect_id)
                          .with(SCRIPT_PARAMETER_REF, self.script_parameter_id)
                          .with_opt(VALUE, self.value.as_ref())
    }
}

impl PortableRow for TransitionParameterValue {
    const GROUP: &'static str = TRANSITION_PARAMETER_VALUE;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ID, self.id)
                          .with(ID_PARENT, self.transition_id)
                          .with(WORKFLOW_PARAMETER_REF, self.workflow_parameter_id)
                          .with_opt(VALUE, self.value.as_ref())
    }
}

impl PortableRow for Role {
    const GROUP: &'static str = ROLE;
    fn to_row(&self) -> DocumentRow {
        DocumentRow::new().with(ROLE_ID, self.id).with(BUSINESS_KEY, &self.business_key).with(NAME, &self.name)
    }
}
