//! rf-core: modelo de definición, stores y motor del Rules Framework.
//!
//! - `model`: filas tipadas (workflow, estados, transiciones, efectos,
//!   parámetros) y el handle del host.
//! - `repo`: traits de store + backend en memoria.
//! - `lookup`: accesores de lectura, elegibilidad y validación.
//! - `params`: bundle de parámetros que recibe cada efecto.
//! - `script`: contrato de efecto y registro de scripts.
//! - `engine`: `start_workflow`, `update_workflow`, `insert_child_workflow`.
pub mod engine;
pub mod errors;
pub mod lookup;
pub mod model;
pub mod params;
pub mod repo;
pub mod script;

pub use engine::{EngineBuilder, RulesEngine};
pub use errors::{EffectError, ErrorClass, RfError, StoreError};
pub use lookup::{validate_workflow, DefinitionIssue, RfDao, WorkflowGraph};
pub use model::{ElementRef, HostContext, StaticHost, SystemHost};
pub use params::{DefaultParameters, ParameterValues, RulesFrameworkParameters};
pub use repo::{ChildObject, DefinitionStore, InMemoryRfStore, Record, RfStore, RfTable, TrackedObjectStore};
pub use script::{EffectContext, EffectScript, ScriptRegistry};
