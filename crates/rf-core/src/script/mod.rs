//! Despacho de scripts: el `script_object` guardado en la configuración se
//! resuelve contra un registro de constructores en tiempo de invocación.

pub mod definition;
pub mod registry;

pub use definition::{EffectContext, EffectScript};
pub use registry::ScriptRegistry;
