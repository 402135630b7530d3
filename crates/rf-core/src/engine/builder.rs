//! Builder para `RulesEngine`.
//!
//! ```ignore
//! let engine = RulesEngine::builder(store, host)
//!     .script_fn("notify.owner", |ctx, params| { /* ... */ Ok(()) })
//!     .build();
//! ```

use crate::errors::EffectError;
use crate::model::HostContext;
use crate::params::RulesFrameworkParameters;
use crate::repo::RfStore;
use crate::script::{EffectContext, EffectScript, ScriptRegistry};

use super::core::RulesEngine;

/// Acumula scripts antes de construir el motor.
#[derive(Debug)]
pub struct EngineBuilder<S, H> {
    store: S,
    host: H,
    registry: ScriptRegistry<S>,
}

impl<S: RfStore + 'static, H: HostContext> EngineBuilder<S, H> {
    pub fn new(store: S, host: H) -> Self {
        Self { store, host, registry: ScriptRegistry::new() }
    }

    /// Sustituye el registro completo.
    pub fn registry(mut self, registry: ScriptRegistry<S>) -> Self {
        self.registry = registry;
        self
    }

    pub fn script<F>(mut self, script_object: &str, factory: F) -> Self
        where F: Fn() -> Box<dyn EffectScript<S>> + 'static
    {
        self.registry.register(script_object, factory);
        self
    }

    pub fn script_fn<F>(mut self, script_object: &str, f: F) -> Self
        where F: Fn(&mut EffectContext<'_, S>, &RulesFrameworkParameters<'_>) -> Result<(), EffectError>
                  + Clone
                  + 'static
    {
        self.registry.register_fn(script_object, f);
        self
    }

    pub fn build(self) -> RulesEngine<S, H> {
        RulesEngine::new(self.store, self.host, self.registry)
    }
}
