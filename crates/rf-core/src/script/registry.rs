//! Registro `script_object` → constructor.

use std::collections::BTreeMap;
use std::fmt;

use super::definition::{EffectContext, EffectScript};
use crate::errors::{EffectError, RfError};
use crate::params::RulesFrameworkParameters;

type ScriptFactory<S> = Box<dyn Fn() -> Box<dyn EffectScript<S>>>;

/// Se puebla al arrancar el proceso; cada invocación instancia el script de
/// nuevo a partir de su constructor.
pub struct ScriptRegistry<S> {
    factories: BTreeMap<String, ScriptFactory<S>>,
}

impl<S: 'static> ScriptRegistry<S> {
    pub fn new() -> Self {
        Self { factories: BTreeMap::new() }
    }

    /// Registra un constructor. Un nombre repetido reemplaza al anterior.
    pub fn register<F>(&mut self, script_object: impl Into<String>, factory: F) -> &mut Self
        where F: Fn() -> Box<dyn EffectScript<S>> + 'static
    {
        self.factories.insert(script_object.into(), Box::new(factory));
        self
    }

    /// Registra un tipo construible con `Default`.
    pub fn register_default<T>(&mut self, script_object: impl Into<String>) -> &mut Self
        where T: EffectScript<S> + Default + 'static
    {
        self.register(script_object, || Box::new(T::default()))
    }

    /// Registra una función o closure como efecto.
    pub fn register_fn<F>(&mut self, script_object: impl Into<String>, f: F) -> &mut Self
        where F: Fn(&mut EffectContext<'_, S>, &RulesFrameworkParameters<'_>) -> Result<(), EffectError>
                  + Clone
                  + 'static
    {
        self.register(script_object, move || Box::new(f.clone()))
    }

    /// Instancia el script registrado como `script_object`.
    pub fn instantiate(&self, script_object: &str) -> Result<Box<dyn EffectScript<S>>, RfError> {
        self.factories
            .get(script_object)
            .map(|factory| factory())
            .ok_or_else(|| RfError::ScriptNotRegistered(script_object.to_string()))
    }

    pub fn contains(&self, script_object: &str) -> bool {
        self.factories.contains_key(script_object)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl<S: 'static> Default for ScriptRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for ScriptRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRegistry").field("scripts", &self.factories.keys().collect::<Vec<_>>()).finish()
    }
}
