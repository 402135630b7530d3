use crate::errors::EffectError;
use crate::model::HostContext;
use crate::params::RulesFrameworkParameters;

/// Handle que recibe un efecto: el mismo store sobre el que corre el motor
/// (puede leer y escribir) y el host.
pub struct EffectContext<'a, S> {
    pub store: &'a mut S,
    pub host: &'a dyn HostContext,
}

/// Contrato de un efecto: un único punto de entrada.
pub trait EffectScript<S> {
    fn do_effect(&self, ctx: &mut EffectContext<'_, S>, params: &RulesFrameworkParameters<'_>)
                 -> Result<(), EffectError>;
}

impl<S, F> EffectScript<S> for F
    where F: Fn(&mut EffectContext<'_, S>, &RulesFrameworkParameters<'_>) -> Result<(), EffectError>
{
    fn do_effect(&self, ctx: &mut EffectContext<'_, S>, params: &RulesFrameworkParameters<'_>)
                 -> Result<(), EffectError> {
        self(ctx, params)
    }
}
