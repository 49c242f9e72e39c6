use crate::transition::*;

pub struct CostingStrategies<E, T>
where
    E: EmissionStrategy,
    T: TransitionStrategy,
{
    emission: E,
    transition: T,
}

impl<E, T> CostingStrategies<E, T>
where
    E: EmissionStrategy,
    T: TransitionStrategy,
{
    pub fn new(emission: E, transition: T) -> Self {
        Self {
            emission,
            transition,
        }
    }
}

impl CostingStrategies<GaussianEmission, ExponentialTransition> {
    /// The default strategies, parameterised by the options.
    pub fn from_options(options: &TraceSnapOptions) -> Self {
        CostingStrategies::new(
            GaussianEmission::new(options.sigma),
            ExponentialTransition::new(options.beta),
        )
    }
}

impl Default for CostingStrategies<GaussianEmission, ExponentialTransition> {
    fn default() -> Self {
        CostingStrategies::from_options(&TraceSnapOptions::default())
    }
}

impl<E, T> Costing<E, T> for CostingStrategies<E, T>
where
    T: TransitionStrategy,
    E: EmissionStrategy,
{
    #[inline(always)]
    fn emission(&self, context: EmissionContext) -> Option<f64> {
        self.emission.log_likelihood(context)
    }

    #[inline(always)]
    fn transition(&self, context: TransitionContext) -> Option<f64> {
        self.transition.log_likelihood(context)
    }
}
