//! You may override individual costing strategies
//! in order to apply custom functionality to the
//! trace matcher. See the [`Strategy`] trait.
//!
//! ## Structure
//! Strategies are joined onto the aggregate [`CostingStrategies`]
//! structure, which is then supplied to the matcher using
//! [`TraceMatcher::with_costing`](crate::TraceMatcher::with_costing).
//!
//! By default, the matcher derives its strategies from its options,
//! using [`GaussianEmission`] and [`ExponentialTransition`].
//!
//! ### Creating your own strategy
//!
//! In order to make your own transition and emission strategies, you must
//! implement [`Strategy`] for your structure, with the context of the heuristic
//! you need to override.
//!
//! The higher-order traits, like [`TransitionStrategy`] are auto-derived for all
//! which implement [`Strategy<TransitionContext>`].
//!
//!```rust
//! use tracesnap::transition::{Strategy, TransitionContext};
//!
//! /// Prefers routes which follow the trace closely, with no upper bound.
//! struct Linear;
//!
//! impl<'a> Strategy<TransitionContext<'a>> for Linear {
//!    type Cost = f64;
//!
//!    fn calculate(&self, context: TransitionContext<'a>) -> Option<Self::Cost> {
//!        Some(-context.deviance())
//!    }
//! }
//! ```
//!
//! ### Using Context
//! Each strategy accepts a context, defined in the
//! generic `Ctx` parameter of the [`Strategy`] trait.
//!
//! - [`TransitionContext`]
//!     Supplies the route found between two candidates,
//!     and the trace points they were matched from.
//!
//! - [`EmissionContext`]
//!     Supplies the candidate position, and the trace
//!     point it was projected from.
//!
#[doc(hidden)]
pub mod default;
#[doc(hidden)]
pub mod emission;
#[doc(hidden)]
pub mod transition;

#[doc(inline)]
pub use default::*;
#[doc(inline)]
pub use emission::*;
#[doc(inline)]
pub use transition::*;

pub trait Strategy<Ctx> {
    /// A calculable cost which can be any required
    /// type, so long as it is castable into a 64-bit float.
    type Cost: Into<f64>;

    /// Calculates the natural logarithm of the likelihood of the
    /// context. Returning `None` rejects the context entirely.
    fn calculate(&self, context: Ctx) -> Option<Self::Cost>;

    /// The log-likelihood of the context, as a float.
    ///
    /// A `NaN` likelihood is treated as a rejection.
    #[inline(always)]
    fn log_likelihood(&self, ctx: Ctx) -> Option<f64> {
        self.calculate(ctx)
            .map(Into::into)
            .filter(|value: &f64| !value.is_nan())
    }
}

pub trait Costing<Emission, Transition>
where
    Transition: TransitionStrategy,
    Emission: EmissionStrategy,
{
    /// The log-likelihood of matching a point onto a candidate.
    fn emission(&self, context: EmissionContext) -> Option<f64>;

    /// The log-likelihood of transitioning between two candidates.
    fn transition(&self, context: TransitionContext) -> Option<f64>;
}
