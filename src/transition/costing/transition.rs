use geo::Point;

use crate::route::Route;
use crate::transition::Strategy;

pub trait TransitionStrategy: for<'a> Strategy<TransitionContext<'a>> {}
impl<T> TransitionStrategy for T where T: for<'a> Strategy<TransitionContext<'a>> {}

#[derive(Clone, Copy, Debug)]
pub struct TransitionContext<'a> {
    /// The shortest route between the source and target candidates.
    pub route: &'a Route,

    /// The trace position the source candidate was matched from.
    pub source_position: &'a Point,

    /// The trace position the target candidate was matched from.
    pub target_position: &'a Point,

    /// The great-circle distance between the two trace positions.
    pub great_circle_distance: f64,
}

impl TransitionContext<'_> {
    /// The absolute difference between the route distance, and the
    /// great-circle distance between the trace positions.
    ///
    /// A route which exactly follows the trace has no deviance.
    #[inline]
    pub fn deviance(&self) -> f64 {
        (self.route.distance - self.great_circle_distance).abs()
    }
}

/// Models the deviance of a route from the trace as exponentially distributed.
///
/// ## Calculation
///
/// ```math
/// deviance(route, trace) = |length(route) - distance(trace)|
/// transition(δ) = (1 / β) · e^(-δ / β)
/// ```
///
/// The value is calculated in log-space, since it underflows
/// for deviances of a few hundred meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExponentialTransition {
    pub beta: f64,
}

impl ExponentialTransition {
    pub fn new(beta: f64) -> Self {
        ExponentialTransition { beta }
    }
}

impl<'a> Strategy<TransitionContext<'a>> for ExponentialTransition {
    type Cost = f64;

    fn calculate(&self, context: TransitionContext<'a>) -> Option<Self::Cost> {
        Some(-self.beta.ln() - context.deviance() / self.beta)
    }
}
