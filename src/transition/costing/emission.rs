use std::f64::consts::PI;

use geo::Point;

use crate::transition::Strategy;

pub trait EmissionStrategy: for<'a> Strategy<EmissionContext<'a>> {}
impl<T> EmissionStrategy for T where T: for<'a> Strategy<EmissionContext<'a>> {}

#[derive(Clone, Copy, Debug)]
pub struct EmissionContext<'a> {
    /// The proposed (candidate) position to be matched onto.
    ///
    /// This lies upon a candidate feature, and is not
    /// provided as input to the match query.
    pub candidate_position: &'a Point,

    /// The trace position the costing method is matching.
    pub source_position: &'a Point,

    /// The distance (in meters) between the source and candidate positions.
    ///
    /// Given since it is already calculated whilst filtering candidates.
    pub distance: f64,
}

impl<'a> EmissionContext<'a> {
    pub fn new(candidate: &'a Point, source: &'a Point, distance: f64) -> Self {
        Self {
            candidate_position: candidate,
            source_position: source,
            distance,
        }
    }
}

/// Models the GPS error as a zero-mean gaussian.
///
/// ## Calculation
///
/// ```math
/// emission(d) = 1 / (σ √(2π)) · e^(-½ (d / σ)²)
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianEmission {
    pub sigma: f64,
}

impl GaussianEmission {
    pub fn new(sigma: f64) -> Self {
        GaussianEmission { sigma }
    }

    /// The probability density at `distance`.
    pub fn pdf(&self, distance: f64) -> f64 {
        self.log_pdf(distance).exp()
    }

    #[inline]
    fn log_pdf(&self, distance: f64) -> f64 {
        let normalised = distance / self.sigma;
        -(self.sigma * (2.0 * PI).sqrt()).ln() - 0.5 * normalised * normalised
    }
}

impl<'a> Strategy<EmissionContext<'a>> for GaussianEmission {
    type Cost = f64;

    fn calculate(&self, context: EmissionContext<'a>) -> Option<Self::Cost> {
        Some(self.log_pdf(context.distance))
    }
}
