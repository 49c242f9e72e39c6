use geo::{LineString, Point};
use serde::Serialize;

use crate::candidate::FeatureIx;

/// A single feature traversed by a [`Route`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteStep {
    pub feature: FeatureIx,

    /// The point at which the route entered the feature.
    ///
    /// For the first step of a route, this is the start point.
    pub via_point: Point,
}

/// The shortest route between two points on the network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Total distance of the route, in meters.
    pub distance: f64,
    pub steps: Vec<RouteStep>,
}

impl Route {
    /// The route which is returned when the target cannot be reached.
    pub fn unreachable() -> Self {
        Route {
            distance: f64::INFINITY,
            steps: vec![],
        }
    }

    #[inline]
    pub fn is_reachable(&self) -> bool {
        !self.steps.is_empty() && self.distance.is_finite()
    }

    /// Iterates the features traversed, in order.
    pub fn features(&self) -> impl Iterator<Item = FeatureIx> + '_ {
        self.steps.iter().map(|step| step.feature)
    }

    /// The via-points of the route as a line.
    pub fn via_points(&self) -> LineString {
        self.steps.iter().map(|step| step.via_point).collect()
    }
}
