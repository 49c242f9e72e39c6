use serde::{Deserialize, Serialize};

use crate::transition::MatchError;

// 4.1m, the standard deviation of GPS error (Newson & Krumm)
const DEFAULT_SIGMA: f64 = 4.1;
const DEFAULT_BETA: f64 = 0.9;

const DEFAULT_MAX_POINT_TO_ROAD_DISTANCE: f64 = 10.0;
const DEFAULT_MAX_ROUTE_TO_TRACE_DISTANCE_DIFFERENCE: f64 = 300.0;

const DEFAULT_REVISIT_PENALTY_WEIGHT: f64 = 100.0;

const DEFAULT_BROKEN_TIME_GAP: f64 = 60.0; // 60s
const DEFAULT_BROKEN_DISTANCE_GAP: f64 = 300.0; // 300m

/// Configuration of a [`TraceMatcher`](crate::TraceMatcher).
///
/// All distances are in meters, and all durations in seconds.
/// Every field has a default, so partial configurations may be
/// deserialized.
///
/// ```rust
/// use tracesnap::TraceSnapOptions;
///
/// let options = TraceSnapOptions::default()
///     .with_sigma(5.0)
///     .with_allow_loops(true);
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSnapOptions {
    /// The standard deviation of the GPS error, used for the emission probability.
    pub sigma: f64,

    /// The scale of the exponential decay used for the transition probability.
    pub beta: f64,

    /// Candidates further than this from a trace point are discarded.
    pub max_point_to_road_distance: f64,

    /// Transitions whose route distance differs from the great-circle
    /// distance between the trace points by more than this are pruned.
    pub max_route_to_trace_distance_difference: f64,

    /// Whether routes may revisit features or via-points already travelled.
    pub allow_loops: bool,

    /// Subtracted from the log-score of a transition, per revisited feature.
    pub revisit_segment_penalty_weight: f64,

    /// Subtracted from the log-score of a transition, per revisited via-point.
    pub revisit_via_point_penalty_weight: f64,

    /// A time gap larger than this between matched points starts a new sub-sequence.
    pub broken_time_gap_reset_sequence: f64,

    /// A distance larger than this between matched points starts a new sub-sequence.
    pub broken_distance_gap_reset_sequence: f64,
}

impl Default for TraceSnapOptions {
    fn default() -> Self {
        TraceSnapOptions {
            sigma: DEFAULT_SIGMA,
            beta: DEFAULT_BETA,
            max_point_to_road_distance: DEFAULT_MAX_POINT_TO_ROAD_DISTANCE,
            max_route_to_trace_distance_difference: DEFAULT_MAX_ROUTE_TO_TRACE_DISTANCE_DIFFERENCE,
            allow_loops: false,
            revisit_segment_penalty_weight: DEFAULT_REVISIT_PENALTY_WEIGHT,
            revisit_via_point_penalty_weight: DEFAULT_REVISIT_PENALTY_WEIGHT,
            broken_time_gap_reset_sequence: DEFAULT_BROKEN_TIME_GAP,
            broken_distance_gap_reset_sequence: DEFAULT_BROKEN_DISTANCE_GAP,
        }
    }
}

impl TraceSnapOptions {
    pub fn with_sigma(self, sigma: f64) -> Self {
        TraceSnapOptions { sigma, ..self }
    }

    pub fn with_beta(self, beta: f64) -> Self {
        TraceSnapOptions { beta, ..self }
    }

    pub fn with_max_point_to_road_distance(self, meters: f64) -> Self {
        TraceSnapOptions {
            max_point_to_road_distance: meters,
            ..self
        }
    }

    pub fn with_max_route_to_trace_distance_difference(self, meters: f64) -> Self {
        TraceSnapOptions {
            max_route_to_trace_distance_difference: meters,
            ..self
        }
    }

    pub fn with_allow_loops(self, allow_loops: bool) -> Self {
        TraceSnapOptions {
            allow_loops,
            ..self
        }
    }

    pub fn with_revisit_penalty_weights(self, segment: f64, via_point: f64) -> Self {
        TraceSnapOptions {
            revisit_segment_penalty_weight: segment,
            revisit_via_point_penalty_weight: via_point,
            ..self
        }
    }

    pub fn with_broken_time_gap(self, seconds: f64) -> Self {
        TraceSnapOptions {
            broken_time_gap_reset_sequence: seconds,
            ..self
        }
    }

    pub fn with_broken_distance_gap(self, meters: f64) -> Self {
        TraceSnapOptions {
            broken_distance_gap_reset_sequence: meters,
            ..self
        }
    }

    /// Checks every parameter lies within its domain.
    ///
    /// `sigma` and `beta` must be positive, every other
    /// parameter must be non-negative. None may be NaN or infinite.
    pub fn validate(&self) -> Result<(), MatchError> {
        let positive = [("sigma", self.sigma), ("beta", self.beta)];
        let non_negative = [
            ("max_point_to_road_distance", self.max_point_to_road_distance),
            (
                "max_route_to_trace_distance_difference",
                self.max_route_to_trace_distance_difference,
            ),
            (
                "revisit_segment_penalty_weight",
                self.revisit_segment_penalty_weight,
            ),
            (
                "revisit_via_point_penalty_weight",
                self.revisit_via_point_penalty_weight,
            ),
            (
                "broken_time_gap_reset_sequence",
                self.broken_time_gap_reset_sequence,
            ),
            (
                "broken_distance_gap_reset_sequence",
                self.broken_distance_gap_reset_sequence,
            ),
        ];

        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(MatchError::InvalidOptions(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(MatchError::InvalidOptions(format!(
                    "{name} must be non-negative and finite, got {value}"
                )));
            }
        }

        Ok(())
    }
}
