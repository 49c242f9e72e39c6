use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use geo::{LineString, Point};
use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{Value, json};

use crate::candidate::FeatureIx;
use crate::route::Route;
use crate::spatial;

/// Refers to a prediction of an earlier point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PredictionRef {
    /// The index of the point within the trace.
    pub point: usize,
    /// The index of the prediction within the point's predictions.
    pub candidate: usize,
}

/// The features and via-points travelled along the best path to a prediction.
///
/// Each link holds only what its own route added, and shares the path
/// of its predecessor, so a trace stores every route once.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Travelled {
    pub(crate) parent: Option<Arc<Travelled>>,
    features: Vec<FeatureIx>,
    via_points: Vec<(u64, u64)>,
}

impl Travelled {
    pub(crate) fn starting_at(feature: FeatureIx) -> Self {
        Travelled {
            parent: None,
            features: vec![feature],
            via_points: vec![],
        }
    }

    /// Extends the travelled path by the route.
    pub(crate) fn extend(self: &Arc<Self>, route: &Route) -> Self {
        Travelled {
            parent: Some(Arc::clone(self)),
            features: route.features().collect(),
            via_points: route
                .steps
                .iter()
                .skip(1)
                .map(|step| spatial::point_key(&step.via_point))
                .collect(),
        }
    }

    fn links(&self) -> impl Iterator<Item = &Travelled> {
        std::iter::successors(Some(self), |link| link.parent.as_deref())
    }

    /// Gathers the whole path for lookups.
    pub(crate) fn visited(&self) -> Visited {
        self.links().fold(Visited::default(), |mut visited, link| {
            visited.features.extend(link.features.iter().copied());
            visited.via_points.extend(link.via_points.iter().copied());
            visited
        })
    }
}

impl Drop for Travelled {
    // Unlinks iteratively, long paths would otherwise recurse once per point.
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(link) = parent {
            parent = match Arc::try_unwrap(link) {
                Ok(mut link) => link.parent.take(),
                Err(_) => None,
            };
        }
    }
}

/// Every feature and via-point along a travelled path.
#[derive(Debug, Default)]
pub(crate) struct Visited {
    pub(crate) features: FxHashSet<FeatureIx>,
    pub(crate) via_points: FxHashSet<(u64, u64)>,
}

impl Visited {
    /// Counts the `(features, via-points)` of the route, excluding
    /// its first step, which have already been travelled.
    pub(crate) fn revisits(&self, route: &Route) -> (u32, u32) {
        route
            .steps
            .iter()
            .skip(1)
            .fold((0, 0), |(segments, via_points), step| {
                let via_point = spatial::point_key(&step.via_point);
                (
                    segments + self.features.contains(&step.feature) as u32,
                    via_points + self.via_points.contains(&via_point) as u32,
                )
            })
    }
}

/// A single hypothesis of the position a trace point was recorded on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnappedPointPrediction {
    pub feature: FeatureIx,
    pub feature_id: String,

    /// The position on the feature nearest to the trace point.
    pub snapped_point: Point,
    pub distance_to_snapped_road: f64,

    /// The route distance from the best prediction of the previous point.
    /// Zero at the start of a sub-sequence.
    pub route_distance_to_prev_point: f64,

    pub emission_probability: f64,

    /// The transition probability from the best predecessor,
    /// absent at the start of a sub-sequence.
    pub transition_probability: Option<f64>,

    /// The cumulative log-probability of the best path ending at this prediction.
    pub best_log_prob: f64,
    pub best_prev_prediction: Option<PredictionRef>,

    /// The via-points of the route from the best predecessor.
    pub best_route_via_points: Vec<Point>,

    pub revisited_via_points: u32,
    pub revisited_segments: u32,

    #[serde(skip)]
    pub(crate) travelled: Arc<Travelled>,
}

/// The matching state of a single trace point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSnapInfo {
    pub index: usize,
    pub point: Point,
    pub timestamp: Option<DateTime<Utc>>,

    /// Seconds elapsed since the previous point of the trace, if both are timestamped.
    pub seconds_since_prev_point: Option<f64>,

    /// The surviving predictions, ordered by distance to road.
    pub predictions: Vec<SnappedPointPrediction>,

    /// The index of the selected prediction within `predictions`.
    pub best_prediction: Option<usize>,

    /// Whether the point begins a new sub-sequence.
    pub starts_sequence: bool,

    /// Set when no candidate survived filtering.
    pub ignore: bool,
}

impl PointSnapInfo {
    pub(crate) fn ignored(index: usize, point: Point, timestamp: Option<DateTime<Utc>>) -> Self {
        PointSnapInfo {
            index,
            point,
            timestamp,
            seconds_since_prev_point: None,
            predictions: vec![],
            best_prediction: None,
            starts_sequence: false,
            ignore: true,
        }
    }

    pub fn best(&self) -> Option<&SnappedPointPrediction> {
        self.best_prediction
            .and_then(|index| self.predictions.get(index))
    }

    /// The index of the prediction with the highest log-probability.
    /// Ties resolve to the earliest prediction.
    pub(crate) fn most_likely(&self) -> Option<usize> {
        self.predictions
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (index, prediction)| match best {
                Some((_, score)) if score >= prediction.best_log_prob => best,
                _ => Some((index, prediction.best_log_prob)),
            })
            .map(|(index, _)| index)
    }
}

/// The level of detail to [render](TraceMatchResult::render) a result with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// Only the best prediction of each point.
    #[default]
    Summary,
    /// Every prediction, including the emission and transition internals.
    Diagnostic,
}

/// The outcome of matching a trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceMatchResult {
    pub id: String,
    pub geometry: LineString,
    pub points: Vec<PointSnapInfo>,

    /// The length of the raw trace, in meters.
    pub source_length: f64,

    /// The number of routes considered between candidates.
    pub route_distance_candidates: usize,
    pub elapsed: Duration,

    pub sequence_breaks: usize,
    pub points_with_matches: usize,

    /// The mean distance of each best prediction to the trace point,
    /// absent when no point matched.
    pub avg_dist_to_road: Option<f64>,

    pub revisited_via_points: u32,
    pub revisited_segments: u32,

    /// The total route distance along the best predictions, in meters.
    pub route_length: f64,
}

impl TraceMatchResult {
    /// The matched points, with their best predictions.
    pub fn matched(&self) -> impl Iterator<Item = (&PointSnapInfo, &SnappedPointPrediction)> {
        self.points
            .iter()
            .filter_map(|point| point.best().map(|best| (point, best)))
    }

    /// The snapped positions of the best predictions as a line.
    pub fn snapped(&self) -> LineString {
        self.matched()
            .map(|(_, prediction)| prediction.snapped_point)
            .collect()
    }

    /// Renders the result into JSON, for consumers of the match.
    pub fn render(&self, detail: Detail) -> Value {
        let points = self
            .points
            .iter()
            .map(|point| {
                let mut rendered = json!({
                    "index": point.index,
                    "point": [point.point.x(), point.point.y()],
                    "timestamp": point.timestamp,
                    "seconds_since_prev_point": point.seconds_since_prev_point,
                    "ignore": point.ignore,
                    "best_prediction": point.best().map(render_summary),
                });

                if detail == Detail::Diagnostic {
                    rendered["starts_sequence"] = json!(point.starts_sequence);
                    rendered["predictions"] =
                        Value::Array(point.predictions.iter().map(render_diagnostic).collect());
                }

                rendered
            })
            .collect::<Vec<_>>();

        json!({
            "id": self.id,
            "source_length": self.source_length,
            "route_length": self.route_length,
            "route_distance_candidates": self.route_distance_candidates,
            "elapsed_ms": self.elapsed.as_secs_f64() * 1_000.0,
            "sequence_breaks": self.sequence_breaks,
            "points_with_matches": self.points_with_matches,
            "avg_dist_to_road": self.avg_dist_to_road,
            "revisited_via_points": self.revisited_via_points,
            "revisited_segments": self.revisited_segments,
            "points": points,
        })
    }
}

fn render_summary(prediction: &SnappedPointPrediction) -> Value {
    json!({
        "feature_id": prediction.feature_id,
        "snapped_point": [prediction.snapped_point.x(), prediction.snapped_point.y()],
        "distance_to_snapped_road": prediction.distance_to_snapped_road,
        "route_distance_to_prev_point": prediction.route_distance_to_prev_point,
    })
}

fn render_diagnostic(prediction: &SnappedPointPrediction) -> Value {
    let mut rendered = render_summary(prediction);
    rendered["emission_probability"] = json!(prediction.emission_probability);
    rendered["transition_probability"] = json!(prediction.transition_probability);
    rendered["best_log_prob"] = json!(prediction.best_log_prob);
    rendered["best_prev_prediction"] = json!(prediction.best_prev_prediction);
    rendered["best_route_via_points"] = Value::Array(
        prediction
            .best_route_via_points
            .iter()
            .map(|point| json!([point.x(), point.y()]))
            .collect(),
    );
    rendered["revisited_via_points"] = json!(prediction.revisited_via_points);
    rendered["revisited_segments"] = json!(prediction.revisited_segments);

    rendered
}
