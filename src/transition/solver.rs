use std::sync::Arc;
use std::time::Instant;

use geo::{Geometry, Point};
use itertools::iproduct;
use log::{debug, info, trace};
use measure_time::debug_time;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use rustc_hash::FxHashSet;
use wkt::ToWkt;

use crate::candidate::{CandidateIndex, FeatureIx};
use crate::route::{Network, Route, shortest_route};
use crate::spatial;
use crate::transition::result::{Travelled, Visited};
use crate::transition::*;

/// Matches traces onto the candidates of an index.
///
/// The matcher borrows the index and network, which are never
/// mutated, so one matcher (or many) may be shared across threads.
///
/// ```rust,no_run
/// use tracesnap::{CandidateIndex, IndexOptions, Network, Trace, TraceMatcher, TraceSnapOptions};
///
/// # fn run(index: CandidateIndex, trace: Trace) -> tracesnap::Result<()> {
/// let network = Network::from_connectors(&index, "connectors");
/// let matcher = TraceMatcher::new(&index, &network, TraceSnapOptions::default());
///
/// let result = matcher.snap(&trace)?;
/// println!("Matched {} points", result.points_with_matches);
/// # Ok(())
/// # }
/// ```
pub struct TraceMatcher<'a, E = GaussianEmission, T = ExponentialTransition>
where
    E: EmissionStrategy,
    T: TransitionStrategy,
{
    index: &'a CandidateIndex,
    network: &'a Network,
    options: TraceSnapOptions,
    costing: CostingStrategies<E, T>,
}

impl<'a> TraceMatcher<'a> {
    /// Creates a matcher using the default costing strategies,
    /// parameterised by `sigma` and `beta` of the options.
    pub fn new(index: &'a CandidateIndex, network: &'a Network, options: TraceSnapOptions) -> Self {
        TraceMatcher {
            index,
            network,
            options,
            costing: CostingStrategies::from_options(&options),
        }
    }
}

/// The best transition from a prediction of the previous point.
struct Edge {
    route: Route,
    log_transition: f64,
    score: f64,
    segments: u32,
    via_points: u32,
}

/// State carried along the forward pass.
#[derive(Default)]
struct Forward {
    points: Vec<PointSnapInfo>,
    /// The index of the last point which was not ignored.
    previous: Option<usize>,
    sequence_breaks: usize,
    route_distance_candidates: usize,
}

impl<'a, E, T> TraceMatcher<'a, E, T>
where
    E: EmissionStrategy + Send + Sync,
    T: TransitionStrategy + Send + Sync,
{
    /// Replaces the costing strategies of the matcher.
    pub fn with_costing<E2, T2>(
        self,
        costing: CostingStrategies<E2, T2>,
    ) -> TraceMatcher<'a, E2, T2>
    where
        E2: EmissionStrategy,
        T2: TransitionStrategy,
    {
        TraceMatcher {
            index: self.index,
            network: self.network,
            options: self.options,
            costing,
        }
    }

    pub fn options(&self) -> &TraceSnapOptions {
        &self.options
    }

    /// Matches the trace, returning the best prediction of every point.
    ///
    /// Fails only if the options are invalid, the trace is empty, or a
    /// trace point cannot be bucketed. Points without candidates are
    /// marked as ignored rather than failing the match.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, level = "info"))]
    pub fn snap(&self, trace: &Trace) -> Result<TraceMatchResult, MatchError> {
        let start = Instant::now();
        self.options.validate()?;

        if trace.is_empty() {
            return Err(MatchError::EmptyTrace(trace.id.clone()));
        }

        info!("Matching trace {:?} of {} points", trace.id, trace.len());
        debug_time!("TraceMatcher::snap");

        let generator = LayerGenerator::new(self.index, self.options.max_point_to_road_distance);
        let layers = generator.with_points(&trace.points)?;

        let mut forward = Forward {
            points: Vec::with_capacity(trace.len()),
            ..Forward::default()
        };

        {
            debug_time!("forward pass");
            for (index, layer) in layers.layers.iter().enumerate() {
                self.step(&mut forward, trace, index, layer)?;
            }
        }

        let Forward {
            mut points,
            sequence_breaks,
            route_distance_candidates,
            ..
        } = forward;

        let collapsed = collapse(&mut points);
        let geometry = trace.geometry();

        info!(
            "Matched {}/{} points of {:?} with {} sequence breaks",
            collapsed.points_with_matches,
            points.len(),
            trace.id,
            sequence_breaks
        );

        Ok(TraceMatchResult {
            id: trace.id.clone(),
            source_length: spatial::length(&geometry),
            geometry,
            points,
            route_distance_candidates,
            elapsed: start.elapsed(),
            sequence_breaks,
            points_with_matches: collapsed.points_with_matches,
            avg_dist_to_road: collapsed.avg_dist_to_road,
            revisited_via_points: collapsed.revisited_via_points,
            revisited_segments: collapsed.revisited_segments,
            route_length: collapsed.route_length,
        })
    }

    fn step(
        &self,
        forward: &mut Forward,
        trace: &Trace,
        index: usize,
        layer: &Layer,
    ) -> Result<(), MatchError> {
        let Some(point) = trace.points.get(index) else {
            return Ok(());
        };

        let seconds_since_prev_point = index
            .checked_sub(1)
            .and_then(|previous| trace.points.get(previous))
            .and_then(|previous| point.seconds_since(previous));

        let emissions = layer
            .candidates
            .iter()
            .filter_map(|candidate| {
                let context =
                    EmissionContext::new(&candidate.position, &point.position, candidate.distance);
                Some((*candidate, self.costing.emission(context)?))
            })
            .collect::<Vec<_>>();

        debug!(
            "Point {index} ({}): {} candidates",
            point.position.wkt_string(),
            emissions.len()
        );

        if emissions.is_empty() {
            let mut ignored = PointSnapInfo::ignored(index, point.position, point.timestamp);
            ignored.seconds_since_prev_point = seconds_since_prev_point;
            forward.points.push(ignored);
            return Ok(());
        }

        let transitioned = match forward.previous {
            // The first matched point starts the first sub-sequence
            None => None,
            Some(previous) => {
                let from = &trace.points[previous];
                if self.is_broken(from, point) {
                    debug!("Sequence broken between points {previous} and {index}");
                    forward.sequence_breaks += 1;
                    None
                } else {
                    let predictions = self.transition(forward, previous, point, &emissions)?;
                    if predictions.is_none() {
                        debug!("No valid transition onto point {index}, forcing a sequence break");
                        forward.sequence_breaks += 1;
                    }

                    predictions
                }
            }
        };

        let starts_sequence = transitioned.is_none();
        let predictions = transitioned.unwrap_or_else(|| self.start_sequence(&emissions));

        forward.points.push(PointSnapInfo {
            index,
            point: point.position,
            timestamp: point.timestamp,
            seconds_since_prev_point,
            predictions,
            best_prediction: None,
            starts_sequence,
            ignore: false,
        });
        forward.previous = Some(index);

        Ok(())
    }

    /// Whether the gap between two matched points is too large
    /// to consider them part of the same sub-sequence.
    fn is_broken(&self, previous: &TracePoint, current: &TracePoint) -> bool {
        let time_gap = current
            .seconds_since(previous)
            .is_some_and(|seconds| seconds > self.options.broken_time_gap_reset_sequence);

        let distance_gap = spatial::distance(previous.position, current.position)
            > self.options.broken_distance_gap_reset_sequence;

        time_gap || distance_gap
    }

    fn feature_id(&self, feature: FeatureIx) -> String {
        self.index
            .get(feature)
            .map(|feature| feature.id.clone())
            .unwrap_or_default()
    }

    /// Predictions which begin a new sub-sequence, scored by emission alone.
    fn start_sequence(&self, emissions: &[(Candidate, f64)]) -> Vec<SnappedPointPrediction> {
        emissions
            .iter()
            .map(|(candidate, log_emission)| SnappedPointPrediction {
                feature: candidate.feature,
                feature_id: self.feature_id(candidate.feature),
                snapped_point: candidate.position,
                distance_to_snapped_road: candidate.distance,
                route_distance_to_prev_point: 0.0,
                emission_probability: log_emission.exp(),
                transition_probability: None,
                best_log_prob: *log_emission,
                best_prev_prediction: None,
                best_route_via_points: vec![],
                revisited_via_points: 0,
                revisited_segments: 0,
                travelled: Arc::new(Travelled::starting_at(candidate.feature)),
            })
            .collect()
    }

    /// The features a route between two trace points may pass through.
    ///
    /// Any route whose length is within the allowed difference of the
    /// great-circle distance lies within a disk around the midpoint of
    /// the two points, so every feature near that disk is permitted.
    pub(crate) fn allowed(
        &self,
        source: Point,
        target: Point,
        great_circle: f64,
        emissions: &[(Candidate, f64)],
    ) -> Result<FxHashSet<FeatureIx>, MatchError> {
        let radius = (great_circle + self.options.max_route_to_trace_distance_difference) / 2.0
            + self.options.max_point_to_road_distance;

        let midpoint = spatial::midpoint(source, target);
        let mut allowed = emissions
            .iter()
            .map(|(candidate, _)| candidate.feature)
            .collect::<FxHashSet<_>>();

        allowed.extend(
            self.index
                .candidates_near(&Geometry::Point(midpoint), radius)?,
        );

        Ok(allowed)
    }

    /// Scores every transition from the predictions of the `previous`
    /// point onto the candidates, keeping the best for each candidate.
    ///
    /// Returns `None` if no candidate has any valid transition.
    fn transition(
        &self,
        forward: &mut Forward,
        previous: usize,
        point: &TracePoint,
        emissions: &[(Candidate, f64)],
    ) -> Result<Option<Vec<SnappedPointPrediction>>, MatchError> {
        let Some(from) = forward.points.get(previous) else {
            return Ok(None);
        };

        let source = from.point;
        let great_circle = spatial::distance(source, point.position);
        let allowed = self.allowed(source, point.position, great_circle, emissions)?;

        let visited = from
            .predictions
            .par_iter()
            .map(|prediction| prediction.travelled.visited())
            .collect::<Vec<_>>();

        let pairs = iproduct!(0..emissions.len(), 0..from.predictions.len()).collect::<Vec<_>>();
        let edges = {
            debug_time!("transition routing ({} pairs)", pairs.len());
            pairs
                .par_iter()
                .map(|(candidate, prediction)| {
                    self.edge(
                        &from.predictions[*prediction],
                        &visited[*prediction],
                        &emissions[*candidate].0,
                        &allowed,
                        (source, point.position),
                        great_circle,
                    )
                })
                .collect::<Vec<_>>()
        };

        let width = from.predictions.len();
        let predictions = emissions
            .iter()
            .enumerate()
            .filter_map(|(index, (candidate, log_emission))| {
                // Strictly greater, so ties keep the earliest predecessor
                let (prediction, edge) = edges[index * width..(index + 1) * width]
                    .iter()
                    .enumerate()
                    .filter_map(|(prediction, edge)| Some((prediction, edge.as_ref()?)))
                    .fold(None, |best: Option<(usize, &Edge)>, (prediction, edge)| match best {
                        Some((_, current)) if current.score >= edge.score => best,
                        _ => Some((prediction, edge)),
                    })?;

                let predecessor = &from.predictions[prediction];
                Some(SnappedPointPrediction {
                    feature: candidate.feature,
                    feature_id: self.feature_id(candidate.feature),
                    snapped_point: candidate.position,
                    distance_to_snapped_road: candidate.distance,
                    route_distance_to_prev_point: edge.route.distance,
                    emission_probability: log_emission.exp(),
                    transition_probability: Some(edge.log_transition.exp()),
                    best_log_prob: edge.score + log_emission,
                    best_prev_prediction: Some(PredictionRef {
                        point: previous,
                        candidate: prediction,
                    }),
                    best_route_via_points: edge
                        .route
                        .steps
                        .iter()
                        .map(|step| step.via_point)
                        .collect(),
                    revisited_via_points: predecessor.revisited_via_points + edge.via_points,
                    revisited_segments: predecessor.revisited_segments + edge.segments,
                    travelled: Arc::new(predecessor.travelled.extend(&edge.route)),
                })
            })
            .collect::<Vec<_>>();

        forward.route_distance_candidates += pairs.len();
        Ok((!predictions.is_empty()).then_some(predictions))
    }

    /// Routes from a prediction of the previous point onto a candidate,
    /// returning `None` if the transition is invalid.
    fn edge(
        &self,
        from: &SnappedPointPrediction,
        visited: &Visited,
        candidate: &Candidate,
        allowed: &FxHashSet<FeatureIx>,
        (source, target): (Point, Point),
        great_circle: f64,
    ) -> Option<Edge> {
        let blocked = if self.options.allow_loops {
            FxHashSet::default()
        } else {
            visited
                .features
                .iter()
                .filter(|feature| **feature != from.feature && **feature != candidate.feature)
                .copied()
                .collect()
        };

        let route = shortest_route(
            self.network,
            self.index,
            from.feature,
            from.snapped_point,
            candidate.feature,
            candidate.position,
            Some(allowed),
            &blocked,
        );

        if !route.is_reachable() {
            trace!("No route from {:?} to {:?}", from.feature, candidate.feature);
            return None;
        }

        let context = TransitionContext {
            route: &route,
            source_position: &source,
            target_position: &target,
            great_circle_distance: great_circle,
        };

        if context.deviance() > self.options.max_route_to_trace_distance_difference {
            trace!(
                "Pruned {:?} to {:?}, route of {:.1}m deviates from {:.1}m",
                from.feature,
                candidate.feature,
                route.distance,
                great_circle
            );
            return None;
        }

        let log_transition = self.costing.transition(context)?;
        let (segments, via_points) = visited.revisits(&route);

        let penalty = if self.options.allow_loops {
            0.0
        } else {
            segments as f64 * self.options.revisit_segment_penalty_weight
                + via_points as f64 * self.options.revisit_via_point_penalty_weight
        };

        Some(Edge {
            score: from.best_log_prob + log_transition - penalty,
            route,
            log_transition,
            segments,
            via_points,
        })
    }
}
