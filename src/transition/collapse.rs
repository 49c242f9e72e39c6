use log::debug;

use crate::transition::{PointSnapInfo, PredictionRef};

/// The aggregates of the best path through a trace.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Collapsed {
    pub route_length: f64,
    pub points_with_matches: usize,
    pub avg_dist_to_road: Option<f64>,
    pub revisited_via_points: u32,
    pub revisited_segments: u32,
}

/// Backtracks through the predictions of every point, selecting
/// the `best_prediction` of each matched point.
///
/// Starting from the last matched point, the most likely prediction is
/// chosen and its back-pointers followed. Where a sub-sequence begins,
/// the next earlier matched point restarts from its own most likely
/// prediction.
///
/// The revisit counters are those of the final best prediction.
pub fn collapse(points: &mut [PointSnapInfo]) -> Collapsed {
    let mut collapsed = Collapsed::default();
    let mut cursor: Option<PredictionRef> = None;
    let mut distance_to_road = 0.0;

    for point in points.iter_mut().rev() {
        if point.ignore {
            continue;
        }

        let chosen = match cursor {
            Some(reference) if reference.point == point.index => Some(reference.candidate),
            _ => point.most_likely(),
        };

        point.best_prediction = chosen;
        let Some(best) = point.best() else {
            cursor = None;
            continue;
        };

        if collapsed.points_with_matches == 0 {
            collapsed.revisited_via_points = best.revisited_via_points;
            collapsed.revisited_segments = best.revisited_segments;
        }

        collapsed.points_with_matches += 1;
        collapsed.route_length += best.route_distance_to_prev_point;
        distance_to_road += best.distance_to_snapped_road;

        cursor = best.best_prev_prediction;
    }

    if collapsed.points_with_matches > 0 {
        collapsed.avg_dist_to_road = Some(distance_to_road / collapsed.points_with_matches as f64);
    }

    debug!("Collapsed trace: {collapsed:?}");
    collapsed
}
