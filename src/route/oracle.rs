use geo::Point;
use log::trace;
use rustc_hash::FxHashSet;

use crate::candidate::{CandidateIndex, FeatureIx};
use crate::route::dijkstra::Dijkstra;
use crate::route::{Network, Route, RouteStep};
use crate::spatial;

/// Finds the shortest route from `start_point` on the feature `start`,
/// to `end_point` on the feature `end`.
///
/// Routes are only permitted through features which lie within `allowed`
/// (if supplied) and not within `blocked`. The start feature is always
/// permitted.
///
/// ### Costing
/// The cost of continuing from feature `u` onto feature `v` is the distance
/// from the point at which the route entered `u`, to the point on `u` which
/// lies nearest to `v`. That nearest point becomes the point at which the
/// route enters `v`. When `v` is the end feature, the distance from the
/// entry point to `end_point` is added.
///
/// If both points lie on the same feature, the route is the direct
/// great-circle distance between them.
///
/// Returns [`Route::unreachable`] if no route exists.
#[allow(clippy::too_many_arguments)]
pub fn shortest_route(
    network: &Network,
    index: &CandidateIndex,
    start: FeatureIx,
    start_point: Point,
    end: FeatureIx,
    end_point: Point,
    allowed: Option<&FxHashSet<FeatureIx>>,
    blocked: &FxHashSet<FeatureIx>,
) -> Route {
    if start == end {
        return Route {
            distance: spatial::distance(start_point, end_point),
            steps: vec![RouteStep {
                feature: start,
                via_point: start_point,
            }],
        };
    }

    let permitted = |feature: &FeatureIx| {
        allowed.is_none_or(|allowed| allowed.contains(feature)) && !blocked.contains(feature)
    };

    if !permitted(&end) {
        trace!("Route target {end:?} is not permitted.");
        return Route::unreachable();
    }

    let successors = |feature: &FeatureIx, entry: &Point| {
        let from = index.get(*feature).map(|feature| &feature.geometry);

        network
            .successors(*feature)
            .filter(|next| *next != start && permitted(next))
            .filter_map(|next| {
                let towards = &index.get(next)?.geometry;
                let via_point = spatial::nearest_point_towards(from?, towards)?;

                let mut cost = spatial::distance(*entry, via_point);
                if next == end {
                    cost += spatial::distance(via_point, end_point);
                }

                Some((next, cost, via_point))
            })
            .collect::<Vec<_>>()
    };

    let mut reachable = Dijkstra.reach(start, start_point, successors);
    let Some(item) = reachable.by_ref().find(|item| item.node == end) else {
        trace!("No route from {start:?} to {end:?}.");
        return Route::unreachable();
    };

    let steps = reachable
        .path_to(&item)
        .into_iter()
        .map(|(feature, via_point)| RouteStep { feature, via_point })
        .collect::<Vec<_>>();

    Route {
        distance: item.total_cost,
        steps,
    }
}
