use approx::assert_relative_eq;
use geo::{Coord, Point, point, wkt};
use rustc_hash::FxHashSet;
use serde_json::json;

use crate::candidate::{CandidateFeature, CandidateIndex, FeatureIx, IndexOptions};
use crate::route::*;
use crate::spatial;

const START: Point = Point(Coord { x: 0.0005, y: 0.0 });
const END: Point = Point(Coord { x: 0.0025, y: 0.0 });

/// A straight road `a → b → c` along the equator, with a
/// detour `a → d → e → f → c` running parallel to the north.
fn detour() -> (CandidateIndex, Network) {
    let features = vec![
        CandidateFeature::new("a", wkt! { LINESTRING(0.0 0.0, 0.001 0.0) }),
        CandidateFeature::new("b", wkt! { LINESTRING(0.001 0.0, 0.002 0.0) }),
        CandidateFeature::new("c", wkt! { LINESTRING(0.002 0.0, 0.003 0.0) }),
        CandidateFeature::new("d", wkt! { LINESTRING(0.001 0.0, 0.001 0.001) }),
        CandidateFeature::new("e", wkt! { LINESTRING(0.001 0.001, 0.002 0.001) }),
        CandidateFeature::new("f", wkt! { LINESTRING(0.002 0.001, 0.002 0.0) }),
        CandidateFeature::new("island", wkt! { LINESTRING(0.005 0.005, 0.006 0.005) }),
    ];

    let index = CandidateIndex::build(features, IndexOptions::default()).expect("valid features");
    let network = Network::from_pairs(
        &index,
        [
            ("a", "b"),
            ("b", "c"),
            ("a", "d"),
            ("d", "e"),
            ("e", "f"),
            ("f", "c"),
        ],
        true,
    );

    (index, network)
}

fn ix(index: &CandidateIndex, id: &str) -> FeatureIx {
    index.ix(id).expect("feature exists")
}

fn set(index: &CandidateIndex, ids: &[&str]) -> FxHashSet<FeatureIx> {
    ids.iter().map(|id| ix(index, id)).collect()
}

fn route_a_to_c(
    index: &CandidateIndex,
    network: &Network,
    allowed: Option<&FxHashSet<FeatureIx>>,
    blocked: &FxHashSet<FeatureIx>,
) -> Route {
    shortest_route(
        network,
        index,
        ix(index, "a"),
        START,
        ix(index, "c"),
        END,
        allowed,
        blocked,
    )
}

#[test]
fn same_feature_is_direct_distance() {
    let (index, network) = detour();
    let a = ix(&index, "a");

    let from = point! { x: 0.0001, y: 0.0 };
    let to = point! { x: 0.0009, y: 0.0 };
    let route = shortest_route(&network, &index, a, from, a, to, None, &FxHashSet::default());

    assert!(route.is_reachable());
    assert_relative_eq!(route.distance, spatial::distance(from, to));
    assert_eq!(
        route.steps,
        vec![RouteStep {
            feature: a,
            via_point: from
        }]
    );
}

#[test_log::test]
fn follows_shortest_chain() {
    let (index, network) = detour();
    let route = route_a_to_c(&index, &network, None, &FxHashSet::default());

    assert!(route.is_reachable());
    assert_relative_eq!(route.distance, spatial::distance(START, END), epsilon = 0.01);

    let features = route.features().collect::<Vec<_>>();
    assert_eq!(
        features,
        vec![ix(&index, "a"), ix(&index, "b"), ix(&index, "c")]
    );

    let via = route.via_points();
    assert_eq!(via.0[0], START.0);
    assert_relative_eq!(via.0[1].x, 0.001, epsilon = 1e-9);
    assert_relative_eq!(via.0[2].x, 0.002, epsilon = 1e-9);
}

#[test]
fn distance_never_shrinks_with_allowed_set() {
    let (index, network) = detour();
    let blocked = FxHashSet::default();

    let everything = set(&index, &["a", "b", "c", "d", "e", "f"]);
    let without_b = set(&index, &["a", "c", "d", "e", "f"]);
    let without_b_d = set(&index, &["a", "c", "e", "f"]);

    let distances = [
        route_a_to_c(&index, &network, None, &blocked).distance,
        route_a_to_c(&index, &network, Some(&everything), &blocked).distance,
        route_a_to_c(&index, &network, Some(&without_b), &blocked).distance,
        route_a_to_c(&index, &network, Some(&without_b_d), &blocked).distance,
    ];

    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_relative_eq!(distances[0], distances[1]);
    assert!(distances[2] > distances[1]);
    assert!(distances[3].is_infinite());
}

#[test]
fn detour_is_taken_when_blocked() {
    let (index, network) = detour();
    let route = route_a_to_c(&index, &network, None, &set(&index, &["b"]));

    assert!(route.is_reachable());
    assert_eq!(
        route.features().collect::<Vec<_>>(),
        ["a", "d", "e", "f", "c"].map(|id| ix(&index, id)).to_vec()
    );

    // Two sides of the rectangle, plus the two half-segments
    let expected = spatial::distance(START, END) + 2.0 * 111.19;
    assert_relative_eq!(route.distance, expected, epsilon = 0.5);
}

#[test]
fn excluded_end_is_unreachable() {
    let (index, network) = detour();
    let allowed = set(&index, &["a", "b", "d", "e", "f"]);

    let route = route_a_to_c(&index, &network, Some(&allowed), &FxHashSet::default());
    assert!(!route.is_reachable());
    assert!(route.steps.is_empty());
    assert_eq!(route, Route::unreachable());
}

#[test]
fn start_is_always_permitted() {
    let (index, network) = detour();

    let allowed = set(&index, &["b", "c"]);
    let blocked = set(&index, &["a"]);

    let route = route_a_to_c(&index, &network, Some(&allowed), &blocked);
    assert!(route.is_reachable());
    assert_eq!(route.steps.len(), 3);
}

#[test]
fn isolated_feature_is_unreachable() {
    let (index, network) = detour();
    let route = shortest_route(
        &network,
        &index,
        ix(&index, "a"),
        START,
        ix(&index, "island"),
        point! { x: 0.0055, y: 0.005 },
        None,
        &FxHashSet::default(),
    );

    assert!(!route.is_reachable());
    assert!(route.distance.is_infinite());
}

#[test]
fn connectors_link_features() {
    let with = |id: &str, connectors: serde_json::Value| {
        let properties = json!({ "connectors": connectors });
        CandidateFeature::new(id, point! { x: 0.0, y: 0.0 })
            .with_properties(properties.as_object().cloned().unwrap_or_default())
    };

    let features = vec![
        with("a", json!(["n1"])),
        with("b", json!([{ "connector_id": "n1" }, "n2"])),
        with("c", json!(["n2"])),
        with("d", json!([])),
    ];

    let index = CandidateIndex::build(features, IndexOptions::default()).unwrap();
    let network = Network::from_connectors(&index, "connectors");
    let [a, b, c, d] = ["a", "b", "c", "d"].map(|id| ix(&index, id));

    assert!(network.is_connected(a, b) && network.is_connected(b, a));
    assert!(network.is_connected(b, c) && network.is_connected(c, b));
    assert!(!network.is_connected(a, c));
    assert!(network.contains(d));
    assert_eq!(network.successors(d).count(), 0);
    assert_eq!(network.connections(), 4);
}

#[test]
fn unknown_ids_are_skipped() {
    let (index, _) = detour();
    let network = Network::from_adjacency(
        &index,
        [("a", vec!["b", "ghost"]), ("ghost", vec!["a"])],
    );

    assert_eq!(network.connections(), 1);
    assert!(network.is_connected(ix(&index, "a"), ix(&index, "b")));
    assert!(!network.is_connected(ix(&index, "b"), ix(&index, "a")));

    let pairs = Network::from_pairs(&index, [("a", "ghost"), ("c", "b")], false);
    assert_eq!(pairs.connections(), 1);
}
