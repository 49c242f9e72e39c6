use geo::{Geometry, GeometryCollection, point, wkt};
use serde_json::json;

use crate::candidate::*;
use crate::cell::{CellError, GeometryKind, cells_for, cells_with_ring};

fn feature(id: &str, geometry: impl Into<Geometry>) -> CandidateFeature {
    CandidateFeature::new(id, geometry)
}

fn sample() -> Vec<CandidateFeature> {
    vec![
        feature("a", wkt! { LINESTRING(0.0 0.0, 0.001 0.0) }),
        feature("b", wkt! { LINESTRING(0.001 0.0, 0.002 0.0) }),
        feature("c", wkt! { LINESTRING(0.001 0.0, 0.001 0.001) }),
        feature("far", point! { x: 10.0, y: 10.0 }),
    ]
}

#[test]
fn index_relations_are_consistent() {
    let index = CandidateIndex::build(sample(), IndexOptions::default()).expect("unique ids");
    assert_eq!(index.len(), 4);

    for (ix, feature) in index.iter() {
        assert_eq!(index.ix(&feature.id), Some(ix));
        assert_eq!(index.feature(&feature.id), Some(feature));

        let cells = index.cells(ix).expect("every feature has coverage");
        assert!(!cells.is_empty());

        for cell in cells {
            assert!(
                index.features_in_cell(cell).contains(&ix),
                "Feature {} missing from its own cell {cell}",
                feature.id
            );
        }
    }
}

#[test]
fn features_are_indexed_in_insertion_order() {
    let index = CandidateIndex::build(sample(), IndexOptions::default()).unwrap();

    let order = index
        .iter()
        .map(|(ix, feature)| (ix.index(), feature.id.as_str()))
        .collect::<Vec<_>>();

    assert_eq!(order, vec![(0, "a"), (1, "b"), (2, "c"), (3, "far")]);
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut features = sample();
    features.push(feature("b", point! { x: 0.0, y: 0.0 }));

    assert_eq!(
        CandidateIndex::build(features, IndexOptions::default()).unwrap_err(),
        IndexError::DuplicateFeature("b".to_string())
    );
}

#[test]
fn unsupported_geometry_names_the_feature() {
    let collection = GeometryCollection::new_from(vec![Geometry::Point(point! { x: 0.0, y: 0.0 })]);
    let features = vec![feature("bad", Geometry::GeometryCollection(collection))];

    assert_eq!(
        CandidateIndex::build(features, IndexOptions::default()).unwrap_err(),
        IndexError::Cell {
            id: "bad".to_string(),
            source: CellError::UnsupportedGeometry(GeometryKind::GeometryCollection),
        }
    );
}

#[test]
fn index_ring_expands_coverage() {
    let options = IndexOptions::default().with_ring(1);
    let index = CandidateIndex::build(sample(), options).unwrap();

    let far = index.cells_by_id("far").unwrap();
    assert_eq!(far.len(), 7);

    let expected = cells_with_ring(
        &Geometry::Point(point! { x: 10.0, y: 10.0 }),
        options.resolution,
        1,
    )
    .unwrap();
    assert_eq!(far, &expected);
}

#[test]
fn candidates_are_deduplicated_in_first_seen_order() {
    let index = CandidateIndex::build(sample(), IndexOptions::default()).unwrap();

    // The shared vertex is covered by all of `a`, `b` and `c`.
    let shared = cells_for(
        &Geometry::Point(point! { x: 0.001, y: 0.0 }),
        index.resolution(),
    )
    .unwrap();
    let first = cells_for(
        &Geometry::Point(point! { x: 0.0, y: 0.0 }),
        index.resolution(),
    )
    .unwrap();

    let cells = first.iter().chain(shared.iter()).chain(first.iter());
    let candidates = index
        .candidate_features_for_cells(cells)
        .into_iter()
        .map(|feature| feature.id.as_str())
        .collect::<Vec<_>>();

    assert_eq!(candidates, vec!["a", "b", "c"]);
}

#[test]
fn unknown_cells_yield_no_candidates() {
    let index = CandidateIndex::build(sample(), IndexOptions::default()).unwrap();
    let elsewhere = cells_for(
        &Geometry::Point(point! { x: -40.0, y: 20.0 }),
        index.resolution(),
    )
    .unwrap();

    assert!(index.candidates_for_cells(&elsewhere).is_empty());
}

#[test]
fn candidates_near_finds_nearby_features() {
    let index = CandidateIndex::build(sample(), IndexOptions::default()).unwrap();

    // ~8m north of segment `a`
    let query = Geometry::Point(point! { x: 0.0005, y: 0.00007 });
    let near = index.candidates_near(&query, 10.0).unwrap();

    assert!(near.contains(&index.ix("a").unwrap()));
    assert!(!near.contains(&index.ix("far").unwrap()));
}

#[test]
fn connectors_are_read_from_properties() {
    let properties = json!({
        "connectors": [
            "n1",
            { "connector_id": "n2", "at": 1.0 },
            { "at": 0.5 },
            42
        ]
    });

    let Some(properties) = properties.as_object().cloned() else {
        panic!("object literal");
    };

    let feature = feature("a", point! { x: 0.0, y: 0.0 }).with_properties(properties);
    assert_eq!(feature.connectors("connectors"), vec!["n1", "n2"]);
    assert!(feature.connectors("missing").is_empty());
}

#[test]
fn options_deserialize_partially() {
    let options: IndexOptions = serde_json::from_str(r#"{ "ring": 2 }"#).unwrap();
    assert_eq!(options, IndexOptions::default().with_ring(2));
}
