use std::collections::BTreeSet;

use geo::{
    Geometry, GeometryCollection, LineString, MultiLineString, Point, coord, point, wkt,
};
use h3o::{CellIndex, Resolution};

use crate::cell::*;

const RESOLUTION: Resolution = Resolution::Twelve;

fn vertex_cells(geometry: &Geometry) -> Vec<CellIndex> {
    use geo::CoordsIter;

    geometry
        .coords_iter()
        .map(|coord| cell_of(coord, RESOLUTION).expect("valid coordinate"))
        .collect()
}

#[test]
fn point_maps_to_single_cell() {
    let point = point! { x: 151.19462, y: -33.885309 };
    let cells = cells_for(&Geometry::Point(point), RESOLUTION).expect("point is supported");

    assert_eq!(cells.len(), 1);
    assert!(cells.contains(&cell_of(point.0, RESOLUTION).unwrap()));
}

#[test]
fn every_vertex_is_covered() {
    let geometries = [
        Geometry::LineString(wkt! {
            LINESTRING (
                151.19462 -33.885309, 151.193783 -33.887126,
                151.189685 -33.890243, 151.185329 -33.892915
            )
        }),
        Geometry::Polygon(wkt! {
            POLYGON ((
                -83.688 32.841, -83.687 32.841, -83.687 32.842,
                -83.688 32.842, -83.688 32.841
            ))
        }),
        Geometry::MultiPoint(wkt! { MULTIPOINT (0.0 0.0, 0.01 0.01) }),
    ];

    for geometry in &geometries {
        let cells = cells_for(geometry, RESOLUTION).expect("geometry is supported");

        for vertex in vertex_cells(geometry) {
            assert!(
                cells.contains(&vertex),
                "Vertex cell {vertex} missing from coverage of {geometry:?}"
            );
        }
    }
}

#[test]
fn interpolated_cells_contain_no_gaps() {
    // Vertices roughly 400m apart, many cells at resolution 12.
    let line = wkt! {
        LINESTRING (151.19462 -33.885309, 151.193783 -33.887126, 151.189685 -33.890243)
    };

    let sequence = trace_cells(&line, RESOLUTION).expect("line is supported");
    assert!(sequence.len() > line.0.len());

    for pair in sequence.windows(2) {
        let [a, b] = pair else { unreachable!() };
        assert!(
            a.is_neighbor_with(*b).unwrap_or(false),
            "Cells {a} and {b} are not adjacent"
        );
    }
}

#[test]
fn thin_polygon_keeps_boundary_cells() {
    // ~1m wide sliver, no cell centre will lie inside of it.
    let polygon = wkt! {
        POLYGON ((0.0 0.0, 0.002 0.0, 0.002 0.00001, 0.0 0.00001, 0.0 0.0))
    };

    let geometry = Geometry::Polygon(polygon.clone());
    let cells = cells_for(&geometry, RESOLUTION).expect("polygon is supported");
    let boundary = trace_cells(polygon.exterior(), RESOLUTION).unwrap();

    assert!(!cells.is_empty());
    assert!(boundary.iter().all(|cell| cells.contains(cell)));
}

#[test]
fn polygon_includes_interior_cells() {
    let polygon = wkt! {
        POLYGON ((0.0 0.0, 0.003 0.0, 0.003 0.003, 0.0 0.003, 0.0 0.0))
    };

    let cells = cells_for(&Geometry::Polygon(polygon.clone()), RESOLUTION).unwrap();
    let boundary = trace_cells(polygon.exterior(), RESOLUTION)
        .unwrap()
        .into_iter()
        .collect::<BTreeSet<_>>();

    assert!(cells.len() > boundary.len());
    assert!(cells.contains(&cell_of(coord! { x: 0.0015, y: 0.0015 }, RESOLUTION).unwrap()));
}

#[test]
fn multi_geometry_is_union_of_parts() {
    let a: LineString = wkt! { LINESTRING (0.0 0.0, 0.001 0.0) };
    let b: LineString = wkt! { LINESTRING (0.01 0.01, 0.01 0.011) };

    let multi = Geometry::MultiLineString(MultiLineString::new(vec![a.clone(), b.clone()]));
    let cells = cells_for(&multi, RESOLUTION).unwrap();

    let mut union = cells_for(&Geometry::LineString(a), RESOLUTION).unwrap();
    union.extend(cells_for(&Geometry::LineString(b), RESOLUTION).unwrap());

    assert_eq!(cells, union);
}

#[test]
fn collection_is_unsupported() {
    let collection = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
        Geometry::Point(point! { x: 0.0, y: 0.0 }),
    ]));

    assert_eq!(
        cells_for(&collection, RESOLUTION),
        Err(CellError::UnsupportedGeometry(GeometryKind::GeometryCollection))
    );
}

#[test]
fn invalid_coordinate_is_rejected() {
    let point = Geometry::Point(Point::new(f64::NAN, 0.0));
    assert!(matches!(
        cells_for(&point, RESOLUTION),
        Err(CellError::InvalidCoordinate { .. })
    ));
}

#[test]
fn ring_expansion_surrounds_cell() {
    let point = Geometry::Point(point! { x: 151.19462, y: -33.885309 });

    let single = cells_for(&point, RESOLUTION).unwrap();
    let ring = cells_with_ring(&point, RESOLUTION, 1).unwrap();

    // A hexagon and its six neighbours
    assert_eq!(ring.len(), 7);
    assert!(single.is_subset(&ring));
}

#[test]
fn ring_covers_requested_distance() {
    use crate::spatial;
    use geo::{Destination, Haversine};

    let origin = point! { x: -83.6878343, y: 32.8413587 };
    let k = ring_for_distance(RESOLUTION, 10.0);
    let disk = cells_with_ring(&Geometry::Point(origin), RESOLUTION, k).unwrap();

    for bearing in (0..360).step_by(15) {
        let target = Haversine.destination(origin, bearing as f64, 10.0);
        assert!((spatial::distance(origin, target) - 10.0).abs() < 0.01);
        assert!(disk.contains(&cell_of(target.0, RESOLUTION).unwrap()));
    }
}

#[test]
fn ring_for_distance_is_monotonic() {
    assert_eq!(ring_for_distance(RESOLUTION, 0.0), 0);
    assert!(ring_for_distance(RESOLUTION, 1.0) >= 1);

    let distances = [1.0, 10.0, 50.0, 150.0, 500.0];
    let rings = distances.map(|meters| ring_for_distance(RESOLUTION, meters));

    assert!(rings.windows(2).all(|pair| pair[0] <= pair[1]));
}
