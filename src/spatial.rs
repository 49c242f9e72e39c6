//! Great-circle measurement helpers shared by the cell index,
//! the route oracle and the matcher.
//!
//! All geometries are expected in WGS84, with `x` as longitude
//! and `y` as latitude. Distances are returned in meters.

use geo::{
    Closest, CoordsIter, Distance, Geometry, Haversine, HaversineClosestPoint, InterpolatableLine,
    Intersects, Line, LineString, Point,
};

/// The great-circle (haversine) distance between two points, in meters.
#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    Haversine.distance(a, b)
}

/// Returns the length of the line, in meters, calculated
/// by the cumulative distance between each vertex.
pub fn length(line: &LineString) -> f64 {
    line.points()
        .collect::<Vec<_>>()
        .windows(2)
        .fold(0.0, |length, pair| {
            if let [a, b] = pair {
                return length + distance(*a, *b);
            }

            length
        })
}

/// The point halfway along the great-circle between `a` and `b`.
#[inline]
pub fn midpoint(a: Point, b: Point) -> Point {
    Line::new(a.0, b.0).point_at_ratio_from_start(&Haversine, 0.5)
}

/// Finds the point on `geometry` closest to `point`.
///
/// Areal geometries containing the point return the point itself.
/// Returns `None` for empty geometries.
pub fn closest_point(geometry: &Geometry, point: &Point) -> Option<Point> {
    if matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
        && geometry.intersects(point)
    {
        return Some(*point);
    }

    match geometry.haversine_closest_point(point) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => Some(p),
        Closest::Indeterminate => None,
    }
}

/// Finds the point on `from` which lies closest to the geometry `towards`.
///
/// Connected road segments usually share a vertex, in which case the
/// shared vertex is returned. Otherwise the closest vertex-to-geometry
/// pair in either direction decides the point.
pub fn nearest_point_towards(from: &Geometry, towards: &Geometry) -> Option<Point> {
    // Vertices of the target projected onto the source geometry
    let projected = towards.coords_iter().filter_map(|coord| {
        let vertex = Point(coord);
        closest_point(from, &vertex).map(|on_from| (on_from, distance(on_from, vertex)))
    });

    // Vertices of the source, measured against the target geometry
    let vertices = from.coords_iter().filter_map(|coord| {
        let vertex = Point(coord);
        closest_point(towards, &vertex).map(|on_towards| (vertex, distance(vertex, on_towards)))
    });

    projected
        .chain(vertices)
        .fold(None, |best: Option<(Point, f64)>, (point, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((point, dist)),
        })
        .map(|(point, _)| point)
}

/// A hashable key for a coordinate, comparing the exact bit patterns.
#[inline]
pub fn point_key(point: &Point) -> (u64, u64) {
    (point.x().to_bits(), point.y().to_bits())
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{point, wkt};

    #[test]
    fn haversine_distance_short_hop() {
        let a = point! { x: -83.6878343, y: 32.8413587 };
        let b = point! { x: -83.6877941, y: 32.8413903 };

        assert_relative_eq!(distance(a, b), 5.1, epsilon = 0.1);
    }

    #[test]
    fn closest_point_on_line() {
        let line = Geometry::LineString(wkt! { LINESTRING(0.0 0.0, 0.0 0.001) });
        let point = point! { x: 0.0001, y: 0.0005 };

        let closest = closest_point(&line, &point).expect("line is not empty");
        assert_relative_eq!(closest.x(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(closest.y(), 0.0005, epsilon = 1e-6);
    }

    #[test]
    fn closest_point_inside_polygon_is_itself() {
        let polygon = Geometry::Polygon(
            wkt! { POLYGON((0.0 0.0, 0.001 0.0, 0.001 0.001, 0.0 0.001, 0.0 0.0)) },
        );
        let point = point! { x: 0.0005, y: 0.0005 };

        assert_eq!(closest_point(&polygon, &point), Some(point));
    }

    #[test]
    fn nearest_point_on_shared_vertex() {
        let a = Geometry::LineString(wkt! { LINESTRING(0.0 0.0, 0.001 0.0) });
        let b = Geometry::LineString(wkt! { LINESTRING(0.001 0.0, 0.001 0.001) });

        let shared = nearest_point_towards(&a, &b).expect("geometries are not empty");
        assert_relative_eq!(shared.x(), 0.001, epsilon = 1e-9);
        assert_relative_eq!(shared.y(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn length_of_line() {
        let line = wkt! {
            LINESTRING(-83.6878343 32.8413587, -83.6877941 32.8413903, -83.6878343 32.8413587)
        };
        assert_relative_eq!(length(&line), 10.2, epsilon = 0.2);
    }
}
