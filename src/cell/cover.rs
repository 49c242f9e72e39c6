use std::collections::BTreeSet;

use geo::{
    BoundingRect, Contains, Coord, Geometry, Haversine, InterpolatableLine, Line, LineString,
    Point, Polygon,
};
use h3o::{CellIndex, LatLng, Resolution};
use log::{debug, trace};

use crate::cell::{CellError, GeometryKind, ring_for_distance};
use crate::spatial;

/// Returns the cell containing the coordinate at the given resolution.
#[inline]
pub fn cell_of(coord: Coord, resolution: Resolution) -> Result<CellIndex, CellError> {
    LatLng::new(coord.y, coord.x)
        .map(|position| position.to_cell(resolution))
        .map_err(|_| CellError::InvalidCoordinate {
            x: coord.x,
            y: coord.y,
        })
}

/// The position of the centre of the cell.
#[inline]
pub fn cell_center(cell: CellIndex) -> Point {
    let center = LatLng::from(cell);
    Point::new(center.lng(), center.lat())
}

/// Returns the set of cells which cover the geometry.
///
/// - A point is covered by the single cell containing it.
/// - A line is covered by the cell of every vertex, and the cells
///   along the grid path between consecutive vertices which do not
///   lie in adjacent cells. See [`trace_cells`].
/// - A polygon is covered by every cell whose centre lies inside it,
///   as well as the coverage of its exterior ring, so that thin
///   polygons which contain no cell centres still have coverage.
/// - Multi-geometries are covered by the union of their parts.
///
/// A [`Geometry::GeometryCollection`] cannot be covered, and returns
/// [`CellError::UnsupportedGeometry`].
pub fn cells_for(
    geometry: &Geometry,
    resolution: Resolution,
) -> Result<BTreeSet<CellIndex>, CellError> {
    let mut cells = BTreeSet::new();
    cover(geometry, resolution, &mut cells)?;

    Ok(cells)
}

/// Returns the coverage of [`cells_for`], expanded by every cell
/// within `k` grid-steps of each covering cell.
pub fn cells_with_ring(
    geometry: &Geometry,
    resolution: Resolution,
    k: u32,
) -> Result<BTreeSet<CellIndex>, CellError> {
    let cells = cells_for(geometry, resolution)?;
    Ok(expand(&cells, k))
}

/// Expands each cell in `cells` by the disk of cells within `k` grid-steps.
pub fn expand(cells: &BTreeSet<CellIndex>, k: u32) -> BTreeSet<CellIndex> {
    if k == 0 {
        return cells.clone();
    }

    cells
        .iter()
        .flat_map(|cell| cell.grid_disk_safe(k))
        .collect::<BTreeSet<_>>()
}

/// Returns the ordered sequence of cells traversed by the line.
///
/// Consecutive entries within the sequence are always distinct, and
/// are grid-adjacent whenever the grid path between the two vertices
/// can be resolved. When it cannot (such as when crossing a pentagon
/// distortion), the segment is interpolated along the great-circle at
/// half-edge spacing instead.
pub fn trace_cells(
    line: &LineString,
    resolution: Resolution,
) -> Result<Vec<CellIndex>, CellError> {
    fn push(cell: CellIndex, sequence: &mut Vec<CellIndex>) {
        if sequence.last() != Some(&cell) {
            sequence.push(cell);
        }
    }

    let mut sequence: Vec<CellIndex> = Vec::with_capacity(line.0.len());

    for pair in line.0.windows(2) {
        let [a, b] = pair else { continue };
        let (source, target) = (cell_of(*a, resolution)?, cell_of(*b, resolution)?);

        push(source, &mut sequence);
        if source == target || source.is_neighbor_with(target).unwrap_or(false) {
            push(target, &mut sequence);
            continue;
        }

        match grid_path(source, target) {
            Some(path) => path.into_iter().for_each(|cell| push(cell, &mut sequence)),
            None => {
                debug!("No grid path between {source} and {target}, interpolating.");
                for cell in interpolate(*a, *b, resolution)? {
                    push(cell, &mut sequence);
                }
            }
        }

        push(target, &mut sequence);
    }

    // Lines of a single vertex (or none) still cover their vertices
    if line.0.len() < 2 {
        for coord in &line.0 {
            push(cell_of(*coord, resolution)?, &mut sequence);
        }
    }

    Ok(sequence)
}

#[inline]
fn grid_path(source: CellIndex, target: CellIndex) -> Option<Vec<CellIndex>> {
    source
        .grid_path_cells(target)
        .ok()
        .and_then(|path| path.collect::<Result<Vec<_>, _>>().ok())
}

fn interpolate(a: Coord, b: Coord, resolution: Resolution) -> Result<Vec<CellIndex>, CellError> {
    let line = Line::new(a, b);
    let spacing = resolution.edge_length_m() / 2.0;
    let steps = (spacing > 0.0)
        .then(|| (spatial::distance(Point(a), Point(b)) / spacing).ceil() as usize)
        .unwrap_or(1)
        .max(1);

    (0..=steps)
        .map(|step| {
            let ratio = step as f64 / steps as f64;
            let position = line.point_at_ratio_from_start(&Haversine, ratio);
            cell_of(position.0, resolution)
        })
        .collect()
}

fn cover_polygon(
    polygon: &Polygon,
    resolution: Resolution,
    cells: &mut BTreeSet<CellIndex>,
) -> Result<(), CellError> {
    // Boundary cells are never missed, even if no centre lies within.
    cells.extend(trace_cells(polygon.exterior(), resolution)?);

    let Some(bounds) = polygon.bounding_rect() else {
        return Ok(());
    };

    let center = bounds.center();
    let radius = bounds
        .to_polygon()
        .exterior()
        .points()
        .map(|corner| spatial::distance(Point(center), corner))
        .fold(0.0, f64::max);

    let origin = cell_of(center, resolution)?;
    let k = ring_for_distance(resolution, radius);
    trace!("Covering polygon interior with disk k={k} around {origin}");

    cells.extend(
        origin
            .grid_disk_safe(k)
            .filter(|cell| polygon.contains(&cell_center(*cell))),
    );

    Ok(())
}

fn cover(
    geometry: &Geometry,
    resolution: Resolution,
    cells: &mut BTreeSet<CellIndex>,
) -> Result<(), CellError> {
    match geometry {
        Geometry::Point(point) => {
            cells.insert(cell_of(point.0, resolution)?);
        }
        Geometry::MultiPoint(points) => {
            for point in points {
                cells.insert(cell_of(point.0, resolution)?);
            }
        }
        Geometry::Line(line) => {
            let line = LineString::from(vec![line.start, line.end]);
            cells.extend(trace_cells(&line, resolution)?);
        }
        Geometry::LineString(line) => cells.extend(trace_cells(line, resolution)?),
        Geometry::MultiLineString(lines) => {
            for line in lines {
                cells.extend(trace_cells(line, resolution)?);
            }
        }
        Geometry::Polygon(polygon) => cover_polygon(polygon, resolution, cells)?,
        Geometry::MultiPolygon(polygons) => {
            for polygon in polygons {
                cover_polygon(polygon, resolution, cells)?;
            }
        }
        Geometry::Rect(rect) => cover_polygon(&rect.to_polygon(), resolution, cells)?,
        Geometry::Triangle(triangle) => {
            cover_polygon(&triangle.to_polygon(), resolution, cells)?
        }
        Geometry::GeometryCollection(_) => {
            return Err(CellError::UnsupportedGeometry(GeometryKind::from(geometry)));
        }
    }

    Ok(())
}
