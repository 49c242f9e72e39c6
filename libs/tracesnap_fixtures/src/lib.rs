//! Synthetic road networks and traces used by the tests and benches.
//!
//! Data is returned as plain `geo` types, so the fixtures
//! carry no dependency upon the matcher itself.

use geo::{Coord, Destination, Haversine, LineString, Point, coord};

/// Approximately 111m at the equator.
pub const GRID_SPACING: f64 = 0.001;

/// A trace around Macon, GA, whose first two points lie 5.1m apart.
pub const MACON_TRACE: &str = "LINESTRING (-83.6878343 32.8413587, -83.6877941 32.8413903, -83.6876932 32.8414589, -83.6875511 32.8415498)";

/// A road segment joining two grid nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: String,
    pub geometry: LineString,
    /// The identifiers of the nodes at either end.
    pub connectors: [String; 2],
}

/// A rectangular lattice of roads, with nodes every `spacing` degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub origin: Coord,
    pub rows: usize,
    pub cols: usize,
    pub spacing: f64,
}

impl Grid {
    pub fn new(origin: Coord, rows: usize, cols: usize) -> Self {
        Grid {
            origin,
            rows,
            cols,
            spacing: GRID_SPACING,
        }
    }

    /// A grid at null island.
    pub fn equatorial(rows: usize, cols: usize) -> Self {
        Grid::new(coord! { x: 0.0, y: 0.0 }, rows, cols)
    }

    pub fn node(&self, row: usize, col: usize) -> Coord {
        coord! {
            x: self.origin.x + col as f64 * self.spacing,
            y: self.origin.y + row as f64 * self.spacing,
        }
    }

    pub fn node_id(row: usize, col: usize) -> String {
        format!("n{row}_{col}")
    }

    /// The identifier of the horizontal segment east of the node.
    pub fn horizontal_id(row: usize, col: usize) -> String {
        format!("h{row}_{col}")
    }

    /// The identifier of the vertical segment north of the node.
    pub fn vertical_id(row: usize, col: usize) -> String {
        format!("v{row}_{col}")
    }

    /// Every segment of the grid, horizontal segments first.
    pub fn segments(&self) -> Vec<Segment> {
        let segment = |id: String, from: (usize, usize), to: (usize, usize)| Segment {
            id,
            geometry: LineString::new(vec![self.node(from.0, from.1), self.node(to.0, to.1)]),
            connectors: [Grid::node_id(from.0, from.1), Grid::node_id(to.0, to.1)],
        };

        let horizontal = (0..self.rows).flat_map(|row| {
            (0..self.cols.saturating_sub(1))
                .map(move |col| segment(Grid::horizontal_id(row, col), (row, col), (row, col + 1)))
        });

        let vertical = (0..self.rows.saturating_sub(1)).flat_map(|row| {
            (0..self.cols)
                .map(move |col| segment(Grid::vertical_id(row, col), (row, col), (row + 1, col)))
        });

        horizontal.chain(vertical).collect()
    }

    /// Walks the nodes in order, sampling `samples` evenly spaced
    /// points along each leg. The final node is always included.
    pub fn walk(&self, nodes: &[(usize, usize)], samples: usize) -> LineString {
        let samples = samples.max(1);
        let mut coords = nodes
            .windows(2)
            .flat_map(|pair| {
                let (from, to) = (self.node(pair[0].0, pair[0].1), self.node(pair[1].0, pair[1].1));
                (0..samples).map(move |step| {
                    let ratio = step as f64 / samples as f64;
                    coord! {
                        x: from.x + (to.x - from.x) * ratio,
                        y: from.y + (to.y - from.y) * ratio,
                    }
                })
            })
            .collect::<Vec<_>>();

        if let Some((row, col)) = nodes.last() {
            coords.push(self.node(*row, *col));
        }

        LineString::new(coords)
    }
}

/// Displaces every point of the line by `meters`, alternating
/// between a north-east and a south-west bearing.
pub fn jitter(line: &LineString, meters: f64) -> LineString {
    line.points()
        .enumerate()
        .map(|(index, point): (usize, Point)| {
            let bearing = if index % 2 == 0 { 45.0 } else { 225.0 };
            Haversine.destination(point, bearing, meters)
        })
        .collect()
}
