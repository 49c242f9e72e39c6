//! Buckets geometries into the cells of the [H3] discrete global grid.
//!
//! The cell coverage of a geometry is used as the spatial key of the
//! [`CandidateIndex`](crate::CandidateIndex): any query geometry can then
//! retrieve its nearby candidates by looking up the cells it covers,
//! instead of scanning the whole candidate set.
//!
//! ```rust
//! use geo::{Geometry, point};
//! use h3o::Resolution;
//! use tracesnap::cell::{cells_for, cells_with_ring, ring_for_distance};
//!
//! let geometry = Geometry::Point(point! { x: -83.6878343, y: 32.8413587 });
//!
//! // A point is covered by exactly one cell
//! let cells = cells_for(&geometry, Resolution::Twelve).unwrap();
//! assert_eq!(cells.len(), 1);
//!
//! // Expand the coverage such that anything within 10m is also covered
//! let k = ring_for_distance(Resolution::Twelve, 10.0);
//! let expanded = cells_with_ring(&geometry, Resolution::Twelve, k).unwrap();
//! assert!(expanded.len() > cells.len());
//! ```
//!
//! [H3]: https://h3geo.org

#[doc(hidden)]
pub mod cover;
#[doc(hidden)]
pub mod error;
#[cfg(test)]
mod test;

#[doc(inline)]
pub use cover::*;
#[doc(inline)]
pub use error::*;

use h3o::Resolution;

/// Determines the ring size `k` by which a cell must be expanded so that
/// every position within `meters` of any point inside the centre cell
/// lies within the expanded disk.
///
/// Uses the average hexagon edge length at the resolution. Neighbouring
/// cell centres are `√3 · edge` apart, and a point may lie up to one edge
/// length away from the centre of its own cell (and of the target cell).
pub fn ring_for_distance(resolution: Resolution, meters: f64) -> u32 {
    if meters.is_nan() || meters <= 0.0 {
        return 0;
    }

    let edge = resolution.edge_length_m();
    let step = edge * 3f64.sqrt();

    (((meters + 2.0 * edge) / step).ceil() as u32).max(1)
}
