use geo::{Geometry, Point};
use itertools::Itertools;
use log::trace;
use measure_time::debug_time;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::candidate::{CandidateIndex, FeatureIx};
use crate::cell::{CellError, cells_with_ring, ring_for_distance};
use crate::spatial;
use crate::transition::TracePoint;

/// A feature which lies near a trace point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub feature: FeatureIx,

    /// The position on the feature nearest to the trace point.
    pub position: Point,

    /// The distance from the trace point to `position`, in meters.
    pub distance: f64,
}

/// The candidates of a single trace point, ordered by
/// their distance to the point, and then their feature.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub origin: Point,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default)]
pub struct Layers {
    pub layers: Vec<Layer>,
}

impl Layers {
    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Generates the candidate layer of each trace point.
///
/// Candidates are looked up through the grid cells surrounding
/// the point, projected onto their geometry, and filtered to those
/// within the `filter_distance` of the point.
pub struct LayerGenerator<'a> {
    /// The maximum distance (in meters) a candidate may lie from its point.
    pub filter_distance: f64,

    /// The number of grid-steps searched around the cell of each point,
    /// covering the `filter_distance`.
    pub ring: u32,

    index: &'a CandidateIndex,
}

impl<'a> LayerGenerator<'a> {
    pub fn new(index: &'a CandidateIndex, filter_distance: f64) -> Self {
        LayerGenerator {
            filter_distance,
            ring: ring_for_distance(index.resolution(), filter_distance),
            index,
        }
    }

    /// Generates the layer of every point, in parallel.
    pub fn with_points(&self, input: &[TracePoint]) -> Result<Layers, CellError> {
        debug_time!("LayerGenerator::with_points");

        input
            .into_par_iter()
            .map(|point| self.layer(&point.position))
            .collect::<Result<Vec<Layer>, CellError>>()
            .map(|layers| Layers { layers })
    }

    /// Generates the layer of a single point.
    pub fn layer(&self, origin: &Point) -> Result<Layer, CellError> {
        let cells = cells_with_ring(&Geometry::Point(*origin), self.index.resolution(), self.ring)?;
        let features = self.index.candidates_for_cells(&cells);

        let candidates = features
            .into_par_iter()
            .filter_map(|feature| {
                let geometry = &self.index.get(feature)?.geometry;
                let position = spatial::closest_point(geometry, origin)?;
                let distance = spatial::distance(position, *origin);

                (distance <= self.filter_distance).then_some(Candidate {
                    feature,
                    position,
                    distance,
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .sorted_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then_with(|| a.feature.cmp(&b.feature))
            })
            .collect::<Vec<_>>();

        trace!(
            "Found {} candidates across {} cells",
            candidates.len(),
            cells.len()
        );

        Ok(Layer {
            origin: *origin,
            candidates,
        })
    }
}
