use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::hash::BuildHasherDefault;

use geo::Geometry;
use h3o::{CellIndex, Resolution};
use indexmap::IndexMap;
use indexmap::map::Entry;
use log::{debug, info};
use measure_time::debug_time;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use serde::{Deserialize, Serialize};

use crate::candidate::{CandidateFeature, FeatureIx, IndexError};
use crate::cell::{CellError, cells_with_ring, ring_for_distance};

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

const DEFAULT_RESOLUTION: Resolution = Resolution::Twelve;

/// Configures how features are bucketed into grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// The grid resolution features are bucketed at.
    ///
    /// Resolution 12 cells have an average edge of ~9.4m,
    /// which keeps the number of features per cell low for
    /// dense road networks.
    pub resolution: Resolution,

    /// The number of grid-steps each feature's own coverage is
    /// expanded by before bucketing.
    ///
    /// Queries are expanded by the matcher according to its search
    /// distance, so this is usually left at zero.
    pub ring: u32,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            resolution: DEFAULT_RESOLUTION,
            ring: 0,
        }
    }
}

impl IndexOptions {
    pub fn with_resolution(self, resolution: Resolution) -> Self {
        IndexOptions { resolution, ..self }
    }

    pub fn with_ring(self, ring: u32) -> Self {
        IndexOptions { ring, ..self }
    }
}

/// A spatial index of candidate features, keyed by grid cell.
///
/// The index owns every feature by its identifier, the set of cells
/// covering every feature, and the inverse relation of every cell to
/// the features it contains. It is immutable once built.
pub struct CandidateIndex {
    /// Features by identifier. The insertion position of
    /// each entry is that feature's [`FeatureIx`].
    features_by_id: FxIndexMap<String, CandidateFeature>,

    /// The (ring-expanded) cells covering each feature, by [`FeatureIx`].
    cells_by_id: Vec<BTreeSet<CellIndex>>,

    features_by_cell: FxHashMap<CellIndex, Vec<FeatureIx>>,

    options: IndexOptions,
}

impl Debug for CandidateIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CandidateIndex {{ features: {}, cells: {}, resolution: {} }}",
            self.features_by_id.len(),
            self.features_by_cell.len(),
            self.options.resolution
        )
    }
}

impl CandidateIndex {
    /// Builds the index from the supplied features.
    ///
    /// Fails if two features share an identifier, or if the
    /// geometry of any feature cannot be bucketed into cells.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, level = "info"))]
    pub fn build(
        features: impl IntoIterator<Item = CandidateFeature>,
        options: IndexOptions,
    ) -> Result<CandidateIndex, IndexError> {
        debug_time!("CandidateIndex::build");
        let features = features.into_iter().collect::<Vec<_>>();

        // Cell coverage is independent per feature.
        let covered = features
            .into_par_iter()
            .map(|feature| {
                match cells_with_ring(&feature.geometry, options.resolution, options.ring) {
                    Ok(cells) => Ok((feature, cells)),
                    Err(source) => Err(IndexError::Cell {
                        id: feature.id,
                        source,
                    }),
                }
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        let mut features_by_id = FxIndexMap::with_capacity_and_hasher(
            covered.len(),
            BuildHasherDefault::<FxHasher>::default(),
        );
        let mut cells_by_id = Vec::with_capacity(covered.len());
        let mut features_by_cell: FxHashMap<CellIndex, Vec<FeatureIx>> = FxHashMap::default();

        for (feature, cells) in covered {
            let ix = match features_by_id.entry(feature.id.clone()) {
                Entry::Occupied(_) => return Err(IndexError::DuplicateFeature(feature.id)),
                Entry::Vacant(entry) => {
                    let ix = FeatureIx(entry.index() as u32);
                    entry.insert(feature);
                    ix
                }
            };

            for cell in &cells {
                features_by_cell.entry(*cell).or_default().push(ix);
            }

            cells_by_id.push(cells);
        }

        info!(
            "Indexed {} features into {} cells at resolution {}",
            features_by_id.len(),
            features_by_cell.len(),
            options.resolution
        );

        Ok(CandidateIndex {
            features_by_id,
            cells_by_id,
            features_by_cell,
            options,
        })
    }

    #[inline]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.options.resolution
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.features_by_id.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features_by_id.is_empty()
    }

    /// Looks up the feature for the given index.
    #[inline]
    pub fn get(&self, ix: FeatureIx) -> Option<&CandidateFeature> {
        self.features_by_id
            .get_index(ix.index())
            .map(|(_, feature)| feature)
    }

    /// Looks up the feature by its identifier.
    #[inline]
    pub fn feature(&self, id: &str) -> Option<&CandidateFeature> {
        self.features_by_id.get(id)
    }

    /// Resolves an identifier into the feature's index.
    #[inline]
    pub fn ix(&self, id: &str) -> Option<FeatureIx> {
        self.features_by_id
            .get_index_of(id)
            .map(|ix| FeatureIx(ix as u32))
    }

    /// All features, in the order they were indexed.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureIx, &CandidateFeature)> {
        self.features_by_id
            .values()
            .enumerate()
            .map(|(ix, feature)| (FeatureIx(ix as u32), feature))
    }

    /// The cells covering the feature, including the ring expansion.
    pub fn cells(&self, ix: FeatureIx) -> Option<&BTreeSet<CellIndex>> {
        self.cells_by_id.get(ix.index())
    }

    /// The cells covering the feature with the given identifier.
    pub fn cells_by_id(&self, id: &str) -> Option<&BTreeSet<CellIndex>> {
        self.ix(id).and_then(|ix| self.cells(ix))
    }

    /// The features bucketed under the cell.
    pub fn features_in_cell(&self, cell: &CellIndex) -> &[FeatureIx] {
        self.features_by_cell
            .get(cell)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Unions the features of every given cell.
    ///
    /// Features are de-duplicated, and returned in the order they
    /// were first seen whilst walking the cells in the order given.
    pub fn candidates_for_cells<'a>(
        &self,
        cells: impl IntoIterator<Item = &'a CellIndex>,
    ) -> Vec<FeatureIx> {
        let mut seen = FxHashSet::default();

        cells
            .into_iter()
            .flat_map(|cell| self.features_in_cell(cell))
            .filter(|ix| seen.insert(**ix))
            .copied()
            .collect()
    }

    /// Like [`CandidateIndex::candidates_for_cells`], resolving the features.
    pub fn candidate_features_for_cells<'a>(
        &self,
        cells: impl IntoIterator<Item = &'a CellIndex>,
    ) -> Vec<&CandidateFeature> {
        self.candidates_for_cells(cells)
            .into_iter()
            .filter_map(|ix| self.get(ix))
            .collect()
    }

    /// Finds all features bucketed within `meters` of the geometry.
    ///
    /// This is a cell-granular search. Returned features are not
    /// guaranteed to lie within the distance, however every feature
    /// which does lie within it is returned.
    pub fn candidates_near(
        &self,
        geometry: &Geometry,
        meters: f64,
    ) -> Result<Vec<FeatureIx>, CellError> {
        let k = ring_for_distance(self.resolution(), meters);
        let cells = cells_with_ring(geometry, self.resolution(), k)?;

        let candidates = self.candidates_for_cells(&cells);
        debug!(
            "Found {} candidates across {} cells (k={k})",
            candidates.len(),
            cells.len()
        );

        Ok(candidates)
    }
}
