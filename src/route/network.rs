use std::fmt::{Debug, Formatter};

use log::{debug, info};
use petgraph::Direction;
use petgraph::prelude::DiGraphMap;
use rustc_hash::FxHashMap;

use crate::candidate::{CandidateIndex, FeatureIx};

pub type NetworkStructure = DiGraphMap<FeatureIx, ()>;

/// The connectivity of candidate features.
///
/// An edge `u → v` means a route may continue from feature `u` onto
/// feature `v`. Features absent from the network are isolated, and may
/// only be routed within themselves.
#[derive(Clone, Default)]
pub struct Network {
    pub(crate) graph: NetworkStructure,
}

impl Debug for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Network with Features: {}, Connections: {}",
            self.graph.node_count(),
            self.graph.edge_count()
        )
    }
}

impl Network {
    pub fn new() -> Self {
        Network::default()
    }

    /// Builds a network in which features sharing any connector are
    /// mutually adjacent.
    ///
    /// Connectors are read from the property `key` of each feature,
    /// see [`CandidateFeature::connectors`](crate::CandidateFeature::connectors).
    pub fn from_connectors(index: &CandidateIndex, key: &str) -> Self {
        let mut by_connector: FxHashMap<&str, Vec<FeatureIx>> = FxHashMap::default();
        for (ix, feature) in index.iter() {
            for connector in feature.connectors(key) {
                by_connector.entry(connector).or_default().push(ix);
            }
        }

        let mut network = Network::new();
        for (ix, _) in index.iter() {
            network.graph.add_node(ix);
        }

        for features in by_connector.values() {
            for source in features {
                for target in features.iter().filter(|target| *target != source) {
                    network.connect(*source, *target);
                }
            }
        }

        info!(
            "Built network from {} connectors. {network:?}",
            by_connector.len()
        );

        network
    }

    /// Builds a network from adjacency lists, keyed by feature id.
    ///
    /// Ids which are not present within the index are skipped.
    pub fn from_adjacency<'a, S, T>(index: &CandidateIndex, adjacency: S) -> Self
    where
        S: IntoIterator<Item = (&'a str, T)>,
        T: IntoIterator<Item = &'a str>,
    {
        let mut network = Network::new();
        for (source, targets) in adjacency {
            let Some(source) = Network::resolve(index, source) else {
                continue;
            };

            network.graph.add_node(source);
            for target in targets {
                if let Some(target) = Network::resolve(index, target) {
                    network.connect(source, target);
                }
            }
        }

        network
    }

    /// Builds a network from `(source, target)` id pairs.
    ///
    /// If `bidirectional`, every pair is also connected in reverse.
    pub fn from_pairs<'a>(
        index: &CandidateIndex,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
        bidirectional: bool,
    ) -> Self {
        let mut network = Network::new();
        for (source, target) in pairs {
            let (Some(source), Some(target)) = (
                Network::resolve(index, source),
                Network::resolve(index, target),
            ) else {
                continue;
            };

            network.connect(source, target);
            if bidirectional {
                network.connect(target, source);
            }
        }

        network
    }

    fn resolve(index: &CandidateIndex, id: &str) -> Option<FeatureIx> {
        let ix = index.ix(id);
        if ix.is_none() {
            debug!("Skipping unknown feature {id:?} in network.");
        }

        ix
    }

    /// Connects `source` onto `target`. Self-connections are ignored.
    pub fn connect(&mut self, source: FeatureIx, target: FeatureIx) {
        if source != target {
            self.graph.add_edge(source, target, ());
        }
    }

    #[inline]
    pub fn contains(&self, feature: FeatureIx) -> bool {
        self.graph.contains_node(feature)
    }

    #[inline]
    pub fn is_connected(&self, source: FeatureIx, target: FeatureIx) -> bool {
        self.graph.contains_edge(source, target)
    }

    /// Features the route may continue onto from `feature`.
    pub fn successors(&self, feature: FeatureIx) -> impl Iterator<Item = FeatureIx> + '_ {
        self.graph
            .neighbors_directed(feature, Direction::Outgoing)
    }

    pub fn size(&self) -> usize {
        self.graph.node_count()
    }

    pub fn connections(&self) -> usize {
        self.graph.edge_count()
    }
}
