use geo::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cell::GeometryKind;

/// Opaque key-value properties attached to a feature.
pub type Properties = serde_json::Map<String, Value>;

/// The identifier for a feature within a [`CandidateIndex`](super::CandidateIndex).
///
/// Identifiers are dense, and assigned in the order features were
/// supplied to the index. They are only meaningful for the index
/// which assigned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureIx(pub(crate) u32);

impl FeatureIx {
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A road-segment (or other) geometry, eligible to be matched against a trace point.
///
/// Geometries are expected in WGS84 longitude/latitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFeature {
    /// The stable identifier of the feature, unique within an index.
    pub id: String,
    pub geometry: Geometry,

    /// Opaque properties, only used to read externally supplied
    /// topology, such as the connectors of a segment.
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl CandidateFeature {
    pub fn new(id: impl Into<String>, geometry: impl Into<Geometry>) -> Self {
        CandidateFeature {
            id: id.into(),
            geometry: geometry.into(),
            properties: Properties::default(),
        }
    }

    pub fn with_properties(self, properties: Properties) -> Self {
        CandidateFeature { properties, ..self }
    }

    pub fn kind(&self) -> GeometryKind {
        GeometryKind::from(&self.geometry)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Reads the connector identifiers listed under the property `key`.
    ///
    /// Entries may either be plain strings, or objects which carry
    /// their identifier in a `connector_id` field. Any other entry is
    /// ignored.
    pub fn connectors(&self, key: &str) -> Vec<&str> {
        let Some(Value::Array(entries)) = self.property(key) else {
            return vec![];
        };

        entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(id) => Some(id.as_str()),
                Value::Object(object) => object.get("connector_id").and_then(Value::as_str),
                _ => None,
            })
            .collect()
    }
}
