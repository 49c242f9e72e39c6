use chrono::{DateTime, Utc};
use geo::{LineString, Point};
use serde::{Deserialize, Serialize};

/// A single observed position of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub position: Point,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TracePoint {
    pub fn new(position: Point) -> Self {
        TracePoint {
            position,
            timestamp: None,
        }
    }

    pub fn with_timestamp(self, timestamp: DateTime<Utc>) -> Self {
        TracePoint {
            timestamp: Some(timestamp),
            ..self
        }
    }

    /// Seconds elapsed from `previous` to this point, if both are timestamped.
    pub fn seconds_since(&self, previous: &TracePoint) -> Option<f64> {
        let (from, to) = (previous.timestamp?, self.timestamp?);
        Some((to - from).num_milliseconds() as f64 / 1_000.0)
    }
}

/// An ordered sequence of observed positions, such as a GPS recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub id: String,
    pub points: Vec<TracePoint>,
}

impl Trace {
    pub fn new(id: impl Into<String>, points: Vec<TracePoint>) -> Self {
        Trace {
            id: id.into(),
            points,
        }
    }

    /// Creates an untimed trace from the vertices of the line.
    pub fn from_linestring(id: impl Into<String>, line: LineString) -> Self {
        let points = line.into_points().into_iter().map(TracePoint::new).collect();
        Trace::new(id, points)
    }

    /// Creates a trace from timestamped positions.
    pub fn from_timestamped(
        id: impl Into<String>,
        points: impl IntoIterator<Item = (Point, DateTime<Utc>)>,
    ) -> Self {
        let points = points
            .into_iter()
            .map(|(position, timestamp)| TracePoint::new(position).with_timestamp(timestamp))
            .collect();

        Trace::new(id, points)
    }

    /// The raw trace as a line.
    pub fn geometry(&self) -> LineString {
        self.points.iter().map(|point| point.position).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
