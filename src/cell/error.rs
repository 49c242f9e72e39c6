use geo::Geometry;
use strum::{AsRefStr, Display};
use thiserror::Error;

/// The geometry variants a candidate or trace may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum GeometryKind {
    Point,
    Line,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    Rect,
    Triangle,
}

impl From<&Geometry> for GeometryKind {
    fn from(value: &Geometry) -> Self {
        match value {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Line(_) => GeometryKind::Line,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
            Geometry::Rect(_) => GeometryKind::Rect,
            Geometry::Triangle(_) => GeometryKind::Triangle,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellError {
    #[error("geometry type {0} cannot be bucketed into grid cells")]
    UnsupportedGeometry(GeometryKind),

    #[error("coordinate ({x}, {y}) is not a valid longitude/latitude")]
    InvalidCoordinate { x: f64, y: f64 },
}
