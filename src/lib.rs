#![doc = include_str!("../readme.md")]

pub mod candidate;
pub mod cell;
pub mod error;
pub mod route;
pub mod spatial;
pub mod transition;

#[doc(inline)]
pub use candidate::{CandidateFeature, CandidateIndex, FeatureIx, IndexOptions};
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use route::{Network, Route, RouteStep};
#[doc(inline)]
pub use transition::{
    Detail, PointSnapInfo, SnappedPointPrediction, Trace, TraceMatchResult, TraceMatcher,
    TracePoint, TraceSnapOptions,
};

pub type Result<T> = std::result::Result<T, Error>;
