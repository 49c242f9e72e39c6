//! A Hidden-Markov-Model (HMM) matching
//! transition module that allows for
//! matching raw traces onto candidate
//! features.
//!
//! Each trace point forms a layer of candidates, scored by their
//! emission probability. Consecutive layers are joined by transitions,
//! scored by how closely the route between the candidates follows the
//! trace. The [`TraceMatcher`] decodes the most likely sequence of
//! candidates using a single forward (Viterbi) pass and a backtrack.

#[doc(hidden)]
pub mod collapse;
pub mod costing;
#[doc(hidden)]
pub mod error;
pub mod layer;
#[doc(hidden)]
pub mod options;
#[doc(hidden)]
pub mod result;
#[doc(hidden)]
pub mod solver;
#[doc(hidden)]
pub mod trace;


// Re-Exports
#[doc(hidden)]
pub use collapse::*;
#[doc(inline)]
pub use costing::*;
#[doc(inline)]
pub use error::*;
#[doc(hidden)]
pub use layer::*;
#[doc(inline)]
pub use options::*;
#[doc(inline)]
pub use result::*;
#[doc(inline)]
pub use solver::*;
#[doc(inline)]
pub use trace::*;
