//! The candidate feature store.
//!
//! Candidates are loaded once per matching run into a [`CandidateIndex`],
//! which buckets them by the grid cells they cover. The index is then
//! shared, read-only, by every trace matched against it.

#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod feature;
#[doc(hidden)]
pub mod index;
#[cfg(test)]
mod test;

#[doc(inline)]
pub use error::*;
#[doc(inline)]
pub use feature::*;
#[doc(inline)]
pub use index::*;
