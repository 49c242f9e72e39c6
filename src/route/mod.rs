//! The route distance oracle.
//!
//! Candidate features are connected through a [`Network`], a directed
//! adjacency relation between features. The oracle finds the shortest
//! route between a point on one feature and a point on another, where
//! the cost of traversing a feature depends on where the route entered
//! it. See [`shortest_route`].

#[doc(hidden)]
pub mod dijkstra;
#[doc(hidden)]
pub mod entity;
#[doc(hidden)]
pub mod network;
#[doc(hidden)]
pub mod oracle;
#[cfg(test)]
mod test;

#[doc(inline)]
pub use entity::*;
#[doc(inline)]
pub use network::*;
#[doc(inline)]
pub use oracle::*;
