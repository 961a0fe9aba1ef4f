//! `tsim-spatial` — the road graph and shortest-path queries.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`network`] | `RoadGraph` (CSR), `RoadGraphBuilder`, `EdgeAttrs`, `ComponentFilter` |
//! | [`router`]  | `Router` trait, `ShortestPath` (hop count or weighted Dijkstra) |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                              |
//!
//! A `RoadGraph` is immutable once built.  Agents, signal tables and the
//! congestion accumulator read it concurrently without synchronisation.

pub mod error;
pub mod network;
pub mod router;

#[cfg(test)]
mod tests;

pub use error::{SpatialError, SpatialResult};
pub use network::{ComponentFilter, EdgeAttrs, Projection, RoadGraph, RoadGraphBuilder};
pub use router::{Router, ShortestPath};
