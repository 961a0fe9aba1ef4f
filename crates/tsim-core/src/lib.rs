//! `tsim-core` — foundational types for the `tsim` traffic simulator.
//!
//! Every other `tsim-*` crate depends on this one.  It has no `tsim-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `NodeId`, `EdgeId`                             |
//! | [`geo`]         | `GeoPoint`, `RenderPoint`, `RenderProjection`             |
//! | [`time`]        | `Frame`, `FrameClock`                                     |
//! | [`config`]      | `SimConfig` and its nested sections (TOML-loadable)       |
//! | [`road_class`]  | `RoadClass` normalization of highway tags                 |
//! | [`rng`]         | `AgentRng` (per-agent), `SimRng` (global)                 |
//! | [`error`]       | `CoreError`, `CoreResult`                                 |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod road_class;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{ArrivalMode, DensityConfig, SignalConfig, SignalDriver, SignalScope, SimConfig};
pub use error::{CoreError, CoreResult};
pub use geo::{GeoPoint, RenderPoint, RenderProjection};
pub use ids::{AgentId, EdgeId, NodeId};
pub use rng::{AgentRng, SimRng};
pub use road_class::RoadClass;
pub use time::{Frame, FrameClock};
