//! `tsim-agent` — vehicle agents for the `tsim` traffic simulator.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                       |
//! |-------------|----------------------------------------------------------------|
//! | [`agent`]   | `Agent` (one vehicle), `AgentStatus`, `Movement`               |
//! | [`arena`]   | `AgentArena` (index-stable, liveness flags), `AgentRngs`       |
//! | [`builder`] | `PopulationBuilder` (random or explicit spawns)                |
//! | [`error`]   | `AgentError`, `AgentResult<T>`                                 |
//!
//! Agents never leave the arena during a run.  Removal clears a liveness
//! flag instead, so `AgentId`s stay valid indices while the frame loop
//! iterates.

pub mod agent;
pub mod arena;
pub mod builder;
pub mod error;


pub use agent::{Agent, AgentStatus, Movement};
pub use arena::{AgentArena, AgentRngs};
pub use builder::PopulationBuilder;
pub use error::{AgentError, AgentResult};
