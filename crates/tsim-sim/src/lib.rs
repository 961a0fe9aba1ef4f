//! `tsim-sim` — frame loop orchestrator for tsim.
//!
//! # Frame loop
//!
//! ```text
//! for frame in 1..=config.total_frames():
//!   ① Control   — drain queued controller messages onto the signal table.
//!   ② Plan      — agents without a next hop pick a random reachable target.
//!   ③ Snapshot  — index every active agent by (current, next) transition.
//!   ④ Decide    — edge check, signal check, contention check
//!                 (parallel with the `parallel` feature).
//!   ⑤ Apply     — in ascending AgentId order:
//!                   Advance            → density += 1; move or snap
//!                   ContentionBlocked  → density += 1; wait
//!                   SignalBlocked      → wait
//!                   Discard            → drop path; re-plan next frame
//!   ⑥ Signals   — tick self-driven signals.
//!   ⑦ Clock     — advance; observers see the post-frame state.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the decide phase on Rayon's thread pool.          |
//! | `fx-hash`  | Uses FxHash for the per-frame transition index.        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tsim_core::SimConfig;
//! use tsim_sim::{NoopObserver, SimBuilder};
//! use tsim_spatial::ShortestPath;
//!
//! let mut sim = SimBuilder::new(config, graph, ShortestPath::hops()).build()?;
//! let summary = sim.run(&mut NoopObserver)?;
//! println!("{summary}");
//! ```

pub mod builder;
pub mod congestion;
pub mod contention;
pub mod error;
pub mod observer;
pub mod sim;
pub mod summary;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use congestion::{CongestionAccumulator, DensityLevel};
pub use error::{SimError, SimResult};
pub use observer::{AgentView, EdgeView, FrameObserver, FrameView, NoopObserver, ObserverError, SignalView};
pub use sim::Sim;
pub use summary::{FrameStats, RunSummary};
