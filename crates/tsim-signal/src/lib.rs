//! `tsim-signal` — traffic signals and the messages that drive them.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`signal`]  | `SignalState`, `SignalKey`, `SignalTiming`, `TrafficSignal`   |
//! | [`table`]   | `SignalTable` (keyed collection), `ApplyStats`                |
//! | [`message`] | `ControlMessage`: desired states produced by a controller     |
//! | [`error`]   | `SignalError`, `SignalResult<T>`                              |
//!
//! A signal is either self-driven (its own red/green timer ticks once per
//! frame) or externally driven (it changes only when a `ControlMessage`
//! names its key).  Both kinds accept controller writes, which overwrite the
//! state and reset the timer.

pub mod error;
pub mod message;
pub mod signal;
pub mod table;


pub use error::{SignalError, SignalResult};
pub use message::ControlMessage;
pub use signal::{SignalKey, SignalState, SignalTiming, TrafficSignal};
pub use table::{ApplyStats, SignalTable};
