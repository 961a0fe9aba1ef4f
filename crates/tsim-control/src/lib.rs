//! `tsim-control` — getting signal decisions from a controller into the
//! frame loop.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                    |
//! |----------------|-------------------------------------------------------------|
//! | [`channel`]    | `control_channel()`, `ControlSender`, `ControlReceiver`, `DrainStats` |
//! | [`controller`] | `SignalController` trait, `PeriodicSplitController`         |
//! | [`thread`]     | `spawn_controller`, `ControllerHandle`                      |
//! | [`error`]      | `ControlError`, `ControlResult<T>`                          |
//!
//! # Threading model
//!
//! The controller runs on its own OS thread and only ever talks to the
//! simulation through the channel.  The simulation drains the channel once
//! at the start of every frame without blocking; an empty channel leaves the
//! signal states as they were.  The controller thread is a daemon: the
//! simulation never joins it, and it exits on its own once its handle is
//! dropped or the receiving side goes away.

pub mod channel;
pub mod controller;
pub mod error;
pub mod thread;


pub use channel::{ControlReceiver, ControlSender, DrainStats, control_channel};
pub use controller::{PeriodicSplitController, SignalController, wall_clock};
pub use error::{ControlError, ControlResult};
pub use thread::{ControllerHandle, spawn_controller};
