//! `tsim-output` — simulation output writers for tsim.
//!
//! Two backends are provided:
//!
//! | Feature   | Backend | Files created                                                    |
//! |-----------|---------|------------------------------------------------------------------|
//! | *(none)*  | CSV     | `edge_density.csv`, `frame_summaries.csv`, `run_summary.csv`     |
//! | `sqlite`  | SQLite  | `output.db`                                                      |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `tsim_sim::FrameObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tsim_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer);
//! sim.run(&mut obs)?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod rows;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use rows::{EdgeDensityRow, FrameSummaryRow, RunSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
