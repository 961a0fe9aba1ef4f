//! The `OutputWriter` trait implemented by all backend writers.

use crate::{EdgeDensityRow, FrameSummaryRow, OutputResult, RunSummaryRow};

/// Trait implemented by the CSV and SQLite writers.
pub trait OutputWriter {
    /// Write the per-edge counters of one snapshot.
    fn write_edge_densities(&mut self, rows: &[EdgeDensityRow]) -> OutputResult<()>;

    /// Write one frame summary row.
    fn write_frame_summary(&mut self, row: &FrameSummaryRow) -> OutputResult<()>;

    fn write_run_summary(&mut self, row: &RunSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent; may be called more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
