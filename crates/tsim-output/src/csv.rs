//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `edge_density.csv`
//! - `frame_summaries.csv`
//! - `run_summary.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{EdgeDensityRow, FrameSummaryRow, OutputResult, RunSummaryRow};

pub const EDGE_DENSITY_HEADER: [&str; 6] = ["frame", "edge", "from", "to", "density", "level"];

pub const FRAME_SUMMARY_HEADER: [&str; 12] = [
    "frame",
    "elapsed_secs",
    "control_messages",
    "signal_flips",
    "planning_failures",
    "moved",
    "signal_blocked",
    "contention_blocked",
    "arrivals",
    "arrived",
    "not_arrived",
    "density_total",
];

pub const RUN_SUMMARY_HEADER: [&str; 12] = [
    "frames",
    "total_agents",
    "arrived",
    "not_arrived",
    "arrived_pct",
    "trips_completed",
    "signals",
    "total_density",
    "planning_failures",
    "signal_blocked",
    "contention_blocked",
    "max_stall_frames",
];

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    edges:    Writer<File>,
    frames:   Writer<File>,
    runs:     Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create the three CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut edges = Writer::from_path(dir.join("edge_density.csv"))?;
        edges.write_record(EDGE_DENSITY_HEADER)?;

        let mut frames = Writer::from_path(dir.join("frame_summaries.csv"))?;
        frames.write_record(FRAME_SUMMARY_HEADER)?;

        let mut runs = Writer::from_path(dir.join("run_summary.csv"))?;
        runs.write_record(RUN_SUMMARY_HEADER)?;

        Ok(Self { edges, frames, runs, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_edge_densities(&mut self, rows: &[EdgeDensityRow]) -> OutputResult<()> {
        for row in rows {
            self.edges.write_record(&[
                row.frame.to_string(),
                row.edge.to_string(),
                row.from.to_string(),
                row.to.to_string(),
                row.density.to_string(),
                row.level.as_str().to_owned(),
            ])?;
        }
        Ok(())
    }

    fn write_frame_summary(&mut self, row: &FrameSummaryRow) -> OutputResult<()> {
        self.frames.write_record(&[
            row.frame.to_string(),
            format!("{:.3}", row.elapsed_secs),
            row.control_messages.to_string(),
            row.signal_flips.to_string(),
            row.planning_failures.to_string(),
            row.moved.to_string(),
            row.signal_blocked.to_string(),
            row.contention_blocked.to_string(),
            row.arrivals.to_string(),
            row.arrived.to_string(),
            row.not_arrived.to_string(),
            row.density_total.to_string(),
        ])?;
        Ok(())
    }

    fn write_run_summary(&mut self, row: &RunSummaryRow) -> OutputResult<()> {
        self.runs.write_record(&[
            row.frames.to_string(),
            row.total_agents.to_string(),
            row.arrived.to_string(),
            row.not_arrived.to_string(),
            format!("{:.2}", row.arrived_pct),
            row.trips_completed.to_string(),
            row.signals.to_string(),
            row.total_density.to_string(),
            row.planning_failures.to_string(),
            row.signal_blocked.to_string(),
            row.contention_blocked.to_string(),
            row.max_stall_frames.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.edges.flush()?;
        self.frames.flush()?;
        self.runs.flush()?;
        Ok(())
    }
}
