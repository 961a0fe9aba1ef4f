//! `SimOutputObserver<W>` — bridges `FrameObserver` to an `OutputWriter`.

use tracing::debug;

use tsim_sim::{FrameObserver, FrameView, ObserverError, RunSummary};

use crate::rows::{EdgeDensityRow, FrameSummaryRow, RunSummaryRow};
use crate::writer::OutputWriter;

/// A [`FrameObserver`] that writes frame summaries, edge density snapshots
/// and the run summary to any [`OutputWriter`] backend.
///
/// | Hook           | Writes                                   |
/// |----------------|------------------------------------------|
/// | `on_frame_end` | one frame summary row                    |
/// | `on_snapshot`  | one density row per edge                 |
/// | `on_run_end`   | the run summary row, then `finish()`     |
///
/// Write errors are returned to the frame loop, which stops the run with
/// `SimError::SinkFailed`.  `on_run_end` still runs afterwards and flushes
/// what was written.
pub struct SimOutputObserver<W: OutputWriter> {
    writer: W,
    rows:   usize,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0 }
    }

    /// Rows written so far across all tables.
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: OutputWriter> FrameObserver for SimOutputObserver<W> {
    fn on_frame_end(&mut self, view: &FrameView<'_>) -> Result<(), ObserverError> {
        let row = FrameSummaryRow::new(view.stats, view.elapsed_secs);
        self.writer.write_frame_summary(&row)?;
        self.rows += 1;
        Ok(())
    }

    fn on_snapshot(&mut self, view: &FrameView<'_>) -> Result<(), ObserverError> {
        let frame = view.frame.0;
        let rows: Vec<EdgeDensityRow> = view.edges().map(|e| EdgeDensityRow::new(frame, &e)).collect();
        if !rows.is_empty() {
            self.writer.write_edge_densities(&rows)?;
            self.rows += rows.len();
        }
        Ok(())
    }

    fn on_run_end(&mut self, summary: &RunSummary) -> Result<(), ObserverError> {
        let written = self.writer.write_run_summary(&RunSummaryRow::from(summary));
        // Flush even if the summary row failed.
        let finished = self.writer.finish();
        written?;
        finished?;
        self.rows += 1;
        debug!(rows = self.rows, "output finished");
        Ok(())
    }
}
