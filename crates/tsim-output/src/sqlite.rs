//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! three tables: `edge_density`, `frame_summaries` and `run_summary`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{EdgeDensityRow, FrameSummaryRow, OutputResult, RunSummaryRow};

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS edge_density (
                 frame     INTEGER NOT NULL,
                 edge      INTEGER NOT NULL,
                 from_node INTEGER NOT NULL,
                 to_node   INTEGER NOT NULL,
                 density   INTEGER NOT NULL,
                 level     TEXT    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS frame_summaries (
                 frame              INTEGER PRIMARY KEY,
                 elapsed_secs       REAL    NOT NULL,
                 control_messages   INTEGER NOT NULL,
                 signal_flips       INTEGER NOT NULL,
                 planning_failures  INTEGER NOT NULL,
                 moved              INTEGER NOT NULL,
                 signal_blocked     INTEGER NOT NULL,
                 contention_blocked INTEGER NOT NULL,
                 arrivals           INTEGER NOT NULL,
                 arrived            INTEGER NOT NULL,
                 not_arrived        INTEGER NOT NULL,
                 density_total      INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS run_summary (
                 frames             INTEGER NOT NULL,
                 total_agents       INTEGER NOT NULL,
                 arrived            INTEGER NOT NULL,
                 not_arrived        INTEGER NOT NULL,
                 arrived_pct        REAL    NOT NULL,
                 trips_completed    INTEGER NOT NULL,
                 signals            INTEGER NOT NULL,
                 total_density      INTEGER NOT NULL,
                 planning_failures  INTEGER NOT NULL,
                 signal_blocked     INTEGER NOT NULL,
                 contention_blocked INTEGER NOT NULL,
                 max_stall_frames   INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_edge_densities(&mut self, rows: &[EdgeDensityRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO edge_density (frame, edge, from_node, to_node, density, level) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.frame as i64,
                    row.edge,
                    row.from,
                    row.to,
                    row.density as i64,
                    row.level.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_frame_summary(&mut self, row: &FrameSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO frame_summaries \
             (frame, elapsed_secs, control_messages, signal_flips, planning_failures, moved, \
              signal_blocked, contention_blocked, arrivals, arrived, not_arrived, density_total) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                row.frame as i64,
                row.elapsed_secs,
                row.control_messages as i64,
                row.signal_flips as i64,
                row.planning_failures as i64,
                row.moved as i64,
                row.signal_blocked as i64,
                row.contention_blocked as i64,
                row.arrivals as i64,
                row.arrived as i64,
                row.not_arrived as i64,
                row.density_total as i64,
            ],
        )?;
        Ok(())
    }

    fn write_run_summary(&mut self, row: &RunSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO run_summary \
             (frames, total_agents, arrived, not_arrived, arrived_pct, trips_completed, signals, \
              total_density, planning_failures, signal_blocked, contention_blocked, max_stall_frames) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                row.frames as i64,
                row.total_agents as i64,
                row.arrived as i64,
                row.not_arrived as i64,
                row.arrived_pct,
                row.trips_completed as i64,
                row.signals as i64,
                row.total_density as i64,
                row.planning_failures as i64,
                row.signal_blocked as i64,
                row.contention_blocked as i64,
                row.max_stall_frames,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
