//! Integration tests for tsim-output.

#[cfg(test)]
mod fixtures {
    use tsim_core::{GeoPoint, NodeId, SimConfig};
    use tsim_sim::{DensityLevel, FrameStats, Sim, SimBuilder};
    use tsim_spatial::{EdgeAttrs, Projection, RoadGraphBuilder, ShortestPath};

    use crate::{EdgeDensityRow, FrameSummaryRow};

    pub fn edge_row(frame: u64, edge: u32, density: u64) -> EdgeDensityRow {
        EdgeDensityRow { frame, edge, from: edge, to: edge + 1, density, level: DensityLevel::Medium }
    }

    pub fn frame_row(frame: u64) -> FrameSummaryRow {
        let stats = FrameStats { frame: tsim_core::Frame(frame), moved: 3, density_total: 7, ..FrameStats::default() };
        FrameSummaryRow::new(&stats, frame as f64 / 10.0)
    }

    /// Two-way square with 8 agents; 20 frames, snapshots every 5.
    pub fn small_sim() -> Sim<ShortestPath> {
        let mut b = RoadGraphBuilder::new().projection(Projection::Identity);
        let ids: Vec<NodeId> = [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]
            .iter()
            .map(|&(lat, lon)| b.add_node(GeoPoint::new(lat, lon)))
            .collect();
        for i in 0..4 {
            b.add_road(ids[i], ids[(i + 1) % 4], EdgeAttrs::default());
        }
        let config = SimConfig {
            agent_count: 8,
            frame_rate: 10,
            duration_secs: 2.0,
            output_interval_frames: 5,
            ..SimConfig::default()
        };
        SimBuilder::new(config, b.build().unwrap(), ShortestPath::hops()).build().unwrap()
    }
}

// ── CSV writer ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::{CsvWriter, EDGE_DENSITY_HEADER, FRAME_SUMMARY_HEADER, RUN_SUMMARY_HEADER};
    use crate::writer::OutputWriter;
    use super::fixtures::{edge_row, frame_row};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn headers(path: std::path::PathBuf) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("edge_density.csv").exists());
        assert!(dir.path().join("frame_summaries.csv").exists());
        assert!(dir.path().join("run_summary.csv").exists());
    }

    #[test]
    fn csv_creates_missing_directory() {
        let dir = tmp();
        let nested = dir.path().join("a").join("b");
        let _w = CsvWriter::new(&nested).unwrap();
        assert!(nested.join("edge_density.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        assert_eq!(headers(dir.path().join("edge_density.csv")), EDGE_DENSITY_HEADER);
        assert_eq!(headers(dir.path().join("frame_summaries.csv")), FRAME_SUMMARY_HEADER);
        assert_eq!(headers(dir.path().join("run_summary.csv")), RUN_SUMMARY_HEADER);
    }

    #[test]
    fn csv_edge_rows_read_back() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_edge_densities(&[edge_row(30, 0, 6), edge_row(30, 1, 0)]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("edge_density.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "30");
        assert_eq!(&rows[0][4], "6");
        assert_eq!(&rows[0][5], "medium");
        assert_eq!(&rows[1][1], "1");
    }

    #[test]
    fn csv_frame_summary_read_back() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_frame_summary(&frame_row(4)).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("frame_summaries.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "4");
        assert_eq!(&rows[0][1], "0.400");
        assert_eq!(&rows[0][5], "3");
        assert_eq!(&rows[0][11], "7");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use tsim_core::Frame;
    use tsim_sim::SimError;

    use crate::{
        CsvWriter, EdgeDensityRow, FrameSummaryRow, OutputError, OutputResult, OutputWriter, RunSummaryRow,
        SimOutputObserver,
    };
    use super::fixtures::small_sim;

    #[test]
    fn integration_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = small_sim();
        let edges = sim.graph.edge_count();
        let mut obs = SimOutputObserver::new(CsvWriter::new(dir.path()).unwrap());
        let summary = sim.run(&mut obs).unwrap();

        let count = |name: &str| {
            csv::Reader::from_path(dir.path().join(name)).unwrap().records().count()
        };
        assert_eq!(count("frame_summaries.csv"), 20);
        assert_eq!(count("edge_density.csv"), 4 * edges);
        assert_eq!(count("run_summary.csv"), 1);
        assert_eq!(obs.rows_written(), 20 + 4 * edges + 1);

        let mut rdr = csv::Reader::from_path(dir.path().join("run_summary.csv")).unwrap();
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "20");
        assert_eq!(&row[1], "8");
        assert_eq!(row[7].parse::<u64>().unwrap(), summary.total_density);
    }

    #[test]
    fn last_snapshot_matches_final_density() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = small_sim();
        let mut obs = SimOutputObserver::new(CsvWriter::new(dir.path()).unwrap());
        let summary = sim.run(&mut obs).unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("edge_density.csv")).unwrap();
        let last: u64 = rdr
            .records()
            .map(|r| r.unwrap())
            .filter(|r| &r[0] == "20")
            .map(|r| r[4].parse::<u64>().unwrap())
            .sum();
        assert_eq!(last, summary.total_density);
    }

    /// Fails the third frame summary; records whether `finish` ran.
    #[derive(Default)]
    struct Flaky {
        frames:   usize,
        finished: bool,
    }

    impl OutputWriter for Flaky {
        fn write_edge_densities(&mut self, _rows: &[EdgeDensityRow]) -> OutputResult<()> {
            Ok(())
        }

        fn write_frame_summary(&mut self, _row: &FrameSummaryRow) -> OutputResult<()> {
            self.frames += 1;
            if self.frames == 3 {
                return Err(OutputError::Io(std::io::Error::other("disk full")));
            }
            Ok(())
        }

        fn write_run_summary(&mut self, _row: &RunSummaryRow) -> OutputResult<()> {
            Ok(())
        }

        fn finish(&mut self) -> OutputResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    #[test]
    fn write_failure_stops_run_and_flushes() {
        let mut sim = small_sim();
        let mut obs = SimOutputObserver::new(Flaky::default());
        let err = sim.run(&mut obs).unwrap_err();
        assert!(matches!(err, SimError::SinkFailed { frame: Frame(3), .. }));
        assert!(obs.writer().finished);
        assert_eq!(sim.clock.current_frame, Frame(3));
    }
}

// ── SQLite writer ─────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use rusqlite::Connection;
    use tempfile::TempDir;

    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;
    use crate::{RunSummaryRow, SimOutputObserver};
    use super::fixtures::{edge_row, frame_row, small_sim};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn count(dir: &TempDir, table: &str) -> i64 {
        let conn = Connection::open(dir.path().join("output.db")).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn sqlite_edge_rows() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_edge_densities(&[edge_row(5, 0, 12), edge_row(5, 1, 3)]).unwrap();
        w.finish().unwrap();
        assert_eq!(count(&dir, "edge_density"), 2);

        let conn = Connection::open(dir.path().join("output.db")).unwrap();
        let level: String = conn
            .query_row("SELECT level FROM edge_density WHERE edge = 0", [], |r| r.get(0))
            .unwrap();
        assert_eq!(level, "medium");
    }

    #[test]
    fn sqlite_frame_and_run_rows() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_frame_summary(&frame_row(1)).unwrap();
        w.write_frame_summary(&frame_row(2)).unwrap();
        let summary = tsim_sim::RunSummary { frames: 2, total_agents: 4, arrived: 1, not_arrived: 3, ..Default::default() };
        w.write_run_summary(&RunSummaryRow::from(&summary)).unwrap();
        w.finish().unwrap();
        assert_eq!(count(&dir, "frame_summaries"), 2);
        assert_eq!(count(&dir, "run_summary"), 1);
    }

    #[test]
    fn sqlite_integration() {
        let dir = tmp();
        let mut sim = small_sim();
        let mut obs = SimOutputObserver::new(SqliteWriter::new(dir.path()).unwrap());
        sim.run(&mut obs).unwrap();
        assert_eq!(count(&dir, "frame_summaries"), 20);
        assert_eq!(count(&dir, "run_summary"), 1);
    }
}
