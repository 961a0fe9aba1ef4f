//! 8×8 synthetic street grid.
//!
//! Every fourth row and column is a two-way arterial (`Major`); the rest are
//! one-way local streets alternating direction (`Minor`), so the directed
//! graph is not trivially symmetric.  Arterial crossings are signal-tagged.

use tsim_core::{GeoPoint, NodeId, RoadClass};
use tsim_spatial::{EdgeAttrs, Projection, RoadGraph, RoadGraphBuilder, SpatialResult};

pub const ROWS: usize = 8;
pub const COLS: usize = 8;

const LAT_MIN:  f64 = 41.00;
const LAT_STEP: f64 = 0.004;
const LON_MIN:  f64 = 28.95;
const LON_STEP: f64 = 0.005;

fn is_arterial(i: usize) -> bool {
    i % 4 == 0
}

pub fn build_grid(canvas: f32) -> SpatialResult<RoadGraph> {
    let mut b = RoadGraphBuilder::with_capacity(ROWS * COLS, 4 * ROWS * COLS)
        .projection(Projection::FitCanvas(canvas));
    let mut nodes = vec![NodeId::INVALID; ROWS * COLS];

    for row in 0..ROWS {
        for col in 0..COLS {
            let geo = GeoPoint::new(LAT_MIN + row as f64 * LAT_STEP, LON_MIN + col as f64 * LON_STEP);
            nodes[row * COLS + col] = if is_arterial(row) && is_arterial(col) {
                b.add_signal_node(geo)
            } else {
                b.add_node(geo)
            };
        }
    }

    // East-west.
    for row in 0..ROWS {
        for col in 0..COLS - 1 {
            let (a, c) = (nodes[row * COLS + col], nodes[row * COLS + col + 1]);
            street(&mut b, a, c, is_arterial(row), row % 2 == 0);
        }
    }
    // North-south.
    for col in 0..COLS {
        for row in 0..ROWS - 1 {
            let (a, c) = (nodes[row * COLS + col], nodes[(row + 1) * COLS + col]);
            street(&mut b, a, c, is_arterial(col), col % 2 == 1);
        }
    }

    b.build()
}

fn street(b: &mut RoadGraphBuilder, a: NodeId, c: NodeId, arterial: bool, forward: bool) {
    if arterial {
        let attrs = EdgeAttrs { class: RoadClass::Major, ..EdgeAttrs::weighted(1.0) };
        b.add_road(a, c, attrs);
    } else {
        let attrs = EdgeAttrs { class: RoadClass::Minor, ..EdgeAttrs::weighted(1.5) };
        if forward {
            b.add_directed_edge(a, c, attrs);
        } else {
            b.add_directed_edge(c, a, attrs);
        }
    }
}
