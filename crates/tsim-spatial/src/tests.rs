//! Unit tests for tsim-spatial.
//!
//! All tests use hand-built graphs laid out directly in render units.

#[cfg(test)]
mod helpers {
    use tsim_core::{GeoPoint, NodeId};
    use crate::{EdgeAttrs, Projection, RoadGraph, RoadGraphBuilder};

    /// Five-node network in render units (x = lon, y = lat).
    ///
    /// ```text
    ///   0 ── 1 ── 2
    ///   │         │
    ///   3 ─────── 4
    /// ```
    ///
    /// Two-way roads: 0-1, 1-2, 2-4 (weight 10 each), 0-3 (weight 50),
    /// 3-4 (weight 10).
    ///
    /// 0→4 by hops: 0→3→4 (2 hops).  By weight: 0→1→2→4 (30 vs 60).
    pub fn grid() -> (RoadGraph, [NodeId; 5]) {
        let mut b = RoadGraphBuilder::new().projection(Projection::Identity);
        let n0 = b.add_node(GeoPoint::new(0.0, 0.0));
        let n1 = b.add_node(GeoPoint::new(0.0, 100.0));
        let n2 = b.add_signal_node(GeoPoint::new(0.0, 200.0));
        let n3 = b.add_node(GeoPoint::new(100.0, 0.0));
        let n4 = b.add_node(GeoPoint::new(100.0, 200.0));

        b.add_road(n0, n1, EdgeAttrs::weighted(10.0));
        b.add_road(n1, n2, EdgeAttrs::weighted(10.0));
        b.add_road(n2, n4, EdgeAttrs::weighted(10.0));
        b.add_road(n0, n3, EdgeAttrs::weighted(50.0));
        b.add_road(n3, n4, EdgeAttrs::weighted(10.0));

        (b.build().unwrap(), [n0, n1, n2, n3, n4])
    }

    /// Directed 4-cycle 0→1→2→3→0.
    pub fn cycle() -> RoadGraph {
        let mut b = RoadGraphBuilder::new().projection(Projection::Identity);
        let ids: Vec<_> = (0..4)
            .map(|i| b.add_node(GeoPoint::new(0.0, i as f64 * 10.0)))
            .collect();
        for i in 0..4 {
            b.add_directed_edge(ids[i], ids[(i + 1) % 4], EdgeAttrs::default());
        }
        b.build().unwrap()
    }
}

// ── Builder & graph structure ─────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use tsim_core::{GeoPoint, NodeId};
    use crate::{ComponentFilter, EdgeAttrs, Projection, RoadGraphBuilder, SpatialError};

    #[test]
    fn empty_build() {
        let g = RoadGraphBuilder::new().build().unwrap();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(g.is_empty());
    }

    #[test]
    fn degrees_and_csr() {
        let (g, [n0, n1, n2, n3, n4]) = super::helpers::grid();
        assert_eq!(g.edge_count(), 10);
        for n in [n0, n1, n2, n3, n4] {
            assert_eq!(g.out_degree(n), 2);
            assert_eq!(g.in_degree(n), 2);
            assert_eq!(g.degree(n), 4);
            for e in g.out_edges(n) {
                assert_eq!(g.edge_from[e.index()], n);
            }
        }
        let mut succ: Vec<_> = g.successors(n1).collect();
        succ.sort();
        assert_eq!(succ, vec![n0, n2]);
    }

    #[test]
    fn has_edge_respects_direction() {
        let g = super::helpers::cycle();
        assert!(g.has_edge(NodeId(0), NodeId(1)));
        assert!(!g.has_edge(NodeId(1), NodeId(0)));
        assert!(!g.has_edge(NodeId(0), NodeId(2)));
        assert!(!g.has_edge(NodeId(99), NodeId(0)));
    }

    #[test]
    fn signal_tags_survive_build() {
        let (g, [_, _, n2, _, _]) = super::helpers::grid();
        assert_eq!(g.signal_tagged_nodes().collect::<Vec<_>>(), vec![n2]);
    }

    #[test]
    fn edge_to_unknown_node_rejected() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        b.add_directed_edge(a, NodeId(5), EdgeAttrs::default());
        assert!(matches!(b.build(), Err(SpatialError::NodeNotFound(NodeId(5)))));
    }

    #[test]
    fn weak_filter_keeps_largest_and_reindexes() {
        let mut b = RoadGraphBuilder::new().projection(Projection::Identity);
        let island = b.add_node(GeoPoint::new(0.0, 0.0));
        let a = b.add_node(GeoPoint::new(0.0, 10.0));
        let c = b.add_signal_node(GeoPoint::new(0.0, 20.0));
        let d = b.add_node(GeoPoint::new(0.0, 30.0));
        b.add_directed_edge(a, c, EdgeAttrs::default());
        b.add_directed_edge(d, c, EdgeAttrs::default());
        let _ = island;

        let g = b.build().unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        // Old 1,2,3 become 0,1,2 in order.
        assert_eq!(g.position(NodeId(0)).x, 10.0);
        assert!(g.has_edge(NodeId(0), NodeId(1)));
        assert!(g.has_edge(NodeId(2), NodeId(1)));
        assert_eq!(g.signal_tagged_nodes().collect::<Vec<_>>(), vec![NodeId(1)]);
    }

    #[test]
    fn strong_filter_drops_one_way_tail() {
        let mut b = RoadGraphBuilder::new()
            .projection(Projection::Identity)
            .component_filter(ComponentFilter::Strong);
        let tail = b.add_node(GeoPoint::new(0.0, 0.0));
        let x = b.add_node(GeoPoint::new(0.0, 10.0));
        let y = b.add_node(GeoPoint::new(0.0, 20.0));
        b.add_directed_edge(tail, x, EdgeAttrs::default());
        b.add_road(x, y, EdgeAttrs::default());

        let g = b.build().unwrap();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 2);

        let weak = {
            let mut b = RoadGraphBuilder::new().component_filter(ComponentFilter::Weak);
            let tail = b.add_node(GeoPoint::new(0.0, 0.0));
            let x = b.add_node(GeoPoint::new(0.0, 10.0));
            b.add_directed_edge(tail, x, EdgeAttrs::default());
            b.build().unwrap()
        };
        assert_eq!(weak.node_count(), 2);
    }

    #[test]
    fn all_filter_keeps_isolated_nodes() {
        let mut b = RoadGraphBuilder::new().component_filter(ComponentFilter::All);
        b.add_node(GeoPoint::new(0.0, 0.0));
        b.add_node(GeoPoint::new(1.0, 1.0));
        assert_eq!(b.build().unwrap().node_count(), 2);
    }

    #[test]
    fn fit_canvas_projection() {
        let mut b = RoadGraphBuilder::new().projection(Projection::FitCanvas(800.0));
        let a = b.add_node(GeoPoint::new(40.0, 30.0));
        let c = b.add_node(GeoPoint::new(41.0, 31.0));
        b.add_road(a, c, EdgeAttrs::default());
        let g = b.build().unwrap();
        assert_eq!(g.position(a).x, 0.0);
        assert_eq!(g.position(c).x, 800.0);
        assert_eq!(g.position(c).y, 800.0);
    }

    #[test]
    fn parallel_lanes_keep_insertion_order() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        b.add_directed_edge(a, c, EdgeAttrs { lane: Some(0), ..EdgeAttrs::default() });
        b.add_directed_edge(a, c, EdgeAttrs { lane: Some(1), ..EdgeAttrs::default() });
        let g = b.build().unwrap();
        let e = g.find_edge(a, c).unwrap();
        assert_eq!(g.edge_lane[e.index()], Some(0));
        assert_eq!(g.out_degree(a), 2);
    }
}

// ── Shortest paths ────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use tsim_core::{GeoPoint, NodeId};
    use crate::{ComponentFilter, EdgeAttrs, RoadGraphBuilder, Router, ShortestPath, SpatialError};

    #[test]
    fn same_node_is_single_element_path() {
        let (g, [n0, ..]) = super::helpers::grid();
        assert_eq!(ShortestPath::hops().shortest_path(&g, n0, n0).unwrap(), vec![n0]);
    }

    #[test]
    fn hop_count_prefers_fewer_edges() {
        let (g, [n0, _, _, n3, n4]) = super::helpers::grid();
        let path = ShortestPath::hops().shortest_path(&g, n0, n4).unwrap();
        assert_eq!(path, vec![n0, n3, n4]);
    }

    #[test]
    fn weighted_prefers_lighter_edges() {
        let (g, [n0, n1, n2, _, n4]) = super::helpers::grid();
        let path = ShortestPath::weighted().shortest_path(&g, n0, n4).unwrap();
        assert_eq!(path, vec![n0, n1, n2, n4]);
    }

    #[test]
    fn consecutive_pairs_are_edges() {
        let g = super::helpers::cycle();
        let path = ShortestPath::hops().shortest_path(&g, NodeId(1), NodeId(0)).unwrap();
        assert_eq!(path, vec![NodeId(1), NodeId(2), NodeId(3), NodeId(0)]);
        for w in path.windows(2) {
            assert!(g.has_edge(w[0], w[1]));
        }
    }

    #[test]
    fn one_way_return_has_no_path() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        b.add_directed_edge(a, c, EdgeAttrs::default());
        let g = b.build().unwrap();

        assert!(ShortestPath::hops().shortest_path(&g, a, c).is_ok());
        assert!(matches!(
            ShortestPath::hops().shortest_path(&g, c, a),
            Err(SpatialError::NoPathFound { .. })
        ));
    }

    #[test]
    fn disconnected_has_no_path() {
        let mut b = RoadGraphBuilder::new().component_filter(ComponentFilter::All);
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(1.0, 0.0));
        let g = b.build().unwrap();
        assert!(matches!(
            ShortestPath::weighted().shortest_path(&g, a, c),
            Err(SpatialError::NoPathFound { .. })
        ));
    }

    #[test]
    fn unknown_node_rejected() {
        let g = super::helpers::cycle();
        assert!(matches!(
            ShortestPath::hops().shortest_path(&g, NodeId(0), NodeId(40)),
            Err(SpatialError::NodeNotFound(NodeId(40)))
        ));
    }
}
