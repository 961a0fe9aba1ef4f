//! Road graph representation and builder.
//!
//! # Data layout
//!
//! Outgoing edges are stored in **Compressed Sparse Row (CSR)** form.  The
//! outgoing edges of `NodeId n` occupy
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays are sorted by source node (stable, so parallel lanes keep
//! their insertion order) and indexed by `EdgeId`.
//!
//! # Ingestion
//!
//! [`RoadGraphBuilder`] takes geographic nodes and directed edges, keeps only
//! the largest connected component, re-indexes the surviving nodes densely
//! and projects every node onto the render canvas.

use tracing::debug;

use tsim_core::{EdgeId, GeoPoint, NodeId, RenderPoint, RenderProjection, RoadClass};

use crate::{SpatialError, SpatialResult};

// ── Edge attributes ───────────────────────────────────────────────────────────

/// Optional per-edge data supplied by the graph provider.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EdgeAttrs {
    /// Path length used by weighted shortest paths.  Missing weights count
    /// as 1.
    pub weight: Option<f32>,
    /// Lane discriminator for parallel edges between the same nodes.
    pub lane:   Option<u8>,
    pub class:  RoadClass,
}

impl EdgeAttrs {
    pub fn weighted(weight: f32) -> Self {
        Self { weight: Some(weight), ..Self::default() }
    }
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Immutable directed road graph in CSR format.
///
/// All fields are `pub` for indexed access on hot paths.  Construct through
/// [`RoadGraphBuilder`].
#[derive(Debug, Clone)]
pub struct RoadGraph {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Render-space position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<RenderPoint>,

    /// Geographic position each node was ingested with.
    pub node_geo: Vec<GeoPoint>,

    /// `true` for intersections the provider tagged as signalised.
    pub node_signal: Vec<bool>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    pub edge_from:   Vec<NodeId>,
    pub edge_to:     Vec<NodeId>,
    pub edge_weight: Vec<Option<f32>>,
    pub edge_lane:   Vec<Option<u8>>,
    pub edge_class:  Vec<RoadClass>,

    node_in_degree: Vec<u32>,
}

impl RoadGraph {
    /// A graph with no nodes.  Every path query against it fails.
    pub fn empty() -> Self {
        Self {
            node_pos:       Vec::new(),
            node_geo:       Vec::new(),
            node_signal:    Vec::new(),
            node_out_start: vec![0],
            edge_from:      Vec::new(),
            edge_to:        Vec::new(),
            edge_weight:    Vec::new(),
            edge_lane:      Vec::new(),
            edge_class:     Vec::new(),
            node_in_degree: Vec::new(),
        }
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    // ── Enumeration ───────────────────────────────────────────────────────

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.node_count() as u32).map(NodeId)
    }

    /// Every directed edge as `(id, from, to)`.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, NodeId, NodeId)> + '_ {
        self.edge_from
            .iter()
            .zip(&self.edge_to)
            .enumerate()
            .map(|(i, (&from, &to))| (EdgeId(i as u32), from, to))
    }

    #[inline]
    pub fn position(&self, node: NodeId) -> RenderPoint {
        self.node_pos[node.index()]
    }

    #[inline]
    pub fn endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        (self.edge_from[edge.index()], self.edge_to[edge.index()])
    }

    /// Nodes the provider tagged as signalised, ascending.
    pub fn signal_tagged_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_signal
            .iter()
            .enumerate()
            .filter(|(_, tagged)| **tagged)
            .map(|(i, _)| NodeId(i as u32))
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Outgoing edges of `node` as a contiguous id range.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges(node).map(|e| self.edge_to[e.index()])
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    #[inline]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.node_in_degree[node.index()] as usize
    }

    /// In-degree plus out-degree.
    pub fn degree(&self, node: NodeId) -> usize {
        self.in_degree(node) + self.out_degree(node)
    }

    /// First edge from `from` to `to` in CSR order.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        if !self.contains_node(from) {
            return None;
        }
        self.out_edges(from).find(|e| self.edge_to[e.index()] == to)
    }

    #[inline]
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.find_edge(from, to).is_some()
    }

    /// Straight-line render length of an edge.
    pub fn render_length(&self, edge: EdgeId) -> f32 {
        let (from, to) = self.endpoints(edge);
        self.position(from).distance(self.position(to))
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Which part of the ingested graph survives `build()`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ComponentFilter {
    /// Keep every node.
    All,
    /// Largest weakly connected component.
    #[default]
    Weak,
    /// Largest strongly connected component.
    Strong,
}

/// How geographic positions become render positions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Projection {
    /// Linear rescale of the surviving extent into `[0, canvas]²`.
    FitCanvas(f32),
    /// Use `lon` as `x` and `lat` as `y` unchanged.  Handy for hand-built
    /// test graphs laid out directly in render units.
    Identity,
}

impl Default for Projection {
    fn default() -> Self {
        Projection::FitCanvas(800.0)
    }
}

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use tsim_core::GeoPoint;
/// use tsim_spatial::{EdgeAttrs, RoadGraphBuilder};
///
/// let mut b = RoadGraphBuilder::new();
/// let a = b.add_node(GeoPoint::new(40.76, 30.36));
/// let c = b.add_signal_node(GeoPoint::new(40.77, 30.37));
/// b.add_road(a, c, EdgeAttrs::weighted(120.0));
/// let g = b.build().unwrap();
/// assert_eq!(g.node_count(), 2);
/// assert_eq!(g.edge_count(), 2);
/// ```
pub struct RoadGraphBuilder {
    nodes:      Vec<RawNode>,
    raw_edges:  Vec<RawEdge>,
    filter:     ComponentFilter,
    projection: Projection,
}

struct RawNode {
    geo:    GeoPoint,
    signal: bool,
}

struct RawEdge {
    from:  NodeId,
    to:    NodeId,
    attrs: EdgeAttrs,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes:      Vec::new(),
            raw_edges:  Vec::new(),
            filter:     ComponentFilter::default(),
            projection: Projection::default(),
        }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
            ..Self::new()
        }
    }

    pub fn component_filter(mut self, filter: ComponentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Add a node and return its provisional `NodeId` (sequential from 0).
    ///
    /// Ids are re-assigned by `build()` if component filtering drops nodes.
    pub fn add_node(&mut self, geo: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(RawNode { geo, signal: false });
        id
    }

    /// Add a node the provider tagged as a signalised intersection.
    pub fn add_signal_node(&mut self, geo: GeoPoint) -> NodeId {
        let id = self.add_node(geo);
        self.nodes[id.index()].signal = true;
        id
    }

    /// Mark an existing node as signalised.  Unknown ids are ignored.
    pub fn tag_signal(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(node.index()) {
            n.signal = true;
        }
    }

    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, attrs: EdgeAttrs) {
        self.raw_edges.push(RawEdge { from, to, attrs });
    }

    /// Add edges in both directions with the same attributes.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, attrs: EdgeAttrs) {
        self.add_directed_edge(a, b, attrs);
        self.add_directed_edge(b, a, attrs);
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Validate, filter to the configured component, project and pack into
    /// CSR form.
    pub fn build(self) -> SpatialResult<RoadGraph> {
        let n = self.nodes.len();
        for e in &self.raw_edges {
            for node in [e.from, e.to] {
                if node.index() >= n {
                    return Err(SpatialError::NodeNotFound(node));
                }
            }
        }

        // ── Component filter → dense re-indexing ──────────────────────────
        let keep = match self.filter {
            ComponentFilter::All    => vec![true; n],
            ComponentFilter::Weak   => largest(&weak_components(n, &self.raw_edges)),
            ComponentFilter::Strong => largest(&strong_components(n, &self.raw_edges)),
        };
        let mut remap = vec![NodeId::INVALID; n];
        let mut next = 0u32;
        for (old, kept) in keep.iter().enumerate() {
            if *kept {
                remap[old] = NodeId(next);
                next += 1;
            }
        }
        let node_count = next as usize;
        if node_count < n {
            debug!(dropped = n - node_count, kept = node_count, "component filter dropped nodes");
        }

        let nodes: Vec<RawNode> = self
            .nodes
            .into_iter()
            .zip(&keep)
            .filter_map(|(node, kept)| kept.then_some(node))
            .collect();

        let mut raw: Vec<RawEdge> = self
            .raw_edges
            .into_iter()
            .filter_map(|e| {
                let from = remap[e.from.index()];
                let to = remap[e.to.index()];
                (from.is_valid() && to.is_valid()).then_some(RawEdge { from, to, attrs: e.attrs })
            })
            .collect();

        // Stable sort keeps parallel lanes in insertion order.
        raw.sort_by_key(|e| e.from.0);

        let edge_from:   Vec<NodeId>      = raw.iter().map(|e| e.from).collect();
        let edge_to:     Vec<NodeId>      = raw.iter().map(|e| e.to).collect();
        let edge_weight: Vec<Option<f32>> = raw.iter().map(|e| e.attrs.weight).collect();
        let edge_lane:   Vec<Option<u8>>  = raw.iter().map(|e| e.attrs.lane).collect();
        let edge_class:  Vec<RoadClass>   = raw.iter().map(|e| e.attrs.class).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        let mut node_in_degree = vec![0u32; node_count];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
            node_in_degree[e.to.index()] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, raw.len());

        // ── Projection (fitted to the surviving extent only) ──────────────
        let node_geo: Vec<GeoPoint> = nodes.iter().map(|n| n.geo).collect();
        let node_pos: Vec<RenderPoint> = match self.projection {
            Projection::FitCanvas(canvas) => {
                let proj = RenderProjection::fit(node_geo.iter().copied(), canvas);
                node_geo.iter().map(|&g| proj.project(g)).collect()
            }
            Projection::Identity => node_geo
                .iter()
                .map(|g| RenderPoint::new(g.lon as f32, g.lat as f32))
                .collect(),
        };
        let node_signal = nodes.iter().map(|n| n.signal).collect();

        Ok(RoadGraph {
            node_pos,
            node_geo,
            node_signal,
            node_out_start,
            edge_from,
            edge_to,
            edge_weight,
            edge_lane,
            edge_class,
            node_in_degree,
        })
    }
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ── Component helpers ─────────────────────────────────────────────────────────

/// Mask of the largest component.  Ties go to the component containing the
/// lowest node index.
fn largest(component: &[usize]) -> Vec<bool> {
    let mut sizes = vec![0usize; component.len()];
    for &c in component {
        sizes[c] += 1;
    }
    let mut best: Option<usize> = None;
    for &c in component {
        if best.is_none_or(|b| sizes[c] > sizes[b]) {
            best = Some(c);
        }
    }
    match best {
        Some(b) => component.iter().map(|&c| c == b).collect(),
        None => Vec::new(),
    }
}

/// Weakly connected component label per node (union-find).
fn weak_components(n: usize, edges: &[RawEdge]) -> Vec<usize> {
    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    let mut parent: Vec<usize> = (0..n).collect();
    for e in edges {
        let a = find(&mut parent, e.from.index());
        let b = find(&mut parent, e.to.index());
        if a != b {
            parent[a.max(b)] = a.min(b);
        }
    }
    (0..n).map(|i| find(&mut parent, i)).collect()
}

/// Strongly connected component label per node (iterative Tarjan).
fn strong_components(n: usize, edges: &[RawEdge]) -> Vec<usize> {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for e in edges {
        adj[e.from.index()].push(e.to.index());
    }

    const UNVISITED: usize = usize::MAX;
    let mut index = vec![UNVISITED; n];
    let mut low = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut comp = vec![UNVISITED; n];
    let mut next_index = 0usize;
    let mut next_comp = 0usize;
    // (node, position of the next child to visit)
    let mut call: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        index[root] = next_index;
        low[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;
        call.push((root, 0));

        while let Some(&(v, child)) = call.last() {
            if child < adj[v].len() {
                if let Some(top) = call.last_mut() {
                    top.1 += 1;
                }
                let w = adj[v][child];
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    low[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    call.push((w, 0));
                } else if on_stack[w] {
                    low[v] = low[v].min(index[w]);
                }
                continue;
            }

            call.pop();
            if low[v] == index[v] {
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    comp[w] = next_comp;
                    if w == v {
                        break;
                    }
                }
                next_comp += 1;
            }
            if let Some(&(parent, _)) = call.last() {
                low[parent] = low[parent].min(low[v]);
            }
        }
    }
    comp
}
