//! Node-based graph storage (C1).
//!
//! # Data layout
//!
//! A CSR-like arena with **tombstones**, not a pointer graph: one `Vec` of
//! edge slots, where each node owns a contiguous `(first_edge, edge_count)`
//! range. Unlike a plain static CSR, the array carries spare capacity after
//! each node's range (tombstoned slots, `target == NodeId::INVALID`) so that
//! `insert_edge` can usually append in place. `GraphCompressor` (C4) is the
//! reason this needs to support insertion/deletion after `build` — compacted
//! chains rewrite edge targets and delete the collapsed interior edges.
//!
//! ```text
//! edges[ node_range[n].first_edge .. +edge_count ]   — live edges of n
//! edges[ ... trailing tombstones ... ]               — spare capacity
//! ```
//!
//! `insert_edge` reuses a trailing tombstone when one is available;
//! otherwise it relocates the node's whole block to the end of the array
//! (with fresh headroom) and tombstones the vacated slots. This invalidates
//! only outgoing-edge iterators for the node being inserted into — every
//! other node's range is untouched.

use routing_core::{EdgeBasedNodeId, EdgeId, FixedPoint, LaneDescriptionId, NameId, NodeId};

use crate::error::{KernelError, KernelResult};
use crate::types::TravelMode;

/// Fraction of a node's edge count reserved as spare (tombstoned) capacity
/// on relocation, and the layout used at `build` time.
const HEADROOM_NUMERATOR: u32 = 1;
const HEADROOM_DENOMINATOR: u32 = 5; // 20%

// ── Edge data ─────────────────────────────────────────────────────────────────

/// Per-edge attributes of a node-based edge (spec §3 `NodeBasedEdge`).
#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct NodeBasedEdgeData {
    pub weight: u32,
    pub forward: bool,
    pub backward: bool,
    pub name_id: NameId,
    pub road_class: i16,
    pub roundabout: bool,
    pub access_restricted: bool,
    pub ignore_for_snapping: bool,
    pub contraflow: bool,
    pub is_split: bool,
    pub travel_mode: TravelMode,
    pub lane_description_id: LaneDescriptionId,
    /// Filled in by `EdgeBasedGraphFactory` (C5) once this edge is reified
    /// as an edge-based node; `EdgeBasedNodeId::INVALID` until then.
    pub edge_based_node_id: EdgeBasedNodeId,
}

impl NodeBasedEdgeData {
    /// Two edges can be merged by `GraphCompressor` (C4 step 3) only if they
    /// agree on every field that changes a router's behavior: direction,
    /// name, travel mode, roundabout-ness, snapping eligibility, contraflow,
    /// and access restriction. Weight and lane data are *not* compared here
    /// — they are explicitly combined/selected by the compressor.
    pub fn is_compatible_with(&self, other: &NodeBasedEdgeData) -> bool {
        self.forward == other.forward
            && self.backward == other.backward
            && self.name_id == other.name_id
            && self.travel_mode == other.travel_mode
            && self.roundabout == other.roundabout
            && self.ignore_for_snapping == other.ignore_for_snapping
            && self.contraflow == other.contraflow
            && self.access_restricted == other.access_restricted
    }

    /// Swap forward/backward, used when an undirected input edge is
    /// inserted as a pair of directed ones.
    pub fn swapped_direction(mut self) -> Self {
        std::mem::swap(&mut self.forward, &mut self.backward);
        self
    }
}

#[derive(Copy, Clone)]
struct EdgeSlot {
    target: NodeId,
    data: NodeBasedEdgeData,
}

impl EdgeSlot {
    fn tombstone() -> Self {
        EdgeSlot {
            target: NodeId::INVALID,
            data: NodeBasedEdgeData {
                weight: 0,
                forward: false,
                backward: false,
                name_id: NameId::INVALID,
                road_class: 0,
                roundabout: false,
                access_restricted: false,
                ignore_for_snapping: false,
                contraflow: false,
                is_split: false,
                travel_mode: TravelMode::Inaccessible,
                lane_description_id: LaneDescriptionId::INVALID,
                edge_based_node_id: EdgeBasedNodeId::INVALID,
            },
        }
    }
}

#[derive(Copy, Clone)]
struct NodeRange {
    first_edge: u32,
    edge_count: u32,
}

// ── NodeBasedGraph ──────────────────────────────────────────────────────────────

/// Mutable node-based road graph: CSR-with-tombstones adjacency plus node
/// positions. Construct via [`NodeBasedGraphBuilder`]; mutate in place with
/// [`insert_edge`](Self::insert_edge) / [`delete_edge`](Self::delete_edge)
/// (used by `GraphCompressor`, C4).
pub struct NodeBasedGraph {
    node_pos: Vec<FixedPoint>,
    ranges: Vec<NodeRange>,
    edges: Vec<EdgeSlot>,
}

impl NodeBasedGraph {
    // ── Dimensions ──────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    /// Number of *live* (non-tombstoned) edges.
    pub fn edge_count(&self) -> usize {
        self.ranges.iter().map(|r| r.edge_count as usize).sum()
    }

    pub fn node_position(&self, n: NodeId) -> FixedPoint {
        self.node_pos[n.index()]
    }

    // ── Traversal ───────────────────────────────────────────────────────────

    #[inline]
    pub fn out_degree(&self, n: NodeId) -> usize {
        self.ranges[n.index()].edge_count as usize
    }

    #[inline]
    pub fn begin_edges(&self, n: NodeId) -> EdgeId {
        EdgeId(self.ranges[n.index()].first_edge)
    }

    #[inline]
    pub fn end_edges(&self, n: NodeId) -> EdgeId {
        let r = self.ranges[n.index()];
        EdgeId(r.first_edge + r.edge_count)
    }

    #[inline]
    pub fn out_edges(&self, n: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.begin_edges(n).0;
        let end = self.end_edges(n).0;
        (start..end).map(EdgeId)
    }

    #[inline]
    pub fn target(&self, e: EdgeId) -> NodeId {
        self.edges[e.index()].target
    }

    #[inline]
    pub fn set_target(&mut self, e: EdgeId, target: NodeId) {
        self.edges[e.index()].target = target;
    }

    #[inline]
    pub fn edge_data(&self, e: EdgeId) -> &NodeBasedEdgeData {
        &self.edges[e.index()].data
    }

    #[inline]
    pub fn edge_data_mut(&mut self, e: EdgeId) -> &mut NodeBasedEdgeData {
        &mut self.edges[e.index()].data
    }

    #[inline]
    pub fn is_dummy(&self, e: EdgeId) -> bool {
        self.edges[e.index()].target == NodeId::INVALID
    }

    /// Linear scan of `from`'s adjacency; `None` on miss.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.out_edges(from).find(|&e| self.target(e) == to)
    }

    /// `find_edge(u, v)` or, failing that, `find_edge(v, u)`.
    pub fn find_edge_in_either_direction(&self, u: NodeId, v: NodeId) -> Option<EdgeId> {
        self.find_edge(u, v).or_else(|| self.find_edge(v, u))
    }

    // ── Mutation (used by GraphCompressor, C4) ───────────────────────────────

    /// Append an edge to `from`'s adjacency. Reuses a trailing tombstone
    /// when available; otherwise relocates `from`'s block to the end of the
    /// array with fresh headroom, tombstoning the vacated slots. Only
    /// outgoing-edge iterators for `from` are invalidated.
    pub fn insert_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        data: NodeBasedEdgeData,
    ) -> KernelResult<EdgeId> {
        let range = self.ranges[from.index()];
        let trailing = range.first_edge + range.edge_count;

        if (trailing as usize) < self.edges.len() && self.edges[trailing as usize].target == NodeId::INVALID {
            self.edges[trailing as usize] = EdgeSlot { target: to, data };
            self.ranges[from.index()].edge_count += 1;
            return Ok(EdgeId(trailing));
        }

        // Relocate the whole block to the end of the array with headroom.
        let old_first = range.first_edge;
        let old_count = range.edge_count;
        let new_count = old_count + 1;
        let headroom = (new_count * HEADROOM_NUMERATOR / HEADROOM_DENOMINATOR).max(1);

        let new_first = self.edges.len();
        if new_first + (new_count + headroom) as usize > u32::MAX as usize {
            return Err(KernelError::ResourceExhaustion(
                "node-based edge id space exhausted".to_string(),
            ));
        }

        for i in 0..old_count {
            let slot = self.edges[(old_first + i) as usize];
            self.edges.push(slot);
        }
        let new_edge_index = self.edges.len();
        self.edges.push(EdgeSlot { target: to, data });
        for _ in 0..(headroom - 1) {
            self.edges.push(EdgeSlot::tombstone());
        }

        for i in 0..old_count {
            self.edges[(old_first + i) as usize] = EdgeSlot::tombstone();
        }

        self.ranges[from.index()] = NodeRange { first_edge: new_first as u32, edge_count: new_count };
        Ok(EdgeId(new_edge_index as u32))
    }

    /// Remove edge `e` from `src`'s adjacency: swap with the last live edge
    /// in `src`'s range, tombstone the freed tail slot.
    pub fn delete_edge(&mut self, src: NodeId, e: EdgeId) {
        let range = self.ranges[src.index()];
        debug_assert!(range.edge_count > 0);
        let last = range.first_edge + range.edge_count - 1;
        self.edges[e.index()] = self.edges[last as usize];
        self.edges[last as usize] = EdgeSlot::tombstone();
        self.ranges[src.index()].edge_count -= 1;
    }
}

// ── NodeBasedGraphBuilder ────────────────────────────────────────────────────────

struct RawEdge {
    from: NodeId,
    to: NodeId,
    data: NodeBasedEdgeData,
}

/// Construct a [`NodeBasedGraph`] from unordered directed edges.
pub struct NodeBasedGraphBuilder {
    nodes: Vec<FixedPoint>,
    raw_edges: Vec<RawEdge>,
}

impl NodeBasedGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self { nodes: Vec::with_capacity(nodes), raw_edges: Vec::with_capacity(edges) }
    }

    pub fn add_node(&mut self, pos: FixedPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a single directed edge. Rejects self-loops and non-positive
    /// weight / no-direction edges as `InputCorruption` (spec §3 invariant,
    /// §8 "Self-loop in node-based input: rejected during graph
    /// construction").
    pub fn add_directed_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        data: NodeBasedEdgeData,
    ) -> KernelResult<()> {
        if from == to {
            return Err(KernelError::InputCorruption(format!(
                "self-loop at node {from} rejected"
            )));
        }
        if data.weight < 1 {
            return Err(KernelError::InputCorruption(format!(
                "edge {from}->{to} has non-positive weight {}",
                data.weight
            )));
        }
        if !data.forward && !data.backward {
            return Err(KernelError::InputCorruption(format!(
                "edge {from}->{to} has neither forward nor backward direction"
            )));
        }
        self.raw_edges.push(RawEdge { from, to, data });
        Ok(())
    }

    /// Convenience: add both directions of an undirected road segment.
    pub fn add_road(
        &mut self,
        a: NodeId,
        b: NodeId,
        data: NodeBasedEdgeData,
    ) -> KernelResult<()> {
        self.add_directed_edge(a, b, data)?;
        self.add_directed_edge(b, a, data.swapped_direction())
    }

    /// Sort edges by source, lay out CSR ranges with ~20% trailing headroom
    /// per node, and build the graph.
    pub fn build(self) -> KernelResult<NodeBasedGraph> {
        let node_count = self.nodes.len();
        let mut raw = self.raw_edges;

        #[cfg(feature = "parallel")]
        {
            use rayon::slice::ParallelSliceMut;
            raw.par_sort_unstable_by_key(|e| e.from.0);
        }
        #[cfg(not(feature = "parallel"))]
        {
            raw.sort_unstable_by_key(|e| e.from.0);
        }

        // First pass: counts per node.
        let mut counts = vec![0u32; node_count];
        for e in &raw {
            counts[e.from.index()] += 1;
        }

        // Lay out blocks with headroom; compute total capacity and ranges.
        let mut ranges = Vec::with_capacity(node_count);
        let mut total_capacity: usize = 0;
        for &count in &counts {
            let headroom = (count * HEADROOM_NUMERATOR / HEADROOM_DENOMINATOR).max(1);
            ranges.push(NodeRange { first_edge: total_capacity as u32, edge_count: count });
            total_capacity += (count + headroom) as usize;
        }
        if total_capacity > u32::MAX as usize {
            return Err(KernelError::ResourceExhaustion(
                "node-based edge id space exhausted at build time".to_string(),
            ));
        }

        let mut edges = vec![EdgeSlot::tombstone(); total_capacity];
        let mut cursor = vec![0u32; node_count]; // offset within each node's live edges
        for e in &raw {
            let range = ranges[e.from.index()];
            let idx = range.first_edge + cursor[e.from.index()];
            edges[idx as usize] = EdgeSlot { target: e.to, data: e.data };
            cursor[e.from.index()] += 1;
        }

        Ok(NodeBasedGraph { node_pos: self.nodes, ranges, edges })
    }
}

impl Default for NodeBasedGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
