//! Turn expansion: node-based graph → edge-based graph (C5).
//!
//! Grounded on `original_source/` OSRM's edge-based-graph factory idea
//! (renumber surviving edges as nodes, enumerate turns as edges) as
//! distilled into spec §4.5; the incoming/outgoing pairing in step 3 and
//! the representative-coordinate walk in the turn-angle computation are
//! ported from the same source's turn-angle calculation.

use std::collections::{HashMap, HashSet};

use routing_core::{
    BearingClassId, BuildConfig, BuildObserver, ComponentId, EdgeBasedNodeId, EdgeId, EntryClassId,
    FixedPoint, NameId, NodeId, PackedGeometryId, SkipReason,
};

use crate::error::{KernelError, KernelResult};
use crate::geometry::CompressedEdgeContainer;
use crate::node_graph::NodeBasedGraph;
use crate::restriction::RestrictionMap;
use crate::turn_penalty::TurnPenaltySource;
use crate::types::TravelMode;

/// One directional traversal of a surviving node-based edge — the *node* of
/// the downstream routing graph (spec §3 `EdgeBasedNode`).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EdgeBasedNode {
    pub id: EdgeBasedNodeId,
    pub u: NodeId,
    pub v: NodeId,
    pub name_id: NameId,
    pub packed_geometry_id: PackedGeometryId,
    /// Filled in later by `SCCDriver` (C7); `ComponentId::INVALID` until then.
    pub component_id: ComponentId,
    /// `true` if `component_id`'s component has fewer members than the
    /// configured tiny-component threshold. Filled in alongside
    /// `component_id`.
    pub belongs_to_tiny_component: bool,
    pub forward_segment_id: EdgeBasedNodeId,
    pub reverse_segment_id: EdgeBasedNodeId,
    pub travel_mode: TravelMode,
    pub bearing_class_id: BearingClassId,
    pub entry_class_id: EntryClassId,
}

/// A permitted turn `(u, v, w)`, reified as an edge between the edge-based
/// nodes for `u->v` and `v->w` (spec §3 `EdgeBasedEdge`).
#[derive(Copy, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EdgeBasedEdge {
    pub source: EdgeBasedNodeId,
    pub target: EdgeBasedNodeId,
    pub weight: u32,
    pub forward: bool,
    pub backward: bool,
}

/// One original (uncompressed) sub-segment of an edge-based node's packed
/// geometry, indexed by `SpatialIndex` (C6) for nearest-neighbor snapping.
#[derive(Copy, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EdgeBasedNodeSegment {
    pub forward_segment_id: EdgeBasedNodeId,
    pub reverse_segment_id: EdgeBasedNodeId,
    pub u: NodeId,
    pub v: NodeId,
    pub position_in_geometry: u32,
    /// Routing weight of this one hop, `u -> v` and `v -> u`, so a snap can
    /// prorate by fractional position without the spatial index needing a
    /// reference to the geometry container (spec §4.6 "PhantomNode").
    pub sub_segment_forward_weight: u32,
    pub sub_segment_reverse_weight: u32,
    pub is_startpoint: bool,
}

/// The discretized, sorted set of outgoing bearings available at a
/// node-based intersection (spec §4.5 step 4).
#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct BearingClass {
    /// Degrees, discretized to the nearest whole degree, sorted ascending.
    pub bearings: Vec<u16>,
}

/// Which bearings of a node's `BearingClass` were reachable from one
/// particular incoming edge.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct EntryClass {
    pub allowed_mask: u64,
}

/// Turn-rejection tallies, reported but never fatal (spec §7 `Skipped`).
#[derive(Default, Debug, Clone, Copy)]
pub struct SkipCounters {
    pub restricted: usize,
    pub u_turn: usize,
    pub barrier: usize,
    pub only_turn_mismatch: usize,
}

impl SkipCounters {
    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Restricted => self.restricted += 1,
            SkipReason::UTurn => self.u_turn += 1,
            SkipReason::Barrier => self.barrier += 1,
            SkipReason::OnlyTurnMismatch => self.only_turn_mismatch += 1,
        }
    }
}

/// Full output of a C5 pass.
pub struct EdgeBasedGraph {
    pub nodes: Vec<EdgeBasedNode>,
    pub edges: Vec<EdgeBasedEdge>,
    pub segments: Vec<EdgeBasedNodeSegment>,
    pub node_weights: Vec<u32>,
    pub bearing_classes: Vec<BearingClass>,
    pub entry_classes: Vec<EntryClass>,
    pub skip_counters: SkipCounters,
}

/// A node-based arc a barrier would steer straight through is anything
/// within this many degrees of perfectly straight.
const BARRIER_STRAIGHT_THRESHOLD_DEGREES: f64 = 35.0;

/// Degree step used to discretize bearings into a `BearingClass` (spec §4.5
/// step 4: "discretized to a fixed step").
const BEARING_DISCRETIZATION_STEP: i64 = 1;

pub struct EdgeBasedGraphFactory;

impl EdgeBasedGraphFactory {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        graph: &mut NodeBasedGraph,
        geometry: &mut CompressedEdgeContainer,
        restriction_map: &RestrictionMap,
        barrier_nodes: &HashSet<NodeId>,
        traffic_lights: &HashSet<NodeId>,
        config: &BuildConfig,
        turn_penalty: &dyn TurnPenaltySource,
        observer: &mut dyn BuildObserver,
    ) -> KernelResult<EdgeBasedGraph> {
        let node_count = graph.node_count();

        // ── Step 1: renumber every allowed directed edge ──────────────────
        let mut node_weights = Vec::new();
        for n in 0..node_count {
            let u = NodeId(n as u32);
            for e in graph.out_edges(u) {
                if !graph.edge_data(e).forward {
                    continue;
                }
                let id = EdgeBasedNodeId(node_weights.len() as u32);
                node_weights.push(graph.edge_data(e).weight);
                graph.edge_data_mut(e).edge_based_node_id = id;
            }
        }

        // ── Zip pass: one packed geometry per physical road ───────────────
        let mut packed_of: HashMap<EdgeId, PackedGeometryId> = HashMap::new();
        for n in 0..node_count {
            let u = NodeId(n as u32);
            for e in graph.out_edges(u) {
                if !graph.edge_data(e).forward || packed_of.contains_key(&e) {
                    continue;
                }
                let v = graph.target(e);
                let reverse = graph.find_edge(v, u).filter(|&re| graph.edge_data(re).forward);
                let packed_id = match reverse {
                    Some(re) => {
                        let id = geometry.zip_edges(e, re, u)?;
                        packed_of.insert(re, id);
                        id
                    }
                    None => geometry.pack_single(e, u)?,
                };
                packed_of.insert(e, packed_id);
            }
        }

        // ── Step 2: emit one EdgeBasedNode + its geometry segments per allowed direction ──
        let mut nodes = Vec::with_capacity(node_weights.len());
        let mut segments = Vec::new();

        for n in 0..node_count {
            let u = NodeId(n as u32);
            for e in graph.out_edges(u) {
                let data = *graph.edge_data(e);
                if !data.forward {
                    continue;
                }
                let v = graph.target(e);
                let id = data.edge_based_node_id;

                let reverse_edge = graph.find_edge(v, u).filter(|&re| graph.edge_data(re).forward);
                let reverse_id = reverse_edge.map(|re| graph.edge_data(re).edge_based_node_id);

                let Some(bucket) = geometry.get_bucket(e) else {
                    return Err(KernelError::InvariantViolation(format!(
                        "no geometry bucket for surviving edge {u}->{v}"
                    )));
                };
                let packed = packed_of.get(&e).map(|&id| geometry.get_packed(id));

                for (position, rec) in bucket.iter().enumerate() {
                    let seg_u = if position == 0 { u } else { bucket[position - 1].node };
                    let (fwd_w, rev_w) = packed
                        .map(|p| {
                            (
                                p.forward_weight[position + 1] - p.forward_weight[position],
                                p.reverse_weight[position] - p.reverse_weight[position + 1],
                            )
                        })
                        .unwrap_or((0, 0));
                    segments.push(EdgeBasedNodeSegment {
                        forward_segment_id: id,
                        reverse_segment_id: reverse_id.unwrap_or(EdgeBasedNodeId::INVALID),
                        u: seg_u,
                        v: rec.node,
                        position_in_geometry: position as u32,
                        sub_segment_forward_weight: fwd_w,
                        sub_segment_reverse_weight: rev_w,
                        is_startpoint: position == 0,
                    });
                }

                nodes.push(EdgeBasedNode {
                    id,
                    u,
                    v,
                    name_id: data.name_id,
                    packed_geometry_id: packed_of.get(&e).copied().unwrap_or(PackedGeometryId::INVALID),
                    component_id: ComponentId::INVALID,
                    belongs_to_tiny_component: false,
                    forward_segment_id: id,
                    reverse_segment_id: reverse_id.unwrap_or(EdgeBasedNodeId::INVALID),
                    travel_mode: data.travel_mode,
                    bearing_class_id: BearingClassId::INVALID,
                    entry_class_id: EntryClassId::INVALID,
                });
            }
        }
        nodes.sort_unstable_by_key(|n| n.id.0);

        // ── Step 3: turn enumeration ──────────────────────────────────────
        let mut edges = Vec::new();
        let mut skip_counters = SkipCounters::default();
        let mut entry_classes: Vec<EntryClass> = Vec::new();
        let mut entry_class_index: HashMap<EntryClass, EntryClassId> = HashMap::new();
        let mut bearing_classes: Vec<BearingClass> = Vec::new();
        let mut bearing_class_index: HashMap<BearingClass, BearingClassId> = HashMap::new();
        let mut node_entry_class: HashMap<EdgeBasedNodeId, EntryClassId> = HashMap::new();
        let mut node_bearing_class: HashMap<NodeId, BearingClassId> = HashMap::new();

        for n in 0..node_count {
            if n % 4096 == 0 {
                observer.on_compression_progress(n, node_count);
            }
            let v = NodeId(n as u32);
            let v_pos = graph.node_position(v);

            // Outgoing edges at v usable as turn continuations.
            let outgoing: Vec<EdgeId> = graph
                .out_edges(v)
                .filter(|&e| graph.edge_data(e).forward)
                .collect();
            if outgoing.is_empty() {
                continue;
            }

            let mut bearings: Vec<u16> = outgoing
                .iter()
                .map(|&e| {
                    let rep = representative_point(graph, geometry, e, v, v, true, config.representative_coordinate_distance_m);
                    discretize_bearing(v_pos.bearing_to(rep))
                })
                .collect();
            bearings.sort_unstable();
            bearings.dedup();
            let bearing_class = BearingClass { bearings };
            let bearing_class_id = *bearing_class_index.entry(bearing_class.clone()).or_insert_with(|| {
                let id = BearingClassId(bearing_classes.len() as u32);
                bearing_classes.push(bearing_class.clone());
                id
            });
            node_bearing_class.insert(v, bearing_class_id);

            // Incoming edges at v: for each neighbor x reachable via v's own
            // outgoing edges, check whether x->v exists and is forward.
            let mut incoming: Vec<(NodeId, EdgeId)> = Vec::new();
            for &out_e in &outgoing {
                let x = graph.target(out_e);
                if incoming.iter().any(|&(seen, _)| seen == x) {
                    continue;
                }
                if let Some(in_e) = graph.find_edge(x, v) {
                    if graph.edge_data(in_e).forward {
                        incoming.push((x, in_e));
                    }
                }
            }

            let dead_end = incoming.len() == 1 && outgoing.len() == 1;

            for &(u, incoming_edge) in &incoming {
                let incoming_id = graph.edge_data(incoming_edge).edge_based_node_id;
                let incoming_weight = node_weights[incoming_id.index()];

                let mut allowed_mask: u64 = 0;

                for (bearing_idx, &outgoing_edge) in outgoing.iter().enumerate() {
                    let w = graph.target(outgoing_edge);

                    if let Some(reason) =
                        reject_reason(restriction_map, u, v, w, dead_end, config.allow_uturns_everywhere)
                    {
                        skip_counters.record(reason);
                        observer.on_turn_rejected(reason);
                        continue;
                    }

                    let rep_in = representative_point(graph, geometry, incoming_edge, v, u, false, config.representative_coordinate_distance_m);
                    let rep_out = representative_point(graph, geometry, outgoing_edge, v, v, true, config.representative_coordinate_distance_m);

                    let bearing_in_from_v = v_pos.bearing_to(rep_in);
                    let bearing_out_from_v = v_pos.bearing_to(rep_out);
                    let turn_angle = (bearing_out_from_v - bearing_in_from_v + 360.0) % 360.0;
                    let deviation = (180.0 - turn_angle).abs();

                    if barrier_nodes.contains(&v) && deviation > BARRIER_STRAIGHT_THRESHOLD_DEGREES {
                        skip_counters.record(SkipReason::Barrier);
                        observer.on_turn_rejected(SkipReason::Barrier);
                        continue;
                    }

                    let mut weight = incoming_weight + turn_penalty.penalty(deviation);
                    if traffic_lights.contains(&v) {
                        weight += config.traffic_light_penalty_ms;
                    }
                    if u == w {
                        weight += config.u_turn_penalty_ms;
                    }

                    let outgoing_id = graph.edge_data(outgoing_edge).edge_based_node_id;
                    edges.push(EdgeBasedEdge {
                        source: incoming_id,
                        target: outgoing_id,
                        weight,
                        forward: true,
                        backward: true,
                    });

                    allowed_mask |= 1u64 << bearing_idx.min(63);
                }

                let entry_class = EntryClass { allowed_mask };
                let entry_class_id = *entry_class_index.entry(entry_class).or_insert_with(|| {
                    let id = EntryClassId(entry_classes.len() as u32);
                    entry_classes.push(entry_class);
                    id
                });
                node_entry_class.insert(incoming_id, entry_class_id);
            }
        }

        for node in nodes.iter_mut() {
            if let Some(&bc) = node_bearing_class.get(&node.v) {
                node.bearing_class_id = bc;
            }
            if let Some(&ec) = node_entry_class.get(&node.id) {
                node.entry_class_id = ec;
            }
        }

        Ok(EdgeBasedGraph { nodes, edges, segments, node_weights, bearing_classes, entry_classes, skip_counters })
    }
}

fn discretize_bearing(bearing_degrees: f64) -> u16 {
    let step = BEARING_DISCRETIZATION_STEP as f64;
    let buckets = 360 / BEARING_DISCRETIZATION_STEP;
    (((bearing_degrees / step).round() as i64).rem_euclid(buckets)) as u16
}

/// The coordinate a fixed physical distance downstream of `via` along one
/// side of a turn (spec §4.5: "walking the compressed geometry until the
/// cumulative great-circle distance from v exceeds a fixed desired length,
/// then interpolating").
///
/// `edge` is the directed node-based edge whose bucket to walk. When
/// `forward` is `false` (the incoming-edge case), `from_node` is that
/// edge's source — the fallback point once the bucket's interior nodes are
/// exhausted walking backward from `via`.
fn representative_point(
    graph: &NodeBasedGraph,
    geometry: &CompressedEdgeContainer,
    edge: EdgeId,
    via: NodeId,
    from_node: NodeId,
    forward: bool,
    desired_m: f64,
) -> FixedPoint {
    let via_pos = graph.node_position(via);
    let bucket = geometry.get_bucket(edge).unwrap_or(&[]);

    let mut path_positions: Vec<FixedPoint> = Vec::with_capacity(bucket.len() + 1);
    if forward {
        for rec in bucket {
            path_positions.push(graph.node_position(rec.node));
        }
    } else {
        // Walk backward from via toward the edge's source: skip the last
        // bucket entry (it IS `via`, the edge's target) and reverse the rest.
        if !bucket.is_empty() {
            for rec in bucket[..bucket.len() - 1].iter().rev() {
                path_positions.push(graph.node_position(rec.node));
            }
        }
        path_positions.push(graph.node_position(from_node));
    }

    walk_to_distance(via_pos, &path_positions, desired_m)
}

fn walk_to_distance(start: FixedPoint, path: &[FixedPoint], desired_m: f64) -> FixedPoint {
    let mut prev = start;
    let mut travelled = 0.0;
    for &next in path {
        let seg = prev.distance_m(next);
        if seg <= 0.0 {
            prev = next;
            continue;
        }
        if travelled + seg >= desired_m {
            let fraction = ((desired_m - travelled) / seg).clamp(0.0, 1.0);
            let lat = prev.lat_degrees() + (next.lat_degrees() - prev.lat_degrees()) * fraction;
            let lon = prev.lon_degrees() + (next.lon_degrees() - prev.lon_degrees()) * fraction;
            return FixedPoint::from_degrees(lat, lon);
        }
        travelled += seg;
        prev = next;
    }
    prev
}

/// Rules (a), (b), (d) of spec §4.5 step 3. Rule (c) (barrier steering) is
/// evaluated by the caller, which already has the turn-angle deviation in
/// hand.
fn reject_reason(
    restriction_map: &RestrictionMap,
    u: NodeId,
    v: NodeId,
    w: NodeId,
    dead_end: bool,
    allow_uturns_everywhere: bool,
) -> Option<SkipReason> {
    if let Some(mandated) = restriction_map.check_only_turn(u, v) {
        if mandated != w {
            return Some(SkipReason::OnlyTurnMismatch);
        }
    } else if restriction_map.is_restricted(u, v, w) {
        return Some(SkipReason::Restricted);
    }

    if u == w && !dead_end && !allow_uturns_everywhere {
        return Some(SkipReason::UTurn);
    }

    None
}
