//! Degree-2 chain contraction (C4).
//!
//! Grounded on `original_source/src/extractor/graph_compressor.cpp`:
//! `GraphCompressor::Compress` walks nodes in id order, contracting every
//! eligible degree-2 node `v` into its two neighbors, then sweeps the
//! surviving edges once more to seed [`CompressedEdgeContainer`] with the
//! ones that were never touched.

use std::collections::HashSet;

use routing_core::{BuildObserver, NodeId};

use crate::error::{KernelError, KernelResult};
use crate::geometry::CompressedEdgeContainer;
use crate::node_graph::NodeBasedGraph;
use crate::restriction::RestrictionMap;

/// Report-only counters for the trim pass; nothing here is fatal.
#[derive(Default, Debug, Clone, Copy)]
pub struct CompressionStats {
    pub nodes_contracted: usize,
}

pub struct GraphCompressor;

impl GraphCompressor {
    /// Run the contraction pass in place. `barrier_nodes` and
    /// `traffic_lights` are node-id sets supplied by the input (spec §6
    /// "barrier-node id list, traffic-light id list").
    pub fn compress(
        graph: &mut NodeBasedGraph,
        restriction_map: &mut RestrictionMap,
        geometry: &mut CompressedEdgeContainer,
        barrier_nodes: &HashSet<NodeId>,
        traffic_lights: &HashSet<NodeId>,
        observer: &mut dyn BuildObserver,
    ) -> KernelResult<CompressionStats> {
        let node_count = graph.node_count();
        let nodes_before = (0..node_count)
            .filter(|&i| graph.out_degree(NodeId(i as u32)) > 0)
            .count();
        let mut stats = CompressionStats::default();

        for i in 0..node_count {
            let v = NodeId(i as u32);

            if i % 4096 == 0 {
                observer.on_compression_progress(i, node_count);
            }

            if graph.out_degree(v) != 2 {
                continue;
            }
            if barrier_nodes.contains(&v) {
                continue;
            }
            if traffic_lights.contains(&v) {
                continue;
            }
            if restriction_map.is_via_node(v) {
                continue;
            }

            // v's two outgoing edges go to its only two physical neighbors.
            let e1 = graph.begin_edges(v);
            let e2 = routing_core::EdgeId(e1.0 + 1);
            let neighbor_1 = graph.target(e1);
            let neighbor_2 = graph.target(e2);

            // Treat neighbor_1 as u, neighbor_2 as w; the contraction u-v-w
            // is symmetric in neighbor choice.
            let u = neighbor_1;
            let w = neighbor_2;
            let out_v_to_w = e2; // v -> w
            let out_v_to_u = e1; // v -> u

            if graph.find_edge_in_either_direction(u, w).is_some() {
                continue;
            }

            let Some(in_u_to_v) = graph.find_edge(u, v) else {
                return Err(KernelError::InvariantViolation(format!(
                    "no edge {u} -> {v} while contracting degree-2 node {v}"
                )));
            };
            let Some(in_w_to_v) = graph.find_edge(w, v) else {
                return Err(KernelError::InvariantViolation(format!(
                    "no edge {w} -> {v} while contracting degree-2 node {v}"
                )));
            };

            let fwd1 = *graph.edge_data(in_u_to_v);
            let fwd2 = *graph.edge_data(out_v_to_w);
            let rev1 = *graph.edge_data(in_w_to_v);
            let rev2 = *graph.edge_data(out_v_to_u);

            if !fwd1.is_compatible_with(&fwd2) || !rev1.is_compatible_with(&rev2) {
                continue;
            }

            let weight1 = fwd1.weight;
            let weight2 = fwd2.weight;
            let reverse_weight1 = rev1.weight;
            let reverse_weight2 = rev2.weight;

            graph.edge_data_mut(in_u_to_v).weight = weight1 + weight2;
            graph.set_target(in_u_to_v, w);
            graph.edge_data_mut(in_u_to_v).lane_description_id = select_lane_id(fwd1.lane_description_id, fwd2.lane_description_id);

            graph.edge_data_mut(in_w_to_v).weight = reverse_weight1 + reverse_weight2;
            graph.set_target(in_w_to_v, u);
            graph.edge_data_mut(in_w_to_v).lane_description_id = select_lane_id(rev1.lane_description_id, rev2.lane_description_id);

            // v's only two edges are dropped; always delete whatever now
            // sits at the head of v's range so an earlier swap-with-last
            // never leaves us holding a stale id.
            while graph.out_degree(v) > 0 {
                let e = graph.begin_edges(v);
                graph.delete_edge(v, e);
            }

            let predecessors_of_u = backward_predecessors(graph, u, v);
            let predecessors_of_w = backward_predecessors(graph, w, v);

            restriction_map.fixup_starting(u, v, w);
            restriction_map.fixup_arriving(u, v, w, &predecessors_of_u);
            restriction_map.fixup_starting(w, v, u);
            restriction_map.fixup_arriving(w, v, u, &predecessors_of_w);

            geometry.compress(in_u_to_v, out_v_to_w, v, w, weight1, weight2);
            geometry.compress(in_w_to_v, out_v_to_u, v, u, reverse_weight1, reverse_weight2);

            stats.nodes_contracted += 1;
        }

        for i in 0..node_count {
            let u = NodeId(i as u32);
            for e in graph.out_edges(u) {
                let target = graph.target(e);
                let weight = graph.edge_data(e).weight;
                geometry.add_uncompressed(e, target, weight);
            }
        }

        let nodes_after = (0..node_count)
            .filter(|&i| graph.out_degree(NodeId(i as u32)) > 0)
            .count();
        observer.on_compression_complete(nodes_before, nodes_after);

        Ok(stats)
    }
}

/// `u - (front) - v - (back) - w`: keep `back` unless it's empty, in which
/// case keep `front` (the lane tag closer to the surviving intersection
/// wins).
fn select_lane_id(front: routing_core::LaneDescriptionId, back: routing_core::LaneDescriptionId) -> routing_core::LaneDescriptionId {
    if back.is_valid() { back } else { front }
}

/// `u`'s genuine predecessors: neighbors reachable from `u` over an edge
/// that is also traversable backward (so the neighbor can reach `u`),
/// excluding `exclude` (the node being contracted out). Only these nodes
/// can possibly hold a `(x, u)` restriction bucket that routes through the
/// contraction.
fn backward_predecessors(graph: &NodeBasedGraph, u: NodeId, exclude: NodeId) -> Vec<NodeId> {
    graph
        .out_edges(u)
        .filter_map(|e| {
            let x = graph.target(e);
            (graph.edge_data(e).backward && x != exclude).then_some(x)
        })
        .collect()
}
