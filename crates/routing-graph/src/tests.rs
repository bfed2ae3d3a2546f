//! Unit and scenario tests for routing-graph.

#[cfg(test)]
mod node_graph {
    use routing_core::{FixedPoint, NodeId};

    use crate::node_graph::{NodeBasedEdgeData, NodeBasedGraphBuilder};
    use crate::types::{Directionality, TravelMode};

    fn edge_data(direction: Directionality) -> NodeBasedEdgeData {
        NodeBasedEdgeData {
            weight: 10,
            forward: direction.forward,
            backward: direction.backward,
            name_id: routing_core::NameId(0),
            road_class: 1,
            roundabout: false,
            access_restricted: false,
            ignore_for_snapping: false,
            contraflow: false,
            is_split: false,
            travel_mode: TravelMode::Driving,
            lane_description_id: routing_core::LaneDescriptionId::INVALID,
            edge_based_node_id: routing_core::EdgeBasedNodeId::INVALID,
        }
    }

    #[test]
    fn self_loop_rejected() {
        let mut b = NodeBasedGraphBuilder::new();
        let a = b.add_node(FixedPoint::new(0, 0));
        assert!(b.add_directed_edge(a, a, edge_data(Directionality::BOTH)).is_err());
    }

    #[test]
    fn non_positive_weight_rejected() {
        let mut b = NodeBasedGraphBuilder::new();
        let a = b.add_node(FixedPoint::new(0, 0));
        let c = b.add_node(FixedPoint::new(1, 1));
        let mut data = edge_data(Directionality::BOTH);
        data.weight = 0;
        assert!(b.add_directed_edge(a, c, data).is_err());
    }

    #[test]
    fn insert_after_build_reuses_tombstone_then_relocates() {
        let mut b = NodeBasedGraphBuilder::new();
        let a = b.add_node(FixedPoint::new(0, 0));
        let c = b.add_node(FixedPoint::new(1, 1));
        let d = b.add_node(FixedPoint::new(2, 2));
        b.add_directed_edge(a, c, edge_data(Directionality::BOTH)).unwrap();
        let mut graph = b.build().unwrap();

        assert_eq!(graph.out_degree(a), 1);
        graph.insert_edge(a, d, edge_data(Directionality::FORWARD_ONLY)).unwrap();
        assert_eq!(graph.out_degree(a), 2);

        let targets: Vec<NodeId> = graph.out_edges(a).map(|e| graph.target(e)).collect();
        assert!(targets.contains(&c) && targets.contains(&d));
    }

    #[test]
    fn delete_edge_drops_exactly_one() {
        let mut b = NodeBasedGraphBuilder::new();
        let a = b.add_node(FixedPoint::new(0, 0));
        let c = b.add_node(FixedPoint::new(1, 1));
        b.add_road(a, c, edge_data(Directionality::BOTH)).unwrap();
        let mut graph = b.build().unwrap();

        let e = graph.begin_edges(a);
        graph.delete_edge(a, e);
        assert_eq!(graph.out_degree(a), 0);
    }
}

/// End-to-end scenarios over the full C1→C5 pipeline, grounded on spec §8's
/// quantified invariants and boundary behaviors.
#[cfg(test)]
mod pipeline {
    use std::collections::HashSet;

    use routing_core::{BuildConfig, FixedPoint, NodeId, NoopObserver};

    use crate::compressor::GraphCompressor;
    use crate::edge_based_graph::EdgeBasedGraphFactory;
    use crate::geometry::CompressedEdgeContainer;
    use crate::node_graph::{NodeBasedEdgeData, NodeBasedGraphBuilder};
    use crate::restriction::RestrictionMap;
    use crate::turn_penalty::LinearTurnPenalty;
    use crate::types::{Directionality, TravelMode};

    fn road(direction: Directionality, weight: u32) -> NodeBasedEdgeData {
        NodeBasedEdgeData {
            weight,
            forward: direction.forward,
            backward: direction.backward,
            name_id: routing_core::NameId(0),
            road_class: 1,
            roundabout: false,
            access_restricted: false,
            ignore_for_snapping: false,
            contraflow: false,
            is_split: false,
            travel_mode: TravelMode::Driving,
            lane_description_id: routing_core::LaneDescriptionId::INVALID,
            edge_based_node_id: routing_core::EdgeBasedNodeId::INVALID,
        }
    }

    /// A `count`-node straight line `0 - 1 - ... - (count-1)`, every
    /// interior node degree-2, every edge weight 10.
    fn straight_line(count: usize) -> (NodeBasedGraphBuilder, Vec<NodeId>) {
        let mut b = NodeBasedGraphBuilder::with_capacity(count, count * 2);
        let nodes: Vec<NodeId> = (0..count).map(|i| b.add_node(FixedPoint::new(i as i32, 0))).collect();
        for w in nodes.windows(2) {
            b.add_road(w[0], w[1], road(Directionality::BOTH, 10)).unwrap();
        }
        (b, nodes)
    }

    /// Scenario A: degree-2 compression. A 5-node straight line compresses
    /// to a single edge in each direction, whose weight is the sum of the
    /// original hop weights.
    #[test]
    fn degree_2_chain_compresses_to_one_edge() {
        let (b, nodes) = straight_line(5);
        let mut graph = b.build().unwrap();
        let mut restriction_map = RestrictionMap::new();
        let mut geometry = CompressedEdgeContainer::new();

        let stats = GraphCompressor::compress(
            &mut graph,
            &mut restriction_map,
            &mut geometry,
            &HashSet::new(),
            &HashSet::new(),
            &mut NoopObserver,
        )
        .unwrap();

        assert_eq!(stats.nodes_contracted, 3);
        assert_eq!(graph.out_degree(nodes[0]), 1);
        let e = graph.begin_edges(nodes[0]);
        assert_eq!(graph.target(e), nodes[4]);
        assert_eq!(graph.edge_data(e).weight, 40);
    }

    /// Scenario B: a barrier node on an otherwise-degree-2 chain blocks
    /// compression through it.
    #[test]
    fn barrier_node_prevents_compression() {
        let (b, nodes) = straight_line(3);
        let mut graph = b.build().unwrap();
        let mut restriction_map = RestrictionMap::new();
        let mut geometry = CompressedEdgeContainer::new();
        let mut barrier_nodes = HashSet::new();
        barrier_nodes.insert(nodes[1]);

        let stats = GraphCompressor::compress(
            &mut graph,
            &mut restriction_map,
            &mut geometry,
            &barrier_nodes,
            &HashSet::new(),
            &mut NoopObserver,
        )
        .unwrap();

        assert_eq!(stats.nodes_contracted, 0);
        assert_eq!(graph.out_degree(nodes[1]), 2);
    }

    /// Scenario C: a T-intersection (degree-3 node) is never eligible for
    /// degree-2 contraction, even though two of its three neighbors would
    /// otherwise form a straight chain.
    #[test]
    fn t_intersection_is_not_compressed() {
        let mut b = NodeBasedGraphBuilder::new();
        let a = b.add_node(FixedPoint::new(0, 0));
        let hub = b.add_node(FixedPoint::new(1, 0));
        let c = b.add_node(FixedPoint::new(2, 0));
        let branch = b.add_node(FixedPoint::new(1, 1));
        b.add_road(a, hub, road(Directionality::BOTH, 10)).unwrap();
        b.add_road(hub, c, road(Directionality::BOTH, 10)).unwrap();
        b.add_road(hub, branch, road(Directionality::BOTH, 10)).unwrap();
        let mut graph = b.build().unwrap();
        let mut restriction_map = RestrictionMap::new();
        let mut geometry = CompressedEdgeContainer::new();

        let stats = GraphCompressor::compress(
            &mut graph,
            &mut restriction_map,
            &mut geometry,
            &HashSet::new(),
            &HashSet::new(),
            &mut NoopObserver,
        )
        .unwrap();

        assert_eq!(stats.nodes_contracted, 0);
        assert_eq!(graph.out_degree(hub), 3);
    }

    /// Scenario D: an only-restriction at a via-node forces traffic arriving
    /// there to take exactly the mandated turn; every other continuation is
    /// rejected (counted, not fatal).
    #[test]
    fn only_restriction_permits_one_turn_and_rejects_the_rest() {
        let mut b = NodeBasedGraphBuilder::new();
        let south = b.add_node(FixedPoint::new(0, 0));
        let via = b.add_node(FixedPoint::new(1, 0));
        let east = b.add_node(FixedPoint::new(1, 1));
        let west = b.add_node(FixedPoint::new(1, -1));
        b.add_road(south, via, road(Directionality::BOTH, 10)).unwrap();
        b.add_road(via, east, road(Directionality::BOTH, 10)).unwrap();
        b.add_road(via, west, road(Directionality::BOTH, 10)).unwrap();
        let mut graph = b.build().unwrap();

        let mut restriction_map = RestrictionMap::new();
        restriction_map.insert(south, via, east, true).unwrap();

        let mut geometry = CompressedEdgeContainer::new();
        GraphCompressor::compress(
            &mut graph,
            &mut restriction_map,
            &mut geometry,
            &HashSet::new(),
            &HashSet::new(),
            &mut NoopObserver,
        )
        .unwrap();

        let config = BuildConfig::default();
        let penalty = LinearTurnPenalty::default();
        let edge_based = EdgeBasedGraphFactory::build(
            &mut graph,
            &mut geometry,
            &restriction_map,
            &HashSet::new(),
            &HashSet::new(),
            &config,
            &penalty,
            &mut NoopObserver,
        )
        .unwrap();

        let south_to_via = edge_based.nodes.iter().find(|n| n.u == south && n.v == via).unwrap();
        let via_to_east = edge_based.nodes.iter().find(|n| n.u == via && n.v == east).unwrap();
        let via_to_west = edge_based.nodes.iter().find(|n| n.u == via && n.v == west).unwrap();

        let allows = |from: routing_core::EdgeBasedNodeId, to: routing_core::EdgeBasedNodeId| {
            edge_based.edges.iter().any(|e| e.source == from && e.target == to)
        };
        assert!(allows(south_to_via.id, via_to_east.id));
        assert!(!allows(south_to_via.id, via_to_west.id));
        assert!(edge_based.skip_counters.only_turn_mismatch >= 1);
    }

    /// §8 boundary behavior: a single surviving edge produces exactly one
    /// edge-based node, zero edge-based edges (no downstream turn to make),
    /// and (once C7 runs) one component of size 1.
    #[test]
    fn single_edge_input_yields_one_node_zero_edges_one_component() {
        let mut b = NodeBasedGraphBuilder::new();
        let a = b.add_node(FixedPoint::new(0, 0));
        let c = b.add_node(FixedPoint::new(1, 0));
        b.add_directed_edge(a, c, road(Directionality::FORWARD_ONLY, 10)).unwrap();
        let mut graph = b.build().unwrap();

        let mut restriction_map = RestrictionMap::new();
        let mut geometry = CompressedEdgeContainer::new();
        GraphCompressor::compress(
            &mut graph,
            &mut restriction_map,
            &mut geometry,
            &HashSet::new(),
            &HashSet::new(),
            &mut NoopObserver,
        )
        .unwrap();

        let config = BuildConfig::default();
        let penalty = LinearTurnPenalty::default();
        let edge_based = EdgeBasedGraphFactory::build(
            &mut graph,
            &mut geometry,
            &restriction_map,
            &HashSet::new(),
            &HashSet::new(),
            &config,
            &penalty,
            &mut NoopObserver,
        )
        .unwrap();

        assert_eq!(edge_based.nodes.len(), 1);
        assert_eq!(edge_based.edges.len(), 0);

        let scc = crate::scc::SccDriver::compute(&edge_based, 1000, &mut NoopObserver);
        assert_eq!(scc.component_size.len(), 1);
        assert_eq!(scc.component_size[0], 1);
    }

    /// Renumbering (C5 step 1) assigns a distinct, densely packed id to
    /// every allowed directed edge.
    #[test]
    fn edge_based_node_ids_are_injective_and_dense() {
        let (b, _) = straight_line(4);
        let mut graph = b.build().unwrap();
        let mut restriction_map = RestrictionMap::new();
        let mut geometry = CompressedEdgeContainer::new();
        GraphCompressor::compress(
            &mut graph,
            &mut restriction_map,
            &mut geometry,
            &HashSet::new(),
            &HashSet::new(),
            &mut NoopObserver,
        )
        .unwrap();

        let config = BuildConfig::default();
        let penalty = LinearTurnPenalty::default();
        let edge_based = EdgeBasedGraphFactory::build(
            &mut graph,
            &mut geometry,
            &restriction_map,
            &HashSet::new(),
            &HashSet::new(),
            &config,
            &penalty,
            &mut NoopObserver,
        )
        .unwrap();

        let mut ids: Vec<u32> = edge_based.nodes.iter().map(|n| n.id.0).collect();
        ids.sort_unstable();
        let expected: Vec<u32> = (0..ids.len() as u32).collect();
        assert_eq!(ids, expected);
    }

    /// GraphCompressor is idempotent: running it again over an
    /// already-compressed graph contracts nothing further.
    #[test]
    fn compressor_is_idempotent() {
        let (b, _) = straight_line(5);
        let mut graph = b.build().unwrap();
        let mut restriction_map = RestrictionMap::new();
        let mut geometry = CompressedEdgeContainer::new();
        GraphCompressor::compress(
            &mut graph,
            &mut restriction_map,
            &mut geometry,
            &HashSet::new(),
            &HashSet::new(),
            &mut NoopObserver,
        )
        .unwrap();

        let second = GraphCompressor::compress(
            &mut graph,
            &mut restriction_map,
            &mut geometry,
            &HashSet::new(),
            &HashSet::new(),
            &mut NoopObserver,
        )
        .unwrap();
        assert_eq!(second.nodes_contracted, 0);
    }

    /// Zip invariant (spec §3): a zipped edge's forward and reverse buckets
    /// always agree in length.
    #[test]
    fn zip_bucket_lengths_agree_after_compression() {
        let (b, nodes) = straight_line(4);
        let mut graph = b.build().unwrap();
        let mut restriction_map = RestrictionMap::new();
        let mut geometry = CompressedEdgeContainer::new();
        GraphCompressor::compress(
            &mut graph,
            &mut restriction_map,
            &mut geometry,
            &HashSet::new(),
            &HashSet::new(),
            &mut NoopObserver,
        )
        .unwrap();

        let fwd = graph.find_edge(nodes[0], nodes[3]).unwrap();
        let rev = graph.find_edge(nodes[3], nodes[0]).unwrap();
        assert_eq!(geometry.get_bucket(fwd).unwrap().len(), geometry.get_bucket(rev).unwrap().len());
    }

    /// §8 boundary: empty input produces zero edges and an empty edge-based
    /// graph, not an error.
    #[test]
    fn empty_graph_produces_nothing() {
        let b = NodeBasedGraphBuilder::new();
        let mut graph = b.build().unwrap();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);

        let restriction_map = RestrictionMap::new();
        let mut geometry = CompressedEdgeContainer::new();
        let config = BuildConfig::default();
        let penalty = LinearTurnPenalty::default();
        let edge_based = EdgeBasedGraphFactory::build(
            &mut graph,
            &mut geometry,
            &restriction_map,
            &HashSet::new(),
            &HashSet::new(),
            &config,
            &penalty,
            &mut NoopObserver,
        )
        .unwrap();
        assert!(edge_based.nodes.is_empty());
        assert!(edge_based.edges.is_empty());
    }
}

#[cfg(test)]
mod restriction_map {
    use routing_core::{FixedPoint, NodeId};

    use crate::node_graph::NodeBasedGraphBuilder;
    use crate::restriction::RestrictionMap;

    #[test]
    fn from_equals_to_rejected() {
        let mut b = NodeBasedGraphBuilder::new();
        let a: NodeId = b.add_node(FixedPoint::new(0, 0));
        let via = b.add_node(FixedPoint::new(1, 0));
        let mut restriction_map = RestrictionMap::new();
        assert!(restriction_map.insert(a, via, a, false).is_err());
    }

    #[test]
    fn only_restriction_replaces_prior_targets() {
        let mut b = NodeBasedGraphBuilder::new();
        let a = b.add_node(FixedPoint::new(0, 0));
        let via = b.add_node(FixedPoint::new(1, 0));
        let to1 = b.add_node(FixedPoint::new(2, 0));
        let to2 = b.add_node(FixedPoint::new(2, 1));
        let mut restriction_map = RestrictionMap::new();
        restriction_map.insert(a, via, to1, false).unwrap();
        restriction_map.insert(a, via, to2, true).unwrap();
        assert_eq!(restriction_map.check_only_turn(a, via), Some(to2));
        assert!(restriction_map.is_restricted(a, via, to1));
    }
}

#[cfg(test)]
mod scc {
    use routing_core::NoopObserver;

    use crate::edge_based_graph::{EdgeBasedEdge, EdgeBasedGraph};

    fn node(id: u32) -> crate::edge_based_graph::EdgeBasedNode {
        crate::edge_based_graph::EdgeBasedNode {
            id: routing_core::EdgeBasedNodeId(id),
            u: routing_core::NodeId(id),
            v: routing_core::NodeId(id + 1),
            name_id: routing_core::NameId::INVALID,
            packed_geometry_id: routing_core::PackedGeometryId::INVALID,
            component_id: routing_core::ComponentId::INVALID,
            belongs_to_tiny_component: false,
            forward_segment_id: routing_core::EdgeBasedNodeId(id),
            reverse_segment_id: routing_core::EdgeBasedNodeId::INVALID,
            travel_mode: crate::types::TravelMode::Driving,
            bearing_class_id: routing_core::BearingClassId::INVALID,
            entry_class_id: routing_core::EntryClassId::INVALID,
        }
    }

    fn edge(source: u32, target: u32) -> EdgeBasedEdge {
        EdgeBasedEdge {
            source: routing_core::EdgeBasedNodeId(source),
            target: routing_core::EdgeBasedNodeId(target),
            weight: 1,
            forward: true,
            backward: false,
        }
    }

    /// A 3-cycle is one strongly-connected component containing every node.
    #[test]
    fn cycle_yields_single_component() {
        let graph = EdgeBasedGraph {
            nodes: vec![node(0), node(1), node(2)],
            edges: vec![edge(0, 1), edge(1, 2), edge(2, 0)],
            segments: Vec::new(),
            node_weights: Vec::new(),
            bearing_classes: Vec::new(),
            entry_classes: Vec::new(),
            skip_counters: Default::default(),
        };

        let result = crate::scc::SccDriver::compute(&graph, 1000, &mut NoopObserver);
        assert_eq!(result.component_size.len(), 1);
        assert_eq!(result.component_size[0], 3);
        assert_eq!(result.component_of[0], result.component_of[1]);
        assert_eq!(result.component_of[1], result.component_of[2]);
    }

    /// Two disconnected singletons form two distinct tiny components.
    #[test]
    fn disconnected_nodes_are_distinct_tiny_components() {
        let graph = EdgeBasedGraph {
            nodes: vec![node(0), node(1)],
            edges: Vec::new(),
            segments: Vec::new(),
            node_weights: Vec::new(),
            bearing_classes: Vec::new(),
            entry_classes: Vec::new(),
            skip_counters: Default::default(),
        };

        let result = crate::scc::SccDriver::compute(&graph, 2, &mut NoopObserver);
        assert_eq!(result.component_size.len(), 2);
        assert_ne!(result.component_of[0], result.component_of[1]);
        assert!(result.belongs_to_tiny_component(routing_core::EdgeBasedNodeId(0)));
    }
}

#[cfg(test)]
mod spatial_index {
    use routing_core::{EdgeBasedNodeId, FixedPoint, NodeId};

    use crate::edge_based_graph::EdgeBasedNodeSegment;
    use crate::spatial_index::SpatialIndex;

    fn segment(id: u32, u: NodeId, v: NodeId) -> EdgeBasedNodeSegment {
        EdgeBasedNodeSegment {
            forward_segment_id: EdgeBasedNodeId(id),
            reverse_segment_id: EdgeBasedNodeId::INVALID,
            u,
            v,
            position_in_geometry: 0,
            sub_segment_forward_weight: 10,
            sub_segment_reverse_weight: 10,
            is_startpoint: true,
        }
    }

    /// Scenario E: three collinear segments; `nearest` returns them in
    /// strictly increasing distance order from a query point off one end.
    #[test]
    fn nearest_on_collinear_segments_is_distance_ordered() {
        let positions = [
            FixedPoint::from_degrees(0.0, 0.0),
            FixedPoint::from_degrees(0.0, 0.001),
            FixedPoint::from_degrees(0.0, 0.002),
            FixedPoint::from_degrees(0.0, 0.003),
        ];
        let segments = vec![
            segment(0, NodeId(0), NodeId(1)),
            segment(1, NodeId(1), NodeId(2)),
            segment(2, NodeId(2), NodeId(3)),
        ];

        let index = SpatialIndex::build(segments, |n| positions[n.index()], 2, 2).unwrap();
        let query = FixedPoint::from_degrees(0.0, -0.0001);
        let results = index.nearest(query, 3, None);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].forward_segment_id, EdgeBasedNodeId(0));
        for pair in results.windows(2) {
            assert!(pair[0].distance_m <= pair[1].distance_m);
        }
    }

    /// Scenario F (gap-bug regression): a segment whose endpoints run
    /// upper-left to lower-right must project onto its *own* line, not the
    /// bounding box's other diagonal.
    #[test]
    fn projection_uses_true_endpoints_not_bbox_diagonal() {
        let positions = [FixedPoint::from_degrees(0.001, 0.0), FixedPoint::from_degrees(0.0, 0.001)];
        let segments = vec![segment(0, NodeId(0), NodeId(1))];

        let index = SpatialIndex::build(segments, |n| positions[n.index()], 8, 8).unwrap();
        // Query near the segment's own midpoint, far from the bbox's other
        // (unused) diagonal through (0.001, 0.001) and (0.0, 0.0).
        let query = FixedPoint::from_degrees(0.0005, 0.0005);
        let results = index.nearest(query, 1, None);

        assert_eq!(results.len(), 1);
        // The true line passes through the query point almost exactly; the
        // wrong diagonal would put it ~110m away at this scale.
        assert!(results[0].distance_m < 5.0, "got {}", results[0].distance_m);
    }

    #[test]
    fn empty_index_returns_no_results() {
        let index = SpatialIndex::build(Vec::new(), |_: NodeId| FixedPoint::new(0, 0), 8, 8).unwrap();
        assert!(index.is_empty());
        assert!(index.nearest(FixedPoint::new(0, 0), 5, None).is_empty());
    }
}
