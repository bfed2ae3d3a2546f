//! `routing-graph` — the preprocessing-and-query graph kernel.
//!
//! # What lives here
//!
//! | Module               | Component | Contents                                              |
//! |-----------------------|-----------|-------------------------------------------------------|
//! | [`node_graph`]        | C1        | `NodeBasedGraph`, CSR-with-tombstones adjacency        |
//! | [`geometry`]          | C2        | `CompressedEdgeContainer`, compressed/zipped geometry  |
//! | [`restriction`]       | C3        | `RestrictionMap`, via-node turn restriction lookup     |
//! | [`compressor`]        | C4        | `GraphCompressor`, degree-2 chain contraction           |
//! | [`edge_based_graph`]  | C5        | `EdgeBasedGraphFactory`, turn expansion                 |
//! | [`spatial_index`]     | C6        | `SpatialIndex`, persistent R-tree + nearest-neighbor    |
//! | [`scc`]               | C7        | `SccDriver`, iterative Tarjan SCC labelling             |
//! | [`geospatial_query`]  | C8        | `GeospatialQuery`, robust snap helpers over C6          |
//! | [`io`]                | —         | Binary input/output artifact (de)serialization          |
//! | [`facade`]            | —         | `DataFacade`, the query side's immutable artifact bundle|
//! | [`turn_penalty`]      | —         | `TurnPenaltySource` scripting-hook trait                |
//! | [`types`]             | —         | `TravelMode`, `Directionality`                          |
//! | [`error`]             | —         | `KernelError`                                           |
//!
//! # Build pipeline
//!
//! [`build_graph`] runs the full control/data flow spec §2 describes:
//! parse input → C4 (compress) → C5 (turn expansion) → C7 (SCC, merged back
//! onto the edge-based nodes) → C6 (spatial index over the resulting
//! segments), bundled into a [`DataFacade`] the query side then owns.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                      |
//! |------------|---------------------------------------------------------------|
//! | `parallel` | Rayon parallel sort for node-based edges and Hilbert ordering. |

pub mod compressor;
pub mod edge_based_graph;
pub mod error;
pub mod facade;
pub mod geometry;
pub mod geospatial_query;
pub mod io;
pub mod node_graph;
pub mod restriction;
pub mod scc;
pub mod spatial_index;
pub mod turn_penalty;
pub mod types;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use compressor::{CompressionStats, GraphCompressor};
pub use edge_based_graph::{
    BearingClass, EdgeBasedEdge, EdgeBasedGraph, EdgeBasedGraphFactory, EdgeBasedNode,
    EdgeBasedNodeSegment, EntryClass, SkipCounters,
};
pub use error::{KernelError, KernelResult};
pub use facade::DataFacade;
pub use geometry::{CompressedEdgeContainer, GeometryRecord, ZippedGeometry};
pub use geospatial_query::GeospatialQuery;
pub use io::ParsedInput;
pub use node_graph::{NodeBasedEdgeData, NodeBasedGraph, NodeBasedGraphBuilder};
pub use restriction::{RestrictionMap, RestrictionTarget};
pub use scc::{SccDriver, SccResult};
pub use spatial_index::{PhantomNode, SpatialIndex};
pub use turn_penalty::{LinearTurnPenalty, TurnPenaltySource};
pub use types::{Directionality, TravelMode};

use routing_core::BuildConfig;
use routing_core::BuildObserver;

/// Run the full preprocessing pipeline over one input stream (spec §2
/// control/data flow) and hand back an immutable, query-ready
/// [`DataFacade`].
///
/// `config.tiny_component_threshold` and `config.rtree_fanout`/
/// `rtree_leaf_capacity` drive C7 and C6 respectively; everything else in
/// `config` is consumed inside C5.
pub fn build_graph(
    input: &mut impl std::io::Read,
    config: &BuildConfig,
    turn_penalty: &dyn TurnPenaltySource,
    observer: &mut dyn BuildObserver,
) -> KernelResult<DataFacade> {
    let ParsedInput { mut graph, mut restriction_map, barrier_nodes, traffic_lights, .. } =
        io::read_node_based_graph(input)?;

    let mut geometry = CompressedEdgeContainer::new();
    GraphCompressor::compress(
        &mut graph,
        &mut restriction_map,
        &mut geometry,
        &barrier_nodes,
        &traffic_lights,
        observer,
    )?;

    let mut edge_based = EdgeBasedGraphFactory::build(
        &mut graph,
        &mut geometry,
        &restriction_map,
        &barrier_nodes,
        &traffic_lights,
        config,
        turn_penalty,
        observer,
    )?;

    let scc = SccDriver::compute(&edge_based, config.tiny_component_threshold as usize, observer);
    for node in &mut edge_based.nodes {
        let component = scc.component_of[node.id.index()];
        node.component_id = component;
        node.belongs_to_tiny_component = scc.belongs_to_tiny_component(node.id);
    }

    let segments = std::mem::take(&mut edge_based.segments);
    let spatial_index = SpatialIndex::build(
        segments,
        |n| graph.node_position(n),
        config.rtree_leaf_capacity,
        config.rtree_fanout,
    )?;

    observer.on_build_complete(edge_based.nodes.len(), scc.component_size.len());

    Ok(DataFacade::new(edge_based, geometry, restriction_map, spatial_index))
}
