//! `DataFacade`: the immutable bundle of loaded/built artifacts the query
//! side operates on (spec §5 "process-wide state is limited to the loaded
//! immutable preprocessing artifacts held by a `DataFacade` owned by the
//! query side"; §3 ownership note that multiple facades may coexist).
//!
//! Everything behind a `&DataFacade` is read-only and `Sync`: the restriction
//! map post-build, the compressed geometry container, the edge-based graph,
//! and the spatial index are each documented elsewhere as immutable after
//! their respective build step completes.

use routing_core::{EdgeBasedNodeId, FixedPoint, MercatorRect};

use crate::edge_based_graph::{EdgeBasedEdge, EdgeBasedGraph, EdgeBasedNode, EdgeBasedNodeSegment};
use crate::error::KernelResult;
use crate::geometry::CompressedEdgeContainer;
use crate::geospatial_query::GeospatialQuery;
use crate::restriction::RestrictionMap;
use crate::spatial_index::{PhantomNode, SpatialIndex};

/// One fully built/loaded graph, ready to answer queries. Construct via
/// [`crate::build_graph`] (fresh build) or [`DataFacade::load`] (previously
/// persisted artifacts).
pub struct DataFacade {
    edges: Vec<EdgeBasedEdge>,
    nodes: Vec<EdgeBasedNode>,
    geometry: CompressedEdgeContainer,
    restriction_map: RestrictionMap,
    spatial_index: SpatialIndex,
    /// `belongs_to_tiny_component`, indexed by `EdgeBasedNodeId`; kept
    /// alongside `nodes` rather than re-derived so `GeospatialQuery`
    /// borrows don't have to walk `nodes` per query.
    tiny_component: Vec<bool>,
}

impl DataFacade {
    pub fn new(
        edge_based: EdgeBasedGraph,
        geometry: CompressedEdgeContainer,
        restriction_map: RestrictionMap,
        spatial_index: SpatialIndex,
    ) -> Self {
        let tiny_component = edge_based.nodes.iter().map(|n| n.belongs_to_tiny_component).collect();
        Self {
            edges: edge_based.edges,
            nodes: edge_based.nodes,
            geometry,
            restriction_map,
            spatial_index,
            tiny_component,
        }
    }

    pub fn edges(&self) -> &[EdgeBasedEdge] {
        &self.edges
    }

    pub fn nodes(&self) -> &[EdgeBasedNode] {
        &self.nodes
    }

    pub fn node(&self, id: EdgeBasedNodeId) -> &EdgeBasedNode {
        &self.nodes[id.index()]
    }

    pub fn geometry(&self) -> &CompressedEdgeContainer {
        &self.geometry
    }

    pub fn restriction_map(&self) -> &RestrictionMap {
        &self.restriction_map
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.spatial_index
    }

    /// Thread-safe: every field behind this borrow is immutable (spec §5).
    pub fn query(&self) -> GeospatialQuery<'_> {
        GeospatialQuery::new(&self.spatial_index, &self.tiny_component)
    }

    pub fn nearest(&self, coord: FixedPoint, k: usize, bearing: Option<(f64, f64)>) -> Vec<PhantomNode> {
        self.query().nearest(coord, k, bearing)
    }

    pub fn nearest_in_range(
        &self,
        coord: FixedPoint,
        radius_meters: f64,
        bearing: Option<(f64, f64)>,
    ) -> Vec<PhantomNode> {
        self.query().nearest_in_range(coord, radius_meters, bearing)
    }

    pub fn search(&self, bbox: MercatorRect) -> Vec<EdgeBasedNodeSegment> {
        self.query().search(bbox)
    }

    /// Persist the `edges`/`nodes`/`geometry` streams and the spatial
    /// index's `ramIndex`/`fileIndex` files (spec §6 "Output: edge-based
    /// artifacts"). `edges_path`/`nodes_path`/`geometry_path` take plain
    /// `Write`rs so callers can target any destination; the spatial index
    /// needs real files for its positioned reads, hence the `Path`s.
    pub fn save(
        &self,
        edges_writer: &mut impl std::io::Write,
        nodes_writer: &mut impl std::io::Write,
        geometry_writer: &mut impl std::io::Write,
        leaf_path: &std::path::Path,
        ram_index_path: &std::path::Path,
    ) -> KernelResult<()> {
        crate::io::write_edge_based_edges(edges_writer, &self.edges)?;
        crate::io::write_edge_based_nodes(nodes_writer, &self.nodes)?;
        crate::io::write_geometry(geometry_writer, &self.geometry)?;
        self.spatial_index.persist(leaf_path, ram_index_path)
    }

    /// Load a previously persisted artifact set back into a `DataFacade`,
    /// re-deriving `restriction_map` is not possible from these streams
    /// alone (spec §6 output schema carries no restriction data — routing
    /// restrictions are already baked into which edge-based edges exist),
    /// so a loaded facade carries an empty one.
    pub fn load(
        edges_reader: &mut impl std::io::Read,
        nodes_reader: &mut impl std::io::Read,
        geometry_reader: &mut impl std::io::Read,
        leaf_path: &std::path::Path,
        ram_index_path: &std::path::Path,
    ) -> KernelResult<DataFacade> {
        let edges = crate::io::read_edge_based_edges(edges_reader)?;
        let nodes = crate::io::read_edge_based_nodes(nodes_reader)?;
        let geometry = crate::io::read_geometry(geometry_reader)?;
        let spatial_index = SpatialIndex::load(leaf_path, ram_index_path)?;
        let tiny_component = nodes.iter().map(|n| n.belongs_to_tiny_component).collect();

        Ok(DataFacade {
            edges,
            nodes,
            geometry,
            restriction_map: RestrictionMap::new(),
            spatial_index,
            tiny_component,
        })
    }
}
