//! Binary artifact I/O (spec §6): the input node-based graph reader, and the
//! `edges` / `nodes` / `geometry` output artifact writers+readers.
//!
//! Everything here is a manual little-endian encoding via `to_le_bytes` /
//! `from_le_bytes`, matching the style already used for the spatial index's
//! leaf-file checksum header (see `spatial_index.rs`) rather than reaching
//! for a byteorder crate — the formats are small, fixed, and only ever
//! produced and consumed by this kernel. `ramIndex`/`fileIndex` are handled
//! separately by [`crate::spatial_index::SpatialIndex::persist`]/`load`,
//! which already implement the other half of this same artifact set.

use std::collections::HashMap;
use std::collections::HashSet;
use std::io::{Read, Write};

use routing_core::{EdgeBasedNodeId, FixedPoint, NameId, NodeId, PackedGeometryId};

use crate::edge_based_graph::{EdgeBasedEdge, EdgeBasedNode};
use crate::error::{KernelError, KernelResult};
use crate::geometry::{CompressedEdgeContainer, GeometryRecord, ZippedGeometry};
use crate::node_graph::{NodeBasedEdgeData, NodeBasedGraph, NodeBasedGraphBuilder};
use crate::restriction::RestrictionMap;
use crate::types::{Directionality, LaneDescriptionId, TravelMode};

/// "NBG1" — node-based graph input schema, version 1.
const INPUT_MAGIC: u32 = 0x3147_424E;

const FLAG_ROUNDABOUT: u8 = 0x01;
const FLAG_ACCESS_RESTRICTED: u8 = 0x02;
const FLAG_IGNORE_FOR_SNAPPING: u8 = 0x04;
const FLAG_CONTRAFLOW: u8 = 0x08;
const FLAG_IS_SPLIT: u8 = 0x10;

// ── Primitive reads/writes ───────────────────────────────────────────────────

fn read_u8(r: &mut impl Read) -> KernelResult<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32(r: &mut impl Read) -> KernelResult<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32(r: &mut impl Read) -> KernelResult<i32> {
    Ok(read_u32(r)? as i32)
}

fn read_u64(r: &mut impl Read) -> KernelResult<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i16(r: &mut impl Read) -> KernelResult<i16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

fn write_u8(w: &mut impl Write, v: u8) -> KernelResult<()> {
    w.write_all(&[v])?;
    Ok(())
}

fn write_u32(w: &mut impl Write, v: u32) -> KernelResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn node_id_in_range(id: u32, node_count: usize, context: &str) -> KernelResult<NodeId> {
    if id as usize >= node_count {
        return Err(KernelError::InputCorruption(format!(
            "{context}: node id {id} out of range [0, {node_count})"
        )));
    }
    Ok(NodeId(id))
}

// ── Input: serialized node-based graph (spec §6) ────────────────────────────

/// Everything parsed out of one input stream: the graph itself plus the
/// side tables `GraphCompressor`/`EdgeBasedGraphFactory` need alongside it.
pub struct ParsedInput {
    pub graph: NodeBasedGraph,
    pub restriction_map: RestrictionMap,
    pub barrier_nodes: HashSet<NodeId>,
    pub traffic_lights: HashSet<NodeId>,
    /// External (application-facing) id for each internal `NodeId`, in
    /// input order — carried through so the outer shell can translate query
    /// results back to its own id space.
    pub external_ids: Vec<u64>,
}

/// Parse the binary node-based graph input (spec §6): magic/version, node
/// records, edge records, barrier/traffic-light id lists, restriction list.
///
/// Rejects (as `KernelError::InputCorruption`) a bad magic tag, non-positive
/// weight or length, out-of-range node ids, self-loop edges, and
/// restrictions with `from == to` or referencing unknown nodes — the exact
/// boundary behaviors spec §8 calls out.
pub fn read_node_based_graph(r: &mut impl Read) -> KernelResult<ParsedInput> {
    let magic = read_u32(r)?;
    if magic != INPUT_MAGIC {
        return Err(KernelError::InputCorruption(format!(
            "bad input magic/version tag: expected {INPUT_MAGIC:#010x}, got {magic:#010x}"
        )));
    }

    let node_count = read_u32(r)? as usize;
    let mut builder = NodeBasedGraphBuilder::with_capacity(node_count, node_count);
    let mut external_ids = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let external_id = read_u64(r)?;
        let lat = read_i32(r)?;
        let lon = read_i32(r)?;
        builder.add_node(FixedPoint::new(lat, lon));
        external_ids.push(external_id);
    }

    let edge_count = read_u32(r)? as usize;
    for _ in 0..edge_count {
        let source = read_u32(r)?;
        let target = read_u32(r)?;
        let length = read_i32(r)?;
        let direction = read_u8(r)?;
        let weight = read_u32(r)?;
        let road_class = read_i16(r)?;
        let name_id = read_u32(r)?;
        let flags = read_u8(r)?;

        if length <= 0 {
            return Err(KernelError::InputCorruption(format!(
                "edge {source}->{target} has non-positive length {length}"
            )));
        }

        let source = node_id_in_range(source, node_count, "edge source")?;
        let target = node_id_in_range(target, node_count, "edge target")?;

        let directionality = match direction {
            0 => Directionality::BOTH,
            1 => Directionality::FORWARD_ONLY,
            2 => Directionality::BACKWARD_ONLY,
            other => {
                return Err(KernelError::InputCorruption(format!(
                    "edge {source}->{target} has unknown direction code {other}"
                )))
            }
        };

        let data = NodeBasedEdgeData {
            weight,
            forward: directionality.forward,
            backward: directionality.backward,
            name_id: NameId(name_id),
            road_class,
            roundabout: flags & FLAG_ROUNDABOUT != 0,
            access_restricted: flags & FLAG_ACCESS_RESTRICTED != 0,
            ignore_for_snapping: flags & FLAG_IGNORE_FOR_SNAPPING != 0,
            contraflow: flags & FLAG_CONTRAFLOW != 0,
            is_split: flags & FLAG_IS_SPLIT != 0,
            travel_mode: if flags & FLAG_ACCESS_RESTRICTED != 0 {
                TravelMode::Inaccessible
            } else {
                TravelMode::Driving
            },
            lane_description_id: LaneDescriptionId::INVALID,
            edge_based_node_id: EdgeBasedNodeId::INVALID,
        };

        // `add_road` rejects self-loops and non-positive weight itself
        // (spec §8 "self-loop in node-based input: rejected during graph
        // construction").
        builder.add_road(source, target, data)?;
    }

    let barrier_count = read_u32(r)? as usize;
    let mut barrier_nodes = HashSet::with_capacity(barrier_count);
    for _ in 0..barrier_count {
        let id = read_u32(r)?;
        barrier_nodes.insert(node_id_in_range(id, node_count, "barrier node")?);
    }

    let traffic_light_count = read_u32(r)? as usize;
    let mut traffic_lights = HashSet::with_capacity(traffic_light_count);
    for _ in 0..traffic_light_count {
        let id = read_u32(r)?;
        traffic_lights.insert(node_id_in_range(id, node_count, "traffic light node")?);
    }

    let restriction_count = read_u32(r)? as usize;
    let mut restriction_map = RestrictionMap::new();
    for _ in 0..restriction_count {
        let from = read_u32(r)?;
        let via = read_u32(r)?;
        let to = read_u32(r)?;
        let is_only = read_u8(r)? != 0;

        let from = node_id_in_range(from, node_count, "restriction from_node")?;
        let via = node_id_in_range(via, node_count, "restriction via_node")?;
        let to = node_id_in_range(to, node_count, "restriction to_node")?;

        restriction_map.insert(from, via, to, is_only)?;
    }

    let graph = builder.build()?;
    Ok(ParsedInput { graph, restriction_map, barrier_nodes, traffic_lights, external_ids })
}

// ── Output: edge-based artifacts (spec §6) ──────────────────────────────────

/// `edges` stream: `(from_ebn, to_ebn, weight, forward: u8, backward: u8)`.
pub fn write_edge_based_edges(w: &mut impl Write, edges: &[EdgeBasedEdge]) -> KernelResult<()> {
    write_u32(w, edges.len() as u32)?;
    for e in edges {
        write_u32(w, e.source.0)?;
        write_u32(w, e.target.0)?;
        write_u32(w, e.weight)?;
        write_u8(w, e.forward as u8)?;
        write_u8(w, e.backward as u8)?;
    }
    Ok(())
}

pub fn read_edge_based_edges(r: &mut impl Read) -> KernelResult<Vec<EdgeBasedEdge>> {
    let count = read_u32(r)? as usize;
    let mut edges = Vec::with_capacity(count);
    for _ in 0..count {
        let source = EdgeBasedNodeId(read_u32(r)?);
        let target = EdgeBasedNodeId(read_u32(r)?);
        let weight = read_u32(r)?;
        let forward = read_u8(r)? != 0;
        let backward = read_u8(r)? != 0;
        edges.push(EdgeBasedEdge { source, target, weight, forward, backward });
    }
    Ok(edges)
}

/// `nodes` stream: one fixed-width record per `EdgeBasedNode`. Spec §6 calls
/// out packed geometry id / name id / component id / travel mode / bearing
/// class id as the headline fields; the remaining ones are carried too so
/// the stream round-trips the full record the query side needs.
pub fn write_edge_based_nodes(w: &mut impl Write, nodes: &[EdgeBasedNode]) -> KernelResult<()> {
    write_u32(w, nodes.len() as u32)?;
    for n in nodes {
        write_u32(w, n.id.0)?;
        write_u32(w, n.u.0)?;
        write_u32(w, n.v.0)?;
        write_u32(w, n.name_id.0)?;
        write_u32(w, n.packed_geometry_id.0)?;
        write_u32(w, n.component_id.0)?;
        write_u8(w, n.belongs_to_tiny_component as u8)?;
        write_u32(w, n.forward_segment_id.0)?;
        write_u32(w, n.reverse_segment_id.0)?;
        write_u8(w, travel_mode_to_u8(n.travel_mode))?;
        write_u32(w, n.bearing_class_id.0)?;
        write_u32(w, n.entry_class_id.0)?;
    }
    Ok(())
}

pub fn read_edge_based_nodes(r: &mut impl Read) -> KernelResult<Vec<EdgeBasedNode>> {
    let count = read_u32(r)? as usize;
    let mut nodes = Vec::with_capacity(count);
    for _ in 0..count {
        let id = EdgeBasedNodeId(read_u32(r)?);
        let u = NodeId(read_u32(r)?);
        let v = NodeId(read_u32(r)?);
        let name_id = NameId(read_u32(r)?);
        let packed_geometry_id = PackedGeometryId(read_u32(r)?);
        let component_id = routing_core::ComponentId(read_u32(r)?);
        let belongs_to_tiny_component = read_u8(r)? != 0;
        let forward_segment_id = EdgeBasedNodeId(read_u32(r)?);
        let reverse_segment_id = EdgeBasedNodeId(read_u32(r)?);
        let travel_mode = travel_mode_from_u8(read_u8(r)?)?;
        let bearing_class_id = routing_core::BearingClassId(read_u32(r)?);
        let entry_class_id = routing_core::EntryClassId(read_u32(r)?);
        nodes.push(EdgeBasedNode {
            id,
            u,
            v,
            name_id,
            packed_geometry_id,
            component_id,
            belongs_to_tiny_component,
            forward_segment_id,
            reverse_segment_id,
            travel_mode,
            bearing_class_id,
            entry_class_id,
        });
    }
    Ok(nodes)
}

fn travel_mode_to_u8(m: TravelMode) -> u8 {
    match m {
        TravelMode::Inaccessible => 0,
        TravelMode::Driving => 1,
        TravelMode::Cycling => 2,
        TravelMode::Walking => 3,
    }
}

fn travel_mode_from_u8(v: u8) -> KernelResult<TravelMode> {
    match v {
        0 => Ok(TravelMode::Inaccessible),
        1 => Ok(TravelMode::Driving),
        2 => Ok(TravelMode::Cycling),
        3 => Ok(TravelMode::Walking),
        other => Err(KernelError::InvariantViolation(format!("unknown travel mode tag {other}"))),
    }
}

/// `geometry` stream: two length-prefixed sections — unzipped per-edge
/// buckets, then zipped bothway vectors — each bucket/vector itself
/// length-prefixed (spec §6).
pub fn write_geometry(w: &mut impl Write, geometry: &CompressedEdgeContainer) -> KernelResult<()> {
    let buckets: Vec<_> = geometry.iter_buckets().collect();
    write_u32(w, buckets.len() as u32)?;
    for (edge_id, bucket) in buckets {
        write_u32(w, edge_id.0)?;
        write_u32(w, bucket.len() as u32)?;
        for rec in bucket {
            write_u32(w, rec.node.0)?;
            write_u32(w, rec.cumulative_weight)?;
        }
    }

    let zipped = geometry.zipped_slice();
    write_u32(w, zipped.len() as u32)?;
    for z in zipped {
        write_u32(w, z.nodes.len() as u32)?;
        for &n in &z.nodes {
            write_u32(w, n.0)?;
        }
        for &fw in &z.forward_weight {
            write_u32(w, fw)?;
        }
        for &rw in &z.reverse_weight {
            write_u32(w, rw)?;
        }
    }
    Ok(())
}

pub fn read_geometry(r: &mut impl Read) -> KernelResult<CompressedEdgeContainer> {
    let bucket_count = read_u32(r)? as usize;
    let mut buckets = HashMap::with_capacity(bucket_count);
    for _ in 0..bucket_count {
        let edge_id = routing_core::EdgeId(read_u32(r)?);
        let len = read_u32(r)? as usize;
        let mut bucket = Vec::with_capacity(len);
        for _ in 0..len {
            let node = NodeId(read_u32(r)?);
            let cumulative_weight = read_u32(r)?;
            bucket.push(GeometryRecord { node, cumulative_weight });
        }
        buckets.insert(edge_id, bucket);
    }

    let zipped_count = read_u32(r)? as usize;
    let mut zipped = Vec::with_capacity(zipped_count);
    for _ in 0..zipped_count {
        let len = read_u32(r)? as usize;
        let mut nodes = Vec::with_capacity(len);
        for _ in 0..len {
            nodes.push(NodeId(read_u32(r)?));
        }
        let mut forward_weight = Vec::with_capacity(len);
        for _ in 0..len {
            forward_weight.push(read_u32(r)?);
        }
        let mut reverse_weight = Vec::with_capacity(len);
        for _ in 0..len {
            reverse_weight.push(read_u32(r)?);
        }
        zipped.push(ZippedGeometry { nodes, forward_weight, reverse_weight });
    }

    Ok(CompressedEdgeContainer::from_parts(buckets, zipped))
}
