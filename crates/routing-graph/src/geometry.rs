//! Compressed edge geometry container (C2).
//!
//! Maps an edge id to a "bucket": the ordered chain of intermediate nodes
//! (with cumulative weight from the edge's source) that `GraphCompressor`
//! (C4) contracted into it. An edge that was never compressed gets a
//! length-1 bucket holding just its target — geometry and routing weight
//! collapse to the same thing for an uncompressed edge.

use std::collections::HashMap;

use routing_core::{EdgeId, NodeId, PackedGeometryId};

use crate::error::{KernelError, KernelResult};

/// One hop of a compressed chain: the node reached, and the cumulative
/// weight from the owning edge's source to that node.
#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct GeometryRecord {
    pub node: NodeId,
    pub cumulative_weight: u32,
}

/// The forward/reverse geometry of one physical (bothway) road, merged into
/// a single indexable vector keyed by [`PackedGeometryId`].
///
/// `nodes`, `forward_weight`, and `reverse_weight` are parallel arrays of
/// length `n + 1`, where `n` is the length of the original per-direction
/// buckets: position 0 is the forward edge's source, position `n` is its
/// target, and everything between is the chain's interior nodes.
/// `forward_weight[i]` is the cumulative weight travelling source→target up
/// to `nodes[i]`; `reverse_weight[i]` is the remaining weight travelling
/// target→source from `nodes[i]`. `forward_weight[0] == 0`,
/// `reverse_weight[n] == 0`, and `forward_weight[i] + reverse_weight[i]` is
/// constant (the edge's total weight) for every `i`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ZippedGeometry {
    pub nodes: Vec<NodeId>,
    pub forward_weight: Vec<u32>,
    pub reverse_weight: Vec<u32>,
}

impl ZippedGeometry {
    pub fn total_weight(&self) -> u32 {
        *self.forward_weight.last().unwrap_or(&0)
    }
}

/// C2: maps `EdgeId -> bucket` plus the zipped (bothway) geometries built
/// from pairs of buckets.
#[derive(Default)]
pub struct CompressedEdgeContainer {
    buckets: HashMap<EdgeId, Vec<GeometryRecord>>,
    zipped: Vec<ZippedGeometry>,
}

impl CompressedEdgeContainer {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_or_default(&self, edge: EdgeId, default_node: NodeId, default_weight: u32) -> Vec<GeometryRecord> {
        self.buckets
            .get(&edge)
            .cloned()
            .unwrap_or_else(|| vec![GeometryRecord { node: default_node, cumulative_weight: default_weight }])
    }

    /// Contract `u–v–w`: fold `edge_2`'s bucket onto `edge_1`'s, shifting
    /// `edge_2`'s cumulative weights by `weight1` (edge_1's weight *before*
    /// this merge). `edge_2` is retired — its bucket is dropped and must
    /// not be queried afterwards.
    pub fn compress(
        &mut self,
        edge_1: EdgeId,
        edge_2: EdgeId,
        v: NodeId,
        w: NodeId,
        weight1: u32,
        weight2: u32,
    ) {
        let bucket_1 = self.bucket_or_default(edge_1, v, weight1);
        let bucket_2 = self.bucket_or_default(edge_2, w, weight2);

        let mut merged = bucket_1;
        merged.extend(bucket_2.into_iter().map(|r| GeometryRecord {
            node: r.node,
            cumulative_weight: r.cumulative_weight + weight1,
        }));

        self.buckets.insert(edge_1, merged);
        self.buckets.remove(&edge_2);
    }

    /// Give every edge still lacking a bucket (i.e. never compressed) a
    /// length-1 bucket. Must run after all `compress` calls for the build.
    pub fn add_uncompressed(&mut self, edge: EdgeId, target: NodeId, weight: u32) {
        self.buckets
            .entry(edge)
            .or_insert_with(|| vec![GeometryRecord { node: target, cumulative_weight: weight }]);
    }

    pub fn get_bucket(&self, edge: EdgeId) -> Option<&[GeometryRecord]> {
        self.buckets.get(&edge).map(|v| v.as_slice())
    }

    /// Pack a one-way edge's bucket on its own, with no reverse counterpart
    /// to zip against. `reverse_weight` is still populated as "remaining
    /// distance to the target", so the record is usable for snapping even
    /// though the opposite direction does not exist for routing.
    pub fn pack_single(&mut self, edge: EdgeId, source: NodeId) -> KernelResult<PackedGeometryId> {
        let bucket = self
            .get_bucket(edge)
            .ok_or_else(|| KernelError::InvariantViolation(format!("no bucket for edge {edge}")))?;
        let total = bucket.last().map(|r| r.cumulative_weight).unwrap_or(0);

        let mut nodes = Vec::with_capacity(bucket.len() + 1);
        let mut forward_weight = Vec::with_capacity(bucket.len() + 1);
        let mut reverse_weight = Vec::with_capacity(bucket.len() + 1);

        nodes.push(source);
        forward_weight.push(0);
        reverse_weight.push(total);
        for r in bucket {
            nodes.push(r.node);
            forward_weight.push(r.cumulative_weight);
            reverse_weight.push(total - r.cumulative_weight);
        }

        let id = PackedGeometryId(self.zipped.len() as u32);
        self.zipped.push(ZippedGeometry { nodes, forward_weight, reverse_weight });
        Ok(id)
    }

    /// Merge the forward and reverse buckets of one physical road into a
    /// single zipped (bothway) geometry. Fails with `InvariantViolation` if
    /// the two buckets disagree in length (spec §3 invariant: "for a zipped
    /// edge, `forward_bucket.size() == reverse_bucket.size()`").
    pub fn zip_edges(
        &mut self,
        forward_edge: EdgeId,
        reverse_edge: EdgeId,
        source: NodeId,
    ) -> KernelResult<PackedGeometryId> {
        let fwd = self.get_bucket(forward_edge).ok_or_else(|| {
            KernelError::InvariantViolation(format!("no bucket for forward edge {forward_edge}"))
        })?;
        let rev = self.get_bucket(reverse_edge).ok_or_else(|| {
            KernelError::InvariantViolation(format!("no bucket for reverse edge {reverse_edge}"))
        })?;
        if fwd.len() != rev.len() {
            return Err(KernelError::InvariantViolation(format!(
                "zip_edges: forward bucket length {} != reverse bucket length {}",
                fwd.len(),
                rev.len()
            )));
        }

        let n = fwd.len();

        let mut nodes = Vec::with_capacity(n + 1);
        let mut forward_weight = Vec::with_capacity(n + 1);
        let mut reverse_weight = vec![0u32; n + 1];

        nodes.push(source);
        forward_weight.push(0);

        for r in fwd {
            nodes.push(r.node);
            forward_weight.push(r.cumulative_weight);
        }

        // `rev` walks the same physical chain from the opposite endpoint:
        // rev[j] reaches nodes[n - 1 - j], with its own cumulative weight
        // independent of fwd's. reverse_weight[n] stays 0 (the reverse
        // edge's own target, already the zeroed default).
        for (j, r) in rev.iter().enumerate() {
            reverse_weight[n - 1 - j] = r.cumulative_weight;
        }

        let id = PackedGeometryId(self.zipped.len() as u32);
        self.zipped.push(ZippedGeometry { nodes, forward_weight, reverse_weight });
        Ok(id)
    }

    pub fn get_packed(&self, id: PackedGeometryId) -> &ZippedGeometry {
        &self.zipped[id.index()]
    }

    pub fn packed_count(&self) -> usize {
        self.zipped.len()
    }

    /// Every unzipped bucket, for the `geometry` artifact writer (io.rs).
    pub fn iter_buckets(&self) -> impl Iterator<Item = (EdgeId, &[GeometryRecord])> {
        self.buckets.iter().map(|(&id, bucket)| (id, bucket.as_slice()))
    }

    pub fn zipped_slice(&self) -> &[ZippedGeometry] {
        &self.zipped
    }

    /// Rebuild from the two sections of the `geometry` artifact, read back
    /// by io.rs. Bypasses `compress`/`zip_edges` entirely — those invariants
    /// were already enforced when the artifact was written.
    pub fn from_parts(buckets: HashMap<EdgeId, Vec<GeometryRecord>>, zipped: Vec<ZippedGeometry>) -> Self {
        Self { buckets, zipped }
    }
}
