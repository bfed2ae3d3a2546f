//! Persistent R-tree over edge-based node segments (C6).
//!
//! Fanout-`F`, leaf-capacity-`L` bounding-rectangle tree in web-mercator
//! space (spec §4.6). Built by Hilbert-curve sort + bottom-up packing, not
//! by incremental insertion — there is no query-time mutation to support,
//! unlike `rstar`'s general-purpose tree (used elsewhere in this workspace's
//! ancestry for exactly that reason; this component instead needs the
//! on-disk leaf/RAM-index split spelled out in spec §6, so it's hand-rolled
//! and persisted with `zerocopy` (leaf file, fixed-stride positioned reads)
//! and `bincode` (RAM-index file), following the persistence idioms in
//! `other_examples/`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};

use routing_core::{EdgeBasedNodeId, FixedPoint, MercatorPoint, MercatorRect, NodeId};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::edge_based_graph::EdgeBasedNodeSegment;
use crate::error::{KernelError, KernelResult};

/// A snapped query result: the foot of the perpendicular from a query
/// coordinate onto a segment, with its fractional position and prorated
/// forward/reverse weights for search initialization (spec GLOSSARY
/// "Phantom node").
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhantomNode {
    pub location: FixedPoint,
    pub forward_segment_id: EdgeBasedNodeId,
    pub reverse_segment_id: EdgeBasedNodeId,
    pub fraction_along: f64,
    pub forward_weight: u32,
    pub reverse_weight: u32,
    pub distance_m: f64,
}

/// On-disk, fixed-stride leaf entry. Padding slots (when a leaf holds fewer
/// than `L` live segments) use `u32::MAX` as `forward_segment_id`.
///
/// Fields are native-width/native-endian, not the LE-wrapped types a
/// cross-platform tile format would use: this index is a single build's own
/// artifact, read back only by the same kernel version on the machine (or
/// architecture-compatible fleet) that built it. Reads go through
/// `read_from_bytes`/`as_bytes`, which copy rather than cast in place, so
/// the record doesn't need to be `Unaligned`.
#[derive(Copy, Clone, Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct SegmentRecord {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    /// The segment's actual endpoints in mercator space — distinct from the
    /// bbox corners above whenever the segment runs from upper-left to
    /// lower-right (or vice versa), which the bbox alone can't distinguish.
    p_u_x: f64,
    p_u_y: f64,
    p_v_x: f64,
    p_v_y: f64,
    forward_segment_id: u32,
    reverse_segment_id: u32,
    u: u32,
    v: u32,
    position_in_geometry: u32,
    /// Total routing weight of the *sub-segment* `u -> v` (one hop of the
    /// owning edge's packed geometry, not the whole edge), in both
    /// directions. Lets a snap prorate weight by `fraction_along` without
    /// `SpatialIndex` needing to hold a reference to the geometry container.
    sub_segment_forward_weight: u32,
    sub_segment_reverse_weight: u32,
    is_startpoint: u8,
    _pad: [u8; 3],
}

const PADDING_SENTINEL: u32 = u32::MAX;

impl SegmentRecord {
    fn padding() -> Self {
        SegmentRecord {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
            p_u_x: 0.0,
            p_u_y: 0.0,
            p_v_x: 0.0,
            p_v_y: 0.0,
            forward_segment_id: PADDING_SENTINEL,
            reverse_segment_id: PADDING_SENTINEL,
            u: 0,
            v: 0,
            position_in_geometry: 0,
            sub_segment_forward_weight: 0,
            sub_segment_reverse_weight: 0,
            is_startpoint: 0,
            _pad: [0; 3],
        }
    }

    fn is_padding(&self) -> bool {
        self.forward_segment_id == PADDING_SENTINEL
    }

    fn bbox(&self) -> MercatorRect {
        MercatorRect { min_x: self.min_x, min_y: self.min_y, max_x: self.max_x, max_y: self.max_y }
    }

    fn to_segment(self) -> IndexedSegment {
        IndexedSegment {
            forward_segment_id: EdgeBasedNodeId(self.forward_segment_id),
            reverse_segment_id: if self.reverse_segment_id == PADDING_SENTINEL {
                EdgeBasedNodeId::INVALID
            } else {
                EdgeBasedNodeId(self.reverse_segment_id)
            },
            u: NodeId(self.u),
            v: NodeId(self.v),
            position_in_geometry: self.position_in_geometry,
            sub_segment_forward_weight: self.sub_segment_forward_weight,
            sub_segment_reverse_weight: self.sub_segment_reverse_weight,
            is_startpoint: self.is_startpoint != 0,
            bbox: self.bbox(),
            p_u: MercatorPoint { x: self.p_u_x, y: self.p_u_y },
            p_v: MercatorPoint { x: self.p_v_x, y: self.p_v_y },
        }
    }
}

/// A [`EdgeBasedNodeSegment`] plus its precomputed mercator bounding box and
/// endpoints, the in-memory form `SpatialIndex` actually queries against.
#[derive(Copy, Clone, Debug)]
struct IndexedSegment {
    forward_segment_id: EdgeBasedNodeId,
    reverse_segment_id: EdgeBasedNodeId,
    u: NodeId,
    v: NodeId,
    position_in_geometry: u32,
    sub_segment_forward_weight: u32,
    sub_segment_reverse_weight: u32,
    is_startpoint: bool,
    bbox: MercatorRect,
    p_u: MercatorPoint,
    p_v: MercatorPoint,
}

/// In-memory branch tree entry (spec §6 `ramIndex`); persisted via its
/// `PersistedBranch`/`bincode` mirror below, not directly as raw bytes.
#[derive(Copy, Clone, Debug)]
struct BranchRecord {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    first_child_or_leaf_offset: u32,
    child_count: u32,
    /// 0 = branch (children are more `BranchRecord`s), 1 = leaf_ref
    /// (`first_child_or_leaf_offset` indexes the leaf file).
    kind: u8,
    _pad: [u8; 7],
}

const KIND_BRANCH: u8 = 0;
const KIND_LEAF: u8 = 1;

impl BranchRecord {
    fn bbox(&self) -> MercatorRect {
        MercatorRect { min_x: self.min_x, min_y: self.min_y, max_x: self.max_x, max_y: self.max_y }
    }
}

/// C6: the built, queryable spatial index. `leaves` and `branches` are the
/// in-memory mirror of the persisted leaf file / RAM-index file.
pub struct SpatialIndex {
    leaf_capacity: usize,
    fanout: usize,
    leaves: Vec<Vec<IndexedSegment>>,
    branches: Vec<BranchRecord>,
    root: usize,
}

impl SpatialIndex {
    /// Build from an unordered set of segments. Sorts by Hilbert order on
    /// bounding-box centroid, packs leaves of exactly `leaf_capacity`
    /// entries (last short), then recursively packs `fanout` children per
    /// branch until a single root remains (spec §4.6 "Build").
    pub fn build<F>(
        segments: Vec<EdgeBasedNodeSegment>,
        node_position: F,
        leaf_capacity: usize,
        fanout: usize,
    ) -> KernelResult<SpatialIndex>
    where
        F: Fn(NodeId) -> FixedPoint,
    {
        if segments.is_empty() {
            return Ok(SpatialIndex { leaf_capacity, fanout, leaves: Vec::new(), branches: Vec::new(), root: 0 });
        }

        let mut indexed: Vec<IndexedSegment> = segments
            .into_iter()
            .map(|s| {
                let pu = node_position(s.u).to_mercator();
                let pv = node_position(s.v).to_mercator();
                IndexedSegment {
                    forward_segment_id: s.forward_segment_id,
                    reverse_segment_id: s.reverse_segment_id,
                    u: s.u,
                    v: s.v,
                    position_in_geometry: s.position_in_geometry,
                    sub_segment_forward_weight: s.sub_segment_forward_weight,
                    sub_segment_reverse_weight: s.sub_segment_reverse_weight,
                    is_startpoint: s.is_startpoint,
                    bbox: MercatorRect::from_points(pu, pv),
                    p_u: pu,
                    p_v: pv,
                }
            })
            .collect();

        #[cfg(feature = "parallel")]
        {
            use rayon::slice::ParallelSliceMut;
            indexed.par_sort_unstable_by_key(|s| hilbert_rank(s.bbox.centroid()));
        }
        #[cfg(not(feature = "parallel"))]
        {
            indexed.sort_unstable_by_key(|s| hilbert_rank(s.bbox.centroid()));
        }

        let leaves: Vec<Vec<IndexedSegment>> = indexed.chunks(leaf_capacity).map(|c| c.to_vec()).collect();

        let mut branches: Vec<BranchRecord> = Vec::new();
        // Leaf level: one leaf_ref branch record per leaf.
        let mut level: Vec<usize> = Vec::with_capacity(leaves.len());
        for (i, leaf) in leaves.iter().enumerate() {
            let bbox = leaf.iter().fold(leaf[0].bbox, |acc, s| acc.union(s.bbox));
            branches.push(BranchRecord {
                min_x: bbox.min_x,
                min_y: bbox.min_y,
                max_x: bbox.max_x,
                max_y: bbox.max_y,
                first_child_or_leaf_offset: i as u32,
                child_count: 0,
                kind: KIND_LEAF,
                _pad: [0; 7],
            });
            level.push(branches.len() - 1);
        }

        // Pack fanout consecutive nodes per parent until one root remains.
        while level.len() > 1 {
            let mut next_level = Vec::with_capacity(level.len().div_ceil(fanout));
            for chunk in level.chunks(fanout) {
                let bbox = chunk
                    .iter()
                    .map(|&idx| branches[idx].bbox())
                    .reduce(MercatorRect::union)
                    .expect("chunk is non-empty");
                let first_child = chunk[0];
                branches.push(BranchRecord {
                    min_x: bbox.min_x,
                    min_y: bbox.min_y,
                    max_x: bbox.max_x,
                    max_y: bbox.max_y,
                    first_child_or_leaf_offset: first_child as u32,
                    child_count: chunk.len() as u32,
                    kind: KIND_BRANCH,
                    _pad: [0; 7],
                });
                next_level.push(branches.len() - 1);
            }
            level = next_level;
        }

        let root = level[0];
        Ok(SpatialIndex { leaf_capacity, fanout, leaves, branches, root })
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Up to `k` nearest segments whose `is_startpoint` is true, nearest
    /// first, ties broken by increasing segment id (spec §5 "ordering
    /// guarantees"). Optional bearing filter is applied post-snap.
    pub fn nearest(
        &self,
        coord: FixedPoint,
        k: usize,
        bearing: Option<(f64, f64)>,
    ) -> Vec<PhantomNode> {
        self.nearest_impl(coord, k, None, bearing)
    }

    /// As [`Self::nearest`] but bounded by a great-circle radius in metres,
    /// with early exit once the queue's best lower bound exceeds it.
    pub fn nearest_in_range(
        &self,
        coord: FixedPoint,
        radius_meters: f64,
        bearing: Option<(f64, f64)>,
    ) -> Vec<PhantomNode> {
        self.nearest_impl(coord, usize::MAX, Some(radius_meters), bearing)
    }

    fn nearest_impl(
        &self,
        coord: FixedPoint,
        k: usize,
        radius_meters: Option<f64>,
        bearing: Option<(f64, f64)>,
    ) -> Vec<PhantomNode> {
        if self.is_empty() {
            return Vec::new();
        }
        let query = coord.to_mercator();

        let mut heap: std::collections::BinaryHeap<HeapEntry> = std::collections::BinaryHeap::new();
        heap.push(HeapEntry { neg_dist: -self.branches[self.root].bbox().min_squared_distance(query), node: QueueNode::Branch(self.root) });

        let mut results: Vec<PhantomNode> = Vec::new();

        while let Some(HeapEntry { neg_dist, node }) = heap.pop() {
            let lower_bound_sq = -neg_dist;
            if let Some(radius) = radius_meters {
                // Web-mercator's scale factor (1/cos(lat)) only grows past 1
                // away from the equator, so a mercator-space lower bound is
                // never smaller than the true great-circle one. Pad the cutoff
                // well past the nominal radius rather than prune on it
                // directly — the per-candidate check below still applies the
                // exact haversine radius.
                if lower_bound_sq.sqrt() > radius * 4.0 {
                    break;
                }
            }
            if results.len() >= k {
                break;
            }

            match node {
                QueueNode::Branch(idx) => {
                    let branch = self.branches[idx];
                    if branch.kind == KIND_LEAF {
                        let leaf_idx = branch.first_child_or_leaf_offset as usize;
                        for (seg_idx, seg) in self.leaves[leaf_idx].iter().enumerate() {
                            if !seg.is_startpoint {
                                continue;
                            }
                            let d = seg.bbox.min_squared_distance(query);
                            heap.push(HeapEntry { neg_dist: -d, node: QueueNode::Segment(leaf_idx, seg_idx) });
                        }
                    } else {
                        let first = branch.first_child_or_leaf_offset as usize;
                        let count = branch.child_count as usize;
                        for child in first..first + count {
                            let d = self.branches[child].bbox().min_squared_distance(query);
                            heap.push(HeapEntry { neg_dist: -d, node: QueueNode::Branch(child) });
                        }
                    }
                }
                // A segment popped for the first time only has a lower-bound
                // distance (its bbox, which is looser than the true
                // point-to-segment distance off the diagonal). Push it back
                // with its exact distance and only finalize on the re-pop,
                // so a later bbox-cheap candidate can't jump ahead of a
                // segment whose true distance is actually smaller.
                QueueNode::Segment(leaf_idx, seg_idx) => {
                    let seg = self.leaves[leaf_idx][seg_idx];
                    if let Some(phantom) = project_onto_segment(coord, seg) {
                        let exact_sq = query.squared_distance(phantom.location.to_mercator());
                        heap.push(HeapEntry { neg_dist: -exact_sq, node: QueueNode::Exact(Box::new(phantom)) });
                    }
                }
                QueueNode::Exact(phantom) => {
                    if let Some(radius) = radius_meters {
                        if phantom.distance_m > radius {
                            continue;
                        }
                    }
                    if bearing_allows(bearing, phantom.location, coord) {
                        results.push(*phantom);
                    }
                }
            }
        }

        results
    }

    /// Bounding-box range query: every segment whose box intersects `bbox`.
    pub fn search(&self, bbox: MercatorRect) -> Vec<EdgeBasedNodeSegment> {
        let mut out = Vec::new();
        if self.is_empty() {
            return out;
        }
        self.search_node(self.root, bbox, &mut out);
        out
    }

    fn search_node(&self, idx: usize, bbox: MercatorRect, out: &mut Vec<EdgeBasedNodeSegment>) {
        let branch = self.branches[idx];
        if !branch.bbox().intersects(bbox) {
            return;
        }
        if branch.kind == KIND_LEAF {
            let leaf_idx = branch.first_child_or_leaf_offset as usize;
            for seg in &self.leaves[leaf_idx] {
                if seg.bbox.intersects(bbox) {
                    out.push(EdgeBasedNodeSegment {
                        forward_segment_id: seg.forward_segment_id,
                        reverse_segment_id: seg.reverse_segment_id,
                        u: seg.u,
                        v: seg.v,
                        position_in_geometry: seg.position_in_geometry,
                        sub_segment_forward_weight: seg.sub_segment_forward_weight,
                        sub_segment_reverse_weight: seg.sub_segment_reverse_weight,
                        is_startpoint: seg.is_startpoint,
                    });
                }
            }
        } else {
            let first = branch.first_child_or_leaf_offset as usize;
            let count = branch.child_count as usize;
            for child in first..first + count {
                self.search_node(child, bbox, out);
            }
        }
    }

    /// Write the leaf file (fixed-stride, `zerocopy`) and the RAM-index
    /// file (`bincode`) with a shared checksum the loader verifies (spec §6
    /// persistence contract).
    pub fn persist(&self, leaf_path: &std::path::Path, ram_index_path: &std::path::Path) -> KernelResult<()> {
        let mut leaf_bytes: Vec<u8> = Vec::new();
        for leaf in &self.leaves {
            for i in 0..self.leaf_capacity {
                let record = match leaf.get(i) {
                    Some(s) => SegmentRecord {
                        min_x: s.bbox.min_x,
                        min_y: s.bbox.min_y,
                        max_x: s.bbox.max_x,
                        max_y: s.bbox.max_y,
                        p_u_x: s.p_u.x,
                        p_u_y: s.p_u.y,
                        p_v_x: s.p_v.x,
                        p_v_y: s.p_v.y,
                        forward_segment_id: s.forward_segment_id.0,
                        reverse_segment_id: s.reverse_segment_id.0,
                        u: s.u.0,
                        v: s.v.0,
                        position_in_geometry: s.position_in_geometry,
                        sub_segment_forward_weight: s.sub_segment_forward_weight,
                        sub_segment_reverse_weight: s.sub_segment_reverse_weight,
                        is_startpoint: s.is_startpoint as u8,
                        _pad: [0; 3],
                    },
                    None => SegmentRecord::padding(),
                };
                leaf_bytes.extend_from_slice(record.as_bytes());
            }
        }
        let checksum = fnv1a(&leaf_bytes);

        let leaf_file = File::create(leaf_path)?;
        let mut writer = BufWriter::new(leaf_file);
        writer.write_all(&checksum.to_le_bytes())?;
        writer.write_all(&leaf_bytes)?;
        writer.flush()?;

        let persisted = PersistedRamIndex {
            checksum,
            leaf_capacity: self.leaf_capacity,
            fanout: self.fanout,
            root: self.root,
            branches: self.branches.iter().map(|b| (*b).into()).collect(),
        };
        let ram_file = File::create(ram_index_path)?;
        let writer = BufWriter::new(ram_file);
        bincode::serialize_into(writer, &persisted)?;

        Ok(())
    }

    /// Load both files back, verifying the shared checksum.
    pub fn load(leaf_path: &std::path::Path, ram_index_path: &std::path::Path) -> KernelResult<SpatialIndex> {
        let ram_file = File::open(ram_index_path)?;
        let reader = BufReader::new(ram_file);
        let persisted: PersistedRamIndex = bincode::deserialize_from(reader)?;

        let mut leaf_file = File::open(leaf_path)?;
        let mut checksum_bytes = [0u8; 8];
        leaf_file.seek(SeekFrom::Start(0))?;
        leaf_file.read_exact(&mut checksum_bytes)?;
        let stored_checksum = u64::from_le_bytes(checksum_bytes);
        if stored_checksum != persisted.checksum {
            return Err(KernelError::InputCorruption(
                "leaf file / RAM-index checksum mismatch".to_string(),
            ));
        }

        let record_size = std::mem::size_of::<SegmentRecord>();
        let header_size = 8u64;
        let file_len = leaf_file.metadata()?.len();
        let leaf_stride = record_size as u64 * persisted.leaf_capacity as u64;
        let leaf_count = if leaf_stride == 0 { 0 } else { (file_len - header_size) / leaf_stride };

        let mut leaves = Vec::with_capacity(leaf_count as usize);
        let mut buf = vec![0u8; record_size * persisted.leaf_capacity];
        for i in 0..leaf_count {
            let offset = header_size + i * leaf_stride;
            leaf_file.seek(SeekFrom::Start(offset))?;
            leaf_file.read_exact(&mut buf)?;
            let mut segs = Vec::new();
            for chunk in buf.chunks_exact(record_size) {
                let record = SegmentRecord::read_from_bytes(chunk)
                    .map_err(|_| KernelError::InvariantViolation("malformed leaf record".to_string()))?;
                if !record.is_padding() {
                    segs.push(record.to_segment());
                }
            }
            leaves.push(segs);
        }

        let branches = persisted.branches.into_iter().map(BranchRecord::from).collect();

        Ok(SpatialIndex {
            leaf_capacity: persisted.leaf_capacity,
            fanout: persisted.fanout,
            leaves,
            branches,
            root: persisted.root,
        })
    }
}

/// Plain-data mirror of `BranchRecord` for `bincode` (the zerocopy struct
/// itself isn't `Serialize`).
#[derive(serde::Serialize, serde::Deserialize)]
struct PersistedBranch {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    first_child_or_leaf_offset: u32,
    child_count: u32,
    kind: u8,
}

impl From<BranchRecord> for PersistedBranch {
    fn from(b: BranchRecord) -> Self {
        PersistedBranch {
            min_x: b.min_x,
            min_y: b.min_y,
            max_x: b.max_x,
            max_y: b.max_y,
            first_child_or_leaf_offset: b.first_child_or_leaf_offset,
            child_count: b.child_count,
            kind: b.kind,
        }
    }
}

impl From<PersistedBranch> for BranchRecord {
    fn from(b: PersistedBranch) -> Self {
        BranchRecord {
            min_x: b.min_x,
            min_y: b.min_y,
            max_x: b.max_x,
            max_y: b.max_y,
            first_child_or_leaf_offset: b.first_child_or_leaf_offset,
            child_count: b.child_count,
            kind: b.kind,
            _pad: [0; 7],
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct PersistedRamIndex {
    checksum: u64,
    leaf_capacity: usize,
    fanout: usize,
    root: usize,
    branches: Vec<PersistedBranch>,
}

enum QueueNode {
    Branch(usize),
    Segment(usize, usize),
    Exact(Box<PhantomNode>),
}

struct HeapEntry {
    /// Negated squared distance, so the max-heap `BinaryHeap` pops the
    /// closest candidate first.
    neg_dist: f64,
    node: QueueNode,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.neg_dist == other.neg_dist
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.neg_dist.partial_cmp(&other.neg_dist).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Perpendicular projection of `coord` onto `seg`, in mercator space, then
/// unprojected back to a `FixedPoint` (spec §4.6 "enriched into a
/// PhantomNode").
fn project_onto_segment(coord: FixedPoint, seg: IndexedSegment) -> Option<PhantomNode> {
    let (ax, ay) = (seg.p_u.x, seg.p_u.y);
    let (bx, by) = (seg.p_v.x, seg.p_v.y);
    let (px, py) = (coord.to_mercator().x, coord.to_mercator().y);

    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 { (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0) } else { 0.0 };

    let foot_x = ax + t * dx;
    let foot_y = ay + t * dy;
    let foot = MercatorPoint { x: foot_x, y: foot_y };

    let location = unproject(foot);
    let distance_m = coord.distance_m(location);

    let forward_weight = ((seg.sub_segment_forward_weight as f64) * t).round() as u32;
    let reverse_weight = ((seg.sub_segment_reverse_weight as f64) * (1.0 - t)).round() as u32;

    Some(PhantomNode {
        location,
        forward_segment_id: seg.forward_segment_id,
        reverse_segment_id: seg.reverse_segment_id,
        fraction_along: t,
        forward_weight,
        reverse_weight,
        distance_m,
    })
}

fn unproject(p: MercatorPoint) -> FixedPoint {
    const R: f64 = 6_378_137.0;
    let lon = (p.x / R).to_degrees();
    let lat = (2.0 * (p.y / R).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    FixedPoint::from_degrees(lat, lon)
}

fn bearing_allows(bearing: Option<(f64, f64)>, location: FixedPoint, query: FixedPoint) -> bool {
    let Some((target, range)) = bearing else { return true };
    let actual = query.bearing_to(location);
    let diff = ((actual - target + 540.0) % 360.0 - 180.0).abs();
    diff <= range
}

/// Standard `d2xy`-style Hilbert-curve index at a fixed resolution,
/// computed over mercator coordinates scaled into a `[0, 2^ORDER)` grid.
const HILBERT_ORDER: u32 = 16;

fn hilbert_rank(p: MercatorPoint) -> u64 {
    const WORLD_EXTENT: f64 = 20_037_508.342_789_244; // web-mercator half-circumference, metres
    let side = 1u32 << HILBERT_ORDER;
    let nx = (((p.x + WORLD_EXTENT) / (2.0 * WORLD_EXTENT)).clamp(0.0, 1.0) * (side - 1) as f64) as u32;
    let ny = (((p.y + WORLD_EXTENT) / (2.0 * WORLD_EXTENT)).clamp(0.0, 1.0) * (side - 1) as f64) as u32;
    xy_to_hilbert_d(side, nx, ny)
}

fn xy_to_hilbert_d(n: u32, mut x: u32, mut y: u32) -> u64 {
    let mut d: u64 = 0;
    let mut s = n / 2;
    while s > 0 {
        let rx = if (x & s) > 0 { 1u32 } else { 0 };
        let ry = if (y & s) > 0 { 1u32 } else { 0 };
        d += (s as u64) * (s as u64) * ((3 * rx) ^ ry) as u64;
        // rotate
        if ry == 0 {
            if rx == 1 {
                x = s.wrapping_sub(1).wrapping_sub(x) & (n.wrapping_sub(1));
                y = s.wrapping_sub(1).wrapping_sub(y) & (n.wrapping_sub(1));
            }
            std::mem::swap(&mut x, &mut y);
        }
        s /= 2;
    }
    d
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
