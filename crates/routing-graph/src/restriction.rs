//! Turn restriction lookup (C3).
//!
//! Grounded on `original_source/include/extractor/restriction_map.hpp` and
//! `src/extractor/restriction_map.cpp`: a from/via prefilter (two hash sets)
//! plus a `(from, via) -> bucket` map, each bucket a small vector of
//! `(to, is_only)` pairs. All queries are expected O(1).

use std::collections::{HashMap, HashSet};

use routing_core::{NodeId, RestrictionBucketId};

use crate::error::{KernelError, KernelResult};

/// One permitted or prohibited continuation stored in a bucket.
///
/// A tagged pair rather than an inheritance hierarchy (spec §9 redesign
/// note on `RestrictionTarget`).
#[derive(Copy, Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct RestrictionTarget {
    pub to: NodeId,
    pub is_only: bool,
}

/// C3: indexed lookup of via-node / from-to turn restrictions.
#[derive(Default)]
pub struct RestrictionMap {
    starts_at: HashSet<NodeId>,
    via_nodes: HashSet<NodeId>,
    index: HashMap<(NodeId, NodeId), RestrictionBucketId>,
    buckets: Vec<Vec<RestrictionTarget>>,
}

impl RestrictionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `(from, via, to, is_only)`. An only-restriction replaces
    /// whatever targets the `(from, via)` bucket already held (only-turns
    /// are mutually exclusive with every other continuation at that turn).
    /// A prohibition inserted into a bucket that already holds an
    /// only-restriction is silently dropped.
    pub fn insert(&mut self, from: NodeId, via: NodeId, to: NodeId, is_only: bool) -> KernelResult<()> {
        if from == to {
            return Err(KernelError::InputCorruption(format!(
                "restriction ({from}, {via}, {to}): from == to"
            )));
        }

        self.starts_at.insert(from);
        self.via_nodes.insert(via);

        let key = (from, via);
        let bucket_id = *self.index.entry(key).or_insert_with(|| {
            let id = RestrictionBucketId(self.buckets.len() as u32);
            self.buckets.push(Vec::new());
            id
        });
        let bucket = &mut self.buckets[bucket_id.index()];

        if is_only {
            bucket.clear();
            bucket.push(RestrictionTarget { to, is_only: true });
            return Ok(());
        }

        if bucket.iter().any(|t| t.is_only) {
            return Ok(());
        }
        bucket.push(RestrictionTarget { to, is_only: false });
        Ok(())
    }

    #[inline]
    pub fn is_via_node(&self, n: NodeId) -> bool {
        self.via_nodes.contains(&n)
    }

    #[inline]
    pub fn starts_at(&self, u: NodeId) -> bool {
        self.starts_at.contains(&u)
    }

    fn bucket(&self, u: NodeId, v: NodeId) -> Option<&[RestrictionTarget]> {
        self.index.get(&(u, v)).map(|id| self.buckets[id.index()].as_slice())
    }

    /// If `(u, v)` carries an only-restriction, the mandated target;
    /// otherwise `None`.
    pub fn check_only_turn(&self, u: NodeId, v: NodeId) -> Option<NodeId> {
        self.bucket(u, v)?.iter().find(|t| t.is_only).map(|t| t.to)
    }

    /// True iff the turn `u -> v -> w` is prohibited: either a matching
    /// prohibition exists, or an only-restriction exists whose mandated
    /// target is not `w`.
    pub fn is_restricted(&self, u: NodeId, v: NodeId, w: NodeId) -> bool {
        let Some(bucket) = self.bucket(u, v) else { return false };
        bucket.iter().any(|t| {
            if t.is_only {
                t.to != w
            } else {
                t.to == w
            }
        })
    }

    /// Called by `GraphCompressor` when contracting `u-v-w`: any restriction
    /// whose `(from, via)` is `(v, w)` is rewritten to start at `u` instead
    /// (the chain's surviving endpoint replaces the interior node that used
    /// to be its `from`).
    pub fn fixup_starting(&mut self, u: NodeId, v: NodeId, w: NodeId) {
        if let Some(id) = self.index.remove(&(v, w)) {
            self.starts_at.insert(u);
            self.index.insert((u, w), id);
        }
    }

    /// Called by `GraphCompressor` when contracting `u-v-w`: every
    /// restriction bucket keyed by a `via` of `v` (i.e. `(_, v)`) is
    /// rewritten to `via = w`, and, for each genuine predecessor `x` of `u`
    /// (backward-traversable neighbor of `u` other than `v`), the bucket
    /// keyed `(x, u)` has any target equal to `v` rewritten to `w`.
    ///
    /// `predecessors` must be `u`'s backward-traversable neighbors excluding
    /// `v`, as computed by the caller from the live graph — only those
    /// `(x, u)` buckets can possibly reach `v` through the node being
    /// contracted.
    pub fn fixup_arriving(&mut self, u: NodeId, v: NodeId, w: NodeId, predecessors: &[NodeId]) {
        let _ = u;
        let keys: Vec<(NodeId, NodeId)> = self.index.keys().copied().filter(|&(_, via)| via == v).collect();
        for (from, _) in keys {
            if let Some(id) = self.index.remove(&(from, v)) {
                self.via_nodes.insert(w);
                self.index.insert((from, w), id);
            }
        }

        for &x in predecessors {
            let Some(&id) = self.index.get(&(x, u)) else { continue };
            for target in self.buckets[id.index()].iter_mut() {
                if target.to == v {
                    target.to = w;
                }
            }
        }
    }
}
