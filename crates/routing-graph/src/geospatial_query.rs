//! Query-side projection layer over the spatial index (C8).
//!
//! Spec §4.8: "thin projection layer on top of C6" — `nearest`/`nearest_in_range`
//! already do the perpendicular-projection enrichment in `SpatialIndex`
//! itself (C6), so this layer is mostly forwarding. What it adds is the
//! robustness helper start/end snapping needs: a tiny strongly-connected
//! component (a dead-end service road cut off by one-ways, a parking lot
//! with no through traffic) makes a technically-nearest snap useless for
//! routing, so callers that need a *routable* snap ask for "at least one
//! non-tiny candidate" instead of the raw nearest.

use routing_core::{EdgeBasedNodeId, FixedPoint, MercatorRect};

use crate::edge_based_graph::EdgeBasedNodeSegment;
use crate::spatial_index::{PhantomNode, SpatialIndex};

/// How many extra candidates to pull from the index when the caller's
/// requested `k` nearest are all tiny-component snaps and a non-tiny
/// fallback has to be searched for.
const ROBUST_CANDIDATE_POOL: usize = 32;

/// Forwards to [`SpatialIndex`], plus the tiny-component-aware snap helpers
/// spec §4.8 calls out. Borrows rather than owns: a `DataFacade` holds the
/// actual index and component table.
pub struct GeospatialQuery<'a> {
    index: &'a SpatialIndex,
    /// `belongs_to_tiny_component`, indexed by `EdgeBasedNodeId` — the same
    /// flag `SCCDriver` (C7) writes onto each `EdgeBasedNode`.
    tiny_component: &'a [bool],
}

impl<'a> GeospatialQuery<'a> {
    pub fn new(index: &'a SpatialIndex, tiny_component: &'a [bool]) -> Self {
        Self { index, tiny_component }
    }

    #[inline]
    fn is_tiny(&self, node: EdgeBasedNodeId) -> bool {
        self.tiny_component.get(node.index()).copied().unwrap_or(false)
    }

    pub fn nearest(&self, coord: FixedPoint, k: usize, bearing: Option<(f64, f64)>) -> Vec<PhantomNode> {
        self.index.nearest(coord, k, bearing)
    }

    pub fn nearest_in_range(
        &self,
        coord: FixedPoint,
        radius_meters: f64,
        bearing: Option<(f64, f64)>,
    ) -> Vec<PhantomNode> {
        self.index.nearest_in_range(coord, radius_meters, bearing)
    }

    pub fn search(&self, bbox: MercatorRect) -> Vec<EdgeBasedNodeSegment> {
        self.index.search(bbox)
    }

    /// `nearest`, but with the component guarantee spec §4.8 describes for
    /// robust start/end snapping: the result contains at least one phantom
    /// from a non-tiny component (if the wider candidate pool has one at
    /// all), and — when `include_best_tiny` is set — also the single best
    /// tiny-component candidate, even if it would otherwise have been
    /// displaced.
    pub fn nearest_robust(
        &self,
        coord: FixedPoint,
        k: usize,
        bearing: Option<(f64, f64)>,
        include_best_tiny: bool,
    ) -> Vec<PhantomNode> {
        let pool = self.index.nearest(coord, k.max(ROBUST_CANDIDATE_POOL), bearing);
        if pool.is_empty() {
            return pool;
        }

        let mut result: Vec<PhantomNode> = pool.iter().take(k.max(1)).copied().collect();

        if !result.iter().any(|p| !self.is_tiny(p.forward_segment_id)) {
            if let Some(&best_non_tiny) = pool.iter().find(|p| !self.is_tiny(p.forward_segment_id)) {
                if result.len() >= k.max(1) {
                    result.pop();
                }
                result.push(best_non_tiny);
            }
        }

        if include_best_tiny && !result.iter().any(|p| self.is_tiny(p.forward_segment_id)) {
            if let Some(&best_tiny) = pool.iter().find(|p| self.is_tiny(p.forward_segment_id)) {
                result.push(best_tiny);
            }
        }

        result
    }
}
