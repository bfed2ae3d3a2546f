//! Build-time tunables for the graph kernel.
//!
//! Plain data only — no env var or file parsing. Loading configuration from
//! disk/CLI flags is the outer shell's responsibility (spec §1 Non-goals);
//! this struct is what that shell would construct and hand to the kernel.

/// Tunables consumed across C4–C7. Every field corresponds to a constant the
/// spec calls out as configurable (or, per §9 Open Questions, decides should
/// be configurable rather than hard-coded).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildConfig {
    /// Added to a turn's weight when the turn is a U-turn (spec §4.5 step 3g).
    pub u_turn_penalty_ms: u32,

    /// Added to a turn's weight when the via-node is a traffic light
    /// (spec §4.5 step 3f).
    pub traffic_light_penalty_ms: u32,

    /// Strongly-connected components smaller than this are flagged as tiny
    /// (spec §3 invariant 6). Default 1000, per spec.
    pub tiny_component_threshold: u32,

    /// Distance downstream of a turn's via-node used to compute the
    /// "representative coordinate" for turn-angle calculation (spec §4.5
    /// step 3, §9 Open Question #3). Default ~10 m, but configurable per the
    /// spec's resolution of that question.
    pub representative_coordinate_distance_m: f64,

    /// R-tree branching factor (spec §3, "SpatialBranch").
    pub rtree_fanout: usize,

    /// R-tree leaf capacity (spec §3, "SpatialLeaf").
    pub rtree_leaf_capacity: usize,

    /// Whether U-turns are globally permitted even where the incoming edge
    /// does not lead to a true dead-end (spec §3 invariant 4).
    pub allow_uturns_everywhere: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            u_turn_penalty_ms: 20_000,
            traffic_light_penalty_ms: 2_000,
            tiny_component_threshold: 1_000,
            representative_coordinate_distance_m: 10.0,
            rtree_fanout: 64,
            rtree_leaf_capacity: 128,
            allow_uturns_everywhere: false,
        }
    }
}
