//! Small data types shared across the node-based and edge-based graph
//! representations (spec §3 "supplementary entities").

use std::fmt;

/// Which vehicles an edge is passable by.
///
/// Recovered from `original_source/data_structures/node_based_graph.hpp`'s
/// `TravelMode` field (spec §3's "travel mode for each direction" on
/// `EdgeBasedNode` names the field but not its type).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum TravelMode {
    /// Not traversable by any modelled mode (used to mark a direction that
    /// does not exist, e.g. the reverse of a one-way street).
    #[default]
    Inaccessible,
    Driving,
    Cycling,
    Walking,
}

impl TravelMode {
    #[inline]
    pub fn is_accessible(self) -> bool {
        !matches!(self, TravelMode::Inaccessible)
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TravelMode::Inaccessible => "inaccessible",
            TravelMode::Driving => "driving",
            TravelMode::Cycling => "cycling",
            TravelMode::Walking => "walking",
        };
        f.write_str(s)
    }
}

/// Which physical directions of a `NodeBasedEdge` are traversable.
///
/// A compact alternative to two loose `bool`s; every constructor site in the
/// kernel goes through one of the named constants so an edge can never be
/// built with both flags false (spec §3 invariant: "at least one of
/// forward/backward is true").
#[derive(Copy, Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct Directionality {
    pub forward: bool,
    pub backward: bool,
}

impl Directionality {
    pub const BOTH: Directionality = Directionality { forward: true, backward: true };
    pub const FORWARD_ONLY: Directionality = Directionality { forward: true, backward: false };
    pub const BACKWARD_ONLY: Directionality = Directionality { forward: false, backward: true };

    #[inline]
    pub fn is_valid(self) -> bool {
        self.forward || self.backward
    }

    #[inline]
    pub fn swapped(self) -> Directionality {
        Directionality { forward: self.backward, backward: self.forward }
    }
}
