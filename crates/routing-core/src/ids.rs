//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony. The inner integer is `pub` to allow
//! direct indexing into SoA `Vec`s via `id.0 as usize`, but callers should
//! prefer the `.index()` helpers for clarity.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" / tombstone marker.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// `true` if this id is the [`Self::INVALID`] sentinel.
            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self.0 != <$inner>::MAX
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a node in the node-based graph (C1).
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a directed edge in the node-based graph (C1). Doubles as the
    /// dense id used by [`CompressedEdgeContainer`](routing-graph) buckets.
    pub struct EdgeId(u32);
}

typed_id! {
    /// Index of an edge-based node — one directional traversal of a
    /// surviving node-based edge (C5).
    pub struct EdgeBasedNodeId(u32);
}

typed_id! {
    /// Index of a strongly-connected component (C7).
    pub struct ComponentId(u32);
}

typed_id! {
    /// Index of a restriction bucket in `RestrictionMap` (C3).
    pub struct RestrictionBucketId(u32);
}

typed_id! {
    /// Index of a packed (zipped, bothway) geometry in
    /// `CompressedEdgeContainer` (C2).
    pub struct PackedGeometryId(u32);
}

typed_id! {
    /// Opaque index into the application's street-name table. Carried but
    /// never interpreted by the kernel.
    pub struct NameId(u32);
}

typed_id! {
    /// Opaque index into a lane-description table. Carried but never
    /// interpreted by the kernel; preserved across compression by keeping
    /// whichever of the two contracted edges' id is non-empty (the one
    /// closer to the intersection wins when both are present).
    pub struct LaneDescriptionId(u32);
}

typed_id! {
    /// Index into the deduplicated dictionary of `BearingClass` values (C5
    /// step 4): the discretized, sorted set of outgoing bearings available
    /// at a node-based intersection.
    pub struct BearingClassId(u32);
}

typed_id! {
    /// Index into the deduplicated dictionary of `EntryClass` values (C5
    /// step 4): which bearings of a node's `BearingClass` were actually
    /// reachable from one particular incoming edge.
    pub struct EntryClassId(u32);
}
