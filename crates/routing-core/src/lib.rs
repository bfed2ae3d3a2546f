//! `routing-core` — foundational types for the offline routing graph kernel.
//!
//! This crate is a dependency of `routing-graph` (and any HTTP/CLI shell
//! built around it). It intentionally has no dependency on `routing-graph`
//! and minimal external ones (only `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                   |
//! |---------------|-------------------------------------------------------------|
//! | [`ids`]       | `NodeId`, `EdgeId`, `EdgeBasedNodeId`, `ComponentId`, …      |
//! | [`geo`]       | `FixedPoint` (1e-6 degree lat/lon), mercator projection      |
//! | [`config`]    | `BuildConfig` — every kernel tunable                         |
//! | [`observer`]  | `BuildObserver` progress-reporting trait                      |
//! | [`error`]     | `SkipReason` — why a turn was rejected (a value, not an error)|
//!
//! # Feature flags
//!
//! | Flag    | Effect                                               |
//! |---------|-------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.    |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod observer;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::BuildConfig;
pub use error::SkipReason;
pub use geo::{FixedPoint, MercatorPoint, MercatorRect};
pub use ids::{
    BearingClassId, ComponentId, EdgeBasedNodeId, EdgeId, EntryClassId, LaneDescriptionId, NameId,
    NodeId, PackedGeometryId, RestrictionBucketId,
};
pub use observer::{BuildObserver, NoopObserver};
