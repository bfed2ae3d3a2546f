//! Build-progress observer trait.
//!
//! Mirrors the sim layer's `SimObserver` pattern: a plain trait with no-op
//! default methods, rather than a logging crate dependency. Implement it to
//! print progress, collect statistics, or drive a progress bar; ignore it
//! (use [`NoopObserver`]) when you don't care.

use crate::SkipReason;

/// Callbacks invoked during preprocessing (C4–C7) at points the spec calls
/// out as worth reporting.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — progress printer
///
/// ```rust
/// use routing_core::{BuildObserver, SkipReason};
///
/// struct ProgressPrinter;
///
/// impl BuildObserver for ProgressPrinter {
///     fn on_turn_rejected(&mut self, reason: SkipReason) {
///         eprintln!("turn rejected: {reason:?}");
///     }
/// }
/// ```
pub trait BuildObserver {
    /// Called periodically while `GraphCompressor` (C4) walks nodes.
    ///
    /// `visited` / `total` are node-based node counts.
    fn on_compression_progress(&mut self, _visited: usize, _total: usize) {}

    /// Called once a `GraphCompressor` pass completes.
    fn on_compression_complete(&mut self, _nodes_before: usize, _nodes_after: usize) {}

    /// Called by `EdgeBasedGraphFactory` (C5) each time a candidate turn is
    /// rejected. Rejections are "counted, not reported per-instance"
    /// (spec §7) — implementors that want per-instance detail may log here,
    /// but the kernel itself only tallies counts into `SkipCounters`.
    fn on_turn_rejected(&mut self, _reason: SkipReason) {}

    /// Called periodically while `SCCDriver` (C7) processes the call stack.
    fn on_scc_progress(&mut self, _labelled: usize, _total: usize) {}

    /// Called once the whole build (C1–C7) completes successfully.
    fn on_build_complete(&mut self, _edge_based_nodes: usize, _components: usize) {}
}

/// A [`BuildObserver`] that does nothing.
pub struct NoopObserver;

impl BuildObserver for NoopObserver {}
