//! Shared error-taxonomy pieces.
//!
//! Per spec §7, `Skipped` and `EmptyResult` are values, not errors: a
//! rejected turn is expected, ordinary output, never propagated as `Err`.
//! [`SkipReason`] is the value carried to [`crate::BuildObserver::on_turn_rejected`]
//! and tallied by `routing-graph`'s `SkipCounters`. The fatal error kinds
//! (`InputCorruption`, `InvariantViolation`, `ResourceExhaustion`) are
//! specific to the component that can produce them and live in
//! `routing-graph::error::KernelError`, following the teacher's split of a
//! lean, mostly-unused `DtError` in the core crate versus the real,
//! richly-populated error enum in the subsystem crate.

use std::fmt;

/// Why a candidate turn (C5 step 3) was not emitted as an `EdgeBasedEdge`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkipReason {
    /// `RestrictionMap::is_restricted` forbade this exact turn.
    Restricted,
    /// The turn is a U-turn and the via-node is not a true dead-end (and
    /// U-turns are not globally permitted).
    UTurn,
    /// The via-node is a barrier and the turn is not a straight pass-through.
    Barrier,
    /// An only-restriction emanates from (u, v) and this turn's target is
    /// not the mandated one.
    OnlyTurnMismatch,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::Restricted => "restricted",
            SkipReason::UTurn => "u-turn",
            SkipReason::Barrier => "barrier",
            SkipReason::OnlyTurnMismatch => "only-turn-mismatch",
        };
        f.write_str(s)
    }
}
