//! Kernel error taxonomy (spec §7).
//!
//! Only the fatal kinds are represented as `Err` variants: `InputCorruption`,
//! `InvariantViolation`, `ResourceExhaustion`. `EmptyResult` is an empty
//! `Vec`, never an error; `Skipped` is [`routing_core::SkipReason`], tallied
//! by [`crate::SkipCounters`] and reported through
//! [`routing_core::BuildObserver`] — neither ever reaches this enum.

use thiserror::Error;

/// Fatal kernel error. Builds either complete and produce a full artifact
/// set, or abort before writing any final file — there is no partial
/// success state (spec §7 "user-visible failure behavior").
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// Inconsistent counts, non-positive weights, nonexistent endpoint ids,
    /// restrictions referencing unknown nodes, self-loops.
    #[error("input corruption: {0}")]
    InputCorruption(String),

    /// An internal check failed (e.g. a zipped geometry's forward/reverse
    /// bucket lengths disagree). Treated as a bug, not a data problem.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Edge id space exhausted, or a persistent artifact could not be
    /// written/read.
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("(de)serialization error: {0}")]
    Serialization(#[from] Box<bincode::ErrorKind>),
}

pub type KernelResult<T> = Result<T, KernelError>;
