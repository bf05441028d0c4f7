//! Invariant violations raised by the sizing engine.
//!
//! None of these are recoverable user errors. Each one means a caller or the
//! engine itself broke the fixed-point bookkeeping, and the operation that hit
//! it must be abandoned rather than continue with a corrupted distribution.

use thiserror::Error;

use crate::model::NodeId;
use crate::scale::Size;

/// A broken engine invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A vector did not sum to the total its caller claimed.
    #[error("expected values to sum to {expected}, got {actual}")]
    ScaleMismatch { expected: Size, actual: Size },

    /// A non-zero total cannot be spread over zero values.
    #[error("cannot distribute a total of {target} over an empty vector")]
    EmptyScale { target: Size },

    /// The shrink path only accepts strictly negative deltas.
    #[error("reduction delta must be negative, got {delta}")]
    NonNegativeDelta { delta: Size },

    /// Growth events must carry a strictly positive increase.
    #[error("growth event for item {item} carries non-positive increase {increase}")]
    NonPositiveIncrease { item: NodeId, increase: Size },

    /// An item index outside the group's item list.
    #[error("item index {index} out of range for group {group} with {len} items")]
    ItemOutOfRange {
        group: NodeId,
        index: usize,
        len: usize,
    },

    /// A descriptor was compared against a model with another identity.
    #[error("update for group {update} checked against model {model}")]
    IdentityMismatch { update: NodeId, model: NodeId },
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, InvariantViolation>;
