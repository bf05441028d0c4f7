#![forbid(unsafe_code)]

//! Proportional sizing engine for tiled sibling containers.
//!
//! Each group of siblings laid out along one axis is a [`FlexModel`] whose
//! sizes are fixed-point proportions summing to [`NORMAL`]. The
//! [`FlexRegistry`] keeps one model per live group, folds host snapshots into
//! them and flexes the focused item's groups.
//!
//! ```
//! use flexwm_layout::{Axis, FlexRegistry, NodeId, UpdateDescriptor};
//!
//! let mut registry = FlexRegistry::default();
//! let group = UpdateDescriptor::new(
//!     NodeId::new(1),
//!     Axis::Horizontal,
//!     [(NodeId::new(10), 960), (NodeId::new(11), 960)],
//! );
//! registry.updates(&[group], true).unwrap();
//!
//! let batch = registry.on_focus(NodeId::new(11)).unwrap();
//! assert_eq!(batch[0].items, vec![(NodeId::new(10), 381), (NodeId::new(11), 619)]);
//! ```

pub mod constraint;
pub mod error;
pub mod model;
pub mod ratio;
pub mod rebalance;
pub mod registry;
pub mod scale;
pub mod sizing;
pub mod update;

pub use constraint::{Constraint, ConstraintChain, FloorKind, ItemConstraint, Relax};
pub use error::{InvariantViolation, Result};
pub use model::{Axis, FlexEvent, FlexItem, FlexModel, NodeId, is_flexed};
pub use ratio::{GOLDEN_RATIO, Ratio};
pub use rebalance::rebalance;
pub use registry::{FlexRegistry, is_invalidated};
pub use scale::{INFER_TOTAL, NORMAL, Size, check_scale, rescale};
pub use sizing::{GlobalSizings, SizingRatios, globals};
pub use update::{ItemUpdate, RenderRequest, UpdateDescriptor};
