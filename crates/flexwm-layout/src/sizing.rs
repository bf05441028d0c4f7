//! Group-independent size thresholds.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ratio::{GOLDEN_RATIO, Ratio};
use crate::scale::Size;

/// Default floors and ceilings shared by every group.
///
/// Soft floors can be relaxed by the constraint chain; hard floors are the
/// absolute minimum an item is ever shrunk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalSizings {
    /// Share a newly flexed item aims for.
    pub default_flex_ratio: Ratio,
    /// Largest soft floor a flexed item may be configured with.
    pub max_flex: Size,
    /// Floor of a flexed item while the group observes soft floors.
    pub soft_min_flex: Size,
    /// Floor of a flexed item once its soft floor is relaxed.
    pub hard_min_flex: Size,
    /// Floor of an unflexed item while the group observes soft floors.
    pub soft_min_unflex: Size,
    /// Floor of an unflexed item once its soft floor is relaxed.
    pub hard_min_unflex: Size,
}

/// The ratios [`GlobalSizings`] are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingRatios {
    /// Source of [`GlobalSizings::default_flex_ratio`].
    pub default_flex: Ratio,
    /// Source of [`GlobalSizings::max_flex`].
    pub max_flex: Ratio,
    /// Source of [`GlobalSizings::soft_min_flex`].
    pub soft_min_flex: Ratio,
    /// The derived hard flex floor sits one unit above this ratio, so an
    /// item at the hard floor still holds a strict majority.
    pub hard_min_flex: Ratio,
    /// Source of [`GlobalSizings::soft_min_unflex`].
    pub soft_min_unflex: Ratio,
    /// Source of [`GlobalSizings::hard_min_unflex`].
    pub hard_min_unflex: Ratio,
}

impl Default for SizingRatios {
    fn default() -> Self {
        Self {
            default_flex: GOLDEN_RATIO,
            max_flex: Ratio::new(9, 10),
            soft_min_flex: GOLDEN_RATIO,
            hard_min_flex: Ratio::new(1, 2),
            soft_min_unflex: Ratio::new(1, 10),
            hard_min_unflex: Ratio::new(1, 20),
        }
    }
}

impl GlobalSizings {
    /// Derive thresholds from ratio approximations.
    pub fn from_ratios(ratios: &SizingRatios) -> Result<Self> {
        Ok(Self {
            default_flex_ratio: ratios.default_flex,
            max_flex: ratios.max_flex.normalize()?,
            soft_min_flex: ratios.soft_min_flex.normalize()?,
            hard_min_flex: ratios.hard_min_flex.normalize()? + 1,
            soft_min_unflex: ratios.soft_min_unflex.normalize()?,
            hard_min_unflex: ratios.hard_min_unflex.normalize()?,
        })
    }

    /// Soft or hard floor for an item in the given state.
    #[must_use]
    pub const fn floor(&self, flexed: bool, soft: bool) -> Size {
        match (flexed, soft) {
            (true, true) => self.soft_min_flex,
            (true, false) => self.hard_min_flex,
            (false, true) => self.soft_min_unflex,
            (false, false) => self.hard_min_unflex,
        }
    }
}

impl Default for GlobalSizings {
    fn default() -> Self {
        *globals()
    }
}

static STANDARD: LazyLock<GlobalSizings> = LazyLock::new(|| {
    GlobalSizings::from_ratios(&SizingRatios::default())
        .expect("standard ratios have non-zero divisors")
});

/// Process-wide standard thresholds, derived from [`SizingRatios::default`].
#[must_use]
pub fn globals() -> &'static GlobalSizings {
    &STANDARD
}
