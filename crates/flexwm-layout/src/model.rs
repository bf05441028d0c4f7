//! One sibling group and its rebalancing protocol.
//!
//! A [`FlexModel`] owns the live sizes of a group of siblings laid out along
//! one axis. Sizes are fixed-point proportions summing to [`NORMAL`]. Two
//! operations change them:
//!
//! - [`FlexModel::flex`] promotes an item to hold the majority of the group.
//! - [`FlexModel::on_update`] absorbs external growth of some items.
//!
//! Both end in the reduction loop when the remaining items have to shrink.
//! The loop relaxes floors through a [`ConstraintChain`] until the shrink is
//! absorbed, and if every floor is already at its hard minimum it claws the
//! excess back out of the items that grew. That claw-back runs at most once.

use std::fmt;
use std::iter;

use serde::{Deserialize, Serialize};

use crate::constraint::{Constraint, ConstraintChain, FloorKind, ItemConstraint, Relax};
use crate::error::{InvariantViolation, Result};
use crate::rebalance::rebalance;
use crate::scale::{INFER_TOTAL, NORMAL, Size, check_scale, rescale};
use crate::sizing::GlobalSizings;

/// Externally assigned identity of a container or window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(i64);

impl NodeId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for NodeId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The axis a group's siblings are arranged along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    Vertical,
}

impl Axis {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an item of this size holds a strict majority of its group.
#[must_use]
pub const fn is_flexed(size: Size) -> bool {
    size > NORMAL / 2 + 1
}

/// One sibling in a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexItem {
    id: NodeId,
    current: Size,
    min_flex: Option<Size>,
    min_unflex: Option<Size>,
}

impl FlexItem {
    #[must_use]
    pub const fn new(id: NodeId, current: Size) -> Self {
        Self {
            id,
            current,
            min_flex: None,
            min_unflex: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub const fn current(&self) -> Size {
        self.current
    }

    #[must_use]
    pub const fn is_flexed(&self) -> bool {
        is_flexed(self.current)
    }

    /// The item's own floor for `kind`, if one is set.
    #[must_use]
    pub const fn floor_override(&self, kind: FloorKind) -> Option<Size> {
        match kind {
            FloorKind::Flexed => self.min_flex,
            FloorKind::Unflexed => self.min_unflex,
        }
    }

    /// Set or clear the item's own floor. Non-positive values clear it.
    pub fn set_floor_override(&mut self, kind: FloorKind, min: Option<Size>) {
        let min = min.filter(|m| *m > 0);
        match kind {
            FloorKind::Flexed => self.min_flex = min,
            FloorKind::Unflexed => self.min_unflex = min,
        }
    }
}

/// A positive size increase observed for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexEvent {
    pub id: NodeId,
    /// Growth in scale units. Must be positive.
    pub increase: Size,
}

/// A sibling group and its live sizing state.
#[derive(Debug, Clone)]
pub struct FlexModel {
    id: NodeId,
    axis: Axis,
    sizings: GlobalSizings,
    items: Vec<FlexItem>,
    /// Relaxable item floors, oldest first.
    constraints: Vec<ItemConstraint>,
    soft_flex_observed: bool,
    soft_unflex_observed: bool,
}

impl FlexModel {
    /// Build a group from already normalized sizes.
    pub fn new(
        id: NodeId,
        axis: Axis,
        items: impl IntoIterator<Item = (NodeId, Size)>,
        sizings: GlobalSizings,
    ) -> Result<Self> {
        let items: Vec<FlexItem> = items
            .into_iter()
            .map(|(id, size)| FlexItem::new(id, size))
            .collect();
        let sizes: Vec<Size> = items.iter().map(FlexItem::current).collect();
        check_scale(&sizes, NORMAL)?;
        Ok(Self {
            id,
            axis,
            sizings,
            items,
            constraints: Vec::new(),
            soft_flex_observed: true,
            soft_unflex_observed: true,
        })
    }

    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    #[must_use]
    pub fn items(&self) -> &[FlexItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn sizes(&self) -> Vec<Size> {
        self.items.iter().map(FlexItem::current).collect()
    }

    #[must_use]
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.position(id).is_some()
    }

    /// Item floors that a later rebalancing may relax, oldest first.
    #[must_use]
    pub fn constraints(&self) -> &[ItemConstraint] {
        &self.constraints
    }

    #[must_use]
    pub const fn sizings(&self) -> &GlobalSizings {
        &self.sizings
    }

    /// Set or clear an item's own floor for `kind`.
    pub fn set_floor_override(
        &mut self,
        idx: usize,
        kind: FloorKind,
        min: Option<Size>,
    ) -> Result<()> {
        self.check_index(idx)?;
        self.items[idx].set_floor_override(kind, min);
        Ok(())
    }

    /// The floor currently in force for item `idx`.
    ///
    /// The item's own override wins; otherwise the global soft floor while
    /// the group observes it, else the global hard floor.
    pub fn min_for(&self, idx: usize) -> Result<Size> {
        self.check_index(idx)?;
        Ok(self.floor_of(&self.items[idx]))
    }

    fn floor_of(&self, item: &FlexItem) -> Size {
        let flexed = item.is_flexed();
        let kind = FloorKind::of(flexed);
        if let Some(min) = item.floor_override(kind) {
            return min;
        }
        let observed = match kind {
            FloorKind::Flexed => self.soft_flex_observed,
            FloorKind::Unflexed => self.soft_unflex_observed,
        };
        self.sizings.floor(flexed, observed)
    }

    /// Register, or move to the back, a relaxable floor for item `idx` under
    /// its current classification.
    ///
    /// The item's override value is left as it is; only the relaxation is
    /// queued.
    pub fn put_constraint(&mut self, idx: usize) -> Result<()> {
        self.check_index(idx)?;
        let constraint = ItemConstraint {
            item: idx,
            kind: FloorKind::of(self.items[idx].is_flexed()),
        };
        if let Some(pos) = self.constraints.iter().position(|c| *c == constraint) {
            self.constraints.remove(pos);
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Absorb external growth of the named items.
    ///
    /// Every matched item grows by its increase and the rest of the group
    /// shrinks to compensate. Ids not in this group are skipped. Returns the
    /// part of the growth the floors could not absorb, which is zero unless
    /// every floor in the group is already at its hard minimum. In that case
    /// the group has been brought back to scale regardless.
    pub fn on_update(&mut self, events: &[FlexEvent]) -> Result<Size> {
        if let Some(bad) = events.iter().find(|ev| ev.increase <= 0) {
            return Err(InvariantViolation::NonPositiveIncrease {
                item: bad.id,
                increase: bad.increase,
            });
        }

        let mut delta = 0;
        let mut grown = Vec::with_capacity(events.len());
        for event in events {
            let Some(idx) = self.position(event.id) else {
                tracing::debug!(group = %self.id, item = %event.id, "skipping unknown item");
                continue;
            };
            self.items[idx].current += event.increase;
            delta -= event.increase;
            grown.push(idx);
            self.put_constraint(idx)?;
        }
        if delta == 0 {
            return Ok(0);
        }

        let leftover = self.reduction_loop(delta, grown)?;
        self.settle(leftover)?;
        Ok(leftover)
    }

    /// Make item `idx` the group's flexed item.
    ///
    /// Returns `false` without touching anything if it already is.
    pub fn flex(&mut self, idx: usize) -> Result<bool> {
        self.check_index(idx)?;
        if self.items[idx].is_flexed() {
            return Ok(false);
        }

        let target = self.items[idx]
            .floor_override(FloorKind::Flexed)
            .unwrap_or(self.sizings.soft_min_flex);
        let mut delta = self.items[idx].current - target;
        self.items[idx].current = target;
        let mut excluded = vec![idx];

        for (k, item) in self.items.iter_mut().enumerate() {
            if k == idx || !item.is_flexed() {
                continue;
            }
            let min = item
                .floor_override(FloorKind::Unflexed)
                .unwrap_or(self.sizings.soft_min_unflex);
            delta += item.current - min;
            item.current = min;
            excluded.push(k);
        }
        if excluded.len() > 2 {
            tracing::warn!(
                group = %self.id,
                shrunk = excluded.len() - 1,
                "more than one flexed item in group"
            );
        }
        tracing::debug!(group = %self.id, idx, target, delta, "flexing");

        let leftover = match delta.cmp(&0) {
            std::cmp::Ordering::Greater => {
                let unflexed = self.unflexed();
                self.rebalance_indices(&unflexed, delta)?
            }
            std::cmp::Ordering::Less => self.reduction_loop(delta, excluded)?,
            std::cmp::Ordering::Equal => 0,
        };
        self.settle(leftover)?;
        Ok(true)
    }

    /// Bring the group back to [`NORMAL`] after an operation that left
    /// `leftover` unabsorbed, then verify the scale.
    ///
    /// An unabsorbed leftover only happens when the floors in force on both
    /// sides block the shrink. The leftover is first taken from whatever the
    /// whole group holds above its hard floors. Only if that is not enough
    /// is the group squeezed proportionally, below the hard floors.
    fn settle(&mut self, leftover: Size) -> Result<()> {
        if leftover != 0 {
            tracing::warn!(
                group = %self.id,
                leftover,
                "soft floors exhausted on both sides, shrinking group to hard floors"
            );
            let mut sizes = self.sizes();
            let hard: Vec<Size> = self
                .items
                .iter()
                .map(|item| self.sizings.floor(item.is_flexed(), false).min(item.current))
                .collect();
            let shortfall = rebalance(&mut sizes, &hard, leftover)?;
            if shortfall != 0 {
                tracing::warn!(
                    group = %self.id,
                    shortfall,
                    "hard floors exceed scale, squeezing group proportionally"
                );
                rescale(&mut sizes, INFER_TOTAL, NORMAL)?;
            }
            for (item, size) in self.items.iter_mut().zip(sizes) {
                item.current = size;
            }
        }
        check_scale(&self.sizes(), NORMAL)
    }

    /// Shrink everything outside `grown` by `-delta`, clawing back from the
    /// grown items once if the others are all at their hard floors.
    fn reduction_loop(&mut self, delta: Size, grown: Vec<usize>) -> Result<Size> {
        let (shrunk, remainder) = self.reduction_pass(delta, &grown)?;
        if remainder == 0 {
            return Ok(0);
        }

        tracing::info!(
            group = %self.id,
            remainder,
            "floors exhausted, reducing grown items back"
        );
        let (_, leftover) = self.reduction_pass(remainder, &shrunk)?;
        Ok(leftover)
    }

    /// One attempt at absorbing `delta` into the complement of `excluded`.
    ///
    /// Returns the complement that was shrunk and the unabsorbed remainder.
    fn reduction_pass(&mut self, delta: Size, excluded: &[usize]) -> Result<(Vec<usize>, Size)> {
        if delta >= 0 {
            return Err(InvariantViolation::NonNegativeDelta { delta });
        }

        self.soft_flex_observed = true;
        self.soft_unflex_observed = true;

        let eligible: Vec<ItemConstraint> = self
            .constraints
            .iter()
            .copied()
            .filter(|c| !excluded.contains(&c.item))
            .collect();
        // The flexed soft floor of other items only gives way when the
        // growth itself comes from a flexed item.
        let flexing = excluded.iter().any(|&i| self.items[i].is_flexed());
        let global = iter::once(FloorKind::Unflexed).chain(flexing.then_some(FloorKind::Flexed));
        let mut chain = ConstraintChain::new(eligible, global);

        let complement = self.complement(excluded);
        let mut remainder = delta;
        loop {
            remainder = self.rebalance_indices(&complement, remainder)?;
            if remainder == 0 || !chain.invalidate(self) {
                break;
            }
        }

        // Only unconsumed item constraints outside `excluded` survive.
        self.constraints = chain.into_remaining();

        self.soft_flex_observed = true;
        self.soft_unflex_observed = true;

        Ok((complement, remainder))
    }

    /// Rebalance the items at `indices` with their current floors.
    fn rebalance_indices(&mut self, indices: &[usize], delta: Size) -> Result<Size> {
        let mut sizes: Vec<Size> = indices.iter().map(|&i| self.items[i].current).collect();
        let mins: Vec<Size> = indices
            .iter()
            .map(|&i| self.floor_of(&self.items[i]))
            .collect();
        let remainder = rebalance(&mut sizes, &mins, delta)?;
        for (&i, size) in indices.iter().zip(sizes) {
            self.items[i].current = size;
        }
        Ok(remainder)
    }

    fn complement(&self, indices: &[usize]) -> Vec<usize> {
        (0..self.items.len())
            .filter(|i| !indices.contains(i))
            .collect()
    }

    fn unflexed(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_flexed())
            .map(|(i, _)| i)
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(InvariantViolation::ItemOutOfRange {
                group: self.id,
                index,
                len: self.items.len(),
            });
        }
        Ok(())
    }
}

impl Relax for FlexModel {
    fn relax(&mut self, constraint: Constraint) {
        match constraint {
            Constraint::Item(ItemConstraint { item, kind }) => {
                if let Some(item) = self.items.get_mut(item) {
                    item.set_floor_override(kind, None);
                }
            }
            Constraint::Global(FloorKind::Flexed) => self.soft_flex_observed = false,
            Constraint::Global(FloorKind::Unflexed) => self.soft_unflex_observed = false,
        }
    }
}
