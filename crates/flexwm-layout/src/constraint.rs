//! Floor relaxations and the ordered chain that consumes them.
//!
//! A rebalancing attempt that cannot absorb its delta relaxes floors one at
//! a time: first the item-scoped overrides in registration order, then the
//! group's global soft floors. When the chain runs dry only hard floors
//! remain.

use std::collections::VecDeque;

/// Which of an item's two floors a constraint refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloorKind {
    /// The floor in force while the item holds the majority of the group.
    Flexed,
    /// The floor in force otherwise.
    Unflexed,
}

impl FloorKind {
    #[must_use]
    pub const fn of(flexed: bool) -> Self {
        if flexed { Self::Flexed } else { Self::Unflexed }
    }
}

/// A relaxable floor on one item, addressed by its index in the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemConstraint {
    /// Index of the item within its group.
    pub item: usize,
    /// Which of the item's floors gets relaxed.
    pub kind: FloorKind,
}

/// One floor relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Reset an item's override floor back to unset.
    Item(ItemConstraint),
    /// Stop observing the group's global soft floor of this kind.
    Global(FloorKind),
}

/// Something whose floors can be relaxed.
pub trait Relax {
    fn relax(&mut self, constraint: Constraint);
}

/// Ordered queue of relaxations for a single rebalancing attempt.
#[derive(Debug, Clone, Default)]
pub struct ConstraintChain {
    user_defined: VecDeque<ItemConstraint>,
    global: VecDeque<FloorKind>,
}

impl ConstraintChain {
    #[must_use]
    pub fn new(
        user_defined: impl IntoIterator<Item = ItemConstraint>,
        global: impl IntoIterator<Item = FloorKind>,
    ) -> Self {
        Self {
            user_defined: user_defined.into_iter().collect(),
            global: global.into_iter().collect(),
        }
    }

    /// Consume the next constraint, applying it to `target`.
    ///
    /// User-defined constraints go first, oldest first. Returns `false` once
    /// both queues are empty.
    pub fn invalidate<R: Relax + ?Sized>(&mut self, target: &mut R) -> bool {
        if let Some(item) = self.user_defined.pop_front() {
            tracing::debug!(item = item.item, kind = ?item.kind, "relaxing item floor");
            target.relax(Constraint::Item(item));
            true
        } else if let Some(kind) = self.global.pop_front() {
            tracing::debug!(?kind, "relaxing global soft floor");
            target.relax(Constraint::Global(kind));
            true
        } else {
            tracing::debug!("constraint chain exhausted, hard floors in force");
            false
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.user_defined.is_empty() && self.global.is_empty()
    }

    /// Item constraints that were never consumed.
    #[must_use]
    pub fn into_remaining(self) -> Vec<ItemConstraint> {
        self.user_defined.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<Constraint>);

    impl Relax for Recorder {
        fn relax(&mut self, constraint: Constraint) {
            self.0.push(constraint);
        }
    }

    fn item(item: usize, kind: FloorKind) -> ItemConstraint {
        ItemConstraint { item, kind }
    }

    #[test]
    fn user_defined_first_then_global() {
        let mut chain = ConstraintChain::new(
            [item(2, FloorKind::Unflexed), item(0, FloorKind::Flexed)],
            [FloorKind::Unflexed],
        );
        let mut rec = Recorder::default();

        assert!(chain.invalidate(&mut rec));
        assert!(chain.invalidate(&mut rec));
        assert!(!chain.is_exhausted());
        assert!(chain.invalidate(&mut rec));
        assert!(chain.is_exhausted());
        assert!(!chain.invalidate(&mut rec));

        assert_eq!(
            rec.0,
            vec![
                Constraint::Item(item(2, FloorKind::Unflexed)),
                Constraint::Item(item(0, FloorKind::Flexed)),
                Constraint::Global(FloorKind::Unflexed),
            ]
        );
    }

    #[test]
    fn empty_chain_is_exhausted() {
        let mut chain = ConstraintChain::default();
        let mut rec = Recorder::default();
        assert!(!chain.invalidate(&mut rec));
        assert!(rec.0.is_empty());
    }

    #[test]
    fn remaining_keeps_unconsumed_user_constraints() {
        let mut chain = ConstraintChain::new(
            [item(1, FloorKind::Unflexed), item(3, FloorKind::Unflexed)],
            [FloorKind::Unflexed, FloorKind::Flexed],
        );
        let mut rec = Recorder::default();
        chain.invalidate(&mut rec);
        assert_eq!(chain.into_remaining(), vec![item(3, FloorKind::Unflexed)]);
    }
}
