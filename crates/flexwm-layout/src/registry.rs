//! Live models keyed by external group id.
//!
//! The registry decides, per snapshot, whether a group's model can absorb
//! the new sizes incrementally or has to be rebuilt, and drives the flexing
//! of the two groups a focused item belongs to.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use crate::error::{InvariantViolation, Result};
use crate::model::{FlexEvent, FlexModel, NodeId};
use crate::scale::{INFER_TOTAL, NORMAL, Size, check_scale, rescale};
use crate::sizing::{GlobalSizings, globals};
use crate::update::{RenderRequest, UpdateDescriptor};

/// Whether `update` no longer describes the structure `model` was built from.
///
/// A changed axis, a changed item count, or an item id the model has never
/// seen all invalidate the model.
pub fn is_invalidated(update: &UpdateDescriptor, model: &FlexModel) -> Result<bool> {
    if update.group != model.id() {
        return Err(InvariantViolation::IdentityMismatch {
            update: update.group,
            model: model.id(),
        });
    }
    if update.axis != model.axis() || update.items.len() != model.len() {
        return Ok(true);
    }
    let known: FxHashSet<NodeId> = model.items().iter().map(|item| item.id()).collect();
    Ok(update.items.iter().any(|item| !known.contains(&item.id)))
}

/// In-memory store of every live [`FlexModel`].
#[derive(Debug, Clone)]
pub struct FlexRegistry {
    models: BTreeMap<NodeId, FlexModel>,
    sizings: GlobalSizings,
}

impl Default for FlexRegistry {
    fn default() -> Self {
        Self::new(*globals())
    }
}

impl FlexRegistry {
    #[must_use]
    pub fn new(sizings: GlobalSizings) -> Self {
        Self {
            models: BTreeMap::new(),
            sizings,
        }
    }

    #[must_use]
    pub fn get(&self, group: NodeId) -> Option<&FlexModel> {
        self.models.get(&group)
    }

    pub fn models(&self) -> impl Iterator<Item = &FlexModel> {
        self.models.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Drop every model; the next snapshot rebuilds them from scratch.
    pub fn clear(&mut self) {
        self.models.clear();
    }

    /// Apply a batch of group snapshots.
    ///
    /// With `full` set, the batch is the complete set of live groups and any
    /// model missing from it is dropped. Models whose structure changed are
    /// dropped either way and rebuilt from their descriptor.
    pub fn updates(&mut self, updates: &[UpdateDescriptor], full: bool) -> Result<()> {
        let mut prune: BTreeMap<NodeId, bool> =
            self.models.keys().map(|&group| (group, full)).collect();
        for update in updates {
            if let Some(model) = self.models.get(&update.group) {
                prune.insert(update.group, is_invalidated(update, model)?);
            }
        }

        let before = self.models.len();
        self.models
            .retain(|group, _| !prune.get(group).copied().unwrap_or(false));
        let pruned = before - self.models.len();
        if pruned > 0 {
            tracing::debug!(pruned, "dropped stale groups");
        }

        for update in updates {
            self.update(update)?;
        }
        Ok(())
    }

    fn update(&mut self, update: &UpdateDescriptor) -> Result<()> {
        if update.items.is_empty() {
            tracing::warn!(group = %update.group, "ignoring group without children");
            return Ok(());
        }

        let mut scaled: Vec<Size> = update.items.iter().map(|item| item.raw_size).collect();
        rescale(&mut scaled, INFER_TOTAL, NORMAL)?;
        check_scale(&scaled, NORMAL)?;

        if let Some(model) = self.models.get_mut(&update.group) {
            let events: Vec<FlexEvent> = update
                .items
                .iter()
                .zip(&scaled)
                .filter_map(|(item, &size)| {
                    let idx = model.position(item.id)?;
                    let increase = size - model.items()[idx].current();
                    (increase > 0).then_some(FlexEvent {
                        id: item.id,
                        increase,
                    })
                })
                .collect();
            if !events.is_empty() {
                tracing::debug!(group = %update.group, events = events.len(), "absorbing growth");
                model.on_update(&events)?;
            }
        } else {
            let model = FlexModel::new(
                update.group,
                update.axis,
                update.items.iter().map(|item| item.id).zip(scaled),
                self.sizings,
            )?;
            tracing::debug!(group = %update.group, axis = %update.axis, items = model.len(), "tracking group");
            self.models.insert(update.group, model);
        }
        Ok(())
    }

    /// Flex the group holding `item`, then the differently oriented group
    /// holding that group.
    ///
    /// Returns render requests for the groups whose sizes changed. An item
    /// no live group holds yields an empty batch.
    pub fn on_focus(&mut self, item: NodeId) -> Result<Vec<RenderRequest>> {
        let mut batch = Vec::new();
        let Some((group, axis)) = self
            .models
            .values()
            .find(|model| model.contains(item))
            .map(|model| (model.id(), model.axis()))
        else {
            tracing::debug!(%item, "focused node is not in a tracked group");
            return Ok(batch);
        };
        self.flex_member(group, item, &mut batch)?;

        let parent = self
            .models
            .values()
            .find(|model| model.axis() != axis && model.contains(group))
            .map(FlexModel::id);
        if let Some(parent) = parent {
            self.flex_member(parent, group, &mut batch)?;
        }
        Ok(batch)
    }

    fn flex_member(
        &mut self,
        group: NodeId,
        item: NodeId,
        batch: &mut Vec<RenderRequest>,
    ) -> Result<()> {
        let Some(model) = self.models.get_mut(&group) else {
            return Ok(());
        };
        let Some(idx) = model.position(item) else {
            return Ok(());
        };
        tracing::info!(axis = %model.axis(), %group, %item, "flexing");
        if model.flex(idx)? {
            batch.push(RenderRequest::from(&*model));
        }
        Ok(())
    }
}
