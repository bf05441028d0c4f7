//! Snapshot input and render output exchanged with collaborators.

use serde::{Deserialize, Serialize};

use crate::model::{Axis, FlexModel, NodeId};
use crate::scale::Size;

/// Raw sizes of one sibling group as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    /// Container whose children form the group.
    pub group: NodeId,
    /// Direction the children are laid out along.
    pub axis: Axis,
    /// Children in layout order.
    pub items: Vec<ItemUpdate>,
}

/// One child of an [`UpdateDescriptor`], sized in host units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub id: NodeId,
    /// Extent along the group axis, in host units.
    pub raw_size: Size,
}

impl UpdateDescriptor {
    #[must_use]
    pub fn new(group: NodeId, axis: Axis, items: impl IntoIterator<Item = (NodeId, Size)>) -> Self {
        Self {
            group,
            axis,
            items: items
                .into_iter()
                .map(|(id, raw_size)| ItemUpdate { id, raw_size })
                .collect(),
        }
    }
}

/// Proportions of a group that changed and need to be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub group: NodeId,
    pub axis: Axis,
    /// Items in group order with their size in scale units.
    pub items: Vec<(NodeId, Size)>,
}

impl From<&FlexModel> for RenderRequest {
    fn from(model: &FlexModel) -> Self {
        Self {
            group: model.id(),
            axis: model.axis(),
            items: model
                .items()
                .iter()
                .map(|item| (item.id(), item.current()))
                .collect(),
        }
    }
}
