//! Window-manager layout tree snapshots.
//!
//! A snapshot is the JSON tree the host reports (root, outputs, workspaces,
//! split containers and windows). [`Walk`] visits it depth first with an
//! explicit stack, so a traversal can be paused between events and resumed.
//! [`collect_updates`] turns every split container into an
//! [`UpdateDescriptor`] for the registry.

use std::fmt;
use std::io::Read;

use flexwm_layout::{Axis, NodeId, Size, UpdateDescriptor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a tree snapshot.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tree snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    Output,
    Con,
    FloatingCon,
    Workspace,
    Dockarea,
    #[default]
    #[serde(other)]
    Unknown,
}

/// How a node arranges its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Splith,
    Splitv,
    Stacked,
    Tabbed,
    Dockarea,
    Output,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Layout {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Splith => "splith",
            Self::Splitv => "splitv",
            Self::Stacked => "stacked",
            Self::Tabbed => "tabbed",
            Self::Dockarea => "dockarea",
            Self::Output => "output",
            Self::Unknown => "unknown",
        }
    }

    /// Axis children are laid out along, for split layouts.
    #[must_use]
    pub const fn split_axis(self) -> Option<Axis> {
        match self {
            Self::Splith => Some(Axis::Horizontal),
            Self::Splitv => Some(Axis::Vertical),
            _ => None,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    /// Length along `axis`, never negative.
    #[must_use]
    pub fn extent(&self, axis: Axis) -> Size {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
        .max(0)
    }
}

/// One node of a layout tree snapshot. Unrecognized fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub window: Option<i64>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
}

impl TreeNode {
    pub fn from_json_str(s: &str) -> Result<Self, TreeError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, TreeError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_json_str(&content)
    }

    /// Whether the node holds a client window.
    #[must_use]
    pub fn is_window(&self) -> bool {
        self.window.is_some_and(|w| w != 0)
    }

    /// Split axis of a window-less split container.
    #[must_use]
    pub fn split_axis(&self) -> Option<Axis> {
        if self.is_window() {
            return None;
        }
        self.layout.split_axis()
    }

    #[must_use]
    pub fn is_split_container(&self) -> bool {
        self.split_axis().is_some()
    }
}

/// One step of a depth-first walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEvent<'a> {
    /// Entered a node that has children.
    Push(&'a TreeNode),
    /// About to leave a node entered by a matching `Push`.
    Pop(&'a TreeNode),
    /// A childless node.
    Leaf(&'a TreeNode),
}

/// Resumable depth-first walk below a root node.
///
/// The root itself yields no event. Each stack frame records the next child
/// to visit, so dropping the walk between events loses nothing and
/// no recursion depth is tied to the tree height.
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<(&'a TreeNode, usize)>,
}

impl<'a> Walk<'a> {
    #[must_use]
    pub fn new(root: &'a TreeNode) -> Self {
        Self {
            stack: vec![(root, 0)],
        }
    }

    /// Nodes from the root down to the innermost entered node.
    pub fn path(&self) -> impl Iterator<Item = &'a TreeNode> + '_ {
        self.stack.iter().map(|&(node, _)| node)
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.stack.last_mut()?;
        let node = frame.0;
        if let Some(child) = node.nodes.get(frame.1) {
            frame.1 += 1;
            if child.nodes.is_empty() {
                return Some(WalkEvent::Leaf(child));
            }
            self.stack.push((child, 0));
            return Some(WalkEvent::Push(child));
        }
        if self.stack.len() == 1 {
            self.stack.clear();
            return None;
        }
        self.stack.pop();
        Some(WalkEvent::Pop(node))
    }
}

/// Hooks driven by [`walk`].
pub trait TreeVisitor {
    fn on_push(&mut self, _node: &TreeNode) {}
    fn on_pop(&mut self, _node: &TreeNode) {}
    fn on_leaf(&mut self, _node: &TreeNode) {}
}

/// Run a full walk below `root`, dispatching every event to `visitor`.
pub fn walk<V: TreeVisitor + ?Sized>(root: &TreeNode, visitor: &mut V) {
    for event in Walk::new(root) {
        match event {
            WalkEvent::Push(node) => visitor.on_push(node),
            WalkEvent::Pop(node) => visitor.on_pop(node),
            WalkEvent::Leaf(node) => visitor.on_leaf(node),
        }
    }
}

#[derive(Default)]
struct UpdateCollector {
    updates: Vec<UpdateDescriptor>,
}

impl TreeVisitor for UpdateCollector {
    fn on_push(&mut self, node: &TreeNode) {
        let Some(axis) = node.split_axis() else {
            return;
        };
        // Containers of workspaces are output-level plumbing.
        if node
            .nodes
            .iter()
            .any(|child| child.node_type == NodeType::Workspace)
        {
            return;
        }
        let sizes: Vec<(NodeId, Size)> = node
            .nodes
            .iter()
            .map(|child| (child.id, child.rect.extent(axis)))
            .collect();
        let slack = node.rect.extent(axis) - sizes.iter().map(|&(_, s)| s).sum::<Size>();
        tracing::debug!(group = %node.id, %axis, children = sizes.len(), slack, "split container");
        self.updates.push(UpdateDescriptor::new(node.id, axis, sizes));
    }
}

/// One descriptor per split container below `root`, in walk order.
#[must_use]
pub fn collect_updates(root: &TreeNode) -> Vec<UpdateDescriptor> {
    let mut collector = UpdateCollector::default();
    walk(root, &mut collector);
    collector.updates
}

const BASE_INDENT: usize = 2;

struct Outline {
    out: String,
    indent: usize,
}

impl Outline {
    fn line(&mut self, label: fmt::Arguments<'_>) {
        self.out.push('+');
        self.out.extend(std::iter::repeat_n('-', self.indent));
        self.out.push_str(&format!("> {label}\n"));
    }
}

impl TreeVisitor for Outline {
    fn on_push(&mut self, node: &TreeNode) {
        if node.is_split_container() {
            self.line(format_args!("{}[{}]", node.layout, node.id));
            self.indent += 2;
        }
    }

    fn on_pop(&mut self, node: &TreeNode) {
        if node.is_split_container() {
            self.indent -= 2;
        }
    }

    fn on_leaf(&mut self, node: &TreeNode) {
        if self.indent > BASE_INDENT && node.is_window() {
            self.line(format_args!("window[{}]", node.id));
        }
    }
}

/// Indented outline of the split containers and the windows inside them.
#[must_use]
pub fn outline(root: &TreeNode) -> String {
    let mut outline = Outline {
        out: String::new(),
        indent: BASE_INDENT,
    };
    walk(root, &mut outline);
    outline.out
}
