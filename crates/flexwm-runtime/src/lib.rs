#![forbid(unsafe_code)]

//! Collaborators around the sizing engine: tree snapshots in, resize
//! commands out, and the service loop tying them to a [`FlexRegistry`].
//!
//! [`FlexRegistry`]: flexwm_layout::FlexRegistry

pub mod config;
pub mod render;
pub mod retry;
pub mod service;
pub mod tree;

pub use config::{BackoffKind, ConfigError, FlexConfig, LogConfig, RenderConfig};
pub use render::{
    CommandError, CommandSink, DEFAULT_PERCENT_SCALE, LogRenderer, RenderReport, Renderer,
    ResizeRenderer, WriterSink, resize_commands,
};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use service::{FlexService, Notification, ServiceError, ServiceHandle, ServiceStats};
pub use tree::{
    Layout, NodeType, Rect, TreeError, TreeNode, TreeVisitor, Walk, WalkEvent, collect_updates,
    outline, walk,
};
