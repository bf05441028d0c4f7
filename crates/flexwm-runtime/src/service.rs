//! Notification-driven sizing service.
//!
//! Each [`Notification`] carries a full tree snapshot. [`FlexService`] folds
//! it into the registry, flexes the focused container and renders the
//! resulting batch. [`ServiceHandle`] runs a service on one worker thread
//! fed by a FIFO queue, so passes never overlap and run in arrival order.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use flexwm_layout::{FlexRegistry, GlobalSizings, InvariantViolation, NodeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::{RenderReport, Renderer};
use crate::tree::{TreeNode, collect_updates};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error("failed to start service worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("service queue is closed")]
    Closed,
    #[error("service worker panicked")]
    WorkerPanicked,
}

/// A host event together with the tree it left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Host event kind, e.g. `focus` or `new`.
    pub change: String,
    /// Container the event is about.
    #[serde(default)]
    pub container: Option<NodeId>,
    /// Full layout tree after the event.
    pub tree: TreeNode,
}

/// Counters kept across passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    /// Notifications handled, including failed ones.
    pub processed: u64,
    /// Passes abandoned on an invariant violation.
    pub failed: u64,
    /// Resize commands issued, failed ones included.
    pub commands: u64,
}

/// Registry plus renderer, driven one notification at a time.
#[derive(Debug)]
pub struct FlexService<R> {
    registry: FlexRegistry,
    renderer: R,
    stats: ServiceStats,
}

impl<R: Renderer> FlexService<R> {
    pub fn new(sizings: GlobalSizings, renderer: R) -> Self {
        Self {
            registry: FlexRegistry::new(sizings),
            renderer,
            stats: ServiceStats::default(),
        }
    }

    pub fn registry(&self) -> &FlexRegistry {
        &self.registry
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    /// Run one full pass: update every group from the tree, flex the
    /// focused container and render what changed.
    ///
    /// On an invariant violation every model is dropped, so the next
    /// snapshot rebuilds them, and the violation is returned.
    pub fn process(&mut self, notification: &Notification) -> Result<RenderReport, ServiceError> {
        self.stats.processed += 1;
        match self.pass(notification) {
            Ok(report) => {
                self.stats.commands += report.commands.len() as u64;
                Ok(report)
            }
            Err(err) => {
                self.stats.failed += 1;
                tracing::error!(change = %notification.change, %err, "sizing pass failed, resetting groups");
                self.registry.clear();
                Err(err.into())
            }
        }
    }

    fn pass(&mut self, notification: &Notification) -> Result<RenderReport, InvariantViolation> {
        let updates = collect_updates(&notification.tree);
        tracing::debug!(change = %notification.change, groups = updates.len(), "snapshot");
        self.registry.updates(&updates, true)?;

        let batch = match notification.container {
            Some(container) => self.registry.on_focus(container)?,
            None => Vec::new(),
        };
        if batch.is_empty() {
            return Ok(RenderReport::default());
        }
        Ok(self.renderer.render(&batch))
    }
}

/// A [`FlexService`] running on its own worker thread.
pub struct ServiceHandle<R> {
    sender: Option<mpsc::Sender<Notification>>,
    handle: Option<JoinHandle<FlexService<R>>>,
}

impl<R: Renderer + Send + 'static> ServiceHandle<R> {
    /// Move `service` onto a new worker thread.
    pub fn spawn(mut service: FlexService<R>) -> Result<Self, ServiceError> {
        let (tx, rx) = mpsc::channel::<Notification>();
        let handle = thread::Builder::new()
            .name("flexwm-service".into())
            .spawn(move || {
                for notification in rx {
                    // Failures are logged and counted by the service itself.
                    let _ = service.process(&notification);
                }
                service
            })
            .map_err(ServiceError::Spawn)?;
        Ok(Self {
            sender: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue a notification behind any already waiting.
    pub fn submit(&self, notification: Notification) -> Result<(), ServiceError> {
        let sender = self.sender.as_ref().ok_or(ServiceError::Closed)?;
        sender.send(notification).map_err(|_| ServiceError::Closed)
    }

    /// Close the queue, let queued passes finish and hand the service back.
    pub fn shutdown(mut self) -> Result<FlexService<R>, ServiceError> {
        self.sender.take();
        let handle = self.handle.take().ok_or(ServiceError::Closed)?;
        handle.join().map_err(|_| ServiceError::WorkerPanicked)
    }
}

impl<R> Drop for ServiceHandle<R> {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::LogRenderer;
    use crate::tree::{Layout, NodeType, Rect};
    use flexwm_layout::globals;

    fn window(id: i64, width: i64) -> TreeNode {
        TreeNode {
            id: NodeId::new(id),
            node_type: NodeType::Con,
            layout: Layout::Splith,
            window: Some(id * 100),
            rect: Rect {
                width,
                height: 1000,
                ..Rect::default()
            },
            nodes: Vec::new(),
        }
    }

    fn workspace(children: Vec<TreeNode>) -> TreeNode {
        let ws = TreeNode {
            id: NodeId::new(5),
            node_type: NodeType::Workspace,
            layout: Layout::Splith,
            window: None,
            rect: Rect {
                width: 2000,
                height: 1000,
                ..Rect::default()
            },
            nodes: children,
        };
        TreeNode {
            id: NodeId::new(1),
            node_type: NodeType::Root,
            layout: Layout::Splith,
            window: None,
            rect: Rect::default(),
            nodes: vec![ws],
        }
    }

    fn notification(container: Option<i64>, tree: TreeNode) -> Notification {
        Notification {
            change: "focus".into(),
            container: container.map(NodeId::new),
            tree,
        }
    }

    #[test]
    fn focus_pass_renders_changed_group() {
        let mut service = FlexService::new(*globals(), LogRenderer);
        let report = service
            .process(&notification(
                Some(11),
                workspace(vec![window(10, 1000), window(11, 1000)]),
            ))
            .unwrap();
        assert_eq!(report.groups, 1);
        assert_eq!(
            service.registry().get(NodeId::new(5)).unwrap().sizes(),
            vec![381, 619]
        );
        assert_eq!(service.stats().processed, 1);
    }

    #[test]
    fn pass_without_container_only_tracks() {
        let mut service = FlexService::new(*globals(), LogRenderer);
        let report = service
            .process(&notification(
                None,
                workspace(vec![window(10, 500), window(11, 1500)]),
            ))
            .unwrap();
        assert_eq!(report, RenderReport::default());
        assert_eq!(
            service.registry().get(NodeId::new(5)).unwrap().sizes(),
            vec![250, 750]
        );
    }

    #[test]
    fn focus_on_unknown_container_is_noop() {
        let mut service = FlexService::new(*globals(), LogRenderer);
        let report = service
            .process(&notification(
                Some(77),
                workspace(vec![window(10, 1000), window(11, 1000)]),
            ))
            .unwrap();
        assert_eq!(report.groups, 0);
    }

    #[test]
    fn notification_parses_from_json() {
        let json = r#"{"change": "focus", "container": 11, "tree": {"id": 1, "type": "root"}}"#;
        let parsed: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.container, Some(NodeId::new(11)));
        assert_eq!(parsed.tree.node_type, NodeType::Root);

        let bare: Notification =
            serde_json::from_str(r#"{"change": "close", "tree": {"id": 1}}"#).unwrap();
        assert_eq!(bare.container, None);
    }

    #[test]
    fn handle_processes_in_order_and_returns_service() {
        let handle = ServiceHandle::spawn(FlexService::new(*globals(), LogRenderer)).unwrap();
        let tree = workspace(vec![window(10, 1000), window(11, 1000)]);
        handle
            .submit(notification(Some(11), tree.clone()))
            .unwrap();
        handle.submit(notification(Some(10), tree)).unwrap();

        let service = handle.shutdown().unwrap();
        assert_eq!(service.stats().processed, 2);
        assert_eq!(service.stats().failed, 0);
    }
}
