//! Dispatch of render batches to the host.
//!
//! A [`ResizeRenderer`] turns every [`RenderRequest`] into percentage resize
//! commands, largest item first, and feeds them through a [`CommandSink`].
//! Commands the host rejects are retried in bounded passes.

use std::io::{self, Write};

use flexwm_layout::{
    Axis, InvariantViolation, NORMAL, NodeId, RenderRequest, Size, check_scale, rescale,
};
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Scale the host expects resize amounts in.
pub const DEFAULT_PERCENT_SCALE: Size = 100;

/// Failure of a single command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("host rejected command: {0}")]
    Rejected(String),
}

/// Where resize commands go.
pub trait CommandSink {
    fn run(&mut self, command: &str) -> Result<(), CommandError>;
}

/// Writes one command per line.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CommandSink for WriterSink<W> {
    fn run(&mut self, command: &str) -> Result<(), CommandError> {
        writeln!(self.writer, "{command}")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Outcome of rendering one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Groups whose commands were issued.
    pub groups: usize,
    /// Every command issued, in order of first attempt.
    pub commands: Vec<String>,
    /// Retry attempts across all commands.
    pub retries: usize,
    /// Commands still failing after the retry policy ran out.
    pub failed: Vec<String>,
    /// Groups that were not rendered because they were off scale.
    pub skipped: Vec<NodeId>,
}

impl RenderReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Applies a batch of render requests.
pub trait Renderer {
    fn render(&mut self, batch: &[RenderRequest]) -> RenderReport;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, batch: &[RenderRequest]) -> RenderReport {
        (**self).render(batch)
    }
}

/// Resize commands for one request, largest item first.
///
/// Items of equal size keep their group order. Proportions are rescaled
/// from [`NORMAL`] to `percent_scale`, so the amounts sum to it exactly.
pub fn resize_commands(
    request: &RenderRequest,
    percent_scale: Size,
) -> Result<Vec<String>, InvariantViolation> {
    let mut items = request.items.clone();
    items.sort_by(|a, b| b.1.cmp(&a.1));

    let mut amounts: Vec<Size> = items.iter().map(|&(_, size)| size).collect();
    check_scale(&amounts, NORMAL)?;
    rescale(&mut amounts, NORMAL, percent_scale)?;

    let dimension = match request.axis {
        Axis::Horizontal => "width",
        Axis::Vertical => "height",
    };
    Ok(items
        .iter()
        .zip(&amounts)
        .map(|(&(id, _), amount)| format!("[con_id={id}] resize set {dimension} {amount} ppt"))
        .collect())
}

/// Sends resize commands through a [`CommandSink`].
#[derive(Debug)]
pub struct ResizeRenderer<S> {
    sink: S,
    percent_scale: Size,
    retry: RetryPolicy,
}

impl<S: CommandSink> ResizeRenderer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            percent_scale: DEFAULT_PERCENT_SCALE,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_percent_scale(mut self, percent_scale: Size) -> Self {
        self.percent_scale = percent_scale;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn dispatch(&mut self, commands: Vec<String>, report: &mut RenderReport) {
        let mut pending = Vec::new();
        for command in commands {
            tracing::debug!(%command, "resize");
            if let Err(err) = self.sink.run(&command) {
                tracing::warn!(%command, %err, "resize failed");
                pending.push(command.clone());
            }
            report.commands.push(command);
        }

        let sink = &mut self.sink;
        report.retries += self.retry.run(&mut pending, |attempt, command| {
            match sink.run(command) {
                Ok(()) => false,
                Err(err) => {
                    tracing::warn!(attempt, %command, %err, "resize retry failed");
                    true
                }
            }
        });
        if !pending.is_empty() {
            tracing::error!(failed = pending.len(), "giving up on resize commands");
            report.failed.append(&mut pending);
        }
    }
}

impl<S: CommandSink> Renderer for ResizeRenderer<S> {
    fn render(&mut self, batch: &[RenderRequest]) -> RenderReport {
        let mut report = RenderReport::default();
        for request in batch {
            match resize_commands(request, self.percent_scale) {
                Ok(commands) => {
                    report.groups += 1;
                    self.dispatch(commands, &mut report);
                }
                Err(err) => {
                    tracing::error!(group = %request.group, %err, "group is off scale, not rendered");
                    report.skipped.push(request.group);
                }
            }
        }
        report
    }
}

/// Logs batches without applying them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&mut self, batch: &[RenderRequest]) -> RenderReport {
        for request in batch {
            tracing::info!(group = %request.group, axis = %request.axis, items = ?request.items, "render");
        }
        RenderReport {
            groups: batch.len(),
            ..RenderReport::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::BackoffStrategy;

    /// Records commands and fails each one a configured number of times.
    #[derive(Default)]
    struct FlakySink {
        log: Vec<String>,
        failures: Vec<(String, usize)>,
    }

    impl FlakySink {
        fn failing(command: &str, times: usize) -> Self {
            Self {
                log: Vec::new(),
                failures: vec![(command.to_owned(), times)],
            }
        }
    }

    impl CommandSink for FlakySink {
        fn run(&mut self, command: &str) -> Result<(), CommandError> {
            self.log.push(command.to_owned());
            match self.failures.iter_mut().find(|(c, _)| c == command) {
                Some((_, left)) if *left > 0 => {
                    *left -= 1;
                    Err(CommandError::Rejected("busy".into()))
                }
                _ => Ok(()),
            }
        }
    }

    fn request(axis: Axis, items: &[(i64, Size)]) -> RenderRequest {
        RenderRequest {
            group: NodeId::new(1),
            axis,
            items: items.iter().map(|&(i, s)| (NodeId::new(i), s)).collect(),
        }
    }

    #[test]
    fn commands_are_sorted_and_rescaled() {
        let commands =
            resize_commands(&request(Axis::Horizontal, &[(10, 191), (11, 619), (12, 190)]), 100)
                .unwrap();
        assert_eq!(
            commands,
            vec![
                "[con_id=11] resize set width 62 ppt",
                "[con_id=10] resize set width 19 ppt",
                "[con_id=12] resize set width 19 ppt",
            ]
        );
    }

    #[test]
    fn ties_keep_group_order() {
        let commands =
            resize_commands(&request(Axis::Vertical, &[(10, 500), (11, 500)]), 100).unwrap();
        assert_eq!(
            commands,
            vec![
                "[con_id=10] resize set height 50 ppt",
                "[con_id=11] resize set height 50 ppt",
            ]
        );
    }

    #[test]
    fn off_scale_request_is_skipped() {
        let mut renderer = ResizeRenderer::new(FlakySink::default());
        let report = renderer.render(&[request(Axis::Horizontal, &[(10, 400), (11, 400)])]);
        assert_eq!(report.groups, 0);
        assert_eq!(report.skipped, vec![NodeId::new(1)]);
        assert!(renderer.sink().log.is_empty());
        assert!(!report.is_clean());
    }

    #[test]
    fn rejected_commands_are_retried() {
        let sink = FlakySink::failing("[con_id=11] resize set width 50 ppt", 2);
        let mut renderer = ResizeRenderer::new(sink);
        let report = renderer.render(&[request(Axis::Horizontal, &[(10, 500), (11, 500)])]);
        assert!(report.is_clean());
        assert_eq!(report.commands.len(), 2);
        assert_eq!(report.retries, 2);
        assert_eq!(renderer.sink().log.len(), 4);
    }

    #[test]
    fn retries_are_bounded() {
        let sink = FlakySink::failing("[con_id=10] resize set width 50 ppt", usize::MAX);
        let mut renderer = ResizeRenderer::new(sink).with_retry(RetryPolicy::new(
            2,
            BackoffStrategy::Fixed { delay_ms: 0 },
        ));
        let report = renderer.render(&[request(Axis::Horizontal, &[(10, 500), (11, 500)])]);
        assert_eq!(report.retries, 2);
        assert_eq!(report.failed, vec!["[con_id=10] resize set width 50 ppt"]);
        // Initial attempt of both commands plus two retry passes.
        assert_eq!(renderer.sink().log.len(), 4);
    }

    #[test]
    fn custom_percent_scale() {
        let mut renderer = ResizeRenderer::new(FlakySink::default()).with_percent_scale(1000);
        let report = renderer.render(&[request(Axis::Vertical, &[(10, 381), (11, 619)])]);
        assert_eq!(
            report.commands,
            vec![
                "[con_id=11] resize set height 619 ppt",
                "[con_id=10] resize set height 381 ppt",
            ]
        );
    }

    #[test]
    fn writer_sink_writes_lines() {
        let mut renderer = ResizeRenderer::new(WriterSink::new(Vec::new()));
        renderer.render(&[request(Axis::Horizontal, &[(10, 381), (11, 619)])]);
        let written = String::from_utf8(renderer.into_sink().into_inner()).unwrap();
        assert_eq!(
            written,
            "[con_id=11] resize set width 62 ppt\n[con_id=10] resize set width 38 ppt\n"
        );
    }

    #[test]
    fn log_renderer_counts_groups() {
        let report = LogRenderer.render(&[request(Axis::Horizontal, &[(10, 500), (11, 500)])]);
        assert_eq!(report.groups, 1);
        assert!(report.commands.is_empty());
    }
}
