use std::path::PathBuf;

use crate::{
    foundation::core::FrameSize,
    project::model::{OutputConfig, Project},
    render::graph::{FilterGraph, StreamLabel},
};

#[derive(Clone, Debug, PartialEq)]
/// Outcome of one pipeline stage.
pub enum StageOutcome {
    /// The stage changed the render context.
    Applied,
    /// The stage had nothing to do; the context passes through unchanged.
    Skipped(String),
}

#[derive(Clone, Debug, PartialEq)]
/// One-way progress notification.
pub enum ProgressEvent {
    /// A pipeline stage is about to run.
    StageStarted {
        /// Output being rendered.
        output: PathBuf,
        /// Stage name.
        stage: &'static str,
        /// Zero-based position in the chain.
        index: usize,
        /// Number of stages in the chain.
        total: usize,
    },
    /// A pipeline stage returned.
    StageFinished {
        /// Output being rendered.
        output: PathBuf,
        /// Stage name.
        stage: &'static str,
        /// What the stage did.
        outcome: StageOutcome,
    },
    /// A multi-output render is starting.
    RenderStarted {
        /// Number of work units.
        units: usize,
    },
    /// One multi-output work unit finished.
    UnitFinished {
        /// Position of the unit in the caller's order.
        index: usize,
        /// Output path of the unit.
        output: PathBuf,
        /// Whether the unit succeeded.
        ok: bool,
        /// Units finished so far, including this one.
        completed: usize,
        /// Number of work units.
        units: usize,
    },
}

/// Receiver of progress notifications.
pub trait ProgressSink: Send + Sync {
    /// Handle one event. Must not block for long.
    fn notify(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn notify(&self, event: &ProgressEvent) {
        self(event)
    }
}

#[derive(Clone, Copy, Debug, Default)]
/// Sink that drops every event.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn notify(&self, _event: &ProgressEvent) {}
}

#[derive(Clone, Copy, Debug, Default)]
/// Sink that logs events through `tracing`.
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn notify(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::StageStarted {
                output,
                stage,
                index,
                total,
            } => tracing::debug!(output = %output.display(), stage, index, total, "stage started"),
            ProgressEvent::StageFinished {
                output,
                stage,
                outcome,
            } => tracing::debug!(output = %output.display(), stage, ?outcome, "stage finished"),
            ProgressEvent::RenderStarted { units } => {
                tracing::info!(units, "multi-output render started")
            }
            ProgressEvent::UnitFinished {
                index,
                output,
                ok,
                completed,
                units,
            } => tracing::info!(
                index,
                output = %output.display(),
                ok,
                completed,
                units,
                "output finished"
            ),
        }
    }
}

/// Per-render working state threaded through the pipeline stages.
///
/// Created fresh for each pipeline run and dropped after cleanup.
pub struct RenderContext<'a> {
    /// Project being rendered; its `output` is the render target.
    pub project: &'a Project,
    /// Target frame size.
    pub frame: FrameSize,
    /// Filter graph under construction.
    pub graph: FilterGraph,
    /// Current composite video stream.
    pub video: Option<StreamLabel>,
    /// Current composite audio stream.
    pub audio: Option<StreamLabel>,
    /// Audio tracks carried by visual clips (`keep_audio`), already positioned on the timeline.
    pub embedded_audio: Vec<StreamLabel>,
    /// Hidden file the encoder writes before the final rename.
    pub partial_path: PathBuf,
    /// Sidecar subtitle file written for this render, if any.
    pub sidecar: Option<PathBuf>,
    /// Temporary files removed during cleanup.
    pub temp_files: Vec<PathBuf>,
    /// Set once the final output file is in place.
    pub completed: bool,
    /// Progress receiver.
    pub progress: &'a dyn ProgressSink,
}

impl<'a> RenderContext<'a> {
    /// Fresh context for rendering `project.output`.
    pub fn new(project: &'a Project, progress: &'a dyn ProgressSink) -> Self {
        Self {
            project,
            frame: project.output.frame_size(),
            graph: FilterGraph::new(),
            video: None,
            audio: None,
            embedded_audio: Vec::new(),
            partial_path: project.output.partial_path(),
            sidecar: None,
            temp_files: Vec::new(),
            completed: false,
            progress,
        }
    }

    /// Render target.
    pub fn output(&self) -> &OutputConfig {
        &self.project.output
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/context.rs"]
mod tests;
