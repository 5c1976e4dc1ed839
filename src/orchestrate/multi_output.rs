use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::{
    foundation::core::AspectRatio,
    foundation::error::{AggregateRenderError, RenderFailure, StoryreelError, StoryreelResult},
    project::model::{OutputConfig, Project},
    render::context::{ProgressEvent, ProgressSink, SilentProgress},
    render::pipeline::RenderPipeline,
};

/// Handle to cancel pending units of a multi-output render.
///
/// Cancellation is checked when a unit is about to start; a unit already running finishes.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Fresh, uncancelled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every unit that has not started yet.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
/// Options for [`render_all`].
pub struct OrchestratorOpts {
    /// Maximum number of outputs rendered at once. Must be >= 1.
    pub max_workers: usize,
    /// Optional cancellation handle.
    pub cancel: Option<CancelHandle>,
}

impl Default for OrchestratorOpts {
    fn default() -> Self {
        Self {
            max_workers: 2,
            cancel: None,
        }
    }
}

/// Copy of `base` retargeted to `path` with a frame reshaped to `aspect`.
///
/// The short edge, codecs and bitrates are kept.
pub fn output_for_aspect(
    base: &OutputConfig,
    path: impl Into<PathBuf>,
    aspect: &str,
) -> StoryreelResult<OutputConfig> {
    let size = base.frame_size().with_aspect(AspectRatio::parse(aspect)?);
    let out = OutputConfig {
        path: path.into(),
        width: size.width,
        height: size.height,
        aspect_ratio: Some(aspect.trim().to_string()),
        ..base.clone()
    };
    out.validate()?;
    Ok(out)
}

/// Render `project` once per entry of `outputs`, up to `opts.max_workers` at a time.
///
/// Every unit renders its own deep copy of the project. The returned paths follow the order
/// of `outputs`, not completion order. A failing unit never cancels its siblings: all units
/// run to completion and every failure is reported in one [`AggregateRenderError`], while
/// successful outputs stay on disk.
///
/// `progress` sees one [`ProgressEvent::RenderStarted`] and one
/// [`ProgressEvent::UnitFinished`] per unit; stage-level events are not forwarded.
pub fn render_all(
    pipeline: &RenderPipeline,
    project: &Project,
    outputs: &[OutputConfig],
    opts: &OrchestratorOpts,
    progress: &dyn ProgressSink,
) -> StoryreelResult<Vec<PathBuf>> {
    if opts.max_workers == 0 {
        return Err(StoryreelError::validation(
            "orchestrator max_workers must be >= 1",
        ));
    }
    if outputs.is_empty() {
        return Ok(Vec::new());
    }
    check_distinct_paths(outputs)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.max_workers)
        .build()
        .map_err(|e| StoryreelError::Other(anyhow::anyhow!("failed to build render pool: {e}")))?;

    let units = outputs.len();
    let completed = AtomicUsize::new(0);
    progress.notify(&ProgressEvent::RenderStarted { units });
    tracing::info!(units, workers = opts.max_workers, "rendering outputs");

    let run_unit = |index: usize, cfg: &OutputConfig| -> StoryreelResult<PathBuf> {
        let result = if opts.cancel.as_ref().is_some_and(CancelHandle::is_cancelled) {
            Err(StoryreelError::Cancelled {
                output: cfg.path.clone(),
            })
        } else {
            let copy = project.with_output(cfg.clone());
            pipeline.render(&copy, &SilentProgress)
        };
        progress.notify(&ProgressEvent::UnitFinished {
            index,
            output: cfg.path.clone(),
            ok: result.is_ok(),
            completed: completed.fetch_add(1, Ordering::SeqCst) + 1,
            units,
        });
        result
    };

    let results: Vec<StoryreelResult<PathBuf>> = pool.install(|| {
        outputs
            .par_iter()
            .enumerate()
            .map(|(i, cfg)| run_unit(i, cfg))
            .collect()
    });

    let mut paths = Vec::with_capacity(units);
    let mut failures = Vec::new();
    for (index, (cfg, result)) in outputs.iter().zip(results).enumerate() {
        match result {
            Ok(path) => paths.push(path),
            Err(cause) => failures.push(RenderFailure {
                index,
                path: cfg.path.clone(),
                cause,
            }),
        }
    }

    if failures.is_empty() {
        Ok(paths)
    } else {
        tracing::warn!(failed = failures.len(), units, "some outputs failed");
        Err(AggregateRenderError { failures }.into())
    }
}

fn check_distinct_paths(outputs: &[OutputConfig]) -> StoryreelResult<()> {
    for (i, a) in outputs.iter().enumerate() {
        if outputs[..i].iter().any(|b| same_path(&a.path, &b.path)) {
            return Err(StoryreelError::validation(format!(
                "output '{}' is listed more than once",
                a.path.display()
            )));
        }
    }
    Ok(())
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/multi_output.rs"]
mod tests;
