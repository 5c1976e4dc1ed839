use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    effects::fx::{EffectEngine, FfmpegEffectEngine},
    foundation::error::StoryreelResult,
    project::model::Project,
    render::context::{ProgressEvent, ProgressSink, RenderContext},
    render::encode::{EncodeBackend, FfmpegBackend},
    render::stages::{
        AudioCompositionStage, AudioMergeStage, CleanupStage, EncodeStage,
        OverlayCompositionStage, RenderStage, SubtitleStage, VisualCompositionStage,
    },
};

/// Ordered chain of render stages with an always-run cleanup step.
///
/// A pipeline holds no per-render state, so one instance can render many projects
/// concurrently.
pub struct RenderPipeline {
    stages: Vec<Box<dyn RenderStage>>,
    cleanup: Box<dyn RenderStage>,
}

impl RenderPipeline {
    /// Standard chain: visuals, audio, audio merge, overlays, subtitles, encode.
    pub fn new(engine: Arc<dyn EffectEngine>, backend: Arc<dyn EncodeBackend>) -> Self {
        Self::with_stages(vec![
            Box::new(VisualCompositionStage::new(engine)),
            Box::new(AudioCompositionStage),
            Box::new(AudioMergeStage),
            Box::new(OverlayCompositionStage),
            Box::new(SubtitleStage),
            Box::new(EncodeStage::new(backend)),
        ])
    }

    /// Custom chain; cleanup is always appended.
    pub fn with_stages(stages: Vec<Box<dyn RenderStage>>) -> Self {
        Self {
            stages,
            cleanup: Box::new(CleanupStage),
        }
    }

    /// Standard chain backed by the `ffmpeg` CLI.
    pub fn ffmpeg() -> Self {
        Self::new(Arc::new(FfmpegEffectEngine), Arc::new(FfmpegBackend))
    }

    /// Stage names in execution order, cleanup last.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.cleanup.name()))
            .collect()
    }

    /// Render `project.output` and return the written path.
    ///
    /// Stops at the first failing stage; cleanup still runs and the first error wins.
    #[tracing::instrument(skip_all, fields(output = %project.output.path.display()))]
    pub fn render(
        &self,
        project: &Project,
        progress: &dyn ProgressSink,
    ) -> StoryreelResult<PathBuf> {
        project.validate()?;
        let output = project.output.path.clone();
        let total = self.stages.len() + 1;
        let mut ctx = RenderContext::new(project, progress);
        let mut failure = None;

        for (index, stage) in self.stages.iter().enumerate() {
            if let Err(e) = run_stage(stage.as_ref(), &mut ctx, index, total) {
                failure = Some(e.in_stage(&output, stage.name()));
                break;
            }
        }

        if let Err(e) = run_stage(self.cleanup.as_ref(), &mut ctx, total - 1, total) {
            let e = e.in_stage(&output, self.cleanup.name());
            if failure.is_none() {
                failure = Some(e);
            } else {
                tracing::warn!(error = %e, "cleanup failed after an earlier stage error");
            }
        }

        match failure {
            Some(e) => {
                tracing::warn!(error = %e, "render failed");
                Err(e)
            }
            None => {
                tracing::info!(output = %output.display(), "render finished");
                Ok(output)
            }
        }
    }
}

fn run_stage(
    stage: &dyn RenderStage,
    ctx: &mut RenderContext<'_>,
    index: usize,
    total: usize,
) -> StoryreelResult<()> {
    let output = ctx.output().path.clone();
    ctx.progress.notify(&ProgressEvent::StageStarted {
        output: output.clone(),
        stage: stage.name(),
        index,
        total,
    });
    let outcome = stage.run(ctx)?;
    tracing::debug!(stage = stage.name(), ?outcome, "stage done");
    ctx.progress.notify(&ProgressEvent::StageFinished {
        output,
        stage: stage.name(),
        outcome,
    });
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
