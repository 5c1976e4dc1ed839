use std::sync::Arc;

use anyhow::Context;

use crate::{
    audio::mix::{MIX_SAMPLE_RATE, build_audio_manifest, secs_to_sample},
    effects::fx::{ClipContext, EffectEngine},
    effects::transitions::{TransitionKind, clamp_overlap, parse_transition},
    foundation::core::secs_arg,
    foundation::error::{StoryreelError, StoryreelResult},
    project::model::{OverlayLayer, SubtitleItem, SubtitleMode, VisualLayer},
    render::context::{RenderContext, StageOutcome},
    render::encode::{EncodeBackend, EncodeJob, ensure_parent_dir},
    render::graph::{FilterGraph, MediaInput, StreamLabel},
    render::subtitles::{burn_filter, save_srt},
    script::model::{OverlayPosition, VisualKind},
};

/// One step of the rendering pipeline.
pub trait RenderStage: Send + Sync {
    /// Stage name used in progress events and errors.
    fn name(&self) -> &'static str;

    /// Run the stage against the shared render context.
    fn run(&self, ctx: &mut RenderContext<'_>) -> StoryreelResult<StageOutcome>;
}

/// Lays out visual layers with their transitions and effects into the base composite.
pub struct VisualCompositionStage {
    engine: Arc<dyn EffectEngine>,
}

impl VisualCompositionStage {
    /// Stage applying effects through `engine`.
    pub fn new(engine: Arc<dyn EffectEngine>) -> Self {
        Self { engine }
    }
}

struct PlacedLayer<'p> {
    layer: &'p VisualLayer,
    // Visible length: until the next layer starts, or the timeline ends.
    visible: f64,
    // Overlap with the following layer.
    overlap_next: f64,
    kind_in: TransitionKind,
}

fn place_layers<'p>(layers: &'p [VisualLayer], duration: f64) -> Vec<PlacedLayer<'p>> {
    let mut placed: Vec<PlacedLayer<'p>> = layers
        .iter()
        .enumerate()
        .map(|(k, layer)| {
            let hold_end = layers.get(k + 1).map(|n| n.start).unwrap_or(duration);
            let kind_in = match (k, layer.transition.as_ref()) {
                (0, _) | (_, None) => TransitionKind::Cut,
                (_, Some(spec)) => parse_transition(spec).unwrap_or_else(|e| {
                    tracing::warn!(
                        scene = layer.scene_index,
                        error = %e,
                        "unknown transition, using cut"
                    );
                    TransitionKind::Cut
                }),
            };
            PlacedLayer {
                layer,
                visible: (hold_end.max(layer.end) - layer.start).max(0.0),
                overlap_next: 0.0,
                kind_in,
            }
        })
        .collect();

    for k in 1..placed.len() {
        if placed[k].kind_in == TransitionKind::Cut {
            continue;
        }
        let requested = placed[k]
            .layer
            .transition
            .as_ref()
            .map(|t| t.duration_secs)
            .unwrap_or(0.0);
        let o = clamp_overlap(requested, placed[k - 1].visible, placed[k].visible);
        placed[k - 1].overlap_next = o;
    }
    placed
}

fn normalize_filter(ctx: &RenderContext<'_>) -> String {
    let (w, h) = (ctx.frame.width, ctx.frame.height);
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={},format=yuv420p",
        ctx.output().fps
    )
}

impl RenderStage for VisualCompositionStage {
    fn name(&self) -> &'static str {
        "visual_composition"
    }

    fn run(&self, ctx: &mut RenderContext<'_>) -> StoryreelResult<StageOutcome> {
        let timeline = &ctx.project.timeline;
        let fps = ctx.output().fps;
        if timeline.duration <= 0.0 {
            return Err(StoryreelError::validation("timeline is empty; nothing to render"));
        }

        if timeline.visual_layers.is_empty() {
            let idx = ctx.graph.add_input(MediaInput {
                pre_args: vec!["-f".to_string(), "lavfi".to_string()],
                path: format!(
                    "color=c=black:s={}x{}:r={fps}:d={}",
                    ctx.frame.width,
                    ctx.frame.height,
                    secs_arg(timeline.duration)
                )
                .into(),
            });
            let norm = normalize_filter(ctx);
            ctx.video = Some(ctx.graph.chain(&FilterGraph::video_of(idx), &norm, "v"));
            return Ok(StageOutcome::Applied);
        }

        let placed = place_layers(&timeline.visual_layers, timeline.duration);
        let norm = normalize_filter(ctx);
        let mut acc: Option<StreamLabel> = None;

        for (k, p) in placed.iter().enumerate() {
            let len = p.visible + p.overlap_next;
            let idx = match p.layer.kind {
                VisualKind::Image => ctx
                    .graph
                    .add_input(MediaInput::looped_image(&p.layer.source, len, fps)),
                VisualKind::Video => ctx.graph.add_input(MediaInput::file(&p.layer.source)),
            };

            let mut chain = vec![
                format!("tpad=stop_mode=clone:stop_duration={}", secs_arg(len)),
                format!("trim=duration={}", secs_arg(len)),
                "setpts=PTS-STARTPTS".to_string(),
                norm.clone(),
            ];
            if k == 0 && p.layer.start > 0.0 {
                chain.push(format!(
                    "tpad=start_duration={}:start_mode=add:color=black",
                    secs_arg(p.layer.start)
                ));
            }
            let base = ctx
                .graph
                .chain(&FilterGraph::video_of(idx), &chain.join(","), "v");
            let clip = ClipContext {
                frame: ctx.frame,
                duration: len,
                fps,
            };
            let clip_out = self
                .engine
                .apply_effects(&mut ctx.graph, base, &p.layer.effects, &clip)
                .map_err(|e| e.at_scene(p.layer.scene_index))?;

            if p.layer.keep_audio && p.layer.kind == VisualKind::Video {
                let delay = secs_to_sample(p.layer.start, MIX_SAMPLE_RATE);
                let filter = format!(
                    "atrim=duration={},asetpts=PTS-STARTPTS,aresample={MIX_SAMPLE_RATE},aformat=channel_layouts=stereo,adelay=delays={delay}S:all=1",
                    secs_arg(p.visible)
                );
                let a = ctx.graph.chain(&FilterGraph::audio_of(idx), &filter, "ka");
                ctx.embedded_audio.push(a);
            }

            acc = Some(match acc {
                None => clip_out,
                Some(prev) => {
                    let out = ctx.graph.fresh("v");
                    let overlap = placed[k - 1].overlap_next;
                    match p.kind_in.xfade_name() {
                        Some(name) if overlap > 0.0 => {
                            let filter = format!(
                                "xfade=transition={name}:duration={}:offset={}",
                                secs_arg(overlap),
                                secs_arg(p.layer.start)
                            );
                            ctx.graph.push(&[&prev, &clip_out], &filter, &out);
                        }
                        _ => ctx
                            .graph
                            .push(&[&prev, &clip_out], "concat=n=2:v=1:a=0", &out),
                    }
                    out
                }
            });
        }

        ctx.video = acc;
        Ok(StageOutcome::Applied)
    }
}

/// Mixes narration and music layers into one audio stream.
pub struct AudioCompositionStage;

impl RenderStage for AudioCompositionStage {
    fn name(&self) -> &'static str {
        "audio_composition"
    }

    fn run(&self, ctx: &mut RenderContext<'_>) -> StoryreelResult<StageOutcome> {
        let timeline = &ctx.project.timeline;
        let manifest = build_audio_manifest(&timeline.audio_layers, timeline.duration)?;
        match manifest.lower(&mut ctx.graph) {
            Some(mix) => {
                ctx.audio = Some(mix);
                Ok(StageOutcome::Applied)
            }
            None => Ok(StageOutcome::Skipped("no audio layers".to_string())),
        }
    }
}

/// Combines the composed audio with audio carried by the visual clips.
pub struct AudioMergeStage;

impl RenderStage for AudioMergeStage {
    fn name(&self) -> &'static str {
        "audio_merge"
    }

    fn run(&self, ctx: &mut RenderContext<'_>) -> StoryreelResult<StageOutcome> {
        if ctx.embedded_audio.is_empty() {
            return Ok(StageOutcome::Skipped("no embedded audio".to_string()));
        }
        let mut pads: Vec<StreamLabel> = ctx.audio.take().into_iter().collect();
        pads.append(&mut ctx.embedded_audio);

        let total = secs_arg(ctx.project.timeline.duration);
        let filter = if pads.len() == 1 {
            format!("apad,atrim=duration={total}")
        } else {
            format!(
                "amix=inputs={}:duration=longest:dropout_transition=0:normalize=0,apad,atrim=duration={total}",
                pads.len()
            )
        };
        let out = ctx.graph.fresh("amerge");
        let refs: Vec<&StreamLabel> = pads.iter().collect();
        ctx.graph.push(&refs, &filter, &out);
        ctx.audio = Some(out);
        Ok(StageOutcome::Applied)
    }
}

/// Composites overlay layers above the base video, bottom first.
pub struct OverlayCompositionStage;

impl OverlayCompositionStage {
    /// `overlay` filter arguments placing `layer` on the frame.
    pub fn overlay_filter(layer: &OverlayLayer) -> String {
        let m = layer.margin_px;
        let (x, y) = match layer.position {
            OverlayPosition::TopLeft => (format!("{m}"), format!("{m}")),
            OverlayPosition::TopRight => (format!("W-w-{m}"), format!("{m}")),
            OverlayPosition::BottomLeft => (format!("{m}"), format!("H-h-{m}")),
            OverlayPosition::BottomRight => (format!("W-w-{m}"), format!("H-h-{m}")),
            OverlayPosition::Center => ("(W-w)/2".to_string(), "(H-h)/2".to_string()),
        };
        format!(
            "overlay=x={x}:y={y}:enable='between(t,{},{})'",
            secs_arg(layer.start),
            secs_arg(layer.end)
        )
    }
}

impl RenderStage for OverlayCompositionStage {
    fn name(&self) -> &'static str {
        "overlay_composition"
    }

    fn run(&self, ctx: &mut RenderContext<'_>) -> StoryreelResult<StageOutcome> {
        let overlays = &ctx.project.timeline.overlay_layers;
        if overlays.is_empty() {
            return Ok(StageOutcome::Skipped("no overlay layers".to_string()));
        }
        let mut base = ctx
            .video
            .take()
            .ok_or_else(|| StoryreelError::validation("overlay stage needs a base video stream"))?;
        let duration = ctx.project.timeline.duration;
        let fps = ctx.output().fps;

        for layer in overlays {
            let idx = ctx
                .graph
                .add_input(MediaInput::looped_image(&layer.source, duration, fps));
            let width =
                ((f64::from(ctx.frame.width) * layer.scale / 2.0).round() as u32 * 2).max(2);
            let prepared = ctx.graph.chain(
                &FilterGraph::video_of(idx),
                &format!(
                    "scale={width}:-2,format=rgba,colorchannelmixer=aa={}",
                    layer.opacity
                ),
                "ov",
            );
            let out = ctx.graph.fresh("v");
            ctx.graph
                .push(&[&base, &prepared], &Self::overlay_filter(layer), &out);
            base = out;
        }
        ctx.video = Some(base);
        Ok(StageOutcome::Applied)
    }
}

/// Burns captions into the video or exports them as a sidecar `.srt`.
pub struct SubtitleStage;

impl RenderStage for SubtitleStage {
    fn name(&self) -> &'static str {
        "subtitles"
    }

    fn run(&self, ctx: &mut RenderContext<'_>) -> StoryreelResult<StageOutcome> {
        let mode = ctx.output().subtitle_mode;
        if mode == SubtitleMode::None {
            return Ok(StageOutcome::Skipped("subtitles disabled".to_string()));
        }
        let layers = &ctx.project.timeline.subtitle_layers;
        let items: Vec<SubtitleItem> = layers.iter().flat_map(|l| l.items.clone()).collect();
        if items.iter().all(|i| i.end <= i.start) {
            return Ok(StageOutcome::Skipped("no subtitle items".to_string()));
        }

        match mode {
            SubtitleMode::Sidecar => {
                let path = ctx.output().sidecar_path();
                ensure_parent_dir(&path)?;
                // Registered before writing so cleanup removes it if the render fails.
                ctx.sidecar = Some(path.clone());
                save_srt(&items, &path)?;
            }
            SubtitleMode::Burn => {
                let style = layers.first().map(|l| l.style.clone()).unwrap_or_default();
                let path = ctx.partial_path.with_extension("burn.srt");
                ensure_parent_dir(&path)?;
                ctx.temp_files.push(path.clone());
                save_srt(&items, &path)?;
                let video = ctx.video.take().ok_or_else(|| {
                    StoryreelError::validation("subtitle stage needs a base video stream")
                })?;
                let filter = burn_filter(&path, &style)?;
                ctx.video = Some(ctx.graph.chain(&video, &filter, "v"));
            }
            SubtitleMode::None => {}
        }
        Ok(StageOutcome::Applied)
    }
}

/// Hands the finished graph to an [`EncodeBackend`] and publishes the output atomically.
pub struct EncodeStage {
    backend: Arc<dyn EncodeBackend>,
}

impl EncodeStage {
    /// Stage encoding through `backend`.
    pub fn new(backend: Arc<dyn EncodeBackend>) -> Self {
        Self { backend }
    }
}

impl RenderStage for EncodeStage {
    fn name(&self) -> &'static str {
        "encode"
    }

    fn run(&self, ctx: &mut RenderContext<'_>) -> StoryreelResult<StageOutcome> {
        let video = ctx
            .video
            .clone()
            .ok_or_else(|| StoryreelError::validation("encode stage needs a video stream"))?;
        let output = ctx.output().clone();
        ensure_parent_dir(&ctx.partial_path)?;

        let job = EncodeJob::from_graph(
            &ctx.graph,
            video,
            ctx.audio.clone(),
            output.clone(),
            ctx.partial_path.clone(),
            ctx.project.timeline.duration,
        );
        self.backend.encode(&job)?;

        if !ctx.partial_path.is_file() {
            return Err(StoryreelError::Other(anyhow::anyhow!(
                "encoder reported success but wrote no file at '{}'",
                ctx.partial_path.display()
            )));
        }
        std::fs::rename(&ctx.partial_path, &output.path).with_context(|| {
            format!(
                "move '{}' to '{}'",
                ctx.partial_path.display(),
                output.path.display()
            )
        })?;
        ctx.completed = true;
        tracing::info!(output = %output.path.display(), "encoded");
        Ok(StageOutcome::Applied)
    }
}

/// Releases every temporary artifact; runs even after a failed stage.
pub struct CleanupStage;

fn remove_if_present(path: &std::path::Path) -> StoryreelResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("remove '{}'", path.display()))
            .into()),
    }
}

impl RenderStage for CleanupStage {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn run(&self, ctx: &mut RenderContext<'_>) -> StoryreelResult<StageOutcome> {
        let mut first_err = None;
        let mut to_remove: Vec<std::path::PathBuf> = ctx.temp_files.drain(..).collect();
        if !ctx.completed {
            to_remove.push(ctx.partial_path.clone());
            if let Some(sidecar) = ctx.sidecar.take() {
                to_remove.push(sidecar);
            }
        }
        for path in &to_remove {
            if let Err(e) = remove_if_present(path) {
                tracing::warn!(path = %path.display(), error = %e, "cleanup failed");
                first_err.get_or_insert(e);
            }
        }
        ctx.video = None;
        ctx.audio = None;
        ctx.embedded_audio.clear();
        match first_err {
            Some(e) => Err(e),
            None => Ok(StageOutcome::Applied),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/stages.rs"]
mod tests;
