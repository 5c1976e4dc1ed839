use std::path::PathBuf;

use crate::{
    assets::resolver::AssetResolver,
    foundation::core::TimeRange,
    foundation::error::{StoryreelError, StoryreelResult},
    narration::generate::NarrationResult,
    preset::catalog::PresetRegistry,
    project::model::{
        AudioLayer, AudioRole, OutputConfig, OutputSpec, OverlayLayer, PROJECT_VERSION, Project,
        SubtitleItem, SubtitleLayer, Timeline, VisualLayer,
    },
    script::model::{Script, VisualKind},
    timing::scheduler::{SceneTiming, total_duration},
};

/// Map a scheduled script onto typed layers and output targets.
///
/// `timings` and `narration` must both come from `script`: one entry per scene, one inner
/// entry per narration segment. Every output target shares the same [`Timeline`].
pub fn assemble(
    script: &Script,
    timings: &[SceneTiming],
    narration: &[Vec<NarrationResult>],
    presets: &PresetRegistry,
    resolver: &dyn AssetResolver,
) -> StoryreelResult<Project> {
    assemble_tracked(script, timings, narration, presets, resolver).map(|(project, _)| project)
}

/// [`assemble`], also returning the visuals the resolver had to generate.
pub(crate) fn assemble_tracked(
    script: &Script,
    timings: &[SceneTiming],
    narration: &[Vec<NarrationResult>],
    presets: &PresetRegistry,
    resolver: &dyn AssetResolver,
) -> StoryreelResult<(Project, Vec<PathBuf>)> {
    check_shapes(script, timings, narration)?;
    let duration = total_duration(timings);
    let default_preset = presets.resolve(None, script.preset.as_deref())?;

    let mut visual_layers = Vec::with_capacity(script.scenes.len());
    let mut audio_layers = Vec::with_capacity(script.segment_count() + 1);
    let mut items = Vec::with_capacity(script.segment_count());
    let mut generated = Vec::new();

    for (i, (scene, timing)) in script.scenes.iter().zip(timings).enumerate() {
        let preset = presets
            .resolve(scene.preset.as_deref(), script.preset.as_deref())
            .map_err(|e| match e {
                StoryreelError::Validation(msg) => {
                    StoryreelError::validation(format!("scene {i}: {msg}"))
                }
                other => other,
            })?;
        let asset = resolver.resolve(&scene.visual).map_err(|e| e.at_scene(i))?;
        if asset.generated {
            generated.push(asset.path.clone());
        }
        let effects = match asset.kind {
            VisualKind::Image => preset.image_effects(),
            VisualKind::Video => preset.video_effects(),
        };
        let transition = if i == 0 {
            None
        } else {
            Some(scene.transition.clone().unwrap_or_else(|| preset.transition()))
        };
        visual_layers.push(VisualLayer {
            scene_index: i,
            source: asset.path,
            kind: asset.kind,
            start: timing.start,
            end: timing.end,
            effects,
            transition,
            keep_audio: scene.visual.keep_audio && asset.kind == VisualKind::Video,
        });

        for ((seg, seg_timing), result) in scene
            .narration
            .iter()
            .zip(&timing.segments)
            .zip(&narration[i])
        {
            audio_layers.push(AudioLayer {
                role: AudioRole::Narration,
                source: result.audio_path.clone(),
                start: seg_timing.start,
                end: seg_timing.end,
                volume: script.voice.volume,
                fade_in: 0.0,
                fade_out: 0.0,
                looped: false,
                scene_index: Some(i),
                segment_index: Some(seg_timing.segment_index),
            });
            let window = seg_timing.range().shrink(script.timing.subtitle_padding);
            items.push(SubtitleItem {
                scene_index: i,
                segment_index: seg_timing.segment_index,
                text: seg.text.trim().to_string(),
                start: window.start,
                end: window.end,
            });
        }
    }

    if let Some(bgm) = &script.bgm {
        audio_layers.push(AudioLayer {
            role: AudioRole::Music,
            source: resolver.resolve_path(&bgm.path)?,
            start: 0.0,
            end: duration,
            volume: bgm.volume,
            fade_in: bgm.fade_in_secs,
            fade_out: bgm.fade_out_secs,
            looped: bgm.looped,
            scene_index: None,
            segment_index: None,
        });
    }

    let mut overlay_layers = Vec::with_capacity(script.overlays.len());
    for overlay in &script.overlays {
        let window = TimeRange {
            start: overlay.start.unwrap_or(0.0),
            end: overlay.end.unwrap_or(duration),
        }
        .clamp_to(duration);
        overlay_layers.push(OverlayLayer {
            source: resolver.resolve_path(&overlay.path)?,
            position: overlay.position,
            margin_px: overlay.margin_px,
            opacity: overlay.opacity,
            scale: overlay.scale,
            start: window.start,
            end: window.end,
        });
    }

    let defaults = default_preset.output_defaults();
    let outputs = if script.outputs.is_empty() {
        vec![OutputConfig::derive(
            &OutputSpec::new(default_output_path(&script.title)),
            &defaults,
        )?]
    } else {
        script
            .outputs
            .iter()
            .map(|spec| OutputConfig::derive(spec, &defaults))
            .collect::<StoryreelResult<Vec<_>>>()?
    };
    let output = outputs
        .first()
        .cloned()
        .ok_or_else(|| StoryreelError::validation("script produced no output targets"))?;

    let project = Project {
        version: PROJECT_VERSION.to_string(),
        title: script.title.clone(),
        output,
        outputs,
        timeline: Timeline {
            duration,
            visual_layers,
            audio_layers,
            subtitle_layers: vec![SubtitleLayer {
                items,
                style: default_preset.subtitle_style(),
            }],
            overlay_layers,
        },
    };
    project.validate()?;
    tracing::debug!(
        scenes = script.scenes.len(),
        outputs = project.outputs.len(),
        duration,
        "assembled project"
    );
    Ok((project, generated))
}

fn check_shapes(
    script: &Script,
    timings: &[SceneTiming],
    narration: &[Vec<NarrationResult>],
) -> StoryreelResult<()> {
    if timings.len() != script.scenes.len() || narration.len() != script.scenes.len() {
        return Err(StoryreelError::schedule(
            timings.len().min(narration.len()),
            format!(
                "expected {} scenes, got {} timings and {} narration groups",
                script.scenes.len(),
                timings.len(),
                narration.len()
            ),
        ));
    }
    for (i, scene) in script.scenes.iter().enumerate() {
        let want = scene.narration.len();
        if timings[i].segments.len() != want || narration[i].len() != want {
            return Err(StoryreelError::schedule(
                i,
                format!(
                    "expected {want} segments, got {} timings and {} narration results",
                    timings[i].segments.len(),
                    narration[i].len()
                ),
            ));
        }
    }
    Ok(())
}

/// `<title-slug>.mp4`, used when a script names no outputs.
pub fn default_output_path(title: &str) -> PathBuf {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        PathBuf::from("storyreel.mp4")
    } else {
        PathBuf::from(format!("{slug}.mp4"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/assembler.rs"]
mod tests;
