use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    foundation::error::StoryreelResult,
    narration::provider::NarrationProvider,
    script::model::Script,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Generated narration for one segment.
pub struct NarrationResult {
    /// Scene index.
    pub scene_index: usize,
    /// Segment index within the scene.
    pub segment_index: usize,
    /// Audio file written for the segment.
    pub audio_path: PathBuf,
    /// Audio length in seconds.
    pub duration_secs: f64,
}

struct SegmentJob<'a> {
    scene: usize,
    segment: usize,
    text: &'a str,
}

fn jobs(script: &Script) -> Vec<SegmentJob<'_>> {
    script
        .scenes
        .iter()
        .enumerate()
        .flat_map(|(i, scene)| {
            scene
                .narration
                .iter()
                .enumerate()
                .map(move |(j, seg)| SegmentJob {
                    scene: i,
                    segment: j,
                    text: seg.text.as_str(),
                })
        })
        .collect()
}

/// Synthesize every narration segment into `out_dir/narration/`.
///
/// Results are grouped per scene in script order. With `parallel` set, segments are generated
/// on the rayon pool; the output order is the same either way, so scheduling stays
/// deterministic.
pub fn generate_narration(
    script: &Script,
    provider: &dyn NarrationProvider,
    out_dir: &Path,
    parallel: bool,
) -> StoryreelResult<Vec<Vec<NarrationResult>>> {
    let dir = out_dir.join("narration");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create narration dir '{}'", dir.display()))?;

    let jobs = jobs(script);
    tracing::info!(
        provider = provider.name(),
        segments = jobs.len(),
        parallel,
        "generating narration"
    );

    let run = |job: &SegmentJob<'_>| -> StoryreelResult<NarrationResult> {
        let audio = provider
            .generate(job.text, &script.voice)
            .map_err(|e| e.at_segment(job.segment).at_scene(job.scene))?;
        let path = dir.join(format!(
            "scene{:03}_seg{:03}.{}",
            job.scene,
            job.segment,
            provider.audio_extension()
        ));
        std::fs::write(&path, &audio.audio_bytes)
            .with_context(|| format!("write narration '{}'", path.display()))?;
        tracing::debug!(
            scene = job.scene,
            segment = job.segment,
            duration = audio.duration_secs,
            "narration segment ready"
        );
        Ok(NarrationResult {
            scene_index: job.scene,
            segment_index: job.segment,
            audio_path: path,
            duration_secs: audio.duration_secs,
        })
    };

    let flat: Vec<NarrationResult> = if parallel {
        jobs.par_iter().map(run).collect::<StoryreelResult<_>>()?
    } else {
        jobs.iter().map(run).collect::<StoryreelResult<_>>()?
    };

    Ok(regroup(script, flat))
}

/// Estimate every segment's duration without generating audio.
pub fn estimate_narration(
    script: &Script,
    provider: &dyn NarrationProvider,
) -> StoryreelResult<Vec<Vec<f64>>> {
    script
        .scenes
        .iter()
        .enumerate()
        .map(|(i, scene)| {
            scene
                .narration
                .iter()
                .enumerate()
                .map(|(j, seg)| {
                    provider
                        .estimate_duration(&seg.text, &script.voice)
                        .map_err(|e| e.at_segment(j).at_scene(i))
                })
                .collect::<StoryreelResult<Vec<f64>>>()
        })
        .collect()
}

/// Per-scene duration lists, ready for the scheduler.
pub fn durations(results: &[Vec<NarrationResult>]) -> Vec<Vec<f64>> {
    results
        .iter()
        .map(|scene| scene.iter().map(|r| r.duration_secs).collect())
        .collect()
}

fn regroup(script: &Script, flat: Vec<NarrationResult>) -> Vec<Vec<NarrationResult>> {
    let mut grouped: Vec<Vec<NarrationResult>> = script
        .scenes
        .iter()
        .map(|s| Vec::with_capacity(s.narration.len()))
        .collect();
    for r in flat {
        grouped[r.scene_index].push(r);
    }
    grouped
}

#[cfg(test)]
#[path = "../../tests/unit/narration/generate.rs"]
mod tests;
