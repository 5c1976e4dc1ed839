use crate::{
    foundation::core::TimeRange,
    foundation::error::{StoryreelError, StoryreelResult},
    script::model::Script,
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Absolute window of one narration segment.
pub struct SegmentTiming {
    /// Index of the segment within its scene.
    pub segment_index: usize,
    /// Start in timeline seconds.
    pub start: f64,
    /// End in timeline seconds.
    pub end: f64,
}

impl SegmentTiming {
    /// Window as a [`TimeRange`].
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Absolute window of one scene and its segments.
pub struct SceneTiming {
    /// Index of the scene within the script.
    pub scene_index: usize,
    /// Start in timeline seconds.
    pub start: f64,
    /// End in timeline seconds.
    pub end: f64,
    /// Segment windows in narration order; empty for narration-less scenes.
    pub segments: Vec<SegmentTiming>,
}

impl SceneTiming {
    /// Window as a [`TimeRange`].
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }

    /// Scene length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Convert narration durations into absolute, non-overlapping scene and segment windows.
///
/// `durations[i][j]` is the audio length of segment `j` of scene `i`. A cursor starts at zero and
/// advances by each segment's duration, then by the resolved segment gap except after a scene's
/// last segment. After each scene except the last, it advances by the resolved scene gap. No
/// trailing gap is ever applied.
///
/// The function is pure: the same script and durations always produce identical timings. A
/// mismatch between supplied durations and segment counts is a caller bug and yields
/// [`StoryreelError::Schedule`].
pub fn schedule(script: &Script, durations: &[Vec<f64>]) -> StoryreelResult<Vec<SceneTiming>> {
    if durations.len() != script.scenes.len() {
        return Err(StoryreelError::schedule(
            durations.len().min(script.scenes.len()),
            format!(
                "expected durations for {} scene(s), got {}",
                script.scenes.len(),
                durations.len()
            ),
        ));
    }

    let timing = &script.timing;
    let last_scene = script.scenes.len().saturating_sub(1);
    let mut cursor = 0.0_f64;
    let mut out = Vec::with_capacity(script.scenes.len());

    for (i, (scene, seg_durations)) in script.scenes.iter().zip(durations).enumerate() {
        if seg_durations.len() != scene.narration.len() {
            return Err(StoryreelError::schedule(
                i,
                format!(
                    "expected {} narration duration(s), got {}",
                    scene.narration.len(),
                    seg_durations.len()
                ),
            ));
        }

        let start = cursor;
        let mut segments = Vec::with_capacity(seg_durations.len());

        if scene.narration.is_empty() {
            let d = scene.duration.ok_or_else(|| {
                StoryreelError::schedule(i, "scene without narration has no duration")
            })?;
            cursor += d;
        } else {
            let last_seg = scene.narration.len() - 1;
            for (j, (seg, &d)) in scene.narration.iter().zip(seg_durations).enumerate() {
                if !d.is_finite() || d < 0.0 {
                    return Err(StoryreelError::schedule(
                        i,
                        format!("segment {j} duration must be finite and >= 0, got {d}"),
                    ));
                }
                let seg_start = cursor;
                cursor += d;
                segments.push(SegmentTiming {
                    segment_index: j,
                    start: seg_start,
                    end: cursor,
                });
                if j < last_seg {
                    cursor += timing.segment_gap(seg.pause_after);
                }
            }
        }

        out.push(SceneTiming {
            scene_index: i,
            start,
            end: cursor,
            segments,
        });

        if i < last_scene {
            cursor += timing.scene_gap(scene.pause_after);
        }
    }

    Ok(out)
}

/// Total timeline length: the end of the last scene, or zero.
pub fn total_duration(timings: &[SceneTiming]) -> f64 {
    timings.last().map(|t| t.end).unwrap_or(0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/timing/scheduler.rs"]
mod tests;
