use std::path::PathBuf;

use crate::{
    foundation::core::secs_arg,
    foundation::error::{StoryreelError, StoryreelResult},
    project::model::AudioLayer,
    render::graph::{FilterGraph, MediaInput, StreamLabel},
};

/// Sample rate every audio contribution is resampled to before mixing.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

#[derive(Clone, Debug, PartialEq)]
/// One scheduled audio contribution in timeline sample space.
pub struct AudioSegment {
    /// Audio file.
    pub source: PathBuf,
    /// First timeline sample.
    pub timeline_start_sample: u64,
    /// One past the last timeline sample.
    pub timeline_end_sample: u64,
    /// Volume multiplier.
    pub volume: f64,
    /// Fade-in length in seconds.
    pub fade_in_sec: f64,
    /// Fade-out length in seconds.
    pub fade_out_sec: f64,
    /// Loop the source to fill the window.
    pub looped: bool,
}

impl AudioSegment {
    fn duration_sec(&self, sample_rate: u32) -> f64 {
        (self.timeline_end_sample - self.timeline_start_sample) as f64 / f64::from(sample_rate)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Audio mixing plan for a whole timeline.
pub struct AudioManifest {
    /// Mix sample rate.
    pub sample_rate: u32,
    /// Output length in samples.
    pub total_samples: u64,
    /// Contributions in layer order.
    pub segments: Vec<AudioSegment>,
}

/// Convert timeline seconds to a sample index at `sample_rate`.
pub fn secs_to_sample(secs: f64, sample_rate: u32) -> u64 {
    (secs.max(0.0) * f64::from(sample_rate)).round() as u64
}

/// Build the mix manifest for `layers` over a timeline of `duration` seconds.
///
/// Windows are clipped to the timeline; layers that end up empty are dropped.
pub fn build_audio_manifest(
    layers: &[AudioLayer],
    duration: f64,
) -> StoryreelResult<AudioManifest> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(StoryreelError::validation(
            "audio manifest duration must be finite and >= 0",
        ));
    }
    let sample_rate = MIX_SAMPLE_RATE;
    let total_samples = secs_to_sample(duration, sample_rate);

    let mut segments = Vec::with_capacity(layers.len());
    for layer in layers {
        let start = secs_to_sample(layer.start, sample_rate).min(total_samples);
        let end = secs_to_sample(layer.end, sample_rate).min(total_samples);
        if end <= start {
            continue;
        }
        let len_sec = (end - start) as f64 / f64::from(sample_rate);
        let fade_in = layer.fade_in.clamp(0.0, len_sec);
        let fade_out = layer.fade_out.clamp(0.0, len_sec - fade_in);
        segments.push(AudioSegment {
            source: layer.source.clone(),
            timeline_start_sample: start,
            timeline_end_sample: end,
            volume: layer.volume.max(0.0),
            fade_in_sec: fade_in,
            fade_out_sec: fade_out,
            looped: layer.looped,
        });
    }

    Ok(AudioManifest {
        sample_rate,
        total_samples,
        segments,
    })
}

impl AudioManifest {
    /// Total length in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.total_samples as f64 / f64::from(self.sample_rate)
    }

    /// Filter chain for one segment, starting from its raw input pad.
    pub fn segment_filter(&self, seg: &AudioSegment) -> String {
        let dur = seg.duration_sec(self.sample_rate);
        let mut f = vec![
            format!("atrim=duration={}", secs_arg(dur)),
            "asetpts=PTS-STARTPTS".to_string(),
            format!("aresample={}", self.sample_rate),
            "aformat=channel_layouts=stereo".to_string(),
            format!("volume={}", seg.volume),
        ];
        if seg.fade_in_sec > 0.0 {
            f.push(format!("afade=t=in:st=0:d={}", secs_arg(seg.fade_in_sec)));
        }
        if seg.fade_out_sec > 0.0 {
            f.push(format!(
                "afade=t=out:st={}:d={}",
                secs_arg(dur - seg.fade_out_sec),
                secs_arg(seg.fade_out_sec)
            ));
        }
        if seg.timeline_start_sample > 0 {
            f.push(format!("adelay=delays={}S:all=1", seg.timeline_start_sample));
        }
        f.join(",")
    }

    /// Append inputs and filters mixing every segment into one stream.
    ///
    /// Returns `None` when there is nothing to mix.
    pub fn lower(&self, graph: &mut FilterGraph) -> Option<StreamLabel> {
        if self.segments.is_empty() {
            return None;
        }
        let mut pads = Vec::with_capacity(self.segments.len());
        for seg in &self.segments {
            let input = if seg.looped {
                MediaInput::looped_audio(&seg.source)
            } else {
                MediaInput::file(&seg.source)
            };
            let idx = graph.add_input(input);
            pads.push(graph.chain(&FilterGraph::audio_of(idx), &self.segment_filter(seg), "a"));
        }

        let total = secs_arg(self.duration_sec());
        let out = graph.fresh("amix");
        let refs: Vec<&StreamLabel> = pads.iter().collect();
        let filter = if pads.len() == 1 {
            format!("apad,atrim=duration={total}")
        } else {
            format!(
                "amix=inputs={}:duration=longest:dropout_transition=0:normalize=0,apad,atrim=duration={total}",
                pads.len()
            )
        };
        graph.push(&refs, &filter, &out);
        Some(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
