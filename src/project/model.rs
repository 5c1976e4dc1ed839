use std::path::{Path, PathBuf};

use crate::{
    effects::fx::EffectSpec,
    effects::transitions::TransitionSpec,
    foundation::core::{AspectRatio, FrameSize},
    foundation::error::{StoryreelError, StoryreelResult},
    preset::catalog::{OutputDefaults, SubtitleStyle},
    script::model::{OverlayPosition, VisualKind},
};

// Tolerance for float comparisons between layer boundaries.
const TIME_EPS: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// How an output carries subtitles.
pub enum SubtitleMode {
    /// Render captions into the video frames.
    #[default]
    Burn,
    /// Write an `.srt` file next to the output.
    Sidecar,
    /// Drop captions.
    None,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Requested output target. Unset fields fall back to the preset's [`OutputDefaults`].
pub struct OutputSpec {
    /// Output file.
    pub path: PathBuf,
    /// Aspect ratio such as `"16:9"` or `"9:16"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Explicit width; requires `height`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Explicit height; requires `width`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Frames per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    /// ffmpeg video encoder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    /// ffmpeg audio encoder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    /// Video bitrate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_bitrate: Option<String>,
    /// Audio bitrate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_bitrate: Option<String>,
    /// Container; defaults to the path extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    /// Subtitle handling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_mode: Option<SubtitleMode>,
}

impl OutputSpec {
    /// Spec for `path` with every other field defaulted.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Spec for `path` at aspect ratio `aspect`.
    pub fn with_aspect(path: impl Into<PathBuf>, aspect: impl Into<String>) -> Self {
        Self {
            aspect_ratio: Some(aspect.into()),
            ..Self::new(path)
        }
    }

    /// Check field ranges without resolving defaults.
    pub fn validate(&self) -> StoryreelResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(StoryreelError::validation("output path must be non-empty"));
        }
        if let Some(a) = &self.aspect_ratio {
            AspectRatio::parse(a)?;
        }
        match (self.width, self.height) {
            (Some(w), Some(h)) => {
                FrameSize::new(w, h)?;
            }
            (None, None) => {}
            _ => {
                return Err(StoryreelError::validation(format!(
                    "output '{}': width and height must be set together",
                    self.path.display()
                )));
            }
        }
        if self.fps == Some(0) {
            return Err(StoryreelError::validation("output fps must be > 0"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Fully resolved output parameters for one render.
pub struct OutputConfig {
    /// Output file.
    pub path: PathBuf,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Frames per second.
    pub fps: u32,
    /// Requested aspect ratio, when the size was derived from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// ffmpeg video encoder.
    pub video_codec: String,
    /// ffmpeg audio encoder.
    pub audio_codec: String,
    /// Video bitrate.
    pub video_bitrate: String,
    /// Audio bitrate.
    pub audio_bitrate: String,
    /// Container format.
    pub container: String,
    /// Subtitle handling.
    pub subtitle_mode: SubtitleMode,
}

impl OutputConfig {
    /// Resolve `spec` against preset `defaults`.
    ///
    /// Explicit width/height win; otherwise an aspect ratio reshapes the preset size around its
    /// short edge; otherwise the preset size is used as is.
    pub fn derive(spec: &OutputSpec, defaults: &OutputDefaults) -> StoryreelResult<Self> {
        spec.validate()?;
        let base = FrameSize::new(defaults.width, defaults.height)?;
        let size = match (spec.width, spec.height, spec.aspect_ratio.as_deref()) {
            (Some(w), Some(h), _) => FrameSize::new(w, h)?,
            (_, _, Some(a)) => base.with_aspect(AspectRatio::parse(a)?),
            _ => base,
        };
        let container = spec
            .container
            .clone()
            .or_else(|| {
                spec.path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_ascii_lowercase)
            })
            .unwrap_or_else(|| defaults.container.clone());

        Ok(Self {
            path: spec.path.clone(),
            width: size.width,
            height: size.height,
            fps: spec.fps.unwrap_or(defaults.fps),
            aspect_ratio: spec.aspect_ratio.clone(),
            video_codec: spec
                .video_codec
                .clone()
                .unwrap_or_else(|| defaults.video_codec.clone()),
            audio_codec: spec
                .audio_codec
                .clone()
                .unwrap_or_else(|| defaults.audio_codec.clone()),
            video_bitrate: spec
                .video_bitrate
                .clone()
                .unwrap_or_else(|| defaults.video_bitrate.clone()),
            audio_bitrate: spec
                .audio_bitrate
                .clone()
                .unwrap_or_else(|| defaults.audio_bitrate.clone()),
            container,
            subtitle_mode: spec.subtitle_mode.unwrap_or(defaults.subtitle_mode),
        })
    }

    /// Frame size.
    pub fn frame_size(&self) -> FrameSize {
        FrameSize {
            width: self.width,
            height: self.height,
        }
    }

    /// `.srt` path used for sidecar subtitles: the full output file name plus `.srt`.
    ///
    /// Outputs that differ only by extension (`reel.mp4`, `reel.mkv`) get distinct sidecars.
    pub fn sidecar_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "output".into());
        name.push(".srt");
        self.path.with_file_name(name)
    }

    /// Hidden sibling path the encoder writes to before the final rename.
    pub fn partial_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let parent = self.path.parent().unwrap_or_else(|| Path::new(""));
        parent.join(format!(".{name}.partial"))
    }

    /// Validate ranges.
    pub fn validate(&self) -> StoryreelResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(StoryreelError::validation("output path must be non-empty"));
        }
        FrameSize::new(self.width, self.height)?;
        if self.fps == 0 {
            return Err(StoryreelError::validation("output fps must be > 0"));
        }
        for (name, v) in [
            ("video_codec", &self.video_codec),
            ("audio_codec", &self.audio_codec),
            ("container", &self.container),
        ] {
            if v.trim().is_empty() {
                return Err(StoryreelError::validation(format!(
                    "output {name} must be non-empty"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One scene's visual on the base video track.
pub struct VisualLayer {
    /// Source scene.
    pub scene_index: usize,
    /// Media file.
    pub source: PathBuf,
    /// Media type.
    pub kind: VisualKind,
    /// Start in timeline seconds.
    pub start: f64,
    /// End in timeline seconds.
    pub end: f64,
    /// Effects applied to this layer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectSpec>,
    /// Transition from the previous layer; `None` for the first layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionSpec>,
    /// Mix the clip's own audio.
    #[serde(default)]
    pub keep_audio: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Purpose of an audio layer.
pub enum AudioRole {
    /// One narration segment.
    Narration,
    /// Background music.
    Music,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Positioned audio contribution.
pub struct AudioLayer {
    /// Purpose of the layer.
    pub role: AudioRole,
    /// Audio file.
    pub source: PathBuf,
    /// Start in timeline seconds.
    pub start: f64,
    /// End in timeline seconds.
    pub end: f64,
    /// Volume multiplier.
    pub volume: f64,
    /// Fade-in length in seconds.
    #[serde(default)]
    pub fade_in: f64,
    /// Fade-out length in seconds.
    #[serde(default)]
    pub fade_out: f64,
    /// Loop the source to fill the window.
    #[serde(default)]
    pub looped: bool,
    /// Source scene for narration layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_index: Option<usize>,
    /// Source segment for narration layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_index: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One caption with its display window.
pub struct SubtitleItem {
    /// Source scene.
    pub scene_index: usize,
    /// Source segment.
    pub segment_index: usize,
    /// Caption text.
    pub text: String,
    /// Display start in seconds.
    pub start: f64,
    /// Display end in seconds.
    pub end: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Caption track.
pub struct SubtitleLayer {
    /// Captions in timeline order.
    pub items: Vec<SubtitleItem>,
    /// Appearance when burned in.
    #[serde(default)]
    pub style: SubtitleStyle,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Decorative or stamp image above the base video.
pub struct OverlayLayer {
    /// Image file.
    pub source: PathBuf,
    /// Anchor corner.
    pub position: OverlayPosition,
    /// Margin from the anchored edges in pixels.
    pub margin_px: u32,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Width as a fraction of the output width.
    pub scale: f64,
    /// Start in timeline seconds.
    pub start: f64,
    /// End in timeline seconds.
    pub end: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Fully scheduled layers of a project.
///
/// Visual layers are in playback order; overlay layers are in composition order.
pub struct Timeline {
    /// Total length in seconds.
    pub duration: f64,
    /// Base video track.
    pub visual_layers: Vec<VisualLayer>,
    /// Narration and music.
    pub audio_layers: Vec<AudioLayer>,
    /// Caption tracks.
    pub subtitle_layers: Vec<SubtitleLayer>,
    /// Overlays, bottom first.
    #[serde(default)]
    pub overlay_layers: Vec<OverlayLayer>,
}

impl Timeline {
    /// Validate window bounds and same-track ordering.
    pub fn validate(&self) -> StoryreelResult<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(StoryreelError::validation(
                "timeline duration must be finite and >= 0",
            ));
        }
        let check = |what: &str, i: usize, start: f64, end: f64| -> StoryreelResult<()> {
            if !start.is_finite() || !end.is_finite() || start < 0.0 || end < start {
                return Err(StoryreelError::validation(format!(
                    "{what}[{i}] has invalid window [{start}, {end}]"
                )));
            }
            if end > self.duration + TIME_EPS {
                return Err(StoryreelError::validation(format!(
                    "{what}[{i}] ends after the timeline ({end} > {})",
                    self.duration
                )));
            }
            Ok(())
        };

        let mut prev_end = 0.0_f64;
        for (i, l) in self.visual_layers.iter().enumerate() {
            check("visual_layers", i, l.start, l.end)?;
            if l.start + TIME_EPS < prev_end {
                return Err(StoryreelError::validation(format!(
                    "visual_layers[{i}] overlaps the previous layer"
                )));
            }
            prev_end = l.end;
        }
        for (i, l) in self.audio_layers.iter().enumerate() {
            check("audio_layers", i, l.start, l.end)?;
            if !l.volume.is_finite() || l.volume < 0.0 {
                return Err(StoryreelError::validation(format!(
                    "audio_layers[{i}].volume must be finite and >= 0"
                )));
            }
        }
        for (k, layer) in self.subtitle_layers.iter().enumerate() {
            let mut prev_end = 0.0_f64;
            for (i, item) in layer.items.iter().enumerate() {
                check(&format!("subtitle_layers[{k}].items"), i, item.start, item.end)?;
                if item.start + TIME_EPS < prev_end {
                    return Err(StoryreelError::validation(format!(
                        "subtitle_layers[{k}].items[{i}] overlaps the previous item"
                    )));
                }
                prev_end = item.end;
            }
        }
        for (i, o) in self.overlay_layers.iter().enumerate() {
            check("overlay_layers", i, o.start, o.end)?;
        }
        Ok(())
    }
}

/// Current project document version.
pub const PROJECT_VERSION: &str = "1";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Render-ready document: output configuration plus a fully timed [`Timeline`].
///
/// A project is derived once per compile and never edited in place; renders for other output
/// targets work on deep copies produced by [`Project::with_output`].
pub struct Project {
    /// Document version.
    pub version: String,
    /// Video title.
    pub title: String,
    /// Primary output, rendered by single-output renders.
    pub output: OutputConfig,
    /// Every output target, primary first.
    pub outputs: Vec<OutputConfig>,
    /// Timed layers shared by all outputs.
    pub timeline: Timeline,
}

impl Project {
    /// Deep copy targeting only `output`.
    pub fn with_output(&self, output: OutputConfig) -> Self {
        Self {
            version: self.version.clone(),
            title: self.title.clone(),
            outputs: vec![output.clone()],
            output,
            timeline: self.timeline.clone(),
        }
    }

    /// Validate the version, outputs and timeline.
    pub fn validate(&self) -> StoryreelResult<()> {
        let major = self.version.split('.').next().unwrap_or_default();
        if major != PROJECT_VERSION {
            return Err(StoryreelError::validation(format!(
                "unsupported project version '{}' (expected {PROJECT_VERSION})",
                self.version
            )));
        }
        self.output.validate()?;
        for o in &self.outputs {
            o.validate()?;
        }
        self.timeline.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/model.rs"]
mod tests;
