use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    effects::transitions::TransitionSpec,
    foundation::error::{StoryreelError, StoryreelResult},
    project::model::OutputSpec,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Authoring-time document: an ordered list of narrated scenes.
///
/// A script is immutable input to compilation. Parsing through [`Script::from_reader`] or
/// building through [`crate::ScriptBuilder`] validates it, so downstream stages can assume
/// the scene invariants hold.
pub struct Script {
    /// Video title, also used to derive default output names.
    pub title: String,
    /// Scenes in playback order.
    pub scenes: Vec<Scene>,
    /// Narration voice configuration.
    #[serde(default)]
    pub voice: VoiceConfig,
    /// Gap and padding rules for the scheduler and assembler.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Optional background music spanning the whole timeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgm: Option<BgmConfig>,
    /// Default preset name; scenes may override it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Output targets. Empty means one output derived from the default preset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputSpec>,
    /// Decorative stamp layers composited above the base video, in authoring order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlays: Vec<OverlaySpec>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One visual segment of the video.
///
/// A scene either carries narration (its duration is derived) or an explicit positive
/// `duration`, never both.
pub struct Scene {
    /// Narration segments, possibly empty.
    #[serde(default)]
    pub narration: Vec<NarrationSegment>,
    /// What to show during the scene.
    pub visual: VisualSpec,
    /// Explicit duration in seconds, required iff `narration` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Gap after this scene in seconds; see [`TimingConfig::scene_gap`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_after: Option<f64>,
    /// Preset override for this scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Transition override into this scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionSpec>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One unit of spoken text: one audio asset and one subtitle item.
pub struct NarrationSegment {
    /// Spoken text.
    pub text: String,
    /// Gap after this segment in seconds; see [`TimingConfig::segment_gap`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_after: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Media type of a resolved visual.
pub enum VisualKind {
    /// Still image, held for the scene duration.
    Image,
    /// Video clip, trimmed or held to the scene duration.
    Video,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Visual intent of a scene: a direct file path or a generation prompt.
pub struct VisualSpec {
    /// Direct media path, relative to the script's asset root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Generation directive used when no path is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Force the media type instead of inferring it from the file extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<VisualKind>,
    /// Mix the clip's own audio track into the output (video visuals only).
    #[serde(default)]
    pub keep_audio: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Narration voice configuration handed to the narration provider.
pub struct VoiceConfig {
    /// Registry key of the narration provider.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider-specific voice name.
    #[serde(default = "default_voice")]
    pub voice: String,
    /// BCP-47 language tag.
    #[serde(default = "default_language")]
    pub language: String,
    /// Speaking-rate multiplier.
    #[serde(default = "default_rate")]
    pub rate: f64,
    /// Baseline speaking speed used for duration estimates.
    #[serde(default = "default_wpm")]
    pub words_per_minute: f64,
    /// Narration volume multiplier in the mix.
    #[serde(default = "default_volume")]
    pub volume: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            voice: default_voice(),
            language: default_language(),
            rate: default_rate(),
            words_per_minute: default_wpm(),
            volume: default_volume(),
        }
    }
}

fn default_provider() -> String {
    "stub".to_string()
}

fn default_voice() -> String {
    "narrator".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_rate() -> f64 {
    1.0
}

fn default_wpm() -> f64 {
    150.0
}

fn default_volume() -> f64 {
    1.0
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Gap and padding rules applied while scheduling.
pub struct TimingConfig {
    /// Gap inserted between consecutive segments of one scene.
    #[serde(default = "default_segment_gap")]
    pub default_segment_gap: f64,
    /// Gap inserted between consecutive scenes.
    #[serde(default = "default_scene_gap")]
    pub default_scene_gap: f64,
    /// Inward shrink applied to both ends of every subtitle window.
    #[serde(default = "default_subtitle_padding")]
    pub subtitle_padding: f64,
    /// Treat an explicit `pause_after: 0` as "no gap" instead of "use the default".
    #[serde(default)]
    pub explicit_zero_gap: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            default_segment_gap: default_segment_gap(),
            default_scene_gap: default_scene_gap(),
            subtitle_padding: default_subtitle_padding(),
            explicit_zero_gap: false,
        }
    }
}

fn default_segment_gap() -> f64 {
    0.3
}

fn default_scene_gap() -> f64 {
    0.5
}

fn default_subtitle_padding() -> f64 {
    0.1
}

impl TimingConfig {
    /// Gap after a segment whose override is `explicit`.
    pub fn segment_gap(&self, explicit: Option<f64>) -> f64 {
        self.resolve_gap(explicit, self.default_segment_gap)
    }

    /// Gap after a scene whose override is `explicit`.
    pub fn scene_gap(&self, explicit: Option<f64>) -> f64 {
        self.resolve_gap(explicit, self.default_scene_gap)
    }

    // By default a zero override is indistinguishable from "unset".
    fn resolve_gap(&self, explicit: Option<f64>, default: f64) -> f64 {
        match explicit {
            Some(g) if g > 0.0 => g,
            Some(_) if self.explicit_zero_gap => 0.0,
            _ => default,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Background music configuration.
pub struct BgmConfig {
    /// Audio file path, relative to the script's asset root.
    pub path: String,
    /// Volume multiplier.
    #[serde(default = "default_bgm_volume")]
    pub volume: f64,
    /// Fade-in duration in seconds.
    #[serde(default)]
    pub fade_in_secs: f64,
    /// Fade-out duration in seconds.
    #[serde(default)]
    pub fade_out_secs: f64,
    /// Loop the track when it is shorter than the timeline.
    #[serde(default = "default_true")]
    pub looped: bool,
}

fn default_bgm_volume() -> f64 {
    0.2
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Anchor corner for overlay layers.
pub enum OverlayPosition {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    #[default]
    BottomRight,
    /// Frame center.
    Center,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Decorative or stamp image placed above the base video.
pub struct OverlaySpec {
    /// Image path, relative to the script's asset root.
    pub path: String,
    /// Anchor corner.
    #[serde(default)]
    pub position: OverlayPosition,
    /// Distance from the anchored edges in pixels.
    #[serde(default = "default_margin")]
    pub margin_px: u32,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_overlay_opacity")]
    pub opacity: f64,
    /// Overlay width as a fraction of the output width.
    #[serde(default = "default_overlay_scale")]
    pub scale: f64,
    /// Window start in seconds; defaults to the timeline start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    /// Window end in seconds; defaults to the timeline end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

fn default_margin() -> u32 {
    24
}

fn default_overlay_opacity() -> f64 {
    1.0
}

fn default_overlay_scale() -> f64 {
    0.15
}

impl Script {
    /// Parse and validate a script from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> StoryreelResult<Self> {
        let script: Script = serde_json::from_reader(r)
            .map_err(|e| StoryreelError::serde(format!("parse script JSON: {e}")))?;
        script.validate()?;
        Ok(script)
    }

    /// Parse and validate a script from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> StoryreelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            StoryreelError::validation(format!("open script JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Total number of narration segments across all scenes.
    pub fn segment_count(&self) -> usize {
        self.scenes.iter().map(|s| s.narration.len()).sum()
    }

    /// Validate scene invariants and configuration ranges.
    pub fn validate(&self) -> StoryreelResult<()> {
        if self.scenes.is_empty() {
            return Err(StoryreelError::validation("script must contain at least one scene"));
        }

        let t = &self.timing;
        for (name, v) in [
            ("default_segment_gap", t.default_segment_gap),
            ("default_scene_gap", t.default_scene_gap),
            ("subtitle_padding", t.subtitle_padding),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(StoryreelError::validation(format!(
                    "timing.{name} must be finite and >= 0"
                )));
            }
        }

        let voice = &self.voice;
        if voice.provider.trim().is_empty() {
            return Err(StoryreelError::validation("voice.provider must be non-empty"));
        }
        for (name, v) in [
            ("rate", voice.rate),
            ("words_per_minute", voice.words_per_minute),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(StoryreelError::validation(format!(
                    "voice.{name} must be finite and > 0"
                )));
            }
        }
        if !voice.volume.is_finite() || voice.volume < 0.0 {
            return Err(StoryreelError::validation(
                "voice.volume must be finite and >= 0",
            ));
        }

        for (i, scene) in self.scenes.iter().enumerate() {
            scene.validate(i)?;
        }

        if let Some(bgm) = &self.bgm {
            if bgm.path.trim().is_empty() {
                return Err(StoryreelError::validation("bgm.path must be non-empty"));
            }
            for (name, v) in [
                ("volume", bgm.volume),
                ("fade_in_secs", bgm.fade_in_secs),
                ("fade_out_secs", bgm.fade_out_secs),
            ] {
                if !v.is_finite() || v < 0.0 {
                    return Err(StoryreelError::validation(format!(
                        "bgm.{name} must be finite and >= 0"
                    )));
                }
            }
        }

        for spec in &self.outputs {
            spec.validate()?;
        }

        for (i, ov) in self.overlays.iter().enumerate() {
            if ov.path.trim().is_empty() {
                return Err(StoryreelError::validation(format!(
                    "overlays[{i}].path must be non-empty"
                )));
            }
            if !ov.opacity.is_finite() || !(0.0..=1.0).contains(&ov.opacity) {
                return Err(StoryreelError::validation(format!(
                    "overlays[{i}].opacity must be within [0, 1]"
                )));
            }
            if !ov.scale.is_finite() || ov.scale <= 0.0 || ov.scale > 1.0 {
                return Err(StoryreelError::validation(format!(
                    "overlays[{i}].scale must be within (0, 1]"
                )));
            }
            if let (Some(s), Some(e)) = (ov.start, ov.end)
                && s > e
            {
                return Err(StoryreelError::validation(format!(
                    "overlays[{i}] start must be <= end"
                )));
            }
        }

        Ok(())
    }
}

impl Scene {
    fn validate(&self, idx: usize) -> StoryreelResult<()> {
        if self.narration.is_empty() {
            match self.duration {
                Some(d) if d.is_finite() && d > 0.0 => {}
                Some(_) => {
                    return Err(StoryreelError::validation(format!(
                        "scene {idx}: duration must be finite and > 0"
                    )));
                }
                None => {
                    return Err(StoryreelError::validation(format!(
                        "scene {idx}: a scene without narration requires an explicit duration"
                    )));
                }
            }
        } else if self.duration.is_some() {
            return Err(StoryreelError::validation(format!(
                "scene {idx}: a narrated scene must not set duration (it is derived)"
            )));
        }

        check_gap(self.pause_after)
            .map_err(|m| StoryreelError::validation(format!("scene {idx}: pause_after {m}")))?;

        for (j, seg) in self.narration.iter().enumerate() {
            if seg.text.trim().is_empty() {
                return Err(StoryreelError::validation(format!(
                    "scene {idx}, segment {j}: narration text must be non-empty"
                )));
            }
            check_gap(seg.pause_after).map_err(|m| {
                StoryreelError::validation(format!("scene {idx}, segment {j}: pause_after {m}"))
            })?;
        }

        if let Some(t) = &self.transition
            && (!t.duration_secs.is_finite() || t.duration_secs < 0.0)
        {
            return Err(StoryreelError::validation(format!(
                "scene {idx}: transition duration must be finite and >= 0"
            )));
        }
        Ok(())
    }
}

fn check_gap(gap: Option<f64>) -> Result<(), &'static str> {
    match gap {
        Some(g) if !g.is_finite() || g < 0.0 => Err("must be finite and >= 0"),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/model.rs"]
mod tests;
