use std::collections::BTreeMap;
use std::path::Path;

use crate::{
    effects::fx::EffectSpec,
    effects::transitions::TransitionSpec,
    foundation::error::{StoryreelError, StoryreelResult},
    project::model::SubtitleMode,
};

/// Name of the preset used when neither the scene nor the script names one.
pub const DEFAULT_PRESET: &str = "documentary";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Caption appearance, applied when subtitles are burned in.
pub struct SubtitleStyle {
    /// Font family.
    #[serde(default = "default_font")]
    pub font_name: String,
    /// Font size in points at the libass reference height.
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Text colour as `#RRGGBB`.
    #[serde(default = "default_primary")]
    pub primary_color: String,
    /// Outline colour as `#RRGGBB`.
    #[serde(default = "default_outline_color")]
    pub outline_color: String,
    /// Outline width.
    #[serde(default = "default_outline")]
    pub outline: u32,
    /// Bottom margin.
    #[serde(default = "default_margin_v")]
    pub margin_v: u32,
    /// Bold text.
    #[serde(default)]
    pub bold: bool,
}

fn default_font() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    24
}

fn default_primary() -> String {
    "#FFFFFF".to_string()
}

fn default_outline_color() -> String {
    "#000000".to_string()
}

fn default_outline() -> u32 {
    2
}

fn default_margin_v() -> u32 {
    40
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_name: default_font(),
            font_size: default_font_size(),
            primary_color: default_primary(),
            outline_color: default_outline_color(),
            outline: default_outline(),
            margin_v: default_margin_v(),
            bold: false,
        }
    }
}

impl SubtitleStyle {
    /// libass `force_style` value for the ffmpeg `subtitles` filter.
    pub fn to_force_style(&self) -> StoryreelResult<String> {
        Ok(format!(
            "FontName={},FontSize={},PrimaryColour={},OutlineColour={},Outline={},MarginV={},Bold={}",
            self.font_name,
            self.font_size,
            ass_color(&self.primary_color)?,
            ass_color(&self.outline_color)?,
            self.outline,
            self.margin_v,
            if self.bold { -1 } else { 0 },
        ))
    }
}

// ASS colours are `&HAABBGGRR` with alpha 00 meaning opaque.
fn ass_color(hex: &str) -> StoryreelResult<String> {
    let s = hex.trim().trim_start_matches('#');
    let bad = || StoryreelError::validation(format!("invalid colour '{hex}', expected #RRGGBB"));
    if s.len() != 6 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let (r, g, b) = (&s[0..2], &s[2..4], &s[4..6]);
    Ok(format!("&H00{}{}{}", b, g, r).to_ascii_uppercase())
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Output parameters a preset supplies when an output spec leaves them unset.
pub struct OutputDefaults {
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Frames per second.
    pub fps: u32,
    /// ffmpeg video encoder.
    pub video_codec: String,
    /// ffmpeg audio encoder.
    pub audio_codec: String,
    /// Video bitrate (`-b:v`).
    pub video_bitrate: String,
    /// Audio bitrate (`-b:a`).
    pub audio_bitrate: String,
    /// Container format.
    pub container: String,
    /// Subtitle handling.
    pub subtitle_mode: SubtitleMode,
}

impl Default for OutputDefaults {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            video_bitrate: "8M".to_string(),
            audio_bitrate: "192k".to_string(),
            container: "mp4".to_string(),
            subtitle_mode: SubtitleMode::Burn,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Full definition of a preset, as loaded from JSON for custom presets.
pub struct PresetDef {
    /// Registry name.
    pub name: String,
    /// Effects applied to image visuals.
    #[serde(default)]
    pub image_effects: Vec<EffectSpec>,
    /// Effects applied to video visuals.
    #[serde(default)]
    pub video_effects: Vec<EffectSpec>,
    /// Transition into each scene after the first.
    #[serde(default = "TransitionSpec::cut")]
    pub transition: TransitionSpec,
    /// Caption appearance.
    #[serde(default)]
    pub subtitle_style: SubtitleStyle,
    /// Output defaults.
    #[serde(default)]
    pub output_defaults: OutputDefaults,
}

#[derive(Clone, Debug, PartialEq)]
/// A named bundle of default effects, transition, subtitle style and output settings.
pub enum Preset {
    /// Slow push-ins and crossfades, 1080p.
    Documentary,
    /// Vignette, fades through black, 24 fps.
    Cinematic,
    /// Vertical 9:16 with fast slides and large captions.
    Social,
    /// No effects, hard cuts, sidecar captions.
    Minimal,
    /// User-defined preset.
    Custom(PresetDef),
}

impl Preset {
    /// Registry name.
    pub fn name(&self) -> &str {
        match self {
            Self::Documentary => "documentary",
            Self::Cinematic => "cinematic",
            Self::Social => "social",
            Self::Minimal => "minimal",
            Self::Custom(def) => &def.name,
        }
    }

    /// Effects applied to image visuals.
    pub fn image_effects(&self) -> Vec<EffectSpec> {
        match self {
            Self::Documentary => vec![zoom_in(0.1)],
            Self::Cinematic => vec![zoom_in(0.15), EffectSpec::new("vignette")],
            Self::Social => vec![zoom_in(0.2)],
            Self::Minimal => Vec::new(),
            Self::Custom(def) => def.image_effects.clone(),
        }
    }

    /// Effects applied to video visuals.
    pub fn video_effects(&self) -> Vec<EffectSpec> {
        match self {
            Self::Documentary | Self::Social | Self::Minimal => Vec::new(),
            Self::Cinematic => vec![EffectSpec::new("vignette")],
            Self::Custom(def) => def.video_effects.clone(),
        }
    }

    /// Transition into each scene after the first.
    pub fn transition(&self) -> TransitionSpec {
        match self {
            Self::Documentary => TransitionSpec::new("crossfade", 0.5),
            Self::Cinematic => TransitionSpec::new("fade_black", 1.0),
            Self::Social => TransitionSpec::new("slide", 0.3),
            Self::Minimal => TransitionSpec::cut(),
            Self::Custom(def) => def.transition.clone(),
        }
    }

    /// Caption appearance.
    pub fn subtitle_style(&self) -> SubtitleStyle {
        match self {
            Self::Documentary | Self::Minimal => SubtitleStyle::default(),
            Self::Cinematic => SubtitleStyle {
                font_name: "Georgia".to_string(),
                font_size: 22,
                margin_v: 60,
                ..SubtitleStyle::default()
            },
            Self::Social => SubtitleStyle {
                font_size: 36,
                outline: 3,
                margin_v: 160,
                bold: true,
                ..SubtitleStyle::default()
            },
            Self::Custom(def) => def.subtitle_style.clone(),
        }
    }

    /// Output defaults.
    pub fn output_defaults(&self) -> OutputDefaults {
        match self {
            Self::Documentary => OutputDefaults::default(),
            Self::Cinematic => OutputDefaults {
                fps: 24,
                video_bitrate: "12M".to_string(),
                ..OutputDefaults::default()
            },
            Self::Social => OutputDefaults {
                width: 1080,
                height: 1920,
                video_bitrate: "6M".to_string(),
                audio_bitrate: "128k".to_string(),
                ..OutputDefaults::default()
            },
            Self::Minimal => OutputDefaults {
                subtitle_mode: SubtitleMode::Sidecar,
                ..OutputDefaults::default()
            },
            Self::Custom(def) => def.output_defaults.clone(),
        }
    }
}

fn zoom_in(amount: f64) -> EffectSpec {
    EffectSpec::with_params("zoom_in", serde_json::json!({ "amount": amount }))
}

/// Presets available to a compile, keyed by lowercase name.
///
/// Constructed explicitly and passed to the compiler; there is no global registry.
#[derive(Clone, Debug)]
pub struct PresetRegistry {
    presets: BTreeMap<String, Preset>,
}

impl PresetRegistry {
    /// Registry without any presets.
    pub fn empty() -> Self {
        Self {
            presets: BTreeMap::new(),
        }
    }

    /// Registry with the four built-in presets.
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        for p in [
            Preset::Documentary,
            Preset::Cinematic,
            Preset::Social,
            Preset::Minimal,
        ] {
            reg.insert(p);
        }
        reg
    }

    /// Register or replace a preset.
    pub fn insert(&mut self, preset: Preset) {
        self.presets
            .insert(preset.name().trim().to_ascii_lowercase(), preset);
    }

    /// Register a custom preset definition.
    pub fn register_custom(&mut self, def: PresetDef) -> StoryreelResult<()> {
        if def.name.trim().is_empty() {
            return Err(StoryreelError::validation("preset name must be non-empty"));
        }
        self.insert(Preset::Custom(def));
        Ok(())
    }

    /// Load custom preset definitions from a JSON array or single object.
    pub fn load_custom_reader<R: std::io::Read>(&mut self, r: R) -> StoryreelResult<usize> {
        let value: serde_json::Value = serde_json::from_reader(r)
            .map_err(|e| StoryreelError::serde(format!("parse preset JSON: {e}")))?;
        let defs: Vec<PresetDef> = if value.is_array() {
            serde_json::from_value(value)
        } else {
            serde_json::from_value(value).map(|d| vec![d])
        }
        .map_err(|e| StoryreelError::serde(format!("parse preset JSON: {e}")))?;
        let n = defs.len();
        for def in defs {
            self.register_custom(def)?;
        }
        Ok(n)
    }

    /// Load custom preset definitions from a JSON file.
    pub fn load_custom_path(&mut self, path: impl AsRef<Path>) -> StoryreelResult<usize> {
        let path = path.as_ref();
        let f = std::fs::File::open(path).map_err(|e| {
            StoryreelError::validation(format!("open preset JSON '{}': {e}", path.display()))
        })?;
        self.load_custom_reader(std::io::BufReader::new(f))
    }

    /// Look up a preset by name.
    pub fn get(&self, name: &str) -> StoryreelResult<&Preset> {
        self.presets
            .get(&name.trim().to_ascii_lowercase())
            .ok_or_else(|| {
                StoryreelError::validation(format!(
                    "unknown preset '{name}' (known: {})",
                    self.names().join(", ")
                ))
            })
    }

    /// Active preset: the scene override, else the script default, else [`DEFAULT_PRESET`].
    pub fn resolve(
        &self,
        scene_override: Option<&str>,
        script_default: Option<&str>,
    ) -> StoryreelResult<&Preset> {
        self.get(scene_override.or(script_default).unwrap_or(DEFAULT_PRESET))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/preset/catalog.rs"]
mod tests;
