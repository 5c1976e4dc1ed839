use crate::{
    foundation::core::{FrameSize, secs_arg},
    foundation::error::{StoryreelError, StoryreelResult},
    render::graph::{FilterGraph, StreamLabel},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Unparsed effect reference carried by visual layers and presets.
pub struct EffectSpec {
    /// Effect kind, for example `"zoom_in"`.
    pub kind: String,
    /// Kind-specific parameters.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
}

impl EffectSpec {
    /// Effect with default parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: serde_json::Value::Null,
        }
    }

    /// Effect with an explicit parameter object.
    pub fn with_params(kind: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Direction of a pan across a zoomed frame.
pub enum PanDir {
    /// Pan from the left edge to the right edge.
    LeftToRight,
    /// Pan from the right edge to the left edge.
    RightToLeft,
}

#[derive(Clone, Debug, PartialEq)]
/// Parsed visual effect.
pub enum Effect {
    /// Slow push-in (Ken Burns) up to `1 + amount` zoom.
    ZoomIn {
        /// Extra zoom reached at the end of the layer.
        amount: f64,
    },
    /// Slow pull-out from `1 + amount` zoom.
    ZoomOut {
        /// Extra zoom at the start of the layer.
        amount: f64,
    },
    /// Horizontal pan across a frame zoomed by `zoom`.
    Pan {
        /// Pan direction.
        dir: PanDir,
        /// Fixed zoom factor (> 1) that leaves room to pan.
        zoom: f64,
    },
    /// Fade from black at the layer start.
    FadeIn {
        /// Fade length in seconds.
        secs: f64,
    },
    /// Fade to black at the layer end.
    FadeOut {
        /// Fade length in seconds.
        secs: f64,
    },
    /// Gaussian blur.
    Blur {
        /// Blur sigma in pixels.
        sigma: f64,
    },
    /// Drop saturation to zero.
    Grayscale,
    /// Darken the frame edges.
    Vignette {
        /// Lens angle in radians.
        angle: f64,
    },
}

/// Parse an effect spec.
///
/// Unknown kinds yield `Ok(None)` so callers can skip them; malformed parameters of a known kind
/// are validation errors.
pub fn parse_effect(spec: &EffectSpec) -> StoryreelResult<Option<Effect>> {
    let kind = spec.kind.trim().to_ascii_lowercase();
    if kind.is_empty() {
        return Err(StoryreelError::validation("effect kind must be non-empty"));
    }
    let p = &spec.params;

    let effect = match kind.as_str() {
        "zoom_in" | "zoomin" | "ken_burns" => Effect::ZoomIn {
            amount: positive(p, "amount", 0.15, &kind)?,
        },
        "zoom_out" | "zoomout" => Effect::ZoomOut {
            amount: positive(p, "amount", 0.15, &kind)?,
        },
        "pan" => {
            let dir = match p.get("dir").and_then(|v| v.as_str()) {
                None => PanDir::LeftToRight,
                Some(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "left_to_right" | "ltr" | "right" => PanDir::LeftToRight,
                    "right_to_left" | "rtl" | "left" => PanDir::RightToLeft,
                    other => {
                        return Err(StoryreelError::validation(format!(
                            "unknown pan.dir '{other}'"
                        )));
                    }
                },
            };
            let zoom = positive(p, "zoom", 1.2, &kind)?;
            if zoom <= 1.0 {
                return Err(StoryreelError::validation("pan.zoom must be > 1"));
            }
            Effect::Pan { dir, zoom }
        }
        "fade_in" | "fadein" => Effect::FadeIn {
            secs: positive(p, "secs", 0.5, &kind)?,
        },
        "fade_out" | "fadeout" => Effect::FadeOut {
            secs: positive(p, "secs", 0.5, &kind)?,
        },
        "blur" => Effect::Blur {
            sigma: positive(p, "sigma", 4.0, &kind)?,
        },
        "grayscale" | "greyscale" => Effect::Grayscale,
        "vignette" => Effect::Vignette {
            angle: positive(p, "angle", std::f64::consts::PI / 5.0, &kind)?,
        },
        _ => return Ok(None),
    };
    Ok(Some(effect))
}

/// Parse a list of effects, skipping unknown kinds with a warning.
pub fn parse_effects(specs: &[EffectSpec]) -> StoryreelResult<Vec<Effect>> {
    let mut out = Vec::with_capacity(specs.len());
    for spec in specs {
        match parse_effect(spec)? {
            Some(e) => out.push(e),
            None => tracing::warn!(kind = %spec.kind, "skipping unknown effect"),
        }
    }
    Ok(out)
}

fn positive(p: &serde_json::Value, key: &str, default: f64, kind: &str) -> StoryreelResult<f64> {
    match p.get(key) {
        None => Ok(default),
        Some(v) => {
            let f = v.as_f64().ok_or_else(|| {
                StoryreelError::validation(format!("{kind}.{key} must be a number"))
            })?;
            if !f.is_finite() || f <= 0.0 {
                return Err(StoryreelError::validation(format!(
                    "{kind}.{key} must be finite and > 0"
                )));
            }
            Ok(f)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Geometry and timing of the clip an effect list is applied to.
pub struct ClipContext {
    /// Output frame size.
    pub frame: FrameSize,
    /// Visible length of the clip in seconds.
    pub duration: f64,
    /// Output frame rate.
    pub fps: u32,
}

impl ClipContext {
    fn frames(&self) -> u64 {
        ((self.duration * f64::from(self.fps)).round() as u64).max(1)
    }
}

/// Applies an effect list to one visual stream.
pub trait EffectEngine: Send + Sync {
    /// Append filters for `effects` to `graph` and return the resulting stream.
    ///
    /// Unknown effect kinds are skipped with a warning.
    fn apply_effects(
        &self,
        graph: &mut FilterGraph,
        input: StreamLabel,
        effects: &[EffectSpec],
        clip: &ClipContext,
    ) -> StoryreelResult<StreamLabel>;
}

#[derive(Clone, Copy, Debug, Default)]
/// Effect engine that lowers effects to ffmpeg video filters.
pub struct FfmpegEffectEngine;

impl FfmpegEffectEngine {
    /// Filter expression for one effect.
    pub fn filter_for(effect: &Effect, clip: &ClipContext) -> String {
        let frames = clip.frames();
        let size = format!("{}x{}", clip.frame.width, clip.frame.height);
        let centered = "x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)'";
        match *effect {
            Effect::ZoomIn { amount } => format!(
                "zoompan=z='min(1+{amount}*on/{frames},{max})':{centered}:d=1:s={size}:fps={fps}",
                max = 1.0 + amount,
                fps = clip.fps,
            ),
            Effect::ZoomOut { amount } => format!(
                "zoompan=z='max({max}-{amount}*on/{frames},1)':{centered}:d=1:s={size}:fps={fps}",
                max = 1.0 + amount,
                fps = clip.fps,
            ),
            Effect::Pan { dir, zoom } => {
                let x = match dir {
                    PanDir::LeftToRight => format!("(iw-iw/zoom)*on/{frames}"),
                    PanDir::RightToLeft => format!("(iw-iw/zoom)*(1-on/{frames})"),
                };
                format!(
                    "zoompan=z={zoom}:x='{x}':y='ih/2-(ih/zoom/2)':d=1:s={size}:fps={fps}",
                    fps = clip.fps,
                )
            }
            Effect::FadeIn { secs } => {
                format!("fade=t=in:st=0:d={}", secs_arg(secs.min(clip.duration)))
            }
            Effect::FadeOut { secs } => {
                let secs = secs.min(clip.duration);
                format!(
                    "fade=t=out:st={}:d={}",
                    secs_arg(clip.duration - secs),
                    secs_arg(secs)
                )
            }
            Effect::Blur { sigma } => format!("gblur=sigma={sigma}"),
            Effect::Grayscale => "hue=s=0".to_string(),
            Effect::Vignette { angle } => format!("vignette=angle={angle}"),
        }
    }
}

impl EffectEngine for FfmpegEffectEngine {
    fn apply_effects(
        &self,
        graph: &mut FilterGraph,
        input: StreamLabel,
        effects: &[EffectSpec],
        clip: &ClipContext,
    ) -> StoryreelResult<StreamLabel> {
        let parsed = parse_effects(effects)?;
        if parsed.is_empty() {
            return Ok(input);
        }
        let filters = parsed
            .iter()
            .map(|e| Self::filter_for(e, clip))
            .collect::<Vec<_>>()
            .join(",");
        Ok(graph.chain(&input, &filters, "fx"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/fx.rs"]
mod tests;
