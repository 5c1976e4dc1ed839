use crate::foundation::error::{StoryreelError, StoryreelResult};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Transition into a visual layer from the one before it.
pub struct TransitionSpec {
    /// Transition kind, for example `"crossfade"` or `"wipe"`.
    pub kind: String,
    /// Requested overlap in seconds. Clamped at render time.
    #[serde(default = "default_duration")]
    pub duration_secs: f64,
    /// Kind-specific parameters (`{"dir": "left"}` for wipes and slides).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
}

fn default_duration() -> f64 {
    0.5
}

impl TransitionSpec {
    /// Build a spec without parameters.
    pub fn new(kind: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            kind: kind.into(),
            duration_secs,
            params: serde_json::Value::Null,
        }
    }

    /// A hard cut: no overlap.
    pub fn cut() -> Self {
        Self::new("cut", 0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Direction of wipe and slide transitions.
pub enum SlideDir {
    /// Incoming content enters from the right, moving left.
    Left,
    /// Incoming content enters from the left, moving right.
    Right,
    /// Incoming content enters from the bottom, moving up.
    Up,
    /// Incoming content enters from the top, moving down.
    Down,
}

impl SlideDir {
    fn suffix(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Parsed transition kind.
pub enum TransitionKind {
    /// No overlap; layers are concatenated.
    Cut,
    /// Linear opacity blend.
    Crossfade,
    /// Fade through black.
    FadeBlack,
    /// Per-pixel random dissolve.
    Dissolve,
    /// Hard-edged wipe.
    Wipe {
        /// Wipe direction.
        dir: SlideDir,
    },
    /// Push the incoming layer over the outgoing one.
    Slide {
        /// Slide direction.
        dir: SlideDir,
    },
}

impl TransitionKind {
    /// Name of the matching ffmpeg `xfade` transition, or `None` for a cut.
    pub fn xfade_name(self) -> Option<String> {
        match self {
            Self::Cut => None,
            Self::Crossfade => Some("fade".to_string()),
            Self::FadeBlack => Some("fadeblack".to_string()),
            Self::Dissolve => Some("dissolve".to_string()),
            Self::Wipe { dir } => Some(format!("wipe{}", dir.suffix())),
            Self::Slide { dir } => Some(format!("slide{}", dir.suffix())),
        }
    }
}

/// Parse a transition kind string plus its parameter object.
pub fn parse_transition_kind_params(
    kind: &str,
    params: &serde_json::Value,
) -> StoryreelResult<TransitionKind> {
    let kind = kind.trim().to_ascii_lowercase();
    if kind.is_empty() {
        return Err(StoryreelError::validation("transition kind must be non-empty"));
    }

    match kind.as_str() {
        "cut" | "none" => Ok(TransitionKind::Cut),
        "crossfade" | "fade" => Ok(TransitionKind::Crossfade),
        "fade_black" | "fadeblack" | "fade-black" => Ok(TransitionKind::FadeBlack),
        "dissolve" => Ok(TransitionKind::Dissolve),
        "wipe" => Ok(TransitionKind::Wipe {
            dir: parse_dir(&kind, params)?,
        }),
        "slide" => Ok(TransitionKind::Slide {
            dir: parse_dir(&kind, params)?,
        }),
        _ => Err(StoryreelError::validation(format!(
            "unknown transition kind '{kind}'"
        ))),
    }
}

/// Parse a [`TransitionSpec`].
pub fn parse_transition(spec: &TransitionSpec) -> StoryreelResult<TransitionKind> {
    parse_transition_kind_params(&spec.kind, &spec.params)
}

fn parse_dir(kind: &str, params: &serde_json::Value) -> StoryreelResult<SlideDir> {
    let params = if params.is_null() {
        None
    } else {
        Some(params.as_object().ok_or_else(|| {
            StoryreelError::validation(format!("{kind} params must be an object"))
        })?)
    };

    match params.and_then(|p| p.get("dir")).and_then(|v| v.as_str()) {
        None => Ok(SlideDir::Left),
        Some(s) => match s.trim().to_ascii_lowercase().as_str() {
            "left" | "right_to_left" | "rtl" => Ok(SlideDir::Left),
            "right" | "left_to_right" | "ltr" => Ok(SlideDir::Right),
            "up" | "bottom_to_top" | "btt" => Ok(SlideDir::Up),
            "down" | "top_to_bottom" | "ttb" => Ok(SlideDir::Down),
            other => Err(StoryreelError::validation(format!(
                "unknown {kind}.dir '{other}'"
            ))),
        },
    }
}

/// Overlap actually applied between two neighbouring layers.
///
/// Never more than half of either neighbour's visible length, so a transition cannot swallow a
/// whole layer.
pub fn clamp_overlap(requested: f64, prev_len: f64, next_len: f64) -> f64 {
    if !requested.is_finite() || requested <= 0.0 {
        return 0.0;
    }
    requested.min(prev_len / 2.0).min(next_len / 2.0).max(0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
