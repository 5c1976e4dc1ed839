use crate::foundation::error::{StoryreelError, StoryreelResult};

/// Closed time window `[start, end]` in timeline seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    /// Window start in seconds.
    pub start: f64,
    /// Window end in seconds.
    pub end: f64,
}

impl TimeRange {
    /// Create a validated range with finite `0 <= start <= end`.
    pub fn new(start: f64, end: f64) -> StoryreelResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(StoryreelError::validation("time range bounds must be finite"));
        }
        if start < 0.0 {
            return Err(StoryreelError::validation("time range start must be >= 0"));
        }
        if start > end {
            return Err(StoryreelError::validation(format!(
                "time range start ({start}) must be <= end ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Length of the window in seconds.
    pub fn duration(self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Return `true` when the window has zero width.
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Shrink both ends inward by `pad` seconds.
    ///
    /// Width never goes negative: a window narrower than `2 * pad` collapses to its midpoint.
    pub fn shrink(self, pad: f64) -> Self {
        if !pad.is_finite() || pad <= 0.0 {
            return self;
        }
        let start = self.start + pad;
        let end = self.end - pad;
        if start <= end {
            Self { start, end }
        } else {
            let mid = self.start + self.duration() / 2.0;
            Self {
                start: mid,
                end: mid,
            }
        }
    }

    /// Return `true` when the two windows share more than a boundary instant.
    pub fn overlaps(self, other: TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Clamp both bounds into `[0, limit]`.
    pub fn clamp_to(self, limit: f64) -> Self {
        let limit = limit.max(0.0);
        let start = self.start.clamp(0.0, limit);
        Self {
            start,
            end: self.end.clamp(start, limit),
        }
    }
}

/// Output frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Create a validated size; both sides must be even and non-zero (yuv420p output).
    pub fn new(width: u32, height: u32) -> StoryreelResult<Self> {
        if width == 0 || height == 0 {
            return Err(StoryreelError::validation("frame width/height must be > 0"));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(StoryreelError::validation(format!(
                "frame size {width}x{height} must be even (required for yuv420p output)"
            )));
        }
        Ok(Self { width, height })
    }

    /// The shorter of the two sides.
    pub fn short_edge(self) -> u32 {
        self.width.min(self.height)
    }

    /// Derive a size with the given aspect ratio that keeps this size's short edge.
    pub fn with_aspect(self, aspect: AspectRatio) -> Self {
        let short = f64::from(self.short_edge());
        let ratio = aspect.as_f64();
        let (w, h) = if ratio >= 1.0 {
            (short * ratio, short)
        } else {
            (short, short / ratio)
        };
        Self {
            width: even_round(w),
            height: even_round(h),
        }
    }
}

/// Width-to-height ratio parsed from strings like `"16:9"` or `"1.7778"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectRatio {
    /// Width term.
    pub width: f64,
    /// Height term.
    pub height: f64,
}

impl AspectRatio {
    /// Parse `"W:H"` or a bare positive ratio.
    pub fn parse(raw: &str) -> StoryreelResult<Self> {
        let normalized = raw.trim().replace(' ', "");
        let bad = || StoryreelError::validation(format!("invalid aspect ratio '{raw}'"));
        if let Some((left, right)) = normalized.split_once(':') {
            let width = left.parse::<f64>().map_err(|_| bad())?;
            let height = right.parse::<f64>().map_err(|_| bad())?;
            if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
                return Err(bad());
            }
            return Ok(Self { width, height });
        }
        let ratio = normalized.parse::<f64>().map_err(|_| bad())?;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(bad());
        }
        Ok(Self {
            width: ratio,
            height: 1.0,
        })
    }

    /// Ratio as a single floating-point value.
    pub fn as_f64(self) -> f64 {
        self.width / self.height
    }
}

fn even_round(v: f64) -> u32 {
    let r = (v / 2.0).round() * 2.0;
    r.max(2.0) as u32
}

/// Format seconds as an ffmpeg-friendly decimal with millisecond precision.
pub(crate) fn secs_arg(secs: f64) -> String {
    format!("{:.3}", secs.max(0.0))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
