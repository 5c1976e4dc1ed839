use std::path::PathBuf;

/// Convenience result type used across storyreel.
pub type StoryreelResult<T> = Result<T, StoryreelError>;

/// Top-level error taxonomy used by compile and render APIs.
///
/// Every variant carries enough context (scene/segment index, output path, stage name) to
/// localize a fault without inspecting internals.
#[derive(thiserror::Error, Debug)]
pub enum StoryreelError {
    /// Malformed script, project document or option value.
    #[error("validation error: {0}")]
    Validation(String),

    /// The scheduler was called with inputs that break its contract.
    #[error("schedule error at scene {scene}: {message}")]
    Schedule {
        /// Offending scene index.
        scene: usize,
        /// Description of the violated contract.
        message: String,
    },

    /// A scene's visual reference could not be resolved to a file.
    #[error("resolution error{}: {message}", fmt_scene(.scene))]
    Resolution {
        /// Scene index, when known.
        scene: Option<usize>,
        /// Resolver message.
        message: String,
    },

    /// A narration or asset generation backend failed.
    #[error("provider error{}{}: {message}", fmt_scene(.scene), fmt_segment(.segment))]
    Provider {
        /// Scene index, when known.
        scene: Option<usize>,
        /// Segment index, when known.
        segment: Option<usize>,
        /// Backend message.
        message: String,
    },

    /// A rendering pipeline stage failed for one output.
    #[error("pipeline error in stage '{stage}' for '{}': {source}", .output.display())]
    Pipeline {
        /// Output file the failing render was producing.
        output: PathBuf,
        /// Name of the failing stage.
        stage: String,
        /// Underlying failure.
        #[source]
        source: Box<StoryreelError>,
    },

    /// A render unit was cancelled before it started.
    #[error("render of '{}' was cancelled", .output.display())]
    Cancelled {
        /// Output file of the cancelled unit.
        output: PathBuf,
    },

    /// One or more outputs of a multi-output render failed.
    #[error(transparent)]
    AggregateRender(#[from] AggregateRenderError),

    /// Errors when serializing or deserializing documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn fmt_scene(scene: &Option<usize>) -> String {
    scene.map(|s| format!(" at scene {s}")).unwrap_or_default()
}

fn fmt_segment(segment: &Option<usize>) -> String {
    segment.map(|s| format!(", segment {s}")).unwrap_or_default()
}

fn fmt_failures(failures: &[RenderFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("; '{}': {}", f.path.display(), f.cause))
        .collect()
}

impl StoryreelError {
    /// Build a [`StoryreelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StoryreelError::Schedule`] value.
    pub fn schedule(scene: usize, msg: impl Into<String>) -> Self {
        Self::Schedule {
            scene,
            message: msg.into(),
        }
    }

    /// Build a [`StoryreelError::Resolution`] value without scene context.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution {
            scene: None,
            message: msg.into(),
        }
    }

    /// Build a [`StoryreelError::Provider`] value without scene context.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider {
            scene: None,
            segment: None,
            message: msg.into(),
        }
    }

    /// Build a [`StoryreelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Wrap `self` as the failure of pipeline `stage` while rendering `output`.
    pub fn in_stage(self, output: impl Into<PathBuf>, stage: impl Into<String>) -> Self {
        Self::Pipeline {
            output: output.into(),
            stage: stage.into(),
            source: Box::new(self),
        }
    }

    /// Attach a scene index to resolution and provider errors that lack one.
    pub fn at_scene(self, idx: usize) -> Self {
        match self {
            Self::Resolution {
                scene: None,
                message,
            } => Self::Resolution {
                scene: Some(idx),
                message,
            },
            Self::Provider {
                scene: None,
                segment,
                message,
            } => Self::Provider {
                scene: Some(idx),
                segment,
                message,
            },
            other => other,
        }
    }

    /// Attach a segment index to provider errors that lack one.
    pub fn at_segment(self, idx: usize) -> Self {
        match self {
            Self::Provider {
                scene,
                segment: None,
                message,
            } => Self::Provider {
                scene,
                segment: Some(idx),
                message,
            },
            other => other,
        }
    }
}

/// One failed unit of a multi-output render.
#[derive(Debug)]
pub struct RenderFailure {
    /// Position of the failed spec in the caller's input order.
    pub index: usize,
    /// Output path the unit was producing.
    pub path: PathBuf,
    /// Why the unit failed.
    pub cause: StoryreelError,
}

/// Aggregate failure raised by the multi-output orchestrator.
///
/// Failures are listed in input order, not completion order.
#[derive(thiserror::Error, Debug)]
#[error("{} output(s) failed to render{}", .failures.len(), fmt_failures(.failures))]
pub struct AggregateRenderError {
    /// Every failed unit.
    pub failures: Vec<RenderFailure>,
}

impl AggregateRenderError {
    /// Paths of all failed outputs, in input order.
    pub fn failed_paths(&self) -> Vec<&std::path::Path> {
        self.failures.iter().map(|f| f.path.as_path()).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
