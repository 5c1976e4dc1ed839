use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Named pad in an ffmpeg filter graph, rendered as `[name]`.
pub struct StreamLabel(String);

impl StreamLabel {
    /// Wrap a raw pad name such as `"0:v"` or `"v3"`.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Pad name without brackets.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// One `-i` input of the encode command, with the options that precede it.
pub struct MediaInput {
    /// Options placed before `-i` (for example `-loop 1 -t 3.000`).
    pub pre_args: Vec<String>,
    /// Input file.
    pub path: PathBuf,
}

impl MediaInput {
    /// Plain file input.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            pre_args: Vec::new(),
            path: path.into(),
        }
    }

    /// Still image looped for `secs` seconds at `fps`.
    pub fn looped_image(path: impl Into<PathBuf>, secs: f64, fps: u32) -> Self {
        Self {
            pre_args: vec![
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                fps.to_string(),
                "-t".to_string(),
                crate::foundation::core::secs_arg(secs),
            ],
            path: path.into(),
        }
    }

    /// Audio file looped indefinitely; the consumer must trim it.
    pub fn looped_audio(path: impl Into<PathBuf>) -> Self {
        Self {
            pre_args: vec!["-stream_loop".to_string(), "-1".to_string()],
            path: path.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
/// Incrementally built `-filter_complex` graph plus its inputs.
///
/// Stages append chains; the encode stage serializes the whole graph once.
pub struct FilterGraph {
    inputs: Vec<MediaInput>,
    chains: Vec<String>,
    next_label: u32,
}

impl FilterGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input and return its index.
    pub fn add_input(&mut self, input: MediaInput) -> usize {
        self.inputs.push(input);
        self.inputs.len() - 1
    }

    /// Registered inputs, in `-i` order.
    pub fn inputs(&self) -> &[MediaInput] {
        &self.inputs
    }

    /// Filter chains, in append order.
    pub fn chains(&self) -> &[String] {
        &self.chains
    }

    /// Video pad of input `idx`.
    pub fn video_of(idx: usize) -> StreamLabel {
        StreamLabel(format!("{idx}:v"))
    }

    /// Audio pad of input `idx`.
    pub fn audio_of(idx: usize) -> StreamLabel {
        StreamLabel(format!("{idx}:a"))
    }

    /// Allocate a fresh intermediate label.
    pub fn fresh(&mut self, prefix: &str) -> StreamLabel {
        let label = StreamLabel(format!("{prefix}{}", self.next_label));
        self.next_label += 1;
        label
    }

    /// Append `[in..]filter[out]`.
    pub fn push(&mut self, inputs: &[&StreamLabel], filter: &str, output: &StreamLabel) {
        let mut chain = String::new();
        for input in inputs {
            chain.push_str(&input.to_string());
        }
        chain.push_str(filter);
        chain.push_str(&output.to_string());
        self.chains.push(chain);
    }

    /// Apply a single-input filter and return the fresh output label.
    pub fn chain(&mut self, input: &StreamLabel, filter: &str, prefix: &str) -> StreamLabel {
        let out = self.fresh(prefix);
        self.push(&[input], filter, &out);
        out
    }

    /// Return `true` when no chain has been appended.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Serialize for `-filter_complex`.
    pub fn render(&self) -> String {
        self.chains.join(";")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/graph.rs"]
mod tests;
