use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::{
    foundation::core::secs_arg,
    foundation::error::{StoryreelError, StoryreelResult},
    project::model::OutputConfig,
    render::graph::{FilterGraph, MediaInput, StreamLabel},
};

#[derive(Clone, Debug, PartialEq)]
/// Everything an encoder needs to produce one output file.
pub struct EncodeJob {
    /// Inputs, in `-i` order.
    pub inputs: Vec<MediaInput>,
    /// Serialized `-filter_complex` graph; empty when no filtering is needed.
    pub filter_complex: String,
    /// Final video stream.
    pub video: StreamLabel,
    /// Final audio stream, if any.
    pub audio: Option<StreamLabel>,
    /// Resolved output parameters.
    pub output: OutputConfig,
    /// File the encoder writes to (the hidden partial path).
    pub out_path: PathBuf,
    /// Output length in seconds.
    pub duration: f64,
}

impl EncodeJob {
    /// Assemble a job from a finished filter graph.
    pub fn from_graph(
        graph: &FilterGraph,
        video: StreamLabel,
        audio: Option<StreamLabel>,
        output: OutputConfig,
        out_path: PathBuf,
        duration: f64,
    ) -> Self {
        Self {
            inputs: graph.inputs().to_vec(),
            filter_complex: graph.render(),
            video,
            audio,
            output,
            out_path,
            duration,
        }
    }

    /// Full `ffmpeg` argument list (without the program name).
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-y", "-hide_banner", "-loglevel", "error"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        for input in &self.inputs {
            args.extend(input.pre_args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().into_owned());
        }
        if !self.filter_complex.is_empty() {
            args.push("-filter_complex".to_string());
            args.push(self.filter_complex.clone());
        }

        args.push("-map".to_string());
        args.push(map_arg(&self.video));
        let o = &self.output;
        args.extend(
            [
                "-c:v",
                o.video_codec.as_str(),
                "-b:v",
                o.video_bitrate.as_str(),
                "-pix_fmt",
                "yuv420p",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push("-r".to_string());
        args.push(o.fps.to_string());

        if let Some(audio) = &self.audio {
            args.push("-map".to_string());
            args.push(map_arg(audio));
            args.extend(
                ["-c:a", o.audio_codec.as_str(), "-b:a", o.audio_bitrate.as_str()]
                    .iter()
                    .map(|s| s.to_string()),
            );
        } else {
            args.push("-an".to_string());
        }

        args.push("-t".to_string());
        args.push(secs_arg(self.duration));
        let muxer = muxer_name(&o.container);
        if muxer == "mp4" || muxer == "mov" {
            args.push("-movflags".to_string());
            args.push("+faststart".to_string());
        }
        args.push("-f".to_string());
        args.push(muxer.to_string());
        args.push(self.out_path.to_string_lossy().into_owned());
        args
    }
}

// Raw input pads (`0:v`) are mapped bare; filter outputs need brackets.
fn map_arg(label: &StreamLabel) -> String {
    if label.name().contains(':') {
        label.name().to_string()
    } else {
        label.to_string()
    }
}

/// ffmpeg muxer name for a container/extension string.
pub fn muxer_name(container: &str) -> &str {
    match container {
        "mkv" => "matroska",
        "m4v" => "mp4",
        other => other,
    }
}

/// Backend that turns an [`EncodeJob`] into a file at `job.out_path`.
pub trait EncodeBackend: Send + Sync {
    /// Encode the job. On error the partial file may be left behind for cleanup.
    fn encode(&self, job: &EncodeJob) -> StoryreelResult<()>;
}

#[derive(Clone, Copy, Debug, Default)]
/// Backend that spawns the system `ffmpeg` binary.
pub struct FfmpegBackend;

impl EncodeBackend for FfmpegBackend {
    fn encode(&self, job: &EncodeJob) -> StoryreelResult<()> {
        if !is_ffmpeg_on_path() {
            return Err(StoryreelError::Other(anyhow::anyhow!(
                "ffmpeg is required for encoding, but was not found on PATH"
            )));
        }
        ensure_parent_dir(&job.out_path)?;

        let args = job.ffmpeg_args();
        tracing::debug!(output = %job.out_path.display(), ?args, "spawning ffmpeg");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StoryreelError::Other(anyhow::anyhow!("failed to spawn ffmpeg: {e}")))?;

        let mut stderr_bytes = Vec::new();
        if let Some(mut stderr) = child.stderr.take() {
            stderr.read_to_end(&mut stderr_bytes).map_err(|e| {
                StoryreelError::Other(anyhow::anyhow!("ffmpeg stderr read failed: {e}"))
            })?;
        }
        let status = child.wait().map_err(|e| {
            StoryreelError::Other(anyhow::anyhow!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(StoryreelError::Other(anyhow::anyhow!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> StoryreelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
