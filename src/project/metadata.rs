use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    foundation::error::{StoryreelError, StoryreelResult},
    render::encode::ensure_parent_dir,
    timing::scheduler::SceneTiming,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Informational summary of a compile. Not needed to render.
pub struct CompileMetadata {
    /// Total timeline length in seconds.
    pub total_duration: f64,
    /// Per-scene windows.
    pub scene_timings: Vec<SceneTiming>,
    /// Files produced during compilation (narration audio, generated images).
    pub generated_asset_paths: Vec<PathBuf>,
}

impl CompileMetadata {
    /// Write as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> StoryreelResult<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| StoryreelError::serde(format!("serialize compile metadata: {e}")))?;
        std::fs::write(path, json)
            .with_context(|| format!("write compile metadata '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/metadata.rs"]
mod tests;
