use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;

use crate::{
    foundation::error::{StoryreelError, StoryreelResult},
    project::model::Project,
    render::encode::ensure_parent_dir,
};

impl Project {
    /// Parse and validate a project document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> StoryreelResult<Self> {
        let project: Project = serde_json::from_reader(r)
            .map_err(|e| StoryreelError::serde(format!("parse project JSON: {e}")))?;
        project.validate()?;
        Ok(project)
    }

    /// Parse and validate a project document from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> StoryreelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            StoryreelError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize as pretty JSON.
    pub fn to_json_string(&self) -> StoryreelResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StoryreelError::serde(format!("serialize project: {e}")))
    }

    /// Write the document to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> StoryreelResult<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        let f = File::create(path)
            .with_context(|| format!("create project file '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self)
            .map_err(|e| StoryreelError::serde(format!("serialize project: {e}")))?;
        w.flush()
            .with_context(|| format!("flush project file '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/document.rs"]
mod tests;
