use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use xxhash_rust::xxh3::Xxh3;

use crate::foundation::error::{StoryreelError, StoryreelResult};

const XXH3_SEED: u64 = 0x5354_4f52_5952_4545;

/// Stable content key for a set of generation inputs.
///
/// The key is the seeded `xxh3` hash of `namespace` followed by the JSON serialization of
/// `inputs`, rendered as 16 hex digits. Equal inputs always produce equal keys across runs.
pub fn cache_key<T: serde::Serialize + ?Sized>(
    namespace: &str,
    inputs: &T,
) -> StoryreelResult<String> {
    let bytes = serde_json::to_vec(inputs)
        .map_err(|e| StoryreelError::serde(format!("serialize cache inputs: {e}")))?;
    let mut h = Xxh3::with_seed(XXH3_SEED);
    h.update(namespace.as_bytes());
    h.update(&[0]);
    h.update(&bytes);
    Ok(format!("{:016x}", h.digest()))
}

#[derive(Clone, Debug)]
/// Content-addressable file cache scoped to one directory.
///
/// Entries are immutable once written. Writes go through a uniquely named temporary file and a
/// rename, so a reader never observes a partial entry.
pub struct ContentCache {
    root: PathBuf,
}

impl ContentCache {
    /// Open (and create if needed) a cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoryreelResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create cache dir '{}'", root.display()))?;
        Ok(Self { root })
    }

    /// Cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an entry with `key` and extension `ext` is stored at.
    pub fn path_for(&self, key: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{key}.{ext}"))
    }

    /// Return `true` when the entry exists.
    pub fn contains(&self, key: &str, ext: &str) -> bool {
        self.path_for(key, ext).is_file()
    }

    /// Read an entry, or `None` on a miss.
    pub fn get(&self, key: &str, ext: &str) -> StoryreelResult<Option<Vec<u8>>> {
        let path = self.path_for(key, ext);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("read cache entry '{}'", path.display()))
                .into()),
        }
    }

    /// Store an entry and return its path.
    ///
    /// Each write goes through its own temporary file. Concurrent writers of one key each commit
    /// a complete entry and the last rename wins.
    pub fn put(&self, key: &str, ext: &str, bytes: &[u8]) -> StoryreelResult<PathBuf> {
        let path = self.path_for(key, ext);
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .with_context(|| format!("create temp entry in '{}'", self.root.display()))?;
        tmp.write_all(bytes)
            .with_context(|| format!("write cache entry '{}'", tmp.path().display()))?;
        if let Err(e) = tmp.persist(&path) {
            if !path.is_file() {
                return Err(anyhow::Error::new(e.error)
                    .context(format!("commit cache entry '{}'", path.display()))
                    .into());
            }
            tracing::debug!(key, ext, "cache entry committed by a concurrent writer");
        }
        tracing::debug!(key, ext, "cache store");
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
