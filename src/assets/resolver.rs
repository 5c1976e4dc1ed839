use std::path::{Path, PathBuf};

use anyhow::Context;
use image::ImageEncoder;

use crate::{
    assets::cache::{ContentCache, cache_key},
    foundation::core::FrameSize,
    foundation::error::{StoryreelError, StoryreelResult},
    script::model::{VisualKind, VisualSpec},
};

#[derive(Clone, Debug, PartialEq)]
/// A visual spec resolved to a concrete media file.
pub struct ResolvedAsset {
    /// Media file on disk.
    pub path: PathBuf,
    /// Media type.
    pub kind: VisualKind,
    /// `true` when the file was produced by a generator rather than referenced directly.
    pub generated: bool,
}

/// Resolves visual intents and relative media paths to files.
pub trait AssetResolver: Send + Sync {
    /// Resolve a scene's visual spec.
    ///
    /// Fails with [`StoryreelError::Resolution`] when neither a direct path nor a prompt is set.
    fn resolve(&self, visual: &VisualSpec) -> StoryreelResult<ResolvedAsset>;

    /// Resolve a plain media path (music, overlays) relative to the asset root.
    fn resolve_path(&self, rel: &str) -> StoryreelResult<PathBuf>;
}

/// Produces an image file for a text prompt.
pub trait ImageGenerator: Send + Sync {
    /// Return a path to an image matching `prompt`.
    fn generate(&self, prompt: &str) -> StoryreelResult<PathBuf>;
}

/// Infer the media type of `path` from its extension.
pub fn kind_from_extension(path: &Path) -> Option<VisualKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" | "jpg" | "jpeg" | "webp" | "bmp" | "gif" | "tif" | "tiff" => {
            Some(VisualKind::Image)
        }
        "mp4" | "mov" | "mkv" | "webm" | "avi" | "m4v" => Some(VisualKind::Video),
        _ => None,
    }
}

/// Resolver for files under a root directory, with an optional prompt generator.
pub struct FileAssetResolver {
    root: PathBuf,
    generator: Option<Box<dyn ImageGenerator>>,
    require_exists: bool,
}

impl FileAssetResolver {
    /// Resolve relative paths against `root`. Referenced files must exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            generator: None,
            require_exists: true,
        }
    }

    /// Use `generator` for prompt-only visuals.
    pub fn with_generator(mut self, generator: Box<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Skip the existence check (dry runs).
    pub fn lenient(mut self) -> Self {
        self.require_exists = false;
        self
    }

    fn join(&self, rel: &str) -> StoryreelResult<PathBuf> {
        let rel = rel.trim();
        if rel.is_empty() {
            return Err(StoryreelError::resolution("media path must be non-empty"));
        }
        let path = self.root.join(rel);
        if self.require_exists && !path.is_file() {
            return Err(StoryreelError::resolution(format!(
                "media file '{}' does not exist",
                path.display()
            )));
        }
        Ok(path)
    }
}

impl AssetResolver for FileAssetResolver {
    fn resolve(&self, visual: &VisualSpec) -> StoryreelResult<ResolvedAsset> {
        if let Some(rel) = visual.path.as_deref() {
            let path = self.join(rel)?;
            let kind = match visual.kind.or_else(|| kind_from_extension(&path)) {
                Some(k) => k,
                None => {
                    return Err(StoryreelError::resolution(format!(
                        "cannot infer media type of '{}'; set visual.kind",
                        path.display()
                    )));
                }
            };
            return Ok(ResolvedAsset {
                path,
                kind,
                generated: false,
            });
        }

        if let Some(prompt) = visual.prompt.as_deref() {
            let generator = self.generator.as_ref().ok_or_else(|| {
                StoryreelError::resolution(format!(
                    "visual prompt '{prompt}' needs an image generator, but none is configured"
                ))
            })?;
            let path = generator.generate(prompt).map_err(|e| match e {
                e @ (StoryreelError::Provider { .. } | StoryreelError::Resolution { .. }) => e,
                other => StoryreelError::provider(format!(
                    "image generator failed for prompt '{prompt}': {other}"
                )),
            })?;
            return Ok(ResolvedAsset {
                path,
                kind: VisualKind::Image,
                generated: true,
            });
        }

        Err(StoryreelError::resolution(
            "visual has neither a path nor a prompt",
        ))
    }

    fn resolve_path(&self, rel: &str) -> StoryreelResult<PathBuf> {
        self.join(rel)
    }
}

/// Offline generator that renders a solid-colour PNG per prompt.
///
/// The colour is derived from the prompt hash, so the same prompt always maps to the same
/// file. Images are stored in a [`ContentCache`].
pub struct PlaceholderImageGenerator {
    cache: ContentCache,
    size: FrameSize,
}

impl PlaceholderImageGenerator {
    /// Generator writing `size` images into `cache`.
    pub fn new(cache: ContentCache, size: FrameSize) -> Self {
        Self { cache, size }
    }

    /// RGB colour used for `prompt`.
    pub fn color_for(prompt: &str) -> [u8; 3] {
        let mut h = xxhash_rust::xxh3::xxh3_64(prompt.trim().as_bytes());
        let mut rgb = [0u8; 3];
        for c in &mut rgb {
            // Keep placeholders mid-tone so burned subtitles stay readable.
            *c = 48 + (h & 0x7f) as u8;
            h >>= 8;
        }
        rgb
    }
}

impl ImageGenerator for PlaceholderImageGenerator {
    fn generate(&self, prompt: &str) -> StoryreelResult<PathBuf> {
        let key = cache_key("placeholder-image", &(prompt.trim(), self.size))?;
        let path = self.cache.path_for(&key, "png");
        if path.is_file() {
            return Ok(path);
        }

        let [r, g, b] = Self::color_for(prompt);
        let px = (self.size.width as usize) * (self.size.height as usize);
        let mut buf = Vec::with_capacity(px * 3);
        for _ in 0..px {
            buf.extend_from_slice(&[r, g, b]);
        }
        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(
                &buf,
                self.size.width,
                self.size.height,
                image::ExtendedColorType::Rgb8,
            )
            .with_context(|| format!("encode placeholder png for '{prompt}'"))?;
        let path = self.cache.put(&key, "png", &png)?;
        tracing::debug!(prompt, path = %path.display(), "placeholder image generated");
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolver.rs"]
mod tests;
