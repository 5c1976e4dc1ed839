use std::collections::BTreeMap;
use std::io::Cursor;

use crate::{
    assets::cache::{ContentCache, cache_key},
    foundation::error::{StoryreelError, StoryreelResult},
    script::model::VoiceConfig,
};

#[derive(Clone, Debug, PartialEq)]
/// Encoded narration audio returned by a provider.
pub struct NarrationAudio {
    /// Encoded audio file contents.
    pub audio_bytes: Vec<u8>,
    /// Exact playback length in seconds.
    pub duration_secs: f64,
}

/// Speech backend that turns text into narration audio.
///
/// Implementations must be deterministic in `estimate_duration` so dry runs can be scheduled
/// without paying for generation.
pub trait NarrationProvider: Send + Sync {
    /// Registry key of this provider.
    fn name(&self) -> &str;

    /// Synthesize `text` with `voice`.
    fn generate(&self, text: &str, voice: &VoiceConfig) -> StoryreelResult<NarrationAudio>;

    /// Estimate the narration length of `text` without synthesizing it.
    fn estimate_duration(&self, text: &str, voice: &VoiceConfig) -> StoryreelResult<f64>;

    /// File extension of the bytes produced by [`NarrationProvider::generate`].
    fn audio_extension(&self) -> &str {
        "wav"
    }
}

#[derive(Clone, Copy, Debug)]
/// Deterministic offline provider producing silent WAV files.
///
/// Duration is derived from word count, words-per-minute and speaking rate, then rounded to
/// whole samples so that `estimate_duration` and `generate` agree exactly.
pub struct StubNarrationProvider {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for StubNarrationProvider {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
        }
    }
}

impl StubNarrationProvider {
    fn sample_count(&self, text: &str, voice: &VoiceConfig) -> StoryreelResult<u64> {
        if self.sample_rate == 0 {
            return Err(StoryreelError::provider("stub sample_rate must be non-zero"));
        }
        let words_per_sec = voice.words_per_minute * voice.rate / 60.0;
        if !words_per_sec.is_finite() || words_per_sec <= 0.0 {
            return Err(StoryreelError::provider(
                "words_per_minute * rate must be finite and > 0",
            ));
        }
        let words = text.split_whitespace().count().max(1) as f64;
        let secs = words / words_per_sec;
        Ok((secs * f64::from(self.sample_rate)).round() as u64)
    }
}

impl NarrationProvider for StubNarrationProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn generate(&self, text: &str, voice: &VoiceConfig) -> StoryreelResult<NarrationAudio> {
        let samples = self.sample_count(text, voice)?;
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| StoryreelError::provider(format!("WAV header error: {e}")))?;
            for _ in 0..samples {
                writer
                    .write_sample(0i16)
                    .map_err(|e| StoryreelError::provider(format!("WAV write error: {e}")))?;
            }
            writer
                .finalize()
                .map_err(|e| StoryreelError::provider(format!("WAV finalize error: {e}")))?;
        }
        Ok(NarrationAudio {
            audio_bytes: cursor.into_inner(),
            duration_secs: samples as f64 / f64::from(self.sample_rate),
        })
    }

    fn estimate_duration(&self, text: &str, voice: &VoiceConfig) -> StoryreelResult<f64> {
        let samples = self.sample_count(text, voice)?;
        Ok(samples as f64 / f64::from(self.sample_rate))
    }
}

#[derive(serde::Serialize)]
struct NarrationKeyInputs<'a> {
    provider: &'a str,
    text: &'a str,
    voice: &'a VoiceConfig,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct CachedNarrationMeta {
    duration_secs: f64,
}

/// Wraps a provider with a [`ContentCache`] keyed by provider name, text and voice.
pub struct CachingNarrationProvider {
    inner: Box<dyn NarrationProvider>,
    cache: ContentCache,
}

impl CachingNarrationProvider {
    /// Cache results of `inner` in `cache`.
    pub fn new(inner: Box<dyn NarrationProvider>, cache: ContentCache) -> Self {
        Self { inner, cache }
    }

    fn key(&self, text: &str, voice: &VoiceConfig) -> StoryreelResult<String> {
        cache_key(
            "narration",
            &NarrationKeyInputs {
                provider: self.inner.name(),
                text,
                voice,
            },
        )
    }
}

impl NarrationProvider for CachingNarrationProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn generate(&self, text: &str, voice: &VoiceConfig) -> StoryreelResult<NarrationAudio> {
        let key = self.key(text, voice)?;
        let ext = self.inner.audio_extension();
        if let (Some(audio_bytes), Some(meta)) =
            (self.cache.get(&key, ext)?, self.cache.get(&key, "json")?)
        {
            let meta: CachedNarrationMeta = serde_json::from_slice(&meta)
                .map_err(|e| StoryreelError::serde(format!("cached narration meta: {e}")))?;
            tracing::debug!(key = %key, "narration cache hit");
            return Ok(NarrationAudio {
                audio_bytes,
                duration_secs: meta.duration_secs,
            });
        }

        let audio = self.inner.generate(text, voice)?;
        let meta = serde_json::to_vec(&CachedNarrationMeta {
            duration_secs: audio.duration_secs,
        })
        .map_err(|e| StoryreelError::serde(format!("cached narration meta: {e}")))?;
        self.cache.put(&key, ext, &audio.audio_bytes)?;
        self.cache.put(&key, "json", &meta)?;
        Ok(audio)
    }

    fn estimate_duration(&self, text: &str, voice: &VoiceConfig) -> StoryreelResult<f64> {
        self.inner.estimate_duration(text, voice)
    }

    fn audio_extension(&self) -> &str {
        self.inner.audio_extension()
    }
}

type ProviderCtor = Box<dyn Fn() -> Box<dyn NarrationProvider> + Send + Sync>;

/// Narration provider constructors keyed by name.
///
/// Built once at startup and passed explicitly to the compiler.
pub struct NarrationRegistry {
    ctors: BTreeMap<String, ProviderCtor>,
}

impl NarrationRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    /// Registry with the built-in `"stub"` provider.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register("stub", || {
            Box::new(StubNarrationProvider::default()) as Box<dyn NarrationProvider>
        });
        reg
    }

    /// Register (or replace) the constructor for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F)
    where
        F: Fn() -> Box<dyn NarrationProvider> + Send + Sync + 'static,
    {
        self.ctors
            .insert(name.into().trim().to_ascii_lowercase(), Box::new(ctor));
    }

    /// Construct the provider registered under `name`.
    pub fn create(&self, name: &str) -> StoryreelResult<Box<dyn NarrationProvider>> {
        let key = name.trim().to_ascii_lowercase();
        let ctor = self.ctors.get(&key).ok_or_else(|| {
            StoryreelError::validation(format!(
                "unknown narration provider '{name}' (known: {})",
                self.names().join(", ")
            ))
        })?;
        Ok(ctor())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.ctors.keys().map(String::as_str).collect()
    }
}

impl Default for NarrationRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/provider.rs"]
mod tests;
