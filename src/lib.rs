//! Storyreel compiles narrated scene scripts into timed multi-track projects and renders them
//! to video.
//!
//! The workflow has two phases:
//!
//! - Compile a [`Script`] with a [`Compiler`]: narration is synthesized, [`schedule`] turns
//!   audio durations into exact scene and segment windows, and [`assemble`] maps them onto
//!   typed layers of a [`Project`].
//! - Render the project with a [`RenderPipeline`], once per output or fanned out across
//!   several output targets with [`render_all`].
//!
//! A [`Project`] is a versioned JSON document, so one compile can feed many renders.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod audio;
mod compile;
mod effects;
mod foundation;
mod narration;
mod orchestrate;
mod preset;
mod project;
mod render;
mod script;
mod timing;

pub use crate::foundation::core::{AspectRatio, FrameSize, TimeRange};
pub use crate::foundation::error::{
    AggregateRenderError, RenderFailure, StoryreelError, StoryreelResult,
};

pub use crate::script::dsl::{SceneBuilder, ScriptBuilder};
pub use crate::script::model::{
    BgmConfig, NarrationSegment, OverlayPosition, OverlaySpec, Scene, Script, TimingConfig,
    VisualKind, VisualSpec, VoiceConfig,
};
pub use crate::timing::scheduler::{SceneTiming, SegmentTiming, schedule, total_duration};

pub use crate::narration::generate::{
    NarrationResult, durations, estimate_narration, generate_narration,
};
pub use crate::narration::provider::{
    CachingNarrationProvider, NarrationAudio, NarrationProvider, NarrationRegistry,
    StubNarrationProvider,
};

pub use crate::assets::cache::{ContentCache, cache_key};
pub use crate::assets::resolver::{
    AssetResolver, FileAssetResolver, ImageGenerator, PlaceholderImageGenerator, ResolvedAsset,
    kind_from_extension,
};

pub use crate::preset::catalog::{
    DEFAULT_PRESET, OutputDefaults, Preset, PresetDef, PresetRegistry, SubtitleStyle,
};
pub use crate::effects::fx::{
    ClipContext, Effect, EffectEngine, EffectSpec, FfmpegEffectEngine, PanDir, parse_effect,
    parse_effects,
};
pub use crate::effects::transitions::{
    SlideDir, TransitionKind, TransitionSpec, clamp_overlap, parse_transition,
    parse_transition_kind_params,
};

pub use crate::project::metadata::CompileMetadata;
pub use crate::project::model::{
    AudioLayer, AudioRole, OutputConfig, OutputSpec, OverlayLayer, PROJECT_VERSION, Project,
    SubtitleItem, SubtitleLayer, SubtitleMode, Timeline, VisualLayer,
};

pub use crate::compile::assembler::{assemble, default_output_path};
pub use crate::compile::compiler::{CompileOpts, CompileOutput, Compiler};

pub use crate::audio::mix::{
    AudioManifest, AudioSegment, MIX_SAMPLE_RATE, build_audio_manifest, secs_to_sample,
};
pub use crate::render::context::{
    ProgressEvent, ProgressSink, RenderContext, SilentProgress, StageOutcome, TracingProgress,
};
pub use crate::render::encode::{
    EncodeBackend, EncodeJob, FfmpegBackend, ensure_parent_dir, is_ffmpeg_on_path, muxer_name,
};
pub use crate::render::graph::{FilterGraph, MediaInput, StreamLabel};
pub use crate::render::pipeline::RenderPipeline;
pub use crate::render::stages::{
    AudioCompositionStage, AudioMergeStage, CleanupStage, EncodeStage, OverlayCompositionStage,
    RenderStage, SubtitleStage, VisualCompositionStage,
};
pub use crate::render::subtitles::{
    burn_filter, escape_filter_value, format_srt_time, save_srt, write_srt,
};

pub use crate::orchestrate::multi_output::{
    CancelHandle, OrchestratorOpts, output_for_aspect, render_all,
};
