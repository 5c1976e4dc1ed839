use super::*;
use crate::assets::cache::ContentCache;
use crate::assets::resolver::{FileAssetResolver, PlaceholderImageGenerator};
use crate::foundation::core::FrameSize;
use crate::foundation::error::StoryreelError;
use crate::narration::provider::{NarrationAudio, StubNarrationProvider};
use crate::script::dsl::{SceneBuilder, ScriptBuilder};
use crate::script::model::VoiceConfig;

fn compiler(root: &std::path::Path) -> Compiler {
    let cache = ContentCache::open(root.join("cache")).unwrap();
    let resolver = FileAssetResolver::new(root).with_generator(Box::new(
        PlaceholderImageGenerator::new(cache, FrameSize::new(64, 36).unwrap()),
    ));
    Compiler::new(
        Box::new(StubNarrationProvider::default()),
        Box::new(resolver),
        PresetRegistry::with_builtins(),
    )
}

fn script() -> Script {
    ScriptBuilder::new("Demo")
        .scene(SceneBuilder::with_prompt("a red barn").duration(2.0).build())
        .scene(
            SceneBuilder::with_path("field.png")
                .say("one two")
                .say("three four five six seven")
                .build(),
        )
        .build()
        .unwrap()
}

#[test]
fn compile_generates_narration_and_reports_assets() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("field.png"), b"png").unwrap();
    let opts = CompileOpts {
        work_dir: dir.path().join("work"),
        parallel_narration: true,
    };
    let out = compiler(dir.path()).compile(&script(), &opts).unwrap();

    // 2.0 scene + 0.5 gap + 0.8 + 0.3 gap + 2.0
    assert!((out.metadata.total_duration - 5.6).abs() < 1e-9);
    assert_eq!(out.project.timeline.duration, out.metadata.total_duration);
    assert_eq!(out.metadata.scene_timings.len(), 2);

    let paths = &out.metadata.generated_asset_paths;
    assert_eq!(paths.len(), 3);
    assert!(paths[0].ends_with("narration/scene001_seg000.wav"));
    assert!(paths[1].ends_with("narration/scene001_seg001.wav"));
    assert_eq!(paths[2].extension().unwrap(), "png");
    assert!(paths.iter().all(|p| p.is_file()));
}

#[test]
fn plan_matches_compile_without_writing_audio() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("field.png"), b"png").unwrap();
    let c = compiler(dir.path());
    let planned = c.plan(&script()).unwrap();
    assert!(!dir.path().join("work").exists());

    let opts = CompileOpts {
        work_dir: dir.path().join("work"),
        parallel_narration: false,
    };
    let compiled = c.compile(&script(), &opts).unwrap();
    assert_eq!(planned, compiled.metadata.scene_timings);
}

struct BrokenProvider;

impl NarrationProvider for BrokenProvider {
    fn name(&self) -> &str {
        "broken"
    }

    fn generate(&self, _text: &str, _voice: &VoiceConfig) -> StoryreelResult<NarrationAudio> {
        Err(StoryreelError::provider("quota exceeded"))
    }

    fn estimate_duration(&self, _text: &str, _voice: &VoiceConfig) -> StoryreelResult<f64> {
        Ok(1.0)
    }
}

#[test]
fn provider_failures_abort_with_segment_context() {
    let dir = tempfile::tempdir().unwrap();
    let c = Compiler::new(
        Box::new(BrokenProvider),
        Box::new(FileAssetResolver::new(dir.path()).lenient()),
        PresetRegistry::with_builtins(),
    );
    let opts = CompileOpts {
        work_dir: dir.path().join("work"),
        parallel_narration: false,
    };
    let err = c.compile(&script(), &opts).unwrap_err();
    assert!(matches!(
        err,
        StoryreelError::Provider {
            scene: Some(1),
            segment: Some(0),
            ..
        }
    ));
    assert_eq!(c.plan(&script()).unwrap()[1].end, 2.5 + 1.0 + 0.3 + 1.0);
}
