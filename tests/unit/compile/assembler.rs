use super::*;
use crate::assets::resolver::FileAssetResolver;
use crate::effects::transitions::TransitionSpec;
use crate::project::model::SubtitleMode;
use crate::script::dsl::{SceneBuilder, ScriptBuilder};
use crate::script::model::BgmConfig;
use crate::timing::scheduler::SegmentTiming;
use std::path::Path;

fn resolver() -> FileAssetResolver {
    FileAssetResolver::new("media").lenient()
}

fn narration_for(timings: &[SceneTiming]) -> Vec<Vec<NarrationResult>> {
    timings
        .iter()
        .map(|t| {
            t.segments
                .iter()
                .map(|s| NarrationResult {
                    scene_index: t.scene_index,
                    segment_index: s.segment_index,
                    audio_path: PathBuf::from(format!(
                        "work/narration/scene{:03}_seg{:03}.wav",
                        t.scene_index, s.segment_index
                    )),
                    duration_secs: s.end - s.start,
                })
                .collect()
        })
        .collect()
}

fn silent_then_narrated() -> (Script, Vec<SceneTiming>) {
    let script = ScriptBuilder::new("Night Sky")
        .scene(SceneBuilder::with_path("stars.png").duration(9.5).build())
        .scene(
            SceneBuilder::with_path("moon.mp4")
                .say("  The moon rises. ")
                .preset("social")
                .build(),
        )
        .scene(
            SceneBuilder::with_path("dawn.jpg")
                .duration(2.0)
                .transition(TransitionSpec::new("dissolve", 0.25))
                .build(),
        )
        .bgm(BgmConfig {
            path: "music.mp3".to_string(),
            volume: 0.3,
            fade_in_secs: 1.0,
            fade_out_secs: 2.0,
            looped: true,
        })
        .build()
        .unwrap();
    let timings = vec![
        SceneTiming {
            scene_index: 0,
            start: 0.0,
            end: 9.5,
            segments: Vec::new(),
        },
        SceneTiming {
            scene_index: 1,
            start: 10.0,
            end: 12.0,
            segments: vec![SegmentTiming {
                segment_index: 0,
                start: 10.0,
                end: 12.0,
            }],
        },
        SceneTiming {
            scene_index: 2,
            start: 12.5,
            end: 14.5,
            segments: Vec::new(),
        },
    ];
    (script, timings)
}

#[test]
fn subtitle_windows_are_shrunk_by_padding() {
    let (script, timings) = silent_then_narrated();
    let project = assemble(
        &script,
        &timings,
        &narration_for(&timings),
        &PresetRegistry::with_builtins(),
        &resolver(),
    )
    .unwrap();

    assert_eq!(project.timeline.subtitle_layers.len(), 1);
    let items = &project.timeline.subtitle_layers[0].items;
    assert_eq!(items.len(), 1);
    assert!((items[0].start - 10.1).abs() < 1e-9);
    assert!((items[0].end - 11.9).abs() < 1e-9);
    assert_eq!(items[0].text, "The moon rises.");
}

#[test]
fn visual_layers_follow_scene_windows_and_presets() {
    let (script, timings) = silent_then_narrated();
    let project = assemble(
        &script,
        &timings,
        &narration_for(&timings),
        &PresetRegistry::with_builtins(),
        &resolver(),
    )
    .unwrap();
    let v = &project.timeline.visual_layers;
    assert_eq!(v.len(), 3);

    assert_eq!((v[0].start, v[0].end), (0.0, 9.5));
    assert_eq!(v[0].kind, VisualKind::Image);
    assert_eq!(v[0].effects[0].kind, "zoom_in");
    assert!(v[0].transition.is_none());
    assert_eq!(v[0].source, Path::new("media").join("stars.png"));

    // Scene-level preset override.
    assert_eq!(v[1].kind, VisualKind::Video);
    assert!(v[1].effects.is_empty());
    assert_eq!(v[1].transition.as_ref().unwrap().kind, "slide");

    // Scene-level transition override beats the preset.
    assert_eq!(v[2].transition.as_ref().unwrap().kind, "dissolve");
}

#[test]
fn narration_and_music_become_audio_layers() {
    let (script, timings) = silent_then_narrated();
    let project = assemble(
        &script,
        &timings,
        &narration_for(&timings),
        &PresetRegistry::with_builtins(),
        &resolver(),
    )
    .unwrap();
    let a = &project.timeline.audio_layers;
    assert_eq!(a.len(), 2);

    assert_eq!(a[0].role, AudioRole::Narration);
    assert_eq!((a[0].start, a[0].end), (10.0, 12.0));
    assert_eq!((a[0].scene_index, a[0].segment_index), (Some(1), Some(0)));

    assert_eq!(a[1].role, AudioRole::Music);
    assert_eq!((a[1].start, a[1].end), (0.0, 14.5));
    assert!(a[1].looped);
    assert_eq!(a[1].fade_out, 2.0);
    assert_eq!(project.timeline.duration, 14.5);
}

#[test]
fn outputs_share_one_timeline() {
    let (mut script, timings) = silent_then_narrated();
    script.outputs = vec![
        OutputSpec::with_aspect("out/wide.mp4", "16:9"),
        OutputSpec::with_aspect("out/tall.mp4", "9:16"),
    ];
    let project = assemble(
        &script,
        &timings,
        &narration_for(&timings),
        &PresetRegistry::with_builtins(),
        &resolver(),
    )
    .unwrap();
    assert_eq!(project.outputs.len(), 2);
    assert_eq!(project.output, project.outputs[0]);
    assert_eq!((project.outputs[1].width, project.outputs[1].height), (1080, 1920));
    assert_eq!(project.outputs[1].subtitle_mode, SubtitleMode::Burn);
}

#[test]
fn default_output_comes_from_the_title() {
    let (mut script, timings) = silent_then_narrated();
    script.preset = Some("minimal".to_string());
    let project = assemble(
        &script,
        &timings,
        &narration_for(&timings),
        &PresetRegistry::with_builtins(),
        &resolver(),
    )
    .unwrap();
    assert_eq!(project.output.path, PathBuf::from("night-sky.mp4"));
    assert_eq!(project.output.subtitle_mode, SubtitleMode::Sidecar);
    assert_eq!(default_output_path("  My First Reel!! "), PathBuf::from("my-first-reel.mp4"));
    assert_eq!(default_output_path("***"), PathBuf::from("storyreel.mp4"));
}

#[test]
fn overlays_are_clamped_to_the_timeline() {
    let (mut script, timings) = silent_then_narrated();
    script.overlays = vec![crate::script::model::OverlaySpec {
        path: "logo.png".to_string(),
        position: Default::default(),
        margin_px: 10,
        opacity: 0.5,
        scale: 0.1,
        start: Some(2.0),
        end: Some(99.0),
    }];
    let project = assemble(
        &script,
        &timings,
        &narration_for(&timings),
        &PresetRegistry::with_builtins(),
        &resolver(),
    )
    .unwrap();
    let o = &project.timeline.overlay_layers[0];
    assert_eq!((o.start, o.end), (2.0, 14.5));
}

#[test]
fn unresolvable_visuals_name_their_scene() {
    let (mut script, timings) = silent_then_narrated();
    script.scenes[2].visual = crate::script::model::VisualSpec {
        prompt: Some("sunrise".to_string()),
        ..Default::default()
    };
    let err = assemble(
        &script,
        &timings,
        &narration_for(&timings),
        &PresetRegistry::with_builtins(),
        &resolver(),
    )
    .unwrap_err();
    assert!(matches!(err, StoryreelError::Resolution { scene: Some(2), .. }));
}

#[test]
fn mismatched_inputs_are_schedule_errors() {
    let (script, timings) = silent_then_narrated();
    let mut narration = narration_for(&timings);
    narration[1].clear();
    let err = assemble(
        &script,
        &timings,
        &narration,
        &PresetRegistry::with_builtins(),
        &resolver(),
    )
    .unwrap_err();
    assert!(matches!(err, StoryreelError::Schedule { scene: 1, .. }));
}
