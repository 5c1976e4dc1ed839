use super::*;
use crate::foundation::error::StoryreelError;
use crate::preset::catalog::{OutputDefaults, SubtitleStyle};
use crate::project::model::{
    OutputConfig, OutputSpec, PROJECT_VERSION, SubtitleItem, SubtitleLayer, SubtitleMode, Timeline,
};
use crate::render::context::{SilentProgress, StageOutcome};
use crate::render::encode::EncodeJob;
use std::path::Path;
use std::sync::Mutex;

struct WritingBackend;

impl EncodeBackend for WritingBackend {
    fn encode(&self, job: &EncodeJob) -> StoryreelResult<()> {
        std::fs::write(&job.out_path, job.ffmpeg_args().join(" ")).unwrap();
        Ok(())
    }
}

struct FailingBackend;

impl EncodeBackend for FailingBackend {
    fn encode(&self, job: &EncodeJob) -> StoryreelResult<()> {
        std::fs::write(&job.out_path, b"half").unwrap();
        Err(StoryreelError::provider("encoder crashed"))
    }
}

fn project(out: &Path, mode: SubtitleMode) -> Project {
    let spec = OutputSpec {
        subtitle_mode: Some(mode),
        ..OutputSpec::new(out)
    };
    let output = OutputConfig::derive(&spec, &OutputDefaults::default()).unwrap();
    Project {
        version: PROJECT_VERSION.to_string(),
        title: "t".to_string(),
        outputs: vec![output.clone()],
        output,
        timeline: Timeline {
            duration: 2.0,
            visual_layers: Vec::new(),
            audio_layers: Vec::new(),
            subtitle_layers: vec![SubtitleLayer {
                items: vec![SubtitleItem {
                    scene_index: 0,
                    segment_index: 0,
                    text: "hi".to_string(),
                    start: 0.0,
                    end: 1.0,
                }],
                style: SubtitleStyle::default(),
            }],
            overlay_layers: Vec::new(),
        },
    }
}

fn pipeline(backend: Arc<dyn EncodeBackend>) -> RenderPipeline {
    RenderPipeline::new(Arc::new(FfmpegEffectEngine), backend)
}

#[test]
fn stages_run_in_order_with_cleanup_last() {
    assert_eq!(
        pipeline(Arc::new(WritingBackend)).stage_names(),
        vec![
            "visual_composition",
            "audio_composition",
            "audio_merge",
            "overlay_composition",
            "subtitles",
            "encode",
            "cleanup"
        ]
    );
}

#[test]
fn successful_render_publishes_output_and_reports_progress() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested/v.mp4");
    let p = project(&out, SubtitleMode::Sidecar);

    let events = Mutex::new(Vec::new());
    let sink = |e: &ProgressEvent| events.lock().unwrap().push(e.clone());
    let written = pipeline(Arc::new(WritingBackend)).render(&p, &sink).unwrap();

    assert_eq!(written, out);
    assert!(out.is_file());
    assert!(!p.output.partial_path().exists());
    assert!(dir.path().join("nested/v.mp4.srt").is_file());

    let events = events.into_inner().unwrap();
    let started: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::StageStarted { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(started.first(), Some(&"visual_composition"));
    assert_eq!(started.last(), Some(&"cleanup"));
    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::StageFinished {
            stage: "overlay_composition",
            outcome: StageOutcome::Skipped(_),
            ..
        }
    )));
}

#[test]
fn failed_encode_names_the_stage_and_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("v.mp4");
    let p = project(&out, SubtitleMode::Sidecar);

    let err = pipeline(Arc::new(FailingBackend))
        .render(&p, &SilentProgress)
        .unwrap_err();
    match err {
        StoryreelError::Pipeline { output, stage, source } => {
            assert_eq!(output, out);
            assert_eq!(stage, "encode");
            assert!(matches!(*source, StoryreelError::Provider { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!out.exists());
    assert!(!p.output.partial_path().exists());
    assert!(!dir.path().join("v.mp4.srt").exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn invalid_projects_are_rejected_before_any_stage() {
    let mut p = project(Path::new("v.mp4"), SubtitleMode::None);
    p.version = "9".to_string();
    let calls = Mutex::new(0usize);
    let sink = |_: &ProgressEvent| *calls.lock().unwrap() += 1;
    assert!(pipeline(Arc::new(WritingBackend)).render(&p, &sink).is_err());
    assert_eq!(*calls.lock().unwrap(), 0);
}
