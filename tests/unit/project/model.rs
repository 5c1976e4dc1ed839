use super::*;

fn defaults() -> OutputDefaults {
    OutputDefaults::default()
}

#[test]
fn aspect_ratio_reshapes_around_short_edge() {
    let wide = 
        OutputConfig::derive(&OutputSpec::with_aspect("w.mp4", "16:9"), &defaults()).unwrap();
    let tall = 
        OutputConfig::derive(&OutputSpec::with_aspect("t.mp4", "9:16"), &defaults()).unwrap();
    let square = 
        OutputConfig::derive(&OutputSpec::with_aspect("s.mp4", "1:1"), &defaults()).unwrap();
    let portrait = 
        OutputConfig::derive(&OutputSpec::with_aspect("p.mp4", "4:5"), &defaults()).unwrap();

    assert_eq!((wide.width, wide.height), (1920, 1080));
    assert_eq!((tall.width, tall.height), (1080, 1920));
    assert_eq!((square.width, square.height), (1080, 1080));
    assert_eq!((portrait.width, portrait.height), (1080, 1350));
    assert_eq!(tall.aspect_ratio.as_deref(), Some("9:16"));
}

#[test]
fn explicit_size_and_fields_win_over_defaults() {
    let spec = OutputSpec {
        width: Some(1280),
        height: Some(720),
        aspect_ratio: Some("9:16".to_string()),
        fps: Some(60),
        video_bitrate: Some("4M".to_string()),
        subtitle_mode: Some(SubtitleMode::Sidecar),
        ..OutputSpec::new("out/clip.MOV")
    };
    let cfg = OutputConfig::derive(&spec, &defaults()).unwrap();
    assert_eq!((cfg.width, cfg.height, cfg.fps), (1280, 720, 60));
    assert_eq!(cfg.video_bitrate, "4M");
    assert_eq!(cfg.audio_bitrate, "192k");
    assert_eq!(cfg.container, "mov");
    assert_eq!(cfg.subtitle_mode, SubtitleMode::Sidecar);
}

#[test]
fn output_spec_validation() {
    assert!(OutputSpec::new("").validate().is_err());
    assert!(OutputSpec::with_aspect("a.mp4", "wide").validate().is_err());
    let half = OutputSpec {
        width: Some(1280),
        ..OutputSpec::new("a.mp4")
    };
    assert!(half.validate().is_err());
    let odd = OutputSpec {
        width: Some(1281),
        height: Some(720),
        ..OutputSpec::new("a.mp4")
    };
    assert!(odd.validate().is_err());
}

#[test]
fn partial_and_sidecar_paths_are_siblings() {
    let cfg = OutputConfig::derive(&OutputSpec::new("out/video.mp4"), &defaults()).unwrap();
    assert_eq!(cfg.partial_path(), PathBuf::from("out/.video.mp4.partial"));
    assert_eq!(cfg.sidecar_path(), PathBuf::from("out/video.mp4.srt"));
}

#[test]
fn sidecars_differ_for_outputs_sharing_a_stem() {
    let mp4 = OutputConfig::derive(&OutputSpec::new("out/reel.mp4"), &defaults()).unwrap();
    let mkv = OutputConfig::derive(&OutputSpec::new("out/reel.mkv"), &defaults()).unwrap();
    assert_ne!(mp4.sidecar_path(), mkv.sidecar_path());
    assert_eq!(mkv.sidecar_path(), PathBuf::from("out/reel.mkv.srt"));
}

fn layer(start: f64, end: f64) -> VisualLayer {
    VisualLayer {
        scene_index: 0,
        source: PathBuf::from("a.png"),
        kind: VisualKind::Image,
        start,
        end,
        effects: Vec::new(),
        transition: None,
        keep_audio: false,
    }
}

fn timeline(layers: Vec<VisualLayer>, duration: f64) -> Timeline {
    Timeline {
        duration,
        visual_layers: layers,
        audio_layers: Vec::new(),
        subtitle_layers: Vec::new(),
        overlay_layers: Vec::new(),
    }
}

#[test]
fn timeline_rejects_overlapping_or_out_of_range_layers() {
    assert!(timeline(vec![layer(0.0, 3.0), layer(3.5, 6.8)], 6.8).validate().is_ok());
    assert!(timeline(vec![layer(0.0, 3.0), layer(2.5, 6.8)], 6.8).validate().is_err());
    assert!(timeline(vec![layer(0.0, 7.0)], 6.8).validate().is_err());
    assert!(timeline(vec![layer(2.0, 1.0)], 6.8).validate().is_err());
}

#[test]
fn with_output_is_an_independent_copy() {
    let primary = 
        OutputConfig::derive(&OutputSpec::with_aspect("a.mp4", "16:9"), &defaults()).unwrap();
    let vertical = 
        OutputConfig::derive(&OutputSpec::with_aspect("b.mp4", "9:16"), &defaults()).unwrap();
    let project = Project {
        version: PROJECT_VERSION.to_string(),
        title: "T".to_string(),
        output: primary.clone(),
        outputs: vec![primary.clone(), vertical.clone()],
        timeline: timeline(vec![layer(0.0, 1.0)], 1.0),
    };

    let mut copy = project.with_output(vertical.clone());
    copy.timeline.visual_layers[0].end = 0.5;
    assert_eq!(copy.output, vertical);
    assert_eq!(copy.outputs, vec![vertical]);
    assert_eq!(project.timeline.visual_layers[0].end, 1.0);
    assert_eq!(project.output, primary);
}

#[test]
fn project_version_must_match() {
    let cfg = OutputConfig::derive(&OutputSpec::new("a.mp4"), &defaults()).unwrap();
    let mut project = Project {
        version: "1".to_string(),
        title: "T".to_string(),
        output: cfg.clone(),
        outputs: vec![cfg],
        timeline: timeline(Vec::new(), 0.0),
    };
    assert!(project.validate().is_ok());
    project.version = "2".to_string();
    assert!(project.validate().is_err());
}
