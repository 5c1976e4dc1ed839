use super::*;

fn scene_with(narration: &[&str], duration: Option<f64>) -> Scene {
    Scene {
        narration: narration
            .iter()
            .map(|t| NarrationSegment {
                text: t.to_string(),
                pause_after: None,
            })
            .collect(),
        visual: VisualSpec {
            path: Some("a.png".to_string()),
            ..VisualSpec::default()
        },
        duration,
        pause_after: None,
        preset: None,
        transition: None,
    }
}

fn script_with(scenes: Vec<Scene>) -> Script {
    Script {
        title: "t".to_string(),
        scenes,
        voice: VoiceConfig::default(),
        timing: TimingConfig::default(),
        bgm: None,
        preset: None,
        outputs: Vec::new(),
        overlays: Vec::new(),
    }
}

#[test]
fn narration_less_scene_requires_positive_duration() {
    assert!(script_with(vec![scene_with(&[], Some(3.0))]).validate().is_ok());
    assert!(script_with(vec![scene_with(&[], None)]).validate().is_err());
    assert!(script_with(vec![scene_with(&[], Some(0.0))]).validate().is_err());
    assert!(
        script_with(vec![scene_with(&[], Some(f64::INFINITY))])
            .validate()
            .is_err()
    );
}

#[test]
fn narrated_scene_must_not_carry_duration() {
    assert!(script_with(vec![scene_with(&["hi"], None)]).validate().is_ok());
    let err = script_with(vec![scene_with(&["hi"], Some(2.0))])
        .validate()
        .unwrap_err();
    assert!(matches!(err, StoryreelError::Validation(_)));
}

#[test]
fn empty_text_and_negative_gaps_are_rejected() {
    assert!(script_with(vec![scene_with(&["  "], None)]).validate().is_err());

    let mut scene = scene_with(&["hi"], None);
    scene.narration[0].pause_after = Some(-0.1);
    assert!(script_with(vec![scene]).validate().is_err());

    let mut script = script_with(vec![scene_with(&["hi"], None)]);
    script.timing.default_scene_gap = -1.0;
    assert!(script.validate().is_err());
}

#[test]
fn empty_script_is_rejected() {
    assert!(script_with(Vec::new()).validate().is_err());
}

#[test]
fn gap_resolution_treats_zero_as_unset_by_default() {
    let t = TimingConfig::default();
    assert_eq!(t.segment_gap(None), 0.3);
    assert_eq!(t.segment_gap(Some(0.0)), 0.3);
    assert_eq!(t.segment_gap(Some(1.0)), 1.0);
    assert_eq!(t.scene_gap(Some(0.0)), 0.5);

    let explicit = TimingConfig {
        explicit_zero_gap: true,
        ..TimingConfig::default()
    };
    assert_eq!(explicit.segment_gap(Some(0.0)), 0.0);
    assert_eq!(explicit.scene_gap(None), 0.5);
}

#[test]
fn from_reader_applies_defaults_and_validates() {
    let json = r#"{
        "title": "Demo",
        "scenes": [
            { "visual": { "path": "intro.png" }, "duration": 3.0 },
            { "narration": [ { "text": "Hello there." } ], "visual": { "prompt": "sunrise" } }
        ]
    }"#;
    let script = Script::from_reader(json.as_bytes()).unwrap();
    assert_eq!(script.voice.provider, "stub");
    assert_eq!(script.timing, TimingConfig::default());
    assert_eq!(script.segment_count(), 1);

    let bad = r#"{ "title": "Demo", "scenes": [ { "visual": {} } ] }"#;
    assert!(Script::from_reader(bad.as_bytes()).is_err());
}
