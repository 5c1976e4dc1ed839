use super::*;

fn clip() -> ClipContext {
    ClipContext {
        frame: FrameSize::new(1920, 1080).unwrap(),
        duration: 4.0,
        fps: 30,
    }
}

#[test]
fn parse_effect_uses_defaults_and_validates_params() {
    assert_eq!(
        parse_effect(&EffectSpec::new("zoom_in")).unwrap(),
        Some(Effect::ZoomIn { amount: 0.15 })
    );
    assert_eq!(
        parse_effect(&EffectSpec::with_params(
            "Blur",
            serde_json::json!({ "sigma": 2.5 })
        ))
        .unwrap(),
        Some(Effect::Blur { sigma: 2.5 })
    );
    assert!(
        parse_effect(&EffectSpec::with_params(
            "fade_in",
            serde_json::json!({ "secs": -1.0 })
        ))
        .is_err()
    );
    assert!(
        parse_effect(&EffectSpec::with_params(
            "pan",
            serde_json::json!({ "zoom": 0.9 })
        ))
        .is_err()
    );
}

#[test]
fn unknown_effects_are_skipped_not_failed() {
    assert_eq!(parse_effect(&EffectSpec::new("sparkle")).unwrap(), None);
    let parsed = parse_effects(&[
        EffectSpec::new("sparkle"),
        EffectSpec::new("grayscale"),
    ])
    .unwrap();
    assert_eq!(parsed, vec![Effect::Grayscale]);
}

#[test]
fn fade_out_starts_before_clip_end() {
    let f = FfmpegEffectEngine::filter_for(&Effect::FadeOut { secs: 0.5 }, &clip());
    assert_eq!(f, "fade=t=out:st=3.500:d=0.500");
}

#[test]
fn zoom_in_targets_output_size() {
    let f = FfmpegEffectEngine::filter_for(&Effect::ZoomIn { amount: 0.2 }, &clip());
    assert!(f.starts_with("zoompan=z='min(1+0.2*on/120,1.2)'"));
    assert!(f.ends_with(":d=1:s=1920x1080:fps=30"));
}

#[test]
fn engine_chains_known_effects_into_one_filter() {
    let mut g = FilterGraph::new();
    let input = FilterGraph::video_of(0);
    let out = FfmpegEffectEngine
        .apply_effects(
            &mut g,
            input.clone(),
            &[EffectSpec::new("grayscale"), EffectSpec::new("unknown")],
            &clip(),
        )
        .unwrap();
    assert_ne!(out, input);
    assert_eq!(g.render(), "[0:v]hue=s=0[fx0]");

    let mut empty = FilterGraph::new();
    let same = FfmpegEffectEngine
        .apply_effects(&mut empty, input.clone(), &[], &clip())
        .unwrap();
    assert_eq!(same, input);
    assert!(empty.is_empty());
}
