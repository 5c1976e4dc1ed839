use super::*;

#[test]
fn parse_transition_accepts_aliases_and_directions() {
    assert_eq!(
        parse_transition(&TransitionSpec::new("Crossfade", 0.5)).unwrap(),
        TransitionKind::Crossfade
    );
    assert_eq!(
        parse_transition(&TransitionSpec::new("fade-black", 0.5)).unwrap(),
        TransitionKind::FadeBlack
    );

    let wipe = TransitionSpec {
        kind: "wipe".to_string(),
        duration_secs: 0.4,
        params: serde_json::json!({ "dir": "ltr" }),
    };
    assert_eq!(
        parse_transition(&wipe).unwrap(),
        TransitionKind::Wipe {
            dir: SlideDir::Right
        }
    );
    assert_eq!(
        parse_transition(&TransitionSpec::new("slide", 0.4)).unwrap(),
        TransitionKind::Slide {
            dir: SlideDir::Left
        }
    );
}

#[test]
fn parse_transition_rejects_unknown_kind_and_dir() {
    assert!(parse_transition(&TransitionSpec::new("spin", 0.5)).is_err());
    let bad = TransitionSpec {
        kind: "wipe".to_string(),
        duration_secs: 0.5,
        params: serde_json::json!({ "dir": "diagonal" }),
    };
    assert!(parse_transition(&bad).is_err());
}

#[test]
fn xfade_names_match_ffmpeg() {
    assert_eq!(TransitionKind::Cut.xfade_name(), None);
    assert_eq!(
        TransitionKind::Crossfade.xfade_name().as_deref(),
        Some("fade")
    );
    assert_eq!(
        TransitionKind::Slide { dir: SlideDir::Up }
            .xfade_name()
            .as_deref(),
        Some("slideup")
    );
}

#[test]
fn overlap_is_clamped_to_half_of_either_neighbour() {
    assert_eq!(clamp_overlap(1.0, 4.0, 4.0), 1.0);
    assert_eq!(clamp_overlap(1.0, 1.0, 4.0), 0.5);
    assert_eq!(clamp_overlap(1.0, 4.0, 0.6), 0.3);
    assert_eq!(clamp_overlap(-1.0, 4.0, 4.0), 0.0);
}
