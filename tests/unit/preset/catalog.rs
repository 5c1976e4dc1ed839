use super::*;

#[test]
fn builtins_are_registered_and_lookup_is_case_insensitive() {
    let reg = PresetRegistry::with_builtins();
    assert_eq!(
        reg.names(),
        vec!["cinematic", "documentary", "minimal", "social"]
    );
    assert_eq!(reg.get("Cinematic").unwrap(), &Preset::Cinematic);
    assert!(reg.get("vaporwave").is_err());
}

#[test]
fn scene_override_wins_over_script_default() {
    let reg = PresetRegistry::with_builtins();
    assert_eq!(
        reg.resolve(Some("social"), Some("cinematic")).unwrap(),
        &Preset::Social
    );
    assert_eq!(
        reg.resolve(None, Some("cinematic")).unwrap(),
        &Preset::Cinematic
    );
    assert_eq!(reg.resolve(None, None).unwrap().name(), DEFAULT_PRESET);
}

#[test]
fn builtin_capabilities_differ_per_preset() {
    assert_eq!(Preset::Minimal.transition().kind, "cut");
    assert!(Preset::Minimal.image_effects().is_empty());
    assert_eq!(
        Preset::Minimal.output_defaults().subtitle_mode,
        SubtitleMode::Sidecar
    );
    let social = Preset::Social.output_defaults();
    assert_eq!((social.width, social.height), (1080, 1920));
    assert_eq!(Preset::Cinematic.output_defaults().fps, 24);
    assert_eq!(Preset::Documentary.image_effects()[0].kind, "zoom_in");
}

#[test]
fn custom_presets_load_from_json() {
    let json = r#"[{
        "name": "Retro",
        "image_effects": [ { "kind": "grayscale" } ],
        "transition": { "kind": "dissolve", "duration_secs": 0.8 },
        "output_defaults": {
            "width": 1440, "height": 1080, "fps": 25,
            "video_codec": "libx264", "audio_codec": "aac",
            "video_bitrate": "5M", "audio_bitrate": "160k",
            "container": "mp4", "subtitle_mode": "none"
        }
    }]"#;
    let mut reg = PresetRegistry::with_builtins();
    assert_eq!(reg.load_custom_reader(json.as_bytes()).unwrap(), 1);

    let retro = reg.get("retro").unwrap();
    assert_eq!(retro.name(), "Retro");
    assert_eq!(retro.image_effects()[0].kind, "grayscale");
    assert!(retro.video_effects().is_empty());
    assert_eq!(retro.transition().duration_secs, 0.8);
    assert_eq!(retro.output_defaults().subtitle_mode, SubtitleMode::None);
    assert_eq!(retro.subtitle_style(), SubtitleStyle::default());
}

#[test]
fn force_style_uses_ass_colour_order() {
    let style = SubtitleStyle {
        primary_color: "#ff8800".to_string(),
        bold: true,
        ..SubtitleStyle::default()
    };
    let s = style.to_force_style().unwrap();
    assert!(s.contains("PrimaryColour=&H000088FF"));
    assert!(s.contains("OutlineColour=&H00000000"));
    assert!(s.ends_with("Bold=-1"));

    let bad = SubtitleStyle {
        primary_color: "white".to_string(),
        ..SubtitleStyle::default()
    };
    assert!(bad.to_force_style().is_err());
}
