use super::*;

fn visual(path: Option<&str>, prompt: Option<&str>) -> VisualSpec {
    VisualSpec {
        path: path.map(str::to_string),
        prompt: prompt.map(str::to_string),
        ..VisualSpec::default()
    }
}

#[test]
fn direct_paths_resolve_with_inferred_kind() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.png"), b"x").unwrap();
    std::fs::write(dir.path().join("b.MP4"), b"x").unwrap();
    let r = FileAssetResolver::new(dir.path());

    let a = r.resolve(&visual(Some("a.png"), None)).unwrap();
    assert_eq!(a.kind, VisualKind::Image);
    assert!(!a.generated);
    assert_eq!(
        r.resolve(&visual(Some("b.MP4"), None)).unwrap().kind,
        VisualKind::Video
    );
}

#[test]
fn missing_file_and_empty_visual_are_resolution_errors() {
    let dir = tempfile::tempdir().unwrap();
    let r = FileAssetResolver::new(dir.path());
    assert!(matches!(
        r.resolve(&visual(Some("nope.png"), None)).unwrap_err(),
        StoryreelError::Resolution { .. }
    ));
    assert!(matches!(
        r.resolve(&visual(None, None)).unwrap_err(),
        StoryreelError::Resolution { .. }
    ));
    assert!(matches!(
        r.resolve(&visual(None, Some("sunset"))).unwrap_err(),
        StoryreelError::Resolution { .. }
    ));
}

#[test]
fn lenient_resolver_skips_existence_but_not_kind() {
    let r = FileAssetResolver::new("/nowhere").lenient();
    assert!(r.resolve(&visual(Some("clip.mov"), None)).is_ok());
    assert!(r.resolve(&visual(Some("notes.txt"), None)).is_err());
    let mut forced = visual(Some("notes.txt"), None);
    forced.kind = Some(VisualKind::Image);
    assert!(r.resolve(&forced).is_ok());
}

#[test]
fn prompts_use_the_placeholder_generator() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::open(dir.path().join("cache")).unwrap();
    let size = FrameSize::new(32, 18).unwrap();
    let r = FileAssetResolver::new(dir.path())
        .with_generator(Box::new(PlaceholderImageGenerator::new(cache, size)));

    let a = r.resolve(&visual(None, Some("a quiet harbour"))).unwrap();
    let b = r.resolve(&visual(None, Some("a quiet harbour"))).unwrap();
    assert!(a.generated);
    assert_eq!(a.kind, VisualKind::Image);
    assert_eq!(a.path, b.path);

    let img = image::open(&a.path).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (32, 18));
    assert_eq!(
        img.get_pixel(0, 0).0,
        PlaceholderImageGenerator::color_for("a quiet harbour")
    );
}

#[test]
fn generated_images_are_committed_through_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::open(dir.path().join("cache")).unwrap();
    let size = FrameSize::new(8, 8).unwrap();
    let generator = PlaceholderImageGenerator::new(cache.clone(), size);

    let path = generator.generate("lighthouse at dusk").unwrap();
    let key = cache_key("placeholder-image", &("lighthouse at dusk", size)).unwrap();
    assert_eq!(path, cache.path_for(&key, "png"));
    assert!(cache.contains(&key, "png"));

    let names: Vec<String> = std::fs::read_dir(dir.path().join("cache"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![format!("{key}.png")]);
}

struct BrokenGenerator;

impl ImageGenerator for BrokenGenerator {
    fn generate(&self, _prompt: &str) -> StoryreelResult<PathBuf> {
        Err(StoryreelError::Other(anyhow::anyhow!("backend offline")))
    }
}

#[test]
fn generator_failures_surface_as_provider_errors_with_scene() {
    let r = FileAssetResolver::new("/nowhere").with_generator(Box::new(BrokenGenerator));
    let err = r
        .resolve(&visual(None, Some("storm front")))
        .unwrap_err()
        .at_scene(2);
    match err {
        StoryreelError::Provider { scene, message, .. } => {
            assert_eq!(scene, Some(2));
            assert!(message.contains("storm front"));
            assert!(message.contains("backend offline"));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}
