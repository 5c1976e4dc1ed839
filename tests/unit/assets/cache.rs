use super::*;

#[test]
fn cache_key_is_stable_and_input_sensitive() {
    let a = cache_key("narration", &("hello", 1.0)).unwrap();
    let b = cache_key("narration", &("hello", 1.0)).unwrap();
    let c = cache_key("narration", &("hello", 1.1)).unwrap();
    let d = cache_key("image", &("hello", 1.0)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
    assert_eq!(a.len(), 16);
}

#[test]
fn put_then_get_returns_stored_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::open(dir.path().join("cache")).unwrap();

    assert_eq!(cache.get("abc", "wav").unwrap(), None);
    let path = cache.put("abc", "wav", b"RIFF").unwrap();
    assert_eq!(path, cache.path_for("abc", "wav"));
    assert!(cache.contains("abc", "wav"));
    assert_eq!(cache.get("abc", "wav").unwrap().as_deref(), Some(&b"RIFF"[..]));
}

#[test]
fn concurrent_writers_of_one_key_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::open(dir.path()).unwrap();

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..50 {
                    cache.put("same", "wav", b"RIFF-same").unwrap();
                }
            });
        }
    });

    assert_eq!(cache.get("same", "wav").unwrap().as_deref(), Some(&b"RIFF-same"[..]));
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["same.wav".to_string()]);
}
