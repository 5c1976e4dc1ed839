use super::*;
use crate::timing::scheduler::SegmentTiming;

#[test]
fn save_writes_pretty_json_that_parses_back() {
    let dir = tempfile::tempdir().unwrap();
    let meta = CompileMetadata {
        total_duration: 4.25,
        scene_timings: vec![SceneTiming {
            scene_index: 0,
            start: 0.0,
            end: 4.25,
            segments: vec![SegmentTiming {
                segment_index: 0,
                start: 0.0,
                end: 4.25,
            }],
        }],
        generated_asset_paths: vec![PathBuf::from("work/narration/scene000_seg000.wav")],
    };
    let path = dir.path().join("nested/meta.json");
    meta.save(&path).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains('\n'));
    let back: CompileMetadata = serde_json::from_str(&raw).unwrap();
    assert_eq!(back, meta);
}
