use super::*;
use std::sync::Mutex;

#[test]
fn closures_act_as_progress_sinks() {
    let seen = Mutex::new(Vec::new());
    let sink = |e: &ProgressEvent| seen.lock().unwrap().push(e.clone());
    sink.notify(&ProgressEvent::RenderStarted { units: 2 });
    SilentProgress.notify(&ProgressEvent::RenderStarted { units: 3 });
    TracingProgress.notify(&ProgressEvent::RenderStarted { units: 4 });
    assert_eq!(
        seen.into_inner().unwrap(),
        vec![ProgressEvent::RenderStarted { units: 2 }]
    );
}
