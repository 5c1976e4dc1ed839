use super::*;

#[test]
fn chains_are_joined_in_append_order() {
    let mut g = FilterGraph::new();
    let a = g.add_input(MediaInput::file("a.mp4"));
    let b = g.add_input(MediaInput::looped_image("b.png", 2.0, 30));
    assert_eq!((a, b), (0, 1));

    let va = g.chain(&FilterGraph::video_of(a), "scale=1920:1080", "v");
    let vb = g.chain(&FilterGraph::video_of(b), "scale=1920:1080", "v");
    let out = g.fresh("v");
    g.push(&[&va, &vb], "concat=n=2:v=1:a=0", &out);

    assert_eq!(
        g.render(),
        "[0:v]scale=1920:1080[v0];[1:v]scale=1920:1080[v1];[v0][v1]concat=n=2:v=1:a=0[v2]"
    );
    assert_eq!(
        g.inputs()[1].pre_args,
        vec!["-loop", "1", "-framerate", "30", "-t", "2.000"]
    );
}

#[test]
fn labels_render_with_brackets() {
    assert_eq!(FilterGraph::audio_of(3).to_string(), "[3:a]");
    assert_eq!(StreamLabel::new("mix").name(), "mix");
    assert!(FilterGraph::new().is_empty());
}
