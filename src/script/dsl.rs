use crate::{
    effects::transitions::TransitionSpec,
    foundation::error::StoryreelResult,
    project::model::OutputSpec,
    script::model::{
        BgmConfig, NarrationSegment, OverlaySpec, Scene, Script, TimingConfig, VisualKind,
        VisualSpec, VoiceConfig,
    },
};

/// Builder for [`Script`](crate::Script).
pub struct ScriptBuilder {
    title: String,
    scenes: Vec<Scene>,
    voice: VoiceConfig,
    timing: TimingConfig,
    bgm: Option<BgmConfig>,
    preset: Option<String>,
    outputs: Vec<OutputSpec>,
    overlays: Vec<OverlaySpec>,
}

impl ScriptBuilder {
    /// Create a builder for a new script.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            scenes: Vec::new(),
            voice: VoiceConfig::default(),
            timing: TimingConfig::default(),
            bgm: None,
            preset: None,
            outputs: Vec::new(),
            overlays: Vec::new(),
        }
    }

    /// Replace the voice configuration.
    pub fn voice(mut self, voice: VoiceConfig) -> Self {
        self.voice = voice;
        self
    }

    /// Replace the timing configuration.
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set background music.
    pub fn bgm(mut self, bgm: BgmConfig) -> Self {
        self.bgm = Some(bgm);
        self
    }

    /// Set the default preset.
    pub fn preset(mut self, name: impl Into<String>) -> Self {
        self.preset = Some(name.into());
        self
    }

    /// Append an output target.
    pub fn output(mut self, spec: OutputSpec) -> Self {
        self.outputs.push(spec);
        self
    }

    /// Append an overlay layer.
    pub fn overlay(mut self, overlay: OverlaySpec) -> Self {
        self.overlays.push(overlay);
        self
    }

    /// Append a scene.
    pub fn scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self
    }

    /// Build and validate the final [`Script`](crate::Script).
    pub fn build(self) -> StoryreelResult<Script> {
        let script = Script {
            title: self.title,
            scenes: self.scenes,
            voice: self.voice,
            timing: self.timing,
            bgm: self.bgm,
            preset: self.preset,
            outputs: self.outputs,
            overlays: self.overlays,
        };
        script.validate()?;
        Ok(script)
    }
}

/// Builder for [`Scene`](crate::Scene) values.
pub struct SceneBuilder {
    narration: Vec<NarrationSegment>,
    visual: VisualSpec,
    duration: Option<f64>,
    pause_after: Option<f64>,
    preset: Option<String>,
    transition: Option<TransitionSpec>,
}

impl SceneBuilder {
    /// Scene showing the file at `path`.
    pub fn with_path(path: impl Into<String>) -> Self {
        Self::with_visual(VisualSpec {
            path: Some(path.into()),
            ..VisualSpec::default()
        })
    }

    /// Scene whose visual is generated from `prompt`.
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self::with_visual(VisualSpec {
            prompt: Some(prompt.into()),
            ..VisualSpec::default()
        })
    }

    /// Scene with an explicit visual spec.
    pub fn with_visual(visual: VisualSpec) -> Self {
        Self {
            narration: Vec::new(),
            visual,
            duration: None,
            pause_after: None,
            preset: None,
            transition: None,
        }
    }

    /// Append a narration segment using the default gap.
    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.narration.push(NarrationSegment {
            text: text.into(),
            pause_after: None,
        });
        self
    }

    /// Append a narration segment followed by an explicit gap.
    pub fn say_then_pause(mut self, text: impl Into<String>, pause_after: f64) -> Self {
        self.narration.push(NarrationSegment {
            text: text.into(),
            pause_after: Some(pause_after),
        });
        self
    }

    /// Explicit duration for a scene without narration.
    pub fn duration(mut self, secs: f64) -> Self {
        self.duration = Some(secs);
        self
    }

    /// Gap after the scene.
    pub fn pause_after(mut self, secs: f64) -> Self {
        self.pause_after = Some(secs);
        self
    }

    /// Preset override.
    pub fn preset(mut self, name: impl Into<String>) -> Self {
        self.preset = Some(name.into());
        self
    }

    /// Transition override into this scene.
    pub fn transition(mut self, transition: TransitionSpec) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Force the visual media type.
    pub fn kind(mut self, kind: VisualKind) -> Self {
        self.visual.kind = Some(kind);
        self
    }

    /// Keep the clip's own audio in the mix.
    pub fn keep_audio(mut self, keep: bool) -> Self {
        self.visual.keep_audio = keep;
        self
    }

    /// Finish the scene. Validation happens in [`ScriptBuilder::build`].
    pub fn build(self) -> Scene {
        Scene {
            narration: self.narration,
            visual: self.visual,
            duration: self.duration,
            pause_after: self.pause_after,
            preset: self.preset,
            transition: self.transition,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/dsl.rs"]
mod tests;
