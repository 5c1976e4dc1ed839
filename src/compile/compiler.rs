use std::path::PathBuf;

use crate::{
    assets::resolver::AssetResolver,
    compile::assembler::assemble_tracked,
    foundation::error::StoryreelResult,
    narration::generate::{durations, estimate_narration, generate_narration},
    narration::provider::NarrationProvider,
    preset::catalog::PresetRegistry,
    project::metadata::CompileMetadata,
    project::model::Project,
    script::model::Script,
    timing::scheduler::{SceneTiming, schedule, total_duration},
};

#[derive(Clone, Debug)]
/// Options for [`Compiler::compile`].
pub struct CompileOpts {
    /// Directory receiving generated narration audio.
    pub work_dir: PathBuf,
    /// Generate narration segments concurrently. Results keep script order either way.
    pub parallel_narration: bool,
}

impl Default for CompileOpts {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("storyreel-work"),
            parallel_narration: false,
        }
    }
}

#[derive(Clone, Debug)]
/// Result of a full compile.
pub struct CompileOutput {
    /// Render-ready project.
    pub project: Project,
    /// Informational summary.
    pub metadata: CompileMetadata,
}

/// Script-to-project front door: narration, scheduling and layer assembly.
///
/// Collaborators are injected once; the compiler keeps no state between calls.
pub struct Compiler {
    narration: Box<dyn NarrationProvider>,
    resolver: Box<dyn AssetResolver>,
    presets: PresetRegistry,
}

impl Compiler {
    /// Compiler using the given collaborators.
    pub fn new(
        narration: Box<dyn NarrationProvider>,
        resolver: Box<dyn AssetResolver>,
        presets: PresetRegistry,
    ) -> Self {
        Self {
            narration,
            resolver,
            presets,
        }
    }

    /// Preset registry used for layer assembly.
    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    /// Generate narration, schedule it and assemble the project.
    #[tracing::instrument(skip_all, fields(title = %script.title))]
    pub fn compile(&self, script: &Script, opts: &CompileOpts) -> StoryreelResult<CompileOutput> {
        script.validate()?;
        let narration = generate_narration(
            script,
            self.narration.as_ref(),
            &opts.work_dir,
            opts.parallel_narration,
        )?;
        let timings = schedule(script, &durations(&narration))?;
        let (project, images) = assemble_tracked(
            script,
            &timings,
            &narration,
            &self.presets,
            self.resolver.as_ref(),
        )?;

        let mut generated_asset_paths: Vec<PathBuf> = narration
            .iter()
            .flatten()
            .map(|r| r.audio_path.clone())
            .collect();
        for image in images {
            if !generated_asset_paths.contains(&image) {
                generated_asset_paths.push(image);
            }
        }

        let metadata = CompileMetadata {
            total_duration: total_duration(&timings),
            scene_timings: timings,
            generated_asset_paths,
        };
        tracing::info!(
            scenes = script.scenes.len(),
            segments = script.segment_count(),
            duration = metadata.total_duration,
            "compiled"
        );
        Ok(CompileOutput { project, metadata })
    }

    /// Dry run: schedule from duration estimates without generating audio or resolving assets.
    pub fn plan(&self, script: &Script) -> StoryreelResult<Vec<SceneTiming>> {
        script.validate()?;
        let estimates = estimate_narration(script, self.narration.as_ref())?;
        schedule(script, &estimates)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/compiler.rs"]
mod tests;
