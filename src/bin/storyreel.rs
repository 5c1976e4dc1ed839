use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a script into a project document.
    Compile(CompileArgs),
    /// Print the scene schedule from duration estimates, without generating anything.
    Estimate(EstimateArgs),
    /// Render a project document (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Input script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output project JSON path.
    #[arg(long)]
    out: PathBuf,

    /// Directory for generated narration and the content cache.
    #[arg(long, default_value = "storyreel-work")]
    work_dir: PathBuf,

    /// Write compile metadata JSON to this path.
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Extra preset definitions (JSON object or array).
    #[arg(long)]
    presets: Option<PathBuf>,

    /// Generate narration segments in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Bypass the narration cache.
    #[arg(long, default_value_t = false)]
    no_cache: bool,
}

#[derive(Parser, Debug)]
struct EstimateArgs {
    /// Input script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Extra output as `ASPECT=PATH` (for example `9:16=out/vertical.mp4`). Repeatable.
    #[arg(long = "variant")]
    variants: Vec<String>,

    /// Render only the project's primary output.
    #[arg(long, default_value_t = false)]
    primary_only: bool,

    /// Maximum number of outputs rendered at once.
    #[arg(long, default_value_t = 2)]
    workers: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::Estimate(args) => cmd_estimate(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn assets_root(script: &Path) -> &Path {
    script.parent().unwrap_or_else(|| Path::new("."))
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let script = storyreel::Script::from_path(&args.in_path)?;
    let cache = storyreel::ContentCache::open(args.work_dir.join("cache"))?;

    let registry = storyreel::NarrationRegistry::with_builtins();
    let mut provider = registry.create(&script.voice.provider)?;
    if !args.no_cache {
        provider = Box::new(storyreel::CachingNarrationProvider::new(
            provider,
            cache.clone(),
        ));
    }

    let generator =
        storyreel::PlaceholderImageGenerator::new(cache, storyreel::FrameSize::new(1920, 1080)?);
    let resolver = storyreel::FileAssetResolver::new(assets_root(&args.in_path))
        .with_generator(Box::new(generator));

    let mut presets = storyreel::PresetRegistry::with_builtins();
    if let Some(path) = &args.presets {
        let n = presets.load_custom_path(path)?;
        tracing::info!(count = n, path = %path.display(), "loaded custom presets");
    }

    let compiler = storyreel::Compiler::new(provider, Box::new(resolver), presets);
    let opts = storyreel::CompileOpts {
        work_dir: args.work_dir.clone(),
        parallel_narration: args.parallel,
    };
    let out = compiler.compile(&script, &opts)?;

    out.project.save(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    if let Some(path) = &args.metadata {
        out.metadata.save(path)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_estimate(args: EstimateArgs) -> anyhow::Result<()> {
    let script = storyreel::Script::from_path(&args.in_path)?;
    let provider = storyreel::NarrationRegistry::with_builtins().create(&script.voice.provider)?;
    let estimates = storyreel::estimate_narration(&script, provider.as_ref())?;
    let timings = storyreel::schedule(&script, &estimates)?;

    let report = serde_json::json!({
        "total_duration": storyreel::total_duration(&timings),
        "scene_timings": timings,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize estimate")?
    );
    Ok(())
}

fn parse_variant(raw: &str) -> anyhow::Result<(String, PathBuf)> {
    let (aspect, path) = raw
        .split_once('=')
        .with_context(|| format!("variant '{raw}' must look like ASPECT=PATH"))?;
    anyhow::ensure!(!path.trim().is_empty(), "variant '{raw}' has an empty path");
    Ok((aspect.trim().to_string(), PathBuf::from(path.trim())))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        storyreel::is_ffmpeg_on_path(),
        "ffmpeg not found on PATH; install ffmpeg to render"
    );
    let project = storyreel::Project::from_path(&args.project)?;
    let pipeline = storyreel::RenderPipeline::ffmpeg();

    let mut outputs = if args.primary_only {
        vec![project.output.clone()]
    } else {
        project.outputs.clone()
    };
    for raw in &args.variants {
        let (aspect, path) = parse_variant(raw)?;
        outputs.push(storyreel::output_for_aspect(&project.output, path, &aspect)?);
    }

    if outputs.len() == 1 && outputs[0] == project.output {
        let path = pipeline.render(&project, &storyreel::TracingProgress)?;
        eprintln!("wrote {}", path.display());
        return Ok(());
    }

    let opts = storyreel::OrchestratorOpts {
        max_workers: args.workers,
        cancel: None,
    };
    let paths = storyreel::render_all(
        &pipeline,
        &project,
        &outputs,
        &opts,
        &storyreel::TracingProgress,
    )?;
    for path in paths {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}
