use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use robot_snapshots::{
    CancelToken, ExportPipeline, Grammar, RenderSettings, SampleSpec, SubgraphRewriter, load_log,
    task_by_name,
};
use tracing_subscriber::EnvFilter;

/// Render PNG snapshots of robot designs from a design-search log.
#[derive(Parser, Debug)]
#[command(name = "robot-snapshots", version)]
struct Cli {
    /// Task providing the terrain, e.g. FlatTerrainTask.
    task: String,

    /// Grammar JSON file the designs were derived from.
    grammar_file: PathBuf,

    /// Number of entries to render concurrently.
    #[arg(short = 'j', long, default_value_t = 1)]
    jobs: usize,

    /// Search log CSV with `rule_seq` and `result` columns.
    #[arg(short = 'f', long = "log_file")]
    log_file: PathBuf,

    /// Sampling mode: iterations, iterations_top, percentiles or terrain.
    #[arg(short = 't', long = "type")]
    sample_type: String,

    /// Directory the images are written to.
    #[arg(short = 's', long = "save_image_dir")]
    save_image_dir: PathBuf,

    /// Image width in pixels (overrides the render config).
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels (overrides the render config).
    #[arg(long)]
    height: Option<u32>,

    /// JSON file with render settings.
    #[arg(long = "render_config")]
    render_config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `robot_snapshots=debug`. Falls back to RUST_LOG.
    #[arg(long = "log_level")]
    log_level: Option<String>,
}

fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("bad log level '{level}'"))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let task = task_by_name(&cli.task)?;
    let spec = SampleSpec::parse(&cli.sample_type, &cli.task)?;
    let grammar = Grammar::load(&cli.grammar_file)
        .with_context(|| format!("load grammar {}", cli.grammar_file.display()))?;
    let log = load_log(&cli.log_file)
        .with_context(|| format!("load search log {}", cli.log_file.display()))?;

    let mut settings = match &cli.render_config {
        Some(path) => RenderSettings::load(path)?,
        None => RenderSettings::default(),
    };
    if let Some(width) = cli.width {
        settings.width = width;
    }
    if let Some(height) = cli.height {
        settings.height = height;
    }

    // Ctrl-C lets the entries in flight finish and skips the rest.
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("interrupted, stopping after the current entries");
        on_interrupt.cancel();
    })
    .context("install Ctrl-C handler")?;

    let pipeline = ExportPipeline::new(&grammar, SubgraphRewriter::default(), task.as_ref())
        .with_settings(settings)
        .with_jobs(cli.jobs)
        .with_cancel(cancel);
    let report = pipeline
        .run(&log, &spec, &cli.save_image_dir)
        .context("export snapshots")?;

    eprintln!(
        "wrote {} image(s) to {}",
        report.written.len(),
        cli.save_image_dir.display()
    );
    if !report.failures.is_empty() {
        eprintln!("skipped {} entr(ies):", report.failures.len());
        for failure in &report.failures {
            eprintln!("  {}: {}", failure.label, failure.error);
        }
    }
    if report.cancelled > 0 {
        eprintln!("cancelled {} entr(ies) before they started", report.cancelled);
    }
    Ok(())
}
