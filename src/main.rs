use assetaudit::analysis::{Orchestrator, PassKind, Stage};
use assetaudit::config::{Config, TextureScope};
use assetaudit::project::UnityProject;
use assetaudit::report::{ReportFormat, Reporter};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// assetaudit - Find unused, oversized and duplicate assets in Unity projects
#[derive(Parser, Debug)]
#[command(name = "assetaudit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the Unity project (the directory containing Assets/)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Passes to run (can be specified multiple times, default: all)
    #[arg(short, long = "pass", value_enum)]
    passes: Vec<PassKind>,

    /// Patterns of assets never reported (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Patterns of assets always treated as used (can be specified multiple times)
    #[arg(short, long)]
    retain: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<ReportFormat>,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Which textures the texture pass inspects
    #[arg(long, value_enum)]
    texture_scope: Option<TextureScope>,

    /// Maximum number of objects in a scene
    #[arg(long)]
    object_threshold: Option<u32>,

    /// Maximum number of realtime shadow-casting lights in a scene
    #[arg(long)]
    light_threshold: Option<u32>,

    /// Maximum number of materials on one renderer
    #[arg(long)]
    material_threshold: Option<u32>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,

    /// Do not draw progress bars
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("assetaudit v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&cli)?;

    run_audit(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations
        Config::from_default_locations(&cli.path)?
    };

    // Override with CLI arguments
    if !cli.passes.is_empty() {
        config.passes = cli.passes.clone();
    }
    if !cli.exclude.is_empty() {
        config.exclude.extend(cli.exclude.clone());
    }
    if !cli.retain.is_empty() {
        config.retain_patterns.extend(cli.retain.clone());
    }
    if let Some(format) = cli.format {
        config.report.format = format;
    }
    if let Some(scope) = cli.texture_scope {
        config.textures.scope = scope;
    }
    if let Some(limit) = cli.object_threshold {
        config.thresholds.scene_object_count = limit;
    }
    if let Some(limit) = cli.light_threshold {
        config.thresholds.realtime_shadow_lights = limit;
    }
    if let Some(limit) = cli.material_threshold {
        config.thresholds.materials_per_renderer = limit;
    }

    Ok(config)
}

fn run_audit(config: &Config, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();

    info!("Opening project at {}...", cli.path.display());
    let project = UnityProject::open(&cli.path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to open project {}", cli.path.display()))?;

    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix:.cyan.bold} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
        .into_diagnostic()?
        .progress_chars("#>-");

    let show_progress = !cli.no_progress && !cli.quiet;
    let mut current: Option<(Stage, ProgressBar)> = None;

    let orchestrator = Orchestrator::from_config(config);
    let result = orchestrator.run(&project, |stage, fraction, status| {
        if !show_progress {
            return;
        }
        if current.as_ref().map(|(s, _)| *s != stage).unwrap_or(true) {
            if let Some((_, pb)) = current.take() {
                pb.finish_and_clear();
            }
            let pb = ProgressBar::new(100);
            pb.set_style(style.clone());
            pb.set_prefix(stage.to_string());
            current = Some((stage, pb));
        }
        if let Some((_, pb)) = &current {
            pb.set_position((fraction * 100.0).round() as u64);
            pb.set_message(status.to_string());
        }
    });
    if let Some((_, pb)) = current.take() {
        pb.finish_and_clear();
    }

    let audit = result
        .into_diagnostic()
        .wrap_err("Project snapshot is unavailable")?;

    let reporter = Reporter::new(config.report.format, cli.output.clone())
        .with_success_lines(config.report.show_success);
    reporter.report(&audit)?;

    if config.report.format == ReportFormat::Terminal && !cli.quiet {
        println!(
            "{}",
            format!(
                "Audited {} passes in {:.2}s",
                audit.passes.len(),
                start_time.elapsed().as_secs_f64()
            )
            .dimmed()
        );
    }

    Ok(())
}
