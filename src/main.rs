use anyhow::Context as _;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use rules_normalizer::constants::{CONFIG_FILE_NAME, REPORT_FILE_NAME};
use rules_normalizer::observability::metrics;
use rules_normalizer::storage::FsStorage;
use rules_normalizer::{logging, FileConfig, Orchestrator, RunConfig, RunReport};

#[derive(Parser, Debug)]
#[command(name = "rules-normalizer")]
#[command(about = "Normalize legacy rules content files into canonical effects")]
#[command(version)]
struct Cli {
    /// Input directories to scan (comma-separated), relative to --root
    #[arg(value_delimiter = ',')]
    input_dirs: Vec<String>,

    /// Output directory, relative to --root
    #[arg(long)]
    out: Option<String>,

    /// Directory that input and output paths are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to normalize.toml in --root, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Source label applied to effects that declare none
    #[arg(long)]
    source: Option<String>,

    /// Also write JSON logs to a daily rolling file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Write Prometheus text-format metrics here when the run ends
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

impl Cli {
    fn run_config(&self) -> anyhow::Result<RunConfig> {
        let file_config = match &self.config {
            Some(path) => FileConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => FileConfig::load_optional(&self.root.join(CONFIG_FILE_NAME))?,
        };

        let mut config = RunConfig::with_root(&self.root).merge_file(file_config);
        let dirs: Vec<String> = self
            .input_dirs
            .iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        if !dirs.is_empty() {
            config.input_dirs = dirs;
        }
        if let Some(out) = &self.out {
            config.out_dir = out.clone();
        }
        if self.source.is_some() {
            config.source = self.source.clone();
        }
        Ok(config)
    }
}

fn run(cli: &Cli) -> anyhow::Result<(RunReport, PathBuf)> {
    let config = cli.run_config()?;
    info!("Input dirs: {}", config.input_dirs.join(", "));
    let report_path = config.out_root().join(REPORT_FILE_NAME);

    let orchestrator = Orchestrator::new(config, Arc::new(FsStorage::new()));
    let report = orchestrator.run().context("normalization run failed")?;

    if let Some(path) = &cli.metrics_file {
        match metrics::render() {
            Some(body) => fs::write(path, body)
                .with_context(|| format!("writing metrics to {}", path.display()))?,
            None => warn!("Metrics recorder not installed; skipping {}", path.display()),
        }
    }
    Ok((report, report_path))
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _guard = logging::init_logging(cli.log_dir.as_deref());

    if let Err(e) = metrics::init() {
        warn!("Metrics disabled: {}", e);
    }

    match run(&cli) {
        Ok((report, report_path)) => {
            println!(
                "📊 files: {}, normalized: {}, warnings: {}, errors: {}, report: {}",
                report.stats.files,
                report.stats.normalized_files,
                report.warnings.len(),
                report.errors.len(),
                report_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::from(2)
        }
    }
}
