use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cylinder_cli::{list_images, MatchConfig, Orchestrator, Report};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

/// Compare every fingerprint in a directory with every other one using cylinder codes
#[derive(Parser, Debug)]
#[command(name = "cylmatch", version)]
struct Cli {
    /// Directory holding the fingerprint images
    #[arg(default_value = "samples")]
    dir: PathBuf,

    /// Extension of the files to compare
    #[arg(short, long, default_value = "bmp")]
    extension: String,

    /// Where to write the similarity report
    #[arg(short, long, default_value = "cylinder_codes.txt")]
    output: PathBuf,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    threads: Option<usize>,

    /// TOML file with matching parameters
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<MatchConfig> {
    let mut cfg = match &cli.config {
        Some(path) => MatchConfig::load_toml(path).map_err(|e| anyhow!("cannot load {}: {}", path.display(), e))?,
        None => MatchConfig::default(),
    };
    if let Some(threads) = cli.threads {
        cfg.n_threads = threads;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn progress_bar() -> ProgressBar {
    let style = ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} pairs {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::no_length().with_style(style)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let cfg = load_config(&cli)?;
    info!("{}", cfg.summary());

    let corpus = list_images(&cli.dir, &cli.extension)?;
    info!("{} images in {}, {} pairs", corpus.len(), cli.dir.display(), corpus.len() * corpus.len());

    let orchestrator = Orchestrator::new(&cfg)?;
    let pb = progress_bar();

    let t0 = Instant::now();
    let results = orchestrator.run(&corpus, &pb);
    let elapsed = t0.elapsed();
    info!("Total execution time: {:.2} seconds", elapsed.as_secs_f64());

    let report = Report::new(results);
    report
        .save(&cli.output)
        .with_context(|| format!("writing report to {}", cli.output.display()))?;
    info!("Cylinder metrics saved to {}", cli.output.display());

    Ok(())
}
