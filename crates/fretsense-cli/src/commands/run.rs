use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use fretsense_core::pipeline::config::SessionConfig;
use fretsense_core::pipeline::{run_session_reported, PipelineStage, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::summary::{print_results, print_session_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Session config file (TOML)
    #[arg(long)]
    pub config: PathBuf,

    /// Also write the results table to this file
    #[arg(long)]
    pub results: Option<PathBuf>,
}

struct BarReporter {
    pb: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.pb.set_message(stage.to_string());
        self.pb.set_length(total_items.unwrap_or(1) as u64);
        self.pb.set_position(0);
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.pb.length() {
            self.pb.set_position(len);
        }
    }
}

pub fn run(args: &RunArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.config)
        .with_context(|| format!("Failed to read config {}", args.config.display()))?;
    let config: SessionConfig = toml::from_str(&contents).context("Invalid session config")?;
    info!(config = %args.config.display(), samples = config.samples.len(), "Session config loaded");

    print_session_summary(&config);

    let pb = ProgressBar::new(1);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:28} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { pb: pb.clone() });

    let output = run_session_reported(&config, reporter)?;
    pb.finish_with_message("Done");

    println!();
    print_results(&output.results);
    for sample in &output.samples {
        if let Some(ref path) = sample.written {
            println!("{}: saved to {}", sample.label, path.display());
        }
    }

    if let Some(ref path) = args.results {
        std::fs::write(path, output.results.to_tsv())
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
        println!("Results saved to {}", path.display());
    }
    Ok(())
}
