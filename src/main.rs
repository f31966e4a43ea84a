//! clinvar-sweep CLI
//!
//! Three independent entry points over one sweep:
//! `analyze` aggregates and reports, `evaluate` fills in missing results
//! files, `plot` renders a heatmap from an exported summary table.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clinvar_sweep::config::SweepLayout;
use clinvar_sweep::eval::{DriverConfig, EvalDriver, EvalStatus, SkipReason};
use clinvar_sweep::export::{self, SummaryRow};
use clinvar_sweep::pipeline::{run_pipeline, PipelineOutcome};
use clinvar_sweep::report::{self, Axis};

#[derive(Parser)]
#[command(name = "clinvar-sweep")]
#[command(version, about = "Aggregate, evaluate, and plot ClinVar sweep runs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate finished runs: report the best one, export the summary
    /// table, render the heatmap
    Analyze {
        /// Root directory containing sweep run folders
        #[arg(long, default_value = "checkpoints/Clinvar_trm-ACT-torch")]
        root: PathBuf,

        /// Destination of the summary table
        #[arg(long, default_value = "sweep_summary.csv")]
        summary: PathBuf,

        /// Destination of the heatmap image
        #[arg(long, default_value = "docs/figures/clinvar_sweep_heatmap.png")]
        heatmap: PathBuf,
    },

    /// Evaluate every sweep run that has no metrics file yet
    Evaluate {
        /// Root directory containing sweep run folders
        #[arg(long, default_value = "checkpoints/Clinvar_trm-ACT-torch")]
        root: PathBuf,

        /// Base evaluation config to clone per run
        #[arg(long, default_value = "outputs/clinvar_config_eval.yaml")]
        base_config: PathBuf,

        /// Device for evaluation (cpu or cuda)
        #[arg(long, default_value = "cpu")]
        device: String,

        /// Worker pool size (1 = strict enumeration order)
        #[arg(long, default_value_t = 1)]
        workers: usize,

        /// Overall deadline in seconds; runs not started in time are skipped
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Evaluator command (program followed by leading arguments)
        #[arg(
            long,
            num_args = 1..,
            default_values = ["python", "tools/evaluate_clinvar_checkpoint.py"]
        )]
        evaluator: Vec<String>,
    },

    /// Render the sweep heatmap from an exported summary table
    Plot {
        /// Summary table to plot
        #[arg(long, default_value = "sweep_summary.csv")]
        csv: PathBuf,

        /// Destination of the heatmap image
        #[arg(long, default_value = "docs/figures/clinvar_sweep_heatmap.png")]
        output: PathBuf,

        /// Palette name (coolwarm, viridis, magma, grayscale)
        #[arg(long, default_value = "coolwarm")]
        palette: String,

        /// Hyperparameter to place on the row axis
        #[arg(long, default_value = "hidden_size")]
        row_axis: Axis,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    match Cli::parse().command {
        Commands::Analyze { root, summary, heatmap } => analyze(root, summary, heatmap),
        Commands::Evaluate {
            root,
            base_config,
            device,
            workers,
            timeout_secs,
            evaluator,
        } => evaluate(root, base_config, device, workers, timeout_secs, evaluator),
        Commands::Plot { csv, output, palette, row_axis } => plot(&csv, &output, &palette, row_axis),
    }
}

fn analyze(root: PathBuf, summary: PathBuf, heatmap: PathBuf) -> Result<()> {
    let layout = SweepLayout {
        sweep_root: root,
        summary_file: summary,
        heatmap_file: heatmap,
        ..SweepLayout::default()
    };

    match run_pipeline(&layout)? {
        outcome @ (PipelineOutcome::NoRuns | PipelineOutcome::NoFinished { .. }) => {
            println!("{}", outcome.message());
        }
        PipelineOutcome::Reported { best, summary_file, heatmap_file, .. } => {
            print_best(&best);
            println!("Summary saved to {}", summary_file.display());
            if let Some(path) = heatmap_file {
                println!("Saved heatmap to {}", path.display());
            }
        }
    }
    Ok(())
}

fn print_best(best: &SummaryRow) {
    println!("Best run:");
    println!("  run: {}", best.run);
    println!("  roc_auc: {}", best.roc_auc);
    println!("  accuracy: {}", best.accuracy);
    println!("  hidden_size: {}", best.hidden_size);
    println!("  L_layers: {}", best.layers);
    println!("  L_cycles: {}", best.cycles);
    println!("  lr: {}", best.lr);
    println!("  checkpoint: {}", best.checkpoint);
    println!("  config: {}", best.config);
}

fn evaluate(
    root: PathBuf,
    base_config: PathBuf,
    device: String,
    workers: usize,
    timeout_secs: Option<u64>,
    evaluator: Vec<String>,
) -> Result<()> {
    let layout = SweepLayout {
        sweep_root: root,
        ..SweepLayout::default()
    };
    let config = DriverConfig {
        base_config,
        device,
        evaluator,
        workers,
        timeout: timeout_secs.map(Duration::from_secs),
    };

    let report = EvalDriver::new(layout, config).run()?;
    println!(
        "Evaluated {} run(s); {} already had metrics, {} had no checkpoint, {} cancelled.",
        report.evaluated(),
        report.skipped(SkipReason::AlreadyEvaluated),
        report.skipped(SkipReason::NoCheckpoint),
        report.skipped(SkipReason::Cancelled),
    );

    let failures = report.failures();
    if failures.is_empty() {
        return Ok(());
    }
    for outcome in &failures {
        if let EvalStatus::Failed { code, detail } = outcome.status() {
            eprintln!(
                "FAILED {} (exit {}): {detail}",
                outcome.run_name(),
                code.map_or_else(|| "?".to_string(), |c| c.to_string()),
            );
        }
    }
    anyhow::bail!("evaluation failed for {} run(s)", failures.len());
}

fn plot(csv: &Path, output: &Path, palette: &str, row_axis: Axis) -> Result<()> {
    let rows = export::read_summary(csv)?;
    report::render_rows(&rows, row_axis, palette, output)?;
    println!("Saved sweep heatmap to {}", output.display());
    Ok(())
}
