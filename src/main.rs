use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use canopy_importance::{DebiasCriterion, DebiasedImportanceConfig, Order, UntraceablePolicy};
use canopy_io::{
    DatasetReader, ExperimentName, FeatureScore, ForestReader, ImportanceSummary, ResultWriter,
};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Out-of-bag debiased feature importance for bagged tree ensembles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Compute debiased MDI for a fitted forest on its training set
    Importance {
        /// Path to the exported forest description (JSON)
        #[arg(long)]
        forest: PathBuf,

        /// Path to the training set CSV, rows in training order
        #[arg(long)]
        data: PathBuf,

        /// Name of the target column in the CSV
        #[arg(long)]
        target: String,

        /// Target type: "classification" (0/1 labels) or "regression"
        #[arg(long, default_value = "classification")]
        task: String,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Leave out trees whose bootstrap cannot be replayed instead of failing
        #[arg(long, default_value_t = false)]
        skip_untraceable: bool,

        /// Feature listing order: "descending" or "original"
        #[arg(long, default_value = "descending")]
        order: String,

        /// Process trees on the calling thread only
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },

    /// Replay every tree's bootstrap and write the in-bag count matrix
    Inbag {
        /// Path to the exported forest description (JSON)
        #[arg(long)]
        forest: PathBuf,

        /// Number of training samples the forest was fit on
        #[arg(long)]
        n_samples: usize,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[derive(Serialize)]
struct ImportanceOutput {
    experiment: String,
    task: &'static str,
    n_samples: usize,
    n_features: usize,
    n_trees: usize,
    n_trees_used: usize,
    top_feature: Option<String>,
    output: PathBuf,
}

#[derive(Serialize)]
struct InbagOutput {
    experiment: String,
    n_samples: usize,
    n_trees: usize,
    min_oob_samples: usize,
    output: PathBuf,
}

fn parse_task(s: &str) -> Result<(DebiasCriterion, &'static str)> {
    match s {
        "classification" => Ok((DebiasCriterion::Classification, "classification")),
        "regression" => Ok((DebiasCriterion::Regression, "regression")),
        other => anyhow::bail!("unknown task: {other} (expected classification or regression)"),
    }
}

fn parse_order(s: &str) -> Result<Order> {
    match s {
        "descending" => Ok(Order::Descending),
        "original" => Ok(Order::Original),
        other => anyhow::bail!("unknown order: {other} (expected descending or original)"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Importance {
            forest,
            data,
            target,
            task,
            experiment,
            output_dir,
            skip_untraceable,
            order,
            sequential,
        } => {
            let (criterion, task) = parse_task(&task)?;
            let order = parse_order(&order)?;
            let experiment_name =
                ExperimentName::new(experiment.clone()).context("invalid experiment name")?;

            let forest = ForestReader::new(&forest)
                .read()
                .context("failed to read forest description")?;
            let dataset = DatasetReader::new(&data, &target)
                .read()
                .context("failed to read training set")?;

            let policy = if skip_untraceable {
                UntraceablePolicy::SkipTree
            } else {
                UntraceablePolicy::Abort
            };
            let result = DebiasedImportanceConfig::new(criterion)
                .with_policy(policy)
                .with_parallel(!sequential)
                .compute(&forest, dataset.features(), dataset.targets())
                .context("debiased importance computation failed")?;
            let ranked = result
                .ranked(dataset.feature_names(), order)
                .context("failed to rank features")?;

            let writer = ResultWriter::new(&output_dir, experiment_name)
                .context("failed to create output directory")?;
            let scores: Vec<FeatureScore<'_>> = ranked
                .iter()
                .map(|f| FeatureScore {
                    name: &f.name,
                    importance: f.importance,
                    std_error: f.std_error,
                    rank: f.rank,
                })
                .collect();
            writer
                .write_importance(&ImportanceSummary {
                    task,
                    n_samples: dataset.n_samples(),
                    n_trees: forest.n_trees(),
                    skipped_trees: result.skipped_trees(),
                    features: &scores,
                })
                .context("failed to write importance results")?;

            let output = ImportanceOutput {
                experiment,
                task,
                n_samples: dataset.n_samples(),
                n_features: dataset.n_features(),
                n_trees: forest.n_trees(),
                n_trees_used: result.n_trees_used(),
                top_feature: ranked.iter().find(|f| f.rank == 1).map(|f| f.name.clone()),
                output: writer.importance_path(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Inbag {
            forest,
            n_samples,
            experiment,
            output_dir,
        } => {
            let experiment_name =
                ExperimentName::new(experiment.clone()).context("invalid experiment name")?;
            let forest = ForestReader::new(&forest)
                .read()
                .context("failed to read forest description")?;
            let matrix = forest
                .inbag_matrix(n_samples)
                .context("failed to replay bootstrap samples")?;

            let writer = ResultWriter::new(&output_dir, experiment_name)
                .context("failed to create output directory")?;
            writer
                .write_inbag(&matrix)
                .context("failed to write in-bag matrix")?;

            let min_oob_samples = (0..matrix.n_trees())
                .map(|t| matrix.column(t).oob_indices().len())
                .min()
                .unwrap_or(0);
            let output = InbagOutput {
                experiment,
                n_samples: matrix.n_samples(),
                n_trees: matrix.n_trees(),
                min_oob_samples,
                output: writer.inbag_path(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
