//! JSON result writer for importance and in-bag outputs.

use std::fs;
use std::path::{Path, PathBuf};

use canopy_forest::InbagMatrix;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// One feature's row in the importance artifact.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureScore<'a> {
    /// Feature name.
    pub name: &'a str,
    /// Debiased importance.
    pub importance: f64,
    /// Standard error across trees.
    pub std_error: f64,
    /// 1-based rank by descending importance.
    pub rank: usize,
}

/// Everything written to `{experiment}_importance.json`.
///
/// Plain data so the writer does not depend on `canopy-importance`.
#[derive(Debug, Clone)]
pub struct ImportanceSummary<'a> {
    /// `"classification"` or `"regression"`.
    pub task: &'a str,
    /// Number of training samples.
    pub n_samples: usize,
    /// Number of trees in the forest.
    pub n_trees: usize,
    /// Positions of trees left out as untraceable.
    pub skipped_trees: &'a [usize],
    /// Feature rows in listing order.
    pub features: &'a [FeatureScore<'a>],
}

/// Writes importance and in-bag results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_importance.json` and
/// `{experiment}_inbag.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Return `{output_dir}/{experiment}_importance.json`.
    #[must_use]
    pub fn importance_path(&self) -> PathBuf {
        self.output_path("importance")
    }

    /// Return `{output_dir}/{experiment}_inbag.json`.
    #[must_use]
    pub fn inbag_path(&self) -> PathBuf {
        self.output_path("inbag")
    }

    /// Write the debiased importance summary.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`] if the file
    /// cannot be produced.
    #[instrument(skip_all)]
    pub fn write_importance(&self, summary: &ImportanceSummary<'_>) -> Result<(), IoError> {
        let artifact = ImportanceArtifact {
            experiment: self.experiment.as_str(),
            task: summary.task,
            n_samples: summary.n_samples,
            n_trees: summary.n_trees,
            n_trees_used: summary.n_trees.saturating_sub(summary.skipped_trees.len()),
            skipped_trees: summary.skipped_trees,
            features: summary.features,
        };
        let path = self.importance_path();
        write_json(&path, &artifact)?;
        info!(path = %path.display(), "importance result written");
        Ok(())
    }

    /// Write the `n_samples × n_trees` in-bag count matrix, row per sample.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`] if the file
    /// cannot be produced.
    #[instrument(skip_all, fields(n_samples = matrix.n_samples(), n_trees = matrix.n_trees()))]
    pub fn write_inbag(&self, matrix: &InbagMatrix) -> Result<(), IoError> {
        let artifact = InbagArtifact {
            experiment: self.experiment.as_str(),
            n_samples: matrix.n_samples(),
            n_trees: matrix.n_trees(),
            counts: matrix.to_rows(),
        };
        let path = self.inbag_path();
        write_json(&path, &artifact)?;
        info!(path = %path.display(), "in-bag matrix written");
        Ok(())
    }

    fn output_path(&self, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()))
    }
}

fn write_json<T: Serialize>(path: &Path, artifact: &T) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, json).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct ImportanceArtifact<'a> {
    experiment: &'a str,
    task: &'a str,
    n_samples: usize,
    n_trees: usize,
    n_trees_used: usize,
    skipped_trees: &'a [usize],
    features: &'a [FeatureScore<'a>],
}

#[derive(Serialize)]
struct InbagArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    n_trees: usize,
    counts: Vec<Vec<u32>>,
}
