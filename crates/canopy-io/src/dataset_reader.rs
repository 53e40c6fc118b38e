//! CSV training-set reader with full input validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::Dataset;

/// Reads a training set from a CSV file.
///
/// Expected CSV format:
/// - Header row required; one column is the target, every other column is a feature
/// - All cells are numbers; feature order follows the header
/// - Rows must stay in the order the forest was trained on
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::DuplicateColumn`] | Two header columns share a name |
/// | [`IoError::MissingTargetColumn`] | No header column matches the target name |
/// | [`IoError::NoFeatureColumns`] | Only the target column is present |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
pub struct DatasetReader {
    path: PathBuf,
    target: String,
}

impl DatasetReader {
    /// Create a reader for `path` taking the column named `target` as the target.
    pub fn new(path: &Path, target: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            target: target.to_string(),
        }
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display(), target = %self.target))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets our own InconsistentRowLength check report short rows.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let mut seen = HashSet::new();
        for name in &header {
            if !seen.insert(name) {
                return Err(IoError::DuplicateColumn {
                    path: self.path.clone(),
                    name: name.to_string(),
                });
            }
        }

        let target_col = header.iter().position(|h| h == self.target).ok_or_else(|| {
            IoError::MissingTargetColumn {
                path: self.path.clone(),
                target: self.target.clone(),
            }
        })?;
        if expected_cols < 2 {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }

        let feature_names: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != target_col)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut features = Vec::new();
        let mut targets = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut row = Vec::with_capacity(feature_names.len());
            for (col, raw) in record.iter().enumerate() {
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        column: header.get(col).unwrap_or_default().to_string(),
                        raw: raw.to_string(),
                    })?;
                if col == target_col {
                    targets.push(value);
                } else {
                    row.push(value);
                }
            }
            features.push(row);
        }

        if features.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = features.len(),
            n_features = feature_names.len(),
            "dataset loaded"
        );

        Ok(Dataset::new(
            feature_names,
            features,
            self.target.clone(),
            targets,
        ))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
