//! Import of exported forest descriptions.

use std::path::{Path, PathBuf};

use canopy_forest::{Forest, ForestArrays};
use tracing::{info, instrument};

use crate::IoError;

/// Reads a fitted forest from its JSON description.
///
/// The layout mirrors scikit-learn's `tree_` export, one object per tree:
///
/// ```json
/// {
///   "n_features": 2,
///   "sampler": "numpy_legacy",
///   "trees": [
///     {
///       "seed": 13,
///       "children_left":  [1, -1, -1],
///       "children_right": [2, -1, -1],
///       "feature":        [0, -2, -2],
///       "threshold":      [0.5, -2.0, -2.0],
///       "impurity":       [0.5, 0.0, 0.0]
///     }
///   ]
/// }
/// ```
///
/// `sampler` is `"chacha8"` (default) or `"numpy_legacy"`; `seed` may be
/// `null` when the trainer did not record one. Import only; forests are
/// never written back.
pub struct ForestReader {
    path: PathBuf,
}

impl ForestReader {
    /// Create a reader for the given JSON file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Parse the description without validating tree structure.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
    /// | [`IoError::JsonParse`] | Not valid JSON for the layout above |
    pub fn read_arrays(&self) -> Result<ForestArrays, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| IoError::JsonParse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Parse and validate the description into a [`Forest`].
    ///
    /// # Errors
    ///
    /// The errors of [`read_arrays`](Self::read_arrays), plus
    /// [`IoError::InvalidForest`] when a tree is structurally broken.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Forest, IoError> {
        let forest = self
            .read_arrays()?
            .into_forest()
            .map_err(|e| IoError::InvalidForest {
                path: self.path.clone(),
                source: e,
            })?;
        info!(
            n_trees = forest.n_trees(),
            n_features = forest.n_features(),
            sampler = ?forest.sampler(),
            "forest loaded"
        );
        Ok(forest)
    }
}
