//! File I/O, validation, and serialization for the canopy pipeline.

mod dataset_reader;
mod domain;
mod error;
mod forest_reader;
mod writer;

pub use dataset_reader::DatasetReader;
pub use domain::{Dataset, ExperimentName};
pub use error::IoError;
pub use forest_reader::ForestReader;
pub use writer::{FeatureScore, ImportanceSummary, ResultWriter};
