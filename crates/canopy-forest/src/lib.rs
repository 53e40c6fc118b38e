//! Read-only model of a fitted bagged tree ensemble.
//!
//! Holds trees as validated node arenas with precomputed parents, replays
//! each tree's bootstrap sample from its stored seed, and traces samples
//! along their decision paths.

mod bootstrap;
mod error;
mod forest;
mod mt19937;
mod node;
mod path;
mod tree;

pub use bootstrap::{BootstrapSampler, InbagCounts, InbagMatrix};
pub use error::ForestError;
pub use forest::{Forest, ForestArrays};
pub use mt19937::Mt19937;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use path::DecisionPath;
pub use tree::{Tree, TreeArrays};
