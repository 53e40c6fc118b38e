//! Decision paths: which nodes each sample visits on its way to a leaf.

use crate::node::NodeIndex;
use crate::tree::Tree;

/// Sparse sample × node membership matrix for one tree.
///
/// Row `r` lists the nodes visited by the `r`-th requested sample, root first
/// and leaf last, so each row holds exactly one node per depth level. Stored
/// compressed by row: `nodes[offsets[r]..offsets[r + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionPath {
    offsets: Vec<usize>,
    nodes: Vec<NodeIndex>,
    n_nodes: usize,
}

impl DecisionPath {
    /// Trace `samples` (indices into `features`) through `tree`.
    ///
    /// # Panics
    ///
    /// Panics if a sample index is out of range or a row is shorter than the
    /// tree's feature count; callers validate the dataset first.
    #[must_use]
    pub fn compute(tree: &Tree, features: &[Vec<f64>], samples: &[usize]) -> Self {
        let mut offsets = Vec::with_capacity(samples.len() + 1);
        let mut nodes = Vec::with_capacity(samples.len() * (tree.depth() + 1));
        offsets.push(0);
        for &s in samples {
            tree.extend_path(&features[s], &mut nodes);
            offsets.push(nodes.len());
        }
        Self {
            offsets,
            nodes,
            n_nodes: tree.n_nodes(),
        }
    }

    /// Return the number of rows (traced samples).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Return the number of node columns.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Return the nodes visited by row `r`, root first.
    #[must_use]
    pub fn row(&self, r: usize) -> &[NodeIndex] {
        &self.nodes[self.offsets[r]..self.offsets[r + 1]]
    }

    /// Iterate over all rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[NodeIndex]> + '_ {
        (0..self.n_rows()).map(|r| self.row(r))
    }

    #[cfg(test)]
    fn contains(&self, r: usize, node: NodeIndex) -> bool {
        self.row(r).contains(&node)
    }

    /// Sum `weight(r)` over the rows visiting each node.
    ///
    /// With unit weights this is the column sum of the membership matrix.
    #[must_use]
    pub fn node_totals(&self, weight: impl Fn(usize) -> f64) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_nodes];
        for r in 0..self.n_rows() {
            let w = weight(r);
            for node in self.row(r) {
                totals[node.index()] += w;
            }
        }
        totals
    }

    /// Dense 0/1 membership, `dense[row][node]`.
    #[cfg(test)]
    fn to_dense(&self) -> Vec<Vec<u8>> {
        self.rows()
            .map(|row| {
                let mut dense = vec![0u8; self.n_nodes];
                for node in row {
                    dense[node.index()] = 1;
                }
                dense
            })
            .collect()
    }
}
