//! Seeded isolation forest. `score_samples` follows the common convention:
//! values in [-1, 0), lower = more anomalous.

use super::{AnomalyDetector, Polarity};
use crate::config::ModelConfig;
use crate::error::{Result, RiskError};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Expected path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One isolation tree; nodes live in an arena with the root at index 0.
#[derive(Debug, Clone, Default)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(x: ArrayView2<f64>, rows: Vec<usize>, height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self::default();
        tree.grow(x, rows, 0, height_limit, rng);
        tree
    }

    fn grow(
        &mut self,
        x: ArrayView2<f64>,
        rows: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });
        if depth >= height_limit || rows.len() <= 1 {
            return id;
        }

        // Only features that vary inside this node can split it.
        let candidates: Vec<(usize, f64, f64)> = (0..x.ncols())
            .filter_map(|j| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                    (lo.min(x[[i, j]]), hi.max(x[[i, j]]))
                });
                (hi > lo).then_some((j, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            return id;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&i| x[[i, feature]] <= threshold);

        let left = self.grow(x, left_rows, depth + 1, height_limit, rng);
        let right = self.grow(x, right_rows, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Edges walked to reach a leaf, plus the expected remainder for the leaf's size.
    pub fn path_length(&self, sample: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[id] {
                Node::Leaf { size } => return depth + average_path_length(size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if sample[feature] <= threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    seed: u64,
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
}

impl IsolationForest {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
            seed: config.seed,
            trees: Vec::new(),
            sample_size: 0,
            n_features: 0,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn trees(&self) -> &[IsolationTree] {
        &self.trees
    }

    /// Rows drawn per tree in the last fit
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}

impl AnomalyDetector for IsolationForest {
    fn fit(&mut self, x: ArrayView2<f64>) -> Result<()> {
        let (n, f) = x.dim();
        if n == 0 {
            return Err(RiskError::EmptyFilteredSet);
        }
        if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(RiskError::NonFiniteFeature { row, col });
        }

        let sample_size = self.max_samples.min(n);
        let height_limit = (sample_size.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        self.trees = (0..self.n_estimators)
            .map(|_| {
                let rows = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::build(x, rows, height_limit, &mut rng)
            })
            .collect();
        self.sample_size = sample_size;
        self.n_features = f;
        tracing::debug!(
            trees = self.trees.len(),
            sample_size,
            height_limit,
            seed = self.seed,
            "isolation forest fitted"
        );
        Ok(())
    }

    fn score_samples(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted() {
            return Err(RiskError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(RiskError::DimensionMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }
        let norm = average_path_length(self.sample_size);
        let scores = x
            .outer_iter()
            .map(|row| {
                if norm == 0.0 {
                    // A single training row carries no isolation information.
                    return -0.5;
                }
                let mean_path = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
                    / self.trees.len() as f64;
                -(2f64.powf(-mean_path / norm))
            })
            .collect();
        Ok(scores)
    }

    fn polarity(&self) -> Polarity {
        Polarity::LowerIsAnomalous
    }

    fn name(&self) -> &str {
        "isolation_forest"
    }
}
