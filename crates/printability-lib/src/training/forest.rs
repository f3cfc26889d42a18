//! Bagged decision-tree classifier
//!
//! Binary random forest over dense feature rows. Each tree is a CART tree
//! grown on a bootstrap resample with Gini impurity and a random subset of
//! candidate features per split. Trees are stored as flat node arrays so a
//! fitted forest serializes to plain JSON and inference is a loop over
//! indices.
//!
//! All randomness comes from one seeded ChaCha8 stream consumed in a fixed
//! order, so the same data and config always produce the same forest.

use crate::error::TrainingError;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Number of trees grown by default
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Seed for bootstrap sampling and feature selection
pub const DEFAULT_SEED: u64 = 42;

/// How many candidate features to examine at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// floor(sqrt(n_features)), at least 1
    Sqrt,
    /// Every feature at every split
    All,
    Fixed(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => k,
        };
        n.clamp(1, n_features.max(1))
    }
}

/// Hyperparameters for forest training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub seed: u64,
    pub max_features: MaxFeatures,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            seed: DEFAULT_SEED,
            max_features: MaxFeatures::Sqrt,
            min_samples_split: 2,
            max_depth: None,
            bootstrap: true,
        }
    }
}

impl ForestConfig {
    fn validate(&self) -> Result<(), TrainingError> {
        if self.n_estimators == 0 {
            return Err(TrainingError::InvalidConfig(
                "n_estimators must be at least 1".into(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(TrainingError::InvalidConfig(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if let MaxFeatures::Fixed(0) = self.max_features {
            return Err(TrainingError::InvalidConfig(
                "max_features must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A node in a flattened decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Samples with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Fraction of training samples at this leaf labelled printable
        positive_fraction: f64,
        samples: usize,
    },
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }
}

/// A single binary classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
}

impl DecisionTree {
    /// Build from a node array, checking that every child index points
    /// forward into the array and every split feature is in range.
    pub fn from_nodes(nodes: Vec<TreeNode>, n_features: usize) -> Result<Self, String> {
        let tree = Self { nodes, n_features };
        tree.validate()?;
        Ok(tree)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= self.n_features {
                        return Err(format!("node {idx} splits on unknown feature {feature}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has non-finite threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf {
                    positive_fraction, ..
                } => {
                    if !(0.0..=1.0).contains(positive_fraction) {
                        return Err(format!("leaf {idx} has fraction {positive_fraction}"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Positive-class fraction of the leaf the sample lands in
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf {
                    positive_fraction, ..
                } => return *positive_fraction,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match &self.nodes[idx] {
                TreeNode::Leaf { .. } => max_depth = max_depth.max(depth),
                TreeNode::Split { left, right, .. } => {
                    stack.push((*right, depth + 1));
                    stack.push((*left, depth + 1));
                }
            }
        }
        max_depth
    }
}

/// Best split found for one node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Weighted child impurity, lower is better
    child_impurity: f64,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// A pending node: a range of the shared index buffer and where to attach it
struct BuildTask {
    start: usize,
    end: usize,
    depth: usize,
    parent: Option<(usize, Side)>,
}

/// Grows one CART tree over a set of (possibly repeated) sample indices
struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [bool],
    n_features: usize,
    max_features: usize,
    min_samples_split: usize,
    max_depth: Option<usize>,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    /// Grow the tree depth-first with an explicit work stack.
    ///
    /// Left children are expanded before right ones, so nodes are laid out in
    /// pre-order and the RNG is consumed in the same order at every depth.
    fn build(&mut self, indices: &mut [usize], rng: &mut ChaCha8Rng) {
        let mut stack = vec![BuildTask {
            start: 0,
            end: indices.len(),
            depth: 0,
            parent: None,
        }];

        while let Some(task) = stack.pop() {
            let node_idx = self.nodes.len();
            if let Some((parent, side)) = task.parent {
                self.link_child(parent, side, node_idx);
            }

            let slice = &mut indices[task.start..task.end];
            let n = slice.len();
            let positives = slice.iter().filter(|&&i| self.labels[i]).count();
            self.nodes.push(TreeNode::Leaf {
                positive_fraction: positives as f64 / n as f64,
                samples: n,
            });

            let pure = positives == 0 || positives == n;
            let depth_reached = self.max_depth.is_some_and(|max| task.depth >= max);
            if pure || n < self.min_samples_split || depth_reached {
                continue;
            }

            let Some(split) = self.best_split(slice, rng) else {
                continue;
            };

            let parent_impurity = n as f64 * gini(positives, n);
            self.importances[split.feature] += parent_impurity - split.child_impurity;

            let boundary = partition(slice, |i| self.rows[i][split.feature] <= split.threshold);
            self.nodes[node_idx] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: node_idx,
                right: node_idx,
            };

            let mid = task.start + boundary;
            stack.push(BuildTask {
                start: mid,
                end: task.end,
                depth: task.depth + 1,
                parent: Some((node_idx, Side::Right)),
            });
            stack.push(BuildTask {
                start: task.start,
                end: mid,
                depth: task.depth + 1,
                parent: Some((node_idx, Side::Left)),
            });
        }
    }

    fn link_child(&mut self, parent: usize, side: Side, child: usize) {
        if let TreeNode::Split { left, right, .. } = &mut self.nodes[parent] {
            match side {
                Side::Left => *left = child,
                Side::Right => *right = child,
            }
        }
    }

    /// Examine features in random order. At least `max_features` are tried;
    /// the search continues past that only while no valid split exists.
    fn best_split(&self, indices: &[usize], rng: &mut ChaCha8Rng) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..self.n_features).collect();
        order.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        for (visited, &feature) in order.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_split_on(feature, indices) {
                let better = best
                    .as_ref()
                    .map_or(true, |b| candidate.child_impurity < b.child_impurity);
                if better {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn best_split_on(&self, feature: usize, indices: &[usize]) -> Option<SplitCandidate> {
        let mut sorted: Vec<(f64, bool)> = indices
            .iter()
            .map(|&i| (self.rows[i][feature], self.labels[i]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len();
        let total_pos = sorted.iter().filter(|(_, y)| *y).count();
        let mut left_pos = 0usize;
        let mut best: Option<SplitCandidate> = None;

        for k in 1..n {
            if sorted[k - 1].1 {
                left_pos += 1;
            }
            let (lo, hi) = (sorted[k - 1].0, sorted[k].0);
            if lo >= hi {
                continue;
            }
            let left_n = k;
            let right_n = n - k;
            let right_pos = total_pos - left_pos;
            let child_impurity =
                left_n as f64 * gini(left_pos, left_n) + right_n as f64 * gini(right_pos, right_n);

            if best
                .as_ref()
                .map_or(true, |b| child_impurity < b.child_impurity)
            {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    child_impurity,
                });
            }
        }
        best
    }
}

/// Binary Gini impurity of a node with `positives` out of `n`
fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// Stable in-place partition; returns the number of elements satisfying `pred`
fn partition(indices: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let (mut left, right): (Vec<usize>, Vec<usize>) = indices.iter().partition(|&&i| pred(i));
    let boundary = left.len();
    left.extend(right);
    indices.copy_from_slice(&left);
    boundary
}

/// Ensemble of bagged decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// Fit a forest on dense rows and binary labels
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[bool],
        config: &ForestConfig,
    ) -> Result<Self, TrainingError> {
        config.validate()?;
        if rows.len() != labels.len() {
            return Err(TrainingError::LengthMismatch {
                features: rows.len(),
                labels: labels.len(),
            });
        }
        if rows.is_empty() {
            return Err(TrainingError::EmptyDataset { dropped: 0 });
        }
        let n_features = rows[0].len();
        if n_features == 0 || rows.iter().any(|r| r.len() != n_features) {
            return Err(TrainingError::InvalidConfig(
                "all rows must have the same non-zero width".into(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let n = rows.len();
        let max_features = config.max_features.resolve(n_features);
        let mut trees = Vec::with_capacity(config.n_estimators);
        let mut importance_sum = vec![0.0; n_features];

        for _ in 0..config.n_estimators {
            let mut indices: Vec<usize> = if config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };

            let mut builder = TreeBuilder {
                rows,
                labels,
                n_features,
                max_features,
                min_samples_split: config.min_samples_split,
                max_depth: config.max_depth,
                nodes: Vec::new(),
                importances: vec![0.0; n_features],
            };
            builder.build(&mut indices, &mut rng);

            let tree_total: f64 = builder.importances.iter().sum();
            if tree_total > 0.0 {
                for (acc, imp) in importance_sum.iter_mut().zip(&builder.importances) {
                    *acc += imp / tree_total;
                }
            }
            trees.push(DecisionTree {
                nodes: builder.nodes,
                n_features,
            });
        }

        let total: f64 = importance_sum.iter().sum();
        let feature_importances = if total > 0.0 {
            importance_sum.iter().map(|v| v / total).collect()
        } else {
            vec![0.0; n_features]
        };

        Ok(Self {
            trees,
            n_features,
            feature_importances,
        })
    }

    /// Check structural consistency after deserialization
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("empty forest".into());
        }
        if self.feature_importances.len() != self.n_features {
            return Err("feature importance length does not match n_features".into());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features {
                return Err(format!("tree {idx} has inconsistent n_features"));
            }
            tree.validate().map_err(|e| format!("tree {idx}: {e}"))?;
        }
        Ok(())
    }

    /// Mean positive-class fraction across trees
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        sum / self.trees.len() as f64
    }

    /// Class decision: printable when the mean probability exceeds one half
    pub fn predict(&self, features: &[f64]) -> bool {
        self.predict_proba(features) > 0.5
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean decrease in impurity per feature, summing to 1 (or all zero)
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn avg_depth(&self) -> f64 {
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len().max(1) as f64
    }

    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }
}
