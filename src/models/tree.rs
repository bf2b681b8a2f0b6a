//! CART regression tree (squared-error criterion).
//!
//! The tree is the building block for both ensembles. It is grown greedily:
//! at each node every feature is scanned in sorted order and the split with
//! the largest reduction in sum of squared errors wins. Ties keep the first
//! candidate found (lowest feature index, then lowest threshold), so growth is
//! fully deterministic for a given sample.
//!
//! Training rows are addressed through an index list, which lets the forest
//! pass bootstrap samples (with repeats) without copying the matrix.

/// Growth limits shared by the tree ensembles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    /// Total SSE reduction attributed to each feature.
    impurity_decrease: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Number of samples going left after sorting by `feature`.
    n_left: usize,
    child_sse: f64,
}

impl RegressionTree {
    /// Grow a tree on the rows of `x` listed in `sample`.
    ///
    /// `sample` may contain repeated indices (bootstrap).
    pub fn fit(x: &[Vec<f64>], y: &[f64], sample: &[usize], params: &TreeParams) -> Self {
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let mut tree = RegressionTree {
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; n_features],
        };
        let mut idx = sample.to_vec();
        tree.grow(x, y, &mut idx, 0, params);
        tree
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut at = 0usize;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Impurity-based importances normalised to sum to 1 (all zeros for a stump).
    pub fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.impurity_decrease.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return vec![0.0; self.impurity_decrease.len()];
        }
        self.impurity_decrease.iter().map(|v| v / total).collect()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        idx: &mut [usize],
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let n = idx.len();
        let (sum, sum_sq) = idx.iter().fold((0.0, 0.0), |(s, ss), &i| (s + y[i], ss + y[i] * y[i]));
        let value = if n > 0 { sum / n as f64 } else { 0.0 };
        let node_sse = if n > 0 { (sum_sq - sum * sum / n as f64).max(0.0) } else { 0.0 };

        let at = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        let min_leaf = params.min_samples_leaf.max(1);
        let can_split = depth < params.max_depth
            && n >= params.min_samples_split.max(2)
            && n >= 2 * min_leaf
            && node_sse > 1e-12;
        if !can_split {
            return at;
        }

        let Some(best) = best_split(x, y, idx, node_sse, min_leaf) else {
            return at;
        };

        self.impurity_decrease[best.feature] += node_sse - best.child_sse;

        idx.sort_by(|&a, &b| {
            x[a][best.feature]
                .partial_cmp(&x[b][best.feature])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let (left_idx, right_idx) = idx.split_at_mut(best.n_left);
        let left = self.grow(x, y, left_idx, depth + 1, params);
        let right = self.grow(x, y, right_idx, depth + 1, params);

        self.nodes[at] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        at
    }
}

fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    idx: &[usize],
    node_sse: f64,
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = idx.len();
    let n_features = x.first().map(Vec::len).unwrap_or(0);
    let (total, total_sq) = idx.iter().fold((0.0, 0.0), |(s, ss), &i| (s + y[i], ss + y[i] * y[i]));

    let mut best: Option<SplitCandidate> = None;
    let mut order = idx.to_vec();

    for f in 0..n_features {
        order.sort_by(|&a, &b| x[a][f].partial_cmp(&x[b][f]).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let yi = y[order[k - 1]];
            left_sum += yi;
            left_sq += yi * yi;

            if k < min_leaf || n - k < min_leaf {
                continue;
            }
            let lo = x[order[k - 1]][f];
            let hi = x[order[k]][f];
            if hi <= lo {
                continue;
            }

            let n_l = k as f64;
            let n_r = (n - k) as f64;
            let right_sum = total - left_sum;
            let right_sq = total_sq - left_sq;
            let child_sse = (left_sq - left_sum * left_sum / n_l).max(0.0)
                + (right_sq - right_sum * right_sum / n_r).max(0.0);

            let improves_node = child_sse < node_sse - 1e-12;
            let beats_best = best.is_none_or(|b| child_sse < b.child_sse);
            if improves_node && beats_best {
                let mut threshold = 0.5 * (lo + hi);
                // Midpoint can round up to `hi` for adjacent floats.
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(SplitCandidate {
                    feature: f,
                    threshold,
                    n_left: k,
                    child_sse,
                });
            }
        }
    }

    best
}
