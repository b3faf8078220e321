//! CART trees shared by both ensembles.
//!
//! A tree is grown over per-sample statistic pairs `(a, b)` whose meaning is
//! fixed by the [`Criterion`]:
//!
//! | Criterion | `a` | `b` | Node score | Leaf |
//! |-----------|-----|-----|------------|------|
//! | Gini | positive indicator | 1 | `(A² + (B - A)²) / B` | `A / B` |
//! | Newton | gradient | hessian | `A² / (B + λ)` | `-A / (B + λ)` |
//!
//! The gain of a split is `score(L) + score(R) - score(P)` (halved for
//! Newton), which for Gini equals the decrease in weighted impurity.

use ndarray::ArrayView1;
use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::seq::index;

/// Splits with a gain at or below this are not taken.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Criterion {
    Gini,
    Newton { lambda: f64, min_child_weight: f64 },
}

impl Criterion {
    fn score(&self, (a, b): (f64, f64)) -> f64 {
        match *self {
            Criterion::Gini if b > 0.0 => (a * a + (b - a) * (b - a)) / b,
            Criterion::Gini => 0.0,
            Criterion::Newton { lambda, .. } => a * a / (b + lambda),
        }
    }

    fn gain(&self, left: (f64, f64), right: (f64, f64), parent: (f64, f64)) -> f64 {
        let raw = self.score(left) + self.score(right) - self.score(parent);
        match self {
            Criterion::Gini => raw,
            Criterion::Newton { .. } => 0.5 * raw,
        }
    }

    fn leaf_value(&self, (a, b): (f64, f64)) -> f64 {
        match *self {
            Criterion::Gini if b > 0.0 => a / b,
            Criterion::Gini => 0.0,
            Criterion::Newton { lambda, .. } => -a / (b + lambda),
        }
    }

    fn child_allowed(&self, b: f64) -> bool {
        match *self {
            Criterion::Gini => true,
            Criterion::Newton {
                min_child_weight, ..
            } => b >= min_child_weight,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Already resolved against the feature count
    pub max_features: usize,
    pub criterion: Criterion,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted tree, nodes stored in pre-order with the root at index 0.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree over `samples` (row indices into `x`, duplicates allowed).
    ///
    /// The gain of every split taken is added to `importances[feature]`.
    pub(crate) fn grow(
        x: ArrayView2<f64>,
        stats: &[(f64, f64)],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
        importances: &mut [f64],
    ) -> Self {
        let mut grower = Grower {
            x: x.view(),
            stats,
            params,
            rng,
            importances,
            nodes: Vec::new(),
        };
        grower.grow(samples, 0);
        Self {
            nodes: grower.nodes,
        }
    }

    /// Leaf value reached by `row`.
    pub(crate) fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => i = if row[feature] <= threshold { left } else { right },
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf(_)))
            .count()
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Grower<'a> {
    x: ArrayView2<'a, f64>,
    stats: &'a [(f64, f64)],
    params: &'a TreeParams,
    rng: &'a mut StdRng,
    importances: &'a mut [f64],
    nodes: Vec<Node>,
}

impl Grower<'_> {
    fn totals(&self, samples: &[usize]) -> (f64, f64) {
        samples.iter().fold((0.0, 0.0), |(a, b), &i| {
            (a + self.stats[i].0, b + self.stats[i].1)
        })
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let totals = self.totals(&samples);
        let id = self.nodes.len();
        self.nodes
            .push(Node::Leaf(self.params.criterion.leaf_value(totals)));

        let depth_ok = self.params.max_depth.map_or(true, |max| depth < max);
        let size_ok = samples.len() >= self.params.min_samples_split
            && samples.len() >= 2 * self.params.min_samples_leaf;
        if !(depth_ok && size_ok) {
            return id;
        }

        if let Some(split) = self.best_split(&samples, totals) {
            self.importances[split.feature] += split.gain;
            let x = self.x;
            let (left, right): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&i| x[[i, split.feature]] <= split.threshold);
            let left = self.grow(left, depth + 1);
            let right = self.grow(right, depth + 1);
            self.nodes[id] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
        }
        id
    }

    fn best_split(&mut self, samples: &[usize], totals: (f64, f64)) -> Option<SplitCandidate> {
        let x = self.x;
        let criterion = self.params.criterion;
        let min_leaf = self.params.min_samples_leaf;
        let n = samples.len();

        let candidates = index::sample(
            &mut *self.rng,
            x.ncols(),
            self.params.max_features.min(x.ncols()),
        );

        let mut best: Option<SplitCandidate> = None;
        let mut order = samples.to_vec();
        for feature in candidates.iter() {
            order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let mut left = (0.0, 0.0);
            for pos in 0..n - 1 {
                let (a, b) = self.stats[order[pos]];
                left = (left.0 + a, left.1 + b);

                let n_left = pos + 1;
                if n_left < min_leaf || n - n_left < min_leaf {
                    continue;
                }
                let lo = x[[order[pos], feature]];
                let hi = x[[order[pos + 1], feature]];
                if lo >= hi {
                    continue;
                }
                let right = (totals.0 - left.0, totals.1 - left.1);
                if !criterion.child_allowed(left.1) || !criterion.child_allowed(right.1) {
                    continue;
                }

                let gain = criterion.gain(left, right, totals);
                if gain > best.as_ref().map_or(MIN_GAIN, |b| b.gain) {
                    let mid = lo + (hi - lo) / 2.0;
                    best = Some(SplitCandidate {
                        feature,
                        threshold: if mid < hi { mid } else { lo },
                        gain,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn gini_params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
            criterion: Criterion::Gini,
        }
    }

    #[test]
    fn test_gini_tree_separates_classes() {
        // feature 1 is noise, feature 0 separates at 0.5
        let x = array![[0.0, 3.0], [0.2, 1.0], [0.8, 2.0], [1.0, 0.0]];
        let stats = [(0.0, 1.0), (0.0, 1.0), (1.0, 1.0), (1.0, 1.0)];
        let mut importances = [0.0; 2];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::grow(
            x.view(),
            &stats,
            (0..4).collect(),
            &gini_params(),
            &mut rng,
            &mut importances,
        );

        assert_eq!(tree.n_leaves(), 2);
        for (row, expected) in x.rows().into_iter().zip([0.0, 0.0, 1.0, 1.0]) {
            assert_eq!(tree.predict_row(row), expected);
        }
        assert!(importances[0] > 0.0);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let x = array![[0.0], [1.0], [2.0]];
        let stats = [(1.0, 1.0); 3];
        let mut importances = [0.0];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::grow(
            x.view(),
            &stats,
            vec![0, 1, 2],
            &gini_params(),
            &mut rng,
            &mut importances,
        );
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict_row(x.row(0)), 1.0);
    }

    #[test]
    fn test_newton_leaf_weights() {
        let x = array![[0.0], [1.0]];
        // gradients pull in opposite directions
        let stats = [(0.5, 0.25), (-0.5, 0.25)];
        let params = TreeParams {
            max_depth: Some(1),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 1,
            criterion: Criterion::Newton {
                lambda: 1.0,
                min_child_weight: 0.0,
            },
        };
        let mut importances = [0.0];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::grow(
            x.view(),
            &stats,
            vec![0, 1],
            &params,
            &mut rng,
            &mut importances,
        );
        assert!((tree.predict_row(x.row(0)) + 0.4).abs() < 1e-12);
        assert!((tree.predict_row(x.row(1)) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_min_child_weight_blocks_split() {
        let x = array![[0.0], [1.0]];
        let stats = [(0.5, 0.25), (-0.5, 0.25)];
        let params = TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 1,
            criterion: Criterion::Newton {
                lambda: 1.0,
                min_child_weight: 1.0,
            },
        };
        let mut importances = [0.0];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::grow(
            x.view(),
            &stats,
            vec![0, 1],
            &params,
            &mut rng,
            &mut importances,
        );
        assert_eq!(tree.n_leaves(), 1);
    }

    /// Grows with stats and importances that live shorter than `x`.
    fn grow_local(x: ArrayView2<f64>) -> (DecisionTree, [f64; 2]) {
        let stats = [(0.0, 1.0), (0.0, 1.0), (1.0, 1.0), (1.0, 1.0)];
        let mut importances = [0.0; 2];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::grow(
            x,
            &stats,
            (0..4).collect(),
            &gini_params(),
            &mut rng,
            &mut importances,
        );
        (tree, importances)
    }

    #[test]
    fn test_grows_from_sliced_view() {
        // only the first four rows and two columns are grown on
        let x = array![
            [0.0, 3.0, 9.0],
            [0.2, 1.0, 9.0],
            [0.8, 2.0, 9.0],
            [1.0, 0.0, 9.0],
            [5.0, 5.0, 9.0],
        ];
        let view = x.slice(ndarray::s![..4, ..2]);
        let (tree, importances) = grow_local(view);

        assert_eq!(tree.n_leaves(), 2);
        for (row, expected) in view.rows().into_iter().zip([0.0, 0.0, 1.0, 1.0]) {
            assert_eq!(tree.predict_row(row), expected);
        }
        assert!(importances[0] > 0.0);
    }
}
