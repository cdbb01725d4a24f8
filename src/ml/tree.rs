// ============================================================
// Layer 5 - CART Decision Tree
// ============================================================
// One classification tree of the forest.
//
//   - impurity:   Gini, 1 - Σ p_k²
//   - splits:     axis-aligned, x[f] <= threshold goes left;
//                 threshold is the midpoint between two
//                 consecutive distinct values
//   - features:   at each node the candidate features are
//                 visited in a random order; the search stops
//                 after `max_features` non-constant ones
//   - stopping:   a node becomes a leaf when it is pure, has
//                 fewer than `min_samples_split` samples, or no
//                 feature varies inside it
//   - leaves:     store the class distribution (soft voting)
//
// Nodes live in a flat Vec and are grown with an explicit
// stack, so deep trees never hit the call-stack limit.

use ndarray::ArrayView2;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_features:      usize,
    pub min_samples_split: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature:   usize,
    threshold: f64,
    impurity:  f64,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed,
    /// which is how bootstrap weighting works). `y` holds class indices
    /// in `0..n_classes` for every row of `x`.
    pub fn fit(
        x:         ArrayView2<f64>,
        y:         &[usize],
        samples:   Vec<usize>,
        n_classes: usize,
        params:    TreeParams,
        rng:       &mut ChaCha8Rng,
    ) -> Self {
        let mut nodes = vec![placeholder()];
        let mut stack = vec![(0usize, samples)];

        while let Some((id, rows)) = stack.pop() {
            let counts = class_counts(y, &rows, n_classes);
            let distinct = counts.iter().filter(|&&c| c > 0).count();

            if distinct <= 1 || rows.len() < params.min_samples_split {
                nodes[id] = leaf(&counts);
                continue;
            }

            let Some(split) = best_split(x, y, &rows, &counts, params.max_features, rng) else {
                nodes[id] = leaf(&counts);
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .partition(|&&r| x[[r, split.feature]] <= split.threshold);

            let left  = nodes.len();
            let right = left + 1;
            nodes.push(placeholder());
            nodes.push(placeholder());
            nodes[id] = Node::Split {
                feature:   split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            // left subtree is grown first
            stack.push((right, right_rows));
            stack.push((left, left_rows));
        }

        Self { nodes }
    }

    /// Class distribution of the leaf `row` falls into
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { distribution } => return distribution,
                Node::Split { feature, threshold, left, right } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn placeholder() -> Node {
    Node::Leaf { distribution: Vec::new() }
}

fn leaf(counts: &[usize]) -> Node {
    let total = counts.iter().sum::<usize>().max(1) as f64;
    Node::Leaf {
        distribution: counts.iter().map(|&c| c as f64 / total).collect(),
    }
}

fn class_counts(y: &[usize], rows: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &r in rows {
        counts[y[r]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn best_split(
    x:             ArrayView2<f64>,
    y:             &[usize],
    rows:          &[usize],
    parent_counts: &[usize],
    max_features:  usize,
    rng:           &mut ChaCha8Rng,
) -> Option<Candidate> {
    let mut features: Vec<usize> = (0..x.ncols()).collect();
    features.shuffle(rng);

    let n = rows.len() as f64;
    let mut best: Option<Candidate> = None;
    let mut visited = 0usize;
    let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(rows.len());

    for feature in features {
        if visited >= max_features {
            break;
        }

        sorted.clear();
        sorted.extend(rows.iter().map(|&r| (x[[r, feature]], y[r])));
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        // constant inside this node: not counted against max_features
        if sorted[0].0 >= sorted[sorted.len() - 1].0 {
            continue;
        }
        visited += 1;

        let mut left  = vec![0usize; parent_counts.len()];
        let mut right = parent_counts.to_vec();

        for k in 0..sorted.len() - 1 {
            let (value, class) = sorted[k];
            left[class]  += 1;
            right[class] -= 1;

            let next = sorted[k + 1].0;
            if next <= value {
                continue;
            }

            let n_left  = (k + 1) as f64;
            let n_right = n - n_left;
            let impurity = (n_left * gini(&left, n_left) + n_right * gini(&right, n_right)) / n;

            if best.map_or(true, |b| impurity < b.impurity) {
                let mut threshold = value + (next - value) / 2.0;
                // midpoint can round up onto `next` for adjacent floats
                if threshold >= next {
                    threshold = value;
                }
                best = Some(Candidate { feature, threshold, impurity });
            }
        }
    }

    best
}
