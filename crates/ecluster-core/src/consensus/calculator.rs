//! Confidence Calculator
//!
//! Conflicting tangles compete for probability mass. Each tangle's
//! confidence is the fixed point of
//!
//! ```text
//! c_i = min(1, s_i * Π_{j ∈ conflicts(i)} (1 - c_j))
//! ```
//!
//! where `s_i` is the seed. The fixed point is found with damped Jacobi
//! relaxation, half a step toward the target per iteration, starting from
//! the clamped seeds. A final pass rescales any conflicting pair whose sum
//! still exceeds one, so two conflicting tangles never both approach 1.

use ecluster_common::Tangle;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Stop once no confidence moves more than this
pub const TOLERANCE: f64 = 1e-9;

/// Hard bound on relaxation sweeps
pub const MAX_ITERATIONS: usize = 10_000;

const DAMPING: f64 = 0.5;

/// Unordered pair of mutually exclusive tangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Conflict(Tangle, Tangle);

impl Conflict {
    pub fn new(a: Tangle, b: Tangle) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn tangles(&self) -> (Tangle, Tangle) {
        (self.0, self.1)
    }

    pub fn involves(&self, tangle: &Tangle) -> bool {
        &self.0 == tangle || &self.1 == tangle
    }
}

/// Converged confidences, computed once at construction
#[derive(Debug, Clone)]
pub struct ConfidenceCalculator {
    confidences: HashMap<Tangle, f64>,
    iterations: usize,
    converged: bool,
}

impl ConfidenceCalculator {
    /// `seeds[i]` is the seed of `tangles[i]`; a missing seed counts as 0
    pub fn new(tangles: &[Tangle], conflicts: &HashSet<Conflict>, seeds: &[f64]) -> Self {
        let mut index: HashMap<Tangle, usize> = HashMap::new();
        let mut order = Vec::new();
        let mut seed_values = Vec::new();
        for (i, tangle) in tangles.iter().enumerate() {
            if index.contains_key(tangle) {
                continue;
            }
            index.insert(*tangle, order.len());
            order.push(*tangle);
            seed_values.push(sanitize(seeds.get(i).copied().unwrap_or(0.0)));
        }

        let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); order.len()];
        let mut pairs = Vec::new();
        for conflict in conflicts {
            let (a, b) = conflict.tangles();
            if a == b {
                continue;
            }
            if let (Some(&i), Some(&j)) = (index.get(&a), index.get(&b)) {
                neighbours[i].push(j);
                neighbours[j].push(i);
                pairs.push((i, j));
            }
        }

        let mut values: Vec<f64> = seed_values.iter().map(|s| s.min(1.0)).collect();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < MAX_ITERATIONS {
            iterations += 1;
            let targets: Vec<f64> = (0..values.len())
                .map(|i| {
                    let survival: f64 = neighbours[i].iter().map(|&j| 1.0 - values[j]).product();
                    (seed_values[i] * survival).min(1.0)
                })
                .collect();

            let mut max_delta: f64 = 0.0;
            for (value, target) in values.iter_mut().zip(targets) {
                let step = DAMPING * (target - *value);
                *value += step;
                max_delta = max_delta.max(step.abs());
            }
            if max_delta < TOLERANCE {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(iterations, tangles = order.len(), "Confidence relaxation hit the iteration bound");
        }

        for (i, j) in pairs {
            let sum = values[i] + values[j];
            if sum > 1.0 {
                values[i] /= sum;
                values[j] /= sum;
            }
        }

        let confidences = order
            .into_iter()
            .zip(values)
            .map(|(tangle, value)| (tangle, value.clamp(0.0, 1.0)))
            .collect();

        debug!(iterations, converged, "Confidences computed");
        Self {
            confidences,
            iterations,
            converged,
        }
    }

    /// Confidence of `tangle`; tangles outside the candidate list get 0
    pub fn confidence_of(&self, tangle: &Tangle) -> f64 {
        self.confidences.get(tangle).copied().unwrap_or(0.0)
    }

    pub fn confidences(&self) -> &HashMap<Tangle, f64> {
        &self.confidences
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

fn sanitize(seed: f64) -> f64 {
    if seed.is_finite() && seed > 0.0 {
        seed
    } else {
        0.0
    }
}
