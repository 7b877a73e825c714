use crate::logging::Logger;
use rand::Rng;

/// Added to every shifted fitness so no candidate gets probability zero
pub const SELECTION_EPSILON: f64 = 1e-12;

/// Indices into a fitness-sorted population
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    /// Top-ranked indices, in rank order
    pub elites: Vec<usize>,
    /// Distinct non-elite indices drawn proportionally to fitness
    pub sampled: Vec<usize>,
    /// Set when the draw fell back to uniform probabilities
    pub used_uniform_fallback: bool,
}

impl Selection {
    /// Elites followed by sampled indices
    pub fn parents(&self) -> Vec<usize> {
        self.elites.iter().chain(&self.sampled).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.elites.len() + self.sampled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Selects parents from fitness values sorted descending.
///
/// The first `elite_size` entries are kept as-is; every remaining slot is
/// filled by sampling the non-elite entries without replacement.
pub fn select_parents<R: Rng + ?Sized>(
    fitness: &[f64],
    elite_size: usize,
    rng: &mut R,
    logger: &Logger,
) -> Selection {
    let n = fitness.len();
    if n == 0 {
        logger.warn(format_args!("select_parents: empty population"));
        return Selection::default();
    }

    let elite_size = elite_size.min(n);
    let elites: Vec<usize> = (0..elite_size).collect();
    let remaining = n - elite_size;
    if remaining == 0 {
        return Selection {
            elites,
            ..Selection::default()
        };
    }

    let candidates = &fitness[elite_size..];
    let (weights, used_uniform_fallback) = match selection_probabilities(candidates, remaining) {
        Some(probabilities) => (probabilities, false),
        None => {
            logger.warn(format_args!(
                "select_parents: degenerate fitness distribution over {} candidates, sampling uniformly",
                candidates.len()
            ));
            (vec![1.0 / candidates.len() as f64; candidates.len()], true)
        }
    };

    let sampled = weighted_sample_without_replacement(&weights, remaining, rng)
        .into_iter()
        .map(|i| i + elite_size)
        .collect();

    Selection {
        elites,
        sampled,
        used_uniform_fallback,
    }
}

/// Shifted, normalised probabilities, or `None` when they cannot support
/// drawing `sample_size` distinct candidates.
pub fn selection_probabilities(fitness: &[f64], sample_size: usize) -> Option<Vec<f64>> {
    if fitness.is_empty() {
        return None;
    }

    // Failed evaluations rank last; treat them as the worst finite score
    let worst_finite = fitness
        .iter()
        .copied()
        .filter(|f| f.is_finite())
        .fold(f64::INFINITY, f64::min);
    let worst_finite = if worst_finite.is_finite() { worst_finite } else { 0.0 };
    let sanitized: Vec<f64> = fitness
        .iter()
        .map(|&f| if f.is_finite() { f } else { worst_finite })
        .collect();

    let min = sanitized.iter().copied().fold(f64::INFINITY, f64::min);
    let shift = if min < 0.0 { -min } else { 0.0 };
    let shifted: Vec<f64> = sanitized.iter().map(|f| f + shift + SELECTION_EPSILON).collect();

    let total: f64 = shifted.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    let probabilities: Vec<f64> = shifted.iter().map(|f| (f / total).max(0.0)).collect();
    let positive = probabilities.iter().filter(|&&p| p > 0.0).count();
    if positive < sample_size {
        return None;
    }

    Some(probabilities)
}

/// Sequential roulette draws, removing each winner from the wheel
pub fn weighted_sample_without_replacement<R: Rng + ?Sized>(
    weights: &[f64],
    amount: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut pool: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
    let mut chosen = Vec::with_capacity(amount.min(pool.len()));

    while chosen.len() < amount && !pool.is_empty() {
        let total: f64 = pool.iter().map(|(_, w)| w).sum();
        let pick = if total > 0.0 && total.is_finite() {
            let mut spin = rng.gen::<f64>() * total;
            pool.iter()
                .position(|(_, w)| {
                    spin -= w;
                    spin < 0.0
                })
                .unwrap_or(pool.len() - 1)
        } else {
            rng.gen_range(0..pool.len())
        };
        chosen.push(pool.remove(pick).0);
    }

    chosen
}
