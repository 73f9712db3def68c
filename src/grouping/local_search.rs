use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::cost::{CostFunction, EXCLUDED};
use crate::grouping::Grouper;
use crate::model::ConflictModel;

/// Number of consecutive random clockings without improvement before the random phase stops
const RANDOM_TIMEOUT: usize = 50;

/// Maximum number of local improvement rounds
const MAX_ROUNDS: usize = 10;

/// Random restarts, then moves of the worst chain to its best group
///
/// The running time is bounded by fixed iteration counts; there is no convergence guarantee.
pub struct LocalSearch<'a> {
    cost: CostFunction<'a>,
    rng: SmallRng,
}

impl<'a> LocalSearch<'a> {
    /// Create the algorithm for a model
    pub fn new(model: &'a ConflictModel, seed: u64) -> Self {
        LocalSearch {
            cost: CostFunction::new(model),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Sample random clockings until none improves for a while
    fn random_phase(&mut self, nb_groups: usize) -> Vec<i32> {
        let nb_chains = self.cost.nb_chains();
        let mut best = vec![0; nb_chains];
        let mut best_cost = f64::INFINITY;
        let mut candidate = vec![0; nb_chains];
        let mut tries = 0;
        while tries < RANDOM_TIMEOUT {
            tries += 1;
            for g in candidate.iter_mut() {
                *g = self.rng.gen_range(0..nb_groups) as i32;
            }
            let c = self.cost.evaluate_normalized(&candidate, nb_groups);
            if c < best_cost {
                best.copy_from_slice(&candidate);
                best_cost = c;
                tracing::debug!(cost = c, tries, "Better random clocking");
                tries = 0;
            }
        }
        tracing::info!(cost = best_cost, "Best after random search");
        best
    }

    /// Find the chain whose removal lowers the cost the most, if any lowers it
    fn find_worst_chain(&mut self, clocking: &mut [i32], nb_groups: usize) -> Option<usize> {
        let base = self.cost.evaluate_normalized(clocking, nb_groups);
        let mut worst = None;
        let mut highest_diff = 0.0;
        for chain in 0..clocking.len() {
            let g = clocking[chain];
            clocking[chain] = EXCLUDED;
            let diff = base - self.cost.evaluate_normalized(clocking, nb_groups);
            clocking[chain] = g;
            if diff > highest_diff {
                worst = Some(chain);
                highest_diff = diff;
            }
        }
        tracing::debug!(chain = ?worst, diff = highest_diff, "Worst chain");
        worst
    }

    /// Move a chain to the group that lowers the cost the most; return the improvement
    fn tweak_chain(&mut self, clocking: &mut [i32], nb_groups: usize, chain: usize) -> f64 {
        let old = clocking[chain];
        let base = self.cost.evaluate_normalized(clocking, nb_groups);
        let mut best = old;
        let mut highest_diff = 0.0;
        for g in 0..nb_groups as i32 {
            clocking[chain] = g;
            let diff = base - self.cost.evaluate_normalized(clocking, nb_groups);
            if diff > highest_diff {
                best = g;
                highest_diff = diff;
            }
        }
        clocking[chain] = best;
        if best == old {
            tracing::debug!(chain, "No better group found");
        }
        highest_diff
    }
}

impl Grouper for LocalSearch<'_> {
    fn calculate_clocking(&mut self, nb_groups: usize) -> Vec<i32> {
        let mut clocking = self.random_phase(nb_groups);
        for _ in 0..MAX_ROUNDS {
            let Some(chain) = self.find_worst_chain(&mut clocking, nb_groups) else {
                break;
            };
            if self.tweak_chain(&mut clocking, nb_groups, chain) == 0.0 {
                break;
            }
        }
        let c = self.cost.evaluate(&clocking, nb_groups);
        tracing::info!(cost = c, "Cost after local improvement");
        clocking
    }
}

#[cfg(test)]
mod tests {
    use super::LocalSearch;
    use crate::cost::CostFunction;
    use crate::grouping::Grouper;
    use crate::model::generators::{random, testcases};

    #[test]
    fn test_reproducible() {
        let model = random::random_model(10, 5, 150, 12, 30, 5);
        let a = LocalSearch::new(&model, 7).calculate_clocking(3);
        let b = LocalSearch::new(&model, 7).calculate_clocking(3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_small_ring() {
        let model = testcases::ring(4);
        let clocking = LocalSearch::new(&model, 1).calculate_clocking(3);
        let mut cost = CostFunction::new(&model);
        assert_eq!(cost.evaluate(&clocking, 3), 0);
    }

    #[test]
    fn test_improvement_not_worse() {
        let model = random::random_model(12, 4, 200, 15, 40, 9);
        let mut search = LocalSearch::new(&model, 4);
        let random_best = search.random_phase(4);
        let mut cost = CostFunction::new(&model);
        let before = cost.evaluate(&random_best, 4);
        let clocking = LocalSearch::new(&model, 4).calculate_clocking(4);
        assert!(cost.evaluate(&clocking, 4) <= before);
    }
}
