use itertools::Itertools;
use kdam::{tqdm, BarExt};

use crate::colorize::GraphColorizer;
use crate::cost::{CostFunction, EXCLUDED};
use crate::grouping::Grouper;
use crate::model::ConflictModel;

/// Grouping by graph coloring between a lower and an upper bound on the cost
///
/// A pairwise bound is obtained by forbidding the pairs of chains that would be too costly
/// in the same group, and searching for the smallest threshold that is still colorable.
/// The coloring is then refined by adding hyperedges that forbid the worst group found so far,
/// until the coloring becomes infeasible or the bound is reached.
pub struct BoundedColoring<'a> {
    cost: CostFunction<'a>,
    show_progress: bool,
    lower_bound: u64,
    history: Vec<u64>,
}

impl<'a> BoundedColoring<'a> {
    /// Create the algorithm for a model
    pub fn new(model: &'a ConflictModel) -> Self {
        BoundedColoring {
            cost: CostFunction::new(model),
            show_progress: false,
            lower_bound: 0,
            history: Vec::new(),
        }
    }

    /// Show a progress bar during the pair cost computation
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Best known cost after the initial coloring and after each refinement step
    pub fn history(&self) -> &[u64] {
        &self.history
    }

    /// Lower bound on the optimal cost, from the pairwise coloring of the last run
    ///
    /// Refinement never tightens it: pairs above the bound stay separated, so the refined
    /// colorings may miss the optimum.
    pub fn lower_bound(&self) -> u64 {
        self.lower_bound
    }

    /// Cost of the clocking returned by the last run
    pub fn best_cost(&self) -> Option<u64> {
        self.history.last().copied()
    }

    /// Cost of each pair of chains alone in a group, indexed by `[i][j]` with `i < j`
    fn pair_costs(&mut self) -> Vec<Vec<u64>> {
        let n = self.cost.nb_chains();
        let mut ret = vec![vec![0; n]; n];
        let mut clocking = vec![EXCLUDED; n];
        let mut progress = tqdm!(
            total = n * n.saturating_sub(1) / 2,
            disable = !self.show_progress
        );
        progress.set_description("Pair costs");
        for (i, j) in (0..n).tuple_combinations() {
            clocking[i] = 0;
            clocking[j] = 0;
            ret[i][j] = self.cost.evaluate(&clocking, 1);
            clocking[i] = EXCLUDED;
            clocking[j] = EXCLUDED;
            let _ = progress.update(1);
        }
        ret
    }

    /// Colorizer that separates all pairs whose cost exceeds the threshold
    fn colorizer(pair_costs: &[Vec<u64>], nb_groups: usize, threshold: u64) -> GraphColorizer {
        let n = pair_costs.len();
        let mut g = GraphColorizer::new(n, nb_groups);
        for (i, j) in (0..n).tuple_combinations() {
            if pair_costs[i][j] > threshold {
                g.add_edge(i, j);
            }
        }
        g
    }

    /// Smallest threshold in `[lb, ub]` whose pairwise coloring is feasible
    ///
    /// The coloring at `ub` is always feasible, since no pair costs more than all chains together.
    fn search_lower_bound(pair_costs: &[Vec<u64>], nb_groups: usize, lb: u64, ub: u64) -> u64 {
        let (mut lb, mut ub) = (lb, ub);
        loop {
            let middle = lb + (ub - lb) / 2;
            let g = Self::colorizer(pair_costs, nb_groups, middle);
            if g.colorize().is_some() {
                tracing::debug!(
                    threshold = middle,
                    constraints = g.nb_edges(),
                    chains = g.nb_nodes(),
                    "Pairwise coloring feasible"
                );
                if middle > lb {
                    ub = middle;
                } else {
                    return middle;
                }
            } else {
                tracing::debug!(
                    threshold = middle,
                    constraints = g.nb_edges(),
                    chains = g.nb_nodes(),
                    "Pairwise coloring infeasible"
                );
                if middle + 1 < ub {
                    lb = middle;
                } else {
                    return middle + 1;
                }
            }
        }
    }

    /// Minimal set of chains of a group that still reaches the group's cost
    ///
    /// Chains are removed one by one, and kept out if the cost is unchanged.
    fn edge_for_group(&mut self, clocking: &[i32], group: usize) -> Vec<usize> {
        let mut probe: Vec<i32> = clocking
            .iter()
            .map(|g| if *g == group as i32 { 0 } else { EXCLUDED })
            .collect();
        let base = self.cost.evaluate(&probe, 1);
        let nb_members = probe.iter().filter(|g| **g == 0).count();
        for chain in 0..probe.len() {
            if probe[chain] == EXCLUDED {
                continue;
            }
            probe[chain] = EXCLUDED;
            if self.cost.evaluate(&probe, 1) != base {
                probe[chain] = 0;
            }
        }
        let edge: Vec<usize> = (0..probe.len()).filter(|c| probe[*c] == 0).collect();
        tracing::info!(
            group,
            chains = nb_members,
            size = edge.len(),
            "Forbidding worst group"
        );
        edge
    }
}

impl Grouper for BoundedColoring<'_> {
    fn calculate_clocking(&mut self, nb_groups: usize) -> Vec<i32> {
        let n = self.cost.nb_chains();
        self.history.clear();

        let upper_bound = self.cost.evaluate(&vec![0; n], 1);
        tracing::info!(bound = upper_bound, "Upper bound with a single group");
        let distinct: Vec<i32> = (0..n as i32).collect();
        let mut lower_bound = self.cost.evaluate(&distinct, n.max(1));
        tracing::info!(bound = lower_bound, "Lower bound with distinct groups");

        let pair_costs = self.pair_costs();
        let pairwise = Self::search_lower_bound(&pair_costs, nb_groups, lower_bound, upper_bound);
        lower_bound = lower_bound.max(pairwise);
        self.lower_bound = lower_bound;
        tracing::info!(bound = lower_bound, "Lower bound after pairwise coloring");

        let mut g = Self::colorizer(&pair_costs, nb_groups, lower_bound);
        let Some(coloring) = g.colorize() else {
            tracing::warn!("Pairwise coloring failed at the lower bound, using a single group");
            return vec![0; n];
        };
        let mut best: Vec<i32> = coloring.iter().map(|c| *c as i32).collect();
        let mut best_cost = self.cost.evaluate(&best, nb_groups);
        self.history.push(best_cost);
        tracing::info!(cost = best_cost, "Best known after pairwise coloring");

        // The cost function holds the evaluation of the current coloring
        let mut current = best.clone();
        while best_cost > lower_bound {
            let worst = self.cost.last_worst_group();
            let edge = self.edge_for_group(&current, worst);
            if edge.len() < 2 {
                break;
            }
            g.add_hyperedge(&edge);
            let Some(coloring) = g.colorize() else {
                tracing::info!(cost = best_cost, "Refinement infeasible, keeping best known");
                break;
            };
            current = coloring.iter().map(|c| *c as i32).collect();
            let c = self.cost.evaluate(&current, nb_groups);
            if c < best_cost {
                best.copy_from_slice(&current);
                best_cost = c;
                tracing::info!(cost = best_cost, "Best known improved");
            }
            self.history.push(best_cost);
        }
        // Leave the cost function state consistent with the returned clocking
        self.cost.evaluate(&best, nb_groups);
        best
    }
}

#[cfg(test)]
mod tests {
    use super::BoundedColoring;
    use crate::cost::CostFunction;
    use crate::grouping::enumerate::SeqGrouping;
    use crate::grouping::Grouper;
    use crate::model::generators::{random, testcases};

    #[test]
    fn test_three_chains() {
        let model = testcases::three_chains();
        let mut alg = BoundedColoring::new(&model);
        let clocking = alg.calculate_clocking(2);
        assert_eq!(alg.lower_bound(), 1);
        let mut cost = CostFunction::new(&model);
        assert_eq!(cost.evaluate(&clocking, 2), 1);
        assert_eq!(alg.history(), &[1]);
    }

    #[test]
    fn test_even_ring() {
        let model = testcases::ring(10);
        let mut alg = BoundedColoring::new(&model);
        let clocking = alg.calculate_clocking(2);
        let mut cost = CostFunction::new(&model);
        assert_eq!(cost.evaluate(&clocking, 2), 0);
        assert_eq!(alg.lower_bound(), 0);
    }

    #[test]
    fn test_odd_ring() {
        let model = testcases::ring(7);
        let mut alg = BoundedColoring::new(&model);
        let clocking = alg.calculate_clocking(2);
        assert!(clocking.iter().all(|g| (0..2).contains(g)));
        let mut cost = CostFunction::new(&model);
        let c = cost.evaluate(&clocking, 2);
        // Two groups cannot separate all neighbours of an odd ring
        assert!(c >= 1);
        assert!(alg.lower_bound() <= c);
        assert_eq!(alg.calculate_clocking(3).len(), 7);
    }

    #[test]
    fn test_non_regression() {
        for seed in 0..4 {
            let model = random::random_model(10, 5, 150, 12, 30, seed);
            let mut alg = BoundedColoring::new(&model);
            let clocking = alg.calculate_clocking(3);
            assert!(clocking.iter().all(|g| (0..3).contains(g)));
            let history = alg.history();
            assert!(!history.is_empty());
            for w in history.windows(2) {
                assert!(w[1] <= w[0]);
            }
            let mut cost = CostFunction::new(&model);
            let c = cost.evaluate(&clocking, 3);
            assert_eq!(Some(&c), history.last());
            assert!(alg.lower_bound() <= c);
            assert!(c <= cost.evaluate(&[0; 10], 1));
        }
    }

    #[test]
    fn test_bound_below_optimum() {
        for seed in 0..10 {
            let model = random::random_model(6, 3, 40, 8, 10, seed);
            for k in 2..4 {
                let mut cost = CostFunction::new(&model);
                let optimum = SeqGrouping::new(6, k)
                    .map(|c| cost.evaluate(&c, k))
                    .min()
                    .unwrap();
                let mut alg = BoundedColoring::new(&model);
                let clocking = alg.calculate_clocking(k);
                let c = cost.evaluate(&clocking, k);
                assert!(alg.lower_bound() <= optimum);
                assert!(optimum <= c);
                assert_eq!(alg.best_cost(), Some(c));
            }
        }
    }
}
