use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::cost::CostFunction;
use crate::grouping::Grouper;
use crate::model::ConflictModel;

/// Number of individuals in the population
const POPULATION: usize = 32;

/// Base offset to turn a cost into a fitness
const FITNESS_OFFSET: u64 = 10000;

/// Expected number of copies of the fittest individual after scaling
const SCALING: f64 = 1.5;

/// Number of generations without improvement before stopping
const STALL_LIMIT: usize = 6;

/// Each selected gene is mutated with probability 1 / MUTATION_ODDS
const MUTATION_ODDS: u32 = 9;

/// Genetic algorithm over clockings
///
/// Each individual is a complete clocking. Selection is a roulette on linearly scaled fitness,
/// the best individual is kept unchanged in the next generation, and the others go through
/// two-point crossover and sparse mutation.
pub struct GeneticSearch<'a> {
    cost: CostFunction<'a>,
    rng: SmallRng,
    history: Vec<u64>,
}

impl<'a> GeneticSearch<'a> {
    /// Create the algorithm for a model
    pub fn new(model: &'a ConflictModel, seed: u64) -> Self {
        GeneticSearch {
            cost: CostFunction::new(model),
            rng: SmallRng::seed_from_u64(seed),
            history: Vec::new(),
        }
    }

    /// Lowest cost in the population at each generation of the last run
    pub fn history(&self) -> &[u64] {
        &self.history
    }

    fn random_individual(&mut self, nb_groups: usize) -> Vec<i32> {
        (0..self.cost.nb_chains())
            .map(|_| self.rng.gen_range(0..nb_groups) as i32)
            .collect()
    }

    fn evaluate_all(&mut self, population: &[Vec<i32>], nb_groups: usize) -> Vec<u64> {
        population
            .iter()
            .map(|ind| self.cost.evaluate(ind, nb_groups))
            .collect()
    }

    /// Roulette selection, with the fittest individual copied to slot 0
    fn select(&mut self, population: &[Vec<i32>], costs: &[u64]) -> Vec<Vec<i32>> {
        let weights = scaled_fitness(costs);
        let roulette = WeightedIndex::new(&weights).ok();
        let mut ret = Vec::with_capacity(POPULATION);
        ret.push(population[fittest(costs)].clone());
        while ret.len() < population.len() {
            let i = match &roulette {
                Some(w) => w.sample(&mut self.rng),
                None => self.rng.gen_range(0..population.len()),
            };
            ret.push(population[i].clone());
        }
        ret
    }

    /// Two-point crossover on disjoint random pairs, leaving the elite untouched
    fn crossover(&mut self, population: &mut [Vec<i32>]) {
        let n = self.cost.nb_chains();
        if n < 2 {
            return;
        }
        let p0 = self.rng.gen_range(0..n);
        let mut p1 = self.rng.gen_range(0..n);
        while p1 == p0 {
            p1 = self.rng.gen_range(0..n);
        }
        let (p0, p1) = (p0.min(p1), p0.max(p1));

        let mut order: Vec<usize> = (1..population.len()).collect();
        order.shuffle(&mut self.rng);
        for pair in order.chunks_exact(2) {
            let (i, j) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
            let (left, right) = population.split_at_mut(j);
            left[i][p0..=p1].swap_with_slice(&mut right[0][p0..=p1]);
        }
    }

    /// Re-randomize two gene positions, each with a small probability per individual
    fn mutate(&mut self, population: &mut [Vec<i32>], nb_groups: usize) {
        let n = self.cost.nb_chains();
        if n == 0 {
            return;
        }
        let m0 = self.rng.gen_range(0..n);
        let m1 = self.rng.gen_range(0..n);
        for ind in population.iter_mut().skip(1) {
            for m in [m0, m1] {
                if self.rng.gen_ratio(1, MUTATION_ODDS) {
                    ind[m] = self.rng.gen_range(0..nb_groups) as i32;
                }
            }
        }
    }
}

/// Index of the individual with the lowest cost; the first one on ties
fn fittest(costs: &[u64]) -> usize {
    let mut best = 0;
    for (i, c) in costs.iter().enumerate() {
        if *c < costs[best] {
            best = i;
        }
    }
    best
}

/// Selection weights from costs, with Goldberg linear scaling
///
/// All weights are zero when the population is uniform, which the caller treats as a uniform draw.
fn scaled_fitness(costs: &[u64]) -> Vec<f64> {
    let max_cost = costs.iter().copied().max().unwrap_or(0);
    let offset = FITNESS_OFFSET.max(max_cost + 1);
    let fitness: Vec<f64> = costs.iter().map(|c| (offset - c) as f64).collect();
    let avg = fitness.iter().sum::<f64>() / fitness.len() as f64;
    let max = fitness.iter().copied().fold(f64::MIN, f64::max);
    let min = fitness.iter().copied().fold(f64::MAX, f64::min);
    if max - avg <= 0.0 {
        return vec![0.0; fitness.len()];
    }
    let (mut a, mut b) = (
        avg * (SCALING - 1.0) / (max - avg),
        avg * (max - SCALING * avg) / (max - avg),
    );
    if a * min + b < 0.0 {
        // Scale so that the least fit individual gets zero
        a = avg / (avg - min);
        b = -min * avg / (avg - min);
    }
    fitness.iter().map(|f| (a * f + b).max(0.0)).collect()
}

impl Grouper for GeneticSearch<'_> {
    fn calculate_clocking(&mut self, nb_groups: usize) -> Vec<i32> {
        self.history.clear();
        let mut population: Vec<Vec<i32>> = (0..POPULATION)
            .map(|_| self.random_individual(nb_groups))
            .collect();
        let mut costs = self.evaluate_all(&population, nb_groups);
        let mut best = population[fittest(&costs)].clone();
        let mut best_cost = costs[fittest(&costs)];
        tracing::info!(cost = best_cost, "Initial population generated");

        let mut stall = 0;
        let mut generation = 0;
        while stall < STALL_LIMIT {
            generation += 1;
            population = self.select(&population, &costs);
            self.crossover(&mut population);
            self.mutate(&mut population, nb_groups);
            costs = self.evaluate_all(&population, nb_groups);

            let i = fittest(&costs);
            self.history.push(costs[i]);
            tracing::debug!(generation, cost = costs[i], "Lowest cost of the generation");
            if costs[i] < best_cost {
                best_cost = costs[i];
                best.clone_from(&population[i]);
                stall = 0;
            } else {
                stall += 1;
            }
        }
        tracing::info!(generation, cost = best_cost, "Genetic search finished");
        best
    }
}

#[cfg(test)]
mod tests {
    use super::{fittest, scaled_fitness, GeneticSearch};
    use crate::cost::CostFunction;
    use crate::grouping::Grouper;
    use crate::model::generators::{random, testcases};

    #[test]
    fn test_scaling() {
        let w = scaled_fitness(&[5, 5, 5]);
        assert!(w.iter().all(|x| *x == 0.0));
        let w = scaled_fitness(&[0, 10, 20, 30]);
        assert!(w[0] > w[1] && w[1] > w[2] && w[2] > w[3]);
        assert!(w.iter().all(|x| *x >= 0.0));
        // Expected copies of the best individual
        let avg = w.iter().sum::<f64>() / 4.0;
        assert!((w[0] / avg - 1.5).abs() < 1e-9);
        // Costs above the offset keep a positive fitness
        let w = scaled_fitness(&[20000, 0]);
        assert!(w[1] > w[0]);
        assert_eq!(fittest(&[3, 1, 1, 2]), 1);
    }

    #[test]
    fn test_elitism() {
        let model = random::random_model(12, 5, 200, 15, 40, 2);
        let mut alg = GeneticSearch::new(&model, 8);
        let clocking = alg.calculate_clocking(3);
        let history = alg.history();
        assert!(history.len() >= 6);
        for w in history.windows(2) {
            assert!(w[1] <= w[0]);
        }
        let mut cost = CostFunction::new(&model);
        assert_eq!(Some(&cost.evaluate(&clocking, 3)), history.last());
    }

    #[test]
    fn test_reproducible() {
        let model = random::random_model(8, 4, 100, 10, 20, 6);
        let a = GeneticSearch::new(&model, 1).calculate_clocking(2);
        let b = GeneticSearch::new(&model, 1).calculate_clocking(2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_chain() {
        let model = testcases::ring(1);
        let clocking = GeneticSearch::new(&model, 0).calculate_clocking(2);
        assert_eq!(clocking.len(), 1);
    }
}
