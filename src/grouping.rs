//! Assignment of scan chains to clock groups
//!
//! All algorithms share a single capability, [`Grouper::calculate_clocking`], and are selected
//! by configuration through [`Algorithm`]. A clocking gives the group of each chain, in
//! `0..nb_groups`.
//!
//! ```
//! # use scgroup::model::generators::testcases;
//! use scgroup::grouping::{group_chains, Algorithm, GroupingConfig};
//! let model = testcases::ring(6);
//! let config = GroupingConfig {
//!     algorithm: Algorithm::BoundedColoring,
//!     ..Default::default()
//! };
//! let clocking = group_chains(&model, 2, &config);
//! assert_eq!(clocking.len(), 6);
//! ```

mod bounded_coloring;
pub mod enumerate;
mod genetic;
mod local_search;

pub use bounded_coloring::BoundedColoring;
pub use genetic::GeneticSearch;
pub use local_search::LocalSearch;

use crate::model::ConflictModel;

/// An algorithm that groups scan chains
pub trait Grouper {
    /// Compute the group of each chain
    fn calculate_clocking(&mut self, nb_groups: usize) -> Vec<i32>;
}

/// Available grouping algorithms
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    /// Random restarts followed by a few rounds of local improvement
    LocalSearch,
    /// Pairwise bound by graph coloring, refined with hyperedges
    #[default]
    BoundedColoring,
    /// Genetic algorithm with roulette selection
    Genetic,
}

/// Parameters of the grouping algorithms
#[derive(Clone, Debug)]
pub struct GroupingConfig {
    /// Algorithm to run
    pub algorithm: Algorithm,
    /// Seed of the randomized algorithms
    pub seed: u64,
    /// Show progress bars for long computations
    pub show_progress: bool,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        GroupingConfig {
            algorithm: Algorithm::default(),
            seed: 42,
            show_progress: false,
        }
    }
}

impl Algorithm {
    /// Create the grouper for a model
    pub fn grouper<'a>(
        self,
        model: &'a ConflictModel,
        config: &GroupingConfig,
    ) -> Box<dyn Grouper + 'a> {
        match self {
            Algorithm::LocalSearch => Box::new(LocalSearch::new(model, config.seed)),
            Algorithm::BoundedColoring => {
                Box::new(BoundedColoring::new(model).with_progress(config.show_progress))
            }
            Algorithm::Genetic => Box::new(GeneticSearch::new(model, config.seed)),
        }
    }
}

/// Group the chains of a model with the configured algorithm
///
/// With a single group, all chains are in group 0. With at least as many groups as chains,
/// each chain gets its own group and the algorithm is not run.
pub fn group_chains(model: &ConflictModel, nb_groups: usize, config: &GroupingConfig) -> Vec<i32> {
    assert!(nb_groups >= 1, "At least one group is required");
    let nb_chains = model.nb_chains();
    if nb_groups == 1 {
        tracing::info!("Single group available");
        return vec![0; nb_chains];
    }
    if nb_groups >= nb_chains {
        tracing::info!("Group count not below chain count, one chain per group");
        return (0..nb_chains as i32).collect();
    }
    tracing::info!(
        algorithm = ?config.algorithm,
        groups = nb_groups,
        chains = nb_chains,
        "Grouping started"
    );
    let clocking = config
        .algorithm
        .grouper(model, config)
        .calculate_clocking(nb_groups);
    tracing::info!("Grouping finished");
    clocking
}

#[cfg(test)]
mod tests {
    use super::{group_chains, Algorithm, GroupingConfig};
    use crate::cost::CostFunction;
    use crate::model::generators::{random, testcases};

    #[test]
    fn test_trivial_counts() {
        let model = testcases::three_chains();
        let config = GroupingConfig::default();
        assert_eq!(group_chains(&model, 1, &config), vec![0, 0, 0]);
        assert_eq!(group_chains(&model, 3, &config), vec![0, 1, 2]);
        assert_eq!(group_chains(&model, 5, &config), vec![0, 1, 2]);
    }

    #[test]
    fn test_all_algorithms() {
        let model = random::random_model(9, 4, 120, 10, 25, 11);
        let mut cost = CostFunction::new(&model);
        let upper = cost.evaluate(&[0; 9], 1);
        for algorithm in [
            Algorithm::LocalSearch,
            Algorithm::BoundedColoring,
            Algorithm::Genetic,
        ] {
            let config = GroupingConfig {
                algorithm,
                seed: 3,
                show_progress: false,
            };
            let clocking = group_chains(&model, 3, &config);
            assert_eq!(clocking.len(), 9);
            assert!(clocking.iter().all(|g| (0..3).contains(g)));
            assert!(cost.evaluate(&clocking, 3) <= upper);
        }
    }

    #[test]
    fn test_three_chains_separated() {
        let model = testcases::three_chains();
        for algorithm in [
            Algorithm::LocalSearch,
            Algorithm::BoundedColoring,
            Algorithm::Genetic,
        ] {
            let config = GroupingConfig {
                algorithm,
                ..Default::default()
            };
            let clocking = group_chains(&model, 2, &config);
            assert_ne!(clocking[0], clocking[2], "{:?}", algorithm);
        }
    }
}
