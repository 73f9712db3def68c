//! Model generators and templates

/// Small hand-written models to test functionality
pub mod testcases {
    use crate::model::ConflictModel;

    /// Three chains: chain 0 and chain 2 aggress each other's impact set, chain 1 has no aggressor
    ///
    /// Chain 0 impacts {0, 1}, chain 1 impacts {1, 2}, chain 2 impacts nothing.
    /// Chain 0 has two scan cells aggressed by {1} and {2}; chain 2 has two scan cells aggressed
    /// by {0, 0} and {1}.
    pub fn three_chains() -> ConflictModel {
        let mut ret = ConflictModel::new();
        ret.add_chain(vec![vec![1], vec![2]], vec![0, 1]);
        ret.add_chain(vec![vec![]], vec![1, 2]);
        ret.add_chain(vec![vec![0, 0], vec![1]], vec![]);
        ret.check();
        ret
    }

    /// Chains that each conflict with their neighbours in a ring
    ///
    /// Chain i aggresses the impact set of chain i+1, so that an even ring can be 2-colored
    /// without conflict and an odd ring cannot.
    pub fn ring(len: usize) -> ConflictModel {
        let mut ret = ConflictModel::new();
        for i in 0..len {
            let next = ((i + 1) % len) as u32;
            ret.add_chain(vec![vec![next]], vec![i as u32]);
        }
        ret.check();
        ret
    }
}

/// Randomized models, with spatial locality along a single dimension
pub mod random {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::model::ConflictModel;

    /// Generate a random model
    ///
    /// Cells live on a line of `nb_cells` positions. Each scan cell is aggressed by a window of
    /// `region` consecutive cells around a random position, and each chain impacts `impact`
    /// random cells.
    pub fn random_model(
        nb_chains: usize,
        chain_length: usize,
        nb_cells: usize,
        region: usize,
        impact: usize,
        seed: u64,
    ) -> ConflictModel {
        assert!(nb_cells > 0);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut ret = ConflictModel::new();
        for _ in 0..nb_chains {
            let mut cells = Vec::new();
            for _ in 0..chain_length {
                let center = rng.gen_range(0..nb_cells);
                let start = center.saturating_sub(region / 2);
                let end = (start + region).min(nb_cells);
                cells.push((start..end).map(|c| c as u32).collect());
            }
            let impacted = (0..impact)
                .map(|_| rng.gen_range(0..nb_cells) as u32)
                .collect();
            ret.add_chain(cells, impacted);
        }
        ret.reserve_cells(nb_cells);
        ret.check();
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::{random, testcases};

    #[test]
    fn test_three_chains() {
        let model = testcases::three_chains();
        assert_eq!(model.nb_chains(), 3);
        assert_eq!(model.nb_cells(), 3);
        assert_eq!(model.nb_aggressors(), 5);
    }

    #[test]
    fn test_ring() {
        for i in [1, 2, 3, 8] {
            let model = testcases::ring(i);
            assert_eq!(model.nb_chains(), i);
        }
    }

    #[test]
    fn test_random() {
        for seed in 0..4 {
            let model = random::random_model(8, 5, 100, 6, 20, seed);
            assert_eq!(model.nb_chains(), 8);
            assert_eq!(model.nb_cells(), 100);
            assert_eq!(model.max_chain_length(), 5);
            let other = random::random_model(8, 5, 100, 6, 20, seed);
            assert_eq!(model.chain(3), other.chain(3));
        }
    }
}
