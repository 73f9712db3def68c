//! Baseline clockings, enumerated or random
//!
//! These are used to sample the cost distribution of a design rather than to optimize it.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Enumerate all partitions of the chains into at most `nb_groups` groups
///
/// Partitions are generated as restricted growth strings in lexicographic order: chain 0 is in
/// group 0, and each chain uses at most one group more than the chains before it. Each
/// partition is therefore generated once, regardless of group renaming.
#[derive(Clone, Debug)]
pub struct SeqGrouping {
    nb_groups: usize,
    current: Option<Vec<i32>>,
    nb_chains: usize,
}

impl SeqGrouping {
    /// Start the enumeration
    pub fn new(nb_chains: usize, nb_groups: usize) -> Self {
        assert!(nb_groups >= 1, "At least one group is required");
        SeqGrouping {
            nb_groups,
            current: Some(vec![0; nb_chains]),
            nb_chains,
        }
    }

    /// Start over from the first partition
    pub fn restart(&mut self) {
        self.current = Some(vec![0; self.nb_chains]);
    }

    /// Compute the partition following `c` in place; returns false after the last one
    fn advance(c: &mut [i32], nb_groups: usize) -> bool {
        let max_group = nb_groups as i32 - 1;
        // Prefix maximum before each position
        let mut prefix_max = vec![0; c.len()];
        for i in 1..c.len() {
            prefix_max[i] = prefix_max[i - 1].max(c[i - 1]);
        }
        for i in (1..c.len()).rev() {
            if c[i] < max_group && c[i] <= prefix_max[i] {
                c[i] += 1;
                for x in &mut c[i + 1..] {
                    *x = 0;
                }
                return true;
            }
        }
        false
    }
}

impl Iterator for SeqGrouping {
    type Item = Vec<i32>;

    fn next(&mut self) -> Option<Vec<i32>> {
        let ret = self.current.take()?;
        let mut next = ret.clone();
        if Self::advance(&mut next, self.nb_groups) {
            self.current = Some(next);
        }
        Some(ret)
    }
}

/// Infinite sequence of uniformly random clockings
#[derive(Clone, Debug)]
pub struct RandomGrouping {
    nb_chains: usize,
    nb_groups: usize,
    seed: u64,
    rng: SmallRng,
}

impl RandomGrouping {
    /// Start the sequence from a seed
    pub fn new(nb_chains: usize, nb_groups: usize, seed: u64) -> Self {
        assert!(nb_groups >= 1, "At least one group is required");
        RandomGrouping {
            nb_chains,
            nb_groups,
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Start over from the first clocking
    pub fn restart(&mut self) {
        self.rng = SmallRng::seed_from_u64(self.seed);
    }
}

impl Iterator for RandomGrouping {
    type Item = Vec<i32>;

    fn next(&mut self) -> Option<Vec<i32>> {
        Some(
            (0..self.nb_chains)
                .map(|_| self.rng.gen_range(0..self.nb_groups) as i32)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{RandomGrouping, SeqGrouping};
    use itertools::Itertools;

    #[test]
    fn test_counts() {
        // Sums of Stirling numbers of the second kind
        assert_eq!(SeqGrouping::new(4, 1).count(), 1);
        assert_eq!(SeqGrouping::new(4, 2).count(), 8);
        assert_eq!(SeqGrouping::new(4, 4).count(), 15);
        assert_eq!(SeqGrouping::new(5, 3).count(), 41);
        assert_eq!(SeqGrouping::new(6, 9).count(), 203);
        assert_eq!(SeqGrouping::new(1, 3).count(), 1);
    }

    #[test]
    fn test_order() {
        let all: Vec<Vec<i32>> = SeqGrouping::new(3, 2).collect();
        assert_eq!(
            all,
            vec![vec![0, 0, 0], vec![0, 0, 1], vec![0, 1, 0], vec![0, 1, 1]]
        );
        let all: Vec<Vec<i32>> = SeqGrouping::new(5, 3).collect();
        assert!(all.iter().all_unique());
        assert!(all.iter().flatten().all(|g| (0..3).contains(g)));
    }

    #[test]
    fn test_restart() {
        let mut seq = SeqGrouping::new(4, 2);
        let first = seq.next();
        assert_eq!(seq.by_ref().count(), 7);
        assert_eq!(seq.next(), None);
        seq.restart();
        assert_eq!(seq.next(), first);

        let mut rnd = RandomGrouping::new(6, 3, 12);
        let a: Vec<Vec<i32>> = rnd.by_ref().take(5).collect();
        rnd.restart();
        let b: Vec<Vec<i32>> = rnd.by_ref().take(5).collect();
        assert_eq!(a, b);
        assert!(a.iter().flatten().all(|g| (0..3).contains(g)));
    }
}
