//! Compute aggressor and impact statistics
//!
//! ```
//! # use scgroup::model::generators::testcases;
//! # let model = testcases::three_chains();
//! use scgroup::model::stats::stats;
//! let stats = stats(&model);
//!
//! // Chain 1 has no aggressor at all
//! assert_eq!(stats.chains[1].max_aggressors, 0);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::fmt;

use crate::model::{ConflictModel, ScanChain};

/// Aggressor and impact figures of a single chain
#[derive(Clone, Debug, Default)]
pub struct ChainStats {
    /// Number of scan cells
    pub length: usize,
    /// Smallest aggressor count of a scan cell
    pub min_aggressors: usize,
    /// Average aggressor count per scan cell, rounded down
    pub avg_aggressors: usize,
    /// Largest aggressor count of a scan cell
    pub max_aggressors: usize,
    /// Largest aggressor count difference between adjacent scan cells
    pub max_adjacent_difference: usize,
    /// Number of impacted cells
    pub nb_impacted: usize,
}

/// Size of the conflict data
#[derive(Clone, Debug)]
pub struct ModelStats {
    /// Number of chains
    pub nb_chains: usize,
    /// Number of indexed cells
    pub nb_cells: usize,
    /// Total number of aggressor entries
    pub nb_aggressors: usize,
    /// Length of the longest chain
    pub max_chain_length: usize,
    /// Per-chain figures
    pub chains: Vec<ChainStats>,
}

impl ModelStats {
    /// Write the per-chain figures as LaTeX table rows: chain, average aggressors, max difference
    pub fn write_table<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {
        for (i, c) in self.chains.iter().enumerate() {
            writeln!(
                w,
                "{} & {} & {}\\\\",
                i, c.avg_aggressors, c.max_adjacent_difference
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ModelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Chains: {}", self.nb_chains)?;
        writeln!(f, "  Cells: {}", self.nb_cells)?;
        writeln!(f, "  Aggressors: {}", self.nb_aggressors)?;
        writeln!(f, "  MaxChainLength: {}", self.max_chain_length)?;
        for (i, c) in self.chains.iter().enumerate() {
            writeln!(f, "  Chain {}:", i)?;
            writeln!(f, "      length: {}", c.length)?;
            writeln!(
                f,
                "      aggressors: min {} avg {} max {} max difference {}",
                c.min_aggressors, c.avg_aggressors, c.max_aggressors, c.max_adjacent_difference
            )?;
            writeln!(f, "      impacted: {}", c.nb_impacted)?;
        }
        fmt::Result::Ok(())
    }
}

fn chain_stats(c: &ScanChain) -> ChainStats {
    let sizes: Vec<usize> = c.cells().map(|a| a.len()).collect();
    if sizes.is_empty() {
        return ChainStats {
            nb_impacted: c.impact().len(),
            ..Default::default()
        };
    }
    ChainStats {
        length: sizes.len(),
        min_aggressors: sizes.iter().copied().min().unwrap_or(0),
        avg_aggressors: sizes.iter().sum::<usize>() / sizes.len(),
        max_aggressors: sizes.iter().copied().max().unwrap_or(0),
        max_adjacent_difference: sizes
            .windows(2)
            .map(|w| w[0].abs_diff(w[1]))
            .max()
            .unwrap_or(0),
        nb_impacted: c.impact().len(),
    }
}

/// Compute the statistics of the model
pub fn stats(model: &ConflictModel) -> ModelStats {
    ModelStats {
        nb_chains: model.nb_chains(),
        nb_cells: model.nb_cells(),
        nb_aggressors: model.nb_aggressors(),
        max_chain_length: model.max_chain_length(),
        chains: model.chains().map(chain_stats).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::stats;
    use crate::model::ConflictModel;

    #[test]
    fn test_chain_stats() {
        let mut model = ConflictModel::new();
        model.add_chain(vec![vec![0; 4], vec![1; 9], vec![2; 7]], vec![0, 1]);
        model.add_chain(vec![], vec![]);
        let s = stats(&model);
        assert_eq!(s.nb_chains, 2);
        assert_eq!(s.nb_aggressors, 20);
        let c = &s.chains[0];
        assert_eq!(c.length, 3);
        assert_eq!(c.min_aggressors, 4);
        assert_eq!(c.avg_aggressors, 6);
        assert_eq!(c.max_aggressors, 9);
        assert_eq!(c.max_adjacent_difference, 5);
        assert_eq!(c.nb_impacted, 2);
        assert_eq!(s.chains[1].length, 0);

        let mut table = Vec::new();
        s.write_table(&mut table).unwrap();
        let table = String::from_utf8(table).unwrap();
        assert!(table.starts_with("0 & 6 & 5\\\\\n"));
    }
}
