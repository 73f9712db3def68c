use std::fmt;

/// A scan chain as seen by the grouping algorithms
///
/// Each scan cell, in shift order, carries the list of cells that aggress its clock buffers.
/// The lists are kept as given: a cell near several buffers of the same path appears several times.
/// The impact set holds every cell whose switching is caused by shifting the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanChain {
    cells: Vec<Box<[u32]>>,
    impact: Box<[u32]>,
}

impl ScanChain {
    /// Create a scan chain from the aggressor list of each scan cell and the impact set
    pub fn new(cells: Vec<Vec<u32>>, mut impact: Vec<u32>) -> Self {
        impact.sort_unstable();
        impact.dedup();
        ScanChain {
            cells: cells.into_iter().map(|c| c.into_boxed_slice()).collect(),
            impact: impact.into_boxed_slice(),
        }
    }

    /// Return the number of scan cells in the chain
    pub fn nb_cells(&self) -> usize {
        self.cells.len()
    }

    /// Get the aggressors of the scan cell at position i
    pub fn aggressors(&self, i: usize) -> &[u32] {
        &self.cells[i]
    }

    /// Iterate over the aggressor lists of the scan cells, in shift order
    pub fn cells(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.cells.iter().map(|c| c.as_ref())
    }

    /// Iterate over all aggressor entries of the chain, with duplicates
    pub fn all_aggressors(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.iter().flat_map(|c| c.iter().copied())
    }

    /// Get the impact set, sorted
    pub fn impact(&self) -> &[u32] {
        &self.impact
    }

    /// Returns whether the cell belongs to the impact set
    pub fn impacts(&self, cell: u32) -> bool {
        self.impact.binary_search(&cell).is_ok()
    }
}

/// Aggressor and impact footprints of all scan chains of a design
///
/// Cells are identified by a dense index, shared by all chains. The model is built once
/// and is read-only for the grouping algorithms.
#[derive(Debug, Clone, Default)]
pub struct ConflictModel {
    nb_cells: usize,
    chains: Vec<ScanChain>,
}

impl ConflictModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of scan chains
    pub fn nb_chains(&self) -> usize {
        self.chains.len()
    }

    /// Return the size of the cell index space
    pub fn nb_cells(&self) -> usize {
        self.nb_cells
    }

    /// Get the chain at index i
    pub fn chain(&self, i: usize) -> &ScanChain {
        &self.chains[i]
    }

    /// Iterate over the chains
    pub fn chains(&self) -> impl Iterator<Item = &ScanChain> + '_ {
        self.chains.iter()
    }

    /// Total number of aggressor entries, counted with duplicates
    pub fn nb_aggressors(&self) -> usize {
        self.chains
            .iter()
            .map(|c| c.cells().map(|a| a.len()).sum::<usize>())
            .sum()
    }

    /// Length of the longest chain
    pub fn max_chain_length(&self) -> usize {
        self.chains.iter().map(|c| c.nb_cells()).max().unwrap_or(0)
    }

    /// Add a new chain, and return its index
    pub fn add_chain(&mut self, cells: Vec<Vec<u32>>, impact: Vec<u32>) -> usize {
        let chain = ScanChain::new(cells, impact);
        let max_cell = chain
            .all_aggressors()
            .chain(chain.impact().iter().copied())
            .max();
        if let Some(m) = max_cell {
            self.nb_cells = self.nb_cells.max(m as usize + 1);
        }
        self.chains.push(chain);
        self.chains.len() - 1
    }

    /// Extend the cell index space, for cells that appear in no footprint
    pub fn reserve_cells(&mut self, nb_cells: usize) {
        self.nb_cells = self.nb_cells.max(nb_cells);
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        for c in &self.chains {
            for a in c.all_aggressors() {
                assert!((a as usize) < self.nb_cells, "Aggressor out of the cell range");
            }
            for w in c.impact().windows(2) {
                assert!(w[0] < w[1], "Impact set is not sorted");
            }
            if let Some(m) = c.impact().last() {
                assert!((*m as usize) < self.nb_cells, "Impact out of the cell range");
            }
        }
    }
}

impl fmt::Display for ConflictModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ConflictModel with {} chains over {} cells:",
            self.nb_chains(),
            self.nb_cells()
        )?;
        for (i, c) in self.chains.iter().enumerate() {
            writeln!(
                f,
                "  chain {}: {} scan cells, {} impacted cells",
                i,
                c.nb_cells(),
                c.impact().len()
            )?;
        }
        Ok(())
    }
}
