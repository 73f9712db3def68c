use std::hash::Hash;

use fxhash::FxHashMap;

/// Dense index space for the cells of a design
///
/// Indices are given in first-seen order and never change for the lifetime of the indexer.
#[derive(Debug, Clone)]
pub struct CellIndexer<T: Hash + Eq + Clone> {
    map: FxHashMap<T, u32>,
    cells: Vec<T>,
}

impl<T: Hash + Eq + Clone> Default for CellIndexer<T> {
    fn default() -> Self {
        CellIndexer {
            map: FxHashMap::default(),
            cells: Vec::new(),
        }
    }
}

impl<T: Hash + Eq + Clone> CellIndexer<T> {
    /// Create an empty indexer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cells indexed so far
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns whether no cell was indexed yet
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get the index of a cell, assigning a new one if the cell was not seen before
    pub fn index_of(&mut self, cell: &T) -> u32 {
        if let Some(i) = self.map.get(cell) {
            return *i;
        }
        let i = self.cells.len() as u32;
        self.map.insert(cell.clone(), i);
        self.cells.push(cell.clone());
        i
    }

    /// Get the index of a cell if it was already seen
    pub fn get(&self, cell: &T) -> Option<u32> {
        self.map.get(cell).copied()
    }

    /// Get the cell with a given index
    pub fn cell(&self, i: u32) -> &T {
        &self.cells[i as usize]
    }
}
