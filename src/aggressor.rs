//! Aggressor regions from the placement
//!
//! The aggressors of a scan cell are the cells placed in a rectangle around each clock buffer
//! that drives it. Regions of several buffers are concatenated without removing duplicates, so
//! that a cell close to several buffers of the path weighs more.

use std::hash::Hash;

use crate::clock_tree::{collect_clock_buffers, ClockBufferInfo, ClockTree};
use crate::model::ConflictSource;

/// Width of a NAND2 cell, in nanometers
pub const NAND_WIDTH: i64 = 1920;

/// Height of a standard cell row, in nanometers
pub const ROW_HEIGHT: i64 = 2880;

/// Access to the positions of placed cells
pub trait Placement {
    /// Cell type of the design
    type Cell: Hash + Eq + Clone;

    /// Position of a cell in nanometers, if it is placed
    fn position(&self, cell: &Self::Cell) -> Option<(i64, i64)>;

    /// Cells placed in a rectangle, bounds included
    fn cells_in_rectangle(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<Self::Cell>;
}

/// Size of the aggressor region around a clock buffer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggressorRegionSize {
    /// Width, in NAND2 cell widths
    pub x: f64,
    /// Height, in cell rows
    pub y: f64,
}

impl Default for AggressorRegionSize {
    fn default() -> Self {
        AggressorRegionSize { x: 200.0, y: 8.0 }
    }
}

impl AggressorRegionSize {
    /// Size in nanometers
    pub fn in_nm(&self) -> (i64, i64) {
        (
            (self.x * NAND_WIDTH as f64) as i64,
            (self.y * ROW_HEIGHT as f64) as i64,
        )
    }
}

/// Cells in the aggressor region of each buffer, concatenated
pub fn aggressor_region<P: Placement>(
    placement: &P,
    buffers: &[P::Cell],
    size: AggressorRegionSize,
) -> Vec<P::Cell> {
    let (w, h) = size.in_nm();
    let mut ret = Vec::new();
    for b in buffers {
        let Some((x, y)) = placement.position(b) else {
            tracing::warn!("Clock buffer without a position, ignored");
            continue;
        };
        ret.extend(placement.cells_in_rectangle(x - w / 2, y - h / 2, x + w / 2, y + h / 2));
    }
    ret
}

/// A placed design with scan chains, ready to extract a conflict model
///
/// Impact sets are completed with the scan cells of the chain and the clock buffers that drive
/// them.
pub struct PlacedDesign<'a, P: Placement> {
    placement: &'a P,
    size: AggressorRegionSize,
    chains: Vec<Vec<P::Cell>>,
    cones: Vec<Vec<P::Cell>>,
    buffers: ClockBufferInfo<P::Cell>,
}

impl<'a, P: Placement> PlacedDesign<'a, P>
where
    P::Cell: std::fmt::Debug,
{
    /// Collect the clock buffers of the chains
    ///
    /// `cones` gives, for each chain, the combinational fan-out cones of its scan cells with
    /// pseudo cells already removed.
    pub fn new<T: ClockTree<Node = P::Cell>>(
        placement: &'a P,
        tree: &T,
        chains: Vec<Vec<P::Cell>>,
        cones: Vec<Vec<P::Cell>>,
        size: AggressorRegionSize,
    ) -> Self {
        assert_eq!(chains.len(), cones.len());
        let buffers = collect_clock_buffers(tree, &chains);
        let (w, h) = size.in_nm();
        tracing::info!(x = size.x, y = size.y, x_nm = w, y_nm = h, "Aggressor region size");
        PlacedDesign {
            placement,
            size,
            chains,
            cones,
            buffers,
        }
    }

    /// Clock buffers of the scan cells
    pub fn buffers(&self) -> &ClockBufferInfo<P::Cell> {
        &self.buffers
    }
}

impl<P: Placement> ConflictSource for PlacedDesign<'_, P>
where
    P::Cell: std::fmt::Debug,
{
    type Cell = P::Cell;

    fn nb_chains(&self) -> usize {
        self.chains.len()
    }

    fn scan_cells(&self, chain: usize) -> Vec<P::Cell> {
        self.chains[chain].clone()
    }

    fn aggressor_region(&self, cell: &P::Cell) -> Vec<P::Cell> {
        aggressor_region(self.placement, self.buffers.buffers(cell), self.size)
    }

    fn impact_set(&self, chain: usize) -> Vec<P::Cell> {
        let mut ret = self.chains[chain].clone();
        ret.extend(self.cones[chain].iter().cloned());
        for c in &self.chains[chain] {
            ret.extend(self.buffers.buffers(c).iter().cloned());
        }
        let mut seen = fxhash::FxHashSet::default();
        ret.retain(|c| seen.insert(c.clone()));
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::{aggressor_region, AggressorRegionSize, PlacedDesign, Placement};
    use crate::clock_tree::tests::gated_tree;
    use crate::model::build_model;

    struct PointPlacement(Vec<(&'static str, i64, i64)>);

    impl Placement for PointPlacement {
        type Cell = &'static str;

        fn position(&self, cell: &&'static str) -> Option<(i64, i64)> {
            self.0
                .iter()
                .find(|(c, _, _)| c == cell)
                .map(|(_, x, y)| (*x, *y))
        }

        fn cells_in_rectangle(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<&'static str> {
            self.0
                .iter()
                .filter(|(_, x, y)| (x0..=x1).contains(x) && (y0..=y1).contains(y))
                .map(|(c, _, _)| *c)
                .collect()
        }
    }

    fn placement() -> PointPlacement {
        PointPlacement(vec![
            ("b1", 0, 0),
            ("b2", 500_000, 0),
            ("cg", 1_000_000, 0),
            ("b0", 1_000_000, 100_000),
            ("and", 2_000_000, 0),
            ("u1", 100_000, 11_000),
            ("u2", 450_000, -5_000),
            ("u3", 2_100_000, 0),
        ])
    }

    #[test]
    fn test_size() {
        let s = AggressorRegionSize::default();
        assert_eq!(s.in_nm(), (384_000, 23_040));
        let s = AggressorRegionSize { x: 0.5, y: 1.0 };
        assert_eq!(s.in_nm(), (960, 2880));
    }

    #[test]
    fn test_region() {
        let p = placement();
        let size = AggressorRegionSize::default();
        assert_eq!(aggressor_region(&p, &["b1"], size), vec!["b1", "u1"]);
        // Regions are concatenated, with duplicates
        assert_eq!(
            aggressor_region(&p, &["b1", "b1", "missing"], size),
            vec!["b1", "u1", "b1", "u1"]
        );
        assert_eq!(aggressor_region(&p, &["and"], size), vec!["and", "u3"]);
    }

    #[test]
    fn test_design() {
        let p = placement();
        let tree = gated_tree();
        let design = PlacedDesign::new(
            &p,
            &tree,
            vec![vec!["ff0", "ff1"], vec!["ff2"]],
            vec![vec!["u1"], vec!["u3", "u2"]],
            AggressorRegionSize::default(),
        );
        assert_eq!(design.buffers().all_buffers().len(), 5);
        let (model, indexer) = build_model(&design);
        model.check();
        assert_eq!(model.nb_chains(), 2);
        assert_eq!(model.chain(0).nb_cells(), 2);
        // Chain 1 is aggressed by u3, which it impacts itself
        let u3 = indexer.get(&"u3").unwrap();
        assert!(model.chain(1).aggressors(0).contains(&u3));
        assert!(model.chain(1).impacts(u3));
        // Chain 0 impacts its scan cells, its cone and its buffers
        assert_eq!(model.chain(0).impact().len(), 7);
    }
}
