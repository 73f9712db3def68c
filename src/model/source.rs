use std::hash::Hash;

use crate::model::{CellIndexer, ConflictModel};

/// Interface to the tools that extract footprints from the netlist and the placement
///
/// Netlist traversal, placement lookup and simulation are not handled here: an implementation
/// of this trait hands over their results once, before any grouping algorithm runs.
pub trait ConflictSource {
    /// Cell type of the design
    type Cell: Hash + Eq + Clone;

    /// Number of scan chains
    fn nb_chains(&self) -> usize;

    /// Scan cells of a chain, in shift order
    fn scan_cells(&self, chain: usize) -> Vec<Self::Cell>;

    /// Cells that aggress the clock buffers of a scan cell; duplicates are kept
    fn aggressor_region(&self, cell: &Self::Cell) -> Vec<Self::Cell>;

    /// Cells impacted by shifting a chain, without pseudo cells
    fn impact_set(&self, chain: usize) -> Vec<Self::Cell>;
}

/// Build the conflict model from a source
///
/// Impact sets are indexed first, so that impacted cells get the lowest indices.
/// The indexer is returned to map indices back to cells.
pub fn build_model<S: ConflictSource>(source: &S) -> (ConflictModel, CellIndexer<S::Cell>) {
    let mut indexer = CellIndexer::new();
    let impacts: Vec<Vec<u32>> = (0..source.nb_chains())
        .map(|c| {
            source
                .impact_set(c)
                .iter()
                .map(|n| indexer.index_of(n))
                .collect()
        })
        .collect();

    let mut model = ConflictModel::new();
    for (c, impact) in impacts.into_iter().enumerate() {
        let cells = source
            .scan_cells(c)
            .iter()
            .map(|sc| {
                source
                    .aggressor_region(sc)
                    .iter()
                    .map(|n| indexer.index_of(n))
                    .collect()
            })
            .collect();
        model.add_chain(cells, impact);
    }
    model.reserve_cells(indexer.len());
    tracing::info!(
        chains = model.nb_chains(),
        cells = model.nb_cells(),
        aggressors = model.nb_aggressors(),
        "Conflict model built"
    );
    (model, indexer)
}

#[cfg(test)]
mod tests {
    use super::{build_model, ConflictSource};

    struct Named;

    impl ConflictSource for Named {
        type Cell = String;

        fn nb_chains(&self) -> usize {
            2
        }

        fn scan_cells(&self, chain: usize) -> Vec<String> {
            match chain {
                0 => vec!["ff0".into(), "ff1".into()],
                _ => vec!["ff2".into()],
            }
        }

        fn aggressor_region(&self, cell: &String) -> Vec<String> {
            match cell.as_str() {
                "ff0" => vec!["g1".into(), "g1".into()],
                "ff1" => vec!["ff2".into()],
                _ => vec!["g9".into()],
            }
        }

        fn impact_set(&self, chain: usize) -> Vec<String> {
            match chain {
                0 => vec!["ff0".into(), "ff1".into(), "g1".into()],
                _ => vec!["ff2".into(), "g2".into()],
            }
        }
    }

    #[test]
    fn test_build() {
        let (model, indexer) = build_model(&Named);
        assert_eq!(model.nb_chains(), 2);
        assert_eq!(indexer.len(), 6);
        assert_eq!(model.nb_cells(), 6);
        let g1 = indexer.get(&"g1".to_string()).unwrap();
        assert_eq!(model.chain(0).aggressors(0), &[g1, g1]);
        assert_eq!(model.chain(0).impact(), &[0, 1, 2]);
        assert_eq!(indexer.cell(model.chain(1).aggressors(0)[0]), "g9");
        model.check();
    }
}
