//! Export of the grouping problem as an integer linear program
//!
//! The program is written in the ZIMPL language, with one binary variable per
//! (family, cell, chain, group):
//!  * `x_<cell>_<chain>_<group>`: aggressor cell of the chain, placed in the group
//!  * `z_<cell>_<chain>_<group>`: aggressor cell of the chain, switching in the group
//!  * `y_<cell>_<chain>_<group>`: impacted cell of the chain, placed in the group
//!
//! and a `conf<k>` indicator for each pair of adjacent scan cells whose switching aggressor
//! counts may differ by more than the skew threshold. The objective minimizes the number of
//! such conflicts. A solver solution is read back with [`read_solution`].

mod solution;

use std::fmt;
use std::io::Write;

use crate::model::ConflictModel;

pub use solution::{read_solution, Solution};

/// Variable family
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    /// Aggressor cell membership
    Aggressor,
    /// Aggressor cell activity
    Active,
    /// Impacted cell membership
    Impact,
}

impl Family {
    fn prefix(self) -> char {
        match self {
            Family::Aggressor => 'x',
            Family::Active => 'z',
            Family::Impact => 'y',
        }
    }
}

/// A binary variable of the program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Var {
    /// Family of the variable
    pub family: Family,
    /// Cell index
    pub cell: u32,
    /// Chain index
    pub chain: usize,
    /// Group index
    pub group: usize,
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.family.prefix(),
            self.cell,
            self.chain,
            self.group
        )
    }
}

/// A constraint of the program
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    /// All cells of a chain footprint are in the group, or none is
    SameGroup {
        /// Aggressor or impact footprint
        family: Family,
        /// Chain index
        chain: usize,
        /// Group index
        group: usize,
        /// Cells of the footprint
        cells: Vec<u32>,
    },
    /// A footprint cell is in exactly one group
    OneGroup {
        /// Aggressor or impact footprint
        family: Family,
        /// Chain index
        chain: usize,
        /// Cell index
        cell: u32,
        /// Number of groups
        nb_groups: usize,
    },
    /// The aggressor and impact footprints of a chain are in the same group
    Link {
        /// Chain index
        chain: usize,
        /// Group index
        group: usize,
        /// First aggressor cell of the chain
        aggressor: u32,
        /// First impacted cell of the chain
        impact: u32,
    },
    /// An aggressor cell switches if a chain of its group impacts it
    Activation {
        /// Chain index
        chain: usize,
        /// Cell index
        cell: u32,
        /// Group index
        group: usize,
        /// Chains that impact the cell
        impacting: Vec<usize>,
    },
    /// The switching aggressor counts of two adjacent scan cells differ by more than the threshold
    Skew {
        /// Index of the conflict indicator
        conflict: usize,
        /// Chain index
        chain: usize,
        /// Number of groups
        nb_groups: usize,
        /// Aggressors of the previous scan cell that may switch
        previous: Vec<u32>,
        /// Aggressors of the current scan cell that may switch
        current: Vec<u32>,
        /// Aggressors of the previous scan cell that always switch
        previous_self: usize,
        /// Aggressors of the current scan cell that always switch
        current_self: usize,
        /// Skew threshold
        threshold: usize,
    },
    /// A skew conflict that no grouping can avoid
    ForcedConflict {
        /// Index of the conflict indicator
        conflict: usize,
    },
}

impl Constraint {
    /// Conflict indicator introduced by the constraint, if any
    pub fn conflict(&self) -> Option<usize> {
        match self {
            Constraint::Skew { conflict, .. } | Constraint::ForcedConflict { conflict } => {
                Some(*conflict)
            }
            _ => None,
        }
    }
}

fn write_sum(f: &mut fmt::Formatter<'_>, vars: impl Iterator<Item = Var>) -> fmt::Result {
    for (i, v) in vars.enumerate() {
        if i != 0 {
            write!(f, " + ")?;
        }
        write!(f, "{}", v)?;
    }
    Ok(())
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Constraint::*;
        match self {
            SameGroup {
                family,
                chain,
                group,
                cells,
            } => {
                let var = |cell: u32| Var {
                    family: *family,
                    cell,
                    chain: *chain,
                    group: *group,
                };
                write!(f, "vif {} == 1 then ", var(cells[0]))?;
                write_sum(f, cells.iter().map(|c| var(*c)))?;
                write!(f, " == {} else ", cells.len())?;
                write_sum(f, cells.iter().map(|c| var(*c)))?;
                write!(f, " == 0 end")
            }
            OneGroup {
                family,
                chain,
                cell,
                nb_groups,
            } => {
                write_sum(
                    f,
                    (0..*nb_groups).map(|group| Var {
                        family: *family,
                        cell: *cell,
                        chain: *chain,
                        group,
                    }),
                )?;
                write!(f, " == 1")
            }
            Link {
                chain,
                group,
                aggressor,
                impact,
            } => {
                let x = Var {
                    family: Family::Aggressor,
                    cell: *aggressor,
                    chain: *chain,
                    group: *group,
                };
                let y = Var {
                    family: Family::Impact,
                    cell: *impact,
                    chain: *chain,
                    group: *group,
                };
                write!(f, "{} - {} == 0", x, y)
            }
            Activation {
                chain,
                cell,
                group,
                impacting,
            } => {
                let var = |family, chain| Var {
                    family,
                    cell: *cell,
                    chain,
                    group: *group,
                };
                write!(f, "vif {} * ( ", var(Family::Aggressor, *chain))?;
                write_sum(f, impacting.iter().map(|c| var(Family::Impact, *c)))?;
                let z = var(Family::Active, *chain);
                write!(f, " ) >= 1 then {} == 1 else {} == 0 end", z, z)
            }
            Skew {
                conflict,
                chain,
                nb_groups,
                previous,
                current,
                previous_self,
                current_self,
                threshold,
            } => {
                let var = |cell: u32, group| Var {
                    family: Family::Active,
                    cell,
                    chain: *chain,
                    group,
                };
                write!(f, "vif vabs(")?;
                for cell in previous {
                    for g in 0..*nb_groups {
                        write!(f, " + {}", var(*cell, g))?;
                    }
                }
                for cell in current {
                    for g in 0..*nb_groups {
                        write!(f, " - {}", var(*cell, g))?;
                    }
                }
                write!(
                    f,
                    " + {} - {} ) > {} then conf{} == 1 else conf{} == 0 end",
                    previous_self, current_self, threshold, conflict, conflict
                )
            }
            ForcedConflict { conflict } => write!(f, "conf{} == 1", conflict),
        }
    }
}

/// Remove the entries present in both lists, with multiplicity
fn remove_shared(previous: &mut Vec<u32>, current: &mut Vec<u32>) {
    let mut prev_kept = Vec::with_capacity(previous.len());
    for p in previous.drain(..) {
        match current.iter().position(|c| *c == p) {
            Some(i) => {
                current.remove(i);
            }
            None => prev_kept.push(p),
        }
    }
    *previous = prev_kept;
}

/// Integer linear program for a model, a group count and a skew threshold
#[derive(Clone, Debug)]
pub struct IlpModel {
    nb_groups: usize,
    variables: Vec<Var>,
    constraints: Vec<Constraint>,
    nb_conflicts: usize,
}

impl IlpModel {
    /// Build the program
    ///
    /// Only cells that belong to an impact set take part. The aggressor footprint of a chain is
    /// the union of the aggressors of its scan cells; its impact footprint is restricted to the
    /// cells that aggress some chain. Aggressors in a chain's own impact footprint always switch
    /// and get no variable.
    pub fn build(model: &ConflictModel, nb_groups: usize, threshold: usize) -> Self {
        assert!(nb_groups >= 1, "At least one group is required");
        let nb_chains = model.nb_chains();
        let mut in_impact = vec![false; model.nb_cells()];
        for c in model.chains() {
            for cell in c.impact() {
                in_impact[*cell as usize] = true;
            }
        }

        // Aggressor lists restricted to impacted cells, with duplicates
        let regions: Vec<Vec<Vec<u32>>> = model
            .chains()
            .map(|c| {
                c.cells()
                    .map(|a| {
                        a.iter()
                            .copied()
                            .filter(|n| in_impact[*n as usize])
                            .collect()
                    })
                    .collect()
            })
            .collect();
        let footprints: Vec<Vec<u32>> = regions
            .iter()
            .map(|r| {
                let mut f: Vec<u32> = r.iter().flatten().copied().collect();
                f.sort_unstable();
                f.dedup();
                f
            })
            .collect();
        let mut aggresses = vec![false; model.nb_cells()];
        for cell in footprints.iter().flatten() {
            aggresses[*cell as usize] = true;
        }
        let impacts: Vec<Vec<u32>> = model
            .chains()
            .map(|c| {
                c.impact()
                    .iter()
                    .copied()
                    .filter(|n| aggresses[*n as usize])
                    .collect()
            })
            .collect();
        let aggressors: Vec<Vec<u32>> = footprints
            .iter()
            .zip(impacts.iter())
            .map(|(f, i)| {
                f.iter()
                    .copied()
                    .filter(|n| i.binary_search(n).is_err())
                    .collect()
            })
            .collect();
        let mut impacting = vec![Vec::new(); model.nb_cells()];
        for (chain, i) in impacts.iter().enumerate() {
            for cell in i {
                impacting[*cell as usize].push(chain);
            }
        }

        let mut variables = Vec::new();
        for (family, cells) in [
            (Family::Aggressor, &aggressors),
            (Family::Active, &aggressors),
            (Family::Impact, &impacts),
        ] {
            for (chain, c) in cells.iter().enumerate() {
                for cell in c {
                    for group in 0..nb_groups {
                        variables.push(Var {
                            family,
                            cell: *cell,
                            chain,
                            group,
                        });
                    }
                }
            }
        }

        let mut constraints = Vec::new();
        for (family, cells) in [(Family::Aggressor, &aggressors), (Family::Impact, &impacts)] {
            for (chain, c) in cells.iter().enumerate() {
                if c.is_empty() {
                    continue;
                }
                for group in 0..nb_groups {
                    constraints.push(Constraint::SameGroup {
                        family,
                        chain,
                        group,
                        cells: c.clone(),
                    });
                }
            }
        }
        for (family, cells) in [(Family::Aggressor, &aggressors), (Family::Impact, &impacts)] {
            for (chain, c) in cells.iter().enumerate() {
                for cell in c {
                    constraints.push(Constraint::OneGroup {
                        family,
                        chain,
                        cell: *cell,
                        nb_groups,
                    });
                }
            }
        }
        for chain in 0..nb_chains {
            if let (Some(x), Some(y)) = (aggressors[chain].first(), impacts[chain].first()) {
                for group in 0..nb_groups {
                    constraints.push(Constraint::Link {
                        chain,
                        group,
                        aggressor: *x,
                        impact: *y,
                    });
                }
            }
        }
        for (chain, c) in aggressors.iter().enumerate() {
            for cell in c {
                let imp = &impacting[*cell as usize];
                if imp.is_empty() {
                    continue;
                }
                for group in 0..nb_groups {
                    constraints.push(Constraint::Activation {
                        chain,
                        cell: *cell,
                        group,
                        impacting: imp.clone(),
                    });
                }
            }
        }

        let mut nb_conflicts = 0;
        for (chain, r) in regions.iter().enumerate() {
            for w in r.windows(2) {
                let mut previous = w[0].clone();
                let mut current = w[1].clone();
                remove_shared(&mut previous, &mut current);
                let own = &impacts[chain];
                let previous_self = previous
                    .iter()
                    .filter(|n| own.binary_search(n).is_ok())
                    .count();
                let current_self = current
                    .iter()
                    .filter(|n| own.binary_search(n).is_ok())
                    .count();
                previous.retain(|n| own.binary_search(n).is_err());
                current.retain(|n| own.binary_search(n).is_err());
                tracing::debug!(
                    chain,
                    difference = previous.len().abs_diff(current.len()),
                    "Aggressor difference"
                );

                let possible =
                    (previous.len() + previous_self).max(current.len() + current_self);
                if possible <= threshold {
                    continue;
                }
                if !previous.is_empty() || !current.is_empty() {
                    constraints.push(Constraint::Skew {
                        conflict: nb_conflicts,
                        chain,
                        nb_groups,
                        previous,
                        current,
                        previous_self,
                        current_self,
                        threshold,
                    });
                    nb_conflicts += 1;
                } else if previous_self.abs_diff(current_self) > threshold {
                    constraints.push(Constraint::ForcedConflict {
                        conflict: nb_conflicts,
                    });
                    nb_conflicts += 1;
                }
            }
        }

        tracing::info!(
            variables = variables.len() + nb_conflicts,
            constraints = constraints.len(),
            conflicts = nb_conflicts,
            "Integer linear program built"
        );
        IlpModel {
            nb_groups,
            variables,
            constraints,
            nb_conflicts,
        }
    }

    /// Number of groups of the program
    pub fn nb_groups(&self) -> usize {
        self.nb_groups
    }

    /// Membership and activity variables, in declaration order
    pub fn variables(&self) -> &[Var] {
        &self.variables
    }

    /// Constraints, in emission order
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Number of conflict indicators
    pub fn nb_conflicts(&self) -> usize {
        self.nb_conflicts
    }

    /// Write the program in ZIMPL format
    pub fn write_zimpl<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        for v in &self.variables {
            writeln!(w, "var {} binary;", v)?;
        }
        writeln!(w)?;
        for (id, c) in self.constraints.iter().enumerate() {
            if let Some(k) = c.conflict() {
                writeln!(w, "var conf{} binary;", k)?;
            }
            writeln!(w, "subto c{}: {};", id, c)?;
        }
        write!(w, "minimize conflict:")?;
        if self.nb_conflicts == 0 {
            writeln!(w, " 0;")?;
        } else {
            for k in 0..self.nb_conflicts {
                write!(w, " + conf{}", k)?;
            }
            writeln!(w, ";")?;
        }
        Ok(())
    }
}
