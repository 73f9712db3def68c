//! Conflict cost of a grouping
//!
//! When a clock group shifts, every cell impacted by one of its chains may switch. A scan cell
//! whose clock buffers are aggressed by such cells sees noise that depends on the grouping.
//! The conflict of a chain is the number of its aggressor entries that lie in the impact set
//! of another chain of the same group; aggressors in the chain's own impact set switch
//! whatever the grouping, and are not counted.
//!
//! The cost of a group is the sum of the conflicts of its chains, and the cost of a clocking
//! is the cost of its worst group.

use crate::model::ConflictModel;

/// Group id of a chain that takes no part in the evaluation
///
/// Setting `clocking[i] = EXCLUDED` removes chain i from every group, which lets algorithms
/// probe the contribution of a chain without reallocating the clocking.
pub const EXCLUDED: i32 = -1;

/// Incremental evaluation of clockings on a fixed model
///
/// The aggressors of each chain are preprocessed once: entries in the chain's own impact set
/// are dropped and the others are grouped by cell, with their multiplicity.
#[derive(Debug, Clone)]
pub struct CostFunction<'a> {
    model: &'a ConflictModel,
    external: Vec<Vec<(u32, u32)>>,
    nb_aggressors: usize,
    active: Vec<bool>,
    members: Vec<Vec<usize>>,
    group_costs: Vec<u64>,
    last_cost: u64,
    last_worst_group: usize,
}

impl<'a> CostFunction<'a> {
    /// Prepare the evaluation for a model
    pub fn new(model: &'a ConflictModel) -> Self {
        let mut external = Vec::with_capacity(model.nb_chains());
        for c in model.chains() {
            let mut cells: Vec<u32> = c.all_aggressors().filter(|a| !c.impacts(*a)).collect();
            cells.sort_unstable();
            let mut counted: Vec<(u32, u32)> = Vec::new();
            for a in cells {
                match counted.last_mut() {
                    Some((cell, nb)) if *cell == a => *nb += 1,
                    _ => counted.push((a, 1)),
                }
            }
            external.push(counted);
        }
        CostFunction {
            model,
            external,
            nb_aggressors: model.nb_aggressors(),
            active: vec![false; model.nb_cells()],
            members: Vec::new(),
            group_costs: Vec::new(),
            last_cost: 0,
            last_worst_group: 0,
        }
    }

    /// Model being evaluated
    pub fn model(&self) -> &'a ConflictModel {
        self.model
    }

    /// Number of chains, which is the expected length of a clocking
    pub fn nb_chains(&self) -> usize {
        self.model.nb_chains()
    }

    /// Compute the cost of a clocking
    ///
    /// Every entry must be [`EXCLUDED`] or a group index below `nb_groups`. The cost of each
    /// group and the worst group are recorded, and available until the next call.
    pub fn evaluate(&mut self, clocking: &[i32], nb_groups: usize) -> u64 {
        assert!(nb_groups >= 1, "At least one group is required");
        assert_eq!(clocking.len(), self.nb_chains());

        self.members.resize(nb_groups, Vec::new());
        for m in &mut self.members[..nb_groups] {
            m.clear();
        }
        for (chain, g) in clocking.iter().enumerate() {
            if *g == EXCLUDED {
                continue;
            }
            assert!(
                *g >= 0 && (*g as usize) < nb_groups,
                "Group {} of chain {} is out of range",
                g,
                chain
            );
            self.members[*g as usize].push(chain);
        }

        self.group_costs.clear();
        for g in 0..nb_groups {
            let cost = self.group_cost(g);
            self.group_costs.push(cost);
        }

        self.last_cost = 0;
        self.last_worst_group = 0;
        for (g, cost) in self.group_costs.iter().enumerate() {
            if *cost > self.last_cost {
                self.last_cost = *cost;
                self.last_worst_group = g;
            }
        }
        self.last_cost
    }

    /// Compute the cost of a clocking, normalized by the total number of aggressor entries
    ///
    /// This ranks clockings exactly like [`CostFunction::evaluate`].
    pub fn evaluate_normalized(&mut self, clocking: &[i32], nb_groups: usize) -> f64 {
        let cost = self.evaluate(clocking, nb_groups);
        cost as f64 / self.nb_aggressors.max(1) as f64
    }

    /// Cost of a group whose members have been collected
    fn group_cost(&mut self, g: usize) -> u64 {
        let members = &self.members[g];
        if members.len() < 2 {
            return 0;
        }
        for c in members {
            for cell in self.model.chain(*c).impact() {
                self.active[*cell as usize] = true;
            }
        }
        let mut cost = 0;
        for c in members {
            // No entry of the list is in the chain's own impact set: any active cell comes from another chain
            for (cell, nb) in &self.external[*c] {
                if self.active[*cell as usize] {
                    cost += *nb as u64;
                }
            }
        }
        for c in members {
            for cell in self.model.chain(*c).impact() {
                self.active[*cell as usize] = false;
            }
        }
        cost
    }

    /// Cost of each group at the last evaluation
    pub fn group_costs(&self) -> &[u64] {
        &self.group_costs
    }

    /// Cost returned by the last evaluation
    pub fn last_cost(&self) -> u64 {
        self.last_cost
    }

    /// Group with the highest cost at the last evaluation; the first one on ties
    pub fn last_worst_group(&self) -> usize {
        self.last_worst_group
    }
}
