//! Coloring of constraint graphs between scan chains
//!
//! Nodes are chains and colors are clock groups. A pairwise edge requires two chains to be in
//! different groups; a hyperedge forbids all of its chains from sharing a single group.
//! Constraints are only ever added, so that a coloring problem can be tightened step by step.
//!
//! Coloring is first attempted with a DSATUR greedy pass, which is exact on most small
//! instances. When it fails, the problem is solved exactly with a SAT solver, so that
//! infeasibility is always a definite answer.

use std::cmp::Reverse;

use rustsat::solvers::{Solve, SolverResult};
use rustsat::types::{Clause, Lit, TernaryVal};
use rustsat_kissat::Kissat;

/// Constraint graph with a fixed number of colors
#[derive(Debug, Clone)]
pub struct GraphColorizer {
    nb_colors: usize,
    neighbours: Vec<Vec<usize>>,
    hyperedges: Vec<Box<[usize]>>,
    node_hyperedges: Vec<Vec<usize>>,
    nb_pairs: usize,
}

impl GraphColorizer {
    /// Create a colorizer without any constraint
    pub fn new(nb_nodes: usize, nb_colors: usize) -> Self {
        GraphColorizer {
            nb_colors,
            neighbours: vec![Vec::new(); nb_nodes],
            hyperedges: Vec::new(),
            node_hyperedges: vec![Vec::new(); nb_nodes],
            nb_pairs: 0,
        }
    }

    /// Return the number of nodes
    pub fn nb_nodes(&self) -> usize {
        self.neighbours.len()
    }

    /// Return the number of colors available
    pub fn nb_colors(&self) -> usize {
        self.nb_colors
    }

    /// Return the number of constraints, pairwise edges and hyperedges
    pub fn nb_edges(&self) -> usize {
        self.nb_pairs + self.hyperedges.len()
    }

    /// Require two nodes to have different colors
    pub fn add_edge(&mut self, i: usize, j: usize) {
        assert!(i < self.nb_nodes() && j < self.nb_nodes());
        assert_ne!(i, j, "An edge requires two different nodes");
        if self.neighbours[i].contains(&j) {
            return;
        }
        self.neighbours[i].push(j);
        self.neighbours[j].push(i);
        self.nb_pairs += 1;
    }

    /// Forbid a set of nodes to all share the same color
    ///
    /// A hyperedge with a single node cannot be satisfied.
    pub fn add_hyperedge(&mut self, nodes: &[usize]) {
        let mut edge = nodes.to_vec();
        edge.sort_unstable();
        edge.dedup();
        assert!(!edge.is_empty(), "Empty hyperedge");
        assert!(edge.iter().all(|n| *n < self.nb_nodes()));
        if edge.len() == 2 {
            self.add_edge(edge[0], edge[1]);
            return;
        }
        if self.hyperedges.iter().any(|h| **h == *edge) {
            return;
        }
        let id = self.hyperedges.len();
        for n in &edge {
            self.node_hyperedges[*n].push(id);
        }
        self.hyperedges.push(edge.into_boxed_slice());
    }

    /// Check that a coloring respects all constraints
    pub fn is_valid(&self, coloring: &[usize]) -> bool {
        if coloring.len() != self.nb_nodes() || coloring.iter().any(|c| *c >= self.nb_colors) {
            return false;
        }
        for (i, n) in self.neighbours.iter().enumerate() {
            if n.iter().any(|j| coloring[*j] == coloring[i]) {
                return false;
            }
        }
        self.hyperedges
            .iter()
            .all(|e| e.iter().any(|n| coloring[*n] != coloring[e[0]]))
    }

    /// Find a coloring respecting all constraints, or None if there is none
    ///
    /// The result only depends on the constraints and the number of colors.
    pub fn colorize(&self) -> Option<Vec<usize>> {
        if self.nb_nodes() == 0 {
            return Some(Vec::new());
        }
        if self.nb_colors == 0 {
            return None;
        }
        if let Some(coloring) = self.greedy() {
            debug_assert!(self.is_valid(&coloring));
            return Some(coloring);
        }
        let ret = self.exact();
        if let Some(coloring) = &ret {
            debug_assert!(self.is_valid(coloring));
        }
        ret
    }

    /// Returns whether the hyperedges of a node allow a color, given the nodes colored so far
    fn hyperedges_allow(&self, node: usize, color: usize, coloring: &[Option<usize>]) -> bool {
        self.node_hyperedges[node].iter().all(|e| {
            self.hyperedges[*e]
                .iter()
                .any(|n| *n != node && coloring[*n] != Some(color))
        })
    }

    /// DSATUR: color the most constrained node first, with the smallest allowed color
    fn greedy(&self) -> Option<Vec<usize>> {
        let n = self.nb_nodes();
        let degree: Vec<usize> = (0..n)
            .map(|i| self.neighbours[i].len() + self.node_hyperedges[i].len())
            .collect();
        let mut coloring: Vec<Option<usize>> = vec![None; n];
        let mut seen = vec![vec![false; self.nb_colors]; n];
        let mut saturation = vec![0; n];
        for _ in 0..n {
            let node = (0..n)
                .filter(|i| coloring[*i].is_none())
                .max_by_key(|i| (saturation[*i], degree[*i], Reverse(*i)))?;
            let color = (0..self.nb_colors)
                .find(|c| !seen[node][*c] && self.hyperedges_allow(node, *c, &coloring))?;
            coloring[node] = Some(color);
            for m in &self.neighbours[node] {
                if !seen[*m][color] {
                    seen[*m][color] = true;
                    saturation[*m] += 1;
                }
            }
        }
        coloring.into_iter().collect()
    }

    /// Exact coloring with a SAT solver, one variable per node and color
    fn exact(&self) -> Option<Vec<usize>> {
        let n = self.nb_nodes();
        let k = self.nb_colors;
        let lit = |node: usize, color: usize| Lit::positive((node * k + color) as u32);

        let mut clauses: Vec<Clause> = Vec::new();
        for i in 0..n {
            clauses.push((0..k).map(|c| lit(i, c)).collect());
        }
        for (i, neighbours) in self.neighbours.iter().enumerate() {
            for j in neighbours {
                if *j > i {
                    for c in 0..k {
                        clauses.push([!lit(i, c), !lit(*j, c)].into_iter().collect());
                    }
                }
            }
        }
        for e in &self.hyperedges {
            for c in 0..k {
                clauses.push(e.iter().map(|i| !lit(*i, c)).collect());
            }
        }
        // Colors are interchangeable
        clauses.push(std::iter::once(lit(0, 0)).collect());

        let mut solver = Kissat::default();
        for clause in clauses {
            if let Err(e) = solver.add_clause(clause) {
                tracing::error!("SAT solver rejected a clause: {}", e);
                return None;
            }
        }
        match solver.solve() {
            Ok(SolverResult::Sat) => {
                let mut ret = Vec::with_capacity(n);
                for i in 0..n {
                    let value = |c: usize| solver.lit_val(lit(i, c)).ok();
                    let color = (0..k)
                        .find(|c| value(*c) == Some(TernaryVal::True))
                        .or_else(|| (0..k).find(|c| value(*c) == Some(TernaryVal::DontCare)));
                    match color {
                        Some(c) => ret.push(c),
                        None => {
                            tracing::error!(node = i, "SAT solution without a color");
                            return None;
                        }
                    }
                }
                Some(ret)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::error!("SAT solver failure: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GraphColorizer;
    use itertools::Itertools;

    #[test]
    fn test_empty() {
        let g = GraphColorizer::new(0, 3);
        assert_eq!(g.colorize(), Some(Vec::new()));
        let g = GraphColorizer::new(4, 1);
        assert_eq!(g.colorize(), Some(vec![0; 4]));
        let g = GraphColorizer::new(2, 0);
        assert_eq!(g.colorize(), None);
    }

    #[test]
    fn test_pairs() {
        let mut g = GraphColorizer::new(3, 2);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(1, 0);
        assert_eq!(g.nb_edges(), 2);
        let c = g.colorize().unwrap();
        assert!(g.is_valid(&c));
        g.add_edge(0, 2);
        assert_eq!(g.colorize(), None);
    }

    #[test]
    fn test_cliques() {
        for k in 1..6 {
            let mut g = GraphColorizer::new(k + 1, k);
            for (i, j) in (0..=k).tuple_combinations() {
                g.add_edge(i, j);
            }
            assert_eq!(g.colorize(), None);
            let mut g = GraphColorizer::new(k, k);
            for (i, j) in (0..k).tuple_combinations() {
                g.add_edge(i, j);
            }
            let c = g.colorize().unwrap();
            assert!(g.is_valid(&c));
        }
    }

    #[test]
    fn test_hyperedges() {
        let mut g = GraphColorizer::new(4, 1);
        g.add_hyperedge(&[0, 1, 2]);
        assert_eq!(g.colorize(), None);

        let mut g = GraphColorizer::new(4, 2);
        g.add_hyperedge(&[0, 1, 2]);
        g.add_hyperedge(&[2, 1, 0, 1]);
        g.add_hyperedge(&[1, 2, 3]);
        assert_eq!(g.nb_edges(), 2);
        let c = g.colorize().unwrap();
        assert!(g.is_valid(&c));

        g.add_hyperedge(&[3]);
        assert_eq!(g.colorize(), None);
    }

    #[test]
    fn test_greedy_failure() {
        // DSATUR puts 0 and 1 together first, which leaves no color for 4
        let mut g = GraphColorizer::new(7, 2);
        g.add_edge(2, 3);
        g.add_edge(3, 4);
        g.add_hyperedge(&[0, 1, 4]);
        g.add_hyperedge(&[0, 1, 5]);
        g.add_hyperedge(&[0, 1, 6]);
        g.add_hyperedge(&[2, 5, 6]);
        assert!(g.greedy().is_none());
        assert!(g.is_valid(&[0, 1, 0, 1, 0, 1, 0]));
        let c = g.colorize().unwrap();
        assert!(g.is_valid(&c));
        assert_ne!(c[0], c[1]);

        // Exact infeasibility when 0 and 1 must share a color
        let mut g = GraphColorizer::new(5, 2);
        g.add_edge(0, 2);
        g.add_edge(1, 2);
        g.add_edge(2, 4);
        g.add_hyperedge(&[0, 1, 4]);
        assert!(g.greedy().is_none());
        assert_eq!(g.colorize(), None);
    }

    #[test]
    fn test_exhaustive_agreement() {
        // Odd cycles with a chord set, compared against brute force on 3 colors
        for n in 3..8 {
            let mut g = GraphColorizer::new(n, 3);
            for i in 0..n {
                g.add_edge(i, (i + 1) % n);
                if i + 2 < n {
                    g.add_hyperedge(&[i, i + 1, i + 2]);
                }
            }
            g.add_edge(0, n / 2);
            let brute = (0..n)
                .map(|_| 0..3)
                .multi_cartesian_product()
                .any(|c| g.is_valid(&c));
            let res = g.colorize();
            assert_eq!(res.is_some(), brute);
            if let Some(c) = res {
                assert!(g.is_valid(&c));
            }
        }
    }

    #[test]
    fn test_monotonic() {
        let mut g = GraphColorizer::new(5, 2);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(2, 0);
        assert_eq!(g.colorize(), None);
        g.add_hyperedge(&[2, 3, 4]);
        g.add_edge(3, 4);
        assert_eq!(g.colorize(), None);
    }

    #[test]
    fn test_deterministic() {
        let mut g = GraphColorizer::new(7, 3);
        for (i, j) in [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 0), (0, 3)] {
            g.add_edge(i, j);
        }
        g.add_hyperedge(&[1, 4, 6]);
        let a = g.colorize();
        let b = g.clone().colorize();
        assert!(a.is_some());
        assert_eq!(a, b);
    }
}
