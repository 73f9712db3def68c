//! Scan chain grouping against clock aggressors
//!
//! During scan shift, every chain of a design toggles its scan cells and the logic they drive.
//! Cells placed close to a clock buffer couple noise into it, and a scan cell whose clock
//! buffers see more switching than its neighbour's gets a different clock skew. Shifting the
//! chains in separate clock groups limits which cells switch together.
//!
//! This crate assigns scan chains to a fixed number of clock groups so that the worst group
//! sees as little aggressor switching as possible.
//!
//! # Usage
//!
//! ```bash
//! # Show statistics on a conflict model
//! scgroup show design.scm
//! # Group the chains in 4 groups with graph coloring
//! scgroup group design.scm -k 4 --method bounded-coloring -o design.clk
//! # Evaluate a saved clocking again
//! scgroup group design.scm -k 4 --clocking design.clk
//! # Evaluate 100 random groupings as a baseline
//! scgroup group design.scm -k 4 --method random --cases 100 --plot random.dat
//! # Export an integer linear program, and evaluate the solver's solution
//! scgroup export design.scm -k 4 --thr 2 -o design.zpl
//! scgroup import design.scm design.sol -k 4
//! # Generate a random model for benchmarking
//! scgroup generate random.scm --chains 16 --cells 5000
//! ```
//!
//! Logging is controlled with the `RUST_LOG` environment variable, and defaults to `info`.
//!
//! # Datastructures
//!
//! The grouping algorithms operate on a [`ConflictModel`], extracted once from the netlist and
//! the placement: for each scan cell, the cells that aggress its clock buffers, and for each
//! chain, the cells that switch when it shifts. Cells are dense indices.
//!
//! A clocking gives the group of each chain. Its cost is computed by [`CostFunction`]:
//! ```
//! # use scgroup::model::ConflictModel;
//! use scgroup::CostFunction;
//! let mut model = ConflictModel::new();
//! // Chain 0 impacts cell 0, and its only scan cell is aggressed by cell 1
//! model.add_chain(vec![vec![1]], vec![0]);
//! // Chain 1 impacts cell 1, and its only scan cell is aggressed by cell 0
//! model.add_chain(vec![vec![0]], vec![1]);
//! let mut cost = CostFunction::new(&model);
//! assert_eq!(cost.evaluate(&[0, 0], 1), 2);
//! assert_eq!(cost.evaluate(&[0, 1], 2), 0);
//! ```
//!
//! The netlist and the placement are not handled here. A [`model::ConflictSource`] hands over
//! the footprints of a design, and [`aggressor::PlacedDesign`] builds them from a
//! [`clock_tree::ClockTree`] and an [`aggressor::Placement`].

#![warn(missing_docs)]

pub mod aggressor;
pub mod clock_tree;
pub mod cmd;
pub mod colorize;
pub mod cost;
mod error;
pub mod grouping;
pub mod ilp;
pub mod io;
pub mod model;
pub mod wsa;

pub use colorize::GraphColorizer;
pub use cost::{CostFunction, EXCLUDED};
pub use error::Error;
pub use model::ConflictModel;
