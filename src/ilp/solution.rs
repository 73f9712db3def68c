use std::io::BufRead;

use crate::Error;

/// Clocking recovered from a solver solution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    clocking: Vec<i32>,
    seen: Vec<bool>,
}

impl Solution {
    /// Group of each chain; chains absent from the solution are in group 0
    pub fn clocking(&self) -> &[i32] {
        &self.clocking
    }

    /// Take the clocking
    pub fn into_clocking(self) -> Vec<i32> {
        self.clocking
    }

    /// Chains that no variable of the solution assigned to a group
    pub fn missing_chains(&self) -> Vec<usize> {
        (0..self.seen.len()).filter(|c| !self.seen[*c]).collect()
    }

    /// Returns whether every chain was assigned
    pub fn is_complete(&self) -> bool {
        self.seen.iter().all(|s| *s)
    }
}

/// Read a solver solution
///
/// Each line starts with a variable name, optionally followed by its value. Membership
/// variables (`x_` and `y_`) with a nonzero value, or without a value, assign their chain to
/// their group. Other lines are ignored, and reading stops once every chain is assigned.
pub fn read_solution<R: BufRead>(r: R, nb_chains: usize) -> Result<Solution, Error> {
    let mut clocking = vec![0; nb_chains];
    let mut seen = vec![false; nb_chains];
    let mut nb_seen = 0;
    for (i, line) in r.lines().enumerate() {
        if nb_seen == nb_chains {
            break;
        }
        let line = line?;
        let lineno = i + 1;
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            continue;
        };
        if !name.starts_with("x_") && !name.starts_with("y_") {
            continue;
        }
        if let Some(value) = tokens.next() {
            let value: f64 = value
                .parse()
                .map_err(|_| Error::parse(lineno, format!("invalid value {} for {}", value, name)))?;
            if value == 0.0 {
                continue;
            }
        }
        let parts: Vec<&str> = name.split('_').collect();
        if parts.len() != 4 {
            return Err(Error::parse(lineno, format!("invalid variable name {}", name)));
        }
        let chain: usize = parts[2]
            .parse()
            .map_err(|_| Error::parse(lineno, format!("invalid chain in {}", name)))?;
        let group: i32 = parts[3]
            .parse()
            .map_err(|_| Error::parse(lineno, format!("invalid group in {}", name)))?;
        if chain >= nb_chains {
            return Err(Error::parse(
                lineno,
                format!("chain {} out of range ({} chains)", chain, nb_chains),
            ));
        }
        clocking[chain] = group;
        if !seen[chain] {
            seen[chain] = true;
            nb_seen += 1;
        }
    }
    let ret = Solution { clocking, seen };
    let missing = ret.missing_chains();
    if !missing.is_empty() {
        tracing::debug!(?missing, "Chains not assigned by the solution");
    }
    Ok(ret)
}
