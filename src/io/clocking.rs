//! IO for clocking files
//!
//! A clocking is written on a single line, `Clocking` followed by the group of each chain.

use std::io::{BufRead, BufReader, Read, Write};

use itertools::Itertools;

use crate::Error;

/// Format a clocking as a single line, without line break
pub fn format_clocking(clocking: &[i32]) -> String {
    if clocking.is_empty() {
        "Clocking".to_string()
    } else {
        format!("Clocking {}", clocking.iter().join(" "))
    }
}

/// Write a clocking
pub fn write_clocking<W: Write>(w: &mut W, clocking: &[i32]) -> std::io::Result<()> {
    writeln!(w, "{}", format_clocking(clocking))
}

/// Read a clocking; other lines are ignored
pub fn read_clocking<R: Read>(r: R) -> Result<Vec<i32>, Error> {
    let mut nb_lines = 0;
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let l = l?;
        nb_lines = i + 1;
        let mut tokens = l.split_whitespace();
        if tokens.next() != Some("Clocking") {
            continue;
        }
        return tokens
            .map(|t| {
                t.parse::<i32>()
                    .ok()
                    .filter(|g| *g >= 0)
                    .ok_or_else(|| Error::parse(i + 1, format!("invalid group {}", t)))
            })
            .collect();
    }
    Err(Error::parse(nb_lines, "no Clocking line found"))
}
