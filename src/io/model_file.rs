//! IO for conflict model files (.scm)
//!
//! The format is line oriented, with `#` comments:
//! ```text
//! cells 4
//! chain
//! impact 0 1
//! cell 1
//! cell 2
//! ```
//! `cells` optionally declares the size of the cell index space, before the first chain; all
//! indices must then be below it. `chain` starts a new chain, `impact` adds cells to its impact
//! set, and `cell` appends a scan cell with the list of its aggressors, duplicates included.
//!
//! The cell space is dense: it may not exceed [`MAX_CELLS`].

use std::io::{BufRead, BufReader, Read, Write};

use itertools::Itertools;

use crate::model::ConflictModel;
use crate::Error;

/// Largest cell index space accepted in a model file
pub const MAX_CELLS: usize = 1 << 24;

fn parse_indices<'a>(
    tokens: impl Iterator<Item = &'a str>,
    lineno: usize,
    nb_cells: usize,
) -> Result<Vec<u32>, Error> {
    tokens
        .map(|t| {
            let i = t
                .parse::<u32>()
                .map_err(|_| Error::parse(lineno, format!("invalid cell index {}", t)))?;
            if i as usize >= nb_cells {
                return Err(Error::parse(
                    lineno,
                    format!("cell index {} out of the {} cells", i, nb_cells),
                ));
            }
            Ok(i)
        })
        .collect()
}

/// Read a conflict model
pub fn read_model<R: Read>(r: R) -> Result<ConflictModel, Error> {
    // Chains as (scan cells, impact set)
    let mut chains: Vec<(Vec<Vec<u32>>, Vec<u32>)> = Vec::new();
    let mut declared: Option<usize> = None;
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let l = l?;
        let lineno = i + 1;
        let t = l.split('#').next().unwrap_or("").trim();
        if t.is_empty() {
            continue;
        }
        let mut tokens = t.split_whitespace();
        let keyword = tokens.next().unwrap_or("");
        match keyword {
            "cells" => {
                if declared.is_some() || !chains.is_empty() {
                    return Err(Error::parse(lineno, "cells must come once, before the chains"));
                }
                let nb_cells = match (tokens.next(), tokens.next()) {
                    (Some(t), None) => t.parse::<usize>().ok(),
                    _ => None,
                };
                match nb_cells {
                    Some(n) if n <= MAX_CELLS => declared = Some(n),
                    _ => {
                        return Err(Error::parse(
                            lineno,
                            format!("cells takes a count of at most {}", MAX_CELLS),
                        ))
                    }
                }
            }
            "chain" => {
                if tokens.next().is_some() {
                    return Err(Error::parse(lineno, "chain takes no argument"));
                }
                chains.push((Vec::new(), Vec::new()));
            }
            "impact" | "cell" => {
                let indices = parse_indices(tokens, lineno, declared.unwrap_or(MAX_CELLS))?;
                let Some(chain) = chains.last_mut() else {
                    return Err(Error::parse(
                        lineno,
                        format!("{} before the first chain", keyword),
                    ));
                };
                if keyword == "impact" {
                    chain.1.extend(indices);
                } else {
                    chain.0.push(indices);
                }
            }
            _ => {
                return Err(Error::parse(lineno, format!("unknown keyword {}", keyword)));
            }
        }
    }
    let mut model = ConflictModel::new();
    for (cells, impact) in chains {
        model.add_chain(cells, impact);
    }
    if let Some(n) = declared {
        model.reserve_cells(n);
    }
    Ok(model)
}

/// Write a conflict model
pub fn write_model<W: Write>(w: &mut W, model: &ConflictModel) -> std::io::Result<()> {
    writeln!(w, "# Scan chain conflict model")?;
    writeln!(w, "# {} chains", model.nb_chains())?;
    writeln!(w, "cells {}", model.nb_cells())?;
    for c in model.chains() {
        writeln!(w, "chain")?;
        if c.impact().is_empty() {
            writeln!(w, "impact")?;
        } else {
            writeln!(w, "impact {}", c.impact().iter().join(" "))?;
        }
        for a in c.cells() {
            if a.is_empty() {
                writeln!(w, "cell")?;
            } else {
                writeln!(w, "cell {}", a.iter().join(" "))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{read_model, write_model};
    use crate::model::generators::{random, testcases};
    use crate::Error;

    #[test]
    fn test_hand_written() {
        let text = "\
# Three chains
chain
impact 0 1
cell 1
cell 2   # second scan cell

chain
impact 1
impact 2
cell
chain
cell 0 0
cell 1
";
        let model = read_model(text.as_bytes()).unwrap();
        let expected = testcases::three_chains();
        assert_eq!(model.nb_chains(), 3);
        assert_eq!(model.nb_cells(), 3);
        for i in 0..3 {
            assert_eq!(model.chain(i), expected.chain(i));
        }
    }

    #[test]
    fn test_round_trip() {
        let model = random::random_model(5, 4, 60, 6, 10, 1);
        let mut buf = Vec::new();
        write_model(&mut buf, &model).unwrap();
        let read = read_model(buf.as_slice()).unwrap();
        assert_eq!(read.nb_chains(), 5);
        assert_eq!(read.nb_cells(), 60);
        for i in 0..5 {
            assert_eq!(read.chain(i), model.chain(i));
        }
    }

    #[test]
    fn test_errors() {
        let err = read_model("cell 1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
        let err = read_model("# comment\nchain\ncell 1 x\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
        let err = read_model("chain\n\nfoo 3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
        let err = read_model("chain 2\n".as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "line 1: chain takes no argument");
    }

    #[test]
    fn test_cell_space() {
        let model = read_model("cells 8\nchain\nimpact 0\ncell 1\n".as_bytes()).unwrap();
        assert_eq!(model.nb_cells(), 8);

        // Sparse indices would blow up every per-cell table
        let text = "chain\nimpact 0\ncell 4000000000\nchain\nimpact 1\ncell 0\n";
        let err = read_model(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
        let err = read_model("cells 4000000000\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));

        let err = read_model("cells 2\nchain\nimpact 0 2\n".as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "line 3: cell index 2 out of the 2 cells");
        let err = read_model("chain\ncells 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
        let err = read_model("cells 2 3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }
}
