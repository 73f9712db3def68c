//! Read and write models, clockings and integer linear programs to files

mod clocking;
mod model_file;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

pub use clocking::{format_clocking, read_clocking, write_clocking};
pub use model_file::{read_model, write_model, MAX_CELLS};

use crate::ilp::{read_solution, IlpModel, Solution};
use crate::model::ConflictModel;
use crate::Error;

/// Read a conflict model from a file
///
/// Following extensions are supported: .scm
pub fn read_model_file(path: &PathBuf) -> Result<ConflictModel, Error> {
    match path.extension() {
        Some(s) if s == "scm" => {
            let model = read_model(File::open(path)?)?;
            tracing::info!(
                path = %path.display(),
                chains = model.nb_chains(),
                cells = model.nb_cells(),
                "Model loaded"
            );
            Ok(model)
        }
        Some(s) => Err(Error::InvalidModel(format!(
            "unknown extension {}",
            s.to_string_lossy()
        ))),
        None => Err(Error::InvalidModel("no extension given".to_string())),
    }
}

/// Write a conflict model to a file
pub fn write_model_file(path: &PathBuf, model: &ConflictModel) -> Result<(), Error> {
    let mut f = BufWriter::new(File::create(path)?);
    write_model(&mut f, model)?;
    f.flush()?;
    Ok(())
}

/// Read a clocking from a file
pub fn read_clocking_file(path: &PathBuf) -> Result<Vec<i32>, Error> {
    read_clocking(File::open(path)?)
}

/// Write a clocking to a file
pub fn write_clocking_file(path: &PathBuf, clocking: &[i32]) -> Result<(), Error> {
    let mut f = File::create(path)?;
    write_clocking(&mut f, clocking)?;
    Ok(())
}

/// Write an integer linear program to a file, in ZIMPL format
pub fn write_ilp_file(path: &PathBuf, ilp: &IlpModel) -> Result<(), Error> {
    let mut f = BufWriter::new(File::create(path)?);
    ilp.write_zimpl(&mut f)?;
    f.flush()?;
    Ok(())
}

/// Read a solver solution from a file
pub fn read_solution_file(path: &PathBuf, nb_chains: usize) -> Result<Solution, Error> {
    read_solution(BufReader::new(File::open(path)?), nb_chains)
}
