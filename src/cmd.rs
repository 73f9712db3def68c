//! Command line interface

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use kdam::{tqdm, BarExt};

use crate::cost::CostFunction;
use crate::grouping::enumerate::{RandomGrouping, SeqGrouping};
use crate::grouping::{group_chains, Algorithm, GroupingConfig};
use crate::ilp::IlpModel;
use crate::io::{
    format_clocking, read_clocking_file, read_model_file, read_solution_file, write_clocking_file,
    write_ilp_file, write_model_file, MAX_CELLS,
};
use crate::model::generators::random::random_model;
use crate::model::stats::stats;
use crate::model::ConflictModel;
use crate::Error;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics about a conflict model
    ///
    /// Will print the length of each chain, the number of aggressors per scan cell and the size
    /// of its impact set.
    #[clap()]
    Show(ShowArgs),

    /// Group the scan chains of a conflict model
    ///
    /// Either run a grouping algorithm, or evaluate baseline groupings:
    ///   * seq enumerates all partitions of the chains in order
    ///   * random draws uniformly random groupings
    #[clap()]
    Group(GroupArgs),

    /// Export the grouping problem as an integer linear program
    ///
    /// The program is written in ZIMPL format, and minimizes the number of adjacent scan cells
    /// whose aggressor activity may differ by more than the threshold.
    #[clap(alias = "zpl")]
    Export(ExportArgs),

    /// Read a solver solution and evaluate its cost
    #[clap(alias = "sol")]
    Import(ImportArgs),

    /// Generate a random conflict model
    ///
    /// Cells are placed on a line, and each scan cell is aggressed by a window of consecutive
    /// cells. Useful to benchmark the grouping methods without a design.
    #[clap(alias = "gen")]
    Generate(GenerateArgs),
}

impl Commands {
    /// Run the command
    pub fn run(&self) -> Result<(), Error> {
        match self {
            Commands::Show(a) => a.run(),
            Commands::Group(a) => a.run(),
            Commands::Export(a) => a.run(),
            Commands::Import(a) => a.run(),
            Commands::Generate(a) => a.run(),
        }
    }
}

/// Command arguments for model informations
#[derive(Args)]
pub struct ShowArgs {
    /// Model to show
    file: PathBuf,

    /// Output file for per-chain LaTeX table rows
    #[arg(long)]
    table: Option<PathBuf>,
}

impl ShowArgs {
    /// Print the statistics
    pub fn run(&self) -> Result<(), Error> {
        let model = read_model_file(&self.file)?;
        let s = stats(&model);
        println!("Model stats:\n{}\n\n", s);
        if let Some(path) = &self.table {
            let mut f = BufWriter::new(File::create(path)?);
            s.write_table(&mut f)?;
            f.flush()?;
        }
        Ok(())
    }
}

/// Grouping method
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Enumerate partitions in order
    Seq,
    /// Uniformly random groupings
    Random,
    /// Random restarts followed by local improvement
    LocalSearch,
    /// Graph coloring between cost bounds
    BoundedColoring,
    /// Genetic algorithm
    Genetic,
}

impl Method {
    /// Grouping algorithm, if the method is not a baseline
    pub fn algorithm(self) -> Option<Algorithm> {
        match self {
            Method::Seq | Method::Random => None,
            Method::LocalSearch => Some(Algorithm::LocalSearch),
            Method::BoundedColoring => Some(Algorithm::BoundedColoring),
            Method::Genetic => Some(Algorithm::Genetic),
        }
    }
}

/// Command arguments for grouping
#[derive(Args)]
pub struct GroupArgs {
    /// Model to group
    file: PathBuf,

    /// Number of available groups
    #[arg(short = 'k', long, value_parser = clap::value_parser!(u32).range(1..))]
    groups: u32,

    /// Grouping method
    #[arg(long, value_enum, default_value_t = Method::Random)]
    method: Method,

    /// Start partition index (seq) or seed (random)
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Number of groupings to evaluate (seq and random only)
    #[arg(long, default_value_t = 1)]
    cases: u64,

    /// Seed for the randomized algorithms
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Solver solution to evaluate instead of the computed grouping
    #[arg(long)]
    sol: Option<PathBuf>,

    /// Clocking file to evaluate instead of the computed grouping
    #[arg(long, conflicts_with = "sol")]
    clocking: Option<PathBuf>,

    /// Output file for the cost of each case
    #[arg(long)]
    plot: Option<PathBuf>,

    /// Output file for the last clocking
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

/// Source of the clockings to evaluate
enum Cases<'a> {
    Fixed(Vec<i32>),
    Algorithm(&'a GroupingConfig),
    Seq(SeqGrouping),
    Random(RandomGrouping),
}

impl GroupArgs {
    fn cases<'a>(&self, model: &ConflictModel, config: &'a GroupingConfig) -> Cases<'a> {
        let nb_chains = model.nb_chains();
        let nb_groups = self.groups as usize;
        if nb_groups == 1 {
            tracing::info!("Single group available");
            return Cases::Fixed(vec![0; nb_chains]);
        }
        if nb_groups >= nb_chains {
            tracing::info!("Group count not below chain count, one chain per group");
            return Cases::Fixed((0..nb_chains as i32).collect());
        }
        match self.method {
            Method::Seq => {
                tracing::info!(start = self.start, "Sequential grouping");
                let mut seq = SeqGrouping::new(nb_chains, nb_groups);
                for _ in 0..self.start {
                    if seq.next().is_none() {
                        tracing::info!("Start index out of bounds, starting over");
                        seq.restart();
                    }
                }
                Cases::Seq(seq)
            }
            Method::Random => {
                tracing::info!(start = self.start, "Random grouping");
                Cases::Random(RandomGrouping::new(nb_chains, nb_groups, self.start))
            }
            _ => Cases::Algorithm(config),
        }
    }

    /// Group the chains and evaluate each case
    pub fn run(&self) -> Result<(), Error> {
        let model = read_model_file(&self.file)?;
        let nb_chains = model.nb_chains();
        let nb_groups = self.groups as usize;
        let eval_groups = nb_groups.min(nb_chains).max(1);
        tracing::info!(groups = nb_groups, chains = nb_chains, "Available groups");

        let mut nb_cases = self.cases.max(1);
        let algorithm = self.method.algorithm();
        if let Some(algorithm) = algorithm {
            if nb_cases > 1 {
                tracing::warn!("--cases is ignored, only a single grouping is evaluated");
            }
            if self.start > 0 {
                tracing::warn!("--start is ignored, only a single grouping is evaluated");
            }
            nb_cases = 1;
            tracing::info!(?algorithm, "Grouping method");
        }
        let config = GroupingConfig {
            algorithm: algorithm.unwrap_or_default(),
            seed: self.seed,
            show_progress: true,
        };
        let mut cases = self.cases(&model, &config);

        let mut plot = match &self.plot {
            Some(path) => Some(BufWriter::new(File::create(path)?)),
            None => None,
        };
        let mut cost = CostFunction::new(&model);
        let mut progress = tqdm!(total = nb_cases as usize, disable = nb_cases <= 1);
        progress.set_description("Cases");
        let mut total_cost = 0;
        let mut clocking = Vec::new();
        for case in 0..nb_cases {
            tracing::info!(case, "Grouping case");
            clocking = match &mut cases {
                Cases::Fixed(c) => c.clone(),
                Cases::Algorithm(config) => group_chains(&model, nb_groups, config),
                Cases::Seq(seq) => match seq.next() {
                    Some(c) => c,
                    None => {
                        tracing::error!("Start index and case out of bounds, starting over");
                        seq.restart();
                        seq.next().unwrap_or_else(|| vec![0; nb_chains])
                    }
                },
                Cases::Random(rnd) => rnd.next().unwrap_or_else(|| vec![0; nb_chains]),
            };
            if nb_groups < nb_chains {
                if let Some(path) = &self.sol {
                    clocking = import_solution(path, nb_chains, nb_groups)?;
                }
                if let Some(path) = &self.clocking {
                    clocking = import_clocking(path, nb_chains, nb_groups)?;
                }
            }

            let c = cost.evaluate(&clocking, eval_groups);
            total_cost += c;
            println!("Cost {}", c);
            println!(
                "GroupCost {} Worst group {}",
                cost.group_costs().iter().join(" "),
                cost.last_worst_group()
            );
            println!("{}", format_clocking(&clocking));
            if let Some(f) = &mut plot {
                writeln!(f, "{} {}", case, c)?;
            }
            let _ = progress.update(1);
        }
        println!("AverageCost {}", total_cost / nb_cases);

        if let Some(f) = &mut plot {
            f.flush()?;
        }
        if let Some(path) = &self.output {
            write_clocking_file(path, &clocking)?;
        }
        Ok(())
    }
}

/// Read a solution, checking that every group is available
fn import_solution(path: &PathBuf, nb_chains: usize, nb_groups: usize) -> Result<Vec<i32>, Error> {
    let sol = read_solution_file(path, nb_chains)?;
    let missing = sol.missing_chains();
    if !missing.is_empty() {
        tracing::warn!(
            missing = %missing.iter().join(" "),
            "Chains missing from the solution are in group 0"
        );
    }
    if let Some(g) = sol.clocking().iter().find(|g| **g as usize >= nb_groups) {
        return Err(Error::InvalidModel(format!(
            "solution uses group {} with only {} groups available",
            g, nb_groups
        )));
    }
    Ok(sol.into_clocking())
}

/// Read a clocking file, checking it against the model and the groups available
fn import_clocking(path: &PathBuf, nb_chains: usize, nb_groups: usize) -> Result<Vec<i32>, Error> {
    let clocking = read_clocking_file(path)?;
    if clocking.len() != nb_chains {
        return Err(Error::InvalidModel(format!(
            "clocking has {} chains instead of {}",
            clocking.len(),
            nb_chains
        )));
    }
    if let Some(g) = clocking.iter().find(|g| !(0..nb_groups as i32).contains(*g)) {
        return Err(Error::InvalidModel(format!(
            "clocking uses group {} with only {} groups available",
            g, nb_groups
        )));
    }
    Ok(clocking)
}

/// Command arguments for integer linear program export
#[derive(Args)]
pub struct ExportArgs {
    /// Model to export
    file: PathBuf,

    /// Number of available groups
    #[arg(short = 'k', long, value_parser = clap::value_parser!(u32).range(1..))]
    groups: u32,

    /// Largest allowed aggressor count difference between adjacent scan cells
    #[arg(long, default_value_t = 0)]
    thr: usize,

    /// Output file for the program
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl ExportArgs {
    /// Write the program
    pub fn run(&self) -> Result<(), Error> {
        let model = read_model_file(&self.file)?;
        if self.groups as usize >= model.nb_chains() {
            tracing::warn!("Group count not below chain count, the program is trivial");
        }
        let ilp = IlpModel::build(&model, self.groups as usize, self.thr);
        write_ilp_file(&self.output, &ilp)?;
        println!(
            "Wrote {} variables, {} constraints and {} conflict indicators",
            ilp.variables().len() + ilp.nb_conflicts(),
            ilp.constraints().len(),
            ilp.nb_conflicts()
        );
        Ok(())
    }
}

/// Command arguments for solution import
#[derive(Args)]
pub struct ImportArgs {
    /// Model the solution was computed for
    file: PathBuf,

    /// Solver solution
    solution: PathBuf,

    /// Number of available groups
    #[arg(short = 'k', long, value_parser = clap::value_parser!(u32).range(1..))]
    groups: u32,

    /// Output file for the clocking
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

impl ImportArgs {
    /// Read and evaluate the solution
    pub fn run(&self) -> Result<(), Error> {
        let model = read_model_file(&self.file)?;
        let nb_groups = self.groups as usize;
        let clocking = import_solution(&self.solution, model.nb_chains(), nb_groups)?;
        let mut cost = CostFunction::new(&model);
        println!("Cost {}", cost.evaluate(&clocking, nb_groups));
        println!("{}", format_clocking(&clocking));
        if let Some(path) = &self.output {
            write_clocking_file(path, &clocking)?;
        }
        Ok(())
    }
}

/// Command arguments for random model generation
#[derive(Args)]
pub struct GenerateArgs {
    /// Output file for the model
    output: PathBuf,

    /// Number of scan chains
    #[arg(long, default_value_t = 8)]
    chains: usize,

    /// Number of scan cells per chain
    #[arg(long, default_value_t = 16)]
    length: usize,

    /// Number of cells in the design
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..=MAX_CELLS as i64))]
    cells: u32,

    /// Number of aggressors of each scan cell
    #[arg(long, default_value_t = 20)]
    region: usize,

    /// Number of cells impacted by each chain
    #[arg(long, default_value_t = 50)]
    impact: usize,

    /// Random seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl GenerateArgs {
    /// Generate and write the model
    pub fn run(&self) -> Result<(), Error> {
        let model = random_model(
            self.chains,
            self.length,
            self.cells as usize,
            self.region,
            self.impact,
            self.seed,
        );
        write_model_file(&self.output, &model)?;
        tracing::info!(
            path = %self.output.display(),
            chains = model.nb_chains(),
            cells = model.nb_cells(),
            "Model generated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{import_clocking, Cli};
    use crate::io::{read_model_file, write_clocking_file};

    #[test]
    fn test_generate_and_evaluate() {
        let dir = std::env::temp_dir().join(format!("scgroup-cmd-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let model_path = dir.join("random.scm");
        let cli = Cli::try_parse_from([
            "scgroup",
            "generate",
            model_path.to_str().unwrap(),
            "--chains",
            "4",
            "--cells",
            "100",
        ])
        .unwrap();
        cli.command.run().unwrap();
        let model = read_model_file(&model_path).unwrap();
        assert_eq!(model.nb_chains(), 4);
        assert_eq!(model.nb_cells(), 100);

        let clk_path = dir.join("random.clk");
        write_clocking_file(&clk_path, &[0, 1, 1, 0]).unwrap();
        assert_eq!(import_clocking(&clk_path, 4, 2).unwrap(), vec![0, 1, 1, 0]);
        assert!(import_clocking(&clk_path, 4, 1).is_err());
        assert!(import_clocking(&clk_path, 5, 2).is_err());
        let cli = Cli::try_parse_from([
            "scgroup",
            "group",
            model_path.to_str().unwrap(),
            "-k",
            "2",
            "--clocking",
            clk_path.to_str().unwrap(),
        ])
        .unwrap();
        cli.command.run().unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_arguments() {
        assert!(Cli::try_parse_from(["scgroup", "group", "a.scm", "-k", "0"]).is_err());
        assert!(Cli::try_parse_from([
            "scgroup", "group", "a.scm", "-k", "2", "--sol", "a.sol", "--clocking", "a.clk"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["scgroup", "gen", "a.scm", "--cells", "0"]).is_err());
    }
}
