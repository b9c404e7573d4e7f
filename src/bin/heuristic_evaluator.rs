use clap::Parser;
use sigmar_solver::config::{ConfigError, SolverConfig};
use sigmar_solver::generator::generate_board;
use sigmar_solver::heuristics::HeuristicWeights;
use sigmar_solver::solver::Solver;
use sigmar_solver::topology::Topology;
use sigmar_solver::SolverError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sweeps one heuristic weight over seeded random boards and records solve
/// times as CSV.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Weight to sweep, e.g. metal_marbles_penalty
    #[clap(short, long)]
    param: String,

    /// First value of the sweep
    #[clap(long)]
    start: f64,

    /// Last value of the sweep
    #[clap(long)]
    end: f64,

    /// Number of evenly spaced values between start and end
    #[clap(long, default_value_t = 10)]
    steps: usize,

    /// Boards solved per value
    #[clap(long, default_value_t = 5)]
    boards: u64,

    /// Seed of the first board
    #[clap(long, default_value_t = 0)]
    start_seed: u64,

    /// Hexagon radius of the generated boards
    #[clap(short, long, default_value_t = 4)]
    radius: u32,

    /// Time limit per solve in seconds
    #[clap(long, default_value_t = 10.0)]
    max_seconds: f64,

    /// Configuration providing the other weights
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// CSV output file; standard output when omitted
    #[clap(short, long)]
    output: Option<PathBuf>,
}

/// `steps` values spaced evenly from `start` to `end`, both included.
fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..steps)
            .map(|i| start + (end - start) * i as f64 / (steps - 1) as f64)
            .collect(),
    }
}

fn run(args: &Args) -> Result<(), SolverError> {
    let base = match &args.config {
        Some(path) => SolverConfig::load(path)?,
        None => SolverConfig::default(),
    };
    let mut check = HeuristicWeights::default();
    if !check.set(&args.param, 0.0) {
        return Err(SolverError::Config(ConfigError::Invalid(format!(
            "unknown weight '{}', expected one of {}",
            args.param,
            HeuristicWeights::NAMES.join(", ")
        ))));
    }

    let topology = Arc::new(Topology::hexagon(args.radius)?);
    let boards = (args.start_seed..args.start_seed + args.boards)
        .map(|seed| generate_board(Arc::clone(&topology), seed).map(|board| (seed, board)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(io_error)?)),
        None => Box::new(io::stdout().lock()),
    };
    writeln!(out, "parameter_value,seed,outcome,iterations,solve_time_s").map_err(io_error)?;

    for value in linspace(args.start, args.end, args.steps) {
        let mut weights = base.heuristic_weights;
        weights.set(&args.param, value);
        let config = base
            .clone()
            .with_weights(weights)
            .with_interrupt(base.interrupt.clone().with_time_limit(args.max_seconds));
        let solver = Solver::new(config);

        let mut solved = 0;
        for (seed, board) in &boards {
            let report = solver.solve(board);
            if report.outcome.is_solved() {
                solved += 1;
            }
            writeln!(
                out,
                "{},{},{},{},{:.6}",
                value,
                seed,
                report.outcome.kind(),
                report.stats.iterations,
                report.stats.elapsed.as_secs_f64()
            )
            .map_err(io_error)?;
        }
        info!(param = %args.param, value, solved, boards = boards.len(), "sweep step done");
    }
    out.flush().map_err(io_error)?;
    Ok(())
}

fn io_error(e: io::Error) -> SolverError {
    SolverError::Config(e.into())
}

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
