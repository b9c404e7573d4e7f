use clap::Parser;
use sigmar_solver::config::SolverConfig;
use sigmar_solver::engine::{BoardState, TerminalRule};
use sigmar_solver::solver::{SolveOutcome, Solver};
use sigmar_solver::topology::Topology;
use sigmar_solver::utils::{load_board, report_to_json};
use sigmar_solver::SolverError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Time limit applied when neither the configuration nor the command line
/// sets an interrupt policy.
const DEFAULT_MAX_SECONDS: f64 = 60.0;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the board file (character codes or a JSON cell list)
    board_file: PathBuf,

    /// Hexagon radius of the board; inferred from JSON boards when omitted
    #[clap(short, long)]
    radius: Option<u32>,

    /// Solver configuration (heuristic weights, interrupt policy)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Interrupt policy file, replacing the one from --config
    #[clap(short, long)]
    interrupt: Option<PathBuf>,

    /// Give up after this many seconds (60 unless an interrupt policy is configured)
    #[clap(long)]
    max_seconds: Option<f64>,

    /// Search without the default time limit; may exhaust memory on full boards
    #[clap(long, conflicts_with = "max_seconds")]
    no_limit: bool,

    /// Accept a single gold marble left on the board as solved
    #[clap(long)]
    lone_gold: bool,

    /// Print the result as JSON instead of text
    #[clap(long)]
    json: bool,
}

fn build_config(args: &Args) -> Result<SolverConfig, SolverError> {
    let mut config = match &args.config {
        Some(path) => SolverConfig::load(path)?,
        None => SolverConfig::default(),
    };
    if let Some(path) = &args.interrupt {
        config = config.with_interrupt_file(path)?;
    }
    if let Some(seconds) = args.max_seconds {
        config.interrupt = config.interrupt.with_time_limit(seconds);
    } else if !args.no_limit {
        config = config.with_default_time_limit(DEFAULT_MAX_SECONDS);
    }
    if args.lone_gold {
        config.terminal = TerminalRule::EmptyOrLoneGold;
    }
    Ok(config)
}

fn load(args: &Args) -> Result<(BoardState, SolverConfig), SolverError> {
    let topology = match args.radius {
        Some(radius) => Some(Arc::new(Topology::hexagon(radius)?)),
        None => None,
    };
    let board = load_board(&args.board_file, topology)?;
    Ok((board, build_config(args)?))
}

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (board, config) = match load(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !args.json {
        println!("Loaded board from {}\n", args.board_file.display());
        println!("Initial board state:\n{}\n", board);
        println!("Searching for a solution...\n");
    }

    let report = Solver::new(config).solve(&board);

    if args.json {
        println!("{}", report_to_json(&report));
        return ExitCode::SUCCESS;
    }

    match &report.outcome {
        SolveOutcome::Solved(solution) => {
            println!("Solution found:\n");
            println!("Moves ({}):", solution.len());
            if solution.is_empty() {
                println!("  No moves made.");
            }
            let mut state = board.clone();
            for (i, &mv) in solution.moves.iter().enumerate() {
                println!(
                    "  Move {}: {} {} + {}",
                    i + 1,
                    mv,
                    state.element(mv.first()),
                    state.element(mv.second())
                );
                state = state.apply(mv);
            }
        }
        SolveOutcome::Exhausted => println!("No solution exists for this board."),
        SolveOutcome::Aborted => println!("Search interrupted before a solution was found."),
    }
    println!(
        "\nIterations: {}, open set: {}, deepest: {}, time: {:.3}s",
        report.stats.iterations,
        report.stats.open_set_size,
        report.stats.best_g_cost,
        report.stats.elapsed.as_secs_f64()
    );
    ExitCode::SUCCESS
}
