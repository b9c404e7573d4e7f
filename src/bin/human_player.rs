use clap::Parser;
use sigmar_solver::config::SolverConfig;
use sigmar_solver::engine::{render_indices, Game, TerminalRule};
use sigmar_solver::generator::generate_board;
use sigmar_solver::interrupt::InterruptConfig;
use sigmar_solver::solver::{SolveOutcome, Solver};
use sigmar_solver::topology::Topology;
use sigmar_solver::utils::load_board;
use sigmar_solver::SolverError;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Seconds the hint search may take.
const HINT_SECONDS: f64 = 5.0;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Board file to play; a random board is generated when omitted
    #[clap(short, long)]
    board: Option<PathBuf>,

    /// Seed for the generated board
    #[clap(short, long)]
    seed: Option<u64>,

    /// Hexagon radius
    #[clap(short, long, default_value_t = 5)]
    radius: u32,

    /// Accept a single gold marble left on the board as solved
    #[clap(long)]
    lone_gold: bool,
}

fn new_game(args: &Args) -> Result<Game, SolverError> {
    let topology = Arc::new(Topology::hexagon(args.radius)?);
    let board = match &args.board {
        Some(path) => load_board(path, Some(topology))?,
        None => {
            let seed = args.seed.unwrap_or_else(rand::random);
            println!("Board seed: {}", seed);
            generate_board(topology, seed)?
        }
    };
    let terminal = if args.lone_gold {
        TerminalRule::EmptyOrLoneGold
    } else {
        TerminalRule::Empty
    };
    Ok(Game::with_terminal_rule(board, terminal))
}

fn print_hint(game: &Game) {
    let config = SolverConfig::default()
        .with_terminal(game.terminal_rule())
        .with_interrupt(InterruptConfig::disabled().with_time_limit(HINT_SECONDS));
    let report = Solver::new(config).solve(game.state());
    match report.outcome {
        SolveOutcome::Solved(solution) => match solution.moves.first() {
            Some(&mv) => println!(
                "Hint: take {} ({} + {}), {} moves to go.",
                mv,
                game.state().element(mv.first()),
                game.state().element(mv.second()),
                solution.len()
            ),
            None => println!("Hint: the board is already solved."),
        },
        SolveOutcome::Exhausted => {
            println!("Hint: this position cannot be solved, try undoing.")
        }
        SolveOutcome::Aborted => {
            println!("Hint: no solution found within {} seconds.", HINT_SECONDS)
        }
    }
}

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut game = match new_game(&args) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Welcome to Sigmar's Garden!");
    println!("Cell indices:\n{}", render_indices(game.state().topology()));

    loop {
        println!("---------------------");
        println!("Steps: {}, Marbles left: {}", game.steps(), game.state().present_count());
        println!("{}", game.state());

        if game.is_solved() {
            println!();
            println!("---------------------");
            println!("Board cleared in {} steps!", game.steps());
            println!("---------------------");
            break;
        }
        if game.is_stuck() {
            println!("No legal moves left. Enter 'u' to undo or 'q' to quit.");
        }

        print!(
            "Enter your move (a b), 'u' to undo, 'h' for a hint, 'i' for indices, 'q' to quit: "
        );
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => {
                println!("Error reading input. Please try again.");
                continue;
            }
        }

        match input.trim() {
            "q" => {
                println!("Thanks for playing!");
                break;
            }
            "u" => {
                if game.undo_last_move() {
                    println!("Move undone.");
                } else {
                    println!("Cannot undo further (already at initial state).");
                }
            }
            "h" => print_hint(&game),
            "i" => println!("{}", render_indices(game.state().topology())),
            other => {
                let parts: Vec<&str> = other.split_whitespace().collect();
                let cell_count = game.state().cell_count();
                let parsed = match parts.as_slice() {
                    [a, b] => a.parse::<usize>().ok().zip(b.parse::<usize>().ok()),
                    _ => None,
                };
                match parsed {
                    Some((a, b)) if a < cell_count && b < cell_count => {
                        match game.process_move(a, b) {
                            Ok(()) => println!("Move processed."),
                            Err(e) => println!("Invalid move: {}.", e),
                        }
                    }
                    Some(_) => println!(
                        "Invalid cells: indices must be between 0 and {}.",
                        cell_count - 1
                    ),
                    None => println!("Invalid input format. Use 'a b', 'u', 'h', 'i' or 'q'."),
                }
            }
        }
    }
    ExitCode::SUCCESS
}
