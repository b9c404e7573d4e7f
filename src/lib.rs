//! # Sigmar Solver Library
//!
//! Game model and best-first solver for a hexagonal marble-elimination
//! puzzle. Marbles are removed in matching pairs, a marble can only be taken
//! when three adjacent neighbour slots around it are free, and the six metals
//! have to leave in order from lead to gold.
//!
//! It is used by three binaries:
//! - `human_player`: play a board interactively, with undo and hints.
//! - `ai_solver`: load a board and a configuration, then print the solution.
//! - `heuristic_evaluator`: sweep one heuristic weight over seeded boards and
//!   write timings as CSV.
//!
//! ## Modules
//! - `topology`: cell layout and neighbour slots.
//! - `engine`: elements, board states, moves and the interactive `Game`.
//! - `rules`: which cells are free and which pairs may be removed.
//! - `heuristics`: the weighted board score that orders the search.
//! - `interrupt`: condition trees that stop a search early.
//! - `solver`: the search itself, its outcome and progress reporting.
//! - `config`: JSON configuration of weights, interrupt policy and end rule.
//! - `generator`: seeded boards that are solvable by construction.
//! - `utils`: board parsing and JSON output.

pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod heuristics;
pub mod interrupt;
pub mod rules;
pub mod solver;
pub mod topology;
pub mod utils;

pub use error::SolverError;
