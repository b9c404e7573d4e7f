//! Board input and result output.
//!
//! Two board formats are accepted:
//! - a compact text form with one character per cell in index order
//!   (see [`crate::engine::Element::to_char`]); whitespace is ignored, so the
//!   board may be laid out in rows;
//! - a JSON cell list, either bare or wrapped in an object with an optional
//!   `radius`:
//!
//! ```json
//! { "radius": 1, "cells": [ { "element": "FIRE", "state": "normal" }, ... ] }
//! ```
use crate::engine::{BoardState, CellMarker, Element};
use crate::error::SolverError;
use crate::solver::SolveReport;
use crate::topology::{Topology, MAX_RADIUS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Parses the compact text form against `topology`.
///
/// # Errors
/// Returns [`SolverError::InvalidBoard`] for an unknown character or when the
/// number of cells differs from the topology's cell count.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use sigmar_solver::engine::Element;
/// use sigmar_solver::topology::Topology;
/// use sigmar_solver::utils::board_from_str;
///
/// let topology = Arc::new(Topology::hexagon(1).unwrap());
/// let board = board_from_str(topology.clone(), " F S\nQ 1 .\n W A").unwrap();
/// assert_eq!(board.present_count(), 6);
/// assert_eq!(board.element(2), Element::Quicksilver);
///
/// assert!(board_from_str(topology.clone(), "FSQ1.WX").is_err());
/// assert!(board_from_str(topology, "FF").is_err());
/// ```
pub fn board_from_str(topology: Arc<Topology>, s: &str) -> Result<BoardState, SolverError> {
    let elements = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .enumerate()
        .map(|(idx, c)| {
            Element::from_char(c).ok_or_else(|| {
                SolverError::invalid_board(format!(
                    "unrecognized character '{}' at cell {}",
                    c, idx
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    BoardState::from_elements(topology, &elements)
}

/// One entry of the JSON cell list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEntry {
    pub element: String,
    #[serde(default = "normal_marker")]
    pub state: String,
}

fn normal_marker() -> String {
    CellMarker::Normal.name().to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BoardDocument {
    Cells(Vec<CellEntry>),
    Wrapped {
        #[serde(default)]
        radius: Option<u32>,
        cells: Vec<CellEntry>,
    },
}

/// Radius of the regular hexagon holding exactly `count` cells.
pub fn hexagon_radius_for(count: usize) -> Option<u32> {
    (0..=MAX_RADIUS).find(|&r| {
        let r = r as usize;
        3 * r * (r + 1) + 1 == count
    })
}

/// Parses a JSON board.
///
/// When `topology` is `None` the board is laid out on a hexagon whose radius
/// comes from the document's `radius` key, or failing that from the cell
/// count.
///
/// # Errors
/// Returns [`SolverError::InvalidBoard`] for malformed JSON, an unknown
/// element tag or marker, or a cell count that fits no hexagon.
pub fn board_from_json(
    topology: Option<Arc<Topology>>,
    s: &str,
) -> Result<BoardState, SolverError> {
    let document: BoardDocument = serde_json::from_str(s)
        .map_err(|e| SolverError::invalid_board(format!("malformed board JSON: {}", e)))?;
    let (radius, entries) = match document {
        BoardDocument::Cells(cells) => (None, cells),
        BoardDocument::Wrapped { radius, cells } => (radius, cells),
    };

    let cells = entries
        .iter()
        .map(|entry| Ok((entry.element.parse::<Element>()?, entry.state.parse::<CellMarker>()?)))
        .collect::<Result<Vec<_>, SolverError>>()?;

    let topology = match topology {
        Some(topology) => topology,
        None => {
            let radius = match radius.or_else(|| hexagon_radius_for(cells.len())) {
                Some(radius) => radius,
                None => {
                    return Err(SolverError::invalid_board(format!(
                        "{} cells do not form a regular hexagon",
                        cells.len()
                    )))
                }
            };
            let topology = Topology::hexagon(radius)
                .map_err(|e| SolverError::invalid_board(format!("bad board radius: {}", e)))?;
            Arc::new(topology)
        }
    };
    BoardState::from_cells(topology, &cells)
}

/// Serializes a board as a wrapped JSON cell list, markers included.
pub fn board_to_json(state: &BoardState) -> String {
    let cells: Vec<CellEntry> = state
        .to_cells()
        .into_iter()
        .map(|(element, marker)| CellEntry {
            element: element.name().to_string(),
            state: marker.name().to_string(),
        })
        .collect();
    let document = serde_json::json!({
        "radius": state.topology().radius(),
        "cells": cells,
    });
    document.to_string()
}

/// Reads a board file, picking the format from its first non-blank character.
///
/// Files starting with `[` or `{` are JSON; anything else is the text form,
/// which needs `topology` (the regular board is assumed when it is `None`).
pub fn load_board(
    path: impl AsRef<Path>,
    topology: Option<Arc<Topology>>,
) -> Result<BoardState, SolverError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SolverError::invalid_board(format!("cannot read {}: {}", path.display(), e))
    })?;

    match contents.trim_start().chars().next() {
        Some('[') | Some('{') => board_from_json(topology, &contents),
        _ => {
            let topology = topology.unwrap_or_else(|| Arc::new(Topology::standard()));
            board_from_str(topology, &contents)
        }
    }
}

/// JSON summary of a finished solve.
///
/// `moves` is a list of `[a, b]` index pairs and is `null` unless the board
/// was solved.
pub fn report_to_json(report: &SolveReport) -> serde_json::Value {
    serde_json::json!({
        "outcome": report.outcome.kind(),
        "moves": report.outcome.solution().map(|s| &s.moves),
        "iterations": report.stats.iterations,
        "open_set_size": report.stats.open_set_size,
        "best_g_cost": report.stats.best_g_cost,
        "elapsed_time": report.stats.elapsed.as_secs_f64(),
        "nodes_created": report.nodes_created,
    })
}
