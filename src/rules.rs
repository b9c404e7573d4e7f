//! Move legality.
//!
//! A present cell can take part in a move only when it passes two gates:
//! - the spatial gate: at least three circularly consecutive neighbour slots
//!   are free (removed, empty or off the board);
//! - the ordering gate: a metal must be the lowest metal still on the board.
//!
//! Pairs of cells that pass both gates are then matched by element kind.
//! Everything here is recomputed from the present-cell set on each call.
use crate::engine::{BoardState, CellSet, Element, Move};
use crate::topology::Topology;

/// Number of consecutive free neighbour slots a cell needs to be spatially free.
const FREE_RUN: usize = 3;

/// Whether `idx` is present and has a run of three free neighbour slots.
pub fn is_spatially_free(state: &BoardState, idx: usize) -> bool {
    state.is_present(idx) && has_free_run(state.topology(), state.present(), idx)
}

/// The spatial gate on a bare cell set, for callers that build boards cell
/// by cell. Does not check that `idx` itself is in `present`.
pub fn has_free_run(topology: &Topology, present: CellSet, idx: usize) -> bool {
    let slots = *topology.neighbors(idx);
    let free = slots.map(|slot| slot.map_or(true, |n| !present.contains(n)));
    (0..free.len()).any(|start| (0..FREE_RUN).all(|k| free[(start + k) % free.len()]))
}

/// Whether `idx` passes the metal ordering gate. Non-metals always pass.
pub fn is_order_free(state: &BoardState, idx: usize) -> bool {
    match state.element(idx).metal() {
        Some(metal) => state.lowest_metal() == Some(metal),
        None => true,
    }
}

/// Present and passing both gates.
pub fn is_unlocked(state: &BoardState, idx: usize) -> bool {
    is_spatially_free(state, idx) && is_order_free(state, idx)
}

/// Whether two elements may be removed together, ignoring the gates.
///
/// # Examples
/// ```
/// use sigmar_solver::engine::{Element, Metal};
/// use sigmar_solver::rules::elements_match;
///
/// assert!(elements_match(Element::Salt, Element::Water));
/// assert!(elements_match(Element::Quicksilver, Element::Metal(Metal::Iron)));
/// assert!(!elements_match(Element::Salt, Element::Vitae));
/// ```
pub fn elements_match(a: Element, b: Element) -> bool {
    use Element::*;
    match (a, b) {
        (Empty, _) | (_, Empty) => false,
        (x, y) if x.is_cardinal() && x == y => true,
        (Salt, y) | (y, Salt) => y == Salt || y.is_cardinal(),
        (Vitae, Mors) | (Mors, Vitae) => true,
        (Metal(x), Metal(y)) => x == y,
        (Quicksilver, Metal(_)) | (Metal(_), Quicksilver) => true,
        _ => false,
    }
}

/// Whether `mv` can be played on `state`.
pub fn is_legal_move(state: &BoardState, mv: Move) -> bool {
    let (a, b) = mv.cells();
    a != b
        && is_unlocked(state, a)
        && is_unlocked(state, b)
        && elements_match(state.element(a), state.element(b))
}

/// Indices of all present cells that pass both gates, ascending.
pub fn unlocked_cells(state: &BoardState) -> Vec<usize> {
    state
        .present()
        .iter()
        .filter(|&idx| is_unlocked(state, idx))
        .collect()
}

/// Number of present cells failing either gate.
pub fn locked_cells(state: &BoardState) -> usize {
    state.present_count() - unlocked_cells(state).len()
}

/// Enumerates every legal move on `state`.
///
/// The result is sorted by `(first, second)` so that searches over the same
/// board expand children in the same order every run.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use sigmar_solver::engine::Move;
/// use sigmar_solver::rules::legal_moves;
/// use sigmar_solver::topology::Topology;
/// use sigmar_solver::utils::board_from_str;
///
/// let topology = Arc::new(Topology::line(4).unwrap());
/// let board = board_from_str(topology, "FSFW").unwrap();
/// // Salt stands in for fire; water has no partner.
/// assert_eq!(
///     legal_moves(&board),
///     vec![Move::new(0, 1), Move::new(0, 2), Move::new(1, 2)]
/// );
/// ```
pub fn legal_moves(state: &BoardState) -> Vec<Move> {
    let unlocked = unlocked_cells(state);
    let mut moves = Vec::new();
    for (i, &a) in unlocked.iter().enumerate() {
        let element_a = state.element(a);
        for &b in &unlocked[i + 1..] {
            if elements_match(element_a, state.element(b)) {
                moves.push(Move::new(a, b));
            }
        }
    }
    moves
}
