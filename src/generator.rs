//! Seeded random boards that are solvable by construction.
//!
//! Boards are built backwards: pairs are placed one at a time into empty
//! cells, and a pair is only accepted if both of its cells would be removable
//! the moment it lands. Removing the pairs in reverse placement order then
//! replays a valid solution. Metal pairs are placed from the highest rank
//! down so that, played forwards, lead always leaves first.
use crate::engine::{BoardState, CellSet, Element, Metal, Move};
use crate::error::SolverError;
use crate::rules;
use crate::topology::Topology;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::debug;

/// Attempts made before [`generate_board`] gives up.
pub const MAX_ATTEMPTS: u32 = 64;

/// Share of the cells filled on a generated board, in percent.
const FILL_PERCENT: usize = 55;

/// The pairs a generated board is made of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardRecipe {
    pairs: Vec<(Element, Element)>,
}

impl BoardRecipe {
    /// The full mix used on the regular board: 25 pairs.
    pub fn standard() -> Self {
        let mut pairs = Vec::new();
        for _ in 0..3 {
            for cardinal in Element::CARDINALS {
                pairs.push((cardinal, cardinal));
            }
        }
        pairs.push((Element::Salt, Element::Fire));
        pairs.push((Element::Salt, Element::Water));
        pairs.push((Element::Salt, Element::Salt));
        for _ in 0..4 {
            pairs.push((Element::Vitae, Element::Mors));
        }
        for metal in Metal::ALL {
            pairs.push((Element::Quicksilver, Element::Metal(metal)));
        }
        BoardRecipe { pairs }
    }

    /// The standard mix cut down to fit a topology of `cell_count` cells.
    ///
    /// Pairs are dropped round-robin over kinds so that small boards keep a
    /// bit of everything.
    pub fn for_cells(cell_count: usize) -> Self {
        let budget = cell_count * FILL_PERCENT / 100 / 2;
        let standard = BoardRecipe::standard();
        if budget >= standard.pairs.len() {
            return standard;
        }

        let metals = standard.pairs.iter().filter(|(_, b)| b.is_metal()).count();
        let keep_metals = (budget / 4).min(metals);
        let mut pairs: Vec<(Element, Element)> = standard
            .pairs
            .iter()
            .copied()
            .filter(|(_, b)| !b.is_metal())
            .take(budget - keep_metals)
            .collect();
        pairs.extend(
            Metal::ALL
                .iter()
                .take(keep_metals)
                .map(|&m| (Element::Quicksilver, Element::Metal(m))),
        );
        BoardRecipe { pairs }
    }

    pub fn from_pairs(pairs: Vec<(Element, Element)>) -> Self {
        BoardRecipe { pairs }
    }

    pub fn pairs(&self) -> &[(Element, Element)] {
        &self.pairs
    }

    /// Number of marbles the recipe places.
    pub fn marble_count(&self) -> usize {
        self.pairs.len() * 2
    }
}

/// Generates a solvable board sized for `topology`.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use sigmar_solver::generator::generate_board;
/// use sigmar_solver::topology::Topology;
///
/// let topology = Arc::new(Topology::standard());
/// let a = generate_board(topology.clone(), 42).unwrap();
/// let b = generate_board(topology, 42).unwrap();
/// assert_eq!(a.to_cells(), b.to_cells());
/// assert_eq!(a.present_count(), 50);
/// ```
pub fn generate_board(topology: Arc<Topology>, seed: u64) -> Result<BoardState, SolverError> {
    let recipe = BoardRecipe::for_cells(topology.cell_count());
    generate_with_recipe(topology, &recipe, seed)
}

/// Generates a solvable board from an explicit recipe.
///
/// # Errors
/// Returns [`SolverError::InvalidBoard`] if the recipe holds a pair that can
/// never be removed together, and [`SolverError::GenerationFailed`] if no
/// placement was found within [`MAX_ATTEMPTS`].
pub fn generate_with_recipe(
    topology: Arc<Topology>,
    recipe: &BoardRecipe,
    seed: u64,
) -> Result<BoardState, SolverError> {
    generate_with_solution(topology, recipe, seed).map(|(board, _)| board)
}

/// Like [`generate_with_recipe`], also returning the removal order the board
/// was built from.
pub fn generate_with_solution(
    topology: Arc<Topology>,
    recipe: &BoardRecipe,
    seed: u64,
) -> Result<(BoardState, Vec<Move>), SolverError> {
    if let Some(&(a, b)) = recipe
        .pairs
        .iter()
        .find(|&&(a, b)| !rules::elements_match(a, b))
    {
        return Err(SolverError::invalid_board(format!(
            "recipe pairs {} with {}, which never match",
            a, b
        )));
    }
    if recipe.marble_count() > topology.cell_count() {
        return Err(SolverError::invalid_board(format!(
            "recipe needs {} cells, topology has {}",
            recipe.marble_count(),
            topology.cell_count()
        )));
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    for attempt in 1..=MAX_ATTEMPTS {
        let order = placement_order(recipe, &mut rng);
        if let Some((elements, mut placed)) = place_pairs(&topology, &order, &mut rng) {
            debug!(seed, attempt, marbles = recipe.marble_count(), "generated board");
            placed.reverse();
            let board = BoardState::from_elements(topology, &elements)?;
            return Ok((board, placed));
        }
    }
    Err(SolverError::GenerationFailed {
        attempts: MAX_ATTEMPTS,
    })
}

/// Shuffles the pairs into placement order, metals descending by rank.
fn placement_order(recipe: &BoardRecipe, rng: &mut SmallRng) -> Vec<(Element, Element)> {
    let mut order = recipe.pairs.clone();
    order.shuffle(rng);

    let mut metal_pairs: Vec<(Element, Element)> =
        order.iter().copied().filter(|&(a, b)| is_metal_pair(a, b)).collect();
    metal_pairs.sort_by_key(|&(a, b)| std::cmp::Reverse(a.metal().or(b.metal())));
    let mut metal_pairs = metal_pairs.into_iter();
    for pair in order.iter_mut() {
        if is_metal_pair(pair.0, pair.1) {
            if let Some(next) = metal_pairs.next() {
                *pair = next;
            }
        }
    }
    order
}

fn is_metal_pair(a: Element, b: Element) -> bool {
    a.is_metal() || b.is_metal()
}

/// Places `order` pair by pair, returning the cells and the moves in
/// placement order, or `None` when some pair finds no room.
fn place_pairs(
    topology: &Topology,
    order: &[(Element, Element)],
    rng: &mut SmallRng,
) -> Option<(Vec<Element>, Vec<Move>)> {
    let mut elements = vec![Element::Empty; topology.cell_count()];
    let mut present = CellSet::new();
    let mut placed = Vec::with_capacity(order.len());

    for &(first, second) in order {
        let empty: Vec<usize> = (0..topology.cell_count())
            .filter(|&idx| !present.contains(idx))
            .collect();
        let mut candidates = Vec::new();
        for (i, &a) in empty.iter().enumerate() {
            for &b in &empty[i + 1..] {
                let mut next = present;
                next.insert(a);
                next.insert(b);
                if rules::has_free_run(topology, next, a)
                    && rules::has_free_run(topology, next, b)
                {
                    candidates.push((a, b));
                }
            }
        }

        let &(a, b) = candidates.choose(rng)?;
        let (a, b) = if rng.gen_bool(0.5) { (a, b) } else { (b, a) };
        elements[a] = first;
        elements[b] = second;
        present.insert(a);
        present.insert(b);
        placed.push(Move::new(a, b));
    }
    Some((elements, placed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_recipe() {
        let recipe = BoardRecipe::standard();
        assert_eq!(recipe.pairs().len(), 25);
        assert_eq!(recipe.marble_count(), 50);
        assert!(recipe.pairs().iter().all(|&(a, b)| rules::elements_match(a, b)));
    }

    #[test]
    fn test_recipe_scales_down() {
        let recipe = BoardRecipe::for_cells(37);
        assert_eq!(recipe.pairs().len(), 10);
        assert_eq!(recipe.pairs().iter().filter(|(_, b)| b.is_metal()).count(), 2);
        assert_eq!(BoardRecipe::for_cells(91), BoardRecipe::standard());
    }

    #[test]
    fn test_generated_board_is_seeded() {
        let topology = Arc::new(Topology::hexagon(3).unwrap());
        let a = generate_board(topology.clone(), 1).unwrap();
        let b = generate_board(topology.clone(), 1).unwrap();
        let c = generate_board(topology, 2).unwrap();
        assert_eq!(a.to_cells(), b.to_cells());
        assert_ne!(a.to_cells(), c.to_cells());
    }

    #[test]
    fn test_generated_board_contents() {
        let topology = Arc::new(Topology::standard());
        let board = generate_board(topology, 9).unwrap();
        assert_eq!(board.present_count(), 50);
        assert_eq!(board.metal_count(), 6);
        assert_eq!(board.count(Element::Quicksilver), 6);
        assert_eq!(board.count(Element::Vitae), board.count(Element::Mors));
    }

    #[test]
    fn test_build_order_solves_board() {
        let topology = Arc::new(Topology::standard());
        let (board, moves) =
            generate_with_solution(topology, &BoardRecipe::standard(), 17).unwrap();
        assert_eq!(moves.len(), 25);
        let mut state = board;
        for mv in moves {
            assert!(rules::is_legal_move(&state, mv), "{} is not legal", mv);
            state = state.apply(mv);
        }
        assert!(state.is_empty());
    }

    #[test]
    fn test_rejects_unmatched_pair() {
        let topology = Arc::new(Topology::line(4).unwrap());
        let recipe = BoardRecipe::from_pairs(vec![(Element::Fire, Element::Water)]);
        assert!(matches!(
            generate_with_recipe(topology, &recipe, 0),
            Err(SolverError::InvalidBoard(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_recipe() {
        let topology = Arc::new(Topology::line(2).unwrap());
        let recipe = BoardRecipe::from_pairs(vec![(Element::Fire, Element::Fire); 2]);
        assert!(generate_with_recipe(topology, &recipe, 0).is_err());
    }

    #[test]
    fn test_metals_come_out_in_rank_order() {
        let topology = Arc::new(Topology::line(6).unwrap());
        let recipe = BoardRecipe::from_pairs(vec![
            (Element::Quicksilver, Element::Metal(Metal::Gold)),
            (Element::Quicksilver, Element::Metal(Metal::Lead)),
            (Element::Quicksilver, Element::Metal(Metal::Tin)),
        ]);
        let mut board = generate_with_recipe(topology, &recipe, 5).unwrap();
        for expected in [Metal::Lead, Metal::Tin, Metal::Gold] {
            assert_eq!(board.lowest_metal(), Some(expected));
            let moves = rules::legal_moves(&board);
            board = board.apply(moves[0]);
        }
        assert!(board.is_empty());
    }
}
