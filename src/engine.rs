//! Core board model for the hex marble puzzle.
//!
//! This module defines the game's fundamental components:
//! - `Element` / `Metal`: the closed set of marble kinds a cell can hold.
//! - `CellSet`: a 128-bit set of cell indices.
//! - `BoardState`: an immutable snapshot of which cells still hold a marble.
//! - `Move`: an unordered pair of cells removed together.
//! - `Game`: an interactive session that replaces its state on every move and
//!   keeps the prior states on an undo stack.
use crate::error::SolverError;
use crate::rules;
use crate::topology::{Topology, MAX_CELLS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// Metals in transmutation order. A metal may only be removed once every
/// lower metal is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metal {
    Lead,
    Tin,
    Iron,
    Copper,
    Silver,
    Gold,
}

impl Metal {
    pub const ALL: [Metal; 6] = [
        Metal::Lead,
        Metal::Tin,
        Metal::Iron,
        Metal::Copper,
        Metal::Silver,
        Metal::Gold,
    ];

    /// Position in the transmutation order, lead being 0.
    pub fn rank(self) -> usize {
        self as usize
    }
}

/// The pairing-relevant content of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    /// No marble.
    Empty,
    Fire,
    Water,
    Earth,
    Air,
    /// Wildcard for the four cardinal elements.
    Salt,
    /// Pairs only with `Mors`.
    Vitae,
    /// Pairs only with `Vitae`.
    Mors,
    /// Solvent that pairs with the lowest metal still on the board.
    Quicksilver,
    Metal(Metal),
}

/// Number of distinct `Element` values, used to size per-kind counters.
pub const ELEMENT_KINDS: usize = 15;

impl Element {
    pub const CARDINALS: [Element; 4] =
        [Element::Fire, Element::Water, Element::Earth, Element::Air];

    /// Dense index in `0..ELEMENT_KINDS`.
    pub fn index(self) -> usize {
        match self {
            Element::Empty => 0,
            Element::Fire => 1,
            Element::Water => 2,
            Element::Earth => 3,
            Element::Air => 4,
            Element::Salt => 5,
            Element::Vitae => 6,
            Element::Mors => 7,
            Element::Quicksilver => 8,
            Element::Metal(m) => 9 + m.rank(),
        }
    }

    pub fn is_cardinal(self) -> bool {
        matches!(
            self,
            Element::Fire | Element::Water | Element::Earth | Element::Air
        )
    }

    pub fn is_metal(self) -> bool {
        matches!(self, Element::Metal(_))
    }

    pub fn metal(self) -> Option<Metal> {
        match self {
            Element::Metal(m) => Some(m),
            _ => None,
        }
    }

    /// Upper-case tag used in the JSON cell list.
    pub fn name(self) -> &'static str {
        match self {
            Element::Empty => "EMPTY",
            Element::Fire => "FIRE",
            Element::Water => "WATER",
            Element::Earth => "EARTH",
            Element::Air => "AIR",
            Element::Salt => "SALT",
            Element::Vitae => "VITAE",
            Element::Mors => "MORS",
            Element::Quicksilver => "QUICKSILVER",
            Element::Metal(Metal::Lead) => "LEAD",
            Element::Metal(Metal::Tin) => "TIN",
            Element::Metal(Metal::Iron) => "IRON",
            Element::Metal(Metal::Copper) => "COPPER",
            Element::Metal(Metal::Silver) => "SILVER",
            Element::Metal(Metal::Gold) => "GOLD",
        }
    }

    /// Converts the element to its single-character code.
    ///
    /// Metals use the digits `1` (lead) to `6` (gold).
    ///
    /// # Examples
    ///
    /// ```
    /// use sigmar_solver::engine::{Element, Metal};
    /// assert_eq!(Element::Fire.to_char(), 'F');
    /// assert_eq!(Element::Metal(Metal::Gold).to_char(), '6');
    /// assert_eq!(Element::Empty.to_char(), '.');
    /// ```
    pub fn to_char(self) -> char {
        match self {
            Element::Empty => '.',
            Element::Fire => 'F',
            Element::Water => 'W',
            Element::Earth => 'E',
            Element::Air => 'A',
            Element::Salt => 'S',
            Element::Vitae => 'V',
            Element::Mors => 'M',
            Element::Quicksilver => 'Q',
            Element::Metal(m) => (b'1' + m.rank() as u8) as char,
        }
    }

    /// Inverse of [`Element::to_char`].
    pub fn from_char(c: char) -> Option<Element> {
        let element = match c {
            '.' => Element::Empty,
            'F' => Element::Fire,
            'W' => Element::Water,
            'E' => Element::Earth,
            'A' => Element::Air,
            'S' => Element::Salt,
            'V' => Element::Vitae,
            'M' => Element::Mors,
            'Q' => Element::Quicksilver,
            '1'..='6' => Element::Metal(Metal::ALL[(c as u8 - b'1') as usize]),
            _ => return None,
        };
        Some(element)
    }

    /// ANSI background colour for terminal output.
    fn to_ansi_color_code(self) -> &'static str {
        match self {
            Element::Empty => "40",
            Element::Fire => "41",
            Element::Earth => "42",
            Element::Air => "43",
            Element::Water => "44",
            Element::Vitae | Element::Mors => "45",
            Element::Salt | Element::Quicksilver => "47",
            Element::Metal(_) => "46",
        }
    }
}

impl FromStr for Element {
    type Err = SolverError;

    /// Parses a tag such as `"FIRE"` or `"gold"` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let element = match upper.as_str() {
            "EMPTY" => Element::Empty,
            "FIRE" => Element::Fire,
            "WATER" => Element::Water,
            "EARTH" => Element::Earth,
            "AIR" => Element::Air,
            "SALT" => Element::Salt,
            "VITAE" => Element::Vitae,
            "MORS" => Element::Mors,
            "QUICKSILVER" => Element::Quicksilver,
            "LEAD" => Element::Metal(Metal::Lead),
            "TIN" => Element::Metal(Metal::Tin),
            "IRON" => Element::Metal(Metal::Iron),
            "COPPER" => Element::Metal(Metal::Copper),
            "SILVER" => Element::Metal(Metal::Silver),
            "GOLD" => Element::Metal(Metal::Gold),
            _ => {
                return Err(SolverError::invalid_board(format!(
                    "unrecognized element tag '{}'",
                    s
                )))
            }
        };
        Ok(element)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lock-state marker reported alongside each cell by the board scanner.
///
/// It is kept for round trips only. Whether a cell can be removed is always
/// recomputed from the cells still present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellMarker {
    #[default]
    Normal,
    Locked,
}

impl CellMarker {
    pub fn name(self) -> &'static str {
        match self {
            CellMarker::Normal => "normal",
            CellMarker::Locked => "locked",
        }
    }
}

impl FromStr for CellMarker {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(CellMarker::Normal),
            "locked" => Ok(CellMarker::Locked),
            _ => Err(SolverError::invalid_board(format!(
                "unrecognized lock-state marker '{}'",
                s
            ))),
        }
    }
}

/// A set of cell indices below [`MAX_CELLS`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellSet(u128);

impl CellSet {
    pub fn new() -> Self {
        CellSet(0)
    }

    pub fn insert(&mut self, idx: usize) {
        debug_assert!(idx < MAX_CELLS);
        self.0 |= 1u128 << idx;
    }

    pub fn remove(&mut self, idx: usize) {
        debug_assert!(idx < MAX_CELLS);
        self.0 &= !(1u128 << idx);
    }

    pub fn contains(&self, idx: usize) -> bool {
        idx < MAX_CELLS && self.0 & (1u128 << idx) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let idx = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(idx)
        })
    }
}

impl FromIterator<usize> for CellSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = CellSet::new();
        for idx in iter {
            set.insert(idx);
        }
        set
    }
}

/// When a board counts as cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalRule {
    /// Every cell must be removed.
    #[default]
    Empty,
    /// A single remaining gold marble also counts as cleared.
    EmptyOrLoneGold,
}

/// An unordered pair of cells removed in one step. Always stored with the
/// smaller index first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)")]
pub struct Move(usize, usize);

impl Move {
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Move(a, b)
        } else {
            Move(b, a)
        }
    }

    pub fn first(&self) -> usize {
        self.0
    }

    pub fn second(&self) -> usize {
        self.1
    }

    pub fn cells(&self) -> (usize, usize) {
        (self.0, self.1)
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.0 == idx || self.1 == idx
    }
}

impl From<(usize, usize)> for Move {
    fn from((a, b): (usize, usize)) -> Self {
        Move::new(a, b)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// Immutable snapshot of a puzzle.
///
/// The topology and the original element of every cell are shared between
/// all states of one puzzle; a state only owns its present-cell set and the
/// per-element counters derived from it. Two states are equal when the same
/// cells are present.
#[derive(Clone, Debug)]
pub struct BoardState {
    topology: Arc<Topology>,
    elements: Arc<[Element]>,
    markers: Arc<[CellMarker]>,
    present: CellSet,
    counts: [u8; ELEMENT_KINDS],
}

/// The part of a [`BoardState`] that differs between states of one puzzle.
///
/// Searches keep these instead of full states and rebuild a state with
/// [`BoardState::unpack`] when they need one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PackedState {
    present: CellSet,
    counts: [u8; ELEMENT_KINDS],
}

impl PackedState {
    pub fn present(&self) -> CellSet {
        self.present
    }
}

impl BoardState {
    /// Builds a state from one `(element, marker)` entry per topology cell.
    ///
    /// # Errors
    /// Returns [`SolverError::InvalidBoard`] if the list length differs from
    /// the topology's cell count.
    pub fn from_cells(
        topology: Arc<Topology>,
        cells: &[(Element, CellMarker)],
    ) -> Result<Self, SolverError> {
        if cells.len() != topology.cell_count() {
            return Err(SolverError::invalid_board(format!(
                "expected {} cells, found {}",
                topology.cell_count(),
                cells.len()
            )));
        }

        let mut present = CellSet::new();
        let mut counts = [0u8; ELEMENT_KINDS];
        for (idx, &(element, _)) in cells.iter().enumerate() {
            if element != Element::Empty {
                present.insert(idx);
                counts[element.index()] += 1;
            }
        }

        Ok(BoardState {
            topology,
            elements: cells.iter().map(|&(e, _)| e).collect(),
            markers: cells.iter().map(|&(_, m)| m).collect(),
            present,
            counts,
        })
    }

    /// Same as [`BoardState::from_cells`] with every marker `Normal`.
    pub fn from_elements(
        topology: Arc<Topology>,
        elements: &[Element],
    ) -> Result<Self, SolverError> {
        let cells: Vec<(Element, CellMarker)> =
            elements.iter().map(|&e| (e, CellMarker::Normal)).collect();
        BoardState::from_cells(topology, &cells)
    }

    /// A board with no marbles at all.
    pub fn empty(topology: Arc<Topology>) -> Self {
        let count = topology.cell_count();
        BoardState {
            topology,
            elements: vec![Element::Empty; count].into(),
            markers: vec![CellMarker::Normal; count].into(),
            present: CellSet::new(),
            counts: [0; ELEMENT_KINDS],
        }
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn cell_count(&self) -> usize {
        self.elements.len()
    }

    /// Element currently at `idx`; `Element::Empty` once the cell is removed.
    pub fn element(&self, idx: usize) -> Element {
        if self.present.contains(idx) {
            self.elements[idx]
        } else {
            Element::Empty
        }
    }

    pub fn marker(&self, idx: usize) -> CellMarker {
        self.markers[idx]
    }

    pub fn is_present(&self, idx: usize) -> bool {
        self.present.contains(idx)
    }

    pub fn present(&self) -> CellSet {
        self.present
    }

    pub fn pack(&self) -> PackedState {
        PackedState {
            present: self.present,
            counts: self.counts,
        }
    }

    /// Rebuilds a state of this puzzle from `packed`, sharing the topology
    /// and cell contents with `self`.
    ///
    /// `packed` must come from a state of the same puzzle.
    pub fn unpack(&self, packed: PackedState) -> BoardState {
        BoardState {
            topology: Arc::clone(&self.topology),
            elements: Arc::clone(&self.elements),
            markers: Arc::clone(&self.markers),
            present: packed.present,
            counts: packed.counts,
        }
    }

    pub fn present_count(&self) -> usize {
        self.present.len()
    }

    /// Number of present cells holding `element`.
    pub fn count(&self, element: Element) -> usize {
        if element == Element::Empty {
            return self.cell_count() - self.present_count();
        }
        self.counts[element.index()] as usize
    }

    /// Number of present metal cells of any rank.
    pub fn metal_count(&self) -> usize {
        Metal::ALL
            .iter()
            .map(|&m| self.count(Element::Metal(m)))
            .sum()
    }

    /// Lowest metal rank still on the board, if any.
    pub fn lowest_metal(&self) -> Option<Metal> {
        Metal::ALL
            .iter()
            .copied()
            .find(|&m| self.count(Element::Metal(m)) > 0)
    }

    /// Present cells with their elements, in ascending index order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, Element)> + '_ {
        self.present.iter().map(move |idx| (idx, self.elements[idx]))
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// Whether the board is cleared under `rule`.
    pub fn is_terminal(&self, rule: TerminalRule) -> bool {
        match rule {
            TerminalRule::Empty => self.is_empty(),
            TerminalRule::EmptyOrLoneGold => {
                self.is_empty()
                    || (self.present_count() == 1
                        && self.count(Element::Metal(Metal::Gold)) == 1)
            }
        }
    }

    /// Returns a new state with both cells of `mv` removed.
    ///
    /// The receiver is left untouched.
    ///
    /// # Panics
    /// Panics if either cell is absent; callers only pass moves produced by
    /// [`rules::legal_moves`] or checked with [`rules::is_legal_move`].
    pub fn apply(&self, mv: Move) -> BoardState {
        let (a, b) = mv.cells();
        assert!(a != b, "move {} removes the same cell twice", mv);
        assert!(
            self.present.contains(a) && self.present.contains(b),
            "move {} references an absent cell",
            mv
        );

        let mut next = self.clone();
        for idx in [a, b] {
            next.present.remove(idx);
            next.counts[self.elements[idx].index()] -= 1;
        }
        next
    }

    /// Current contents as a cell list, removed cells reported as `EMPTY`.
    pub fn to_cells(&self) -> Vec<(Element, CellMarker)> {
        (0..self.cell_count())
            .map(|idx| (self.element(idx), self.markers[idx]))
            .collect()
    }

    /// Renders the board with optional highlighted cells.
    ///
    /// Hexagon topologies are drawn row by row with the usual half-cell
    /// indentation; other topologies are drawn as a single line in index
    /// order. Highlighted cells are shown in reverse video.
    pub fn to_string_with_highlight(&self, highlight: Option<Move>) -> String {
        let draw = |idx: usize| {
            let element = self.element(idx);
            let code = element.to_ansi_color_code();
            if highlight.map_or(false, |m| m.contains(idx)) {
                format!("\x1b[7;{}m{}\x1b[m ", code, element.to_char())
            } else {
                format!("{} ", element.to_char())
            }
        };

        match self.topology.rows() {
            Some(rows) => {
                let radius = rows.len() / 2;
                rows.iter()
                    .enumerate()
                    .map(|(row_idx, row)| {
                        let indent = " ".repeat(radius.abs_diff(row_idx));
                        let cells: String = row.iter().map(|&idx| draw(idx)).collect();
                        format!("{}{}", indent, cells.trim_end())
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            None => {
                let cells: String = (0..self.cell_count()).map(draw).collect();
                cells.trim_end().to_string()
            }
        }
    }
}

impl PartialEq for BoardState {
    fn eq(&self, other: &Self) -> bool {
        self.present == other.present
    }
}

impl Eq for BoardState {}

impl Hash for BoardState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.present.hash(state);
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = self.to_string_with_highlight(None);
        write!(f, "{}", plain)
    }
}

/// Renders cell indices in board layout, for choosing moves by hand.
pub fn render_indices(topology: &Topology) -> String {
    match topology.rows() {
        Some(rows) => {
            let radius = rows.len() / 2;
            rows.iter()
                .enumerate()
                .map(|(row_idx, row)| {
                    let indent = "  ".repeat(radius.abs_diff(row_idx));
                    let cells: Vec<String> = row.iter().map(|idx| format!("{:>3}", idx)).collect();
                    format!("{}{}", indent, cells.join(" "))
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        None => (0..topology.cell_count())
            .map(|idx| idx.to_string())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// An interactive play session.
///
/// The current state is replaced wholesale by every accepted move and the
/// previous state is pushed on an undo stack; nothing is edited in place.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use sigmar_solver::engine::{BoardState, Element, Game};
/// use sigmar_solver::topology::Topology;
///
/// let topology = Arc::new(Topology::line(2).unwrap());
/// let board = BoardState::from_elements(topology, &[Element::Fire, Element::Fire]).unwrap();
/// let mut game = Game::new(board);
///
/// game.process_move(0, 1).unwrap();
/// assert!(game.is_solved());
///
/// assert!(game.undo_last_move());
/// assert_eq!(game.steps(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct Game {
    state: BoardState,
    history: Vec<BoardState>,
    terminal: TerminalRule,
}

impl Game {
    pub fn new(initial: BoardState) -> Self {
        Game::with_terminal_rule(initial, TerminalRule::default())
    }

    pub fn with_terminal_rule(initial: BoardState, terminal: TerminalRule) -> Self {
        Game {
            state: initial,
            history: Vec::new(),
            terminal,
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn terminal_rule(&self) -> TerminalRule {
        self.terminal
    }

    /// Number of accepted moves not yet undone.
    pub fn steps(&self) -> usize {
        self.history.len()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        rules::legal_moves(&self.state)
    }

    /// Removes the pair `(a, b)` if it is a legal move.
    ///
    /// # Errors
    /// Returns [`SolverError::IllegalMove`] and leaves the session unchanged
    /// otherwise.
    pub fn process_move(&mut self, a: usize, b: usize) -> Result<(), SolverError> {
        let mv = Move::new(a, b);
        if !rules::is_legal_move(&self.state, mv) {
            return Err(SolverError::IllegalMove(mv.first(), mv.second()));
        }
        let next = self.state.apply(mv);
        let previous = std::mem::replace(&mut self.state, next);
        self.history.push(previous);
        Ok(())
    }

    /// Restores the state before the last accepted move.
    ///
    /// Returns `false` when there is nothing to undo.
    pub fn undo_last_move(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.state = previous;
                true
            }
            None => false,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.state.is_terminal(self.terminal)
    }

    /// Not solved and no legal move left.
    pub fn is_stuck(&self) -> bool {
        !self.is_solved() && self.legal_moves().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::board_from_str;

    fn line_board(codes: &str) -> BoardState {
        let topology = Arc::new(Topology::line(codes.chars().count()).unwrap());
        board_from_str(topology, codes).unwrap()
    }

    #[test]
    fn test_element_tag_round_trip() {
        for idx in 0..ELEMENT_KINDS {
            let element = match idx {
                0 => Element::Empty,
                1..=4 => Element::CARDINALS[idx - 1],
                5 => Element::Salt,
                6 => Element::Vitae,
                7 => Element::Mors,
                8 => Element::Quicksilver,
                _ => Element::Metal(Metal::ALL[idx - 9]),
            };
            assert_eq!(element.index(), idx);
            assert_eq!(element.name().parse::<Element>().unwrap(), element);
            assert_eq!(Element::from_char(element.to_char()), Some(element));
        }
    }

    #[test]
    fn test_element_parse_is_case_insensitive() {
        assert_eq!("gold".parse::<Element>().unwrap(), Element::Metal(Metal::Gold));
        assert_eq!(" Salt ".parse::<Element>().unwrap(), Element::Salt);
    }

    #[test]
    fn test_element_parse_unknown() {
        let err = "UNKNOWN".parse::<Element>().unwrap_err();
        assert!(matches!(err, SolverError::InvalidBoard(_)));
        assert!(err.to_string().contains("UNKNOWN"));
    }

    #[test]
    fn test_metal_order() {
        assert!(Metal::Lead < Metal::Tin);
        assert!(Metal::Silver < Metal::Gold);
        assert_eq!(Metal::Gold.rank(), 5);
    }

    #[test]
    fn test_cell_set_operations() {
        let mut set = CellSet::new();
        assert!(set.is_empty());
        set.insert(0);
        set.insert(90);
        set.insert(127);
        assert_eq!(set.len(), 3);
        assert!(set.contains(90));
        assert!(!set.contains(200));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 90, 127]);
        set.remove(90);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 127]);
    }

    #[test]
    fn test_move_is_unordered() {
        assert_eq!(Move::new(7, 3), Move::new(3, 7));
        assert_eq!(Move::new(7, 3).cells(), (3, 7));
        assert_eq!(Move::from((9, 2)).first(), 2);
    }

    #[test]
    fn test_move_json_shape() {
        let json = serde_json::to_string(&Move::new(4, 1)).unwrap();
        assert_eq!(json, "[1,4]");
        let parsed: Move = serde_json::from_str("[8,5]").unwrap();
        assert_eq!(parsed.cells(), (5, 8));
    }

    #[test]
    fn test_from_cells_wrong_length() {
        let topology = Arc::new(Topology::line(3).unwrap());
        let err = BoardState::from_elements(topology, &[Element::Fire]).unwrap_err();
        assert!(matches!(err, SolverError::InvalidBoard(_)));
    }

    #[test]
    fn test_counts() {
        let board = line_board("FF.S12Q2");
        assert_eq!(board.present_count(), 7);
        assert_eq!(board.count(Element::Fire), 2);
        assert_eq!(board.count(Element::Salt), 1);
        assert_eq!(board.count(Element::Empty), 1);
        assert_eq!(board.metal_count(), 3);
        assert_eq!(board.lowest_metal(), Some(Metal::Lead));
        assert_eq!(board.element(2), Element::Empty);
        assert!(!board.is_present(2));
    }

    #[test]
    fn test_apply_is_pure() {
        let board = line_board("FFWW");
        let next = board.apply(Move::new(0, 1));
        assert_eq!(board.present_count(), 4);
        assert_eq!(next.present_count(), 2);
        assert_eq!(next.count(Element::Fire), 0);
        assert_eq!(next.count(Element::Water), 2);
        assert_eq!(next.element(0), Element::Empty);
        assert_eq!(board.element(0), Element::Fire);
    }

    #[test]
    #[should_panic(expected = "absent cell")]
    fn test_apply_absent_cell_panics() {
        let board = line_board("F.F");
        let _ = board.apply(Move::new(0, 1));
    }

    #[test]
    fn test_equality_uses_present_cells() {
        let board = line_board("FFFF");
        let a = board.apply(Move::new(0, 1)).apply(Move::new(2, 3));
        let b = board.apply(Move::new(2, 3)).apply(Move::new(0, 1));
        assert_eq!(a, b);
        assert_ne!(a, board);
    }

    #[test]
    fn test_terminal_rules() {
        let board = line_board("6");
        assert!(!board.is_terminal(TerminalRule::Empty));
        assert!(board.is_terminal(TerminalRule::EmptyOrLoneGold));
        let board = line_board("5");
        assert!(!board.is_terminal(TerminalRule::EmptyOrLoneGold));
        let board = line_board("..");
        assert!(board.is_terminal(TerminalRule::Empty));
    }

    #[test]
    fn test_pack_and_unpack() {
        let board = line_board("FFWQ1");
        let next = board.apply(Move::new(0, 1));
        let packed = next.pack();
        assert_eq!(packed.present(), next.present());

        let rebuilt = board.unpack(packed);
        assert_eq!(rebuilt, next);
        assert_eq!(rebuilt.count(Element::Fire), 0);
        assert_eq!(rebuilt.count(Element::Water), 1);
        assert_eq!(rebuilt.lowest_metal(), Some(Metal::Lead));
        assert_eq!(rebuilt.to_cells(), next.to_cells());
    }

    #[test]
    fn test_to_cells_reports_removed_as_empty() {
        let board = line_board("FF");
        let cells = board.apply(Move::new(0, 1)).to_cells();
        assert_eq!(cells, vec![(Element::Empty, CellMarker::Normal); 2]);
    }

    #[test]
    fn test_display_hexagon() {
        let topology = Arc::new(Topology::hexagon(1).unwrap());
        let board = BoardState::from_elements(
            topology,
            &[
                Element::Fire,
                Element::Water,
                Element::Earth,
                Element::Salt,
                Element::Air,
                Element::Vitae,
                Element::Mors,
            ],
        )
        .unwrap();
        // Row r = -1 holds (0,-1)=2 and (1,-1)=5; r = 0 holds 0, 3, 6; r = 1 holds 1, 4.
        assert_eq!(board.to_string(), " E V\nF S M\n W A");
    }

    #[test]
    fn test_display_line() {
        assert_eq!(line_board("F.1").to_string(), "F . 1");
    }

    #[test]
    fn test_render_indices_line() {
        let topology = Topology::line(3).unwrap();
        assert_eq!(render_indices(&topology), "0 1 2");
    }

    #[test]
    fn test_game_process_and_undo() {
        let mut game = Game::new(line_board("FFWW"));
        assert_eq!(game.legal_moves().len(), 2);
        game.process_move(1, 0).unwrap();
        assert_eq!(game.steps(), 1);
        assert_eq!(game.state().present_count(), 2);
        game.process_move(2, 3).unwrap();
        assert!(game.is_solved());
        assert!(game.undo_last_move());
        assert!(game.undo_last_move());
        assert!(!game.undo_last_move());
        assert_eq!(game.state().present_count(), 4);
    }

    #[test]
    fn test_game_rejects_illegal_move() {
        let mut game = Game::new(line_board("FW"));
        let err = game.process_move(0, 1).unwrap_err();
        assert!(matches!(err, SolverError::IllegalMove(0, 1)));
        assert_eq!(game.steps(), 0);
        assert!(game.is_stuck());
    }
}
