//! Weighted best-first search over board states.
//!
//! The open set is a binary heap ordered by `f = g + h`, ties broken by the
//! lower `h` and then by insertion order, so a fixed board and fixed weights
//! always expand nodes in the same order. `g` counts removed pairs and `h`
//! comes from [`crate::heuristics::evaluate`]; since `h` is not admissible the
//! search does not promise the shortest solution, only that it finds one if
//! it is allowed to run to exhaustion.
//!
//! Open-set nodes carry only a [`PackedState`]; the full state is rebuilt
//! from the initial board when a node is popped. Once a node is popped, all
//! that survives is a parent link in the [`NodeGraph`], which is enough to
//! rebuild the move sequence of the answer. The search has no memory budget
//! of its own: callers that cannot afford an exhaustive run on a full board
//! should configure an interrupt condition.
use crate::config::SolverConfig;
use crate::engine::{BoardState, CellMarker, CellSet, Element, Move, PackedState};
use crate::error::SolverError;
use crate::heuristics;
use crate::interrupt::SearchStats;
use crate::rules;
use crate::topology::Topology;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Iterations between two debug progress events.
const PROGRESS_LOG_INTERVAL: u64 = 10_000;

/// Ordered moves leading from the initial board to a cleared board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    pub moves: Vec<Move>,
}

impl Solution {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Plays the moves on `initial`, checking each one, and returns the final state.
    ///
    /// # Errors
    /// Returns [`SolverError::IllegalMove`] at the first move that is not legal.
    pub fn replay(&self, initial: &BoardState) -> Result<BoardState, SolverError> {
        let mut state = initial.clone();
        for &mv in &self.moves {
            if !rules::is_legal_move(&state, mv) {
                return Err(SolverError::IllegalMove(mv.first(), mv.second()));
            }
            state = state.apply(mv);
        }
        Ok(state)
    }
}

/// How a solve ended. None of these is an error; callers branch on the kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A cleared board was reached.
    Solved(Solution),
    /// Every reachable state was expanded without clearing the board.
    Exhausted,
    /// The interrupt policy fired. This says nothing about solvability.
    Aborted,
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SolveOutcome::Solved(_) => "solved",
            SolveOutcome::Exhausted => "exhausted",
            SolveOutcome::Aborted => "aborted",
        }
    }
}

/// Outcome plus the final statistics of the run.
#[derive(Clone, Debug)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub stats: SearchStats,
    /// Total nodes ever created, the root included.
    pub nodes_created: usize,
}

pub type NodeId = usize;

/// A node waiting in the open set.
///
/// Only the packed present set is stored; the full state is rebuilt against
/// the initial board when the node is popped. Its parent and the move that
/// produced it live in the [`NodeGraph`] under `id`.
#[derive(Clone, Copy, Debug)]
pub struct SearchNode {
    pub id: NodeId,
    pub state: PackedState,
    /// Pairs removed to reach this node.
    pub g_cost: u32,
    pub h_cost: f64,
}

impl SearchNode {
    pub fn f_cost(&self) -> f64 {
        f64::from(self.g_cost) + self.h_cost
    }
}

#[derive(Clone, Copy, Debug)]
struct PathLink {
    parent: Option<NodeId>,
    via: Option<Move>,
}

/// Parent links of every node created during one solve.
#[derive(Debug, Default)]
pub struct NodeGraph {
    links: Vec<PathLink>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a node and returns its id. The root has neither parent nor move.
    pub fn add(&mut self, parent: Option<NodeId>, via: Option<Move>) -> NodeId {
        self.links.push(PathLink { parent, via });
        self.links.len() - 1
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Walks parent links from `id` back to the root and returns the moves in
    /// play order. The graph is not modified.
    ///
    /// # Panics
    /// Panics if `id` was not returned by [`NodeGraph::add`].
    pub fn reconstruct(&self, id: NodeId) -> Solution {
        let mut moves = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let link = self.links[node];
            if let Some(mv) = link.via {
                moves.push(mv);
            }
            current = link.parent;
        }
        moves.reverse();
        Solution { moves }
    }
}

/// Open-set ordering key. Smaller is better.
#[derive(Clone, Copy, Debug)]
struct FrontierKey {
    f_cost: f64,
    h_cost: f64,
    seq: u64,
}

impl PartialEq for FrontierKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierKey {}

impl PartialOrd for FrontierKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_cost
            .total_cmp(&other.f_cost)
            .then_with(|| self.h_cost.total_cmp(&other.h_cost))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// `BinaryHeap` is a max-heap, so keys are wrapped in `Reverse`.
#[derive(Debug)]
struct FrontierEntry {
    key: Reverse<FrontierKey>,
    node: SearchNode,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

#[derive(Debug, Default)]
struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    next_seq: u64,
}

impl Frontier {
    fn push(&mut self, node: SearchNode) {
        let key = FrontierKey {
            f_cost: node.f_cost(),
            h_cost: node.h_cost,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.heap.push(FrontierEntry {
            key: Reverse(key),
            node,
        });
    }

    fn pop(&mut self) -> Option<SearchNode> {
        self.heap.pop().map(|entry| entry.node)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Live counters of a running solve, safe to read from any thread.
///
/// The search publishes to it once per iteration, after the popped node has
/// been fully handled, so a reader never sees a half-expanded node.
#[derive(Debug, Default)]
pub struct SolverProgress {
    iterations: AtomicU64,
    open_set_size: AtomicU64,
    best_g_cost: AtomicU64,
    elapsed_micros: AtomicU64,
    finished: AtomicBool,
}

impl SolverProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn publish(&self, stats: &SearchStats) {
        self.iterations
            .store(stats.iterations, AtomicOrdering::Relaxed);
        self.open_set_size
            .store(stats.open_set_size as u64, AtomicOrdering::Relaxed);
        self.best_g_cost
            .store(u64::from(stats.best_g_cost), AtomicOrdering::Relaxed);
        self.elapsed_micros
            .store(stats.elapsed.as_micros() as u64, AtomicOrdering::Relaxed);
    }

    fn finish(&self, stats: &SearchStats) {
        self.publish(stats);
        self.finished.store(true, AtomicOrdering::Release);
    }

    /// Current counters.
    pub fn snapshot(&self) -> SearchStats {
        SearchStats {
            iterations: self.iterations.load(AtomicOrdering::Relaxed),
            open_set_size: self.open_set_size.load(AtomicOrdering::Relaxed) as usize,
            best_g_cost: self.best_g_cost.load(AtomicOrdering::Relaxed) as u32,
            elapsed: Duration::from_micros(self.elapsed_micros.load(AtomicOrdering::Relaxed)),
        }
    }

    /// Whether the solve that owns this progress has returned.
    pub fn is_finished(&self) -> bool {
        self.finished.load(AtomicOrdering::Acquire)
    }
}

/// Best-first solver configured once and reusable for any number of boards.
///
/// Each call to [`Solver::solve`] is independent: nothing is cached between
/// calls.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use sigmar_solver::engine::Move;
/// use sigmar_solver::solver::{SolveOutcome, Solver};
/// use sigmar_solver::topology::Topology;
/// use sigmar_solver::utils::board_from_str;
///
/// let topology = Arc::new(Topology::line(2).unwrap());
/// let board = board_from_str(topology, "FF").unwrap();
/// let report = Solver::default().solve(&board);
/// match report.outcome {
///     SolveOutcome::Solved(solution) => assert_eq!(solution.moves, vec![Move::new(0, 1)]),
///     other => panic!("unexpected outcome {:?}", other),
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Solver { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Builds the initial board from a cell list and solves it.
    ///
    /// # Errors
    /// Returns [`SolverError::InvalidBoard`] before any search work if the
    /// cell list does not fit `topology`.
    pub fn solve_cells(
        &self,
        topology: Arc<Topology>,
        cells: &[(Element, CellMarker)],
    ) -> Result<SolveReport, SolverError> {
        let initial = BoardState::from_cells(topology, cells)?;
        Ok(self.solve(&initial))
    }

    pub fn solve(&self, initial: &BoardState) -> SolveReport {
        self.solve_with_progress(initial, &SolverProgress::new())
    }

    /// Runs the search, publishing counters to `progress` after every iteration.
    pub fn solve_with_progress(
        &self,
        initial: &BoardState,
        progress: &SolverProgress,
    ) -> SolveReport {
        let start = Instant::now();
        let weights = &self.config.heuristic_weights;
        let interrupt = &self.config.interrupt;
        let terminal = self.config.terminal;

        info!(
            event = "solve_start",
            cells = initial.present_count(),
            interrupt_enabled = interrupt.enabled
        );

        let mut graph = NodeGraph::new();
        let mut frontier = Frontier::default();
        let mut best_g: HashMap<CellSet, u32> = HashMap::new();
        let mut stats = SearchStats::default();

        let root_id = graph.add(None, None);
        best_g.insert(initial.present(), 0);
        frontier.push(SearchNode {
            id: root_id,
            state: initial.pack(),
            g_cost: 0,
            h_cost: heuristics::evaluate(initial, weights),
        });

        let outcome = loop {
            let node = match frontier.pop() {
                Some(node) => node,
                None => break SolveOutcome::Exhausted,
            };
            stats.iterations += 1;
            stats.best_g_cost = stats.best_g_cost.max(node.g_cost);
            stats.open_set_size = frontier.len();
            stats.elapsed = start.elapsed();

            // A cheaper path to this state was queued after this node.
            if best_g
                .get(&node.state.present())
                .is_some_and(|&g| g < node.g_cost)
            {
                progress.publish(&stats);
                continue;
            }

            let state = initial.unpack(node.state);
            if state.is_terminal(terminal) {
                break SolveOutcome::Solved(graph.reconstruct(node.id));
            }

            if interrupt.should_interrupt(&stats) {
                break SolveOutcome::Aborted;
            }

            let child_g = node.g_cost + 1;
            for mv in rules::legal_moves(&state) {
                let child_state = state.apply(mv);
                let child_key = child_state.present();
                if best_g.get(&child_key).is_some_and(|&g| g <= child_g) {
                    continue;
                }
                best_g.insert(child_key, child_g);

                let h_cost = heuristics::evaluate(&child_state, weights);
                let id = graph.add(Some(node.id), Some(mv));
                frontier.push(SearchNode {
                    id,
                    state: child_state.pack(),
                    g_cost: child_g,
                    h_cost,
                });
            }

            stats.open_set_size = frontier.len();
            progress.publish(&stats);
            if stats.iterations % PROGRESS_LOG_INTERVAL == 0 {
                debug!(
                    iterations = stats.iterations,
                    open_set_size = stats.open_set_size,
                    best_g_cost = stats.best_g_cost,
                    elapsed_s = stats.elapsed.as_secs_f64(),
                    "search progress"
                );
            }
        };

        stats.open_set_size = frontier.len();
        stats.elapsed = start.elapsed();
        progress.finish(&stats);

        match &outcome {
            SolveOutcome::Solved(solution) => info!(
                event = "solve_end",
                outcome = outcome.kind(),
                moves = solution.len(),
                iterations = stats.iterations,
                nodes = graph.len(),
                elapsed_s = stats.elapsed.as_secs_f64()
            ),
            SolveOutcome::Exhausted => info!(
                event = "solve_end",
                outcome = outcome.kind(),
                iterations = stats.iterations,
                nodes = graph.len(),
                elapsed_s = stats.elapsed.as_secs_f64()
            ),
            SolveOutcome::Aborted => warn!(
                event = "solve_end",
                outcome = outcome.kind(),
                iterations = stats.iterations,
                open_set_size = stats.open_set_size,
                best_g_cost = stats.best_g_cost,
                elapsed_s = stats.elapsed.as_secs_f64(),
                "interrupted by configured condition"
            ),
        }

        SolveReport {
            outcome,
            stats,
            nodes_created: graph.len(),
        }
    }
}

/// Handle to a solve running on its own thread.
#[derive(Debug)]
pub struct SolveHandle {
    progress: Arc<SolverProgress>,
    worker: JoinHandle<SolveReport>,
}

impl SolveHandle {
    /// Current counters of the running solve.
    pub fn progress(&self) -> SearchStats {
        self.progress.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.progress.is_finished()
    }

    /// Waits for the solve to end.
    pub fn join(self) -> thread::Result<SolveReport> {
        self.worker.join()
    }
}

/// Starts `solver` on `initial` in a background thread.
///
/// Only the progress counters and, at the end, the report cross the thread
/// boundary. To stop early, configure an interrupt condition before spawning.
pub fn spawn_solve(solver: Solver, initial: BoardState) -> SolveHandle {
    let progress = Arc::new(SolverProgress::new());
    let worker_progress = Arc::clone(&progress);
    let worker = thread::spawn(move || solver.solve_with_progress(&initial, &worker_progress));
    SolveHandle { progress, worker }
}
