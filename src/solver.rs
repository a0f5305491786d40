use std::fmt::{self, Debug, Display, Formatter};
use std::time::{Duration, Instant};

use fnv::{FnvHashMap, FnvHashSet};
use log::debug;
use separator::Separatable;

use crate::board::{Board, CellType};
use crate::data::{Cost, Pos};
use crate::dead_squares::DeadSquareMap;
use crate::expand::{expand_macro, expand_primitive, walk_path};
use crate::frontier::{Frontier, FrontierKind};
use crate::heuristic::{Heuristic, HeuristicKind};
use crate::state::{PuzzleState, StateId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveGen {
    /// One pusher step per search step, cost 1.
    Primitive,
    /// One box push per search step, cost = pusher walk + push. Collapses
    /// the walking between pushes; paths are re-expanded to primitive states
    /// when a solution is reconstructed.
    Macro,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    pub move_gen: MoveGen,
    pub heuristic: HeuristicKind,
    pub frontier: FrontierKind,
    /// Wall-clock budget; exceeding it abandons the search with no solution.
    pub max_time: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            move_gen: MoveGen::Macro,
            heuristic: HeuristicKind::Simple,
            frontier: FrontierKind::Priority,
            max_time: None,
        }
    }
}

pub struct Stats {
    created_states: Vec<i32>,
    visited_states: Vec<i32>,
    duplicate_states: Vec<i32>,
    pub elapsed: Duration,
    pub frontier_left: usize,
}

impl Stats {
    fn new() -> Self {
        Stats {
            created_states: vec![],
            visited_states: vec![],
            duplicate_states: vec![],
            elapsed: Duration::default(),
            frontier_left: 0,
        }
    }

    pub fn total_created(&self) -> i32 {
        self.created_states.iter().sum()
    }

    pub fn total_visited(&self) -> i32 {
        self.visited_states.iter().sum()
    }

    pub fn total_duplicates(&self) -> i32 {
        self.duplicate_states.iter().sum()
    }

    fn add_created(&mut self, depth: Cost) -> bool {
        Self::add(&mut self.created_states, depth)
    }

    fn add_visited(&mut self, depth: Cost) -> bool {
        Self::add(&mut self.visited_states, depth)
    }

    fn add_duplicate(&mut self, depth: Cost) -> bool {
        Self::add(&mut self.duplicate_states, depth)
    }

    fn add(counts: &mut Vec<i32>, depth: Cost) -> bool {
        let mut new_depth = false;

        // while because macro costs can skip depths
        while depth as usize >= counts.len() {
            counts.push(0);
            new_depth = true;
        }
        counts[depth as usize] += 1;
        new_depth
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "States created total: {}",
            self.total_created().separated_string()
        )?;
        writeln!(
            f,
            "Unique visited total: {}",
            self.total_visited().separated_string()
        )?;
        writeln!(
            f,
            "Reached duplicates total: {}",
            self.total_duplicates().separated_string()
        )?;
        writeln!(
            f,
            "Frontier left at finish: {}",
            self.frontier_left.separated_string()
        )?;
        writeln!(f, "Elapsed: {:?}", self.elapsed)
    }
}

impl Debug for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "created by depth: {:?}", self.created_states)?;
        writeln!(f, "unique visited by depth: {:?}", self.visited_states)?;
        writeln!(f, "reached duplicates by depth: {:?}", self.duplicate_states)?;
        writeln!(f, "total created: {}", self.total_created().separated_string())?;
        writeln!(f, "total visited: {}", self.total_visited().separated_string())?;
        writeln!(f, "elapsed: {:?}", self.elapsed)
    }
}

/// Open-set entry. Parent links are ids into the solver's link map, never
/// owning references - the map owns the data, backtracking only follows.
#[derive(Clone, Debug)]
pub(crate) struct SearchNode {
    pub(crate) state: PuzzleState,
    pub(crate) id: StateId,
    /// g: cost of the best known path here.
    pub(crate) dist: Cost,
    /// h: heuristic estimate to a goal.
    pub(crate) h: Cost,
    pub(crate) prev: Option<StateId>,
    /// Macro mode only: where the pusher stood right before the push.
    pub(crate) pusher_at_push: Option<Pos>,
}

pub struct SolverOk {
    /// Primitive states from initial to goal inclusive; `None` when no
    /// solution was found within the budget. Consumers step through it for
    /// playback.
    pub path_states: Option<Vec<PuzzleState>>,
    pub stats: Stats,
}

impl Debug for SolverOk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.path_states {
            None => writeln!(f, "No solution")?,
            Some(ref states) => writeln!(f, "moves: {}", states.len() - 1)?,
        }
        write!(f, "{}", self.stats)
    }
}

/// One solver owns one board's dead-square map and one frontier per solve
/// call; nothing is shared between solver instances except the read-only
/// board.
pub struct Solver<'a> {
    board: &'a Board,
    dead_squares: DeadSquareMap,
    config: SolverConfig,
}

impl<'a> Solver<'a> {
    pub fn new(board: &'a Board, config: SolverConfig) -> Self {
        let dead_squares = DeadSquareMap::new(board);
        Solver {
            board,
            dead_squares,
            config,
        }
    }

    pub fn dead_squares(&self) -> &DeadSquareMap {
        &self.dead_squares
    }

    pub fn solve(&self, initial: &PuzzleState) -> SolverOk {
        validate(self.board, initial);
        search(self.board, &self.dead_squares, initial, &self.config)
    }
}

/// The packing and dedup machinery assumes distinct positions, so a broken
/// initial state is a caller bug and fails fast.
fn validate(board: &Board, state: &PuzzleState) {
    assert!(
        board.is_free(state.pusher()),
        "pusher starts on a blocked cell"
    );
    for (i, &b) in state.boxes().iter().enumerate() {
        assert!(board.is_free(b), "box starts on a blocked cell");
        assert_ne!(b, state.pusher(), "pusher overlaps a box");
        assert!(
            !state.boxes()[..i].contains(&b),
            "two boxes on the same cell"
        );
    }
}

struct PathLink {
    state: PuzzleState,
    prev: Option<StateId>,
    pusher_at_push: Option<Pos>,
}

/// Best-first search over puzzle states. Also the workhorse of the Abstract
/// heuristic, which runs it on sub-problems with a borrowed dead-square map.
pub(crate) fn search(
    board: &Board,
    dead_squares: &DeadSquareMap,
    initial: &PuzzleState,
    config: &SolverConfig,
) -> SolverOk {
    let started = Instant::now();
    let mut stats = Stats::new();
    let mut heuristic = Heuristic::new(board, dead_squares, config.heuristic);
    let mut frontier = Frontier::new(config.frontier);
    let mut visited: FnvHashSet<StateId> = FnvHashSet::default();
    let mut links: FnvHashMap<StateId, PathLink> = FnvHashMap::default();

    let h = heuristic.evaluate(initial);
    let start = SearchNode {
        state: initial.clone(),
        id: initial.id(),
        dist: 0,
        h,
        prev: None,
        pusher_at_push: None,
    };
    stats.add_created(0);
    frontier.push(start, h);

    let mut goal = None;
    while let Some((node, _score)) = frontier.pop() {
        if visited.contains(&node.id) {
            // stale entry left behind by decrease-key
            stats.add_duplicate(node.dist);
            continue;
        }
        visited.insert(node.id.clone());
        if stats.add_visited(node.dist) {
            debug!("visited new depth: {}", node.dist);
        }

        // record the link on pop, not on discovery - only now is the best
        // path to this state settled
        links.insert(
            node.id.clone(),
            PathLink {
                state: node.state.clone(),
                prev: node.prev.clone(),
                pusher_at_push: node.pusher_at_push,
            },
        );

        if solved(board, &node.state) {
            debug!("solved at depth {}", node.dist);
            goal = Some(node.id);
            break;
        }

        if let Some(limit) = config.max_time {
            if started.elapsed() >= limit {
                debug!("time budget exhausted, abandoning search");
                break;
            }
        }

        let successors = match config.move_gen {
            MoveGen::Primitive => expand_primitive(board, dead_squares, &node.state),
            MoveGen::Macro => expand_macro(board, dead_squares, &node.state),
        };
        for succ in successors {
            let id = succ.state.id();
            if visited.contains(&id) {
                continue;
            }
            let dist = node.dist + succ.cost;
            let h = heuristic.evaluate(&succ.state);
            let score = dist + h;
            stats.add_created(dist);
            let next = SearchNode {
                state: succ.state,
                id: id.clone(),
                dist,
                h,
                prev: Some(node.id.clone()),
                pusher_at_push: succ.pusher_at_push,
            };
            if frontier.exists(&id) {
                frontier.update_if_better(next, score);
            } else {
                frontier.push(next, score);
            }
        }
    }

    stats.elapsed = started.elapsed();
    stats.frontier_left = frontier.len();
    let path_states = goal.map(|goal| backtrack(board, &links, &goal, config.move_gen));
    SolverOk { path_states, stats }
}

/// All cared boxes on targets. Testing boxes (not targets) keeps states with
/// more targets than cared boxes - abstraction sub-problems - well defined.
fn solved(board: &Board, state: &PuzzleState) -> bool {
    state
        .cared_boxes()
        .iter()
        .all(|&b| board.cell_type(b) == CellType::Target)
}

/// Walks the parent links back from the goal. Macro links are re-expanded
/// into the primitive walk the pusher actually took (same box layout as the
/// parent, one cell per step) followed by the push state, so the caller
/// always receives a primitive-state sequence.
fn backtrack(
    board: &Board,
    links: &FnvHashMap<StateId, PathLink>,
    goal: &StateId,
    move_gen: MoveGen,
) -> Vec<PuzzleState> {
    let mut chain = Vec::new();
    let mut cur = goal.clone();
    loop {
        let link = &links[&cur];
        chain.push(link);
        match &link.prev {
            Some(prev) => cur = prev.clone(),
            None => break,
        }
    }
    chain.reverse();

    match move_gen {
        MoveGen::Primitive => chain.iter().map(|link| link.state.clone()).collect(),
        MoveGen::Macro => {
            let mut path = vec![chain[0].state.clone()];
            for pair in chain.windows(2) {
                let (prev, cur) = (pair[0], pair[1]);
                let side = cur
                    .pusher_at_push
                    .expect("macro successors record the push side");
                let walk = walk_path(board, &prev.state, prev.state.pusher(), side);
                for &pos in &walk[1..] {
                    path.push(prev.state.with_pusher(pos));
                }
                path.push(cur.state.clone());
            }
            path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    const ONE_PUSH: &str = r"
#####
#xb*#
#####
";

    const DEAD_CORNER: &str = r"
####
#x #
#b*#
####
";

    const TWO_BOXES: &str = r"
#######
#x    #
#b    #
#*    #
#b    #
#x    #
#######
";

    fn level(text: &str) -> Level {
        text.parse().unwrap()
    }

    fn config(move_gen: MoveGen, heuristic: HeuristicKind) -> SolverConfig {
        SolverConfig {
            move_gen,
            heuristic,
            ..SolverConfig::default()
        }
    }

    fn all_heuristics() -> [HeuristicKind; 4] {
        [
            HeuristicKind::Null,
            HeuristicKind::Simple,
            HeuristicKind::Better,
            HeuristicKind::Abstract {
                abstraction_size: 1,
            },
        ]
    }

    #[test]
    fn one_push_every_configuration() {
        let level = level(ONE_PUSH);
        for move_gen in [MoveGen::Primitive, MoveGen::Macro] {
            for heuristic in all_heuristics() {
                let solver = Solver::new(&level.board, config(move_gen, heuristic));
                let result = solver.solve(&level.state);
                let path = result.path_states.unwrap();
                assert_eq!(path.len(), 2, "{:?} {:?}", move_gen, heuristic);
                assert!(!solved(&level.board, &path[0]));
                assert!(solved(&level.board, &path[1]));
            }
        }
    }

    #[test]
    fn dead_corner_is_unsolvable() {
        let level = level(DEAD_CORNER);
        for move_gen in [MoveGen::Primitive, MoveGen::Macro] {
            for heuristic in all_heuristics() {
                let solver = Solver::new(&level.board, config(move_gen, heuristic));
                let result = solver.solve(&level.state);
                assert!(
                    result.path_states.is_none(),
                    "{:?} {:?}",
                    move_gen,
                    heuristic
                );
            }
        }
    }

    #[test]
    fn optimal_length_agrees_across_configurations() {
        let level = level(TWO_BOXES);
        for move_gen in [MoveGen::Primitive, MoveGen::Macro] {
            for heuristic in all_heuristics() {
                let solver = Solver::new(&level.board, config(move_gen, heuristic));
                let path = solver.solve(&level.state).path_states.unwrap();
                // push up, step back down, push down
                assert_eq!(path.len(), 4, "{:?} {:?}", move_gen, heuristic);
            }
        }
    }

    #[test]
    fn macro_solutions_are_primitive_sequences() {
        let level = level(TWO_BOXES);
        let solver = Solver::new(&level.board, SolverConfig::default());
        let path = solver.solve(&level.state).path_states.unwrap();

        assert_eq!(path[0], level.state);
        assert!(solved(&level.board, path.last().unwrap()));
        for pair in path.windows(2) {
            // every step moves the pusher by exactly one cell
            assert_eq!(pair[0].pusher().dist(pair[1].pusher()), 1);
        }
    }

    #[test]
    fn solving_twice_gives_equal_lengths() {
        let level = level(TWO_BOXES);
        let solver = Solver::new(&level.board, SolverConfig::default());
        let first = solver.solve(&level.state).path_states.unwrap();
        let second = solver.solve(&level.state).path_states.unwrap();
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn no_boxes_is_trivially_solved() {
        let level = level("###\n#*#\n###");
        let solver = Solver::new(&level.board, SolverConfig::default());
        let path = solver.solve(&level.state).path_states.unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0], level.state);
    }

    #[test]
    fn no_targets_is_unsolvable() {
        let level = level("#####\n#b *#\n#####");
        let solver = Solver::new(&level.board, SolverConfig::default());
        assert!(solver.solve(&level.state).path_states.is_none());
    }

    #[test]
    fn zero_time_budget_abandons() {
        let level = level(TWO_BOXES);
        let config = SolverConfig {
            max_time: Some(Duration::ZERO),
            ..SolverConfig::default()
        };
        let solver = Solver::new(&level.board, config);
        let result = solver.solve(&level.state);
        assert!(result.path_states.is_none());
    }

    #[test]
    fn fifo_frontier_finds_optimum_with_null_heuristic() {
        let level = level(TWO_BOXES);
        let config = SolverConfig {
            move_gen: MoveGen::Primitive,
            heuristic: HeuristicKind::Null,
            frontier: FrontierKind::Fifo,
            max_time: None,
        };
        let solver = Solver::new(&level.board, config);
        let path = solver.solve(&level.state).path_states.unwrap();
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn stats_are_recorded() {
        let level = level(TWO_BOXES);
        let solver = Solver::new(&level.board, SolverConfig::default());
        let result = solver.solve(&level.state);
        assert!(result.stats.total_created() >= result.stats.total_visited());
        assert!(result.stats.total_visited() >= 1);
        assert!(result.stats.total_duplicates() >= 0);
    }

    #[test]
    #[should_panic(expected = "box")]
    fn duplicate_boxes_fail_fast() {
        let level = level(ONE_PUSH);
        let boxes = vec![Pos::new(1, 2), Pos::new(1, 2)];
        let broken = PuzzleState::with_care(Pos::new(1, 3), boxes, 2);
        Solver::new(&level.board, SolverConfig::default()).solve(&broken);
    }
}
