use fnv::FnvHashMap;

use crate::board::Board;
use crate::data::{Cost, Pos};
use crate::dead_squares::DeadSquareMap;
use crate::frontier::FrontierKind;
use crate::solver::{search, MoveGen, SolverConfig};
use crate::state::{PuzzleState, StateId};

/// Sentinel for states no push sequence can solve. Large enough to lose
/// every comparison against real scores, small enough that g + h can't
/// overflow.
pub(crate) const INVALID_STATE_COST: Cost = 1_000_000;

/// Full assignment search is factorial - above this many cared boxes the
/// Better heuristic falls back to the per-box minimum.
const MAX_ASSIGNMENT_BOXES: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeuristicKind {
    /// Always 0; reduces A* to uniform-cost search.
    Null,
    /// Per-box nearest-target distances plus a pusher approach term.
    Simple,
    /// Best box→target assignment, relaxed by dropping its largest distance.
    Better,
    /// Exact costs of independent sub-problems of `abstraction_size` boxes,
    /// solved by nested searches and memoized.
    Abstract { abstraction_size: usize },
}

/// Remaining-cost estimator. Owns the memoization cache in Abstract mode, so
/// concurrent solver instances never share evaluator state.
pub(crate) struct Heuristic<'a> {
    board: &'a Board,
    dead_squares: &'a DeadSquareMap,
    variant: Variant,
}

enum Variant {
    Null,
    Simple,
    Better,
    Abstract {
        abstraction_size: usize,
        cache: FnvHashMap<StateId, Cost>,
    },
}

impl<'a> Heuristic<'a> {
    pub(crate) fn new(board: &'a Board, dead_squares: &'a DeadSquareMap, kind: HeuristicKind) -> Self {
        let variant = match kind {
            HeuristicKind::Null => Variant::Null,
            HeuristicKind::Simple => Variant::Simple,
            HeuristicKind::Better => Variant::Better,
            HeuristicKind::Abstract { abstraction_size } => {
                assert!(abstraction_size >= 1);
                Variant::Abstract {
                    abstraction_size,
                    cache: FnvHashMap::default(),
                }
            }
        };
        Heuristic {
            board,
            dead_squares,
            variant,
        }
    }

    pub(crate) fn evaluate(&mut self, state: &PuzzleState) -> Cost {
        match self.variant {
            Variant::Null => 0,
            Variant::Simple => simple(self.board, self.dead_squares, state),
            Variant::Better => better(self.board, self.dead_squares, state),
            Variant::Abstract {
                abstraction_size,
                ref mut cache,
            } => abstract_max(self.board, self.dead_squares, abstraction_size, cache, state),
        }
    }
}

/// Sum over cared boxes of the distance to the nearest target. `None` when
/// there is no target to aim for at all.
fn nearest_target_sum(board: &Board, cared: &[Pos]) -> Option<Cost> {
    let mut sum = 0;
    for &box_pos in cared {
        let min = board
            .targets()
            .iter()
            .map(|&t| box_pos.dist(t))
            .min()?;
        sum += min;
    }
    Some(sum)
}

/// Steps before the first push can happen: the pusher must first stand next
/// to some box. The push itself is already counted in the box distances,
/// hence the minus one.
fn approach_term(state: &PuzzleState) -> Cost {
    state
        .cared_boxes()
        .iter()
        .map(|&b| state.pusher().dist(b))
        .min()
        .unwrap_or(1)
        .saturating_sub(1)
}

fn simple(board: &Board, dead_squares: &DeadSquareMap, state: &PuzzleState) -> Cost {
    if dead_squares.is_invalid(state) {
        return INVALID_STATE_COST;
    }
    if state.cared_boxes().is_empty() {
        return 0;
    }
    match nearest_target_sum(board, state.cared_boxes()) {
        None => INVALID_STATE_COST,
        Some(0) => 0,
        Some(sum) => sum + approach_term(state),
    }
}

fn better(board: &Board, dead_squares: &DeadSquareMap, state: &PuzzleState) -> Cost {
    if dead_squares.is_invalid(state) {
        return INVALID_STATE_COST;
    }
    let cared = state.cared_boxes();
    if cared.is_empty() {
        return 0;
    }
    let sum = match nearest_target_sum(board, cared) {
        None => return INVALID_STATE_COST,
        Some(0) => return 0,
        Some(sum) => sum,
    };

    let targets = board.targets();
    let assignment = if cared.len() <= MAX_ASSIGNMENT_BOXES && targets.len() == cared.len() {
        best_assignment(cared, targets)
    } else {
        sum
    };
    assignment + approach_term(state)
}

/// Minimum over all box→target bijections of the assignment's distance sum
/// with its single largest distance dropped. Bijections are enumerated by
/// factorial-indexed unranking.
fn best_assignment(cared: &[Pos], targets: &[Pos]) -> Cost {
    let n = cared.len();
    let mut best = Cost::MAX;

    for option in 0..factorial(n) {
        let mut rem = option;
        let mut taken = [false; MAX_ASSIGNMENT_BOXES];
        let mut total = 0;
        let mut largest = 0;

        for (j, &box_pos) in cared.iter().enumerate() {
            let divisor = n - j;
            let mut index = rem % divisor;
            rem /= divisor;

            // index-th target not yet taken
            let mut k = 0;
            while taken[k] || index > 0 {
                if !taken[k] {
                    index -= 1;
                }
                k += 1;
            }
            taken[k] = true;

            let dist = box_pos.dist(targets[k]);
            total += dist;
            largest = largest.max(dist);
        }

        best = best.min(total - largest);
    }

    best
}

fn factorial(n: usize) -> usize {
    (2..=n).product()
}

/// Maximum over sub-problems of the exact cost of solving that slice of
/// boxes in isolation (other boxes degrade to context). Any full solution
/// also solves every sub-problem from the same state, so each sub-cost - and
/// therefore the maximum - lower-bounds the true remaining cost.
fn abstract_max(
    board: &Board,
    dead_squares: &DeadSquareMap,
    abstraction_size: usize,
    cache: &mut FnvHashMap<StateId, Cost>,
    state: &PuzzleState,
) -> Cost {
    if dead_squares.is_invalid(state) {
        return INVALID_STATE_COST;
    }
    let care = state.care_count();
    if care == 0 {
        return 0;
    }

    let mut worst = 0;
    let mut start = 0;
    while start < care {
        let end = (start + abstraction_size).min(care);
        let sub = state.create_abstraction(start, end);
        let id = sub.id();
        let cost = match cache.get(&id) {
            Some(&cost) => cost,
            None => solve_subproblem(board, dead_squares, abstraction_size, &sub, cache),
        };
        worst = worst.max(cost);
        start = end;
    }
    worst
}

/// Solves one sub-problem exactly with a nested search and caches the
/// distance-to-goal of every state along the found solution.
fn solve_subproblem(
    board: &Board,
    dead_squares: &DeadSquareMap,
    abstraction_size: usize,
    sub: &PuzzleState,
    cache: &mut FnvHashMap<StateId, Cost>,
) -> Cost {
    // recursion bottoms out: the slice size always shrinks
    let heuristic = if abstraction_size > 2 {
        HeuristicKind::Abstract {
            abstraction_size: abstraction_size / 2,
        }
    } else {
        HeuristicKind::Simple
    };
    let config = SolverConfig {
        move_gen: MoveGen::Macro,
        heuristic,
        frontier: FrontierKind::Priority,
        max_time: None,
    };

    match search(board, dead_squares, sub, &config).path_states {
        Some(path) => {
            let total = (path.len() - 1) as Cost;
            for (i, state) in path.iter().enumerate() {
                cache.entry(state.id()).or_insert(total - i as Cost);
            }
            total
        }
        None => {
            cache.insert(sub.id(), INVALID_STATE_COST);
            INVALID_STATE_COST
        }
    }
}
