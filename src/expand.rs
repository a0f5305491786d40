use std::collections::VecDeque;

use fnv::FnvHashMap;

use crate::board::Board;
use crate::data::{Cost, Pos, DIRECTIONS};
use crate::dead_squares::DeadSquareMap;
use crate::state::PuzzleState;
use crate::vec2d::Vec2d;

const NO_BOX: u8 = 255;

/// One legal move out of a state.
///
/// `pusher_at_push` is only set by the macro generator: the cell the pusher
/// walked to before pushing, needed to reconstruct the primitive path later.
#[derive(Clone, Debug)]
pub(crate) struct Successor {
    pub(crate) state: PuzzleState,
    pub(crate) cost: Cost,
    pub(crate) pusher_at_push: Option<Pos>,
}

fn box_grid(board: &Board, state: &PuzzleState) -> Vec2d<u8> {
    assert!(state.boxes().len() < NO_BOX as usize);

    let mut grid = board.create_scratchpad(NO_BOX);
    for (i, &b) in state.boxes().iter().enumerate() {
        grid[b] = i as u8;
    }
    grid
}

/// Pushing a cared box onto a dead square can never lead to a goal, so such
/// successors are rejected at generation time. Context boxes may be parked
/// anywhere.
fn prune_push(dead_squares: &DeadSquareMap, state: &PuzzleState, index: usize, dest: Pos) -> bool {
    index < state.care_count() && dead_squares.is_dead(dest)
}

/// One pusher step per successor, cost 1.
pub(crate) fn expand_primitive(
    board: &Board,
    dead_squares: &DeadSquareMap,
    state: &PuzzleState,
) -> Vec<Successor> {
    let mut new_states = Vec::new();

    for &dir in &DIRECTIONS {
        let n1 = state.pusher() + dir;
        if !board.is_free(n1) {
            continue;
        }
        match state.block_index_at(n1) {
            None => {
                // step
                new_states.push(Successor {
                    state: state.with_pusher(n1),
                    cost: 1,
                    pusher_at_push: None,
                });
            }
            Some(index) => {
                // push
                let n2 = n1 + dir;
                if board.is_free(n2)
                    && state.block_index_at(n2).is_none()
                    && !prune_push(dead_squares, state, index, n2)
                {
                    new_states.push(Successor {
                        state: state.with_push(index, n2, n1),
                        cost: 1,
                        pusher_at_push: None,
                    });
                }
            }
        }
    }

    new_states
}

/// One box push per successor: the pusher walks to any reachable side of a
/// box and pushes once. Cost is the walk length plus one for the push, so
/// macro g-costs count exactly the primitive moves they stand for.
pub(crate) fn expand_macro(
    board: &Board,
    dead_squares: &DeadSquareMap,
    state: &PuzzleState,
) -> Vec<Successor> {
    let mut new_states = Vec::new();

    let dists = reachable_dists(board, state);

    for (index, &box_pos) in state.boxes().iter().enumerate() {
        for &dir in &DIRECTIONS {
            let dest = box_pos + dir;
            if !board.is_free(dest) || state.block_index_at(dest).is_some() {
                continue;
            }
            if prune_push(dead_squares, state, index, dest) {
                continue;
            }
            // the cell the pusher must reach to push from
            let side = box_pos - dir;
            if !board.is_free(side) {
                continue;
            }
            if let Some(walk) = dists[side] {
                new_states.push(Successor {
                    state: state.with_push(index, dest, box_pos),
                    cost: walk + 1,
                    pusher_at_push: Some(side),
                });
            }
        }
    }

    new_states
}

/// BFS over free, box-less cells from the pusher; distance in steps.
pub(crate) fn reachable_dists(board: &Board, state: &PuzzleState) -> Vec2d<Option<Cost>> {
    let boxes = box_grid(board, state);
    let mut dists = board.create_scratchpad(None);
    dists[state.pusher()] = Some(0);

    let mut to_visit = VecDeque::new();
    to_visit.push_back(state.pusher());

    while let Some(pos) = to_visit.pop_front() {
        let dist = dists[pos].unwrap();
        for &next in &pos.neighbors() {
            if board.is_free(next) && boxes[next] == NO_BOX && dists[next].is_none() {
                dists[next] = Some(dist + 1);
                to_visit.push_back(next);
            }
        }
    }

    dists
}

/// Shortest pusher walk from `src` to `dest` given the state's box layout,
/// as the full cell sequence `src..=dest`. `dest` must be reachable - the
/// macro generator only records reachable push sides.
pub(crate) fn walk_path(board: &Board, state: &PuzzleState, src: Pos, dest: Pos) -> Vec<Pos> {
    if src == dest {
        return vec![src];
    }

    let boxes = box_grid(board, state);
    let mut prevs = FnvHashMap::default();
    prevs.insert(src, src);

    let mut to_visit = VecDeque::new();
    to_visit.push_back(src);

    'bfs: while let Some(pos) = to_visit.pop_front() {
        for &next in &pos.neighbors() {
            if !board.is_free(next) || boxes[next] != NO_BOX || prevs.contains_key(&next) {
                continue;
            }
            prevs.insert(next, pos);
            if next == dest {
                break 'bfs;
            }
            to_visit.push_back(next);
        }
    }

    let mut path = Vec::new();
    let mut cur = dest;
    loop {
        path.push(cur);
        let prev = prevs[&cur];
        if prev == cur {
            path.reverse();
            return path;
        }
        cur = prev;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    fn setup(level: &str) -> (Level, DeadSquareMap) {
        let level: Level = level.parse().unwrap();
        let dead = DeadSquareMap::new(&level.board);
        (level, dead)
    }

    #[test]
    fn primitive_steps_only() {
        // up and left are steps, right and down are walls; the box is not
        // adjacent so nothing gets pushed
        let (level, dead) = setup(
            r"
#####
#x  #
#b  #
# *##
#####
",
        );
        let succs = expand_primitive(&level.board, &dead, &level.state);
        assert_eq!(succs.len(), 2);
        assert!(succs.iter().all(|s| s.cost == 1));
        assert!(succs.iter().all(|s| s.pusher_at_push.is_none()));
        assert!(succs
            .iter()
            .all(|s| s.state.boxes() == level.state.boxes()));
    }

    #[test]
    fn primitive_push_moves_box() {
        let (level, dead) = setup(
            r"
#####
#xb*#
#####
",
        );
        let succs = expand_primitive(&level.board, &dead, &level.state);
        assert_eq!(succs.len(), 1);
        let push = &succs[0];
        assert_eq!(push.state.pusher(), Pos::new(1, 2));
        assert_eq!(push.state.boxes(), &[Pos::new(1, 1)]);
    }

    #[test]
    fn primitive_prunes_dead_pushes() {
        // pushing the box up would pin it to the top wall with no target in
        // that row
        let (level, dead) = setup(
            r"
######
#    #
# bx #
# *  #
######
",
        );
        let succs = expand_primitive(&level.board, &dead, &level.state);
        assert_eq!(succs.len(), 2);
        for s in &succs {
            assert_eq!(s.state.boxes(), level.state.boxes());
        }
    }

    #[test]
    fn macro_pushes_with_walk_costs() {
        let (level, dead) = setup(
            r"
#####
#x  #
# b #
# * #
#####
",
        );
        let succs = expand_macro(&level.board, &dead, &level.state);
        // up: pushed from below, walk 0 + push. left: pushed from the right
        // side, walk 2 + push. down (bottom row) and right (rightmost
        // column) land on dead lines and are pruned at generation time.
        assert_eq!(succs.len(), 2);

        let up = succs
            .iter()
            .find(|s| s.state.boxes() == [Pos::new(1, 2)])
            .expect("up push must exist");
        assert_eq!(up.cost, 1);
        assert_eq!(up.pusher_at_push, Some(Pos::new(3, 2)));
        assert_eq!(up.state.pusher(), Pos::new(2, 2));

        let left = succs
            .iter()
            .find(|s| s.state.boxes() == [Pos::new(2, 1)])
            .expect("left push must exist");
        assert_eq!(left.cost, 3);
        assert_eq!(left.pusher_at_push, Some(Pos::new(2, 3)));
    }

    #[test]
    fn macro_unreachable_side_is_skipped() {
        // box in a one-wide corridor, pusher can only reach its left side
        let (level, dead) = setup(
            r"
######
#*b x#
######
",
        );
        let succs = expand_macro(&level.board, &dead, &level.state);
        assert_eq!(succs.len(), 1);
        assert_eq!(succs[0].state.boxes(), &[Pos::new(1, 3)]);
        assert_eq!(succs[0].cost, 1);
    }

    #[test]
    fn reachability_blocked_by_boxes() {
        let (level, _) = setup(
            r"
#####
#* b#
## ##
#   #
#####
",
        );
        let dists = reachable_dists(&level.board, &level.state);
        assert_eq!(dists[Pos::new(1, 1)], Some(0));
        assert_eq!(dists[Pos::new(1, 2)], Some(1));
        assert_eq!(dists[Pos::new(3, 2)], Some(3));
        assert_eq!(dists[Pos::new(3, 1)], Some(4));
        // the box itself and cells behind it are unreachable
        assert_eq!(dists[Pos::new(1, 3)], None);
    }

    #[test]
    fn walk_path_is_contiguous() {
        let (level, _) = setup(
            r"
#####
#* b#
## ##
#   #
#####
",
        );
        let path = walk_path(&level.board, &level.state, Pos::new(1, 1), Pos::new(3, 1));
        assert_eq!(path.first(), Some(&Pos::new(1, 1)));
        assert_eq!(path.last(), Some(&Pos::new(3, 1)));
        assert_eq!(path.len(), 5);
        for pair in path.windows(2) {
            assert_eq!(pair[0].dist(pair[1]), 1);
        }
    }
}
