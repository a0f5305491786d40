use std::fmt::{self, Display, Formatter};

use log::debug;

use crate::board::Board;
use crate::data::{Dir, Pos};
use crate::state::PuzzleState;
use crate::vec2d::Vec2d;

/// Per-board map of cells a box must never be pushed onto.
///
/// A cell is dead when a box placed there can never reach any target, no
/// matter where the other boxes are. This is a conservative approximation
/// computed once per board from two wall patterns; it never marks a cell
/// from which some push sequence could still succeed.
#[derive(Clone, Debug)]
pub struct DeadSquareMap {
    dead: Vec2d<bool>,
}

impl DeadSquareMap {
    pub fn new(board: &Board) -> Self {
        let mut dead = board.create_scratchpad(false);

        // walls count as dead so the map doubles as a blocking mask
        for r in 0..board.rows() {
            for c in 0..board.cols() {
                let pos = Pos::new(r, c);
                if !board.is_free(pos) {
                    dead[pos] = true;
                }
            }
        }

        mark_corners(board, &mut dead);
        mark_dead_lines(board, &mut dead);

        let count = (0..board.rows())
            .flat_map(|r| (0..board.cols()).map(move |c| Pos::new(r, c)))
            .filter(|&pos| board.is_free(pos) && dead[pos])
            .count();
        debug!("marked {} dead squares", count);

        DeadSquareMap { dead }
    }

    /// Out-of-range cells are blocking, hence dead.
    pub fn is_dead(&self, pos: Pos) -> bool {
        !self.dead.contains(pos) || self.dead[pos]
    }

    /// A state is invalid when any cared box sits on a dead cell. Context
    /// boxes don't need to reach targets, so they may be parked anywhere.
    pub fn is_invalid(&self, state: &PuzzleState) -> bool {
        state.cared_boxes().iter().any(|&b| self.is_dead(b))
    }
}

impl Display for DeadSquareMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dead)
    }
}

/// A non-target cell blocked on a vertical side and a horizontal side: a box
/// there can't move along either axis ever again.
fn mark_corners(board: &Board, dead: &mut Vec2d<bool>) {
    for r in 0..board.rows() {
        for c in 0..board.cols() {
            let pos = Pos::new(r, c);
            if !board.is_free(pos) || board.targets().contains(&pos) {
                continue;
            }
            let blocked = |dir: Dir| !board.is_free(pos + dir);
            if (blocked(Dir::Up) || blocked(Dir::Down))
                && (blocked(Dir::Left) || blocked(Dir::Right))
            {
                dead[pos] = true;
            }
        }
    }
}

/// A straight run of cells between two perpendicular walls, walled along one
/// entire flank and containing no target: a box pushed anywhere onto the run
/// can only slide along it and never leaves the flanking wall.
fn mark_dead_lines(board: &Board, dead: &mut Vec2d<bool>) {
    // horizontal runs
    for r in 0..board.rows() {
        let mut c = 0;
        while c < board.cols() {
            if !board.is_free(Pos::new(r, c)) {
                c += 1;
                continue;
            }
            let start = c;
            while c < board.cols() && board.is_free(Pos::new(r, c)) {
                c += 1;
            }
            mark_run(
                board,
                dead,
                (start..c).map(|rc| Pos::new(r, rc)),
                [Dir::Up, Dir::Down],
            );
        }
    }

    // vertical runs
    for c in 0..board.cols() {
        let mut r = 0;
        while r < board.rows() {
            if !board.is_free(Pos::new(r, c)) {
                r += 1;
                continue;
            }
            let start = r;
            while r < board.rows() && board.is_free(Pos::new(r, c)) {
                r += 1;
            }
            mark_run(
                board,
                dead,
                (start..r).map(|rr| Pos::new(rr, c)),
                [Dir::Left, Dir::Right],
            );
        }
    }
}

fn mark_run(
    board: &Board,
    dead: &mut Vec2d<bool>,
    run: impl Iterator<Item = Pos> + Clone,
    flanks: [Dir; 2],
) {
    for flank in flanks {
        let no_target = run.clone().all(|pos| !board.targets().contains(&pos));
        let walled = run.clone().all(|pos| !board.is_free(pos + flank));
        if no_target && walled {
            for pos in run.clone() {
                dead[pos] = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Pos;
    use crate::level::Level;

    fn dead_map(level: &str) -> (Level, DeadSquareMap) {
        let level: Level = level.parse().unwrap();
        let map = DeadSquareMap::new(&level.board);
        (level, map)
    }

    #[test]
    fn corners() {
        let (_, map) = dead_map(
            r"
####
#x #
#b*#
####
",
        );
        let expected = "\
1111
1011
1111
1111
";
        assert_eq!(map.to_string(), expected);
    }

    #[test]
    fn dead_lines() {
        let (_, map) = dead_map(
            r"
########
#      #
#x     #
#     *#
########
",
        );
        // top and bottom rows have no target and hug a wall, as does the
        // rightmost column; the target's row stays alive
        let expected = "\
11111111
11111111
10000011
11111111
11111111
";
        assert_eq!(map.to_string(), expected);
    }

    #[test]
    fn target_run_stays_alive() {
        let (_, map) = dead_map(
            r"
#######
#x   b#
#    *#
#######
",
        );
        // top run hugs the wall but contains a target
        assert!(!map.is_dead(Pos::new(1, 1)));
        assert!(!map.is_dead(Pos::new(1, 4)));
        // bottom run has no target
        assert!(map.is_dead(Pos::new(2, 1)));
        assert!(map.is_dead(Pos::new(2, 4)));
    }

    #[test]
    fn out_of_bounds_is_dead() {
        let (_, map) = dead_map("#x#\n#b#\n#*#\n###");
        assert!(map.is_dead(Pos::new(-1, 0)));
        assert!(map.is_dead(Pos::new(0, 99)));
    }

    #[test]
    fn invalid_checks_cared_boxes_only() {
        let (level, map) = dead_map(
            r"
####
#x #
#b*#
####
",
        );
        // the box starts on a dead corner
        assert!(map.is_invalid(&level.state));

        // the same box as context in an abstraction is fine: a second box on
        // the target is the cared one
        let boxes = vec![level.state.boxes()[0], Pos::new(1, 1)];
        let state = PuzzleState::new(Pos::new(2, 2), boxes);
        let sub = state.create_abstraction(1, 2);
        assert!(!map.is_invalid(&sub));
        assert!(map.is_invalid(&state));
    }
}
