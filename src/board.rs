use std::fmt::{self, Display, Formatter};

use crate::data::{Format, Pos};
use crate::state::PuzzleState;
use crate::vec2d::Vec2d;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellType {
    Wall,
    Free,
    Target,
    /// Never stored in a grid - returned for lookups outside it.
    OutOfBounds,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Contents {
    Empty,
    Box,
    Pusher,
}

/// The static part of a puzzle: cell classification and target cells.
/// Immutable once constructed - box and pusher positions live in
/// `PuzzleState`.
#[derive(Clone, Debug)]
pub struct Board {
    grid: Vec2d<CellType>,
    targets: Vec<Pos>,
}

impl Board {
    pub fn new(rows: &[Vec<CellType>]) -> Self {
        let grid = Vec2d::from_rows(rows, CellType::Wall);
        let mut targets = Vec::new();
        for r in 0..grid.rows() {
            for c in 0..grid.cols() {
                let pos = Pos::new(r, c);
                if grid[pos] == CellType::Target {
                    targets.push(pos);
                }
            }
        }
        Board { grid, targets }
    }

    pub fn rows(&self) -> i16 {
        self.grid.rows()
    }

    pub fn cols(&self) -> i16 {
        self.grid.cols()
    }

    /// Out-of-range lookups answer `OutOfBounds`, which blocks movement the
    /// same way a wall does. Levels therefore don't need a closed border.
    pub fn cell_type(&self, pos: Pos) -> CellType {
        if self.grid.contains(pos) {
            self.grid[pos]
        } else {
            CellType::OutOfBounds
        }
    }

    /// Free or target - a cell the pusher or a box may occupy.
    pub fn is_free(&self, pos: Pos) -> bool {
        matches!(self.cell_type(pos), CellType::Free | CellType::Target)
    }

    pub fn targets(&self) -> &[Pos] {
        &self.targets
    }

    pub(crate) fn create_scratchpad<T: Copy>(&self, default: T) -> Vec2d<T> {
        self.grid.create_scratchpad(default)
    }

    /// Renders the board with a state on top of it, one line per row.
    pub fn render(&self, state: &PuzzleState, format: Format) -> String {
        let mut contents = self.grid.create_scratchpad(Contents::Empty);
        for &b in state.boxes() {
            contents[b] = Contents::Box;
        }
        contents[state.pusher()] = Contents::Pusher;

        let mut ret = String::new();
        for r in 0..self.grid.rows() {
            for c in 0..self.grid.cols() {
                let pos = Pos::new(r, c);
                let cell = self.grid[pos];
                ret.push(match format {
                    Format::Custom => Self::render_custom(cell, contents[pos]),
                    Format::Xsb => Self::render_xsb(cell, contents[pos]),
                });
            }
            ret.push('\n');
        }
        ret
    }

    fn render_custom(cell: CellType, contents: Contents) -> char {
        match (cell, contents) {
            (CellType::Wall, _) => '#',
            (CellType::Free, Contents::Empty) => ' ',
            (CellType::Free, Contents::Box) => 'b',
            (CellType::Free, Contents::Pusher) => '*',
            (CellType::Target, Contents::Empty) => 'x',
            (CellType::Target, Contents::Box) => 'B',
            (CellType::Target, Contents::Pusher) => '+',
            (CellType::OutOfBounds, _) => unreachable!(),
        }
    }

    fn render_xsb(cell: CellType, contents: Contents) -> char {
        match (cell, contents) {
            (CellType::Wall, _) => '#',
            (CellType::Free, Contents::Empty) => ' ',
            (CellType::Free, Contents::Box) => '$',
            (CellType::Free, Contents::Pusher) => '@',
            (CellType::Target, Contents::Empty) => '.',
            (CellType::Target, Contents::Box) => '*',
            (CellType::Target, Contents::Pusher) => '+',
            (CellType::OutOfBounds, _) => unreachable!(),
        }
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for r in 0..self.grid.rows() {
            for c in 0..self.grid.cols() {
                write!(
                    f,
                    "{}",
                    match self.grid[Pos::new(r, c)] {
                        CellType::Wall => '#',
                        CellType::Free => ' ',
                        CellType::Target => '.',
                        CellType::OutOfBounds => unreachable!(),
                    }
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
