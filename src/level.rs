use std::fmt::{self, Display, Formatter};

use crate::board::Board;
use crate::data::Format;
use crate::state::PuzzleState;

/// A board plus the initial state - everything the solver needs.
#[derive(Clone, Debug)]
pub struct Level {
    pub board: Board,
    pub state: PuzzleState,
}

impl Level {
    pub fn new(board: Board, state: PuzzleState) -> Self {
        Level { board, state }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board.render(&self.state, Format::Xsb))
    }
}
