use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::board::{Board, CellType};
use crate::data::{Format, Pos};
use crate::level::Level;
use crate::state::PuzzleState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserErr {
    InvalidCell(usize, usize),
    NoPusher,
    MultiplePushers,
    Empty,
}

impl Display for ParserErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            ParserErr::InvalidCell(r, c) => write!(f, "Invalid cell at pos: [{}, {}]", r, c),
            ParserErr::NoPusher => write!(f, "No pusher"),
            ParserErr::MultiplePushers => write!(f, "More than one pusher"),
            ParserErr::Empty => write!(f, "Empty level"),
        }
    }
}

impl std::error::Error for ParserErr {}

impl FromStr for Level {
    type Err = ParserErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parses a level, guessing the format: `@`, `$` and `.` only appear in XSB.
pub fn parse(level: &str) -> Result<Level, ParserErr> {
    if level.contains(&['@', '$', '.'][..]) {
        parse_format(level, Format::Xsb)
    } else {
        parse_format(level, Format::Custom)
    }
}

pub fn parse_format(level: &str, format: Format) -> Result<Level, ParserErr> {
    // trim so levels are easy to write as raw strings
    let level = level.trim_matches('\n').trim_end();
    if level.is_empty() {
        return Err(ParserErr::Empty);
    }

    let mut grid = Vec::new();
    let mut boxes = Vec::new();
    let mut pusher = None;

    for (r, line) in level.lines().enumerate() {
        let mut row = Vec::new();
        for (c, cur_char) in line.chars().enumerate() {
            let pos = Pos::new(r as i16, c as i16);
            let cell = match format {
                Format::Custom => parse_custom_cell(cur_char),
                Format::Xsb => parse_xsb_cell(cur_char),
            };
            let (cell, has_box, has_pusher) = cell.ok_or(ParserErr::InvalidCell(r, c))?;
            if has_box {
                boxes.push(pos);
            }
            if has_pusher {
                if pusher.is_some() {
                    return Err(ParserErr::MultiplePushers);
                }
                pusher = Some(pos);
            }
            row.push(cell);
        }
        grid.push(row);
    }

    let pusher = pusher.ok_or(ParserErr::NoPusher)?;
    Ok(Level::new(Board::new(&grid), PuzzleState::new(pusher, boxes)))
}

/// Custom vocabulary: `x` marks a target, `b` a box, `*` the pusher. `B`
/// and `+` cover box-on-target and pusher-on-target so every state survives
/// a render/parse round trip.
fn parse_custom_cell(c: char) -> Option<(CellType, bool, bool)> {
    match c {
        '#' => Some((CellType::Wall, false, false)),
        ' ' => Some((CellType::Free, false, false)),
        'x' => Some((CellType::Target, false, false)),
        'b' => Some((CellType::Free, true, false)),
        'B' => Some((CellType::Target, true, false)),
        '*' => Some((CellType::Free, false, true)),
        '+' => Some((CellType::Target, false, true)),
        _ => None,
    }
}

/// A subset of the community XSB format.
fn parse_xsb_cell(c: char) -> Option<(CellType, bool, bool)> {
    match c {
        '#' => Some((CellType::Wall, false, false)),
        ' ' => Some((CellType::Free, false, false)),
        '.' => Some((CellType::Target, false, false)),
        '$' => Some((CellType::Free, true, false)),
        '*' => Some((CellType::Target, true, false)),
        '@' => Some((CellType::Free, false, true)),
        '+' => Some((CellType::Target, false, true)),
        _ => None,
    }
}
