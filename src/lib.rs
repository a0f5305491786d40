//! Solver for generalized box-pusher (Sokoban) puzzles: a pusher shoves
//! boxes around a grid until every box sits on a target cell.
//!
//! The solver is a best-first/A* search over puzzle states with pluggable
//! neighbor generation (single pusher steps or condensed "walk up to a box
//! and push it" macro moves), pluggable admissible heuristics and a
//! decrease-key priority frontier. Cells no box can ever leave are
//! precomputed per board and pruned at generation time.

// Opt in to warnings about new 2018 idioms
#![warn(rust_2018_idioms)]
// Additional warnings that are allow by default (`rustc -W help`)
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unused)]

pub mod board;
pub mod data;
pub mod dead_squares;
pub mod frontier;
pub mod heuristic;
pub mod level;
pub mod parser;
pub mod solver;
pub mod state;

mod expand;
mod vec2d;

use std::error::Error;
use std::fs;
use std::path::Path;

use crate::level::Level;
use crate::solver::{Solver, SolverConfig, SolverOk};

pub trait LoadLevel {
    fn load_level(&self) -> Result<Level, Box<dyn Error>>;
}

impl<T: AsRef<Path>> LoadLevel for T {
    fn load_level(&self) -> Result<Level, Box<dyn Error>> {
        let text = fs::read_to_string(self)?;
        Ok(text.parse()?)
    }
}

pub trait Solve {
    fn solve(&self, config: &SolverConfig) -> SolverOk;
}

impl Solve for Level {
    fn solve(&self, config: &SolverConfig) -> SolverOk {
        Solver::new(&self.board, *config).solve(&self.state)
    }
}
