use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use box_pusher_solver::data::Format;
use box_pusher_solver::frontier::FrontierKind;
use box_pusher_solver::heuristic::HeuristicKind;
use box_pusher_solver::parser;
use box_pusher_solver::solver::{MoveGen, SolverConfig};
use box_pusher_solver::Solve;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeuristicArg {
    Null,
    Simple,
    Better,
    Abstract,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MoveGenArg {
    Primitive,
    Macro,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FrontierArg {
    Priority,
    Fifo,
}

#[derive(Debug, Parser)]
#[command(about = "Solver for generalized box-pusher (Sokoban) puzzles")]
struct Args {
    /// Level file
    file: PathBuf,

    /// Parse as custom format
    #[arg(short, long, conflicts_with = "xsb")]
    custom: bool,

    /// Parse as XSB format
    #[arg(short, long)]
    xsb: bool,

    #[arg(long, value_enum, default_value = "macro")]
    move_gen: MoveGenArg,

    #[arg(long, value_enum, default_value = "simple")]
    heuristic: HeuristicArg,

    /// Boxes per sub-problem of the abstract heuristic
    #[arg(long, default_value_t = 2)]
    abstraction_size: usize,

    #[arg(long, value_enum, default_value = "priority")]
    frontier: FrontierArg,

    /// Give up after this many seconds
    #[arg(long)]
    max_time: Option<u64>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let text = std::fs::read_to_string(&args.file).unwrap_or_else(|err| {
        eprintln!("Can't read file {}: {}", args.file.display(), err);
        process::exit(1);
    });
    let level = if args.custom {
        parser::parse_format(&text, Format::Custom)
    } else if args.xsb {
        parser::parse_format(&text, Format::Xsb)
    } else {
        parser::parse(&text)
    };
    let level = level.unwrap_or_else(|err| {
        eprintln!("Failed to parse: {}", err);
        process::exit(1);
    });

    let config = SolverConfig {
        move_gen: match args.move_gen {
            MoveGenArg::Primitive => MoveGen::Primitive,
            MoveGenArg::Macro => MoveGen::Macro,
        },
        heuristic: match args.heuristic {
            HeuristicArg::Null => HeuristicKind::Null,
            HeuristicArg::Simple => HeuristicKind::Simple,
            HeuristicArg::Better => HeuristicKind::Better,
            HeuristicArg::Abstract => HeuristicKind::Abstract {
                abstraction_size: args.abstraction_size,
            },
        },
        frontier: match args.frontier {
            FrontierArg::Priority => FrontierKind::Priority,
            FrontierArg::Fifo => FrontierKind::Fifo,
        },
        max_time: args.max_time.map(Duration::from_secs),
    };

    println!("Solving {}...", args.file.display());
    let result = level.solve(&config);
    match result.path_states {
        Some(path) => {
            println!("Found solution:");
            let format = if args.custom {
                Format::Custom
            } else {
                Format::Xsb
            };
            for state in &path {
                println!("{}", level.board.render(state, format));
            }
            println!("Moves: {}", path.len() - 1);
        }
        None => println!("No solution"),
    }
    print!("{}", result.stats);
}
