//! castellan command line: search a position, count perft nodes, or list
//! the legal moves.

use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};

use castellan::{perft, perft_divide, ChessError, Position, Search, SearchParams, STARTING_FEN};

#[derive(Parser, Debug)]
#[command(name = "castellan", author, version, about, long_about = None)]
struct Cli {
    /// Log search progress (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find the best move
    Search(SearchArgs),
    /// Count leaf nodes of the legal move tree
    Perft(PerftArgs),
    /// List legal moves in both notations
    Moves(MovesArgs),
}

#[derive(Args, Debug)]
struct SearchArgs {
    #[arg(short, long, default_value_t = String::from(STARTING_FEN))]
    fen: String,

    #[arg(short, long, default_value_t = 5)]
    depth: u8,

    /// Quiescence plies past the nominal depth
    #[arg(long, default_value_t = 6)]
    qsearch: u8,

    /// Transposition table size in MB (0 disables it)
    #[arg(long = "hash-mb", value_name = "MB", default_value_t = 16)]
    hash_mb: usize,
}

#[derive(Args, Debug)]
struct PerftArgs {
    #[arg(short, long, default_value_t = String::from(STARTING_FEN))]
    fen: String,

    #[arg(short, long, default_value_t = 4)]
    depth: u8,

    /// Print the count below each root move
    #[arg(long)]
    divide: bool,
}

#[derive(Args, Debug)]
struct MovesArgs {
    #[arg(short, long, default_value_t = String::from(STARTING_FEN))]
    fen: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), ChessError> {
    match command {
        Commands::Search(args) => search(args),
        Commands::Perft(args) => run_perft(args),
        Commands::Moves(args) => moves(args),
    }
}

fn search(args: SearchArgs) -> Result<(), ChessError> {
    let mut pos = Position::from_fen(&args.fen)?;
    let params = SearchParams::new()
        .max_depth(args.depth)
        .qsearch_depth(args.qsearch)
        .tt_size_mb(args.hash_mb)
        .use_tt(args.hash_mb > 0);

    let mut engine = Search::new(params);
    let result = engine.try_best_move(&mut pos).ok_or(ChessError::NoLegalMoves)?;

    let score = match result.mate_in_plies() {
        Some(plies) if plies >= 0 => format!("mate in {}", (plies + 1) / 2),
        Some(plies) => format!("mated in {}", (-plies + 1) / 2),
        None => format!("{} cp", result.score),
    };
    println!("{pos}");
    println!("best move: {} ({})", pos.san(&result.best_move), result.best_move);
    println!("score:     {score}");
    println!("pv:        {}", pos.san_line(&result.principal_variation).join(" "));
    println!("depth {}, {} nodes", result.depth, result.nodes);
    Ok(())
}

fn run_perft(args: PerftArgs) -> Result<(), ChessError> {
    let mut pos = Position::from_fen(&args.fen)?;
    let start = Instant::now();

    let nodes = if args.divide {
        let divide = perft_divide(&mut pos, args.depth);
        for (mv, count) in &divide {
            println!("{mv}: {count}");
        }
        divide.iter().map(|(_, count)| count).sum()
    } else {
        perft(&mut pos, args.depth)
    };

    let elapsed = start.elapsed();
    println!(
        "perft({}) = {} nodes ({} ms, {:.2} Mnps)",
        args.depth,
        nodes,
        elapsed.as_millis(),
        nodes as f64 / elapsed.as_micros().max(1) as f64
    );
    Ok(())
}

fn moves(args: MovesArgs) -> Result<(), ChessError> {
    let pos = Position::from_fen(&args.fen)?;
    let (moves, in_check) = pos.legal_moves();
    for mv in &moves {
        println!("{:<6} {}", mv.to_string(), pos.san(mv));
    }
    println!("{} legal moves{}", moves.len(), if in_check { ", in check" } else { "" });
    Ok(())
}
