use clap::Parser;
use castellan::{perft, perft_divide, Position, STARTING_FEN};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position as _};

#[derive(Parser, Debug)]
#[command(author, version, about = "Perft node counter", long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = String::from(STARTING_FEN))]
    fen: String,

    #[arg(short, long, default_value_t = 4)]
    depth: u8,

    /// Print the count below each root move
    #[arg(long)]
    divide: bool,

    /// Cross-check every count against shakmaty
    #[arg(long)]
    verify: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    println!("Running perft on FEN: '{}' at depth {}", args.fen, args.depth);

    let mut pos = match Position::from_fen(&args.fen) {
        Ok(pos) => pos,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let reference = if args.verify {
        match reference_position(&args.fen) {
            Some(chess) => Some(chess),
            None => {
                eprintln!("shakmaty rejected the FEN, cannot verify");
                std::process::exit(2);
            }
        }
    } else {
        None
    };

    let start = std::time::Instant::now();
    let nodes = if args.divide {
        let divide = perft_divide(&mut pos, args.depth);
        for (mv, count) in &divide {
            println!("{mv}: {count}");
        }
        divide.iter().map(|(_, count)| count).sum()
    } else {
        perft(&mut pos, args.depth)
    };
    let duration = start.elapsed();

    println!(
        "perft({}) = {} nodes ({} ms, {:.2} Mnps)",
        args.depth,
        nodes,
        duration.as_millis(),
        nodes as f64 / (duration.as_micros().max(1) as f64)
    );

    if let Some(chess) = reference {
        let expected = perft_shakmaty(&chess, args.depth);
        if expected == nodes {
            println!("shakmaty agrees: {expected}");
        } else {
            eprintln!("MISMATCH: shakmaty counts {expected}, castellan counts {nodes}");
            std::process::exit(1);
        }
    }
}

fn reference_position(fen: &str) -> Option<Chess> {
    let fen: Fen = fen.parse().ok()?;
    fen.into_position(CastlingMode::Standard).ok()
}

fn perft_shakmaty(pos: &Chess, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut nodes = 0;
    for m in pos.legal_moves() {
        let mut new_pos = pos.clone();
        new_pos.play_unchecked(&m);
        nodes += perft_shakmaty(&new_pos, depth - 1);
    }
    nodes
}
