use castellan::{perft, Position};
use shakmaty::fen::Fen;
use shakmaty::{Chess, Position as _};

fn run_perft_check(fen_str: &str, depth: u8, name: &str) {
    castellan::init();
    let mut pos = Position::from_fen(fen_str).expect("Valid FEN");
    let castellan_cnt = perft(&mut pos, depth);

    // Shakmaty is the oracle
    let fen: Fen = fen_str.parse().unwrap();
    let reference: Chess = fen
        .into_position(shakmaty::CastlingMode::Standard)
        .expect("Shakmaty should accept FEN");
    let shakmaty_cnt = shakmaty_perft(&reference, depth);

    assert_eq!(castellan_cnt, shakmaty_cnt, "Mismatch in {name} at depth {depth}");
}

fn shakmaty_perft(pos: &Chess, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0;
    for m in pos.legal_moves() {
        let mut new_pos = pos.clone();
        new_pos.play_unchecked(&m);
        nodes += shakmaty_perft(&new_pos, depth - 1);
    }
    nodes
}

#[test]
fn perft_en_passant_available() {
    // Black just played c7-c5 next to the white pawn on d5
    run_perft_check("8/8/8/k1pP4/8/8/8/4K3 w - c6 0 1", 4, "En Passant Available");
}

#[test]
fn perft_en_passant_rank_pin() {
    // Capturing would clear the fifth rank between the king and the rook
    run_perft_check("8/8/8/K2Pp2r/8/8/8/7k w - e6 0 1", 4, "En Passant Rank Pin");
}

#[test]
fn perft_en_passant_diagonal_pin() {
    // The e4 pawn shields the king on b7 from the bishop
    run_perft_check("8/1k6/8/8/3Pp3/8/8/6KB b - d3 0 1", 4, "En Passant Diagonal Pin");
}

#[test]
fn perft_en_passant_evades_pawn_check() {
    run_perft_check("8/8/8/3pP3/4K3/8/8/7k w - d6 0 1", 4, "En Passant Evasion");
}

#[test]
fn perft_castling_prevented_by_check() {
    run_perft_check("4k3/8/8/8/8/8/8/R3K2r w Q - 0 1", 3, "Castling in Check");
}

#[test]
fn perft_castling_through_check() {
    // f1 is attacked by the black rook
    run_perft_check("4k3/8/8/8/8/5r2/8/R3K2R w KQ - 0 1", 3, "Castling Through Check");
}

#[test]
fn perft_long_castling_with_attacked_b_file() {
    // b1 attacked but empty: long castling stays legal
    run_perft_check("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1", 3, "Long Castling b-file");
}

#[test]
fn perft_promotion_capture() {
    run_perft_check("n1n5/P5P1/8/2k5/8/8/8/4K3 w - - 0 1", 3, "Promotion Capture");
}

#[test]
fn perft_promotions_both_sides() {
    run_perft_check("n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1", 4, "Promotions Both Sides");
}

#[test]
fn perft_double_check_response() {
    run_perft_check(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        3,
        "Complex Check Response",
    );
}

#[test]
fn perft_discovered_checks() {
    run_perft_check("4k3/8/8/3p4/4P3/8/8/4R1K1 w - - 0 1", 4, "Discovered Checks");
}
