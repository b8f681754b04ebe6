use castellan::Position;

fn position(fen: &str) -> Position {
    Position::from_fen(fen).unwrap_or_else(|e| panic!("{fen}: {e}"))
}

#[test]
fn threefold_repetition_simple() {
    castellan::init();
    let mut pos = Position::starting();

    // 1. Nf3 Nf6 2. Ng1 Ng8 3. Nf3 Nf6 4. Ng1 Ng8
    let moves = ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"];
    for (i, uci) in moves.iter().enumerate() {
        pos.push_uci(uci).unwrap();
        if i < 7 {
            assert!(!pos.is_draw(), "not yet a draw after {} plies", i + 1);
        }
    }
    assert_eq!(pos.repetition_count(), 3);
    assert!(pos.is_draw_by_threefold_repetition());
    assert!(pos.is_draw());

    // Stepping back one ply takes the third occurrence away again
    pos.pop();
    assert!(!pos.is_draw_by_threefold_repetition());
}

#[test]
fn perpetual_check_repeats_into_a_draw() {
    let mut pos = position("r3r1k1/pQp2ppp/2n2n2/4p3/2P5/B4q1b/P1PP1P1P/R3RBK1 b - - 4 15");
    assert_eq!(pos.repetition_count(), 1);

    let line: Vec<&str> = "Qg4+ Kh1 Qf3+ Kg1 Qg4+ Kh1 Qf3+ Kg1".split_whitespace().collect();
    for (i, san) in line.iter().enumerate() {
        pos.push_san(san).unwrap_or_else(|e| panic!("{san}: {e}"));
        let expect_draw = i == line.len() - 1;
        assert_eq!(pos.is_draw_by_threefold_repetition(), expect_draw, "after {} plies", i + 1);
    }
    assert_eq!(pos.halfmove_clock(), 12);
}

#[test]
fn fifty_move_rule() {
    let mut pos = position("8/8/8/8/8/8/1R6/k6K w - - 99 1");
    assert!(!pos.is_draw(), "99 halfmoves is not yet a draw");

    pos.push_uci("b2b3").unwrap();
    assert!(pos.is_draw_by_fifty_moves());
    assert!(pos.is_draw(), "100 halfmoves is a draw");

    // Any capture or pawn move resets the count
    let mut pos = position("8/8/8/8/8/1p6/1R6/k6K w - - 99 1");
    pos.push_uci("b2b3").unwrap();
    assert_eq!(pos.halfmove_clock(), 0);
    assert!(!pos.is_draw_by_fifty_moves());
}

#[test]
fn insufficient_material() {
    for (fen, what) in [
        ("8/8/8/8/8/8/8/k6K w - - 0 1", "K vs K"),
        ("8/8/8/8/8/8/5N2/k6K w - - 0 1", "K+N vs K"),
        ("8/8/8/8/8/8/5B2/k6K w - - 0 1", "K+B vs K"),
        ("8/8/8/8/8/4b3/5B2/k6K w - - 0 1", "K+B vs K+B on the same colour"),
    ] {
        let pos = position(fen);
        assert!(pos.is_insufficient_material(), "{what}");
        assert!(pos.is_draw(), "{what}");
    }

    for (fen, what) in [
        ("8/8/8/8/8/5b2/5B2/k6K w - - 0 1", "K+B vs K+B on opposite colours"),
        ("8/8/8/8/8/8/5P2/k6K w - - 0 1", "a pawn can still promote"),
        ("8/8/8/8/8/8/4NN2/k6K w - - 0 1", "two knights"),
        ("8/8/8/8/8/8/5R2/k6K w - - 0 1", "a rook"),
    ] {
        let pos = position(fen);
        assert!(!pos.is_insufficient_material(), "{what}");
    }
}

#[test]
fn stalemate_counts_as_a_draw() {
    let pos = position("k7/2Q5/1K6/8/8/8/8/8 b - - 0 1");
    assert!(pos.is_stalemate());
    assert!(!pos.is_insufficient_material());
    assert!(pos.is_draw());
}

#[test]
fn checkmate_is_not_a_draw() {
    let pos = position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
    assert!(pos.is_checkmate());
    assert!(!pos.is_draw());
}
