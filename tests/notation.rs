use castellan::{ChessError, Position};

// Morphy vs Duke Karl / Count Isouard, Paris 1858
const OPERA_GAME: &str = "e4 e5 Nf3 d6 d4 Bg4 dxe5 Bxf3 Qxf3 dxe5 Bc4 Nf6 Qb3 Qe7 Nc3 c6 Bg5 b5 \
    Nxb5 cxb5 Bxb5+ Nbd7 O-O-O Rd8 Rxd7 Rxd7 Rd1 Qe6 Bxd7+ Nxd7 Qb8+ Nxb8 Rd8#";

#[test]
fn replays_a_game_in_san() {
    let mut pos = Position::starting();
    let mut played = Vec::new();
    for san in OPERA_GAME.split_whitespace() {
        let mv = pos.parse_san(san).unwrap_or_else(|e| panic!("{san}: {e}"));
        played.push(mv);
        pos.push(mv);
    }
    assert!(pos.is_checkmate());
    assert_eq!(pos.to_fen(), "1n1Rkb1r/p4ppp/4q3/4p1B1/4P3/8/PPP2PPP/2K5 b k - 1 17");

    // Printing the line back gives the same text
    let start = Position::starting();
    let expected: Vec<&str> = OPERA_GAME.split_whitespace().collect();
    assert_eq!(start.san_line(&played), expected);
}

#[test]
fn uci_and_san_agree_along_a_game() {
    let mut pos = Position::starting();
    for san in OPERA_GAME.split_whitespace() {
        let mv = pos.parse_san(san).unwrap();
        let uci = mv.to_string();
        assert_eq!(pos.parse_uci(&uci).unwrap(), mv, "{san} / {uci}");
        pos.push_uci(&uci).unwrap();
    }
}

#[test]
fn errors_leave_the_position_untouched() {
    let mut pos = Position::starting();
    let before = pos.clone();

    assert!(matches!(pos.push_san("Ke2"), Err(ChessError::IllegalMove(_))));
    assert!(matches!(pos.push_san("N@f3"), Err(ChessError::MalformedMove(_))));
    assert!(matches!(pos.push_uci("e2e5"), Err(ChessError::IllegalMove(_))));
    assert!(matches!(pos.push_uci("e9e4"), Err(ChessError::MalformedMove(_))));
    assert_eq!(pos, before);
    assert_eq!(pos.ply(), 0);
}

#[test]
fn ambiguity_is_reported_not_guessed() {
    // Rooks on a1 and h1 can both reach d1
    let pos = Position::from_fen("4k3/8/8/8/8/8/4K3/R6R w - - 0 1").unwrap();
    assert!(matches!(pos.parse_san("Rd1"), Err(ChessError::AmbiguousMove(_))));
    assert_eq!(pos.parse_san("Rad1").unwrap().to_string(), "a1d1");
}
