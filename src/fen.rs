//! FEN parsing and serialisation
//!
//! Parsing builds both sides from scratch and only then assembles a
//! [`Position`], so a rejected string never leaves anything half-built.

use std::sync::Arc;

use crate::error::{ChessError, Result};
use crate::position::Position;
use crate::side::SideState;
use crate::square::{Color, PieceKind, Square};
use crate::zobrist::ZobristKeys;

pub fn parse(fen: &str, keys: Arc<ZobristKeys>) -> Result<Position> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    // Clocks are optional, as in EPD records
    if fields.len() != 6 && fields.len() != 4 {
        return Err(ChessError::fen(fen, format!("expected 6 fields, found {}", fields.len())));
    }

    let mut white = SideState::empty(Color::White, keys.clone());
    let mut black = SideState::empty(Color::Black, keys.clone());
    parse_placement(fen, fields[0], &mut white, &mut black)?;

    let side_to_move = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(ChessError::fen(fen, format!("bad side to move `{other}`"))),
    };

    parse_castling(fen, fields[2], &mut white, &mut black)?;

    if fields[3] != "-" {
        let ep: Square = fields[3]
            .parse()
            .map_err(|_| ChessError::fen(fen, format!("bad en-passant square `{}`", fields[3])))?;
        // The target belongs to whoever just moved
        let (expected_rank, pawn_rank, origin_rank) = match side_to_move {
            Color::White => (5, 4, 6),
            Color::Black => (2, 3, 1),
        };
        if ep.rank() != expected_rank {
            return Err(ChessError::fen(fen, format!("en-passant square {ep} on the wrong rank")));
        }
        // The double push must still be visible: pawn landed, both squares it crossed empty
        let occupied = white.occupied() | black.occupied();
        let mover = match side_to_move {
            Color::White => &mut black,
            Color::Black => &mut white,
        };
        if occupied.contains(ep) || occupied.contains(ep.with_rank(origin_rank)) {
            return Err(ChessError::fen(fen, format!("en-passant square {ep} does not follow a double push")));
        }
        if !mover.pieces(PieceKind::Pawn).contains(ep.with_rank(pawn_rank)) {
            return Err(ChessError::fen(fen, format!("no pawn behind en-passant square {ep}")));
        }
        mover.set_ep(Some(ep));
    }

    let (halfmove, fullmove) = if fields.len() == 6 {
        let halfmove = fields[4]
            .parse::<u32>()
            .map_err(|_| ChessError::fen(fen, format!("bad half-move clock `{}`", fields[4])))?;
        let fullmove = fields[5]
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| ChessError::fen(fen, format!("bad full-move number `{}`", fields[5])))?;
        (halfmove, fullmove)
    } else {
        (0, 1)
    };

    Ok(Position::from_parts(white, black, side_to_move, halfmove, fullmove, keys))
}

fn parse_placement(fen: &str, placement: &str, white: &mut SideState, black: &mut SideState) -> Result<()> {
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return Err(ChessError::fen(fen, format!("expected 8 ranks, found {}", rows.len())));
    }

    // First row is rank 8
    for (row_index, row) in rows.iter().enumerate() {
        let rank = 7 - row_index as u8;
        let mut file = 0u8;
        for c in row.chars() {
            if let Some(run) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                file += run as u8;
                if file > 8 {
                    break;
                }
                continue;
            }
            let (kind, color) = PieceKind::from_fen_char(c)
                .ok_or_else(|| ChessError::fen(fen, format!("unknown piece `{c}`")))?;
            if file >= 8 {
                file = 9;
                break;
            }
            let side = match color {
                Color::White => &mut *white,
                Color::Black => &mut *black,
            };
            side.add_piece(kind, Square::new(file, rank));
            file += 1;
        }
        if file != 8 {
            return Err(ChessError::fen(fen, format!("rank {} does not have 8 squares", rank + 1)));
        }
    }
    Ok(())
}

fn parse_castling(fen: &str, field: &str, white: &mut SideState, black: &mut SideState) -> Result<()> {
    if field == "-" {
        return Ok(());
    }
    let (mut wk, mut wq, mut bk, mut bq) = (false, false, false, false);
    for c in field.chars() {
        let flag = match c {
            'K' => &mut wk,
            'Q' => &mut wq,
            'k' => &mut bk,
            'q' => &mut bq,
            _ => return Err(ChessError::fen(fen, format!("bad castling letter `{c}`"))),
        };
        if *flag {
            return Err(ChessError::fen(fen, format!("castling letter `{c}` repeated")));
        }
        *flag = true;
    }
    white.set_castling_rights(wk, wq);
    black.set_castling_rights(bk, bq);
    Ok(())
}

pub fn serialize(pos: &Position) -> String {
    let mut fen = String::with_capacity(90);
    for rank in (0..8).rev() {
        let mut empty = 0;
        for file in 0..8 {
            match pos.piece_at(Square::new(file, rank)) {
                Some((kind, color)) => {
                    if empty > 0 {
                        fen.push(char::from(b'0' + empty));
                        empty = 0;
                    }
                    fen.push(kind.fen_char(color));
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            fen.push(char::from(b'0' + empty));
        }
        if rank > 0 {
            fen.push('/');
        }
    }

    fen.push_str(match pos.side_to_move() {
        Color::White => " w ",
        Color::Black => " b ",
    });

    let white = pos.side(Color::White);
    let black = pos.side(Color::Black);
    let rights: String = [
        (white.castle_short(), 'K'),
        (white.castle_long(), 'Q'),
        (black.castle_short(), 'k'),
        (black.castle_long(), 'q'),
    ]
    .into_iter()
    .filter_map(|(held, c)| held.then_some(c))
    .collect();
    fen.push_str(if rights.is_empty() { "-" } else { &rights });

    match pos.enemy().ep() {
        Some(ep) => fen.push_str(&format!(" {ep}")),
        None => fen.push_str(" -"),
    }
    fen.push_str(&format!(" {} {}", pos.halfmove_clock(), pos.fullmove_number()));
    fen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::STARTING_FEN;

    fn round_trip(fen: &str) {
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn test_round_trips() {
        round_trip(STARTING_FEN);
        round_trip("4r1k1/1p3p1p/1qp2bp1/r2p4/Pp1P3P/1P2P1P1/3Q1PB1/R2R2K1 b - h3 0 24");
        round_trip("r2q1rk1/pb1n1ppp/1ppbpn2/3p4/2PP4/1PN1PN2/PBQ1BPPP/R3K2R w KQ - 2 10");
        round_trip("rnbqk2r/ppp1ppbp/3p1np1/8/2PPP3/2N2N2/PP3PPP/R1BQKB1R b KQkq e3 0 5");
        round_trip("8/8/8/8/8/8/8/8 w - - 0 1");
    }

    #[test]
    fn test_ep_belongs_to_side_that_moved() {
        let pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(pos.side(Color::White).ep(), Some("e3".parse().unwrap()));
        assert_eq!(pos.side(Color::Black).ep(), None);
    }

    #[test]
    fn test_clocks_are_optional() {
        let pos = Position::from_fen("8/8/4k3/8/8/3K4/8/8 w - -").unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn test_rejects_malformed() {
        let bad = [
            "",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/7/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/ppppXppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KKq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNRR w KQkq - 0 1",
            // En-passant target with no pawn that could have just double pushed
            "4k3/8/8/3P4/8/8/8/4K3 w - e6 0 1",
            "4k3/8/8/8/3p4/8/8/4K3 b - e3 0 1",
            // Target square occupied
            "4k3/8/4n3/3Pp3/8/8/8/4K3 w - e6 0 1",
            // Square the pawn started from is occupied
            "4k3/4n3/8/3Pp3/8/8/8/4K3 w - e6 0 1",
            // Pawn of the wrong colour behind the target
            "4k3/8/8/3PP3/8/8/8/4K3 w - e6 0 1",
        ];
        for fen in bad {
            assert!(
                matches!(Position::from_fen(fen), Err(ChessError::InvalidFen { .. })),
                "accepted {fen:?}"
            );
        }
    }
}
