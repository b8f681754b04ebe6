//! Move text: long algebraic (UCI style) and SAN
//!
//! Both parsers resolve text against the legal move list, so a move that
//! parses is always playable. Text that cannot be read at all is
//! `MalformedMove`; text that reads fine but matches no legal move is
//! `IllegalMove`; text matching several is `AmbiguousMove`.

use crate::error::{ChessError, Result};
use crate::moves::Move;
use crate::position::{Position, UndoHandle};
use crate::square::{Color, PieceKind, Square};

impl Position {
    /// Resolves long algebraic text such as `e2e4` or `e7e8q`.
    pub fn parse_uci(&self, text: &str) -> Result<Move> {
        let text = text.trim();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(ChessError::MalformedMove(text.to_string()));
        }
        let malformed = || ChessError::MalformedMove(text.to_string());
        let from: Square = text[0..2].parse().map_err(|_| malformed())?;
        let to: Square = text[2..4].parse().map_err(|_| malformed())?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_fen_char(c) {
                Some((kind, _)) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
                _ => return Err(malformed()),
            },
        };

        let (moves, _) = self.legal_moves();
        moves
            .into_iter()
            .find(|mv| mv.from() == from && mv.to() == to && mv.promotion() == promotion)
            .ok_or_else(|| ChessError::IllegalMove(text.to_string()))
    }

    pub fn push_uci(&mut self, text: &str) -> Result<UndoHandle> {
        let mv = self.parse_uci(text)?;
        Ok(self.push(mv))
    }

    /// SAN for `mv`, which must be legal here.
    pub fn san(&self, mv: &Move) -> String {
        let mut san = String::with_capacity(8);
        match *mv {
            Move::Castling { king_to, .. } => {
                san.push_str(if king_to.file() == 6 { "O-O" } else { "O-O-O" });
            }
            _ => {
                let piece = mv.piece();
                match piece.san_letter() {
                    None if mv.is_capture() => san.push(mv.from().file_char()),
                    None => {}
                    Some(letter) => {
                        san.push(letter);
                        if piece != PieceKind::King {
                            san.push_str(&self.disambiguation(mv));
                        }
                    }
                }
                if mv.is_capture() {
                    san.push('x');
                }
                san.push_str(&mv.to().to_string());
                if let Some(kind) = mv.promotion() {
                    san.push('=');
                    san.push(kind.fen_char(Color::White));
                }
            }
        }
        if mv.is_check() {
            let mut after = self.clone();
            after.push(*mv);
            san.push(if after.is_checkmate() { '#' } else { '+' });
        }
        san
    }

    /// Origin file, rank, or both: file if it alone tells the candidates
    /// apart, then rank, then the full square.
    fn disambiguation(&self, mv: &Move) -> String {
        let (from, to) = (mv.from(), mv.to());
        let (moves, _) = self.legal_moves();
        let rivals: Vec<Square> = moves
            .iter()
            .filter(|m| !m.is_castling() && m.piece() == mv.piece() && m.to() == to && m.from() != from)
            .map(|m| m.from())
            .collect();

        if rivals.is_empty() {
            String::new()
        } else if rivals.iter().all(|sq| sq.file() != from.file()) {
            from.file_char().to_string()
        } else if rivals.iter().all(|sq| sq.rank() != from.rank()) {
            from.rank_char().to_string()
        } else {
            from.to_string()
        }
    }

    /// Resolves SAN such as `Nbd7`, `exd5`, `e8=Q+` or `O-O-O`.
    pub fn parse_san(&self, text: &str) -> Result<Move> {
        let original = text.trim();
        let malformed = || ChessError::MalformedMove(original.to_string());
        let body = original.trim_end_matches(['+', '#', '!', '?']);
        if body.is_empty() || !body.is_ascii() {
            return Err(malformed());
        }

        let (moves, _) = self.legal_moves();
        let candidates: Vec<Move> = match body {
            "O-O" | "0-0" => moves
                .into_iter()
                .filter(|m| m.is_castling() && m.to().file() == 6)
                .collect(),
            "O-O-O" | "0-0-0" => moves
                .into_iter()
                .filter(|m| m.is_castling() && m.to().file() == 2)
                .collect(),
            _ => {
                let pattern = SanPattern::parse(body).ok_or_else(malformed)?;
                moves.into_iter().filter(|m| pattern.matches(m)).collect()
            }
        };

        match candidates.as_slice() {
            [] => Err(ChessError::IllegalMove(original.to_string())),
            [mv] => Ok(*mv),
            _ => Err(ChessError::AmbiguousMove(original.to_string())),
        }
    }

    pub fn push_san(&mut self, text: &str) -> Result<UndoHandle> {
        let mv = self.parse_san(text)?;
        Ok(self.push(mv))
    }

    /// SAN for a line of moves starting here, e.g. a principal variation.
    pub fn san_line(&self, line: &[Move]) -> Vec<String> {
        let mut pos = self.clone();
        line.iter()
            .map(|mv| {
                let san = pos.san(mv);
                pos.push(*mv);
                san
            })
            .collect()
    }
}

/// The pieces of a non-castling SAN move.
#[derive(Debug, PartialEq, Eq)]
struct SanPattern {
    piece: PieceKind,
    from_file: Option<u8>,
    from_rank: Option<u8>,
    to: Square,
    promotion: Option<PieceKind>,
}

impl SanPattern {
    fn parse(body: &str) -> Option<SanPattern> {
        let (body, promotion) = match body.split_once('=') {
            Some((head, promo)) => {
                let mut chars = promo.chars();
                let kind = PieceKind::from_san_letter(chars.next()?)?;
                if chars.next().is_some() || !PieceKind::PROMOTIONS.contains(&kind) {
                    return None;
                }
                (head, Some(kind))
            }
            None => (body, None),
        };

        let (piece, rest) = match body.chars().next().and_then(PieceKind::from_san_letter) {
            Some(kind) => (kind, &body[1..]),
            None => (PieceKind::Pawn, body),
        };
        if promotion.is_some() && piece != PieceKind::Pawn {
            return None;
        }
        if rest.len() < 2 {
            return None;
        }
        let (prefix, dest) = rest.split_at(rest.len() - 2);
        let to: Square = dest.parse().ok()?;

        let mut from_file = None;
        let mut from_rank = None;
        for c in prefix.chars().filter(|&c| c != 'x') {
            match c {
                'a'..='h' if from_file.is_none() && from_rank.is_none() => {
                    from_file = Some(c as u8 - b'a')
                }
                '1'..='8' if from_rank.is_none() => from_rank = Some(c as u8 - b'1'),
                _ => return None,
            }
        }
        if prefix.matches('x').count() > 1 {
            return None;
        }

        Some(SanPattern {
            piece,
            from_file,
            from_rank,
            to,
            promotion,
        })
    }

    fn matches(&self, mv: &Move) -> bool {
        !mv.is_castling()
            && mv.piece() == self.piece
            && mv.to() == self.to
            && mv.promotion() == self.promotion
            && self.from_file.map_or(true, |f| mv.from().file() == f)
            && self.from_rank.map_or(true, |r| mv.from().rank() == r)
    }
}
