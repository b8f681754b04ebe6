//! Move representation with exact-inverse apply/undo
//!
//! `Move` is a closed tagged union. Each variant's `apply` records an
//! [`Undo`] snapshot before mutating both sides, and `undo` uses nothing but
//! that snapshot to put every bit, right and hash key back.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::side::SideState;
use crate::square::{Color, PieceKind, Square};

#[derive(Clone, Copy, Debug, Eq)]
pub enum Move {
    Standard {
        piece: PieceKind,
        from: Square,
        to: Square,
        capture: bool,
        check: bool,
    },
    /// The rook's squares follow from the king's destination file.
    Castling {
        king_from: Square,
        king_to: Square,
        check: bool,
    },
    Promotion {
        from: Square,
        to: Square,
        capture: bool,
        promoted: PieceKind,
        check: bool,
    },
}

/// State a move overwrites and cannot recompute on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Undo {
    /// (short, long)
    own_castling: (bool, bool),
    enemy_castling: (bool, bool),
    own_ep: Option<Square>,
    enemy_ep: Option<Square>,
    captured: Option<PieceKind>,
    halfmove: u32,
}

impl Undo {
    pub fn captured(&self) -> Option<PieceKind> {
        self.captured
    }

    pub fn halfmove(&self) -> u32 {
        self.halfmove
    }

    fn record(own: &SideState, enemy: &SideState, halfmove: u32) -> Undo {
        Undo {
            own_castling: (own.castle_short(), own.castle_long()),
            enemy_castling: (enemy.castle_short(), enemy.castle_long()),
            own_ep: own.ep(),
            enemy_ep: enemy.ep(),
            captured: None,
            halfmove,
        }
    }

    fn restore(&self, own: &mut SideState, enemy: &mut SideState) {
        own.set_ep(self.own_ep);
        enemy.set_ep(self.enemy_ep);
        own.set_castling_rights(self.own_castling.0, self.own_castling.1);
        enemy.set_castling_rights(self.enemy_castling.0, self.enemy_castling.1);
    }
}

/// Square of the pawn taken by an en-passant capture landing on `to`.
#[inline]
pub(crate) fn ep_victim(from: Square, to: Square) -> Square {
    to.with_rank(from.rank())
}

/// Rook (from, to) for a castling king landing on `king_to`.
#[inline]
pub fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    if king_to.file() == 6 {
        (king_to.with_file(7), king_to.with_file(5))
    } else {
        (king_to.with_file(0), king_to.with_file(3))
    }
}

impl Move {
    #[inline]
    pub fn from(&self) -> Square {
        match *self {
            Move::Standard { from, .. } | Move::Promotion { from, .. } => from,
            Move::Castling { king_from, .. } => king_from,
        }
    }

    #[inline]
    pub fn to(&self) -> Square {
        match *self {
            Move::Standard { to, .. } | Move::Promotion { to, .. } => to,
            Move::Castling { king_to, .. } => king_to,
        }
    }

    /// The kind of piece leaving `from`.
    #[inline]
    pub fn piece(&self) -> PieceKind {
        match *self {
            Move::Standard { piece, .. } => piece,
            Move::Castling { .. } => PieceKind::King,
            Move::Promotion { .. } => PieceKind::Pawn,
        }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        match *self {
            Move::Standard { capture, .. } | Move::Promotion { capture, .. } => capture,
            Move::Castling { .. } => false,
        }
    }

    #[inline]
    pub fn is_check(&self) -> bool {
        match *self {
            Move::Standard { check, .. }
            | Move::Castling { check, .. }
            | Move::Promotion { check, .. } => check,
        }
    }

    #[inline]
    pub fn promotion(&self) -> Option<PieceKind> {
        match *self {
            Move::Promotion { promoted, .. } => Some(promoted),
            _ => None,
        }
    }

    #[inline]
    pub fn is_castling(&self) -> bool {
        matches!(self, Move::Castling { .. })
    }

    /// Forcing moves are the ones quiescence keeps expanding.
    #[inline]
    pub fn is_forcing(&self) -> bool {
        self.is_capture() || self.is_check() || self.promotion().is_some()
    }

    /// Returns the same move with its check flag replaced.
    pub(crate) fn with_check(self, is_check: bool) -> Move {
        match self {
            Move::Standard {
                piece,
                from,
                to,
                capture,
                ..
            } => Move::Standard {
                piece,
                from,
                to,
                capture,
                check: is_check,
            },
            Move::Promotion {
                from,
                to,
                capture,
                promoted,
                ..
            } => Move::Promotion {
                from,
                to,
                capture,
                promoted,
                check: is_check,
            },
            Move::Castling {
                king_from, king_to, ..
            } => Move::Castling {
                king_from,
                king_to,
                check: is_check,
            },
        }
    }

    /// Plays the move for `own` against `enemy`.
    ///
    /// Both en-passant targets expire: the enemy's because this was the only
    /// reply that could use it, ours because a new one is set only by a
    /// double push made now.
    pub fn apply(&self, own: &mut SideState, enemy: &mut SideState, halfmove: u32) -> Undo {
        let mut undo = Undo::record(own, enemy, halfmove);
        own.clear_ep();
        enemy.clear_ep();

        match *self {
            Move::Standard {
                piece, from, to, ..
            } => {
                undo.captured = if piece == PieceKind::Pawn && undo.enemy_ep == Some(to) {
                    let victim = ep_victim(from, to);
                    enemy.remove_piece(PieceKind::Pawn, victim);
                    Some(PieceKind::Pawn)
                } else {
                    enemy.capture_at(to)
                };
                debug_assert_eq!(undo.captured.is_some(), self.is_capture(), "{self}");

                own.move_piece(piece, from, to);
                if piece == PieceKind::Pawn && from.rank().abs_diff(to.rank()) == 2 {
                    own.set_ep(Some(Square::new(from.file(), (from.rank() + to.rank()) / 2)));
                }
            }
            Move::Castling {
                king_from, king_to, ..
            } => {
                let (rook_from, rook_to) = castling_rook_squares(king_to);
                own.move_piece(PieceKind::King, king_from, king_to);
                own.relocate(PieceKind::Rook, rook_from, rook_to);
            }
            Move::Promotion {
                from, to, promoted, ..
            } => {
                undo.captured = enemy.capture_at(to);
                debug_assert_eq!(undo.captured.is_some(), self.is_capture(), "{self}");
                own.remove_piece(PieceKind::Pawn, from);
                own.add_piece(promoted, to);
            }
        }
        undo
    }

    /// Exact inverse of [`Move::apply`] given the snapshot it returned.
    pub fn undo(&self, own: &mut SideState, enemy: &mut SideState, undo: &Undo) {
        match *self {
            Move::Standard {
                piece, from, to, ..
            } => {
                own.relocate(piece, to, from);
                if let Some(kind) = undo.captured {
                    if piece == PieceKind::Pawn && undo.enemy_ep == Some(to) {
                        enemy.add_piece(PieceKind::Pawn, ep_victim(from, to));
                    } else {
                        enemy.add_piece(kind, to);
                    }
                }
            }
            Move::Castling {
                king_from, king_to, ..
            } => {
                let (rook_from, rook_to) = castling_rook_squares(king_to);
                own.relocate(PieceKind::Rook, rook_to, rook_from);
                own.relocate(PieceKind::King, king_to, king_from);
            }
            Move::Promotion {
                from, to, promoted, ..
            } => {
                own.remove_piece(promoted, to);
                own.add_piece(PieceKind::Pawn, from);
                if let Some(kind) = undo.captured {
                    enemy.add_piece(kind, to);
                }
            }
        }
        undo.restore(own, enemy);
    }

    /// Small ordering bonus in centipawns for the side `mover` playing this
    /// at move number `fullmove`. Encodes opening and middlegame rules of
    /// thumb; never affects which moves are legal.
    pub fn positional_nudge(&self, mover: Color, fullmove: u32) -> i32 {
        if let Move::Castling { .. } = self {
            return 5 * fullmove.min(10) as i32;
        }
        let (from, to) = (self.from(), self.to());
        let back_rank = mover.home_rank();

        if fullmove < 10 {
            match self.piece() {
                PieceKind::Pawn
                    if from.rank() == mover.pawn_start_rank()
                        && to.rank() == mover.double_push_rank()
                        && (from.file() == 3 || from.file() == 4) =>
                {
                    20
                }
                PieceKind::Pawn => 0,
                PieceKind::Knight if to.file() == 0 || to.file() == 7 => -10,
                PieceKind::Knight if from.rank() == back_rank => 15,
                PieceKind::Knight => 0,
                PieceKind::Bishop if from.rank() == back_rank => 10,
                PieceKind::Bishop => 0,
                PieceKind::Queen | PieceKind::Rook => -10,
                PieceKind::King => -20,
            }
        } else if fullmove < 25 {
            match self.piece() {
                PieceKind::King => -10,
                PieceKind::Rook if to.rank() == mover.seventh_rank() => 30,
                _ => 0,
            }
        } else {
            0
        }
    }
}

/// Equality ignores the check flag: it is derived data, and moves parsed
/// from text do not know it.
impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (
                Move::Standard {
                    piece: p1,
                    from: f1,
                    to: t1,
                    capture: c1,
                    ..
                },
                Move::Standard {
                    piece: p2,
                    from: f2,
                    to: t2,
                    capture: c2,
                    ..
                },
            ) => p1 == p2 && f1 == f2 && t1 == t2 && c1 == c2,
            (
                Move::Castling {
                    king_from: f1,
                    king_to: t1,
                    ..
                },
                Move::Castling {
                    king_from: f2,
                    king_to: t2,
                    ..
                },
            ) => f1 == f2 && t1 == t2,
            (
                Move::Promotion {
                    from: f1,
                    to: t1,
                    capture: c1,
                    promoted: k1,
                    ..
                },
                Move::Promotion {
                    from: f2,
                    to: t2,
                    capture: c2,
                    promoted: k2,
                    ..
                },
            ) => f1 == f2 && t1 == t2 && c1 == c2 && k1 == k2,
            _ => false,
        }
    }
}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        self.from().hash(state);
        self.to().hash(state);
        self.is_capture().hash(state);
        self.promotion().hash(state);
    }
}

/// Long algebraic: `e2e4`, `e1g1`, `e7e8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(kind) = self.promotion() {
            write!(f, "{}", kind.fen_char(Color::Black))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zobrist::ZobristKeys;
    use std::sync::Arc;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn sides() -> (SideState, SideState) {
        let keys = Arc::new(ZobristKeys::new(3));
        (
            SideState::starting(Color::White, keys.clone()),
            SideState::starting(Color::Black, keys),
        )
    }

    #[test]
    fn test_double_push_sets_ep_and_round_trips() {
        let (mut white, mut black) = sides();
        let (w0, b0) = (white.clone(), black.clone());
        let mv = Move::Standard {
            piece: PieceKind::Pawn,
            from: sq("e2"),
            to: sq("e4"),
            capture: false,
            check: false,
        };
        let undo = mv.apply(&mut white, &mut black, 0);
        assert_eq!(white.ep(), Some(sq("e3")));
        assert_eq!(white.hash(), white.compute_hash());
        mv.undo(&mut white, &mut black, &undo);
        assert_eq!(white, w0);
        assert_eq!(black, b0);
    }

    #[test]
    fn test_en_passant_capture_round_trips() {
        let keys = Arc::new(ZobristKeys::new(3));
        let mut white = SideState::empty(Color::White, keys.clone());
        let mut black = SideState::empty(Color::Black, keys);
        white.add_piece(PieceKind::King, Square::E1);
        white.add_piece(PieceKind::Pawn, sq("e5"));
        black.add_piece(PieceKind::King, Square::E8);
        black.add_piece(PieceKind::Pawn, sq("d5"));
        black.set_ep(Some(sq("d6")));
        let (w0, b0) = (white.clone(), black.clone());

        let mv = Move::Standard {
            piece: PieceKind::Pawn,
            from: sq("e5"),
            to: sq("d6"),
            capture: true,
            check: false,
        };
        let undo = mv.apply(&mut white, &mut black, 7);
        assert_eq!(undo.captured(), Some(PieceKind::Pawn));
        assert!(black.pieces(PieceKind::Pawn).is_empty());
        assert_eq!(black.ep(), None);
        mv.undo(&mut white, &mut black, &undo);
        assert_eq!(white, w0);
        assert_eq!(black, b0);
        assert_eq!(undo.halfmove(), 7);
    }

    #[test]
    fn test_castling_moves_rook_and_round_trips() {
        let (mut white, mut black) = sides();
        white.remove_piece(PieceKind::Knight, sq("g1"));
        white.remove_piece(PieceKind::Bishop, sq("f1"));
        let (w0, b0) = (white.clone(), black.clone());

        let mv = Move::Castling {
            king_from: Square::E1,
            king_to: Square::G1,
            check: false,
        };
        let undo = mv.apply(&mut white, &mut black, 0);
        assert_eq!(white.piece_at(sq("f1")), Some(PieceKind::Rook));
        assert_eq!(white.piece_at(Square::G1), Some(PieceKind::King));
        assert!(!white.castle_short() && !white.castle_long());
        mv.undo(&mut white, &mut black, &undo);
        assert_eq!(white, w0);
        assert_eq!(black, b0);
    }

    #[test]
    fn test_promotion_capture_round_trips() {
        let keys = Arc::new(ZobristKeys::new(3));
        let mut white = SideState::empty(Color::White, keys.clone());
        let mut black = SideState::empty(Color::Black, keys);
        white.add_piece(PieceKind::King, Square::E1);
        white.add_piece(PieceKind::Pawn, sq("g7"));
        black.add_piece(PieceKind::King, Square::E8);
        black.add_piece(PieceKind::Rook, Square::H8);
        black.set_castling_rights(true, false);
        let (w0, b0) = (white.clone(), black.clone());

        let mv = Move::Promotion {
            from: sq("g7"),
            to: Square::H8,
            capture: true,
            promoted: PieceKind::Queen,
            check: false,
        };
        let undo = mv.apply(&mut white, &mut black, 0);
        assert_eq!(undo.captured(), Some(PieceKind::Rook));
        assert!(!black.castle_short());
        assert_eq!(white.piece_at(Square::H8), Some(PieceKind::Queen));
        mv.undo(&mut white, &mut black, &undo);
        assert_eq!(white, w0);
        assert_eq!(black, b0);
    }

    #[test]
    fn test_equality_ignores_check_flag() {
        let quiet = Move::Standard {
            piece: PieceKind::Queen,
            from: sq("d1"),
            to: sq("h5"),
            capture: false,
            check: false,
        };
        assert_eq!(quiet, quiet.with_check(true));
        let promo = |k| Move::Promotion {
            from: sq("a7"),
            to: sq("a8"),
            capture: false,
            promoted: k,
            check: false,
        };
        assert_ne!(promo(PieceKind::Queen), promo(PieceKind::Knight));
        assert_eq!(promo(PieceKind::Knight).to_string(), "a7a8n");
    }

    #[test]
    fn test_positional_nudge() {
        let e4 = Move::Standard {
            piece: PieceKind::Pawn,
            from: sq("e2"),
            to: sq("e4"),
            capture: false,
            check: false,
        };
        assert_eq!(e4.positional_nudge(Color::White, 1), 20);
        let na3 = Move::Standard {
            piece: PieceKind::Knight,
            from: sq("b1"),
            to: sq("a3"),
            capture: false,
            check: false,
        };
        assert_eq!(na3.positional_nudge(Color::White, 1), -10);
        let castle = Move::Castling {
            king_from: Square::E8,
            king_to: Square::G8,
            check: false,
        };
        assert_eq!(castle.positional_nudge(Color::Black, 4), 20);
        assert_eq!(castle.positional_nudge(Color::Black, 30), 50);
        let rook_seventh = Move::Standard {
            piece: PieceKind::Rook,
            from: sq("d1"),
            to: sq("d7"),
            capture: false,
            check: false,
        };
        assert_eq!(rook_seventh.positional_nudge(Color::White, 15), 30);
    }
}
