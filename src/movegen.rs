//! Legal move generation
//!
//! `legal_moves` never produces a move that leaves the mover's king
//! attacked, and never plays a move on a scratch board to find out. King
//! safety comes from the enemy attack map computed with our king lifted off
//! the board; single checks restrict everyone else to capturing the checker
//! or interposing; pinned pieces are confined to their pin ray. En passant
//! gets an exact occupancy test since it removes two pieces from one rank.
//!
//! Each generated move carries a check flag so ordering and SAN output
//! don't need to replay it.

use crate::bitboard::{between, bishop_rays, king_reach, knight_reach, rook_rays, Bitboard};
use crate::magic::{bishop_attacks, queen_attacks, rook_attacks};
use crate::moves::{castling_rook_squares, ep_victim, Move};
use crate::side::SideState;
use crate::square::{Color, PieceKind, Square};

/// Every square `side` attacks given occupancy `occ`.
pub fn attacked_squares(side: &SideState, occ: Bitboard) -> Bitboard {
    let mut attacked = side.pieces(PieceKind::Pawn).pawn_attacks(side.color());
    for sq in side.pieces(PieceKind::Knight) {
        attacked |= knight_reach(sq);
    }
    for sq in side.diagonal_sliders() {
        attacked |= bishop_attacks(sq, occ, Bitboard::EMPTY);
    }
    for sq in side.orthogonal_sliders() {
        attacked |= rook_attacks(sq, occ, Bitboard::EMPTY);
    }
    for sq in side.pieces(PieceKind::King) {
        attacked |= king_reach(sq);
    }
    attacked
}

/// Pieces of `attacker` that attack `sq` given occupancy `occ`.
pub fn attackers_of(sq: Square, attacker: &SideState, occ: Bitboard) -> Bitboard {
    // A pawn of the defending colour on `sq` would hit exactly the squares
    // an attacking pawn must stand on
    let pawn_squares = Bitboard::from(sq).pawn_attacks(!attacker.color());
    (pawn_squares & attacker.pieces(PieceKind::Pawn))
        | (knight_reach(sq) & attacker.pieces(PieceKind::Knight))
        | (king_reach(sq) & attacker.pieces(PieceKind::King))
        | (bishop_attacks(sq, occ, Bitboard::EMPTY) & attacker.diagonal_sliders())
        | (rook_attacks(sq, occ, Bitboard::EMPTY) & attacker.orthogonal_sliders())
}

/// Whether `own`'s king is attacked. A side without a king is never in check.
pub fn in_check(own: &SideState, enemy: &SideState) -> bool {
    match own.king_square() {
        Some(king) => attackers_of(king, enemy, own.occupied() | enemy.occupied()).any(),
        None => false,
    }
}

/// All legal moves for `own`, plus whether `own` is currently in check.
///
/// A side without a king gets no moves and is reported not in check; the
/// search can wander into such lines after a king capture is already
/// decided elsewhere.
pub fn legal_moves(own: &SideState, enemy: &SideState) -> (Vec<Move>, bool) {
    let Some(king) = own.king_square() else {
        return (Vec::new(), false);
    };

    let generator = Generator::new(own, enemy, king);
    let mut moves = Vec::with_capacity(64);
    generator.king_moves(&mut moves);

    let in_check = generator.checkers.any();
    if generator.checkers.more_than_one() {
        generator.annotate_checks(&mut moves);
        return (moves, true);
    }
    if !in_check {
        generator.castling_moves(&mut moves);
    }
    generator.piece_moves(PieceKind::Knight, &mut moves);
    generator.piece_moves(PieceKind::Bishop, &mut moves);
    generator.piece_moves(PieceKind::Rook, &mut moves);
    generator.piece_moves(PieceKind::Queen, &mut moves);
    generator.pawn_moves(&mut moves);
    generator.annotate_checks(&mut moves);
    (moves, in_check)
}

struct Generator<'a> {
    own: &'a SideState,
    enemy: &'a SideState,
    color: Color,
    king: Square,
    own_occ: Bitboard,
    enemy_occ: Bitboard,
    all: Bitboard,
    /// Enemy attacks computed with our king removed, so sliding away along
    /// a checking line is correctly refused.
    attacked: Bitboard,
    checkers: Bitboard,
    /// Squares a non-king move may land on: everything when not in check,
    /// otherwise the checker plus any interposition squares.
    evasion: Bitboard,
    pinned: Bitboard,
    pin_rays: [Bitboard; 64],
}

impl<'a> Generator<'a> {
    fn new(own: &'a SideState, enemy: &'a SideState, king: Square) -> Self {
        let own_occ = own.occupied();
        let enemy_occ = enemy.occupied();
        let all = own_occ | enemy_occ;

        let attacked = attacked_squares(enemy, all.without(king));
        let checkers = attackers_of(king, enemy, all);
        let evasion = match checkers.lsb() {
            None => Bitboard::FULL,
            Some(checker) => checkers | between(checker, king),
        };

        let mut generator = Generator {
            own,
            enemy,
            color: own.color(),
            king,
            own_occ,
            enemy_occ,
            all,
            attacked,
            checkers,
            evasion,
            pinned: Bitboard::EMPTY,
            pin_rays: [Bitboard::EMPTY; 64],
        };
        generator.find_pins();
        generator
    }

    fn find_pins(&mut self) {
        let snipers = (rook_rays(self.king) & self.enemy.orthogonal_sliders())
            | (bishop_rays(self.king) & self.enemy.diagonal_sliders());
        for sniper in snipers {
            let path = between(sniper, self.king);
            let blockers = path & self.all;
            if blockers.is_single() && (blockers & self.own_occ).any() {
                if let Some(pinned) = blockers.lsb() {
                    self.pinned.set(pinned);
                    self.pin_rays[pinned.index()] = path.with(sniper);
                }
            }
        }
    }

    /// Destinations a non-king piece on `from` may use after check and pin
    /// restrictions.
    #[inline]
    fn allowed(&self, from: Square) -> Bitboard {
        let mut allowed = self.evasion & !self.own_occ;
        if self.pinned.contains(from) {
            allowed &= self.pin_rays[from.index()];
        }
        allowed
    }

    fn push_standard(&self, piece: PieceKind, from: Square, targets: Bitboard, out: &mut Vec<Move>) {
        for to in targets {
            out.push(Move::Standard {
                piece,
                from,
                to,
                capture: self.enemy_occ.contains(to),
                check: false,
            });
        }
    }

    fn king_moves(&self, out: &mut Vec<Move>) {
        let targets = king_reach(self.king) & !self.own_occ & !self.attacked;
        self.push_standard(PieceKind::King, self.king, targets, out);
    }

    fn castling_moves(&self, out: &mut Vec<Move>) {
        let home = self.color.home_rank();
        if self.king != Square::new(4, home) {
            return;
        }
        let rooks = self.own.pieces(PieceKind::Rook);

        if self.own.castle_short() && rooks.contains(Square::new(7, home)) {
            let king_to = Square::new(6, home);
            let path = Bitboard::bounding_box(self.king, king_to).without(self.king);
            if (path & (self.all | self.attacked)).is_empty() {
                out.push(Move::Castling {
                    king_from: self.king,
                    king_to,
                    check: false,
                });
            }
        }

        if self.own.castle_long() && rooks.contains(Square::new(0, home)) {
            let king_to = Square::new(2, home);
            let path = Bitboard::bounding_box(self.king, king_to).without(self.king);
            let rook_passage = Square::new(1, home);
            if (path & (self.all | self.attacked)).is_empty() && !self.all.contains(rook_passage) {
                out.push(Move::Castling {
                    king_from: self.king,
                    king_to,
                    check: false,
                });
            }
        }
    }

    fn piece_moves(&self, kind: PieceKind, out: &mut Vec<Move>) {
        for from in self.own.pieces(kind) {
            let reach = match kind {
                // A pinned knight can never stay on its ray
                PieceKind::Knight if self.pinned.contains(from) => continue,
                PieceKind::Knight => knight_reach(from),
                PieceKind::Bishop => bishop_attacks(from, self.all, self.own_occ),
                PieceKind::Rook => rook_attacks(from, self.all, self.own_occ),
                PieceKind::Queen => queen_attacks(from, self.all, self.own_occ),
                PieceKind::Pawn | PieceKind::King => unreachable!("not a piece move: {kind:?}"),
            };
            self.push_standard(kind, from, reach & self.allowed(from), out);
        }
    }

    fn pawn_moves(&self, out: &mut Vec<Move>) {
        let promotion_rank = self.color.promotion_rank();
        let push_pawn = |from: Square, to: Square, capture: bool, out: &mut Vec<Move>| {
            if to.rank() == promotion_rank {
                for promoted in PieceKind::PROMOTIONS {
                    out.push(Move::Promotion {
                        from,
                        to,
                        capture,
                        promoted,
                        check: false,
                    });
                }
            } else {
                out.push(Move::Standard {
                    piece: PieceKind::Pawn,
                    from,
                    to,
                    capture,
                    check: false,
                });
            }
        };

        for from in self.own.pieces(PieceKind::Pawn) {
            let allowed = self.allowed(from);
            let single = Bitboard::from(from).pawn_push(self.color) & !self.all;
            if let Some(to) = (single & allowed).lsb() {
                push_pawn(from, to, false, out);
            }
            if from.rank() == self.color.pawn_start_rank() {
                let double = single.pawn_push(self.color) & !self.all & allowed;
                if let Some(to) = double.lsb() {
                    push_pawn(from, to, false, out);
                }
            }

            let attacks = Bitboard::from(from).pawn_attacks(self.color);
            for to in attacks & self.enemy_occ & allowed {
                push_pawn(from, to, true, out);
            }

            if let Some(ep) = self.enemy.ep() {
                if attacks.contains(ep) && self.en_passant_is_safe(from, ep) {
                    push_pawn(from, ep, true, out);
                }
            }
        }
    }

    /// Plays the capture on a notional occupancy and asks whether anything
    /// still attacks the king. This covers ordinary pins, the two-pawn
    /// horizontal pin, and check evasion in one test.
    fn en_passant_is_safe(&self, from: Square, ep: Square) -> bool {
        let victim = ep_victim(from, ep);
        let occ = self.all.without(from).without(victim).with(ep);

        let sliders_hit = (rook_attacks(self.king, occ, Bitboard::EMPTY) & self.enemy.orthogonal_sliders())
            | (bishop_attacks(self.king, occ, Bitboard::EMPTY) & self.enemy.diagonal_sliders());
        if sliders_hit.any() {
            return false;
        }
        // A knight or pawn giving check survives unless it is the captured pawn
        let leapers = self.checkers & !self.enemy.orthogonal_sliders() & !self.enemy.diagonal_sliders();
        leapers.without(victim).is_empty()
    }

    // ------------------------------------------------------------------
    // Check detection
    // ------------------------------------------------------------------

    fn annotate_checks(&self, moves: &mut [Move]) {
        let Some(enemy_king) = self.enemy.king_square() else {
            return;
        };
        let probe = CheckProbe::new(self, enemy_king);
        for mv in moves.iter_mut() {
            *mv = mv.with_check(probe.gives_check(self, mv));
        }
    }
}

/// Precomputed masks for deciding whether a move attacks the enemy king.
struct CheckProbe {
    enemy_king: Square,
    /// Squares from which our pawn would hit the enemy king.
    pawn_mask: Bitboard,
    knight_mask: Bitboard,
    /// Own pieces that alone block one of our sliders from the enemy king.
    discoverers: Bitboard,
    discovery_rays: [Bitboard; 64],
}

impl CheckProbe {
    fn new(generator: &Generator<'_>, enemy_king: Square) -> Self {
        let mut probe = CheckProbe {
            enemy_king,
            pawn_mask: Bitboard::from(enemy_king).pawn_attacks(!generator.color),
            knight_mask: knight_reach(enemy_king),
            discoverers: Bitboard::EMPTY,
            discovery_rays: [Bitboard::EMPTY; 64],
        };

        let own_sliders = (rook_rays(enemy_king) & generator.own.orthogonal_sliders())
            | (bishop_rays(enemy_king) & generator.own.diagonal_sliders());
        for slider in own_sliders {
            let path = between(slider, enemy_king);
            let blockers = path & generator.all;
            if blockers.is_single() && (blockers & generator.own_occ).any() {
                if let Some(blocker) = blockers.lsb() {
                    probe.discoverers.set(blocker);
                    probe.discovery_rays[blocker.index()] = path;
                }
            }
        }
        probe
    }

    fn gives_check(&self, generator: &Generator<'_>, mv: &Move) -> bool {
        let ek = self.enemy_king;
        match *mv {
            Move::Castling { king_from, king_to, .. } => {
                let (rook_from, rook_to) = castling_rook_squares(king_to);
                let occ = generator
                    .all
                    .without(king_from)
                    .without(rook_from)
                    .with(king_to)
                    .with(rook_to);
                let orth = generator.own.orthogonal_sliders().without(rook_from).with(rook_to);
                self.slider_check(occ, orth, generator.own.diagonal_sliders())
            }
            Move::Standard {
                piece: PieceKind::Pawn,
                from,
                to,
                capture: true,
                ..
            } if generator.enemy.ep() == Some(to) => {
                // Removing the victim can open a line no blocker map records
                let occ = generator.all.without(from).without(ep_victim(from, to)).with(to);
                self.pawn_mask.contains(to)
                    || self.slider_check(occ, generator.own.orthogonal_sliders(), generator.own.diagonal_sliders())
            }
            _ => {
                let (from, to) = (mv.from(), mv.to());
                let landing = mv.promotion().unwrap_or(mv.piece());
                // With `from` vacated so a promoting pawn does not shadow itself
                let occ = generator.all.without(from);
                let direct = match landing {
                    PieceKind::Pawn => self.pawn_mask.contains(to),
                    PieceKind::Knight => self.knight_mask.contains(to),
                    PieceKind::Bishop => bishop_attacks(ek, occ, Bitboard::EMPTY).contains(to),
                    PieceKind::Rook => rook_attacks(ek, occ, Bitboard::EMPTY).contains(to),
                    PieceKind::Queen => queen_attacks(ek, occ, Bitboard::EMPTY).contains(to),
                    PieceKind::King => false,
                };
                let discovered =
                    self.discoverers.contains(from) && !self.discovery_rays[from.index()].contains(to);
                direct || discovered
            }
        }
    }

    fn slider_check(&self, occ: Bitboard, orth: Bitboard, diag: Bitboard) -> bool {
        (rook_attacks(self.enemy_king, occ, Bitboard::EMPTY) & orth).any()
            || (bishop_attacks(self.enemy_king, occ, Bitboard::EMPTY) & diag).any()
    }
}
