//! # The chess rule oracle.
//!
//! Everything this crate knows about *standard* chess it learns from
//! `shakmaty`, wrapped here behind a small call surface. The rest of the
//! engine talks to [`Oracle`] and never to `shakmaty` positions directly,
//! which keeps the rule oracle swappable and, more importantly, keeps every
//! workaround for its worldview in one file.
//!
//! Two conventions of that worldview leak into the API:
//!
//! - Promotion is not negotiable. Fusion chess promotes to the strongest
//!   piece, so [`Oracle::find_move`] resolves any promotion choice to a
//!   queen rather than asking the caller.
//! - The oracle refuses "impossible" positions. Shadow and substitution
//!   boards are routinely impossible (three queens, orphaned castling
//!   rights), so [`Oracle::from_setup_relaxed`] assembles a position while
//!   shrugging off every complaint that can be shrugged off.

use shakmaty::{
    Bitboard, CastlingMode, Chess, Color, EnPassantMode, FromSetup, Move, MoveList, Piece,
    Position, PositionError, Role, Setup, Square,
    fen::Fen,
    san::SanPlus,
};
use thiserror::Error;

/// Complaints from the rule oracle.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("unreadable position string: {0}")]
    UnreadablePosition(String),
    #[error("position rejected by the rule oracle: {0}")]
    IllegalPosition(String),
}

/// A standard-chess position with the query surface the fusion engine needs.
#[derive(Debug, Clone)]
pub struct Oracle {
    pos: Chess,
}

impl Default for Oracle {
    fn default() -> Self {
        Self {
            pos: Chess::default(),
        }
    }
}

impl Oracle {
    pub fn startpos() -> Self {
        Self::default()
    }

    pub fn from_fen(fen: &str) -> Result<Self, OracleError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| {
                OracleError::UnreadablePosition(e.to_string())
            })?;
        let pos = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e: PositionError<Chess>| OracleError::IllegalPosition(e.to_string()))?;
        Ok(Self { pos })
    }

    pub fn fen(&self) -> String {
        Fen(self.pos.clone().into_setup(EnPassantMode::Legal)).to_string()
    }

    /// Raw setup of this position, en-passant square kept verbatim. This is
    /// the scratch material for shadow and substitution boards.
    pub fn setup(&self) -> Setup {
        self.pos.clone().into_setup(EnPassantMode::Always)
    }

    /// Assemble a synthetic position. Material excess, orphaned castling
    /// rights, stale en-passant squares and impossible checks are all
    /// expected artifacts of secondary-shape boards and are waved through;
    /// anything else (a missing king, a pawn on a back rank) still fails.
    pub fn from_setup_relaxed(setup: Setup) -> Result<Self, OracleError> {
        Chess::from_setup(setup, CastlingMode::Standard)
            .or_else(PositionError::ignore_too_much_material)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_invalid_ep_square)
            .or_else(PositionError::ignore_impossible_check)
            .map(|pos| Self { pos })
            .map_err(|e| OracleError::IllegalPosition(e.to_string()))
    }

    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pos.board().piece_at(square)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pos.board().king_of(color)
    }

    pub fn is_check(&self) -> bool {
        self.pos.is_check()
    }

    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        let board = self.pos.board();
        board.attacks_to(square, by, board.occupied()).any()
    }

    pub fn legal_moves(&self) -> MoveList {
        self.pos.legal_moves()
    }

    pub fn moves_from(&self, from: Square) -> impl Iterator<Item = Move> {
        self.pos
            .legal_moves()
            .into_iter()
            .filter(move |m| m.from() == Some(from))
    }

    /// Look up the legal move between two squares, castling spelled either
    /// as the king's two-step or as king-onto-rook. Among promotions the
    /// queen is chosen unconditionally.
    pub fn find_move(&self, from: Square, to: Square) -> Option<Move> {
        let mut queening = None;
        for m in self.moves_from(from) {
            if !reaches(&m, to, self.turn()) {
                continue;
            }
            match m.promotion() {
                None => return Some(m),
                Some(Role::Queen) => queening = Some(m),
                Some(_) => {}
            }
        }
        queening
    }

    pub fn play(&self, m: &Move) -> Result<Self, OracleError> {
        self.pos
            .clone()
            .play(m)
            .map(|pos| Self { pos })
            .map_err(|e| OracleError::IllegalPosition(e.to_string()))
    }

    pub fn san(&self, m: &Move) -> String {
        let mut scratch = self.pos.clone();
        SanPlus::from_move_and_play_unchecked(&mut scratch, m).to_string()
    }

    pub fn halfmoves(&self) -> u32 {
        self.pos.halfmoves()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.pos.is_insufficient_material()
    }

    pub fn occupied(&self) -> Bitboard {
        self.pos.board().occupied()
    }
}

/// Where a move lands from the mover's point of view. The oracle spells
/// castling as king-onto-rook; players spell it as the king's two-step.
pub fn king_destination(m: &Move, turn: Color) -> Square {
    match m {
        Move::Castle { .. } => m
            .castling_side()
            .map(|side| side.king_to(turn))
            .unwrap_or_else(|| m.to()),
        _ => m.to(),
    }
}

fn reaches(m: &Move, to: Square, turn: Color) -> bool {
    m.to() == to || king_destination(m, turn) == to
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_fen_round_trips() {
        let oracle = Oracle::startpos();
        let fen = oracle.fen();
        assert_eq!(fen, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(Oracle::from_fen(&fen).unwrap().fen(), fen);
    }

    #[test]
    fn garbage_fen_is_refused() {
        assert!(Oracle::from_fen("not a position at all").is_err());
    }

    #[test]
    fn finds_the_double_pawn_push() {
        let oracle = Oracle::startpos();
        let m = oracle.find_move(Square::E2, Square::E4).expect("e4 exists");
        assert_eq!(m.to(), Square::E4);
        assert!(oracle.find_move(Square::E2, Square::E5).is_none());
    }

    #[test]
    fn attack_queries_see_pawns_and_knights() {
        let oracle = Oracle::startpos();
        assert!(oracle.is_square_attacked(Square::F3, Color::White));
        assert!(!oracle.is_square_attacked(Square::F3, Color::Black));
    }

    #[test]
    fn promotion_resolves_to_a_queen() {
        let oracle = Oracle::from_fen("8/4P1k1/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let m = oracle.find_move(Square::E7, Square::E8).expect("promotion");
        assert_eq!(m.promotion(), Some(Role::Queen));
    }

    #[test]
    fn relaxed_assembly_accepts_extra_queens() {
        let mut setup = Oracle::startpos().setup();
        setup.board.set_piece_at(
            Square::E4,
            Piece {
                color: Color::White,
                role: Role::Queen,
            },
        );
        setup.board.set_piece_at(
            Square::E5,
            Piece {
                color: Color::White,
                role: Role::Queen,
            },
        );
        assert!(Oracle::from_setup_relaxed(setup).is_ok());
    }
}
