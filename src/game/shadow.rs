//! # The shadow board.
//!
//! A second oracle position derived from the primary one, in which every
//! fused square wears its *secondary* shape instead of its real one. All
//! secondary-capability questions — "may this knight slide like the bishop
//! it ate", "does that fused pawn pin my queen" — are standard-chess
//! questions on this board, which is the whole point: the oracle answers
//! them without ever hearing about fusion.
//!
//! The shadow is never mutated in place. It is a pure function of primary
//! position and fusion table and is rebuilt after every change to either.

use shakmaty::{Bitboard, Piece, Rank, Role};

use crate::fusion::FusionMap;
use crate::oracle::{Oracle, OracleError};

#[derive(Debug, Clone)]
pub struct ShadowBoard {
    oracle: Oracle,
}

impl ShadowBoard {
    /// Derive the shadow of `primary` under `fusions`.
    ///
    /// Entries whose square no longer holds a piece are *skipped*, not
    /// removed — eviction is an explicit operation owned by the caller, a
    /// rebuild must not mutate its inputs. King squares are never rewritten
    /// (the oracle refuses a board where a king acts as another piece; the
    /// royal channel handles those), and a pawn shape is never written onto
    /// a back rank the oracle would reject — it could make no move from
    /// there anyway.
    pub fn rebuild(primary: &Oracle, fusions: &FusionMap) -> Result<Self, OracleError> {
        let mut setup = primary.setup();
        // secondary shapes sever the rook identity castling depends on
        setup.castling_rights = Bitboard::EMPTY;

        for (square, secondary) in fusions.iter() {
            let Some(piece) = primary.piece_at(square) else {
                log::debug!("stale fusion entry on {square}: occupant gone, skipping");
                continue;
            };
            if piece.role == Role::King {
                continue;
            }
            if secondary == Role::Pawn && matches!(square.rank(), Rank::First | Rank::Eighth) {
                continue;
            }
            setup.board.set_piece_at(
                square,
                Piece {
                    color: piece.color,
                    role: secondary,
                },
            );
        }

        Oracle::from_setup_relaxed(setup).map(|oracle| Self { oracle })
    }

    /// Shadow of a fusion-free position: the primary board itself.
    pub(crate) fn mirror(primary: &Oracle) -> Self {
        Self {
            oracle: primary.clone(),
        }
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{Color, Square};

    #[test]
    fn fused_squares_wear_their_secondary_shape() {
        let primary = Oracle::startpos();
        let mut fusions = FusionMap::new();
        fusions.set(Square::B1, Role::Bishop);
        let shadow = ShadowBoard::rebuild(&primary, &fusions).unwrap();
        let piece = shadow.oracle().piece_at(Square::B1).unwrap();
        assert_eq!(piece.role, Role::Bishop);
        assert_eq!(piece.color, Color::White);
        // the rest of the board is untouched
        assert_eq!(
            shadow.oracle().piece_at(Square::G1).unwrap().role,
            Role::Knight
        );
    }

    #[test]
    fn stale_entries_are_skipped_not_fatal() {
        let primary = Oracle::startpos();
        let mut fusions = FusionMap::new();
        fusions.set(Square::E5, Role::Rook);
        let shadow = ShadowBoard::rebuild(&primary, &fusions).unwrap();
        assert!(shadow.oracle().piece_at(Square::E5).is_none());
    }

    #[test]
    fn king_squares_are_never_rewritten() {
        let primary = Oracle::startpos();
        let mut fusions = FusionMap::new();
        fusions.set(Square::E1, Role::Rook);
        let shadow = ShadowBoard::rebuild(&primary, &fusions).unwrap();
        assert_eq!(
            shadow.oracle().piece_at(Square::E1).unwrap().role,
            Role::King
        );
    }

    #[test]
    fn pawn_shapes_stay_off_the_back_ranks() {
        let primary = Oracle::startpos();
        let mut fusions = FusionMap::new();
        fusions.set(Square::A1, Role::Pawn);
        let shadow = ShadowBoard::rebuild(&primary, &fusions).unwrap();
        assert_eq!(
            shadow.oracle().piece_at(Square::A1).unwrap().role,
            Role::Rook
        );
    }
}
