//! # The fused king.
//!
//! A king that captures may be *granted* a secondary capability, and that is
//! the one case the oracle flatly refuses to represent: a king square can
//! never hold another shape. So a fused king's moves are found by
//! substitution — on a disposable copy the king is swapped for its granted
//! shape, a stand-in king is parked on a harmless square (the oracle insists
//! every side has one), and the oracle's ordinary move machinery runs.
//!
//! When such a move goes through, only the *movement* is carried back: the
//! real king token is relocated by surgery and the turn flipped by hand,
//! because the disposable copy moved a rook or bishop, not a king, and its
//! own turn bookkeeping never saw a king move.

use shakmaty::{Bitboard, Color, Move, Piece, Rank, Role, Square, attacks};

use crate::fusion::RoyalFusions;
use crate::game::legality::{EngineError, insert_placeholder_king};
use crate::oracle::Oracle;

/// Moves available to the king on `from` through its granted shape alone.
/// Empty when the square does not hold a fused king.
pub(crate) fn royal_moves(
    primary: &Oracle,
    royals: &RoyalFusions,
    from: Square,
) -> Result<Vec<Move>, EngineError> {
    let Some(piece) = primary.piece_at(from) else {
        return Ok(Vec::new());
    };
    if piece.role != Role::King {
        return Ok(Vec::new());
    }
    let Some(shape) = royals.get(piece.color) else {
        return Ok(Vec::new());
    };

    let mut setup = primary.setup();
    setup.turn = piece.color;
    setup.castling_rights = Bitboard::EMPTY;
    setup.ep_square = None;
    setup.board.discard_piece_at(from);
    setup.board.set_piece_at(
        from,
        Piece {
            color: piece.color,
            role: shape,
        },
    );

    // the stand-in must not block any line the substituted shape might
    // travel, and must not sit in check or the whole movegen bends to it
    let keep_clear = attacks::queen_attacks(from, Bitboard::EMPTY)
        | attacks::knight_attacks(from)
        | attacks::king_attacks(from);
    insert_placeholder_king(&mut setup, piece.color, keep_clear)?;

    let scratch = Oracle::from_setup_relaxed(setup)?;
    Ok(scratch.moves_from(from).collect())
}

/// Relocate the real king `from` → `to` after a royal-channel move was found
/// legal: victim removed, castling rights of the moving side spent, counters
/// and turn advanced by hand.
pub(crate) fn apply_royal(
    primary: &Oracle,
    king: Piece,
    from: Square,
    to: Square,
) -> Result<Oracle, EngineError> {
    let captured = primary.piece_at(to).is_some();
    let mut setup = primary.setup();

    setup.board.discard_piece_at(from);
    setup.board.set_piece_at(to, king);

    setup.castling_rights =
        setup.castling_rights & !Bitboard::from_rank(king.color.relative_rank(Rank::First));
    setup.ep_square = None;
    setup.turn = !king.color;
    setup.halfmoves = if captured { 0 } else { setup.halfmoves + 1 };
    if king.color == Color::Black {
        setup.fullmoves = setup.fullmoves.saturating_add(1);
    }

    Ok(Oracle::from_setup_relaxed(setup)?)
}
