//! # The jeopardy test.
//!
//! A move is legal only if, after it, the mover's king cannot be taken —
//! and in fusion chess that question has three independent halves, because
//! no single board can represent every attacker:
//!
//! 1. the **primary** position, where every piece wears its real shape;
//! 2. the **shadow** board, where fused pieces wear their secondary shape;
//! 3. the **king-substitution** board, when the opposing king itself holds
//!    a secondary capability — the oracle will not let a king square change
//!    type, so the king is swapped for its granted shape on a scratch copy.
//!
//! Any one of the three reporting the king attacked condemns the move.
//!
//! The hypothetical "after" position is produced by square-level surgery on
//! a scratch setup, created fresh per call and never retained. That keeps
//! the test independent of *which* capability carries the move, and leaves
//! every uninvolved square — fused or not — exactly as it was.

use shakmaty::{Bitboard, Color, File, Move, Piece, Rank, Role, Setup, Square, attacks};
use thiserror::Error;

use crate::fusion::{FusionMap, RoyalFusions};
use crate::game::shadow::ShadowBoard;
use crate::oracle::{Oracle, OracleError};

/// Hard failures. Everything expected — an illegal move, a bad import — has
/// its own recoverable channel; these do not.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// No square on the whole board can host a stand-in king without
    /// distorting the answer. A position this crowded and this attacked is
    /// unreachable under the ruleset, so guessing would be worse than
    /// failing.
    #[error("no unoccupied, unattacked square for a stand-in {0:?} king")]
    NoSafeSquare(Color),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Would moving `from` → `to` leave the mover's own king capturable on any
/// of the three representations?
pub(crate) fn would_jeopardize_king(
    primary: &Oracle,
    fusions: &FusionMap,
    royals: &RoyalFusions,
    from: Square,
    to: Square,
) -> Result<bool, EngineError> {
    let Some(mover) = primary.piece_at(from) else {
        return Ok(true);
    };
    let us = mover.color;

    let Some((after, fusions_after)) = after_move(primary, fusions, mover, from, to) else {
        return Ok(true);
    };
    let Some(king_sq) = after.king_square(us) else {
        return Ok(true);
    };

    if after.is_square_attacked(king_sq, !us) {
        return Ok(true);
    }

    let shadow = ShadowBoard::rebuild(&after, &fusions_after)?;
    if shadow.oracle().is_square_attacked(king_sq, !us) {
        return Ok(true);
    }

    if let Some(shape) = royals.get(!us) {
        if royal_shape_attacks(&after, !us, shape, king_sq)? {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Castling gets one extra rule the oracle cannot supply: the king must not
/// pass *through* a square attacked on the shadow board either. The primary
/// squares are re-checked alongside for symmetry; the oracle has already
/// enforced them when it generated the move.
pub(crate) fn castle_transit_is_safe(primary: &Oracle, shadow: &ShadowBoard, m: &Move) -> bool {
    let Move::Castle { king, .. } = m else {
        return true;
    };
    let us = primary.turn();
    let Some(side) = m.castling_side() else {
        return true;
    };
    let king_to = side.king_to(us);
    let path = attacks::between(*king, king_to).with(*king).with(king_to);
    for sq in path {
        if primary.is_square_attacked(sq, !us) || shadow.oracle().is_square_attacked(sq, !us) {
            return false;
        }
    }
    true
}

/// Occupancy-level application of `from` → `to`: enough board truth to ask
/// who attacks whom afterwards, regardless of which capability carries the
/// move. Castling relocates the rook, en passant removes the bypassed pawn,
/// a promoting pawn lands as a queen. Returns the position and the fusion
/// table as they would stand after the move.
fn after_move(
    primary: &Oracle,
    fusions: &FusionMap,
    mover: Piece,
    from: Square,
    to: Square,
) -> Option<(Oracle, FusionMap)> {
    let mut setup = primary.setup();
    let mut fusions = fusions.clone();

    setup.board.discard_piece_at(from);

    let pawn_shaped = mover.role == Role::Pawn || fusions.get(from) == Some(Role::Pawn);
    if pawn_shaped && setup.board.piece_at(to).is_none() && setup.ep_square == Some(to) {
        let bypassed = Square::from_coords(to.file(), from.rank());
        setup.board.discard_piece_at(bypassed);
        fusions.remove(bypassed);
    }

    // a two-file king step is castling only while the right is live; a
    // rook-granted king slides the same way without moving any rook
    if mover.role == Role::King
        && from.rank() == to.rank()
        && (from.file() as i32 - to.file() as i32).abs() == 2
    {
        let (rook_from_file, rook_to_file) = if to.file() > from.file() {
            (File::H, File::F)
        } else {
            (File::A, File::D)
        };
        let rook_from = Square::from_coords(rook_from_file, from.rank());
        let rook_to = Square::from_coords(rook_to_file, from.rank());
        if setup.castling_rights.contains(rook_from)
            && let Some(rook) = setup.board.piece_at(rook_from)
        {
            setup.board.discard_piece_at(rook_from);
            setup.board.set_piece_at(rook_to, rook);
            fusions.migrate(rook_from, rook_to);
        }
    }

    let landing = if mover.role == Role::Pawn && matches!(to.rank(), Rank::First | Rank::Eighth) {
        Role::Queen
    } else {
        mover.role
    };
    setup.board.set_piece_at(
        to,
        Piece {
            color: mover.color,
            role: landing,
        },
    );

    fusions.migrate(from, to);

    setup.turn = !mover.color;
    setup.ep_square = None;
    setup.castling_rights.discard(from);
    setup.castling_rights.discard(to);

    let after = Oracle::from_setup_relaxed(setup).ok()?;
    Some((after, fusions))
}

/// Would `owner`'s king, wearing `shape`, attack `target`? Asked on a
/// scratch copy where the king square holds the granted shape and a
/// stand-in king is parked where it can neither block the sightline under
/// question nor stand next to `target`.
pub(crate) fn royal_shape_attacks(
    position: &Oracle,
    owner: Color,
    shape: Role,
    target: Square,
) -> Result<bool, EngineError> {
    let Some(king_sq) = position.king_square(owner) else {
        return Ok(false);
    };

    let mut setup = position.setup();
    setup.castling_rights = Bitboard::EMPTY;
    setup.ep_square = None;
    setup.board.discard_piece_at(king_sq);
    setup.board.set_piece_at(
        king_sq,
        Piece {
            color: owner,
            role: shape,
        },
    );

    let keep_clear = attacks::between(king_sq, target)
        .with(target)
        | attacks::king_attacks(target);
    insert_placeholder_king(&mut setup, owner, keep_clear)?;

    let scratch = Oracle::from_setup_relaxed(setup)?;
    Ok(scratch.is_square_attacked(target, owner))
}

/// Park a stand-in king for `color` on the first square where it cannot
/// distort the answer the caller is about to ask for: unoccupied, outside
/// `keep_clear`, and not attacked by the other side. The scan is
/// deterministic; running out of squares is a hard failure, not a cue to
/// guess.
pub(crate) fn insert_placeholder_king(
    setup: &mut Setup,
    color: Color,
    keep_clear: Bitboard,
) -> Result<Square, EngineError> {
    let occupied = setup.board.occupied();
    for sq in Square::ALL {
        if occupied.contains(sq) || keep_clear.contains(sq) {
            continue;
        }
        if setup.board.attacks_to(sq, !color, occupied).any() {
            continue;
        }
        setup.board.set_piece_at(
            sq,
            Piece {
                color,
                role: Role::King,
            },
        );
        return Ok(sq);
    }
    Err(EngineError::NoSafeSquare(color))
}
