//! # Executing a move.
//!
//! One entry point, [`apply`], turns a pair of squares into either a new
//! compound state or a refusal. The pipeline is strictly ordered:
//!
//! 1. sanity — a piece of the side to move must stand on the source square;
//! 2. capability probes — the piece's own shape on the primary board first,
//!    then its secondary shape on the shadow board, then the royal channel
//!    for a fused king. The first shape that reaches the target carries the
//!    move; each probe is a plain lookup, never an unwound error;
//! 3. the jeopardy gate — before anything mutates, the move must clear the
//!    three-board king-safety test (and, for castling, the transit test);
//! 4. bookkeeping — the victim's fusion entry dies with it, the mover's
//!    entry follows it, the capture verdict is applied, and any secondary
//!    now swallowed by its own piece's shape is pruned.
//!
//! Nothing here touches the live game. `apply` returns a [`Transition`]
//! holding the would-be next state; the caller commits it whole or not at
//! all, so a rejected move can never leave a half-advanced position behind.

use shakmaty::{Move, Piece, Role, Square};
use strum::{Display, EnumIs};
use thiserror::Error;

use crate::fusion::capture::{self, FusionVerdict};
use crate::fusion::{FusionMap, RoyalFusions, subsumes};
use crate::game::legality::{self, EngineError};
use crate::game::royal;
use crate::game::shadow::ShadowBoard;
use crate::oracle::{Oracle, king_destination};

/// Which capability carried a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIs)]
#[strum(serialize_all = "lowercase")]
pub enum MoveChannel {
    /// The piece's own shape, judged by the oracle directly.
    Primary,
    /// The secondary shape of a fused piece, judged on the shadow board.
    Fused,
    /// The granted shape of a fused king, judged by substitution.
    Royal,
}

/// Expected refusals. These are ordinary control flow, not failures: an
/// illegal request leaves the engine exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no piece on the source square")]
    EmptySquare,
    #[error("the piece on the source square is not the mover's")]
    OutOfTurn,
    #[error("no capability of this piece reaches the target square")]
    Unreachable,
    #[error("the move would leave the king capturable")]
    SelfCheck,
}

#[derive(Debug, Clone, Error)]
pub enum MoveFailure {
    #[error("move rejected: {0}")]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What a committed move looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub from: Square,
    pub to: Square,
    pub channel: MoveChannel,
    /// Real (primary) shape of the captured piece, if any.
    pub capture: Option<Role>,
    /// SAN for primary moves; fused-capability moves are written as
    /// `<shape><from>[x]<to>~`.
    pub notation: String,
}

/// One legal destination offered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateMove {
    pub from: Square,
    pub to: Square,
    pub channel: MoveChannel,
    pub capture: Option<Role>,
}

/// The whole next compound state, computed but not yet committed.
pub(crate) struct Transition {
    pub primary: Oracle,
    pub fusions: FusionMap,
    pub royals: RoyalFusions,
    pub outcome: MoveOutcome,
}

pub(crate) fn apply(
    primary: &Oracle,
    shadow: &ShadowBoard,
    fusions: &FusionMap,
    royals: &RoyalFusions,
    from: Square,
    to: Square,
) -> Result<Transition, MoveFailure> {
    let mover = primary.piece_at(from).ok_or(Rejection::EmptySquare)?;
    if mover.color != primary.turn() {
        return Err(Rejection::OutOfTurn.into());
    }

    // a same-colored piece on the target is never a victim (castling spelled
    // as king-onto-rook lands here)
    let victim = primary.piece_at(to).filter(|p| p.color != mover.color);
    let victim_secondary = victim.and_then(|_| fusions.get(to));

    let verdict = match victim {
        Some(v) if mover.role != Role::King => {
            capture::piece_verdict(mover.role, fusions.get(from), v.role, victim_secondary)
        }
        _ => FusionVerdict::Plain,
    };

    if let Some(own_move) = primary.find_move(from, to) {
        // rook↔bishop cross-capture promotes the capturer in place; the
        // already-validated move is re-derived against the combined shape
        let (probe_board, m) = if verdict == FusionVerdict::PromoteToQueen {
            let mut setup = primary.setup();
            setup.board.set_piece_at(
                from,
                Piece {
                    color: mover.color,
                    role: Role::Queen,
                },
            );
            let rewritten = Oracle::from_setup_relaxed(setup).map_err(EngineError::from)?;
            match rewritten.find_move(from, to) {
                Some(m) => (rewritten, m),
                None => (primary.clone(), own_move),
            }
        } else {
            (primary.clone(), own_move)
        };
        return primary_transition(
            primary,
            &probe_board,
            shadow,
            fusions,
            royals,
            mover,
            verdict,
            victim,
            victim_secondary,
            &m,
        );
    }

    if mover.role != Role::King {
        if let Some(shape) = fusions.get(from) {
            if let Some(m) = shadow.oracle().find_move(from, to) {
                return fused_transition(
                    primary, shadow, fusions, royals, mover, shape, verdict, victim,
                    victim_secondary, &m,
                );
            }
        }
    }

    if mover.role == Role::King && royals.get(mover.color).is_some() {
        let reachable = royal::royal_moves(primary, royals, from)
            .map_err(EngineError::from)?
            .into_iter()
            .any(|m| m.to() == to);
        if reachable {
            return royal_transition(primary, fusions, royals, mover, victim, victim_secondary, from, to);
        }
    }

    Err(Rejection::Unreachable.into())
}

#[allow(clippy::too_many_arguments)]
fn primary_transition(
    primary: &Oracle,
    probe_board: &Oracle,
    shadow: &ShadowBoard,
    fusions: &FusionMap,
    royals: &RoyalFusions,
    mover: Piece,
    verdict: FusionVerdict,
    victim: Option<Piece>,
    victim_secondary: Option<Role>,
    m: &Move,
) -> Result<Transition, MoveFailure> {
    let to = king_destination(m, mover.color);

    if m.is_castle() && !legality::castle_transit_is_safe(primary, shadow, m) {
        return Err(Rejection::SelfCheck.into());
    }
    if legality::would_jeopardize_king(primary, fusions, royals, m.from().unwrap_or(to), to)
        .map_err(EngineError::from)?
    {
        return Err(Rejection::SelfCheck.into());
    }

    let notation = probe_board.san(m);
    let next_primary = probe_board.play(m).map_err(EngineError::from)?;

    let mut next_fusions = fusions.clone();
    let mut next_royals = royals.clone();
    let from = m.from().unwrap_or(to);

    if let Move::EnPassant { from: pawn_from, to: pawn_to } = m {
        next_fusions.remove(Square::from_coords(pawn_to.file(), pawn_from.rank()));
    }
    if let Move::Castle { rook, .. } = m {
        if let Some(side) = m.castling_side() {
            next_fusions.migrate(*rook, side.rook_to(mover.color));
        }
    }
    next_fusions.migrate(from, to);

    settle_capture(
        mover,
        verdict,
        victim,
        victim_secondary,
        to,
        &mut next_fusions,
        &mut next_royals,
    );
    prune_subsumed(&next_primary, to, &mut next_fusions);

    let capture = captured_shape(victim, m);
    log::debug!("{from}{to} carried by the primary shape ({notation})");

    Ok(Transition {
        primary: next_primary,
        fusions: next_fusions,
        royals: next_royals,
        outcome: MoveOutcome {
            from,
            to,
            channel: MoveChannel::Primary,
            capture,
            notation,
        },
    })
}

#[allow(clippy::too_many_arguments)]
fn fused_transition(
    primary: &Oracle,
    shadow: &ShadowBoard,
    fusions: &FusionMap,
    royals: &RoyalFusions,
    mover: Piece,
    shape: Role,
    verdict: FusionVerdict,
    victim: Option<Piece>,
    victim_secondary: Option<Role>,
    m: &Move,
) -> Result<Transition, MoveFailure> {
    let from = m.from().unwrap_or_else(|| m.to());
    let to = m.to();

    if legality::would_jeopardize_king(primary, fusions, royals, from, to)
        .map_err(EngineError::from)?
    {
        return Err(Rejection::SelfCheck.into());
    }

    let shadow_after = shadow.oracle().play(m).map_err(EngineError::from)?;
    let next_primary = graft_movement(
        primary,
        &shadow_after,
        m,
        mover,
        verdict == FusionVerdict::PromoteToQueen,
    )
    .map_err(EngineError::from)?;

    let mut next_fusions = fusions.clone();
    let mut next_royals = royals.clone();

    if let Move::EnPassant { from: pawn_from, to: pawn_to } = m {
        next_fusions.remove(Square::from_coords(pawn_to.file(), pawn_from.rank()));
    }
    next_fusions.migrate(from, to);

    settle_capture(
        mover,
        verdict,
        victim,
        victim_secondary,
        to,
        &mut next_fusions,
        &mut next_royals,
    );
    prune_subsumed(&next_primary, to, &mut next_fusions);

    let capture = captured_shape(victim, m);
    let notation = fused_notation(shape, from, to, capture.is_some());
    log::debug!("{from}{to} carried by the fused {shape:?} shape");

    Ok(Transition {
        primary: next_primary,
        fusions: next_fusions,
        royals: next_royals,
        outcome: MoveOutcome {
            from,
            to,
            channel: MoveChannel::Fused,
            capture,
            notation,
        },
    })
}

fn royal_transition(
    primary: &Oracle,
    fusions: &FusionMap,
    royals: &RoyalFusions,
    mover: Piece,
    victim: Option<Piece>,
    victim_secondary: Option<Role>,
    from: Square,
    to: Square,
) -> Result<Transition, MoveFailure> {
    if legality::would_jeopardize_king(primary, fusions, royals, from, to)
        .map_err(EngineError::from)?
    {
        return Err(Rejection::SelfCheck.into());
    }

    let next_primary = royal::apply_royal(primary, mover, from, to).map_err(EngineError::from)?;

    let mut next_fusions = fusions.clone();
    let mut next_royals = royals.clone();
    next_fusions.remove(to);

    settle_capture(
        mover,
        FusionVerdict::Plain,
        victim,
        victim_secondary,
        to,
        &mut next_fusions,
        &mut next_royals,
    );

    let capture = victim.map(|p| p.role);
    let shape = royals.get(mover.color).unwrap_or(Role::King);
    let notation = fused_notation(shape, from, to, capture.is_some());
    log::debug!("{from}{to} carried by the royal {shape:?} grant");

    Ok(Transition {
        primary: next_primary,
        fusions: next_fusions,
        royals: next_royals,
        outcome: MoveOutcome {
            from,
            to,
            channel: MoveChannel::Royal,
            capture,
            notation,
        },
    })
}

/// Carry a shadow-board move back onto the primary position: only the
/// squares the move touches change, every uninvolved square — fused or not —
/// keeps its primary occupant. Turn, en-passant square and counters are
/// taken from the played-out shadow board, which saw the move as an ordinary
/// one.
fn graft_movement(
    primary: &Oracle,
    shadow_after: &Oracle,
    m: &Move,
    mover: Piece,
    land_as_queen: bool,
) -> Result<Oracle, crate::oracle::OracleError> {
    let mut setup = primary.setup();

    match m {
        Move::Normal { from, to, promotion, .. } => {
            setup.board.discard_piece_at(*from);
            let role = if promotion.is_some() || land_as_queen {
                Role::Queen
            } else {
                mover.role
            };
            setup.board.set_piece_at(
                *to,
                Piece {
                    color: mover.color,
                    role,
                },
            );
            setup.castling_rights.discard(*from);
            setup.castling_rights.discard(*to);
        }
        Move::EnPassant { from, to } => {
            setup.board.discard_piece_at(*from);
            setup
                .board
                .discard_piece_at(Square::from_coords(to.file(), from.rank()));
            setup.board.set_piece_at(*to, mover);
        }
        // castling and drops cannot come off the shadow board
        _ => {}
    }

    let after = shadow_after.setup();
    setup.turn = after.turn;
    setup.ep_square = after.ep_square;
    setup.halfmoves = after.halfmoves;
    setup.fullmoves = after.fullmoves;

    Oracle::from_setup_relaxed(setup)
}

/// Apply the capture verdict to the tables. Kings route through their own
/// grant rules and never take map entries; everyone else records on the
/// square they landed on.
fn settle_capture(
    mover: Piece,
    verdict: FusionVerdict,
    victim: Option<Piece>,
    victim_secondary: Option<Role>,
    to: Square,
    fusions: &mut FusionMap,
    royals: &mut RoyalFusions,
) {
    let Some(victim) = victim else {
        return;
    };

    if mover.role == Role::King {
        if let Some(grant) = capture::king_verdict(royals.get(mover.color), victim.role, victim_secondary)
        {
            royals.grant(mover.color, grant);
        }
        return;
    }

    match verdict {
        FusionVerdict::Plain => {}
        FusionVerdict::Fuse(secondary) => fusions.set(to, secondary),
        FusionVerdict::PromoteToQueen => {
            fusions.remove(to);
        }
    }
}

/// Drop a secondary that the piece's own shape now covers (a promoted
/// piece swallowing its old capability, a queen swallowing a pawn grant).
fn prune_subsumed(primary_after: &Oracle, to: Square, fusions: &mut FusionMap) {
    if let (Some(piece), Some(secondary)) = (primary_after.piece_at(to), fusions.get(to)) {
        if subsumes(piece.role, secondary) {
            fusions.remove(to);
        }
    }
}

fn captured_shape(victim: Option<Piece>, m: &Move) -> Option<Role> {
    victim
        .map(|p| p.role)
        .or_else(|| m.is_en_passant().then_some(Role::Pawn))
}

fn fused_notation(shape: Role, from: Square, to: Square, is_capture: bool) -> String {
    if is_capture {
        format!("{}{from}x{to}~", shape.upper_char())
    } else {
        format!("{}{from}{to}~", shape.upper_char())
    }
}
