//! What a capture grants.
//!
//! Pure decisions, no board access: given the shapes on both sides of a
//! capture, say what the capturer walks away with. The rules, in the order
//! they are checked:
//!
//! 1. Any shared shape between the two parties means a flat capture — you
//!    gain nothing from movement you already have.
//! 2. A rook taking a bishop (or the reverse) does not record a secondary;
//!    the union of those movements *is* the queen, so the piece is promoted
//!    in place instead.
//! 3. Otherwise the victim offers its secondary and its primary shape; the
//!    stronger one that is not already covered by the capturer is recorded.
//!    Equal strength resolves toward the newer capability, the victim's
//!    secondary.
//!
//! Kings follow their own variant of rule 3: pawns are never granted, a
//! queen grant is final, and a rook/bishop pairing across old and new grant
//! merges into a queen.

use shakmaty::Role;

use super::{strength, subsumes};

/// Outcome of the fusion rules for one capture by a non-king piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionVerdict {
    /// Plain capture; any capability the capturer already held rides along.
    Plain,
    /// The destination square records this secondary capability.
    Fuse(Role),
    /// Rook↔bishop cross-capture: the capturer itself becomes a queen.
    PromoteToQueen,
}

pub fn piece_verdict(
    capturer: Role,
    capturer_secondary: Option<Role>,
    victim: Role,
    victim_secondary: Option<Role>,
) -> FusionVerdict {
    let mine = [Some(capturer), capturer_secondary];
    let theirs = [Some(victim), victim_secondary];

    if theirs
        .iter()
        .flatten()
        .any(|t| mine.iter().flatten().any(|m| m == t))
    {
        return FusionVerdict::Plain;
    }

    if rook_bishop_pair(capturer, victim) {
        return FusionVerdict::PromoteToQueen;
    }

    // newest first, so equal strength resolves toward the newer capability
    let best = [victim_secondary, Some(victim)]
        .into_iter()
        .flatten()
        .filter(|gain| !mine.iter().flatten().any(|m| subsumes(*m, *gain)))
        .reduce(|keep, next| if strength(next) > strength(keep) { next } else { keep });

    match best {
        None => FusionVerdict::Plain,
        Some(gain) if capturer_secondary.is_some_and(|held| rook_bishop_pair(held, gain)) => {
            FusionVerdict::Fuse(Role::Queen)
        }
        Some(gain) => FusionVerdict::Fuse(gain),
    }
}

/// What a capturing king is granted, if anything. `None` is a flat capture.
pub fn king_verdict(
    current: Option<Role>,
    victim: Role,
    victim_secondary: Option<Role>,
) -> Option<Role> {
    if current == Some(Role::Queen) {
        return None;
    }

    let candidate = [victim_secondary, Some(victim)]
        .into_iter()
        .flatten()
        .filter(|gain| *gain != Role::King)
        .reduce(|keep, next| if strength(next) > strength(keep) { next } else { keep })?;

    if candidate == Role::Pawn || current == Some(candidate) {
        return None;
    }
    if current.is_some_and(|held| rook_bishop_pair(held, candidate)) {
        return Some(Role::Queen);
    }
    Some(candidate)
}

fn rook_bishop_pair(a: Role, b: Role) -> bool {
    matches!((a, b), (Role::Rook, Role::Bishop) | (Role::Bishop, Role::Rook))
}
