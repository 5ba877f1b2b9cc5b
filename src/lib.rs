//! # Modeling fusion chess.
//!
//! Fusion chess is standard chess with one twist: capturing a piece grafts
//! the victim's movement onto the capturer. A knight that takes a bishop
//! keeps moving as a knight *and* as a bishop; a king that takes a rook may
//! afterwards slide like one. A piece holds at most one such secondary
//! capability at a time, and further captures overwrite it by strength.
//!
//! Standard-chess legality is not modeled here. All of it — move generation,
//! FEN, attack detection, the basic draw rules — is delegated to the
//! [`shakmaty`] crate through the thin adapter in [`oracle`]. This crate owns
//! only what the twist adds on top:
//!
//! - [`fusion`]: which squares (and which kings) hold a secondary capability,
//!   and what a capture grants.
//! - [`game`]: the playable engine — a shadow board where fused pieces wear
//!   their secondary shape, the composite king-safety test across primary,
//!   shadow, and king-substitution boards, move execution, history and undo.
//! - [`notation`]: the portable state string, a FEN followed by the fusion
//!   assignments.
//!
//! The oracle is held by composition, never by inheritance: [`game::FusionGame`]
//! owns positions and consults them, so the rule oracle stays swappable.

pub mod fusion;
pub mod game;
pub mod notation;
pub mod oracle;

pub use game::{
    FusionGame, ImportError, Snapshot,
    executor::{CandidateMove, MoveChannel, MoveFailure, MoveOutcome, Rejection},
    history::MoveRecord,
    legality::EngineError,
};
pub use notation::export::{FusionEntry, StateString};
pub use oracle::{Oracle, OracleError};
