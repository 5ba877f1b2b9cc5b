//! # The playable engine.
//!
//! [`FusionGame`] is the single public surface: a primary oracle position,
//! the two fusion tables, the derived shadow board and the move log, mutated
//! only through whole-move operations. Callers never receive a reference
//! into the compound state — every mutation either commits the full next
//! state (primary, tables, shadow, history together) or leaves everything
//! untouched.

pub mod executor;
pub mod history;
pub mod legality;
pub mod royal;
pub mod shadow;

use serde::Serialize;
use shakmaty::{Color, Role, Square};
use thiserror::Error;

use crate::fusion::{FusionMap, RoyalFusions};
use crate::notation::color_char;
use crate::notation::export::{ExportParseError, FusionEntry, StateString};
use crate::oracle::{Oracle, king_destination};

use executor::{CandidateMove, MoveChannel, MoveFailure, MoveOutcome};
use history::{History, MoveRecord};
use legality::EngineError;
use shadow::ShadowBoard;

/// Why an incoming state string was refused. Distinct from a rejected move:
/// imports carry a reason the caller can show to a person.
#[derive(Debug, Clone, Error)]
pub enum ImportError {
    #[error("position part rejected: {0}")]
    Position(String),
    #[error("fusion entries rejected: {0}")]
    Entries(String),
    #[error("fusion entry {entry:?} does not match the position")]
    Mismatch { entry: String },
    #[error("fusion entries do not assemble into a coherent secondary board")]
    InconsistentShadow,
}

/// Named read-only view of the compound state, for rendering and debugging.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub fen: String,
    pub virtual_fen: String,
    pub fused: Vec<FusedSquare>,
    pub royal: Vec<RoyalGrant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FusedSquare {
    pub square: String,
    pub piece: char,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoyalGrant {
    pub color: char,
    pub piece: char,
}

/// A game of fusion chess.
#[derive(Debug, Clone)]
pub struct FusionGame {
    primary: Oracle,
    shadow: ShadowBoard,
    fusions: FusionMap,
    royals: RoyalFusions,
    history: History,
    /// Exported state the game started from; `reset` and a bare `undo`
    /// return here.
    start: String,
}

impl Default for FusionGame {
    fn default() -> Self {
        Self::new()
    }
}

impl FusionGame {
    pub fn new() -> Self {
        let primary = Oracle::startpos();
        let fusions = FusionMap::new();
        let royals = RoyalFusions::default();
        let shadow = ShadowBoard::rebuild(&primary, &fusions)
            .unwrap_or_else(|_| ShadowBoard::mirror(&primary));
        let mut game = Self {
            primary,
            shadow,
            fusions,
            royals,
            history: History::default(),
            start: String::new(),
        };
        game.start = game.export();
        game
    }

    pub fn from_export(text: &str) -> Result<Self, ImportError> {
        let mut game = Self::new();
        game.import(text)?;
        Ok(game)
    }

    /// Apply a move request. On success the whole compound state advances
    /// and a record is appended; on rejection nothing changes.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Result<MoveOutcome, MoveFailure> {
        let next = executor::apply(
            &self.primary,
            &self.shadow,
            &self.fusions,
            &self.royals,
            from,
            to,
        )?;
        let shadow = ShadowBoard::rebuild(&next.primary, &next.fusions).map_err(EngineError::from)?;

        self.primary = next.primary;
        self.fusions = next.fusions;
        self.royals = next.royals;
        self.shadow = shadow;
        let state = self.export();
        self.history.push(next.outcome.notation.clone(), state);
        Ok(next.outcome)
    }

    /// Every legal destination for the side to move, all capability channels
    /// combined, already filtered through the jeopardy test. Pass a square
    /// to restrict to one piece.
    pub fn legal_moves(&self, square: Option<Square>) -> Result<Vec<CandidateMove>, EngineError> {
        match square {
            Some(sq) => self.moves_of(sq),
            None => {
                let mut all = Vec::new();
                for sq in Square::ALL {
                    if self
                        .primary
                        .piece_at(sq)
                        .is_some_and(|p| p.color == self.primary.turn())
                    {
                        all.extend(self.moves_of(sq)?);
                    }
                }
                Ok(all)
            }
        }
    }

    /// Destinations reachable only through a secondary capability — what a
    /// board renderer highlights when hovering a fused piece or king.
    pub fn fused_moves(&self, square: Square) -> Result<Vec<CandidateMove>, EngineError> {
        Ok(self
            .moves_of(square)?
            .into_iter()
            .filter(|c| !c.channel.is_primary())
            .collect())
    }

    fn moves_of(&self, from: Square) -> Result<Vec<CandidateMove>, EngineError> {
        let Some(piece) = self.primary.piece_at(from) else {
            return Ok(Vec::new());
        };
        if piece.color != self.primary.turn() {
            return Ok(Vec::new());
        }

        // raw candidates per channel; the primary channel keeps its oracle
        // move around for the castling transit test
        let mut raw: Vec<(CandidateMove, Option<shakmaty::Move>)> = Vec::new();
        for m in self.primary.moves_from(from) {
            let to = king_destination(&m, piece.color);
            let capture = match &m {
                shakmaty::Move::Castle { .. } => None,
                m => self
                    .primary
                    .piece_at(m.to())
                    .map(|p| p.role)
                    .or_else(|| m.is_en_passant().then_some(Role::Pawn)),
            };
            raw.push((
                CandidateMove {
                    from,
                    to,
                    channel: MoveChannel::Primary,
                    capture,
                },
                Some(m),
            ));
        }
        if piece.role != Role::King && self.fusions.contains(from) {
            for m in self.shadow.oracle().moves_from(from) {
                raw.push((
                    CandidateMove {
                        from,
                        to: m.to(),
                        channel: MoveChannel::Fused,
                        capture: self.primary.piece_at(m.to()).map(|p| p.role),
                    },
                    None,
                ));
            }
        }
        if piece.role == Role::King && self.royals.get(piece.color).is_some() {
            for m in royal::royal_moves(&self.primary, &self.royals, from)? {
                raw.push((
                    CandidateMove {
                        from,
                        to: m.to(),
                        channel: MoveChannel::Royal,
                        capture: self.primary.piece_at(m.to()).map(|p| p.role),
                    },
                    None,
                ));
            }
        }

        let mut out: Vec<CandidateMove> = Vec::new();
        for (cand, castle) in raw {
            if out
                .iter()
                .any(|c| c.to == cand.to && c.channel == cand.channel)
            {
                continue;
            }
            if let Some(m) = &castle {
                if m.is_castle() && !legality::castle_transit_is_safe(&self.primary, &self.shadow, m)
                {
                    continue;
                }
            }
            if legality::would_jeopardize_king(
                &self.primary,
                &self.fusions,
                &self.royals,
                from,
                cand.to,
            )? {
                continue;
            }
            out.push(cand);
        }
        Ok(out)
    }

    /// Is the side to move in check on *any* representation?
    pub fn is_check(&self) -> Result<bool, EngineError> {
        let us = self.primary.turn();
        let Some(king_sq) = self.primary.king_square(us) else {
            return Ok(false);
        };
        if self.primary.is_square_attacked(king_sq, !us)
            || self.shadow.oracle().is_square_attacked(king_sq, !us)
        {
            return Ok(true);
        }
        if let Some(shape) = self.royals.get(!us) {
            return legality::royal_shape_attacks(&self.primary, !us, shape, king_sq);
        }
        Ok(false)
    }

    pub fn is_checkmate(&self) -> Result<bool, EngineError> {
        Ok(self.is_check()? && self.legal_moves(None)?.is_empty())
    }

    pub fn is_stalemate(&self) -> Result<bool, EngineError> {
        Ok(!self.is_check()? && self.legal_moves(None)?.is_empty())
    }

    /// Stalemate, the 50-move rule, threefold repetition, or bare-board
    /// insufficient material. The oracle's material verdict is only trusted
    /// while no fusions exist — a lone fused minor can still deliver mate.
    pub fn is_draw(&self) -> Result<bool, EngineError> {
        if self.is_stalemate()? {
            return Ok(true);
        }
        if self.primary.halfmoves() >= 100 {
            return Ok(true);
        }
        if self.fusions.is_empty()
            && self.royals.is_empty()
            && self.primary.is_insufficient_material()
        {
            return Ok(true);
        }
        Ok(self.is_threefold())
    }

    pub fn is_game_over(&self) -> Result<bool, EngineError> {
        Ok(self.is_checkmate()? || self.is_draw()?)
    }

    fn is_threefold(&self) -> bool {
        let current = normalized(&self.export());
        let seen = std::iter::once(self.start.as_str())
            .chain(self.history.records().iter().map(|r| r.state.as_str()))
            .filter(|state| normalized(state) == current)
            .count();
        seen >= 3
    }

    pub fn turn(&self) -> Color {
        self.primary.turn()
    }

    pub fn fen(&self) -> String {
        self.primary.fen()
    }

    pub fn fusion_at(&self, square: Square) -> Option<Role> {
        self.fusions.get(square)
    }

    pub fn royal_fusion(&self, color: Color) -> Option<Role> {
        self.royals.get(color)
    }

    pub fn history(&self) -> &[MoveRecord] {
        self.history.records()
    }

    /// The canonical portable form of the whole compound state.
    pub fn export(&self) -> String {
        let entries = self
            .fusions
            .iter()
            .map(|(square, secondary)| FusionEntry::Board { square, secondary })
            .chain(
                self.royals
                    .iter()
                    .map(|(color, secondary)| FusionEntry::Royal { color, secondary }),
            )
            .collect();
        StateString {
            position: self.primary.fen(),
            entries,
        }
        .to_string()
    }

    /// Replace the whole compound state with an imported one. Fully
    /// validated before anything is committed: the position through the
    /// oracle, every entry against the board, and the trial shadow board as
    /// a whole. On success the history is cleared and the start state
    /// rebound.
    pub fn import(&mut self, text: &str) -> Result<(), ImportError> {
        self.load_state(text)?;
        self.history.clear();
        self.start = self.export();
        Ok(())
    }

    /// Pop the latest move and reload the state before it. With an empty
    /// log this is a full reset. Returns the undone record, if any.
    pub fn undo(&mut self) -> Result<Option<MoveRecord>, ImportError> {
        let Some(undone) = self.history.pop() else {
            self.reset();
            return Ok(None);
        };
        let target = self
            .history
            .last_state()
            .map(str::to_string)
            .unwrap_or_else(|| self.start.clone());
        self.load_state(&target)?;
        Ok(Some(undone))
    }

    /// Back to the start state (initial position or last successful import),
    /// history cleared, fusion tables as the start state had them.
    pub fn reset(&mut self) {
        let start = self.start.clone();
        if self.load_state(&start).is_ok() {
            self.history.clear();
        } else {
            // the bound start state was validated when it was bound; if it
            // rots anyway, a fresh game beats a poisoned one
            *self = Self::new();
        }
    }

    /// Eviction hook for a stale fusion entry the presentation layer found
    /// (its piece vanished through some out-of-band effect). Returns whether
    /// an entry was actually evicted. The rebuild skips stale entries
    /// anyway; this merely makes the forgetting explicit.
    pub fn report_missing_fused_piece(&mut self, square: Square) -> bool {
        if !self.fusions.contains(square) || self.primary.piece_at(square).is_some() {
            return false;
        }
        self.fusions.remove(square);
        log::debug!("evicted stale fusion entry on {square}");
        if let Ok(shadow) = ShadowBoard::rebuild(&self.primary, &self.fusions) {
            self.shadow = shadow;
        }
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            fen: self.primary.fen(),
            virtual_fen: self.shadow.oracle().fen(),
            fused: self
                .fusions
                .iter()
                .map(|(square, secondary)| FusedSquare {
                    square: square.to_string(),
                    piece: secondary.char(),
                })
                .collect(),
            royal: self
                .royals
                .iter()
                .map(|(color, secondary)| RoyalGrant {
                    color: color_char(color),
                    piece: secondary.char(),
                })
                .collect(),
        }
    }

    /// Validate and swap in a state string, leaving history and start state
    /// alone — `import` and `undo` dress this differently.
    fn load_state(&mut self, text: &str) -> Result<(), ImportError> {
        let parsed = StateString::parse(text).map_err(|e| match e {
            ExportParseError::MissingSeparator => ImportError::Position(text.to_string()),
            ExportParseError::BadEntries(entries) => ImportError::Entries(entries),
        })?;

        let primary =
            Oracle::from_fen(&parsed.position).map_err(|e| ImportError::Position(e.to_string()))?;

        let mut fusions = FusionMap::new();
        let mut royals = RoyalFusions::default();
        for entry in &parsed.entries {
            match *entry {
                FusionEntry::Board { square, secondary } => match primary.piece_at(square) {
                    Some(p) if p.role != Role::King => fusions.set(square, secondary),
                    _ => {
                        return Err(ImportError::Mismatch {
                            entry: entry.to_string(),
                        });
                    }
                },
                FusionEntry::Royal { color, secondary } => royals.grant(color, secondary),
            }
        }

        let shadow = ShadowBoard::rebuild(&primary, &fusions)
            .map_err(|_| ImportError::InconsistentShadow)?;

        self.primary = primary;
        self.fusions = fusions;
        self.royals = royals;
        self.shadow = shadow;
        Ok(())
    }
}

/// Position identity for repetition counting: board, turn, castling and
/// en-passant fields plus the fusion entries; move counters excluded.
fn normalized(state: &str) -> String {
    let parts: Vec<&str> = state.split(' ').collect();
    if parts.len() < 7 {
        return state.to_string();
    }
    format!(
        "{} {} {} {} {}",
        parts[0], parts[1], parts[2], parts[3], parts[6]
    )
}
