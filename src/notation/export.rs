//! The exported state string.
//!
//! Format: `<fen> <entry>,<entry>,...,` — the oracle's position string, a
//! single space, then every fusion assignment terminated (not separated) by
//! a comma. Board entries are a square followed by the secondary shape's
//! letter (`c3b`); royal entries key on the color instead of a square
//! (`wK=r`). A position with no fusions is the FEN plus a trailing space.
//!
//! The position part is opaque at this layer. Splitting happens at the last
//! space, so the entry list must always be present, even when empty; FEN
//! validation belongs to the oracle, entry-to-board validation to the game.

use std::fmt::{self, Display};

use chumsky::prelude::*;
use shakmaty::{Color, Role, Square};
use thiserror::Error;

use super::{Parsable, color_char};

/// One fusion assignment as it appears in a state string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionEntry {
    Board { square: Square, secondary: Role },
    Royal { color: Color, secondary: Role },
}

/// A state string pulled apart into its position and its assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateString {
    pub position: String,
    pub entries: Vec<FusionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportParseError {
    #[error("state string has no position / fusion-list separator")]
    MissingSeparator,
    #[error("unreadable fusion entry list: {0:?}")]
    BadEntries(String),
}

impl StateString {
    pub fn parse(text: &str) -> Result<Self, ExportParseError> {
        let (position, entries) = text
            .rsplit_once(' ')
            .ok_or(ExportParseError::MissingSeparator)?;
        if position.is_empty() {
            return Err(ExportParseError::MissingSeparator);
        }
        let entries = entry_list()
            .then_ignore(end())
            .parse(entries)
            .into_output()
            .ok_or_else(|| ExportParseError::BadEntries(entries.to_string()))?;
        Ok(Self {
            position: position.to_string(),
            entries,
        })
    }
}

impl Display for StateString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.position)?;
        for entry in &self.entries {
            write!(f, "{entry},")?;
        }
        Ok(())
    }
}

impl Display for FusionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Board { square, secondary } => write!(f, "{square}{}", secondary.char()),
            Self::Royal { color, secondary } => {
                write!(f, "{}K={}", color_char(color), secondary.char())
            }
        }
    }
}

impl Parsable for FusionEntry {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        choice((
            group((Color::parser(), just("K="), secondary_role()))
                .map(|(color, _, secondary)| Self::Royal { color, secondary }),
            group((Square::parser(), secondary_role()))
                .map(|(square, secondary)| Self::Board { square, secondary }),
        ))
    }
}

/// Entry list with its terminating commas. Zero entries parse as an empty
/// list, matching the bare `<fen> ` form of a fusion-free position.
pub fn entry_list<'s>() -> impl Parser<'s, &'s str, Vec<FusionEntry>> {
    FusionEntry::parser()
        .then_ignore(just(','))
        .repeated()
        .collect()
}

/// The alphabet of grantable shapes. Kings are never a secondary capability,
/// so `k` is not a legal letter here.
fn secondary_role<'s>() -> impl Parser<'s, &'s str, Role> {
    choice((
        just('p').to(Role::Pawn),
        just('n').to(Role::Knight),
        just('b').to(Role::Bishop),
        just('r').to(Role::Rook),
        just('q').to(Role::Queen),
    ))
    .labelled("expected one of pnbrq")
    .boxed()
}
