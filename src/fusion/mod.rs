//! # Fusion bookkeeping.
//!
//! Two small tables carry everything the variant adds to a position: which
//! squares hold a piece with a secondary movement capability, and which
//! kings have been granted one. Both start empty, grow only through
//! captures, and shrink when the underlying piece moves on or disappears.
//!
//! The square table is insertion-ordered so that exported state strings come
//! out the same way every time.

pub mod capture;

use indexmap::IndexMap;
use shakmaty::{ByColor, Color, Role, Square};

/// Relative strength used when a capture offers more than one capability:
/// king above queen, queen above the officers, officers above the pawn.
/// Rook, bishop and knight are deliberate peers.
pub fn strength(role: Role) -> u8 {
    match role {
        Role::King => 4,
        Role::Queen => 3,
        Role::Rook | Role::Bishop | Role::Knight => 2,
        Role::Pawn => 1,
    }
}

/// Whether every move `narrow` can make is already available to `wide`.
/// The queen swallows rook, bishop and pawn movement; nothing else swallows
/// anything but itself. (The knight's jump keeps it out of the queen.)
pub fn subsumes(wide: Role, narrow: Role) -> bool {
    wide == narrow
        || (wide == Role::Queen && matches!(narrow, Role::Rook | Role::Bishop | Role::Pawn))
}

/// Square → secondary capability, for every non-king piece that holds one.
/// At most one entry per square; a fresh fusion overwrites, never stacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FusionMap {
    entries: IndexMap<Square, Role>,
}

impl FusionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, square: Square) -> Option<Role> {
        self.entries.get(&square).copied()
    }

    pub fn contains(&self, square: Square) -> bool {
        self.entries.contains_key(&square)
    }

    /// Install a secondary capability, displacing whatever the square held.
    /// Re-inserts at the back so iteration order tracks acquisition order.
    pub fn set(&mut self, square: Square, secondary: Role) {
        self.entries.shift_remove(&square);
        self.entries.insert(square, secondary);
    }

    pub fn remove(&mut self, square: Square) -> Option<Role> {
        self.entries.shift_remove(&square)
    }

    /// An entry follows its piece. Whatever the destination held dies with
    /// the occupant that held it.
    pub fn migrate(&mut self, from: Square, to: Square) {
        let carried = self.entries.shift_remove(&from);
        self.entries.shift_remove(&to);
        if let Some(secondary) = carried {
            self.entries.insert(to, secondary);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Square, Role)> + '_ {
        self.entries.iter().map(|(sq, role)| (*sq, *role))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Color → secondary capability granted to that color's king.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoyalFusions {
    granted: ByColor<Option<Role>>,
}

impl RoyalFusions {
    pub fn get(&self, color: Color) -> Option<Role> {
        match color {
            Color::White => self.granted.white,
            Color::Black => self.granted.black,
        }
    }

    pub fn grant(&mut self, color: Color, secondary: Role) {
        match color {
            Color::White => self.granted.white = Some(secondary),
            Color::Black => self.granted.black = Some(secondary),
        }
    }

    /// A queen grant is terminal; nothing a king captures improves on it.
    pub fn at_ceiling(&self, color: Color) -> bool {
        self.get(color) == Some(Role::Queen)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Color, Role)> + '_ {
        [
            (Color::White, self.granted.white),
            (Color::Black, self.granted.black),
        ]
        .into_iter()
        .filter_map(|(color, role)| role.map(|role| (color, role)))
    }

    pub fn is_empty(&self) -> bool {
        self.granted.white.is_none() && self.granted.black.is_none()
    }

    pub fn clear(&mut self) {
        self.granted = ByColor::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_ladder() {
        assert!(strength(Role::King) > strength(Role::Queen));
        assert!(strength(Role::Queen) > strength(Role::Rook));
        assert_eq!(strength(Role::Rook), strength(Role::Bishop));
        assert_eq!(strength(Role::Bishop), strength(Role::Knight));
        assert!(strength(Role::Knight) > strength(Role::Pawn));
    }

    #[test]
    fn queen_subsumes_the_sliders_and_the_pawn() {
        assert!(subsumes(Role::Queen, Role::Rook));
        assert!(subsumes(Role::Queen, Role::Bishop));
        assert!(subsumes(Role::Queen, Role::Pawn));
        assert!(!subsumes(Role::Queen, Role::Knight));
        assert!(!subsumes(Role::Rook, Role::Pawn));
        assert!(subsumes(Role::Knight, Role::Knight));
    }

    #[test]
    fn migration_displaces_the_destination() {
        let mut map = FusionMap::new();
        map.set(Square::C3, Role::Bishop);
        map.set(Square::E5, Role::Rook);
        map.migrate(Square::C3, Square::E5);
        assert_eq!(map.get(Square::E5), Some(Role::Bishop));
        assert_eq!(map.get(Square::C3), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn migration_of_nothing_still_clears_the_destination() {
        let mut map = FusionMap::new();
        map.set(Square::E5, Role::Rook);
        map.migrate(Square::C3, Square::E5);
        assert!(map.is_empty());
    }

    #[test]
    fn royal_grants_are_per_color() {
        let mut royals = RoyalFusions::default();
        royals.grant(Color::White, Role::Rook);
        assert_eq!(royals.get(Color::White), Some(Role::Rook));
        assert_eq!(royals.get(Color::Black), None);
        assert!(!royals.at_ceiling(Color::White));
        royals.grant(Color::White, Role::Queen);
        assert!(royals.at_ceiling(Color::White));
    }
}
