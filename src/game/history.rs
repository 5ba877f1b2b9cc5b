//! Move log. Each record pairs the annotated notation with the full
//! exported state *after* the move, so undo is a reload of the previous
//! record rather than an inverse-move computation — fusion bookkeeping makes
//! true inverses more trouble than they are worth.

use serde::Serialize;

/// One committed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    /// SAN, or `<shape><from>[x]<to>~` for fused-capability moves.
    pub notation: String,
    /// Exported compound state right after the move.
    pub state: String,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<MoveRecord>,
}

impl History {
    pub fn push(&mut self, notation: String, state: String) {
        self.records.push(MoveRecord { notation, state });
    }

    pub fn pop(&mut self) -> Option<MoveRecord> {
        self.records.pop()
    }

    pub fn last_state(&self) -> Option<&str> {
        self.records.last().map(|r| r.state.as_str())
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
