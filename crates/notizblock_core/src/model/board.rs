//! Note board aggregate: the three ordered lifecycle collections.
//!
//! # Responsibility
//! - Hold `active`, `archived` and `trashed` notes in insertion order.
//! - Define the durable JSON shape persisted by the store.
//!
//! # Invariants
//! - A note belongs to exactly one collection.
//! - Collection order is display and addressing order.
//! - Legacy field names (`notes`, `archive`, `trash`) are read but never written.
//! - A snapshot is accepted when it is an object with three arrays; bad
//!   entries inside an array are skipped one by one, not fatal.

use crate::model::note::{Note, NoteId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Named lifecycle collection a note lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Primary visible list.
    Active,
    /// Set aside but recoverable.
    Archived,
    /// Marked for deletion; only permanent delete leaves it.
    Trashed,
}

impl Collection {
    /// All collections in render order.
    pub const ALL: [Collection; 3] = [Self::Active, Self::Archived, Self::Trashed];

    /// Stable lowercase label used in logs and FFI payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Trashed => "trashed",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted aggregate of all notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoteBoard {
    pub active: Vec<Note>,
    pub archived: Vec<Note>,
    pub trashed: Vec<Note>,
}

/// Snapshot entry that could not be turned into a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedEntry {
    pub collection: Collection,
    /// Position of the entry in the stored array.
    pub position: usize,
}

/// Result of decoding a stored snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedBoard {
    pub board: NoteBoard,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Deserialize)]
struct BoardWire {
    #[serde(alias = "notes")]
    active: Vec<serde_json::Value>,
    #[serde(alias = "archive")]
    archived: Vec<serde_json::Value>,
    #[serde(alias = "trash")]
    trashed: Vec<serde_json::Value>,
}

impl NoteBoard {
    /// Returns notes of one collection.
    pub fn collection(&self, kind: Collection) -> &[Note] {
        match kind {
            Collection::Active => &self.active,
            Collection::Archived => &self.archived,
            Collection::Trashed => &self.trashed,
        }
    }

    pub(crate) fn collection_mut(&mut self, kind: Collection) -> &mut Vec<Note> {
        match kind {
            Collection::Active => &mut self.active,
            Collection::Archived => &mut self.archived,
            Collection::Trashed => &mut self.trashed,
        }
    }

    /// Decodes a stored snapshot.
    ///
    /// # Errors
    /// - When `raw` is not an object holding `active`, `archived` and
    ///   `trashed` arrays (or their legacy names).
    ///
    /// Entries that are `null`, blank or otherwise not a note are dropped
    /// and listed in `skipped`.
    pub fn from_snapshot(raw: &str) -> Result<DecodedBoard, serde_json::Error> {
        let wire: BoardWire = serde_json::from_str(raw)?;
        let mut decoded = DecodedBoard::default();
        for (kind, entries) in [
            (Collection::Active, wire.active),
            (Collection::Archived, wire.archived),
            (Collection::Trashed, wire.trashed),
        ] {
            for (position, entry) in entries.into_iter().enumerate() {
                match serde_json::from_value::<Note>(entry) {
                    Ok(note) => decoded.board.collection_mut(kind).push(note),
                    Err(_) => decoded.skipped.push(SkippedEntry {
                        collection: kind,
                        position,
                    }),
                }
            }
        }
        Ok(decoded)
    }

    /// Finds the collection and position of a note by id.
    pub fn locate(&self, id: NoteId) -> Option<(Collection, usize)> {
        Collection::ALL.into_iter().find_map(|kind| {
            self.collection(kind)
                .iter()
                .position(|note| note.id == id)
                .map(|position| (kind, position))
        })
    }

    /// Total number of notes across all collections.
    pub fn len(&self) -> usize {
        self.active.len() + self.archived.len() + self.trashed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
