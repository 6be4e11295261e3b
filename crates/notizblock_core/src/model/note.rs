//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical title/content record owned by the note board.
//! - Normalize and validate user input before a note exists.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `title` and `content` are trimmed and never empty.
//! - Snapshots written before ids existed still deserialize; each such note
//!   receives a fresh id.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one note across moves and reloads.
pub type NoteId = Uuid;

/// Validation error for note title/content input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// Content is empty after trimming.
    EmptyContent,
    /// Caller supplied the nil UUID as identity.
    NilId,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::EmptyContent => write!(f, "note content must not be empty"),
            Self::NilId => write!(f, "note id must not be nil"),
        }
    }
}

impl Error for NoteValidationError {}

/// One user-authored memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NoteWire")]
pub struct Note {
    /// Stable id used for identity-addressed operations.
    pub id: NoteId,
    /// Display title, trimmed.
    pub title: String,
    /// Body text, trimmed.
    pub content: String,
}

impl Note {
    /// Creates a note with a generated id from raw user input.
    ///
    /// # Errors
    /// - `EmptyTitle` / `EmptyContent` when either value is blank after trim.
    pub fn new(
        title: impl AsRef<str>,
        content: impl AsRef<str>,
    ) -> Result<Self, NoteValidationError> {
        Self::with_id(Uuid::new_v4(), title, content)
    }

    /// Creates a note with a caller-provided id.
    ///
    /// Used by hydration paths where identity already exists.
    pub fn with_id(
        id: NoteId,
        title: impl AsRef<str>,
        content: impl AsRef<str>,
    ) -> Result<Self, NoteValidationError> {
        let draft = NoteDraft::new(title.as_ref(), content.as_ref())?;
        if id.is_nil() {
            return Err(NoteValidationError::NilId);
        }
        Ok(Self {
            id,
            title: draft.title,
            content: draft.content,
        })
    }

}

/// Trimmed, validated title/content pair that has not been assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    /// Trims both values and rejects blanks. Title is checked first.
    pub fn new(title: &str, content: &str) -> Result<Self, NoteValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(NoteValidationError::EmptyContent);
        }
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct NoteWire {
    #[serde(default = "Uuid::new_v4")]
    id: NoteId,
    title: String,
    content: String,
}

impl TryFrom<NoteWire> for Note {
    type Error = NoteValidationError;

    fn try_from(value: NoteWire) -> Result<Self, Self::Error> {
        Note::with_id(value.id, value.title, value.content)
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteDraft, NoteValidationError};
    use uuid::Uuid;

    #[test]
    fn new_trims_title_and_content() {
        let note = Note::new("  Groceries ", "\tMilk, eggs\n").unwrap();
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "Milk, eggs");
        assert!(!note.id.is_nil());
    }

    #[test]
    fn draft_rejects_blank_values() {
        assert_eq!(
            NoteDraft::new("   ", "body").unwrap_err(),
            NoteValidationError::EmptyTitle
        );
        assert_eq!(
            NoteDraft::new("title", " \n ").unwrap_err(),
            NoteValidationError::EmptyContent
        );
    }

    #[test]
    fn with_id_rejects_nil_uuid() {
        let err = Note::with_id(Uuid::nil(), "t", "c").unwrap_err();
        assert_eq!(err, NoteValidationError::NilId);
    }

    #[test]
    fn deserialize_assigns_id_when_missing() {
        let first: Note =
            serde_json::from_str(r#"{"title":"a","content":"b"}"#).unwrap();
        let second: Note =
            serde_json::from_str(r#"{"title":"a","content":"b"}"#).unwrap();
        assert!(!first.id.is_nil());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn deserialize_rejects_blank_title() {
        let err = serde_json::from_str::<Note>(r#"{"title":"  ","content":"b"}"#).unwrap_err();
        assert!(err.to_string().contains("title"), "unexpected error: {err}");
    }
}
