//! Domain model for the note board.
//!
//! # Responsibility
//! - Define canonical note records and the three lifecycle collections.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Permanent deletion happens only from the trashed collection.

pub mod board;
pub mod note;
