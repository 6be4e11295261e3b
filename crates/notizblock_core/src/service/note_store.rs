//! Note store: lifecycle operations over the persisted note board.
//!
//! # Responsibility
//! - Own the `active`, `archived` and `trashed` collections.
//! - Apply create/move/restore/delete transitions.
//! - Persist the whole board after every mutation; hydrate it at startup.
//!
//! # Invariants
//! - Every transfer is a stable remove from the source followed by an append
//!   to the target. The rest of the source keeps its relative order.
//! - A rejected operation (validation, bad position, unknown id, failed
//!   write) leaves the in-memory board and the slot as they were.
//! - Trashed notes can only be deleted; there is no trash -> active edge.
//! - Logs carry ids and positions only, never titles or bodies.

use crate::model::board::{Collection, NoteBoard};
use crate::model::note::{Note, NoteId, NoteValidationError};
use crate::repo::snapshot_repo::{RepoError, SnapshotRepository};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Slot key used unless the caller picks another.
pub const DEFAULT_SLOT_KEY: &str = "notizblock";

pub type StoreResult<T> = Result<T, NoteStoreError>;

/// Error for note store operations.
#[derive(Debug)]
pub enum NoteStoreError {
    /// Title or content blank after trimming; nothing was inserted.
    Validation(NoteValidationError),
    /// Position does not address a note in `collection`.
    IndexOutOfRange {
        collection: Collection,
        position: usize,
        len: usize,
    },
    /// No note with `id` lives in `collection`.
    NoteNotFound { collection: Collection, id: NoteId },
    /// Durable slot write failed; the mutation was rolled back.
    Storage(RepoError),
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::IndexOutOfRange {
                collection,
                position,
                len,
            } => write!(
                f,
                "position {position} is out of range for {collection} notes (len {len})"
            ),
            Self::NoteNotFound { collection, id } => {
                write!(f, "note {id} not found in {collection} notes")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::IndexOutOfRange { .. } | Self::NoteNotFound { .. } => None,
        }
    }
}

impl From<NoteValidationError> for NoteStoreError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for NoteStoreError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// What `hydrate` found in the durable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrateOutcome {
    /// No snapshot stored yet.
    Empty,
    /// Snapshot loaded and installed.
    Restored {
        active: usize,
        archived: usize,
        trashed: usize,
        /// Entries dropped because they were not valid notes.
        skipped: usize,
    },
    /// Snapshot unreadable or malformed; the board was left untouched.
    Discarded { reason: String },
}

/// Owner of the note board and its durable slot.
pub struct NoteStore<R: SnapshotRepository> {
    repo: R,
    slot_key: String,
    board: NoteBoard,
}

impl<R: SnapshotRepository> NoteStore<R> {
    /// Creates an empty store over `repo` using [`DEFAULT_SLOT_KEY`].
    ///
    /// Does not read storage; call [`NoteStore::hydrate`] or use
    /// [`NoteStore::open`].
    pub fn new(repo: R) -> Self {
        Self::with_slot_key(repo, DEFAULT_SLOT_KEY)
    }

    /// Creates an empty store persisting under a custom slot key.
    pub fn with_slot_key(repo: R, slot_key: impl Into<String>) -> Self {
        Self {
            repo,
            slot_key: slot_key.into(),
            board: NoteBoard::default(),
        }
    }

    /// Creates a store and hydrates it from the default slot.
    pub fn open(repo: R) -> Self {
        let mut store = Self::new(repo);
        store.hydrate();
        store
    }

    /// Replaces the in-memory board with the stored snapshot, if valid.
    ///
    /// Never fails: absent, unreadable or structurally malformed snapshots
    /// leave the current board as is and are reported through the outcome.
    /// Individual entries that are not valid notes are skipped; the rest of
    /// the snapshot is restored.
    pub fn hydrate(&mut self) -> HydrateOutcome {
        let raw = match self.repo.read_slot(&self.slot_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("event=store_hydrate module=store status=empty");
                return HydrateOutcome::Empty;
            }
            Err(err) => {
                warn!(
                    "event=store_hydrate module=store status=error error_code=slot_read_failed error={err}"
                );
                return HydrateOutcome::Discarded {
                    reason: err.to_string(),
                };
            }
        };

        let decoded = match NoteBoard::from_snapshot(&raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                // Type errors quote the offending value; log position only.
                warn!(
                    "event=store_hydrate module=store status=error error_code=snapshot_malformed category={:?} line={} column={}",
                    err.classify(),
                    err.line(),
                    err.column()
                );
                return HydrateOutcome::Discarded {
                    reason: format!("malformed snapshot: {err}"),
                };
            }
        };
        for entry in &decoded.skipped {
            warn!(
                "event=store_hydrate module=store status=skipped collection={} position={}",
                entry.collection, entry.position
            );
        }

        let mut board = decoded.board;
        let reassigned = reassign_duplicate_ids(&mut board);
        if reassigned > 0 {
            warn!("event=store_hydrate module=store status=repaired duplicate_ids={reassigned}");
        }

        let outcome = HydrateOutcome::Restored {
            active: board.active.len(),
            archived: board.archived.len(),
            trashed: board.trashed.len(),
            skipped: decoded.skipped.len(),
        };
        info!(
            "event=store_hydrate module=store status=ok active={} archived={} trashed={} skipped={}",
            board.active.len(),
            board.archived.len(),
            board.trashed.len(),
            decoded.skipped.len()
        );
        self.board = board;
        outcome
    }

    /// Writes the whole board to the slot, overwriting the previous record.
    pub fn persist(&self) -> StoreResult<()> {
        let payload = serde_json::to_string(&self.board).map_err(RepoError::from)?;
        self.repo.write_slot(&self.slot_key, &payload)?;
        debug!(
            "event=store_persist module=store status=ok bytes={}",
            payload.len()
        );
        Ok(())
    }

    /// Appends a new active note built from trimmed input.
    ///
    /// # Errors
    /// - `Validation` when title or content is blank; nothing is stored.
    /// - `Storage` when the write fails; the note is removed again.
    pub fn create(&mut self, title: &str, content: &str) -> StoreResult<NoteId> {
        let note = match Note::new(title, content) {
            Ok(note) => note,
            Err(err) => {
                debug!("event=note_create module=store status=rejected reason={err}");
                return Err(err.into());
            }
        };
        let id = note.id;
        self.board.active.push(note);

        if let Err(err) = self.persist() {
            self.board.active.pop();
            warn!("event=note_create module=store status=error error_code=persist_failed error={err}");
            return Err(err);
        }

        info!(
            "event=note_create module=store status=ok note_id={id} position={}",
            self.board.active.len() - 1
        );
        Ok(id)
    }

    /// Moves the active note at `position` to the end of trashed.
    pub fn move_to_trash(&mut self, position: usize) -> StoreResult<NoteId> {
        self.transfer_at(Collection::Active, Collection::Trashed, position)
    }

    /// Moves the active note at `position` to the end of archived.
    pub fn move_to_archive(&mut self, position: usize) -> StoreResult<NoteId> {
        self.transfer_at(Collection::Active, Collection::Archived, position)
    }

    /// Moves the archived note at `position` to the end of trashed.
    pub fn move_to_trash_from_archive(&mut self, position: usize) -> StoreResult<NoteId> {
        self.transfer_at(Collection::Archived, Collection::Trashed, position)
    }

    /// Moves the archived note at `position` back to the end of active.
    pub fn restore_from_archive(&mut self, position: usize) -> StoreResult<NoteId> {
        self.transfer_at(Collection::Archived, Collection::Active, position)
    }

    /// Permanently removes the trashed note at `position` and returns it.
    pub fn delete_trash(&mut self, position: usize) -> StoreResult<Note> {
        self.check_position(Collection::Trashed, position)?;
        let note = self.board.trashed.remove(position);

        if let Err(err) = self.persist() {
            self.board.trashed.insert(position, note);
            warn!("event=note_delete module=store status=error error_code=persist_failed error={err}");
            return Err(err);
        }

        info!(
            "event=note_delete module=store status=ok note_id={} position={position}",
            note.id
        );
        Ok(note)
    }

    /// Id-addressed [`NoteStore::move_to_trash`].
    pub fn trash_note(&mut self, id: NoteId) -> StoreResult<()> {
        let position = self.position_of(Collection::Active, id)?;
        self.move_to_trash(position).map(|_| ())
    }

    /// Id-addressed [`NoteStore::move_to_archive`].
    pub fn archive_note(&mut self, id: NoteId) -> StoreResult<()> {
        let position = self.position_of(Collection::Active, id)?;
        self.move_to_archive(position).map(|_| ())
    }

    /// Id-addressed [`NoteStore::move_to_trash_from_archive`].
    pub fn trash_archived_note(&mut self, id: NoteId) -> StoreResult<()> {
        let position = self.position_of(Collection::Archived, id)?;
        self.move_to_trash_from_archive(position).map(|_| ())
    }

    /// Id-addressed [`NoteStore::restore_from_archive`].
    pub fn restore_archived_note(&mut self, id: NoteId) -> StoreResult<()> {
        let position = self.position_of(Collection::Archived, id)?;
        self.restore_from_archive(position).map(|_| ())
    }

    /// Id-addressed [`NoteStore::delete_trash`].
    pub fn delete_trashed_note(&mut self, id: NoteId) -> StoreResult<Note> {
        let position = self.position_of(Collection::Trashed, id)?;
        self.delete_trash(position)
    }

    pub fn active(&self) -> &[Note] {
        &self.board.active
    }

    pub fn archived(&self) -> &[Note] {
        &self.board.archived
    }

    pub fn trashed(&self) -> &[Note] {
        &self.board.trashed
    }

    /// Returns one collection in display order.
    pub fn collection(&self, kind: Collection) -> &[Note] {
        self.board.collection(kind)
    }

    /// Borrowed view of all three collections for rendering.
    pub fn board(&self) -> &NoteBoard {
        &self.board
    }

    /// Finds which collection holds `id` and at what position.
    pub fn locate(&self, id: NoteId) -> Option<(Collection, usize)> {
        self.board.locate(id)
    }

    /// Gets one note by id from any collection.
    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.locate(id)
            .map(|(kind, position)| &self.board.collection(kind)[position])
    }

    pub fn slot_key(&self) -> &str {
        &self.slot_key
    }

    fn transfer_at(
        &mut self,
        from: Collection,
        to: Collection,
        position: usize,
    ) -> StoreResult<NoteId> {
        self.check_position(from, position)?;
        let note = self.board.collection_mut(from).remove(position);
        let id = note.id;
        self.board.collection_mut(to).push(note);

        if let Err(err) = self.persist() {
            if let Some(note) = self.board.collection_mut(to).pop() {
                self.board.collection_mut(from).insert(position, note);
            }
            warn!(
                "event=note_transfer module=store status=error from={from} to={to} error_code=persist_failed error={err}"
            );
            return Err(err);
        }

        info!(
            "event=note_transfer module=store status=ok from={from} to={to} position={position} note_id={id}"
        );
        Ok(id)
    }

    fn check_position(&self, collection: Collection, position: usize) -> StoreResult<()> {
        let len = self.board.collection(collection).len();
        if position >= len {
            debug!(
                "event=note_lookup module=store status=rejected collection={collection} position={position} len={len}"
            );
            return Err(NoteStoreError::IndexOutOfRange {
                collection,
                position,
                len,
            });
        }
        Ok(())
    }

    fn position_of(&self, collection: Collection, id: NoteId) -> StoreResult<usize> {
        self.board
            .collection(collection)
            .iter()
            .position(|note| note.id == id)
            .ok_or(NoteStoreError::NoteNotFound { collection, id })
    }
}

/// Gives fresh ids to notes whose id was already seen earlier in the board.
fn reassign_duplicate_ids(board: &mut NoteBoard) -> usize {
    let mut seen = HashSet::new();
    let mut reassigned = 0;
    for kind in Collection::ALL {
        for note in board.collection_mut(kind).iter_mut() {
            if !seen.insert(note.id) {
                note.id = Uuid::new_v4();
                seen.insert(note.id);
                reassigned += 1;
            }
        }
    }
    reassigned
}

#[cfg(test)]
mod tests {
    use super::reassign_duplicate_ids;
    use crate::model::board::NoteBoard;
    use crate::model::note::Note;

    #[test]
    fn duplicate_ids_are_reassigned_after_first_occurrence() {
        let first = Note::new("a", "b").unwrap();
        let mut copy = Note::new("c", "d").unwrap();
        copy.id = first.id;
        let mut board = NoteBoard {
            active: vec![first.clone()],
            archived: Vec::new(),
            trashed: vec![copy],
        };

        assert_eq!(reassign_duplicate_ids(&mut board), 1);
        assert_eq!(board.active[0].id, first.id);
        assert_ne!(board.trashed[0].id, first.id);
        assert_eq!(board.trashed[0].title, "c");
    }
}
