//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note board operations to Dart via FRB.
//! - Return the full board after every call so the UI re-renders from
//!   fresh data instead of stale positions.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Notes are addressed by stable id strings, never by list position.
//! - Calls are serialized; each one hydrates, mutates, persists, returns.

use log::warn;
use notizblock_core::db::open_db;
use notizblock_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Note, NoteBoard, NoteId, NoteStore, NoteStoreError, SqliteSnapshotRepository,
};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

const BOARD_DB_FILE_NAME: &str = "notizblock.sqlite3";
static BOARD_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static BOARD_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message on failure.
/// Repeating the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One note as rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    /// Stable note id in string form.
    pub note_id: String,
    pub title: String,
    pub content: String,
}

/// Board envelope returned by every note call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesBoardResponse {
    /// Whether the requested operation succeeded.
    pub ok: bool,
    /// Id of the created or moved note, when there is one.
    pub note_id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
    pub active: Vec<NoteItem>,
    pub archived: Vec<NoteItem>,
    pub trashed: Vec<NoteItem>,
}

impl NotesBoardResponse {
    fn new(
        ok: bool,
        note_id: Option<NoteId>,
        message: impl Into<String>,
        board: &NoteBoard,
    ) -> Self {
        Self {
            ok,
            note_id: note_id.map(|id| id.to_string()),
            message: message.into(),
            active: to_items(&board.active),
            archived: to_items(&board.archived),
            trashed: to_items(&board.trashed),
        }
    }

    fn unavailable(message: impl Into<String>) -> Self {
        Self::new(false, None, message, &NoteBoard::default())
    }
}

/// Loads the board for the initial render.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_board() -> NotesBoardResponse {
    with_note_store("notes_board", "Board loaded.", |_| Ok::<_, NoteStoreError>(None))
}

/// Creates an active note from raw title/content input.
///
/// Blank input after trimming is rejected and nothing is stored.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_create(title: String, content: String) -> NotesBoardResponse {
    with_note_store("notes_create", "Note created.", |store| {
        store.create(&title, &content).map(Some)
    })
}

/// Moves an active note to the trash.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_move_to_trash(note_id: String) -> NotesBoardResponse {
    with_note_id(
        "notes_move_to_trash",
        "Note moved to trash.",
        &note_id,
        |store, id| store.trash_note(id),
    )
}

/// Moves an active note to the archive.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_move_to_archive(note_id: String) -> NotesBoardResponse {
    with_note_id(
        "notes_move_to_archive",
        "Note archived.",
        &note_id,
        |store, id| store.archive_note(id),
    )
}

/// Moves an archived note to the trash.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_trash_archived(note_id: String) -> NotesBoardResponse {
    with_note_id(
        "notes_trash_archived",
        "Archived note moved to trash.",
        &note_id,
        |store, id| store.trash_archived_note(id),
    )
}

/// Moves an archived note back to the active list.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_restore_archived(note_id: String) -> NotesBoardResponse {
    with_note_id(
        "notes_restore_archived",
        "Note restored.",
        &note_id,
        |store, id| store.restore_archived_note(id),
    )
}

/// Permanently deletes a trashed note.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_delete_trashed(note_id: String) -> NotesBoardResponse {
    with_note_id(
        "notes_delete_trashed",
        "Note deleted.",
        &note_id,
        |store, id| store.delete_trashed_note(id).map(|_| ()),
    )
}

type BoardStore<'conn> = NoteStore<SqliteSnapshotRepository<'conn>>;

fn with_note_id(
    op: &'static str,
    success: &'static str,
    raw_id: &str,
    f: impl FnOnce(&mut BoardStore<'_>, NoteId) -> Result<(), NoteStoreError>,
) -> NotesBoardResponse {
    let id = match Uuid::parse_str(raw_id.trim()) {
        Ok(id) => id,
        Err(_) => {
            let raw = raw_id.trim().to_string();
            return with_note_store(op, success, move |_| Err(CallError::InvalidNoteId(raw)));
        }
    };
    with_note_store(op, success, |store| f(store, id).map(|()| Some(id)))
}

enum CallError {
    InvalidNoteId(String),
    Store(NoteStoreError),
}

impl From<NoteStoreError> for CallError {
    fn from(value: NoteStoreError) -> Self {
        Self::Store(value)
    }
}

fn with_note_store<E: Into<CallError>>(
    op: &'static str,
    success: &'static str,
    f: impl FnOnce(&mut BoardStore<'_>) -> Result<Option<NoteId>, E>,
) -> NotesBoardResponse {
    let _guard = BOARD_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let conn = match open_db(resolve_board_db_path()) {
        Ok(conn) => conn,
        Err(err) => return NotesBoardResponse::unavailable(format!("{op} failed: {err}")),
    };
    let repo = match SqliteSnapshotRepository::try_new(&conn) {
        Ok(repo) => repo,
        Err(err) => return NotesBoardResponse::unavailable(format!("{op} failed: {err}")),
    };
    let mut store = NoteStore::open(repo);

    let outcome: Result<Option<NoteId>, CallError> = f(&mut store).map_err(Into::into);
    match outcome {
        Ok(note_id) => NotesBoardResponse::new(true, note_id, success, store.board()),
        Err(CallError::InvalidNoteId(raw)) => NotesBoardResponse::new(
            false,
            None,
            format!("{op} failed: invalid note id `{raw}`"),
            store.board(),
        ),
        Err(CallError::Store(err)) => {
            warn!("event=ffi_call module=ffi status=error op={op} error={err}");
            NotesBoardResponse::new(false, None, format!("{op} failed: {err}"), store.board())
        }
    }
}

fn resolve_board_db_path() -> PathBuf {
    BOARD_DB_PATH
        .get_or_init(|| board_db_path_from(std::env::var("NOTIZBLOCK_DB_PATH").ok()))
        .clone()
}

/// Picks the override path when it is non-blank, else the temp-dir default.
fn board_db_path_from(override_path: Option<String>) -> PathBuf {
    override_path
        .as_deref()
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(BOARD_DB_FILE_NAME))
}

fn to_items(notes: &[Note]) -> Vec<NoteItem> {
    notes
        .iter()
        .map(|note| NoteItem {
            note_id: note.id.to_string(),
            title: note.title.clone(),
            content: note.content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        board_db_path_from, core_version, init_logging, notes_board, notes_create,
        notes_delete_trashed, notes_move_to_archive, notes_move_to_trash, notes_restore_archived,
        notes_trash_archived, ping, resolve_board_db_path, NoteItem, BOARD_DB_FILE_NAME,
        BOARD_DB_PATH,
    };
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEST_DB_DIR: OnceLock<tempfile::TempDir> = OnceLock::new();

    /// Points the board at a database private to this test run.
    fn use_test_db() {
        let dir = TEST_DB_DIR.get_or_init(|| tempfile::tempdir().expect("create temp dir"));
        let _ = BOARD_DB_PATH.set(dir.path().join(BOARD_DB_FILE_NAME));
    }

    #[test]
    fn db_path_override_wins_when_not_blank() {
        assert_eq!(
            board_db_path_from(Some(" /data/board.sqlite3 ".to_string())),
            PathBuf::from("/data/board.sqlite3")
        );
        let fallback = std::env::temp_dir().join(BOARD_DB_FILE_NAME);
        assert_eq!(board_db_path_from(Some("   ".to_string())), fallback);
        assert_eq!(board_db_path_from(None), fallback);
    }

    #[test]
    fn test_calls_use_private_database() {
        use_test_db();
        let dir = TEST_DB_DIR.get().expect("test dir initialized");
        assert!(resolve_board_db_path().starts_with(dir.path()));
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn create_returns_board_with_new_note_last() {
        use_test_db();
        let title = unique_token("create");
        let response = notes_create(format!("  {title} "), "body".to_string());
        assert!(response.ok, "{}", response.message);
        let note_id = response.note_id.clone().expect("create should return note_id");

        let last = response.active.last().expect("active should not be empty");
        assert_eq!(last.note_id, note_id);
        assert_eq!(last.title, title);
        assert!(contains(&notes_board().active, &note_id));
    }

    #[test]
    fn create_rejects_blank_content() {
        use_test_db();
        let response = notes_create(unique_token("blank"), "   ".to_string());
        assert!(!response.ok);
        assert!(response.note_id.is_none());
        assert!(response.message.contains("content"));
    }

    #[test]
    fn note_walks_archive_restore_trash_delete() {
        use_test_db();
        let created = notes_create(unique_token("walk"), "body".to_string());
        let id = created.note_id.expect("create should return note_id");

        let archived = notes_move_to_archive(id.clone());
        assert!(archived.ok, "{}", archived.message);
        assert!(contains(&archived.archived, &id));
        assert!(!contains(&archived.active, &id));

        let restored = notes_restore_archived(id.clone());
        assert!(restored.ok, "{}", restored.message);
        assert_eq!(restored.active.last().map(|n| n.note_id.as_str()), Some(id.as_str()));

        assert!(notes_move_to_archive(id.clone()).ok);
        let trashed = notes_trash_archived(id.clone());
        assert!(trashed.ok, "{}", trashed.message);
        assert!(contains(&trashed.trashed, &id));

        let deleted = notes_delete_trashed(id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        assert!(!contains(&deleted.active, &id));
        assert!(!contains(&deleted.archived, &id));
        assert!(!contains(&deleted.trashed, &id));
    }

    #[test]
    fn trashed_note_cannot_be_restored() {
        use_test_db();
        let created = notes_create(unique_token("no-restore"), "body".to_string());
        let id = created.note_id.expect("create should return note_id");
        assert!(notes_move_to_trash(id.clone()).ok);

        let response = notes_restore_archived(id.clone());
        assert!(!response.ok);
        assert!(contains(&response.trashed, &id));
    }

    #[test]
    fn invalid_note_id_is_rejected_with_board() {
        use_test_db();
        let response = notes_move_to_trash("not-a-uuid".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid note id"));
    }

    fn contains(items: &[NoteItem], note_id: &str) -> bool {
        items.iter().any(|item| item.note_id == note_id)
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
