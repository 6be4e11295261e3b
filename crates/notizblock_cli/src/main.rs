//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `notizblock_core` linkage without the Flutter runtime.
//! - Exercise one full note lifecycle against an in-memory slot.

use notizblock_core::{MemorySnapshotRepository, NoteStore, NoteStoreError};

fn main() -> Result<(), NoteStoreError> {
    println!("notizblock_core ping={}", notizblock_core::ping());
    println!("notizblock_core version={}", notizblock_core::core_version());
    println!("notizblock_core default_log_level={}", notizblock_core::default_log_level());

    let repo = MemorySnapshotRepository::new();
    let mut store = NoteStore::new(&repo);
    store.create("smoke", "lifecycle probe")?;
    store.move_to_archive(0)?;
    store.move_to_trash_from_archive(0)?;

    let reloaded = NoteStore::open(&repo);
    println!(
        "notizblock_core reload active={} archived={} trashed={}",
        reloaded.active().len(),
        reloaded.archived().len(),
        reloaded.trashed().len()
    );
    Ok(())
}
