//! Durable slot storage contracts and implementations.
//!
//! # Responsibility
//! - Define the key/value slot contract the note store persists through.
//! - Keep SQL details out of the service layer.
//!
//! # Invariants
//! - A write replaces the whole value stored under its key.
//! - Reading an unknown key is `Ok(None)`, not an error.

pub mod snapshot_repo;
