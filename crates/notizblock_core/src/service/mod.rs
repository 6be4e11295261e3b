//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate model transitions and slot persistence.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod note_store;
