//! Flutter-facing bindings for the Notizblock core.

pub mod api;
