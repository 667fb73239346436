//! Flutter-facing bindings for the journal storage core.

pub mod api;
