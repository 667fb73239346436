//! Use-case services called by the UI layer.

pub mod session;
