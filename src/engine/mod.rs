//! Core engine: the poll, normalize, publish loop.

pub mod updater;
pub mod scheduler;
