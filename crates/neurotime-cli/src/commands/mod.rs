//! CLI command implementations.

pub mod coherence;
pub mod common;
pub mod correlate;
pub mod event_related;
pub mod filter;
pub mod hilbert;
pub mod info;
