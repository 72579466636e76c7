//! CLI command implementations.

pub mod archives;
pub mod compress;
pub mod pipe;
pub mod prune;
