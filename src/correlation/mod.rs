//! Signal fusion and candidate selection.

pub mod aggregate;
pub mod candidates;
mod proptest;
pub mod types;

pub use aggregate::fuse;
pub use candidates::select_candidates;
pub use types::{Correlation, Evidence, Signal, MAX_EVIDENCE};
