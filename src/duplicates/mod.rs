//! Duplicate-pair findings and their derived grouping.
//!
//! This module provides:
//! - [`DuplicatePair`]: one "image A resembles image B" finding
//! - [`PairStore`]: the ordered collection of findings for a session
//! - [`group`]: the pure derivation of distinct originals and duplicates

pub mod grouping;
pub mod pair;

pub use grouping::{group, DuplicateEntry, Grouping};
pub use pair::{display_name, DuplicatePair, PairStore};
