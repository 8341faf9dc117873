//! Pure progress rules: streaks, levels, completions and challenge sampling.
//!
//! # Responsibility
//! - Hold the single authoritative streak/XP/level algorithm.
//! - Stay free of storage, clock and global randomness; callers pass the
//!   day (`as_of`) and random source explicitly.
//!
//! # Invariants
//! - Functions take records by reference and return new records.
//! - Identical inputs give identical outputs, except for generated IDs and
//!   the caller-provided rng.

pub mod catalog;
pub mod completion;
pub mod generator;
pub mod level;
pub mod milestone;
pub mod streak;
