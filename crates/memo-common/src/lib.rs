//! Shared id types and error taxonomy used across the memo mesh crates.
//!
//! This crate has no behavior of its own: it exists so `memo-slab` and the
//! mesh/memo implementations that plug into it can agree on identifiers
//! and error shapes without depending on each other.

mod error;
mod id;

pub use error::{SlabConstructionError, SlabError, SlabResult, SlabUsageError};
pub use id::{to_base36, MemoId, PeerState, RecordId, SlabId};
