use thiserror::Error;

use crate::id::{MemoId, SlabId};

pub type SlabResult<T> = Result<T, SlabError>;

/// Fatal errors raised while constructing a [`Slab`](crate use in memo-slab).
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum SlabConstructionError {
    #[error("slab id must not be empty")]
    EmptyId,
    #[error("slab id {0:?} is already registered with this mesh")]
    DuplicateId(SlabId),
    #[error("mesh has reached its process-wide cap of {0} slabs")]
    MeshFull(usize),
    #[error("quota ({quota}) must not exceed limit ({limit})")]
    QuotaExceedsLimit { quota: usize, limit: usize },
}

/// Non-fatal usage errors: invoking an operation against a memo id the slab
/// doesn't recognize. These are programmer-facing bugs, reported and
/// swallowed rather than propagated, matching the source's "log and return"
/// treatment of unknown ids.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum SlabUsageError {
    #[error("no resident memo with id {0:?}")]
    UnknownMemo(MemoId),
    #[error("kill refused: {0:?} is a head memo of a subscribed record")]
    ProtectedHead(MemoId),
}

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum SlabError {
    #[error("construction error: {0}")]
    Construction(#[from] SlabConstructionError),
    #[error("usage error: {0}")]
    Usage(#[from] SlabUsageError),
}
