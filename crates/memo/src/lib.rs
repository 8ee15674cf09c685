//! The public surface over [`memo_slab`]: a concrete [`Memo`] value type, an
//! in-process [`Mesh`] for connecting multiple slabs in one address space,
//! and the [`Context`] handle the slab hands out to clients.
//!
//! `memo-slab` stays collaborator-agnostic: it only knows the `Memo` and
//! `Mesh` traits. This crate supplies ready-to-use implementations of both
//! so a caller who doesn't need a custom wire format or transport can build
//! a working mesh of slabs directly.

mod context;
mod local_mesh;
mod simple_memo;

pub use context::Context;
pub use local_mesh::LocalMesh;
pub use simple_memo::SimpleMemo;

pub use memo_slab::{
    check_memo_replication_factor, Mesh, MemoIndex, PeeringChanges, PeeringRegistry,
    RecordObserver, RefPeering, Slab, SlabConfig, SubscriptionRegistry, DEFAULT_LIMIT,
    DEFAULT_QUOTA, MAX_SLABS_PER_PROCESS,
};
pub use memo_slab::Memo;
pub use memo_slab::{
    to_base36, MemoId, PeerState, RecordId, SlabConstructionError, SlabError, SlabId, SlabResult,
    SlabUsageError,
};
