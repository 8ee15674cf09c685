//! The slab: an LRU-bounded, peering-aware, DAG-indexed memo store.
//!
//! A slab holds a bounded working set of memos, immutable facts that
//! compose, via shared record ids and parent links, into a record DAG whose
//! head memos (no resident child) materialize the record's current value.
//! Residency is governed by an LRU ring against a soft quota and hard limit;
//! a peering registry tracks which remote slabs participate in which
//! referenced memo so the replication guard can push a copy before an
//! eviction candidate is actually reclaimed.
//!
//! Mesh transport is injected at construction (see [`Mesh`]) and kept
//! entirely out of the pure bookkeeping structures (`MemoIndex`, `LruRing`,
//! `PeeringRegistry`): those return the deltas they computed, and only the
//! [`Slab`] facade decides whether and how to send them.

mod config;
mod index;
mod lru;
mod memo;
mod mesh;
mod peering;
mod replication;
mod slab;
mod subscription;

pub use config::{SlabConfig, DEFAULT_LIMIT, DEFAULT_QUOTA, MAX_SLABS_PER_PROCESS};
pub use index::MemoIndex;
pub use lru::LruRing;
pub use memo::Memo;
pub use mesh::{Mesh, PeeringChanges};
pub use peering::{PeeringRegistry, RefPeering};
pub use replication::check_memo_replication_factor;
pub use slab::Slab;
pub use subscription::{RecordObserver, SubscriptionRegistry};

pub use memo_common::{to_base36, MemoId, PeerState, RecordId, SlabId};
pub use memo_common::{SlabConstructionError, SlabError, SlabResult, SlabUsageError};
