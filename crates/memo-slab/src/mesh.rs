//! The mesh interface consumed by the slab: inter-slab transport and
//! slab directory. Out of scope for this crate's implementation: the mesh
//! is injected at construction and the slab only ever calls it, never locks
//! it or assumes anything about its internals.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use memo_common::{MemoId, PeerState, SlabId};
use rustc_hash::FxHashMap;

use crate::memo::Memo;

/// `remote_slab_id -> (memo_id -> peer_state)`, the shape `send_peering_changes`
/// batches a local operation's outbound deltas into.
pub type PeeringChanges = FxHashMap<SlabId, FxHashMap<MemoId, PeerState>>;

/// Inter-slab transport and slab directory. A single mesh is shared by every
/// slab in a process; slabs never acquire a lock on it directly, they only
/// ever call through this trait.
#[async_trait]
pub trait Mesh: Send + Sync {
    /// Registers a newly constructed slab with the mesh's directory.
    async fn register_slab(&self, slab_id: &SlabId);

    /// Sends a batch of peering deltas, keyed by destination slab, that
    /// originated from a single local peering operation.
    async fn send_peering_changes(&self, from_slab_id: &SlabId, changes: PeeringChanges);

    /// Best-effort: asks the mesh for up to `desired` slab ids willing to
    /// accept a replica, excluding `excluded`. May return fewer than
    /// `desired`, or none.
    async fn get_accepting_slab_ids(
        &self,
        excluded: &HashSet<SlabId>,
        desired: u32,
    ) -> Vec<SlabId>;

    /// Delivers a copy of `memo` to `to_slab_id`. Delivery may be
    /// asynchronous on the receiving end; the mesh is responsible for
    /// eventually calling `put_memo` (and/or `receive_peering_change`) on
    /// the receiver.
    async fn push_memo_to_slab(&self, from_slab_id: &SlabId, to_slab_id: &SlabId, memo: Arc<dyn Memo>);
}
