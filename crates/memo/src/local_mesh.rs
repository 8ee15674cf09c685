//! An in-process [`Mesh`]: a directory and transport for slabs that all live
//! in the same address space. Grounded in the same shape as a mock
//! transport: a registry of handles a caller wires up explicitly, rather
//! than any real network discovery.
//!
//! `register_slab` only records that an id exists (it's called from inside
//! `Slab::with_config`, before the caller has anything to hand back to the
//! mesh). Routing pushes and peering changes to an actual `Slab` requires a
//! second step, [`LocalMesh::attach`], once the caller has the constructed
//! slab in hand.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use memo_common::SlabId;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::Mutex as AsyncMutex;

use memo_slab::{Mesh, PeeringChanges, Slab};

#[derive(Default)]
struct Directory {
    known: FxHashSet<SlabId>,
    handles: FxHashMap<SlabId, Arc<AsyncMutex<Slab>>>,
}

/// Connects every slab constructed against it into one in-process mesh.
#[derive(Default)]
pub struct LocalMesh {
    directory: RwLock<Directory>,
}

impl LocalMesh {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wires `id` up to the live slab so pushes and peering changes
    /// addressed to it are actually delivered. Call this once right after
    /// constructing the slab.
    pub fn attach(&self, id: SlabId, slab: Arc<AsyncMutex<Slab>>) {
        let mut dir = self.directory.write();
        dir.known.insert(id.clone());
        dir.handles.insert(id, slab);
    }

    /// Removes a slab's routing entry, e.g. on shutdown. Leaves it in
    /// `known` so it's still reported by `get_accepting_slab_ids`; callers
    /// that want it fully gone should also exclude it themselves.
    pub fn detach(&self, id: &SlabId) {
        self.directory.write().handles.remove(id);
    }

    pub fn known_slab_count(&self) -> usize {
        self.directory.read().known.len()
    }
}

#[async_trait]
impl Mesh for LocalMesh {
    async fn register_slab(&self, slab_id: &SlabId) {
        self.directory.write().known.insert(slab_id.clone());
    }

    async fn send_peering_changes(&self, from_slab_id: &SlabId, changes: PeeringChanges) {
        for (to_slab_id, change) in changes {
            let handle = self.directory.read().handles.get(&to_slab_id).cloned();
            let Some(handle) = handle else {
                tracing::debug!(%to_slab_id, "send_peering_changes: no attached handle, dropping");
                continue;
            };
            handle.lock().await.receive_peering_change(from_slab_id, &change);
        }
    }

    async fn get_accepting_slab_ids(&self, excluded: &HashSet<SlabId>, desired: u32) -> Vec<SlabId> {
        self.directory
            .read()
            .known
            .iter()
            .filter(|id| !excluded.contains(*id))
            .take(desired as usize)
            .cloned()
            .collect()
    }

    async fn push_memo_to_slab(
        &self,
        from_slab_id: &SlabId,
        to_slab_id: &SlabId,
        memo: Arc<dyn memo_slab::Memo>,
    ) {
        let handle = self.directory.read().handles.get(to_slab_id).cloned();
        let Some(handle) = handle else {
            tracing::debug!(%to_slab_id, "push_memo_to_slab: no attached handle, dropping");
            return;
        };
        tracing::trace!(from = %from_slab_id, to = %to_slab_id, memo_id = %memo.id(), "routing push");
        handle.lock().await.put_memo(memo).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimpleMemo;

    #[tokio::test]
    async fn pushes_route_between_attached_slabs() {
        let mesh = LocalMesh::new();
        let mesh_dyn: Arc<dyn Mesh> = mesh.clone();
        let a = Arc::new(AsyncMutex::new(
            Slab::new("A", mesh_dyn.clone()).await.unwrap(),
        ));
        mesh.attach(SlabId::from("A"), a.clone());
        let b = Arc::new(AsyncMutex::new(
            Slab::new("B", mesh_dyn.clone()).await.unwrap(),
        ));
        mesh.attach(SlabId::from("B"), b.clone());

        let memo = SimpleMemo::new("m1", "r1", vec![], 1);
        a.lock().await.put_memo(memo.clone()).await;

        assert!(b.lock().await.contains_memo(memo.id()));
    }

    #[tokio::test]
    async fn push_to_unattached_target_is_a_dropped_noop() {
        let mesh = LocalMesh::new();
        mesh.register_slab(&SlabId::from("ghost")).await;
        let memo: Arc<dyn memo_slab::Memo> = SimpleMemo::new("m1", "r1", vec![], 0);
        mesh.push_memo_to_slab(&SlabId::from("A"), &SlabId::from("ghost"), memo)
            .await;
    }
}
