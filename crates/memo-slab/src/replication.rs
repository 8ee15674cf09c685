//! Replication guard: computes whether a memo has enough remote
//! copies and drives push-to-peer requests.
//!
//! Success here is optimistic: the guard schedules pushes and returns, it
//! does not wait for delivery acks. A future revision should await actual
//! acknowledgements before the eviction engine is allowed to kill a memo on
//! the strength of this result (see DESIGN.md).

use std::collections::HashSet;
use std::sync::Arc;

use memo_common::{SlabId, SlabResult};

use crate::memo::Memo;
use crate::mesh::Mesh;
use crate::peering::PeeringRegistry;

/// Checks `memo`'s replication factor and fires off pushes to close the
/// gap. Returns `Ok` optimistically, before any push has actually been
/// acknowledged: a push that never lands is the mesh's problem to retry,
/// not this call's. The `Result` shape is kept so the eviction engine
/// already has somewhere to plug in a future, acknowledgement-aware guard
/// without changing its call sites.
pub async fn check_memo_replication_factor(
    memo: &Arc<dyn Memo>,
    self_slab_id: &SlabId,
    peering: &PeeringRegistry,
    mesh: &Arc<dyn Mesh>,
) -> SlabResult<()> {
    let desired = memo.desired_replicas();
    if desired == 0 {
        return Ok(());
    }

    let mut excluded: HashSet<SlabId> = peering
        .get_memo_peers(memo.id(), true)
        .unwrap_or_default()
        .into_iter()
        .collect();
    excluded.insert(self_slab_id.clone());

    let targets = mesh.get_accepting_slab_ids(&excluded, desired).await;
    for target in targets {
        mesh.push_memo_to_slab(self_slab_id, &target, memo.clone())
            .await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::test_support::TestMemo;
    use crate::mesh::PeeringChanges;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingMesh {
        pushes: Mutex<Vec<(SlabId, SlabId)>>,
        offer: Vec<SlabId>,
    }

    #[async_trait]
    impl Mesh for RecordingMesh {
        async fn register_slab(&self, _slab_id: &SlabId) {}

        async fn send_peering_changes(&self, _from: &SlabId, _changes: PeeringChanges) {}

        async fn get_accepting_slab_ids(
            &self,
            _excluded: &HashSet<SlabId>,
            desired: u32,
        ) -> Vec<SlabId> {
            self.offer.iter().take(desired as usize).cloned().collect()
        }

        async fn push_memo_to_slab(
            &self,
            from_slab_id: &SlabId,
            to_slab_id: &SlabId,
            _memo: Arc<dyn Memo>,
        ) {
            self.pushes
                .lock()
                .push((from_slab_id.clone(), to_slab_id.clone()));
        }
    }

    #[tokio::test]
    async fn zero_desired_is_a_noop() {
        let mesh: Arc<dyn Mesh> = Arc::new(RecordingMesh {
            offer: vec!["B".into()],
            ..Default::default()
        });
        let reg = PeeringRegistry::new();
        let memo: Arc<dyn Memo> = TestMemo::new("m1", "r1", vec![], 0);
        check_memo_replication_factor(&memo, &"A".into(), &reg, &mesh)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pushes_to_up_to_desired_targets_excluding_self() {
        let recording = Arc::new(RecordingMesh {
            offer: vec!["B".into(), "C".into(), "D".into()],
            ..Default::default()
        });
        let mesh: Arc<dyn Mesh> = recording.clone();
        let reg = PeeringRegistry::new();
        let memo: Arc<dyn Memo> = TestMemo::new("m1", "r1", vec![], 2);
        check_memo_replication_factor(&memo, &"A".into(), &reg, &mesh)
            .await
            .unwrap();

        let pushes = recording.pushes.lock();
        assert_eq!(pushes.len(), 2);
        for (from, to) in pushes.iter() {
            assert_eq!(from, &SlabId::from("A"));
            assert_ne!(to, &SlabId::from("A"));
        }
    }
}
