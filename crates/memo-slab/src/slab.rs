//! The slab facade: the public surface tying together the memo index,
//! LRU ring, peering registry, replication guard, eviction engine and
//! record subscriptions into the single `put/get/evict/kill` API a caller
//! sees.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use memo_common::{
    to_base36, MemoId, PeerState, RecordId, SlabConstructionError, SlabId, SlabResult,
    SlabUsageError,
};
use rustc_hash::FxHashMap;

use crate::config::{SlabConfig, MAX_SLABS_PER_PROCESS};
use crate::index::MemoIndex;
use crate::lru::LruRing;
use crate::memo::Memo;
use crate::mesh::Mesh;
use crate::peering::PeeringRegistry;
use crate::replication;
use crate::subscription::{RecordObserver, SubscriptionRegistry};

/// Process-wide count of live slabs, enforcing the 1296-slab (two-digit
/// base-36) cap described in the slab facade's configuration contract.
static SLAB_COUNT: AtomicUsize = AtomicUsize::new(0);

/// A single in-memory, LRU-bounded, peering-aware memo store.
pub struct Slab {
    id: SlabId,
    config: SlabConfig,
    size: usize,
    index: MemoIndex,
    lru: LruRing,
    peering: PeeringRegistry,
    subscriptions: SubscriptionRegistry,
    mesh: Arc<dyn Mesh>,
    child_counter: AtomicU64,
    context_counter: AtomicU64,
}

impl Slab {
    /// Constructs a slab with the default quota (5) and limit (10).
    pub async fn new(id: impl Into<SlabId>, mesh: Arc<dyn Mesh>) -> SlabResult<Self> {
        Self::with_config(id, mesh, SlabConfig::default()).await
    }

    pub async fn with_config(
        id: impl Into<SlabId>,
        mesh: Arc<dyn Mesh>,
        config: SlabConfig,
    ) -> SlabResult<Self> {
        let id = id.into();
        if id.as_str().is_empty() {
            return Err(SlabConstructionError::EmptyId.into());
        }
        if config.quota > config.limit {
            return Err(SlabConstructionError::QuotaExceedsLimit {
                quota: config.quota,
                limit: config.limit,
            }
            .into());
        }

        reserve_slab_slot()?;
        mesh.register_slab(&id).await;

        tracing::debug!(slab_id = %id, quota = config.quota, limit = config.limit, "slab constructed");
        Ok(Self {
            id,
            config,
            size: 0,
            index: MemoIndex::new(),
            lru: LruRing::new(),
            peering: PeeringRegistry::new(),
            subscriptions: SubscriptionRegistry::new(),
            mesh,
            child_counter: AtomicU64::new(0),
            context_counter: AtomicU64::new(0),
        })
    }

    pub fn id(&self) -> &SlabId {
        &self.id
    }

    pub fn quota(&self) -> usize {
        self.config.quota
    }

    pub fn limit(&self) -> usize {
        self.config.limit
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains_memo(&self, id: &MemoId) -> bool {
        self.index.contains(id)
    }

    /// Slab-scoped monotonic id in base-36, e.g. for minting new memo ids
    /// derived from this slab without a central allocator.
    pub fn gen_child_id(&self) -> String {
        let n = self.child_counter.fetch_add(1, Ordering::SeqCst);
        format!("{}{}", self.id, to_base36(n))
    }

    /// Returns the memo and promotes it to the LRU tail. A memo already at
    /// the tail is returned unchanged.
    pub fn get_memo(&mut self, id: &MemoId) -> Option<Arc<dyn Memo>> {
        let memo = self.index.lookup(id)?;
        self.lru.promote_to_tail(id);
        Some(memo)
    }

    /// The end-to-end put-memo protocol: index, notify, link,
    /// self-peer, fire off replication, evicting down to quota first if
    /// this insertion pushes residency over the limit.
    ///
    /// Idempotent: a duplicate id is a silent no-op, matching replication
    /// delivery's at-least-once semantics.
    pub async fn put_memo(&mut self, memo: Arc<dyn Memo>) {
        let id = memo.id().clone();
        if self.index.contains(&id) {
            return;
        }

        let rid = memo.record_id().clone();
        self.index.insert(memo.clone());
        self.subscriptions
            .notify_added(&rid, std::slice::from_ref(&memo));

        self.lru.push_tail(id.clone());
        self.size += 1;
        if self.size > self.config.limit {
            self.evict_memos().await;
        }

        let changes =
            self.peering
                .register_memo_peering(&id, &self.id, &id, &self.id, PeerState::HasCopy);
        if !changes.is_empty() {
            self.mesh.send_peering_changes(&self.id, changes).await;
        }

        let _ =
            replication::check_memo_replication_factor(&memo, &self.id, &self.peering, &self.mesh)
                .await;
    }

    /// Evicts victims starting at the LRU head until `size <= quota`.
    pub async fn evict_memos(&mut self) {
        let mut current = self.lru.head().cloned();
        while self.size > self.config.quota {
            let Some(id) = current else {
                break;
            };
            let next = self.lru.next_of(&id);
            self.evict_memo(&id).await;
            current = next;
        }
    }

    async fn evict_memo(&mut self, id: &MemoId) {
        let Some(memo) = self.index.lookup(id) else {
            tracing::warn!(memo_id = %id, "evict_memo: unknown memo, skipping");
            return;
        };

        memo.set_evicting(true);
        let guard = replication::check_memo_replication_factor(
            &memo,
            &self.id,
            &self.peering,
            &self.mesh,
        )
        .await;

        match guard {
            Ok(()) => {
                if let Err(e) = self.kill_memo(id).await {
                    memo.set_evicting(false);
                    tracing::debug!(memo_id = %id, error = %e, "evict_memo: kill refused, retrying next cycle");
                }
            }
            Err(e) => {
                memo.set_evicting(false);
                tracing::warn!(memo_id = %id, error = %e, "evict_memo: replication guard failed, leaving resident");
            }
        }
    }

    /// Unconditional variant of eviction: skips the replication guard.
    /// Still refuses to kill a protected head memo.
    pub async fn kill_memo(&mut self, id: &MemoId) -> SlabResult<()> {
        let Some(memo) = self.index.lookup(id) else {
            tracing::warn!(memo_id = %id, "kill_memo: unknown memo");
            return Err(SlabUsageError::UnknownMemo(id.clone()).into());
        };

        if self.subscriptions.has_subscribers(memo.record_id()) && self.index.is_head(id) {
            return Err(SlabUsageError::ProtectedHead(id.clone()).into());
        }

        self.index.remove(id);
        let changes = self.peering.deregister_peering_for_memo(id);
        self.lru.unlink(id);
        self.size -= 1;

        if !changes.is_empty() {
            self.mesh.send_peering_changes(&self.id, changes).await;
        }
        Ok(())
    }

    pub fn subscribe_record(&mut self, observer: Arc<dyn RecordObserver>) -> bool {
        self.subscriptions.subscribe(observer)
    }

    pub fn unsubscribe_record(&mut self, rid: &RecordId, observer: &Arc<dyn RecordObserver>) -> bool {
        self.subscriptions.unsubscribe(rid, observer)
    }

    pub fn get_head_memos_for_record(&self, rid: &RecordId) -> Vec<Arc<dyn Memo>> {
        self.index
            .memos_for_record(rid)
            .filter(|m| self.index.is_head(m.id()))
            .collect()
    }

    pub fn get_head_memo_ids_for_record(&self, rid: &RecordId) -> Vec<MemoId> {
        self.index
            .memos_for_record(rid)
            .filter(|m| self.index.is_head(m.id()))
            .map(|m| m.id().clone())
            .collect()
    }

    pub async fn register_memo_peering(
        &mut self,
        memo_id: &MemoId,
        ref_memo_id: &MemoId,
        remote_slab_id: &SlabId,
        state: PeerState,
        silent: bool,
    ) {
        let changes = self.peering.register_memo_peering(
            memo_id,
            &self.id,
            ref_memo_id,
            remote_slab_id,
            state,
        );
        if !silent && !changes.is_empty() {
            self.mesh.send_peering_changes(&self.id, changes).await;
        }
    }

    pub async fn update_memo_peerings(
        &mut self,
        memo_id: &MemoId,
        peerings: &FxHashMap<MemoId, FxHashMap<SlabId, PeerState>>,
        silent: bool,
    ) {
        let changes = self.peering.update_memo_peerings(memo_id, &self.id, peerings);
        if !silent && !changes.is_empty() {
            self.mesh.send_peering_changes(&self.id, changes).await;
        }
    }

    pub fn receive_peering_change(&mut self, sender: &SlabId, change: &FxHashMap<MemoId, PeerState>) {
        self.peering.receive_peering_change(sender, change);
    }

    pub fn get_peerings_for_memo(
        &self,
        memo_id: &MemoId,
        include_self: bool,
    ) -> Vec<(MemoId, FxHashMap<SlabId, PeerState>)> {
        self.peering.get_peerings_for_memo(memo_id, include_self)
    }

    pub fn get_memo_peers(&self, memo_id: &MemoId, must_have_copy: bool) -> Option<Vec<SlabId>> {
        self.peering.get_memo_peers(memo_id, must_have_copy)
    }

    /// Monotonic per-slab token, unique within this slab, for minting a
    /// causal-barrier handle. The slab itself stays agnostic to what a
    /// `Context` is (that type lives with whatever collaborator defines it);
    /// it only hands out the identity and an ever-increasing token.
    pub fn next_context_token(&self) -> u64 {
        self.context_counter.fetch_add(1, Ordering::SeqCst)
    }
}

impl Drop for Slab {
    fn drop(&mut self) {
        SLAB_COUNT.fetch_sub(1, Ordering::SeqCst);
    }
}

fn reserve_slab_slot() -> SlabResult<()> {
    loop {
        let current = SLAB_COUNT.load(Ordering::SeqCst);
        if current >= MAX_SLABS_PER_PROCESS {
            return Err(SlabConstructionError::MeshFull(MAX_SLABS_PER_PROCESS).into());
        }
        if SLAB_COUNT
            .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PeeringChanges;
    use async_trait::async_trait;
    use memo_common::SlabError;
    use std::collections::HashSet;

    #[derive(Default)]
    struct NullMesh;

    #[async_trait]
    impl Mesh for NullMesh {
        async fn register_slab(&self, _slab_id: &SlabId) {}
        async fn send_peering_changes(&self, _from: &SlabId, _changes: PeeringChanges) {}
        async fn get_accepting_slab_ids(
            &self,
            _excluded: &HashSet<SlabId>,
            _desired: u32,
        ) -> Vec<SlabId> {
            Vec::new()
        }
        async fn push_memo_to_slab(&self, _from: &SlabId, _to: &SlabId, _memo: Arc<dyn Memo>) {}
    }

    #[tokio::test]
    async fn construction_rejects_empty_id() {
        let mesh: Arc<dyn Mesh> = Arc::new(NullMesh);
        let err = Slab::new("", mesh).await.unwrap_err();
        assert_eq!(
            err,
            SlabError::Construction(SlabConstructionError::EmptyId)
        );
    }

    #[tokio::test]
    async fn construction_rejects_quota_exceeding_limit() {
        let mesh: Arc<dyn Mesh> = Arc::new(NullMesh);
        let err = Slab::with_config("dup-test-quota", mesh, SlabConfig::new(10, 5))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SlabError::Construction(SlabConstructionError::QuotaExceedsLimit {
                quota: 10,
                limit: 5
            })
        );
    }
}
