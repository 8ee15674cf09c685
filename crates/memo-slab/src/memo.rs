//! The memo interface consumed by the slab. A memo is constructed
//! and owned elsewhere (the wire layer, a test harness, a local facade); the
//! slab only ever reads its identity and parent set, and flips the
//! `evicting` advisory flag while a kill is in flight.

use memo_common::{MemoId, RecordId};

/// Capabilities the slab needs from a memo. Implementations are expected to
/// be cheap to clone (the slab stores them behind `Arc`) and `Send + Sync`
/// since they cross the async replication boundary.
pub trait Memo: std::fmt::Debug + Send + Sync {
    /// Globally unique, stable across slabs.
    fn id(&self) -> &MemoId;

    /// The record this memo belongs to.
    fn record_id(&self) -> &RecordId;

    /// The memo ids this memo supersedes. May be empty.
    fn parents(&self) -> &[MemoId];

    /// Replication target K >= 0. `0` means the replication guard is a
    /// no-op for this memo.
    fn desired_replicas(&self) -> u32;

    /// Marks (or clears) that eviction is in progress for this memo. Purely
    /// advisory: nothing in the slab reads it back, it exists for external
    /// observers (metrics, debugging) that inspect a memo mid-kill.
    fn set_evicting(&self, evicting: bool);

    /// Whether a kill is currently in flight for this memo.
    fn is_evicting(&self) -> bool;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    pub struct TestMemo {
        id: MemoId,
        rid: RecordId,
        parents: Vec<MemoId>,
        desired_replicas: u32,
        evicting: AtomicBool,
    }

    impl TestMemo {
        pub fn new(
            id: impl Into<MemoId>,
            rid: impl Into<RecordId>,
            parents: Vec<MemoId>,
            desired_replicas: u32,
        ) -> Arc<Self> {
            Arc::new(Self {
                id: id.into(),
                rid: rid.into(),
                parents,
                desired_replicas,
                evicting: AtomicBool::new(false),
            })
        }
    }

    impl Memo for TestMemo {
        fn id(&self) -> &MemoId {
            &self.id
        }

        fn record_id(&self) -> &RecordId {
            &self.rid
        }

        fn parents(&self) -> &[MemoId] {
            &self.parents
        }

        fn desired_replicas(&self) -> u32 {
            self.desired_replicas
        }

        fn set_evicting(&self, evicting: bool) {
            self.evicting.store(evicting, Ordering::SeqCst);
        }

        fn is_evicting(&self) -> bool {
            self.evicting.load(Ordering::SeqCst)
        }
    }
}
