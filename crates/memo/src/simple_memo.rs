//! A concrete, ready-to-use [`Memo`] implementation for callers that don't
//! need a custom value representation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use memo_common::{MemoId, RecordId};
use memo_slab::Memo;

/// An immutable fact: an id, the record it belongs to, the parents it
/// supersedes, and a replication target. Constructed once and shared behind
/// `Arc`. The slab never mutates it except for the advisory `evicting` flag.
#[derive(Debug)]
pub struct SimpleMemo {
    id: MemoId,
    record_id: RecordId,
    parents: Vec<MemoId>,
    desired_replicas: u32,
    evicting: AtomicBool,
}

impl SimpleMemo {
    pub fn new(
        id: impl Into<MemoId>,
        record_id: impl Into<RecordId>,
        parents: Vec<MemoId>,
        desired_replicas: u32,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            record_id: record_id.into(),
            parents,
            desired_replicas,
            evicting: AtomicBool::new(false),
        })
    }

    /// A memo with no parents and no replication requirement, the common
    /// case for local-only use.
    pub fn leaf(id: impl Into<MemoId>, record_id: impl Into<RecordId>) -> Arc<Self> {
        Self::new(id, record_id, Vec::new(), 0)
    }
}

impl Memo for SimpleMemo {
    fn id(&self) -> &MemoId {
        &self.id
    }

    fn record_id(&self) -> &RecordId {
        &self.record_id
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
