//! Record subscriptions: notifies live record observers when new
//! memos for their record arrive, and protects head memos of subscribed
//! records from eviction.

use std::sync::Arc;

use memo_common::RecordId;
use rustc_hash::FxHashMap;

use crate::memo::Memo;

/// A materialized-view consumer for a single record. The slab never
/// constructs these; it only holds onto whatever the caller hands to
/// [`crate::Slab::subscribe_record`].
pub trait RecordObserver: Send + Sync {
    fn record_id(&self) -> &RecordId;

    /// Called once per `put_memo` that lands a memo for this record,
    /// synchronously and (by contract, per the caller) quickly enough to
    /// invoke re-entrantly.
    fn added_memos(&self, memos: &[Arc<dyn Memo>]);
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    records_by_id: FxHashMap<RecordId, Vec<Arc<dyn RecordObserver>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `observer` to its record's subscriber list if not already
    /// present. Returns whether it was newly added.
    pub fn subscribe(&mut self, observer: Arc<dyn RecordObserver>) -> bool {
        let list = self
            .records_by_id
            .entry(observer.record_id().clone())
            .or_default();
        if list.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            return false;
        }
        list.push(observer);
        true
    }

    /// Removes `observer` from `rid`'s subscriber list. Not specified by
    /// the original design (it only documents subscribe); added so callers
    /// have a way to stop receiving notifications.
    pub fn unsubscribe(&mut self, rid: &RecordId, observer: &Arc<dyn RecordObserver>) -> bool {
        let Some(list) = self.records_by_id.get_mut(rid) else {
            return false;
        };
        let before = list.len();
        list.retain(|o| !Arc::ptr_eq(o, observer));
        let removed = list.len() != before;
        if list.is_empty() {
            self.records_by_id.remove(rid);
        }
        removed
    }

    pub fn has_subscribers(&self, rid: &RecordId) -> bool {
        self.records_by_id.get(rid).is_some_and(|v| !v.is_empty())
    }

    pub fn notify_added(&self, rid: &RecordId, memos: &[Arc<dyn Memo>]) {
        if let Some(list) = self.records_by_id.get(rid) {
            for observer in list {
                observer.added_memos(memos);
            }
        }
    }
}
