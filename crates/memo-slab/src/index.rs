//! Memo index: memo-id -> memo, plus the per-record and per-parent
//! reverse indexes that make head-memo computation O(1).

use std::sync::Arc;

use memo_common::{MemoId, RecordId};
use rustc_hash::FxHashMap;

use crate::memo::Memo;

#[derive(Default)]
pub struct MemoIndex {
    memos_by_id: FxHashMap<MemoId, Arc<dyn Memo>>,
    memo_ids_by_record: FxHashMap<RecordId, Vec<MemoId>>,
    /// parent-memo-id -> resident child ids citing it. See DESIGN.md for
    /// why this is a set rather than the single-child mapping the source
    /// conflates it with.
    memo_ids_by_parent: FxHashMap<MemoId, Vec<MemoId>>,
}

impl MemoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.memos_by_id.len()
    }

    pub fn contains(&self, id: &MemoId) -> bool {
        self.memos_by_id.contains_key(id)
    }

    pub fn lookup(&self, id: &MemoId) -> Option<Arc<dyn Memo>> {
        self.memos_by_id.get(id).cloned()
    }

    pub fn has_memos_for_record(&self, rid: &RecordId) -> bool {
        self.memo_ids_by_record
            .get(rid)
            .is_some_and(|v| !v.is_empty())
    }

    pub fn memos_for_record(&self, rid: &RecordId) -> impl Iterator<Item = Arc<dyn Memo>> + '_ {
        self.memo_ids_by_record
            .get(rid)
            .into_iter()
            .flatten()
            .filter_map(|id| self.memos_by_id.get(id).cloned())
    }

    /// The resident child ids citing `parent_id` as a parent.
    pub fn children_of(&self, parent_id: &MemoId) -> &[MemoId] {
        self.memo_ids_by_parent
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_head(&self, id: &MemoId) -> bool {
        !self
            .memo_ids_by_parent
            .get(id)
            .is_some_and(|children| !children.is_empty())
    }

    /// Inserts `memo`, keyed by `memo.id()`. Idempotent: a no-op (returns
    /// `false`) if the id is already present: no reverse-index update, no
    /// caller-visible side effect at all. Replication delivery may duplicate
    /// puts and this contract is what makes that safe.
    pub fn insert(&mut self, memo: Arc<dyn Memo>) -> bool {
        if self.memos_by_id.contains_key(memo.id()) {
            return false;
        }
        let id = memo.id().clone();
        self.memo_ids_by_record
            .entry(memo.record_id().clone())
            .or_default()
            .push(id.clone());
        for parent in memo.parents() {
            self.memo_ids_by_parent
                .entry(parent.clone())
                .or_default()
                .push(id.clone());
        }
        self.memos_by_id.insert(id, memo);
        true
    }

    /// Removes `id` from all three indexes. No-op if unknown.
    pub fn remove(&mut self, id: &MemoId) -> Option<Arc<dyn Memo>> {
        let memo = self.memos_by_id.remove(id)?;
        if let Some(ids) = self.memo_ids_by_record.get_mut(memo.record_id()) {
            ids.retain(|x| x != id);
            if ids.is_empty() {
                self.memo_ids_by_record.remove(memo.record_id());
            }
        }
        for parent in memo.parents() {
            if let Some(children) = self.memo_ids_by_parent.get_mut(parent) {
                children.retain(|x| x != id);
                if children.is_empty() {
                    self.memo_ids_by_parent.remove(parent);
                }
            }
        }
        Some(memo)
    }
}
