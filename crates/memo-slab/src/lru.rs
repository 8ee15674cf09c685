//! Doubly-linked recency list over resident memo ids.
//!
//! Modeled as an arena of link nodes keyed by [`MemoId`] rather than an
//! intrusive pointer list: every memo already lives in `memos_by_id`, so the
//! ring only needs to track `prev`/`next` per id. `head` is the least
//! recently used id, `tail` the most recently used.

use memo_common::MemoId;
use rustc_hash::FxHashMap;

#[derive(Debug, Default, Clone)]
struct Link {
    prev: Option<MemoId>,
    next: Option<MemoId>,
}

#[derive(Debug, Default)]
pub struct LruRing {
    links: FxHashMap<MemoId, Link>,
    head: Option<MemoId>,
    tail: Option<MemoId>,
}

impl LruRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn head(&self) -> Option<&MemoId> {
        self.head.as_ref()
    }

    pub fn tail(&self) -> Option<&MemoId> {
        self.tail.as_ref()
    }

    pub fn contains(&self, id: &MemoId) -> bool {
        self.links.contains_key(id)
    }

    /// Links `id` at the tail. `id` must not already be present.
    pub fn push_tail(&mut self, id: MemoId) {
        debug_assert!(!self.links.contains_key(&id));
        let prev = self.tail.clone();
        if let Some(prev_id) = &prev {
            if let Some(prev_link) = self.links.get_mut(prev_id) {
                prev_link.next = Some(id.clone());
            }
        } else {
            self.head = Some(id.clone());
        }
        self.links.insert(
            id.clone(),
            Link {
                prev,
                next: None,
            },
        );
        self.tail = Some(id);
    }

    /// Unlinks `id` from wherever it sits in the ring, fixing up
    /// `head`/`tail` and the neighbors' links. No-op if `id` is absent.
    pub fn unlink(&mut self, id: &MemoId) {
        let Some(link) = self.links.remove(id) else {
            return;
        };
        match &link.prev {
            Some(prev_id) => {
                if let Some(prev_link) = self.links.get_mut(prev_id) {
                    prev_link.next = link.next.clone();
                }
            }
            None => self.head = link.next.clone(),
        }
        match &link.next {
            Some(next_id) => {
                if let Some(next_link) = self.links.get_mut(next_id) {
                    next_link.prev = link.prev.clone();
                }
            }
            None => self.tail = link.prev.clone(),
        }
    }

    /// Unlink + re-append at tail. If `id` is already the tail this is a
    /// cheap no-op that still requires `id` be present.
    pub fn promote_to_tail(&mut self, id: &MemoId) {
        if self.tail.as_ref() == Some(id) {
            return;
        }
        if !self.links.contains_key(id) {
            return;
        }
        self.unlink(id);
        self.push_tail(id.clone());
    }

    /// The id immediately after `id` in recency order (towards the tail),
    /// captured before any mutation, used by the eviction loop so the walk
    /// survives victims unlinking themselves mid-iteration.
    pub fn next_of(&self, id: &MemoId) -> Option<MemoId> {
        self.links.get(id).and_then(|l| l.next.clone())
    }

    /// Ids from head (oldest) to tail (newest).
    pub fn iter_from_head(&self) -> impl Iterator<Item = MemoId> + '_ {
        let mut cur = self.head.clone();
        std::iter::from_fn(move || {
            let id = cur.take()?;
            cur = self.links.get(&id).and_then(|l| l.next.clone());
            Some(id)
        })
    }
}
