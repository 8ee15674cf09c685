//! Peering registry: tracks, per referenced memo, which local memos
//! reference it and which remote slabs participate and at what state.
//!
//! Mesh I/O is deliberately kept out of this module: every mutator returns
//! the batch of outbound changes it produced instead of sending them
//! itself, so the registry can be unit tested without a mesh and the
//! `Slab` facade decides whether a given call is `silent`.

use memo_common::{MemoId, PeerState, SlabId};
use rustc_hash::FxHashMap;

use crate::mesh::PeeringChanges;

/// Per-referenced-memo bookkeeping: which local memos reference it, and the
/// participation state of every remote slab that cares about it.
#[derive(Debug, Default, Clone)]
pub struct RefPeering {
    pub memos: Vec<MemoId>,
    pub remotes: FxHashMap<SlabId, PeerState>,
}

#[derive(Default)]
pub struct PeeringRegistry {
    local_peerings: FxHashMap<MemoId, Vec<MemoId>>,
    ref_peerings: FxHashMap<MemoId, RefPeering>,
}

impl PeeringRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_peerings_for(&self, memo_id: &MemoId) -> &[MemoId] {
        self.local_peerings
            .get(memo_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn ref_peering_for(&self, ref_memo_id: &MemoId) -> Option<&RefPeering> {
        self.ref_peerings.get(ref_memo_id)
    }

    /// Snapshot of `memo_id`'s peerings: `ref_memo_id -> remotes`. When
    /// `include_self` is false, the memo's self-peering entry (it always
    /// peers with its own id on insert) is omitted.
    pub fn get_peerings_for_memo(
        &self,
        memo_id: &MemoId,
        include_self: bool,
    ) -> Vec<(MemoId, FxHashMap<SlabId, PeerState>)> {
        self.local_peerings_for(memo_id)
            .iter()
            .filter(|ref_id| include_self || *ref_id != memo_id)
            .filter_map(|ref_id| {
                self.ref_peerings
                    .get(ref_id)
                    .map(|rp| (ref_id.clone(), rp.remotes.clone()))
            })
            .collect()
    }

    /// Remote slabs participating in `memo_id`: ids with state `HasCopy` if
    /// `must_have_copy`, otherwise any participating state. `None` means
    /// `memo_id` is not a known referenced memo at all.
    pub fn get_memo_peers(&self, memo_id: &MemoId, must_have_copy: bool) -> Option<Vec<SlabId>> {
        let rp = self.ref_peerings.get(memo_id)?;
        Some(
            rp.remotes
                .iter()
                .filter(|(_, state)| {
                    if must_have_copy {
                        state.has_copy()
                    } else {
                        state.is_participating()
                    }
                })
                .map(|(slab, _)| slab.clone())
                .collect(),
        )
    }

    /// Bulk peering update for `memo_id`. `peerings` maps each referenced
    /// memo id to the remote states the caller already knows about for it.
    /// Known remotes are never downgraded here, that only happens via
    /// [`Self::receive_peering_change`]. Returns the outbound deltas
    /// discovered, batched per remote slab.
    pub fn update_memo_peerings(
        &mut self,
        memo_id: &MemoId,
        self_slab_id: &SlabId,
        peerings: &FxHashMap<MemoId, FxHashMap<SlabId, PeerState>>,
    ) -> PeeringChanges {
        let mut changes: PeeringChanges = PeeringChanges::default();
        let local = self.local_peerings.entry(memo_id.clone()).or_default();

        for (ref_memo_id, remotes) in peerings {
            if !local.contains(ref_memo_id) {
                local.push(ref_memo_id.clone());
            }
            let rp = self.ref_peerings.entry(ref_memo_id.clone()).or_default();
            if !rp.memos.contains(memo_id) {
                rp.memos.push(memo_id.clone());
            }

            for (remote_slab_id, state) in remotes {
                if remote_slab_id == self_slab_id {
                    continue;
                }
                if rp.remotes.contains_key(remote_slab_id) {
                    continue;
                }
                rp.remotes.insert(remote_slab_id.clone(), *state);
                changes
                    .entry(remote_slab_id.clone())
                    .or_default()
                    .insert(memo_id.clone(), *state);
            }
        }

        changes
    }

    /// Registers a single `(ref_memo_id, remote_slab_id, state)` peering for
    /// `memo_id`. A thin wrapper over [`Self::update_memo_peerings`].
    pub fn register_memo_peering(
        &mut self,
        memo_id: &MemoId,
        self_slab_id: &SlabId,
        ref_memo_id: &MemoId,
        remote_slab_id: &SlabId,
        state: PeerState,
    ) -> PeeringChanges {
        let mut remotes = FxHashMap::default();
        remotes.insert(remote_slab_id.clone(), state);
        let mut peerings = FxHashMap::default();
        peerings.insert(ref_memo_id.clone(), remotes);
        self.update_memo_peerings(memo_id, self_slab_id, &peerings)
    }

    /// Inbound convergence from the mesh. Unknown memo ids are ignored:
    /// this is soft state, a stale or premature delivery simply has no
    /// effect.
    pub fn receive_peering_change(
        &mut self,
        sender: &SlabId,
        change: &FxHashMap<MemoId, PeerState>,
    ) {
        for (memo_id, state) in change {
            let Some(rp) = self.ref_peerings.get_mut(memo_id) else {
                continue;
            };
            if *state == PeerState::None {
                rp.remotes.remove(sender);
            } else {
                rp.remotes.insert(sender.clone(), *state);
            }
        }
    }

    /// Tears down all peerings `memo_id` holds as its kill is finalized.
    /// Returns the outbound changes announcing the departure to remaining
    /// remotes. Preserves the source's key asymmetry: the outbound change
    /// is keyed by `memo_id` (the departing memo), not by the referenced id
    /// whose remote list is being walked (see DESIGN.md).
    pub fn deregister_peering_for_memo(&mut self, memo_id: &MemoId) -> PeeringChanges {
        let mut changes: PeeringChanges = PeeringChanges::default();
        let Some(refs) = self.local_peerings.remove(memo_id) else {
            return changes;
        };

        for ref_id in refs {
            let Some(rp) = self.ref_peerings.get_mut(&ref_id) else {
                continue;
            };
            rp.memos.retain(|m| m != memo_id);
            if rp.memos.is_empty() {
                for remote in rp.remotes.keys() {
                    changes
                        .entry(remote.clone())
                        .or_default()
                        .insert(memo_id.clone(), PeerState::None);
                }
                self.ref_peerings.remove(&ref_id);
            }
        }

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_peering_registers_and_emits() {
        let mut reg = PeeringRegistry::new();
        let m1 = MemoId::from("m1");
        let me = SlabId::from("A");
        let remote = SlabId::from("X");

        let changes = reg.register_memo_peering(&m1, &me, &m1, &remote, PeerState::HasCopy);
        assert_eq!(
            changes.get(&remote).and_then(|m| m.get(&m1)),
            Some(&PeerState::HasCopy)
        );
        let rp = reg.ref_peering_for(&m1).unwrap();
        assert_eq!(rp.remotes.get(&remote), Some(&PeerState::HasCopy));
        assert!(rp.memos.contains(&m1));
    }

    #[test]
    fn known_remotes_are_not_downgraded_by_update() {
        let mut reg = PeeringRegistry::new();
        let m1 = MemoId::from("m1");
        let me = SlabId::from("A");
        let remote = SlabId::from("X");

        reg.register_memo_peering(&m1, &me, &m1, &remote, PeerState::HasCopy);
        let mut remotes = FxHashMap::default();
        remotes.insert(remote.clone(), PeerState::None);
        let mut peerings = FxHashMap::default();
        peerings.insert(m1.clone(), remotes);
        let changes = reg.update_memo_peerings(&m1, &me, &peerings);

        assert!(changes.is_empty());
        assert_eq!(
            reg.ref_peering_for(&m1).unwrap().remotes.get(&remote),
            Some(&PeerState::HasCopy)
        );
    }

    #[test]
    fn receive_peering_change_roundtrip() {
        let mut reg_b = PeeringRegistry::new();
        let m1 = MemoId::from("m1");
        let a = SlabId::from("A");
        let me = SlabId::from("B");
        // B already knows about m1 as a referenced memo (e.g. self-peered).
        reg_b.register_memo_peering(&m1, &me, &m1, &me, PeerState::HasCopy);

        let mut change = FxHashMap::default();
        change.insert(m1.clone(), PeerState::HasCopy);
        reg_b.receive_peering_change(&a, &change);
        assert_eq!(
            reg_b.ref_peering_for(&m1).unwrap().remotes.get(&a),
            Some(&PeerState::HasCopy)
        );

        let mut change_zero = FxHashMap::default();
        change_zero.insert(m1.clone(), PeerState::None);
        reg_b.receive_peering_change(&a, &change_zero);
        assert!(reg_b.ref_peering_for(&m1).unwrap().remotes.get(&a).is_none());
    }

    #[test]
    fn receive_peering_change_ignores_unknown_memo() {
        let mut reg = PeeringRegistry::new();
        let mut change = FxHashMap::default();
        change.insert(MemoId::from("ghost"), PeerState::HasCopy);
        reg.receive_peering_change(&SlabId::from("A"), &change);
        assert!(reg.ref_peering_for(&MemoId::from("ghost")).is_none());
    }

    #[test]
    fn deregister_removes_ref_peering_when_last_memo_leaves() {
        let mut reg = PeeringRegistry::new();
        let m1 = MemoId::from("m1");
        let me = SlabId::from("A");
        let remote = SlabId::from("X");
        reg.register_memo_peering(&m1, &me, &m1, &remote, PeerState::HasCopy);

        let changes = reg.deregister_peering_for_memo(&m1);
        assert_eq!(
            changes.get(&remote).and_then(|m| m.get(&m1)),
            Some(&PeerState::None)
        );
        assert!(reg.ref_peering_for(&m1).is_none());
        assert!(reg.local_peerings_for(&m1).is_empty());
    }

    #[test]
    fn get_memo_peers_distinguishes_has_copy_from_interested() {
        let mut reg = PeeringRegistry::new();
        let m1 = MemoId::from("m1");
        let me = SlabId::from("A");
        reg.register_memo_peering(&m1, &me, &m1, &SlabId::from("X"), PeerState::HasCopy);
        reg.register_memo_peering(&m1, &me, &m1, &SlabId::from("Y"), PeerState::Interested);

        let mut with_copy = reg.get_memo_peers(&m1, true).unwrap();
        with_copy.sort();
        assert_eq!(with_copy, vec![SlabId::from("X")]);

        let mut any = reg.get_memo_peers(&m1, false).unwrap();
        any.sort();
        assert_eq!(any, vec![SlabId::from("X"), SlabId::from("Y")]);

        assert!(reg.get_memo_peers(&MemoId::from("unknown"), false).is_none());
    }
}
