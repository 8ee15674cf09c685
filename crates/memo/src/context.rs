//! The per-client context handle: a causal-barrier collaborator the slab
//! hands out but does not otherwise define. Left intentionally thin.

use memo_common::SlabId;
use memo_slab::Slab;

/// An opaque handle scoping a client's view of a slab as of the moment it
/// was created. Establishing exactly what "as of" means (a version vector, a
/// frontier, a timestamp) is left to whatever caller-specific collaborator
/// constructs one; this type is just the identity and origin it's tagged
/// with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    slab_id: SlabId,
    token: u64,
}

impl Context {
    fn new(slab_id: SlabId, token: u64) -> Self {
        Self { slab_id, token }
    }

    /// Mints a context against `slab`, tagging it with the slab's identity
    /// and the next token in its monotonic per-slab sequence.
    pub fn create(slab: &Slab) -> Self {
        Self::new(slab.id().clone(), slab.next_context_token())
    }

    /// The slab this context was created against.
    pub fn slab_id(&self) -> &SlabId {
        &self.slab_id
    }

    /// Opaque monotonic token, unique within the originating slab.
    pub fn token(&self) -> u64 {
        self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalMesh, Mesh};
    use std::sync::Arc;

    #[tokio::test]
    async fn contexts_from_the_same_slab_carry_distinct_increasing_tokens() {
        let mesh: Arc<dyn Mesh> = LocalMesh::new();
        let slab = Slab::new("A", mesh).await.unwrap();

        let c1 = Context::create(&slab);
        let c2 = Context::create(&slab);

        assert_eq!(c1.slab_id(), &SlabId::from("A"));
        assert_eq!(c2.slab_id(), &SlabId::from("A"));
        assert!(c2.token() > c1.token());
    }
}
