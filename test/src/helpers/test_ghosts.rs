use std::collections::HashMap;

use choreo_shared::{GhostIndex, GhostLookup, GhostResolve, ObjectRef, ScopeId};

/// Ghost table of one connection, usable on both ends of a test link
#[derive(Default)]
pub struct TestGhosts {
    ghosts: HashMap<ObjectRef, GhostIndex>,
    scope_ids: HashMap<ObjectRef, ScopeId>,
}

impl TestGhosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ghost(&mut self, object: ObjectRef, index: GhostIndex) {
        self.ghosts.insert(object, index);
    }

    pub fn unghost(&mut self, object: ObjectRef) {
        self.ghosts.remove(&object);
    }

    pub fn scope(&mut self, object: ObjectRef, scope_id: ScopeId) {
        self.scope_ids.insert(object, scope_id);
    }
}

impl GhostLookup for TestGhosts {
    fn ghost_index(&self, object: ObjectRef) -> Option<GhostIndex> {
        self.ghosts.get(&object).copied()
    }

    fn scope_id(&self, object: ObjectRef) -> Option<ScopeId> {
        self.scope_ids.get(&object).copied()
    }
}

impl GhostResolve for TestGhosts {
    fn resolve_ghost(&self, index: GhostIndex) -> Option<ObjectRef> {
        self.ghosts
            .iter()
            .find(|(_, ghost)| **ghost == index)
            .map(|(object, _)| *object)
    }

    fn resolve_scope_id(&self, scope_id: ScopeId) -> Option<ObjectRef> {
        self.scope_ids
            .iter()
            .find(|(_, scope)| **scope == scope_id)
            .map(|(object, _)| *object)
    }
}
