use std::collections::HashMap;

use choreo_shared::{ChoreographerId, UpdateMask};

/// What one connection has been sent about one performance
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct GhostRecord {
    pub mask: UpdateMask,
    pub created: bool,
    // created before the connection zoned in, the replica is waiting in Late
    pub awaiting_zone_in: bool,
}

/// Per-connection replication state
#[derive(Default)]
pub(crate) struct Connection {
    zoned_in: bool,
    ghosts: HashMap<ChoreographerId, GhostRecord>,
    removals: Vec<ChoreographerId>,
}

impl Connection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoned_in(&self) -> bool {
        self.zoned_in
    }

    /// Returns how many replicas were queued for a resync
    pub fn set_zoned_in(&mut self, zoned_in: bool) -> usize {
        self.zoned_in = zoned_in;
        if !zoned_in {
            return 0;
        }
        let mut resynced = 0;
        for ghost in self.ghosts.values_mut() {
            if ghost.created && ghost.awaiting_zone_in {
                ghost.awaiting_zone_in = false;
                ghost.mask |= UpdateMask::SYNC;
                resynced += 1;
            }
        }
        resynced
    }

    pub fn has_ghost(&self, id: ChoreographerId) -> bool {
        self.ghosts.contains_key(&id)
    }

    /// A removal still queued for `id` stays queued, so the client drops its
    /// old replica before the new Create arrives in the same packet
    pub fn add_ghost(&mut self, id: ChoreographerId) {
        self.ghosts.entry(id).or_default();
    }

    pub fn ghost_mut(&mut self, id: ChoreographerId) -> Option<&mut GhostRecord> {
        self.ghosts.get_mut(&id)
    }

    pub fn remove_ghost(&mut self, id: ChoreographerId) {
        if let Some(ghost) = self.ghosts.remove(&id) {
            if ghost.created && !self.removals.contains(&id) {
                self.removals.push(id);
            }
        }
    }

    pub fn mark_dirty(&mut self, id: ChoreographerId, mask: UpdateMask) {
        if let Some(ghost) = self.ghosts.get_mut(&id) {
            ghost.mask |= mask;
        }
    }

    pub fn take_removals(&mut self) -> Vec<ChoreographerId> {
        std::mem::take(&mut self.removals)
    }

    pub fn ghost_count(&self) -> usize {
        self.ghosts.len()
    }
}
