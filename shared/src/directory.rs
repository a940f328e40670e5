use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use crate::{
    effect::NamedEffects,
    performance::Performance,
    types::{ChoreographerId, UNREGISTERED_ID},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// Id 0 is reserved for unregistered choreographers
    #[error("choreographer id 0 is reserved")]
    ZeroId,
    /// Another performance is already registered under this id
    #[error("choreographer id {id} is already registered")]
    DuplicateId { id: ChoreographerId },
}

/// Order in which registered performances are processed each tick
#[derive(Clone, Debug, Default)]
pub struct ProcessOrder {
    ids: Vec<ChoreographerId>,
}

impl ProcessOrder {
    pub fn push(&mut self, id: ChoreographerId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: ChoreographerId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.ids.remove(index);
        true
    }

    /// Moves `id` directly behind `dependency` if it currently runs before it.
    /// Unknown ids leave the order unchanged.
    pub fn move_after(&mut self, id: ChoreographerId, dependency: ChoreographerId) {
        let (Some(index), Some(dependency_index)) = (self.position(id), self.position(dependency))
        else {
            return;
        };
        if index > dependency_index {
            return;
        }
        self.ids.remove(index);
        // dependency shifted one slot left
        self.ids.insert(dependency_index, id);
    }

    pub fn runs_before(&self, first: ChoreographerId, second: ChoreographerId) -> bool {
        match (self.position(first), self.position(second)) {
            (Some(first), Some(second)) => first < second,
            _ => false,
        }
    }

    pub fn ids(&self) -> &[ChoreographerId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn position(&self, id: ChoreographerId) -> Option<usize> {
        self.ids.iter().position(|other| *other == id)
    }
}

/// Every live performance of one session, keyed by choreographer id.
///
/// The server allocates ids here; a client inserts replicas under the ids the
/// server sent.
pub struct Directory {
    performances: HashMap<ChoreographerId, Box<dyn Performance>>,
    process_order: ProcessOrder,
    next_id: ChoreographerId,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    pub fn new() -> Self {
        Self {
            performances: HashMap::new(),
            process_order: ProcessOrder::default(),
            next_id: 1,
        }
    }

    /// Assigns a fresh nonzero id and takes ownership of the performance
    pub fn register(&mut self, mut performance: Box<dyn Performance>) -> ChoreographerId {
        let id = self.generate_id();
        performance.choreographer_mut().set_id(id);
        self.performances.insert(id, performance);
        self.process_order.push(id);
        debug!("registered choreographer {}", id);
        id
    }

    pub fn insert_with_id(
        &mut self,
        id: ChoreographerId,
        mut performance: Box<dyn Performance>,
    ) -> Result<(), DirectoryError> {
        if id == UNREGISTERED_ID {
            return Err(DirectoryError::ZeroId);
        }
        if self.performances.contains_key(&id) {
            return Err(DirectoryError::DuplicateId { id });
        }
        performance.choreographer_mut().set_id(id);
        self.performances.insert(id, performance);
        self.process_order.push(id);
        Ok(())
    }

    /// Removes the performance and hands it back with its id reset to 0
    pub fn unregister(&mut self, id: ChoreographerId) -> Option<Box<dyn Performance>> {
        let mut performance = self.performances.remove(&id)?;
        self.process_order.remove(id);
        performance.choreographer_mut().set_id(UNREGISTERED_ID);
        debug!("unregistered choreographer {}", id);
        Some(performance)
    }

    pub fn get(&self, id: ChoreographerId) -> Option<&dyn Performance> {
        self.performances.get(&id).map(|performance| performance.as_ref())
    }

    pub fn get_mut(&mut self, id: ChoreographerId) -> Option<&mut Box<dyn Performance>> {
        self.performances.get_mut(&id)
    }

    pub fn contains(&self, id: ChoreographerId) -> bool {
        self.performances.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.performances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.performances.is_empty()
    }

    /// Ids in process order
    pub fn ids(&self) -> Vec<ChoreographerId> {
        self.process_order.ids().to_vec()
    }

    pub fn process_order(&self) -> &ProcessOrder {
        &self.process_order
    }

    /// Moves `id` behind the owners of any named effects its constraints
    /// follow
    pub fn adjust_process_ordering(&mut self, id: ChoreographerId, named_effects: &NamedEffects) {
        let Self {
            performances,
            process_order,
            ..
        } = self;
        let Some(performance) = performances.get(&id) else {
            warn!("cannot reorder unknown choreographer {}", id);
            return;
        };
        performance
            .choreographer()
            .constraint_manager()
            .adjust_process_ordering(id, named_effects, process_order);
    }

    fn generate_id(&mut self) -> ChoreographerId {
        loop {
            let id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1);
            if self.next_id == UNREGISTERED_ID {
                self.next_id = 1;
            }
            if !self.performances.contains_key(&id) {
                return id;
            }
        }
    }
}
