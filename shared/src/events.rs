use std::vec::IntoIter;

use crate::{performance::StateChange, types::ChoreographerId};

/// Something a session reports back to the game after a tick or packet
#[derive(Clone, Debug, PartialEq)]
pub enum ChoreographyEvent {
    /// A performance was created and registered
    Started {
        id: ChoreographerId,
        template: String,
    },
    /// A performance moved to another state
    StateChanged {
        id: ChoreographerId,
        change: StateChange,
    },
    /// A performance was unregistered after its deletion delay
    Deleted { id: ChoreographerId },
    /// A client received a new replica
    ReplicaCreated {
        id: ChoreographerId,
        template: String,
    },
    /// A client dropped a replica on the server's request
    ReplicaRemoved { id: ChoreographerId },
}

impl ChoreographyEvent {
    pub fn id(&self) -> ChoreographerId {
        match self {
            ChoreographyEvent::Started { id, .. }
            | ChoreographyEvent::StateChanged { id, .. }
            | ChoreographyEvent::Deleted { id }
            | ChoreographyEvent::ReplicaCreated { id, .. }
            | ChoreographyEvent::ReplicaRemoved { id } => *id,
        }
    }
}

/// Events buffered until the game reads them
#[derive(Default)]
pub struct ChoreographyEvents {
    events: Vec<ChoreographyEvent>,
}

impl ChoreographyEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn push(&mut self, event: ChoreographyEvent) {
        self.events.push(event);
    }

    /// Takes every buffered event, oldest first
    pub fn read(&mut self) -> IntoIter<ChoreographyEvent> {
        std::mem::take(&mut self.events).into_iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChoreographyEvent> {
        self.events.iter()
    }
}
