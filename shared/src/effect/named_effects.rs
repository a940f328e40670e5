use std::collections::HashMap;

use log::debug;

use crate::{math::Transform, types::ChoreographerId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NamedEffect {
    pub owner: ChoreographerId,
    pub transform: Option<Transform>,
}

/// Session-wide registry of effects published under a name, so that other
/// choreographers can constrain against them. The last registration wins.
#[derive(Default)]
pub struct NamedEffects {
    effects: HashMap<String, NamedEffect>,
}

impl NamedEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, owner: ChoreographerId, transform: Option<Transform>) {
        if let Some(previous) = self.effects.get(name) {
            if previous.owner != owner {
                debug!(
                    "named effect '{}' taken over by choreographer {} from {}",
                    name, owner, previous.owner
                );
            }
        }
        self.effects
            .insert(name.to_string(), NamedEffect { owner, transform });
    }

    /// Removes `name` only if `owner` is the one currently holding it
    pub fn unregister(&mut self, name: &str, owner: ChoreographerId) -> bool {
        match self.effects.get(name) {
            Some(effect) if effect.owner == owner => {
                self.effects.remove(name);
                true
            }
            _ => false,
        }
    }

    pub fn unregister_owner(&mut self, owner: ChoreographerId) {
        self.effects.retain(|_, effect| effect.owner != owner);
    }

    pub fn find(&self, name: &str) -> Option<&NamedEffect> {
        self.effects.get(name)
    }

    pub fn owner(&self, name: &str) -> Option<ChoreographerId> {
        self.effects.get(name).map(|effect| effect.owner)
    }

    pub fn transform(&self, name: &str) -> Option<Transform> {
        self.effects.get(name).and_then(|effect| effect.transform)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
