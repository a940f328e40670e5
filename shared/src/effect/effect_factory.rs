use std::collections::HashMap;

use log::warn;

use crate::{
    effect::{EffectKind, EffectPrimitive, EffectTemplate, EffectWrapper, Mooring, TimedEffect},
    types::ChoreographerId,
};

/// Creates effect instances for phrase entries
pub trait EffectFactory {
    /// Returns `None` when this host cannot build the entry's kind
    fn create_effect(
        &self,
        template: &EffectTemplate,
        owner: ChoreographerId,
    ) -> Option<Box<dyn EffectWrapper>>;
}

pub type PrimitiveBuilder = Box<dyn Fn(&EffectTemplate) -> Box<dyn EffectPrimitive>>;

/// Factory that wraps host-registered primitives in a [`TimedEffect`].
/// `Mooring` is always available.
pub struct PrimitiveFactory {
    builders: HashMap<EffectKind, PrimitiveBuilder>,
}

impl Default for PrimitiveFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimitiveFactory {
    pub fn new() -> Self {
        let mut factory = Self {
            builders: HashMap::new(),
        };
        factory.register(EffectKind::Mooring, |_| Box::new(Mooring::new()));
        factory
    }

    pub fn register<F>(&mut self, kind: EffectKind, builder: F) -> &mut Self
    where
        F: Fn(&EffectTemplate) -> Box<dyn EffectPrimitive> + 'static,
    {
        self.builders.insert(kind, Box::new(builder));
        self
    }

    pub fn supports(&self, kind: EffectKind) -> bool {
        self.builders.contains_key(&kind)
    }
}

impl EffectFactory for PrimitiveFactory {
    fn create_effect(
        &self,
        template: &EffectTemplate,
        owner: ChoreographerId,
    ) -> Option<Box<dyn EffectWrapper>> {
        let Some(builder) = self.builders.get(&template.kind) else {
            warn!(
                "no primitive registered for {:?}, effect omitted from choreographer {}",
                template.kind, owner
            );
            return None;
        };
        let primitive = builder(template);
        Some(Box::new(TimedEffect::new(template.clone(), primitive, owner)))
    }
}
