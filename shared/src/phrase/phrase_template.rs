use std::sync::Arc;

use crate::{
    constraint::{ConstraintDef, ConstraintError},
    effect::EffectTemplate,
};

/// Immutable description of one phrase: its effect list and how long and how
/// often it plays.
#[derive(Clone, Debug, PartialEq)]
pub struct PhraseTemplate {
    pub effects: Arc<[EffectTemplate]>,
    /// Length of one pass in seconds. Negative means until stopped.
    pub duration: f32,
    /// Number of passes. Negative loops forever, 0 plays once.
    pub loop_count: i32,
}

impl Default for PhraseTemplate {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PhraseTemplate {
    pub fn new(effects: Vec<EffectTemplate>) -> Self {
        Self {
            effects: effects.into(),
            duration: -1.0,
            loop_count: 1,
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_loops(mut self, loop_count: i32) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Appends the constraint defs of every entry, skipping names already in `out`
    pub fn gather_constraint_defs(
        &self,
        out: &mut Vec<ConstraintDef>,
    ) -> Result<(), ConstraintError> {
        for effect in self.effects.iter() {
            let Some(def) = effect.constraint_def()? else {
                continue;
            };
            match out.iter_mut().find(|existing| existing.name == def.name) {
                Some(existing) => {
                    existing.runs_on_server |= def.runs_on_server;
                    existing.runs_on_client |= def.runs_on_client;
                }
                None => out.push(def),
            }
        }
        Ok(())
    }
}
