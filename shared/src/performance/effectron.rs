use std::sync::Arc;

use log::{debug, warn};

use crate::{
    choreographer::Choreographer,
    constraint::ConstraintDef,
    performance::{
        Marks, Performance, PerformanceCore, PerformanceKind, PerformanceState, ProcessContext,
    },
    phrase::Phrase,
    protocol::EffectronTemplate,
    types::{HostType, TemplateIndex},
};

/// A one-shot performance: plays its phrase once activated, then cleans up
pub struct Effectron {
    template_index: TemplateIndex,
    template: Arc<EffectronTemplate>,
    choreographer: Choreographer,
    core: PerformanceCore,
    active_phrase: Option<Phrase>,
}

impl Effectron {
    pub fn new(
        template_index: TemplateIndex,
        template: Arc<EffectronTemplate>,
        host: HostType,
    ) -> Self {
        Self {
            template_index,
            template,
            choreographer: Choreographer::new(host),
            core: PerformanceCore::new(),
            active_phrase: None,
        }
    }

    pub fn template(&self) -> &EffectronTemplate {
        &self.template
    }

    pub fn active_phrase(&self) -> Option<&Phrase> {
        self.active_phrase.as_ref()
    }
}

impl Performance for Effectron {
    fn kind(&self) -> PerformanceKind {
        PerformanceKind::Effectron
    }

    fn template_index(&self) -> TemplateIndex {
        self.template_index
    }

    fn template_name(&self) -> &str {
        &self.template.name
    }

    fn exec_on_new_clients(&self) -> bool {
        self.template.exec_on_new_clients
    }

    fn choreographer(&self) -> &Choreographer {
        &self.choreographer
    }

    fn choreographer_mut(&mut self) -> &mut Choreographer {
        &mut self.choreographer
    }

    fn core(&self) -> &PerformanceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PerformanceCore {
        &mut self.core
    }

    fn constraint_defs(&self) -> Vec<ConstraintDef> {
        match self.template.constraint_defs() {
            Ok(defs) => defs,
            Err(err) => {
                warn!("effectron '{}' constraint defs: {}", self.template.name, err);
                Vec::new()
            }
        }
    }

    fn state_expired(&mut self, ctx: &ProcessContext) -> bool {
        let Some(phrase) = self.active_phrase.as_mut() else {
            return false;
        };
        let elapsed = self.core.elapsed;
        if !phrase.expired(elapsed) {
            return false;
        }
        !phrase.recycle(elapsed, &self.choreographer.effect_context(), ctx.factory)
    }

    fn cleanup_over(&self) -> bool {
        self.active_phrase
            .as_ref()
            .map_or(true, |phrase| phrase.is_empty())
    }

    fn enter_state(&mut self, state: PerformanceState, ctx: &ProcessContext) {
        match state {
            PerformanceState::Active => {
                self.choreographer
                    .constraint_manager_mut()
                    .set_start_time(ctx.now_ms);
                let mut phrase = Phrase::from_template(
                    &self.template.phrase,
                    self.choreographer.phrase_filter(),
                    self.choreographer.id(),
                    ctx.factory,
                    self.choreographer.time_factor(),
                );
                if !phrase.start(0.0, self.core.elapsed, &self.choreographer.effect_context()) {
                    debug!("effectron {} has no running effects on this host", self.id());
                }
                self.active_phrase = Some(phrase);
            }
            PerformanceState::Done => {
                if ctx.host == HostType::Server {
                    self.core.marks.post(Marks::DEACTIVATE);
                }
            }
            _ => {}
        }
    }

    fn leave_state(&mut self, state: PerformanceState, _ctx: &ProcessContext) {
        if state != PerformanceState::Active {
            return;
        }
        let elapsed = self.core.elapsed;
        if let Some(phrase) = self.active_phrase.as_mut() {
            phrase.stop(elapsed);
        }
    }

    fn update_phrases(&mut self, dt: f32, _ctx: &ProcessContext) {
        if let Some(phrase) = self.active_phrase.as_mut() {
            phrase.update(dt, self.core.elapsed, &self.choreographer.effect_context());
        }
    }

    fn phrases(&self) -> Vec<&Phrase> {
        self.active_phrase.iter().collect()
    }

    fn interrupt_phrases(&mut self) {
        let elapsed = self.core.elapsed;
        if let Some(phrase) = self.active_phrase.as_mut() {
            phrase.interrupt(elapsed);
        }
    }
}
