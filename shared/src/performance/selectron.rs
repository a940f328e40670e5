use std::sync::Arc;

use log::{debug, warn};

use crate::{
    choreographer::Choreographer,
    constraint::ConstraintDef,
    performance::{
        Marks, Performance, PerformanceCore, PerformanceKind, PerformanceState, ProcessContext,
    },
    phrase::{Phrase, PhraseTemplate},
    protocol::SelectronTemplate,
    types::{HostType, TemplateIndex},
};

/// A selection highlight with main, select and deselect phrases
pub struct Selectron {
    template_index: TemplateIndex,
    template: Arc<SelectronTemplate>,
    choreographer: Choreographer,
    core: PerformanceCore,
    main_phrase: Option<Phrase>,
    select_phrase: Option<Phrase>,
    deselect_phrase: Option<Phrase>,
}

impl Selectron {
    pub fn new(
        template_index: TemplateIndex,
        template: Arc<SelectronTemplate>,
        host: HostType,
    ) -> Self {
        Self {
            template_index,
            template,
            choreographer: Choreographer::new(host),
            core: PerformanceCore::new(),
            main_phrase: None,
            select_phrase: None,
            deselect_phrase: None,
        }
    }

    pub fn template(&self) -> &SelectronTemplate {
        &self.template
    }

    pub fn main_phrase(&self) -> Option<&Phrase> {
        self.main_phrase.as_ref()
    }

    pub fn select_phrase(&self) -> Option<&Phrase> {
        self.select_phrase.as_ref()
    }

    pub fn deselect_phrase(&self) -> Option<&Phrase> {
        self.deselect_phrase.as_ref()
    }

    fn start_phrase(
        &self,
        template: &PhraseTemplate,
        start_time: f32,
        ctx: &ProcessContext,
    ) -> Phrase {
        let mut phrase = Phrase::from_template(
            template,
            self.choreographer.phrase_filter(),
            self.choreographer.id(),
            ctx.factory,
            self.choreographer.time_factor(),
        );
        if !phrase.start(start_time, self.core.elapsed, &self.choreographer.effect_context()) {
            debug!(
                "selectron {} phrase has no running effects on this host",
                self.choreographer.id()
            );
        }
        phrase
    }
}

impl Performance for Selectron {
    fn kind(&self) -> PerformanceKind {
        PerformanceKind::Selectron
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
                warn!("selectron '{}' constraint defs: {}", self.template.name, err);
                Vec::new()
            }
        }
    }

    fn state_expired(&mut self, ctx: &ProcessContext) -> bool {
        let elapsed = self.core.elapsed;
        let effect_ctx = self.choreographer.effect_context();

        // select phrase runs its course without affecting the state
        if let Some(select) = self.select_phrase.as_mut() {
            if select.expired(elapsed) && !select.recycle(elapsed, &effect_ctx, ctx.factory) {
                select.stop(elapsed);
            }
        }

        let Some(main) = self.main_phrase.as_mut() else {
            return false;
        };
        main.expired(elapsed) && !main.recycle(elapsed, &effect_ctx, ctx.factory)
    }

    fn cleanup_over(&self) -> bool {
        [&self.main_phrase, &self.select_phrase, &self.deselect_phrase]
            .into_iter()
            .all(|phrase| phrase.as_ref().map_or(true, |phrase| phrase.is_empty()))
    }

    fn enter_state(&mut self, state: PerformanceState, ctx: &ProcessContext) {
        match state {
            PerformanceState::Active => {
                self.choreographer
                    .constraint_manager_mut()
                    .set_start_time(ctx.now_ms);
                let template = self.template.clone();
                self.main_phrase = Some(self.start_phrase(&template.main, 0.0, ctx));
                self.select_phrase = Some(self.start_phrase(&template.select, 0.0, ctx));
            }
            PerformanceState::Cleanup => {
                if self.main_phrase.is_some() {
                    let template = self.template.clone();
                    let elapsed = self.core.elapsed;
                    self.deselect_phrase =
                        Some(self.start_phrase(&template.deselect, elapsed, ctx));
                }
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
        if let Some(main) = self.main_phrase.as_mut() {
            main.stop(elapsed);
        }
        if let Some(select) = self.select_phrase.as_mut() {
            select.interrupt(elapsed);
        }
    }

    fn update_phrases(&mut self, dt: f32, _ctx: &ProcessContext) {
        let elapsed = self.core.elapsed;
        let effect_ctx = self.choreographer.effect_context();
        for phrase in [
            &mut self.main_phrase,
            &mut self.select_phrase,
            &mut self.deselect_phrase,
        ]
        .into_iter()
        .flatten()
        {
            phrase.update(dt, elapsed, &effect_ctx);
        }

        if self.core.state == PerformanceState::Cleanup {
            if let Some(deselect) = self.deselect_phrase.as_mut() {
                if !deselect.will_stop() && deselect.expired(elapsed) {
                    deselect.stop(elapsed);
                }
            }
        }
    }

    fn phrases(&self) -> Vec<&Phrase> {
        [&self.main_phrase, &self.select_phrase, &self.deselect_phrase]
            .into_iter()
            .flatten()
            .collect()
    }

    fn interrupt_phrases(&mut self) {
        let elapsed = self.core.elapsed;
        for phrase in [
            &mut self.main_phrase,
            &mut self.select_phrase,
            &mut self.deselect_phrase,
        ]
        .into_iter()
        .flatten()
        {
            phrase.interrupt(elapsed);
        }
    }
}
