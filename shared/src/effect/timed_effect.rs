use log::warn;

use crate::{
    constraint::ConstraintId,
    effect::{EffectContext, EffectFrame, EffectPrimitive, EffectTemplate, EffectWrapper, LifeStage},
    math::Transform,
    types::ChoreographerId,
};

/// Drives an [`EffectPrimitive`] through the delay, fade and residue timing of
/// its template entry.
pub struct TimedEffect {
    template: EffectTemplate,
    primitive: Box<dyn EffectPrimitive>,
    owner: ChoreographerId,
    constraint: Option<ConstraintId>,
    life_elapsed: f32,
    // active time at which life was cut short by `stop`
    stopped_at: Option<f32>,
    stage: LifeStage,
    primitive_started: bool,
    transform: Option<Transform>,
}

impl TimedEffect {
    pub fn new(
        template: EffectTemplate,
        primitive: Box<dyn EffectPrimitive>,
        owner: ChoreographerId,
    ) -> Self {
        Self {
            template,
            primitive,
            owner,
            constraint: None,
            life_elapsed: 0.0,
            stopped_at: None,
            stage: LifeStage::Waiting,
            primitive_started: false,
            transform: None,
        }
    }

    pub fn stage(&self) -> LifeStage {
        self.stage
    }

    pub fn template(&self) -> &EffectTemplate {
        &self.template
    }

    fn active_time(&self) -> f32 {
        self.life_elapsed - self.template.timing.delay
    }

    fn life_end(&self) -> Option<f32> {
        let natural = (!self.template.timing.is_infinite()).then_some(self.template.timing.lifetime);
        match (natural, self.stopped_at) {
            (Some(natural), Some(stopped)) => Some(natural.min(stopped)),
            (natural, stopped) => natural.or(stopped),
        }
    }

    fn stage_and_fade(&self) -> (LifeStage, f32) {
        let timing = &self.template.timing;
        let active = self.active_time();
        if active < 0.0 {
            if self.stopped_at.is_some() {
                return (LifeStage::Done, 0.0);
            }
            return (LifeStage::Waiting, 0.0);
        }
        match self.life_end() {
            Some(end) if active >= end => {
                let after = active - end;
                if after < timing.fade_out {
                    (LifeStage::FadingOut, 1.0 - after / timing.fade_out)
                } else if after < timing.fade_out + timing.residue {
                    (LifeStage::Residue, 0.0)
                } else {
                    (LifeStage::Done, 0.0)
                }
            }
            _ => {
                if active < timing.fade_in {
                    (LifeStage::FadingIn, active / timing.fade_in)
                } else {
                    (LifeStage::Live, 1.0)
                }
            }
        }
    }

    fn life_violated(&self, ctx: &EffectContext) -> bool {
        let conditions = self.template.life_conditions;
        if conditions != 0 && ctx.trigger_mask & conditions != conditions {
            return true;
        }
        self.template.life_constraint
            && self.constraint.is_some()
            && self.primitive_started
            && self.transform.is_none()
    }

    fn advance(&mut self, dt: f32) -> bool {
        let (stage, fade) = self.stage_and_fade();
        if stage == LifeStage::Waiting {
            return true;
        }
        if stage == LifeStage::Done {
            self.finish();
            return false;
        }
        if !self.primitive_started {
            self.primitive_started = true;
            if !self.primitive.on_start(self.transform) {
                warn!("effect primitive {:?} failed to start", self.template.kind);
                self.finish();
                return false;
            }
        }
        if stage >= LifeStage::FadingOut && self.stage < LifeStage::FadingOut {
            self.primitive.on_stop();
        }
        self.stage = stage;

        let frame = EffectFrame {
            dt,
            life_elapsed: self.life_elapsed,
            stage,
            fade,
            transform: self.transform,
        };
        if !self.primitive.on_update(&frame) {
            self.finish();
            return false;
        }
        true
    }

    fn finish(&mut self) {
        if self.stage == LifeStage::Done {
            return;
        }
        if self.primitive_started {
            self.primitive.on_cleanup();
        }
        self.stage = LifeStage::Done;
    }
}

impl EffectWrapper for TimedEffect {
    fn start(&mut self, ctx: &EffectContext, offset: f32) -> bool {
        self.constraint = self
            .template
            .constraint_name()
            .and_then(|name| ctx.constraints.constraint_id(name));
        self.life_elapsed = offset.max(0.0);
        true
    }

    fn update(&mut self, ctx: &EffectContext, dt: f32) -> bool {
        if self.stage == LifeStage::Done {
            return false;
        }
        self.life_elapsed += dt;
        if let Some(id) = self.constraint {
            self.transform = ctx.constraints.transform(id);
        }
        if self.stopped_at.is_none() && self.life_violated(ctx) {
            self.stop();
        }
        self.advance(dt)
    }

    fn stop(&mut self) {
        if self.stage == LifeStage::Done || self.stopped_at.is_some() {
            return;
        }
        if !self.primitive_started {
            self.finish();
            return;
        }
        let active = self.active_time().max(0.0);
        self.stopped_at = Some(active);
    }

    fn interrupt(&mut self) {
        self.finish();
    }

    fn is_done(&self) -> bool {
        self.stage == LifeStage::Done
    }

    fn done_time(&self) -> Option<f32> {
        if self.is_done() {
            return Some(self.life_elapsed);
        }
        let timing = &self.template.timing;
        self.life_end()
            .map(|end| timing.delay + end + timing.fade_out + timing.residue)
    }

    fn life_elapsed(&self) -> f32 {
        self.life_elapsed
    }

    fn after_life(&self) -> f32 {
        if self.is_done() || !self.primitive_started {
            return 0.0;
        }
        let timing = &self.template.timing;
        let active = self.active_time().max(0.0);
        let end = self.life_end().map_or(active, |end| end.min(active));
        (timing.delay + end + timing.fade_out + timing.residue - self.life_elapsed).max(0.0)
    }

    fn name(&self) -> Option<&str> {
        self.template.effect_name.as_deref()
    }

    fn transform(&self) -> Option<Transform> {
        self.transform
    }

    fn owner(&self) -> ChoreographerId {
        self.owner
    }
}
