use std::sync::Arc;

use log::{debug, warn};

use crate::{
    effect::{EffectContext, EffectFactory, EffectTemplate, EffectWrapper},
    math::Transform,
    phrase::PhraseTemplate,
    types::{ChoreographerId, HostType},
};

/// Snapshot of the owner's selection state, applied when instances are created
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhraseFilter {
    pub host: HostType,
    pub ranking: u8,
    pub level_of_detail: u8,
    pub exec_conditions: u32,
}

impl PhraseFilter {
    pub fn admits(&self, template: &EffectTemplate) -> bool {
        let (rank_low, rank_high) = template.ranking_range;
        let (lod_low, lod_high) = template.lod_range;
        template.runs_on(self.host)
            && (rank_low..=rank_high).contains(&self.ranking)
            && (lod_low..=lod_high).contains(&self.level_of_detail)
            && self.exec_conditions & template.exec_conditions == template.exec_conditions
    }
}

/// A timed, optionally looping group of effect instances played together.
pub struct Phrase {
    templates: Arc<[EffectTemplate]>,
    filter: PhraseFilter,
    owner: ChoreographerId,
    effects: Vec<Box<dyn EffectWrapper>>,
    // instances of earlier loops still finishing
    trailing: Vec<Box<dyn EffectWrapper>>,
    duration: f32,
    loop_count: i32,
    loop_index: i32,
    time_factor: f32,
    start_time: f32,
    last_elapsed: f32,
    started: bool,
    will_stop: bool,
}

impl Phrase {
    /// Creates one instance per entry the filter admits. Entries the factory
    /// cannot build are left out.
    pub fn init(
        templates: Arc<[EffectTemplate]>,
        duration: f32,
        filter: PhraseFilter,
        owner: ChoreographerId,
        factory: &dyn EffectFactory,
        time_factor: f32,
        loop_count: i32,
    ) -> Self {
        let mut phrase = Self {
            templates,
            filter,
            owner,
            effects: Vec::new(),
            trailing: Vec::new(),
            duration,
            loop_count: if loop_count == 0 { 1 } else { loop_count },
            loop_index: 0,
            time_factor,
            start_time: 0.0,
            last_elapsed: 0.0,
            started: false,
            will_stop: false,
        };
        phrase.effects = phrase.instantiate(factory);
        phrase
    }

    pub fn from_template(
        template: &PhraseTemplate,
        filter: PhraseFilter,
        owner: ChoreographerId,
        factory: &dyn EffectFactory,
        time_factor: f32,
    ) -> Self {
        Self::init(
            template.effects.clone(),
            template.duration,
            filter,
            owner,
            factory,
            time_factor,
            template.loop_count,
        )
    }

    fn instantiate(&self, factory: &dyn EffectFactory) -> Vec<Box<dyn EffectWrapper>> {
        let mut effects = Vec::new();
        for template in self.templates.iter() {
            if !self.filter.admits(template) {
                continue;
            }
            if let Some(effect) = factory.create_effect(template, self.owner) {
                effects.push(effect);
            }
        }
        effects
    }

    fn local_time(&self, elapsed: f32) -> f32 {
        ((elapsed - self.start_time) * self.time_factor).max(0.0)
    }

    /// Starts every instance and drops those that fail to start. When
    /// `elapsed` is past `start_time` the phrase joins partway through,
    /// skipping whole loops as needed. Returns `false` if nothing is running.
    pub fn start(&mut self, start_time: f32, elapsed: f32, ctx: &EffectContext) -> bool {
        self.start_time = start_time;
        self.last_elapsed = elapsed;
        self.started = true;

        let mut offset = self.local_time(elapsed);
        if self.duration > 0.0 && offset >= self.duration {
            let passes = (offset / self.duration).floor() as i32;
            let last_pass = if self.loop_count < 0 {
                passes
            } else {
                passes.min(self.loop_count - 1)
            };
            self.loop_index = last_pass;
            offset -= self.duration * last_pass as f32;
            debug!(
                "phrase of choreographer {} joining loop {} at {}s",
                self.owner, self.loop_index, offset
            );
        }
        self.start_effects(ctx, offset);
        !self.effects.is_empty()
    }

    fn start_effects(&mut self, ctx: &EffectContext, offset: f32) {
        let owner = self.owner;
        self.effects.retain_mut(|effect| {
            let started = effect.start(ctx, offset);
            if !started {
                warn!("effect of choreographer {} failed to start, dropped", owner);
            }
            started
        });
    }

    pub fn update(&mut self, dt: f32, elapsed: f32, ctx: &EffectContext) {
        if !self.started || elapsed < self.start_time {
            return;
        }
        self.last_elapsed = elapsed;
        let scaled_dt = dt * self.time_factor;
        self.effects
            .retain_mut(|effect| effect.update(ctx, scaled_dt) && !effect.is_done());
        self.trailing
            .retain_mut(|effect| effect.update(ctx, scaled_dt) && !effect.is_done());
    }

    /// Stops every instance gracefully. Instances keep updating while they fade.
    pub fn stop(&mut self, elapsed: f32) {
        self.will_stop = true;
        self.last_elapsed = elapsed;
        for effect in self.effects.iter_mut().chain(self.trailing.iter_mut()) {
            effect.stop();
        }
        self.effects.retain(|effect| !effect.is_done());
        self.trailing.retain(|effect| !effect.is_done());
    }

    pub fn interrupt(&mut self, elapsed: f32) {
        self.will_stop = true;
        self.last_elapsed = elapsed;
        for effect in self.effects.iter_mut().chain(self.trailing.iter_mut()) {
            effect.interrupt();
        }
        self.effects.clear();
        self.trailing.clear();
    }

    /// Begins the next loop if any remain. The current instances are stopped
    /// and left to finish as trailing instances.
    pub fn recycle(
        &mut self,
        elapsed: f32,
        ctx: &EffectContext,
        factory: &dyn EffectFactory,
    ) -> bool {
        if self.will_stop {
            return false;
        }
        if self.loop_count >= 0 && self.loop_index + 1 >= self.loop_count {
            return false;
        }
        self.loop_index += 1;
        for mut effect in self.effects.drain(..) {
            effect.stop();
            if !effect.is_done() {
                self.trailing.push(effect);
            }
        }
        self.effects = self.instantiate(factory);
        let offset =
            (self.local_time(elapsed) - self.duration * self.loop_index as f32).max(0.0);
        self.start_effects(ctx, offset);
        true
    }

    /// The current loop has run its full duration
    pub fn expired(&self, elapsed: f32) -> bool {
        self.started
            && self.duration >= 0.0
            && self.local_time(elapsed) >= self.duration * (self.loop_index + 1) as f32
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.trailing.is_empty()
    }

    /// Total playing time is unbounded, by duration or by looping
    pub fn is_infinite(&self) -> bool {
        self.duration < 0.0 || self.loop_count < 0
    }

    pub fn will_stop(&self) -> bool {
        self.will_stop
    }

    pub fn loop_index(&self) -> i32 {
        self.loop_index
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn time_factor(&self) -> f32 {
        self.time_factor
    }

    pub fn live_count(&self) -> usize {
        self.effects.len() + self.trailing.len()
    }

    /// Owner-elapsed time at which the phrase and all its instances are done
    pub fn calc_done_time(&self) -> f32 {
        let mut done_time = self.last_elapsed;
        if !self.is_infinite() && !self.will_stop {
            let nominal =
                self.start_time + self.duration * self.loop_count as f32 / self.time_factor;
            done_time = done_time.max(nominal);
        }
        for effect in self.effects.iter().chain(self.trailing.iter()) {
            if let Some(effect_done) = effect.done_time() {
                let remaining = (effect_done - effect.life_elapsed()).max(0.0);
                done_time = done_time.max(self.last_elapsed + remaining / self.time_factor);
            }
        }
        done_time
    }

    /// Time the instances still need after a stop issued now
    pub fn calc_after_life(&self) -> f32 {
        self.effects
            .iter()
            .chain(self.trailing.iter())
            .map(|effect| effect.after_life())
            .fold(0.0, f32::max)
            / self.time_factor
    }

    /// Fade-out plus residue of the longest entry, whether or not this host
    /// instantiated it. Servers use it to outlast effects only clients play.
    pub fn calc_nominal_after_life(&self) -> f32 {
        self.templates
            .iter()
            .map(|template| template.timing.fade_out + template.timing.residue)
            .fold(0.0, f32::max)
            / self.time_factor
    }

    /// Instances published under a name, with their current transform
    pub fn named_effects(&self) -> impl Iterator<Item = (&str, Option<Transform>)> {
        self.effects
            .iter()
            .chain(self.trailing.iter())
            .filter_map(|effect| effect.name().map(|name| (name, effect.transform())))
    }
}
