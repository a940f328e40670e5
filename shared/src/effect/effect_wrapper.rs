use crate::{
    constraint::ConstraintManager,
    math::Transform,
    types::{ChoreographerId, HostType},
};

/// What an effect instance may read from its owning choreographer while it runs
pub struct EffectContext<'a> {
    pub owner: ChoreographerId,
    pub host: HostType,
    pub constraints: &'a ConstraintManager,
    pub trigger_mask: u32,
}

/// Lifecycle contract of one effect instance inside a phrase
pub trait EffectWrapper {
    /// Prepares the instance. `offset` is effect-local time already gone by,
    /// for instances started partway through their life.
    fn start(&mut self, ctx: &EffectContext, offset: f32) -> bool;
    /// Advances by `dt`. Returns `false` once the instance is finished.
    fn update(&mut self, ctx: &EffectContext, dt: f32) -> bool;
    /// Ends the instance's life gracefully, letting it fade out
    fn stop(&mut self);
    /// Ends the instance immediately
    fn interrupt(&mut self);
    fn is_done(&self) -> bool;
    /// Effect-local time at which the instance will be finished, if bounded
    fn done_time(&self) -> Option<f32>;
    fn life_elapsed(&self) -> f32;
    /// Time still needed to finish if stopped now
    fn after_life(&self) -> f32;
    fn name(&self) -> Option<&str>;
    fn transform(&self) -> Option<Transform>;
    fn owner(&self) -> ChoreographerId;
}
