mod effect_factory;
mod effect_primitive;
mod effect_template;
mod effect_wrapper;
mod named_effects;
mod timed_effect;

pub use effect_factory::{EffectFactory, PrimitiveBuilder, PrimitiveFactory};
pub use effect_primitive::{EffectFrame, EffectPrimitive, LifeStage, Mooring};
pub use effect_template::{EffectKind, EffectTemplate, EffectTiming};
pub use effect_wrapper::{EffectContext, EffectWrapper};
pub use named_effects::{NamedEffect, NamedEffects};
pub use timed_effect::TimedEffect;
