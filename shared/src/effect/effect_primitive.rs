use crate::math::Transform;

/// Where an effect instance is within its timed life
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifeStage {
    Waiting,
    FadingIn,
    Live,
    FadingOut,
    Residue,
    Done,
}

/// What a primitive sees on each update
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectFrame {
    pub dt: f32,
    pub life_elapsed: f32,
    pub stage: LifeStage,
    /// 0 to 1 opacity/volume scale
    pub fade: f32,
    pub transform: Option<Transform>,
}

/// The renderable part of an effect: a billboard, sound, light and so on.
///
/// Primitives are owned by the host engine. Timing, fading and constraint
/// tracking are handled by the wrapper around them.
pub trait EffectPrimitive {
    /// Returns `false` if the primitive could not be created
    fn on_start(&mut self, transform: Option<Transform>) -> bool;
    /// Returns `false` once the primitive has nothing more to do
    fn on_update(&mut self, frame: &EffectFrame) -> bool;
    /// Called once when the instance begins fading out
    fn on_stop(&mut self) {}
    fn on_cleanup(&mut self);
}

/// Invisible anchor that just follows its constraint
#[derive(Default)]
pub struct Mooring {
    transform: Option<Transform>,
}

impl Mooring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }
}

impl EffectPrimitive for Mooring {
    fn on_start(&mut self, transform: Option<Transform>) -> bool {
        self.transform = transform;
        true
    }

    fn on_update(&mut self, frame: &EffectFrame) -> bool {
        if frame.transform.is_some() {
            self.transform = frame.transform;
        }
        true
    }

    fn on_cleanup(&mut self) {
        self.transform = None;
    }
}
