use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    constraint::{ConstraintBinding, ConstraintDef, ConstraintError, ConstraintKind, ConstraintPayload},
    directory::ProcessOrder,
    effect::NamedEffects,
    math::{Point3, Transform},
    scene::SceneQuery,
    types::{ChoreographerId, HostType, ObjectRef, ScopeId},
};

pub type ConstraintId = u16;

/// Addresses a constraint slot either by id or by name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKey<'a> {
    Id(ConstraintId),
    Name(&'a str),
}

impl From<ConstraintId> for ConstraintKey<'_> {
    fn from(id: ConstraintId) -> Self {
        ConstraintKey::Id(id)
    }
}

impl<'a> From<&'a str> for ConstraintKey<'a> {
    fn from(name: &'a str) -> Self {
        ConstraintKey::Name(name)
    }
}

/// Snapshot of one constraint taken by the last `sample` call
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstraintSample {
    pub transform: Transform,
    pub velocity: Point3,
    /// The reference resolved this tick
    pub valid: bool,
    /// The slot has a binding at all
    pub defined: bool,
}

impl ConstraintSample {
    pub const UNDEFINED: ConstraintSample = ConstraintSample {
        transform: Transform::IDENTITY,
        velocity: Point3::ZERO,
        valid: false,
        defined: false,
    };
}

/// Borrowed collaborators needed while sampling
pub struct SampleContext<'a> {
    pub scene: &'a dyn SceneQuery,
    pub named_effects: &'a NamedEffects,
}

struct ConstraintSlot {
    name: String,
    declared_kind: ConstraintKind,
    binding: Option<ConstraintBinding>,
    suspended: bool,
    treat_as_camera: bool,
    sample: ConstraintSample,
}

impl ConstraintSlot {
    fn bind(&mut self, binding: ConstraintBinding) {
        if binding == ConstraintBinding::Object(None) {
            self.sample.valid = false;
        }
        self.sample.defined = true;
        self.binding = Some(binding);
        self.suspended = false;
    }
}

/// Per-choreographer table of named anchor slots.
///
/// Ids come from a monotonically increasing counter and are never reused, so
/// wrappers may hold on to them for the life of the choreographer.
#[derive(Default)]
pub struct ConstraintManager {
    slots: Vec<ConstraintSlot>,
    names: HashMap<String, ConstraintId>,
    start_time_ms: u64,
}

impl ConstraintManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a slot named `name`. Defining an existing name returns its id.
    pub fn define_constraint(
        &mut self,
        kind: ConstraintKind,
        name: &str,
    ) -> Result<ConstraintId, ConstraintError> {
        if let Some(id) = self.names.get(name) {
            return Ok(*id);
        }
        let id = ConstraintId::try_from(self.slots.len()).map_err(|_| {
            ConstraintError::IdsExhausted {
                name: name.to_string(),
            }
        })?;
        self.slots.push(ConstraintSlot {
            name: name.to_string(),
            declared_kind: kind,
            binding: None,
            suspended: false,
            treat_as_camera: false,
            sample: ConstraintSample::UNDEFINED,
        });
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Defines every slot in `defs` and binds the ones carrying a payload.
    ///
    /// Slots that are already bound keep their binding. A def that does not run
    /// on `host` is defined but left unbound.
    pub fn init_constraint_defs(
        &mut self,
        defs: &[ConstraintDef],
        host: HostType,
        scene: &dyn SceneQuery,
    ) {
        for def in defs {
            let id = match self.define_constraint(def.kind(), &def.name) {
                Ok(id) => id,
                Err(err) => {
                    warn!("skipping constraint def: {}", err);
                    continue;
                }
            };
            if !def.runs_on(host) {
                continue;
            }
            let slot = &mut self.slots[usize::from(id)];
            if slot.binding.is_some() {
                continue;
            }
            let binding = match &def.payload {
                ConstraintPayload::Object(None)
                | ConstraintPayload::Point(None)
                | ConstraintPayload::Transform(None) => continue,
                ConstraintPayload::Object(Some(object_name)) => {
                    let object = scene.find_object(object_name);
                    if object.is_none() {
                        warn!(
                            "scene object '{}' for constraint '{}' not found",
                            object_name, def.name
                        );
                    }
                    ConstraintBinding::Object(object)
                }
                ConstraintPayload::Point(Some(point)) => ConstraintBinding::Point(*point),
                ConstraintPayload::Transform(Some(transform)) => {
                    ConstraintBinding::Transform(*transform)
                }
                ConstraintPayload::ScopeId(scope_id) => ConstraintBinding::ScopeId {
                    scope_id: *scope_id,
                    is_shape: false,
                },
                ConstraintPayload::Effect(effect_name) => {
                    ConstraintBinding::Effect(effect_name.clone())
                }
            };
            slot.bind(binding);
        }
    }

    fn resolve_key(
        &mut self,
        key: ConstraintKey,
        kind: ConstraintKind,
    ) -> Result<ConstraintId, ConstraintError> {
        match key {
            ConstraintKey::Id(id) => {
                if usize::from(id) < self.slots.len() {
                    Ok(id)
                } else {
                    Err(ConstraintError::UnknownId { id })
                }
            }
            ConstraintKey::Name(name) => self.define_constraint(kind, name),
        }
    }

    /// Binds a slot, defining it first when addressed by an unknown name
    pub fn set_binding<'a>(
        &mut self,
        key: impl Into<ConstraintKey<'a>>,
        binding: ConstraintBinding,
    ) -> Result<ConstraintId, ConstraintError> {
        let id = self.resolve_key(key.into(), binding.kind())?;
        self.slots[usize::from(id)].bind(binding);
        Ok(id)
    }

    /// `None` keeps the slot defined but makes every sample invalid
    pub fn set_reference_object<'a>(
        &mut self,
        key: impl Into<ConstraintKey<'a>>,
        object: Option<ObjectRef>,
    ) -> Result<ConstraintId, ConstraintError> {
        self.set_binding(key, ConstraintBinding::Object(object))
    }

    pub fn set_reference_point<'a>(
        &mut self,
        key: impl Into<ConstraintKey<'a>>,
        point: Point3,
    ) -> Result<ConstraintId, ConstraintError> {
        self.set_binding(key, ConstraintBinding::Point(point))
    }

    pub fn set_reference_transform<'a>(
        &mut self,
        key: impl Into<ConstraintKey<'a>>,
        transform: Transform,
    ) -> Result<ConstraintId, ConstraintError> {
        self.set_binding(key, ConstraintBinding::Transform(transform))
    }

    pub fn set_reference_scope_id<'a>(
        &mut self,
        key: impl Into<ConstraintKey<'a>>,
        scope_id: ScopeId,
        is_shape: bool,
    ) -> Result<ConstraintId, ConstraintError> {
        self.set_binding(key, ConstraintBinding::ScopeId { scope_id, is_shape })
    }

    pub fn set_reference_effect<'a>(
        &mut self,
        key: impl Into<ConstraintKey<'a>>,
        effect_name: &str,
    ) -> Result<ConstraintId, ConstraintError> {
        self.set_binding(key, ConstraintBinding::Effect(effect_name.to_string()))
    }

    /// Marks a slot's reference as temporarily unavailable. The binding stays
    /// and is revived by the next `set_reference_*` call.
    pub fn invalidate_reference(&mut self, id: ConstraintId) -> Result<(), ConstraintError> {
        let slot = self
            .slots
            .get_mut(usize::from(id))
            .ok_or(ConstraintError::UnknownId { id })?;
        slot.suspended = true;
        slot.sample.valid = false;
        Ok(())
    }

    /// Slots flagged as camera take the camera position passed to `sample`
    pub fn set_treat_as_camera(&mut self, id: ConstraintId, treat_as_camera: bool) -> bool {
        match self.slots.get_mut(usize::from(id)) {
            Some(slot) => {
                slot.treat_as_camera = treat_as_camera;
                true
            }
            None => false,
        }
    }

    /// Refreshes every slot's sample. Called once per tick, after the scene has
    /// updated its object transforms.
    pub fn sample(
        &mut self,
        dt: f32,
        now_ms: u64,
        camera_override: Option<Point3>,
        ctx: &SampleContext,
    ) {
        for slot in &mut self.slots {
            let previous = slot.sample;

            let mut transform = None;
            if !slot.suspended {
                if let (true, Some(position)) = (slot.treat_as_camera, camera_override) {
                    transform = Some(Transform::from_position(position));
                } else {
                    let mut resolved_scope = None;
                    transform = match &slot.binding {
                        None | Some(ConstraintBinding::Object(None)) => None,
                        Some(ConstraintBinding::Object(Some(object))) => {
                            ctx.scene.object_transform(*object)
                        }
                        Some(ConstraintBinding::Point(point)) => {
                            Some(Transform::from_position(*point))
                        }
                        Some(ConstraintBinding::Transform(transform)) => Some(*transform),
                        Some(ConstraintBinding::ScopeId { scope_id, .. }) => {
                            resolved_scope = ctx.scene.resolve_scope_id(*scope_id);
                            resolved_scope.and_then(|object| ctx.scene.object_transform(object))
                        }
                        Some(ConstraintBinding::Effect(effect_name)) => {
                            ctx.named_effects.transform(effect_name)
                        }
                    };
                    if let Some(object) = resolved_scope {
                        debug!("constraint '{}' resolved its scope id", slot.name);
                        slot.binding = Some(ConstraintBinding::Object(Some(object)));
                    }
                }
            }

            slot.sample = match transform {
                Some(transform) => {
                    let velocity = if previous.valid && dt > 0.0 {
                        (transform.position - previous.transform.position) * (1.0 / dt)
                    } else {
                        Point3::ZERO
                    };
                    ConstraintSample {
                        transform,
                        velocity,
                        valid: true,
                        defined: true,
                    }
                }
                None => {
                    if previous.valid {
                        debug!("constraint '{}' lost its reference at {}ms", slot.name, now_ms);
                    }
                    ConstraintSample {
                        transform: previous.transform,
                        velocity: Point3::ZERO,
                        valid: false,
                        defined: slot.binding.is_some(),
                    }
                }
            };
        }
    }

    /// Moves `owner` after every choreographer that owns a named effect one of
    /// these slots is bound to, so the effect's transform is fresh when sampled.
    pub fn adjust_process_ordering(
        &self,
        owner: ChoreographerId,
        named_effects: &NamedEffects,
        order: &mut ProcessOrder,
    ) {
        for slot in &self.slots {
            let Some(ConstraintBinding::Effect(effect_name)) = &slot.binding else {
                continue;
            };
            match named_effects.owner(effect_name) {
                Some(dependency) if dependency != owner => order.move_after(owner, dependency),
                Some(_) => {}
                None => debug!(
                    "named effect '{}' is not published yet, ordering of {} unchanged",
                    effect_name, owner
                ),
            }
        }
    }

    pub fn set_start_time(&mut self, now_ms: u64) {
        self.start_time_ms = now_ms;
    }

    pub fn start_time_ms(&self) -> u64 {
        self.start_time_ms
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_time_ms)
    }

    pub fn constraint_id(&self, name: &str) -> Option<ConstraintId> {
        self.names.get(name).copied()
    }

    pub fn name(&self, id: ConstraintId) -> Option<&str> {
        self.slots.get(usize::from(id)).map(|slot| slot.name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    pub fn declared_kind(&self, id: ConstraintId) -> Option<ConstraintKind> {
        self.slots.get(usize::from(id)).map(|slot| slot.declared_kind)
    }

    pub fn binding(&self, id: ConstraintId) -> Option<&ConstraintBinding> {
        self.slots
            .get(usize::from(id))
            .and_then(|slot| slot.binding.as_ref())
    }

    pub fn sample_of(&self, id: ConstraintId) -> Option<ConstraintSample> {
        self.slots.get(usize::from(id)).map(|slot| slot.sample)
    }

    /// Transform of a slot if its last sample was valid
    pub fn transform(&self, id: ConstraintId) -> Option<Transform> {
        self.sample_of(id)
            .filter(|sample| sample.valid)
            .map(|sample| sample.transform)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
