use std::collections::HashSet;

use log::{debug, warn};

use crate::{
    choreographer::{ChoreographerError, DynamicConstraint, RemapHook},
    constraint::{
        ConstraintBinding, ConstraintDef, ConstraintId, ConstraintKind, ConstraintManager,
        SampleContext, CAMERA_CONSTRAINT, EXTRA_CONSTRAINT, LISTENER_CONSTRAINT,
    },
    effect::{EffectContext, NamedEffect, NamedEffects},
    math::{Point3, Transform},
    phrase::PhraseFilter,
    scene::SceneQuery,
    types::{ChoreographerId, ConnectionKey, HostType, ObjectRef, ScopeId, UNREGISTERED_ID},
};

/// State shared by every performance: identity, selection filters, trigger
/// bits, constraints, named effects and viewer scoping.
pub struct Choreographer {
    // Identity
    id: ChoreographerId,
    host: HostType,

    // Selection
    ranking: u8,
    level_of_detail: u8,
    exec_conditions: u32,
    trigger_mask: u32,

    // Playback
    time_factor: f32,
    extra: Option<ObjectRef>,
    postpone_activation: bool,

    // Constraints
    constraint_mgr: ConstraintManager,
    constraints_initialized: bool,
    dynamic_constraint_defs: Vec<DynamicConstraint>,
    remap_defs: Vec<DynamicConstraint>,
    remap_hook: Option<Box<dyn RemapHook>>,
    camera_constraint: Option<ConstraintId>,
    listener_constraint: Option<ConstraintId>,
    needs_sync: bool,

    // Named effects
    named_effects: HashSet<String>,

    // Scoping
    explicit_viewers: Vec<ConnectionKey>,
}

impl Choreographer {
    pub fn new(host: HostType) -> Self {
        Self {
            id: UNREGISTERED_ID,
            host,
            ranking: 0,
            level_of_detail: 0,
            exec_conditions: 0,
            trigger_mask: 0,
            time_factor: 1.0,
            extra: None,
            postpone_activation: false,
            constraint_mgr: ConstraintManager::new(),
            constraints_initialized: false,
            dynamic_constraint_defs: Vec::new(),
            remap_defs: Vec::new(),
            remap_hook: None,
            camera_constraint: None,
            listener_constraint: None,
            needs_sync: false,
            named_effects: HashSet::new(),
            explicit_viewers: Vec::new(),
        }
    }

    /// `0` until a directory registers the choreographer
    pub fn id(&self) -> ChoreographerId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ChoreographerId) {
        self.id = id;
    }

    pub fn host(&self) -> HostType {
        self.host
    }

    // Selection

    pub fn ranking(&self) -> u8 {
        self.ranking
    }

    pub fn set_ranking(&mut self, ranking: u8) {
        self.ranking = ranking;
    }

    pub fn level_of_detail(&self) -> u8 {
        self.level_of_detail
    }

    pub fn set_level_of_detail(&mut self, level_of_detail: u8) {
        self.level_of_detail = level_of_detail;
    }

    pub fn test_ranking(&self, low: u8, high: u8) -> bool {
        (low..=high).contains(&self.ranking)
    }

    pub fn test_level_of_detail(&self, low: u8, high: u8) -> bool {
        (low..=high).contains(&self.level_of_detail)
    }

    pub fn exec_conditions(&self) -> u32 {
        self.exec_conditions
    }

    pub fn set_exec_conditions(&mut self, conditions: u32) {
        self.exec_conditions = conditions;
    }

    /// All of `conditions` are present in the exec mask
    pub fn test_exec_conditions(&self, conditions: u32) -> bool {
        self.exec_conditions & conditions == conditions
    }

    pub fn trigger_mask(&self) -> u32 {
        self.trigger_mask
    }

    pub fn set_trigger_mask(&mut self, mask: u32) {
        self.trigger_mask = mask;
    }

    pub fn set_trigger_bit(&mut self, bit: u8) {
        self.trigger_mask |= trigger_bit(bit);
    }

    pub fn clear_trigger_bit(&mut self, bit: u8) {
        self.trigger_mask &= !trigger_bit(bit);
    }

    pub fn test_trigger_bit(&self, bit: u8) -> bool {
        let mask = trigger_bit(bit);
        mask != 0 && self.trigger_mask & mask != 0
    }

    pub fn phrase_filter(&self) -> PhraseFilter {
        PhraseFilter {
            host: self.host,
            ranking: self.ranking,
            level_of_detail: self.level_of_detail,
            exec_conditions: self.exec_conditions,
        }
    }

    pub fn effect_context(&self) -> EffectContext<'_> {
        EffectContext {
            owner: self.id,
            host: self.host,
            constraints: &self.constraint_mgr,
            trigger_mask: self.trigger_mask,
        }
    }

    // Playback

    pub fn time_factor(&self) -> f32 {
        self.time_factor
    }

    pub fn set_time_factor(&mut self, time_factor: f32) -> Result<(), ChoreographerError> {
        if !time_factor.is_finite() || time_factor <= 0.0 {
            return Err(ChoreographerError::InvalidTimeFactor { value: time_factor });
        }
        self.time_factor = time_factor;
        Ok(())
    }

    pub fn extra(&self) -> Option<ObjectRef> {
        self.extra
    }

    pub fn set_extra(&mut self, extra: Option<ObjectRef>) {
        self.extra = extra;
        if self.constraints_initialized {
            if let Err(err) = self.constraint_mgr.set_reference_object(EXTRA_CONSTRAINT, extra) {
                warn!("choreographer {} could not rebind extra: {}", self.id, err);
            }
        }
    }

    pub fn postpone_activation(&self) -> bool {
        self.postpone_activation
    }

    pub fn set_postpone_activation(&mut self, postpone: bool) {
        self.postpone_activation = postpone;
    }

    // Named effects

    pub fn add_named_effect(
        &mut self,
        name: &str,
        transform: Option<Transform>,
        registry: &mut NamedEffects,
    ) {
        registry.register(name, self.id, transform);
        self.named_effects.insert(name.to_string());
    }

    pub fn remove_named_effect(&mut self, name: &str, registry: &mut NamedEffects) -> bool {
        if !self.named_effects.remove(name) {
            return false;
        }
        registry.unregister(name, self.id)
    }

    pub fn find_named_effect<'r>(
        &self,
        name: &str,
        registry: &'r NamedEffects,
    ) -> Option<&'r NamedEffect> {
        registry.find(name)
    }

    pub fn owns_named_effect(&self, name: &str) -> bool {
        self.named_effects.contains(name)
    }

    /// Re-registers the named instances currently alive and drops the ones
    /// that are gone
    pub fn publish_named_effects(
        &mut self,
        current: Vec<(String, Option<Transform>)>,
        registry: &mut NamedEffects,
    ) {
        let live: HashSet<&str> = current.iter().map(|(name, _)| name.as_str()).collect();
        let finished: Vec<String> = self
            .named_effects
            .iter()
            .filter(|name| !live.contains(name.as_str()))
            .cloned()
            .collect();
        for name in finished {
            self.remove_named_effect(&name, registry);
        }
        for (name, transform) in &current {
            self.add_named_effect(name, *transform, registry);
        }
    }

    pub fn release_named_effects(&mut self, registry: &mut NamedEffects) {
        for name in self.named_effects.drain() {
            registry.unregister(&name, self.id);
        }
    }

    // Constraints

    pub fn constraint_manager(&self) -> &ConstraintManager {
        &self.constraint_mgr
    }

    pub fn constraint_manager_mut(&mut self) -> &mut ConstraintManager {
        &mut self.constraint_mgr
    }

    pub fn constraints_initialized(&self) -> bool {
        self.constraints_initialized
    }

    pub fn dynamic_constraint_defs(&self) -> &[DynamicConstraint] {
        &self.dynamic_constraint_defs
    }

    pub fn remap_defs(&self) -> &[DynamicConstraint] {
        &self.remap_defs
    }

    /// Adds a constraint from a textual source: a scene object name,
    /// `ghost:<scope id>`, `effect:<name>`, `x y z` or `x y z ax ay az angle`
    pub fn add_constraint(
        &mut self,
        source_spec: &str,
        name: &str,
        scene: &dyn SceneQuery,
    ) -> Result<(), ChoreographerError> {
        let binding = ConstraintBinding::parse_source(source_spec, scene)?;
        self.add_dynamic(name, binding)
    }

    pub fn add_object_constraint(
        &mut self,
        object: Option<ObjectRef>,
        name: &str,
    ) -> Result<(), ChoreographerError> {
        self.add_dynamic(name, ConstraintBinding::Object(object))
    }

    pub fn add_point_constraint(
        &mut self,
        point: Point3,
        name: &str,
    ) -> Result<(), ChoreographerError> {
        self.add_dynamic(name, ConstraintBinding::Point(point))
    }

    pub fn add_transform_constraint(
        &mut self,
        transform: Transform,
        name: &str,
    ) -> Result<(), ChoreographerError> {
        self.add_dynamic(name, ConstraintBinding::Transform(transform))
    }

    pub fn add_scope_constraint(
        &mut self,
        scope_id: ScopeId,
        is_shape: bool,
        name: &str,
    ) -> Result<(), ChoreographerError> {
        self.add_dynamic(name, ConstraintBinding::ScopeId { scope_id, is_shape })
    }

    pub fn add_effect_constraint(
        &mut self,
        effect_name: &str,
        name: &str,
    ) -> Result<(), ChoreographerError> {
        self.add_dynamic(name, ConstraintBinding::Effect(effect_name.to_string()))
    }

    fn add_dynamic(
        &mut self,
        name: &str,
        binding: ConstraintBinding,
    ) -> Result<(), ChoreographerError> {
        upsert(&mut self.dynamic_constraint_defs, name, binding)?;
        self.rebind_if_initialized(name);
        Ok(())
    }

    /// Redirects constraint `name` to a new source. Remaps take precedence over
    /// the hook and over dynamic constraints.
    pub fn remap_constraint(
        &mut self,
        name: &str,
        source_spec: &str,
        scene: &dyn SceneQuery,
    ) -> Result<(), ChoreographerError> {
        let binding = ConstraintBinding::parse_source(source_spec, scene)?;
        upsert(&mut self.remap_defs, name, binding)?;
        debug!("choreographer {} remapped '{}' to '{}'", self.id, name, source_spec);
        self.rebind_if_initialized(name);
        Ok(())
    }

    pub fn set_remap_hook(&mut self, hook: Box<dyn RemapHook>) {
        self.remap_hook = Some(hook);
    }

    pub fn clear_remap_hook(&mut self) {
        self.remap_hook = None;
    }

    /// Binding for `name`: the remap list first, then the remap hook, then the
    /// dynamic constraints
    pub fn resolve_constraint(&self, name: &str) -> Option<ConstraintBinding> {
        if let Some(remap) = self.remap_defs.iter().rev().find(|def| def.name == name) {
            return Some(remap.binding.clone());
        }
        if let Some(binding) = self
            .remap_hook
            .as_ref()
            .and_then(|hook| hook.remap(name))
        {
            return Some(binding);
        }
        self.dynamic_constraint_defs
            .iter()
            .rev()
            .find(|def| def.name == name)
            .map(|def| def.binding.clone())
    }

    fn rebind_if_initialized(&mut self, name: &str) {
        if !self.constraints_initialized {
            return;
        }
        self.apply_binding(name);
        if self.host.is_server() {
            self.needs_sync = true;
        }
    }

    fn apply_binding(&mut self, name: &str) {
        let Some(binding) = self.resolve_constraint(name) else {
            return;
        };
        if let Err(err) = self.constraint_mgr.set_binding(name, binding) {
            warn!("choreographer {} could not bind '{}': {}", self.id, name, err);
        }
    }

    /// Resolved bindings of every runtime-added or remapped constraint, in the
    /// form they are replicated
    pub fn effective_constraint_bindings(&self) -> Vec<DynamicConstraint> {
        let mut names: Vec<&str> = Vec::new();
        for def in self.dynamic_constraint_defs.iter().chain(self.remap_defs.iter()) {
            if !names.contains(&def.name.as_str()) {
                names.push(&def.name);
            }
        }
        names
            .into_iter()
            .filter_map(|name| {
                self.resolve_constraint(name)
                    .map(|binding| DynamicConstraint::new(name, binding))
            })
            .collect()
    }

    /// Replaces dynamic constraints with bindings received from the server
    pub fn unpack_constraint_bindings(&mut self, bindings: Vec<DynamicConstraint>) {
        for DynamicConstraint { name, binding } in bindings {
            match self.dynamic_constraint_defs.iter_mut().find(|def| def.name == name) {
                Some(def) => def.binding = binding,
                None => self
                    .dynamic_constraint_defs
                    .push(DynamicConstraint { name: name.clone(), binding }),
            }
            if self.constraints_initialized {
                self.apply_binding(&name);
            }
        }
    }

    /// Defines and binds every constraint slot. Runs once; later calls do nothing.
    pub fn init_constraints(&mut self, defs: &[ConstraintDef], scene: &dyn SceneQuery) {
        if self.constraints_initialized {
            return;
        }

        self.constraint_mgr
            .init_constraint_defs(defs, self.host, scene);

        match self
            .constraint_mgr
            .define_constraint(ConstraintKind::Object, CAMERA_CONSTRAINT)
        {
            Ok(id) => {
                self.constraint_mgr.set_treat_as_camera(id, true);
                if let Some(camera) = scene.find_local_camera() {
                    if let Err(err) = self.constraint_mgr.set_reference_object(id, Some(camera)) {
                        warn!("choreographer {} could not bind the camera: {}", self.id, err);
                    }
                }
                self.camera_constraint = Some(id);
            }
            Err(err) => warn!("choreographer {} has no camera constraint: {}", self.id, err),
        }

        if self.host == HostType::Client {
            let position = scene.find_local_listener_position();
            match self
                .constraint_mgr
                .set_reference_point(LISTENER_CONSTRAINT, position)
            {
                Ok(id) => self.listener_constraint = Some(id),
                Err(err) => warn!("choreographer {} has no listener constraint: {}", self.id, err),
            }
        }

        if let Some(extra) = self.extra {
            if let Err(err) = self
                .constraint_mgr
                .set_reference_object(EXTRA_CONSTRAINT, Some(extra))
            {
                warn!("choreographer {} could not bind extra: {}", self.id, err);
            }
        }

        let mut names: Vec<String> = self.constraint_mgr.names().map(str::to_string).collect();
        for def in self.dynamic_constraint_defs.iter().chain(self.remap_defs.iter()) {
            if !names.contains(&def.name) {
                names.push(def.name.clone());
            }
        }
        for name in names {
            self.apply_binding(&name);
        }

        self.constraints_initialized = true;
    }

    fn camera_remapped(&self) -> bool {
        self.resolve_constraint(CAMERA_CONSTRAINT).is_some()
    }

    /// Rebinds the camera and listener slots to this host's own camera and
    /// listener. Clients call this every tick.
    pub fn refresh_local_constraints(&mut self, scene: &dyn SceneQuery) {
        if self.host != HostType::Client || !self.constraints_initialized {
            return;
        }
        if let Some(id) = self.listener_constraint {
            if let Err(err) = self
                .constraint_mgr
                .set_reference_point(id, scene.find_local_listener_position())
            {
                warn!("choreographer {} lost its listener slot: {}", self.id, err);
            }
        }
        if let Some(id) = self.camera_constraint {
            if !self.camera_remapped() {
                if let Err(err) = self
                    .constraint_mgr
                    .set_reference_object(id, scene.find_local_camera())
                {
                    warn!("choreographer {} lost its camera slot: {}", self.id, err);
                }
            }
        }
    }

    pub fn sample_constraints(
        &mut self,
        dt: f32,
        now_ms: u64,
        scene: &dyn SceneQuery,
        named_effects: &NamedEffects,
    ) {
        let camera_override = if self.host == HostType::Client && !self.camera_remapped() {
            scene
                .find_local_camera()
                .and_then(|camera| scene.object_transform(camera))
                .map(|transform| transform.position)
        } else {
            None
        };
        let ctx = SampleContext {
            scene,
            named_effects,
        };
        self.constraint_mgr
            .sample(dt, now_ms, camera_override, &ctx);
    }

    /// A constraint changed after initialization and clients need a resync
    pub fn take_needs_sync(&mut self) -> bool {
        std::mem::take(&mut self.needs_sync)
    }

    // Scoping

    pub fn add_explicit_viewer(&mut self, key: ConnectionKey) -> bool {
        if self.explicit_viewers.contains(&key) {
            return false;
        }
        self.explicit_viewers.push(key);
        true
    }

    pub fn remove_explicit_viewer(&mut self, key: &ConnectionKey) -> bool {
        let before = self.explicit_viewers.len();
        self.explicit_viewers.retain(|viewer| viewer != key);
        before != self.explicit_viewers.len()
    }

    pub fn clear_explicit_viewers(&mut self) {
        self.explicit_viewers.clear();
    }

    pub fn explicit_viewers(&self) -> &[ConnectionKey] {
        &self.explicit_viewers
    }

    /// With no explicit viewers every connection sees the choreographer
    pub fn is_visible_to(&self, key: &ConnectionKey) -> bool {
        self.explicit_viewers.is_empty() || self.explicit_viewers.contains(key)
    }
}

fn trigger_bit(bit: u8) -> u32 {
    1u32.checked_shl(u32::from(bit)).unwrap_or(0)
}

fn upsert(
    defs: &mut Vec<DynamicConstraint>,
    name: &str,
    binding: ConstraintBinding,
) -> Result<(), ChoreographerError> {
    if name.is_empty() {
        return Err(ChoreographerError::EmptyName);
    }
    match defs.iter_mut().find(|def| def.name == name) {
        Some(def) => def.binding = binding,
        None => defs.push(DynamicConstraint::new(name, binding)),
    }
    Ok(())
}
