use crate::{
    constraint::{ConstraintDef, ConstraintError},
    types::HostType,
};

/// Primitive kinds an effect template entry can instantiate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Billboard,
    StaticShape,
    /// Invisible anchor, useful as a named effect other effects constrain to
    Mooring,
    ParticlePool,
    Sound,
    Light,
    Custom(u16),
}

/// Timing of one effect instance, in effect-local seconds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectTiming {
    pub delay: f32,
    /// Negative means the effect lives until stopped
    pub lifetime: f32,
    pub fade_in: f32,
    pub fade_out: f32,
    /// Time the effect lingers after fading out
    pub residue: f32,
}

impl Default for EffectTiming {
    fn default() -> Self {
        Self {
            delay: 0.0,
            lifetime: -1.0,
            fade_in: 0.0,
            fade_out: 0.0,
            residue: 0.0,
        }
    }
}

impl EffectTiming {
    pub fn is_infinite(&self) -> bool {
        self.lifetime < 0.0
    }
}

/// One entry of a phrase's effect list
#[derive(Clone, Debug, PartialEq)]
pub struct EffectTemplate {
    pub kind: EffectKind,
    /// Publishes the instance in the session's named-effect registry
    pub effect_name: Option<String>,
    /// Constraint spec the instance is positioned by
    pub constraint: Option<String>,
    /// Stop gracefully once the constraint stops resolving
    pub life_constraint: bool,
    pub timing: EffectTiming,
    pub ranking_range: (u8, u8),
    pub lod_range: (u8, u8),
    /// Trigger bits that must all be set for the instance to be created
    pub exec_conditions: u32,
    /// Trigger bits that must stay set for the instance to keep living
    pub life_conditions: u32,
    pub runs_on_server: bool,
    pub runs_on_client: bool,
}

impl EffectTemplate {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            effect_name: None,
            constraint: None,
            life_constraint: false,
            timing: EffectTiming::default(),
            ranking_range: (0, u8::MAX),
            lod_range: (0, u8::MAX),
            exec_conditions: 0,
            life_conditions: 0,
            runs_on_server: false,
            runs_on_client: true,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.effect_name = Some(name.to_string());
        self
    }

    pub fn constrained_to(mut self, spec: &str) -> Self {
        self.constraint = Some(spec.to_string());
        self
    }

    pub fn with_life_constraint(mut self) -> Self {
        self.life_constraint = true;
        self
    }

    pub fn with_timing(mut self, timing: EffectTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.timing.delay = delay;
        self
    }

    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.timing.lifetime = lifetime;
        self
    }

    pub fn with_fades(mut self, fade_in: f32, fade_out: f32) -> Self {
        self.timing.fade_in = fade_in;
        self.timing.fade_out = fade_out;
        self
    }

    pub fn with_residue(mut self, residue: f32) -> Self {
        self.timing.residue = residue;
        self
    }

    pub fn with_ranking_range(mut self, low: u8, high: u8) -> Self {
        self.ranking_range = (low, high);
        self
    }

    pub fn with_lod_range(mut self, low: u8, high: u8) -> Self {
        self.lod_range = (low, high);
        self
    }

    pub fn with_exec_conditions(mut self, conditions: u32) -> Self {
        self.exec_conditions = conditions;
        self
    }

    pub fn with_life_conditions(mut self, conditions: u32) -> Self {
        self.life_conditions = conditions;
        self
    }

    pub fn with_hosts(mut self, runs_on_server: bool, runs_on_client: bool) -> Self {
        self.runs_on_server = runs_on_server;
        self.runs_on_client = runs_on_client;
        self
    }

    pub fn runs_on(&self, host: HostType) -> bool {
        match host {
            HostType::Server => self.runs_on_server,
            HostType::Client => self.runs_on_client,
        }
    }

    /// Name of the constraint slot this entry is positioned by
    pub fn constraint_name(&self) -> Option<&str> {
        self.constraint.as_deref().map(str::trim)
    }

    pub fn constraint_def(&self) -> Result<Option<ConstraintDef>, ConstraintError> {
        let Some(spec) = &self.constraint else {
            return Ok(None);
        };
        let def = ConstraintDef::parse(spec)?.with_hosts(self.runs_on_server, self.runs_on_client);
        Ok(Some(def))
    }
}
