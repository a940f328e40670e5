use crate::{
    constraint::{
        binding::{EFFECT_SOURCE_PREFIX, GHOST_SOURCE_PREFIX, SCENE_SOURCE_PREFIX},
        ConstraintError, ConstraintKind,
    },
    math::{Point3, Quat, Transform},
    types::{HostType, ScopeId},
};

/// Bound to the observing camera. Clients rebind it locally every tick.
pub const CAMERA_CONSTRAINT: &str = "camera";
/// Bound to the local audio listener position on clients
pub const LISTENER_CONSTRAINT: &str = "listener";
/// Bound to the choreographer's extra object, when it has one
pub const EXTRA_CONSTRAINT: &str = "extra";
/// Bound to the picked object of a Selectron
pub const SELECTED_CONSTRAINT: &str = "selected";

/// Template-side payload of a constraint definition.
///
/// `None` payloads are predefined slots the owner binds later.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintPayload {
    /// Named scene object, looked up when constraints are initialized
    Object(Option<String>),
    Point(Option<Point3>),
    Transform(Option<Transform>),
    ScopeId(ScopeId),
    Effect(String),
}

impl ConstraintPayload {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            ConstraintPayload::Object(_) => ConstraintKind::Object,
            ConstraintPayload::Point(_) => ConstraintKind::Point,
            ConstraintPayload::Transform(_) => ConstraintKind::Transform,
            ConstraintPayload::ScopeId(_) => ConstraintKind::ScopeId,
            ConstraintPayload::Effect(_) => ConstraintKind::Effect,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintDef {
    pub name: String,
    pub payload: ConstraintPayload,
    pub runs_on_server: bool,
    pub runs_on_client: bool,
}

impl ConstraintDef {
    pub fn new(name: &str, payload: ConstraintPayload) -> Self {
        Self {
            name: name.to_string(),
            payload,
            runs_on_server: true,
            runs_on_client: true,
        }
    }

    /// Parses the constraint spec of an effect template entry.
    ///
    /// `scene:NAME`, `effect:NAME` and `ghost:N` carry their own payload, as do
    /// three or seven numbers. `listener` is a point slot. Any other word is a
    /// predefined object slot such as `camera`, `extra` or `selected`.
    pub fn parse(spec: &str) -> Result<Self, ConstraintError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ConstraintError::EmptySpec);
        }

        let named = |rest: &str| -> Result<String, ConstraintError> {
            let rest = rest.trim();
            if rest.is_empty() {
                return Err(ConstraintError::MissingName {
                    spec: spec.to_string(),
                });
            }
            Ok(rest.to_string())
        };

        let payload = if let Some(rest) = spec.strip_prefix(SCENE_SOURCE_PREFIX) {
            ConstraintPayload::Object(Some(named(rest)?))
        } else if let Some(rest) = spec.strip_prefix(EFFECT_SOURCE_PREFIX) {
            ConstraintPayload::Effect(named(rest)?)
        } else if let Some(rest) = spec.strip_prefix(GHOST_SOURCE_PREFIX) {
            let scope_id = rest.trim().parse::<ScopeId>().map_err(|_| {
                ConstraintError::InvalidScopeId {
                    spec: spec.to_string(),
                }
            })?;
            ConstraintPayload::ScopeId(scope_id)
        } else if spec == LISTENER_CONSTRAINT {
            ConstraintPayload::Point(None)
        } else {
            let numbers: Option<Vec<f32>> = spec
                .split_whitespace()
                .map(|word| word.parse::<f32>().ok())
                .collect();
            match numbers.as_deref() {
                Some([x, y, z]) => ConstraintPayload::Point(Some(Point3::new(*x, *y, *z))),
                Some([x, y, z, ax, ay, az, angle]) => {
                    ConstraintPayload::Transform(Some(Transform::new(
                        Point3::new(*x, *y, *z),
                        Quat::from_axis_angle(Point3::new(*ax, *ay, *az), *angle),
                    )))
                }
                _ => ConstraintPayload::Object(None),
            }
        };

        Ok(Self::new(spec, payload))
    }

    pub fn with_hosts(mut self, runs_on_server: bool, runs_on_client: bool) -> Self {
        self.runs_on_server = runs_on_server;
        self.runs_on_client = runs_on_client;
        self
    }

    pub fn kind(&self) -> ConstraintKind {
        self.payload.kind()
    }

    pub fn runs_on(&self, host: HostType) -> bool {
        match host {
            HostType::Server => self.runs_on_server,
            HostType::Client => self.runs_on_client,
        }
    }
}
