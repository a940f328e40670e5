use choreo_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr, UnsignedInteger};

use crate::{
    constraint::ConstraintError,
    math::{Point3, Quat, Transform},
    scene::SceneQuery,
    types::{ObjectRef, ScopeId},
};

pub const GHOST_SOURCE_PREFIX: &str = "ghost:";
pub const EFFECT_SOURCE_PREFIX: &str = "effect:";
pub const SCENE_SOURCE_PREFIX: &str = "scene:";

/// The five reference kinds a constraint slot can be bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Object,
    Point,
    Transform,
    ScopeId,
    Effect,
}

impl Serde for ConstraintKind {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let index: u8 = match self {
            ConstraintKind::Object => 0,
            ConstraintKind::Point => 1,
            ConstraintKind::Transform => 2,
            ConstraintKind::ScopeId => 3,
            ConstraintKind::Effect => 4,
        };
        UnsignedInteger::<3>::new(index).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let index: u8 = UnsignedInteger::<3>::de(reader)?.to();
        match index {
            0 => Ok(ConstraintKind::Object),
            1 => Ok(ConstraintKind::Point),
            2 => Ok(ConstraintKind::Transform),
            3 => Ok(ConstraintKind::ScopeId),
            4 => Ok(ConstraintKind::Effect),
            _ => Err(SerdeErr),
        }
    }

    fn bit_length(&self) -> u32 {
        <Self as ConstBitLength>::const_bit_length()
    }
}

impl ConstBitLength for ConstraintKind {
    fn const_bit_length() -> u32 {
        <UnsignedInteger<3> as ConstBitLength>::const_bit_length()
    }
}

/// What a constraint slot is currently attached to
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintBinding {
    /// A scene object. `None` is a known-but-missing object and samples invalid.
    Object(Option<ObjectRef>),
    Point(Point3),
    Transform(Transform),
    /// A networked object not yet ghosted locally, resolved lazily while sampling
    ScopeId { scope_id: ScopeId, is_shape: bool },
    /// Another choreographer's named effect
    Effect(String),
}

impl ConstraintBinding {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            ConstraintBinding::Object(_) => ConstraintKind::Object,
            ConstraintBinding::Point(_) => ConstraintKind::Point,
            ConstraintBinding::Transform(_) => ConstraintKind::Transform,
            ConstraintBinding::ScopeId { .. } => ConstraintKind::ScopeId,
            ConstraintBinding::Effect(_) => ConstraintKind::Effect,
        }
    }

    /// Parses a textual constraint source.
    ///
    /// Accepted forms, tried in order: `ghost:<scope id>`, `effect:<name>`, the
    /// name of a scene object, `x y z` and `x y z ax ay az angle`.
    pub fn parse_source(spec: &str, scene: &dyn SceneQuery) -> Result<Self, ConstraintError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ConstraintError::EmptySpec);
        }

        if let Some(rest) = spec.strip_prefix(GHOST_SOURCE_PREFIX) {
            let scope_id = rest
                .trim()
                .parse::<ScopeId>()
                .map_err(|_| ConstraintError::InvalidScopeId {
                    spec: spec.to_string(),
                })?;
            return Ok(ConstraintBinding::ScopeId {
                scope_id,
                is_shape: false,
            });
        }

        if let Some(rest) = spec.strip_prefix(EFFECT_SOURCE_PREFIX) {
            let name = rest.trim();
            if name.is_empty() {
                return Err(ConstraintError::MissingName {
                    spec: spec.to_string(),
                });
            }
            return Ok(ConstraintBinding::Effect(name.to_string()));
        }

        let object_name = spec.strip_prefix(SCENE_SOURCE_PREFIX).unwrap_or(spec).trim();
        if let Some(object) = scene.find_object(object_name) {
            return Ok(ConstraintBinding::Object(Some(object)));
        }

        let numbers: Option<Vec<f32>> = spec
            .split_whitespace()
            .map(|word| word.parse::<f32>().ok())
            .collect();
        match numbers.as_deref() {
            Some([x, y, z]) => Ok(ConstraintBinding::Point(Point3::new(*x, *y, *z))),
            Some([x, y, z, ax, ay, az, angle]) => Ok(ConstraintBinding::Transform(Transform::new(
                Point3::new(*x, *y, *z),
                Quat::from_axis_angle(Point3::new(*ax, *ay, *az), *angle),
            ))),
            _ => Err(ConstraintError::UnresolvedSource {
                spec: spec.to_string(),
            }),
        }
    }
}
