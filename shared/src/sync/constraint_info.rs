use choreo_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::{
    choreographer::DynamicConstraint,
    constraint::{ConstraintBinding, ConstraintKind},
    math::{Point3, Transform},
    sync::{
        net_object::read_variable_u32, GhostLookup, GhostResolve, NetObjectRef,
    },
    types::ScopeId,
};

/// A constraint binding in its wire form
#[derive(Clone, Debug, PartialEq)]
pub enum NetBinding {
    Object(NetObjectRef),
    Point(Point3),
    Transform(Transform),
    ScopeId { scope_id: ScopeId, is_shape: bool },
    Effect(String),
}

impl NetBinding {
    pub fn from_binding(binding: &ConstraintBinding, lookup: &dyn GhostLookup) -> Self {
        match binding {
            ConstraintBinding::Object(Some(object)) => {
                NetBinding::Object(NetObjectRef::for_object(*object, lookup))
            }
            ConstraintBinding::Object(None) => NetBinding::Object(NetObjectRef::Unavailable),
            ConstraintBinding::Point(point) => NetBinding::Point(*point),
            ConstraintBinding::Transform(transform) => NetBinding::Transform(*transform),
            ConstraintBinding::ScopeId { scope_id, is_shape } => NetBinding::ScopeId {
                scope_id: *scope_id,
                is_shape: *is_shape,
            },
            ConstraintBinding::Effect(name) => NetBinding::Effect(name.clone()),
        }
    }

    pub fn to_binding(&self, resolver: &dyn GhostResolve) -> ConstraintBinding {
        match self {
            NetBinding::Object(object) => object.to_binding(resolver),
            NetBinding::Point(point) => ConstraintBinding::Point(*point),
            NetBinding::Transform(transform) => ConstraintBinding::Transform(*transform),
            NetBinding::ScopeId { scope_id, is_shape } => match resolver
                .resolve_scope_id(*scope_id)
            {
                Some(object) => ConstraintBinding::Object(Some(object)),
                None => ConstraintBinding::ScopeId {
                    scope_id: *scope_id,
                    is_shape: *is_shape,
                },
            },
            NetBinding::Effect(name) => ConstraintBinding::Effect(name.clone()),
        }
    }

    pub fn kind(&self) -> ConstraintKind {
        match self {
            NetBinding::Object(_) => ConstraintKind::Object,
            NetBinding::Point(_) => ConstraintKind::Point,
            NetBinding::Transform(_) => ConstraintKind::Transform,
            NetBinding::ScopeId { .. } => ConstraintKind::ScopeId,
            NetBinding::Effect(_) => ConstraintKind::Effect,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintInfoEntry {
    pub name: String,
    pub binding: NetBinding,
}

/// The runtime-added constraints of a choreographer, as replicated to clients
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstraintInfo {
    pub entries: Vec<ConstraintInfoEntry>,
}

impl ConstraintInfo {
    pub fn pack(bindings: &[DynamicConstraint], lookup: &dyn GhostLookup) -> Self {
        let entries = bindings
            .iter()
            .map(|constraint| ConstraintInfoEntry {
                name: constraint.name.clone(),
                binding: NetBinding::from_binding(&constraint.binding, lookup),
            })
            .collect();
        Self { entries }
    }

    pub fn resolve(&self, resolver: &dyn GhostResolve) -> Vec<DynamicConstraint> {
        self.entries
            .iter()
            .map(|entry| DynamicConstraint::new(&entry.name, entry.binding.to_binding(resolver)))
            .collect()
    }
}

impl Serde for ConstraintInfo {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedVariableInteger::<4>::new(self.entries.len() as u64).ser(writer);
        for entry in &self.entries {
            entry.name.ser(writer);
            entry.binding.kind().ser(writer);
            match &entry.binding {
                NetBinding::Object(object) => object.ser(writer),
                NetBinding::Point(point) => point.ser(writer),
                NetBinding::Transform(transform) => transform.ser(writer),
                NetBinding::ScopeId { scope_id, is_shape } => {
                    UnsignedVariableInteger::<7>::new(*scope_id).ser(writer);
                    is_shape.ser(writer);
                }
                NetBinding::Effect(name) => name.ser(writer),
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let count = UnsignedVariableInteger::<4>::de(reader)?.get();
        let count = usize::try_from(count).map_err(|_| SerdeErr)?;
        // every entry needs at least a name length and a kind
        if count > reader.bits_remaining() {
            return Err(SerdeErr);
        }
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let name = String::de(reader)?;
            let binding = match ConstraintKind::de(reader)? {
                ConstraintKind::Object => NetBinding::Object(NetObjectRef::de(reader)?),
                ConstraintKind::Point => NetBinding::Point(Point3::de(reader)?),
                ConstraintKind::Transform => NetBinding::Transform(Transform::de(reader)?),
                ConstraintKind::ScopeId => NetBinding::ScopeId {
                    scope_id: read_variable_u32(reader)?,
                    is_shape: bool::de(reader)?,
                },
                ConstraintKind::Effect => NetBinding::Effect(String::de(reader)?),
            };
            entries.push(ConstraintInfoEntry { name, binding });
        }
        Ok(Self { entries })
    }

    fn bit_length(&self) -> u32 {
        let mut bits = UnsignedVariableInteger::<4>::new(self.entries.len() as u64).bit_length();
        for entry in &self.entries {
            bits += entry.name.bit_length() + entry.binding.kind().bit_length();
            bits += match &entry.binding {
                NetBinding::Object(object) => object.bit_length(),
                NetBinding::Point(point) => point.bit_length(),
                NetBinding::Transform(transform) => transform.bit_length(),
                NetBinding::ScopeId { scope_id, .. } => {
                    UnsignedVariableInteger::<7>::new(*scope_id).bit_length() + 1
                }
                NetBinding::Effect(name) => name.bit_length(),
            };
        }
        bits
    }
}
