use choreo_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::{
    constraint::ConstraintBinding,
    types::{GhostIndex, ObjectRef, ScopeId},
};

/// Server side of the transport: how a scene object is known to one connection
pub trait GhostLookup {
    fn ghost_index(&self, object: ObjectRef) -> Option<GhostIndex>;
    fn scope_id(&self, object: ObjectRef) -> Option<ScopeId>;
    fn is_shape(&self, _object: ObjectRef) -> bool {
        false
    }
}

/// Client side of the transport: turns wire references back into local objects
pub trait GhostResolve {
    fn resolve_ghost(&self, index: GhostIndex) -> Option<ObjectRef>;
    fn resolve_scope_id(&self, _scope_id: ScopeId) -> Option<ObjectRef> {
        None
    }
}

/// A scene object as written on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetObjectRef {
    /// Already ghosted to this connection
    Ghost(GhostIndex),
    /// Known by scope id, the ghost may arrive later
    Scope { scope_id: ScopeId, is_shape: bool },
    /// Not replicated to this connection
    Unavailable,
}

impl NetObjectRef {
    pub fn for_object(object: ObjectRef, lookup: &dyn GhostLookup) -> Self {
        if let Some(index) = lookup.ghost_index(object) {
            return NetObjectRef::Ghost(index);
        }
        match lookup.scope_id(object) {
            Some(scope_id) => NetObjectRef::Scope {
                scope_id,
                is_shape: lookup.is_shape(object),
            },
            None => NetObjectRef::Unavailable,
        }
    }

    pub fn resolve_object(&self, resolver: &dyn GhostResolve) -> Option<ObjectRef> {
        match self {
            NetObjectRef::Ghost(index) => resolver.resolve_ghost(*index),
            NetObjectRef::Scope { scope_id, .. } => resolver.resolve_scope_id(*scope_id),
            NetObjectRef::Unavailable => None,
        }
    }

    /// Unresolved scope ids stay as lazy scope bindings, anything else that
    /// does not resolve becomes a missing object
    pub fn to_binding(&self, resolver: &dyn GhostResolve) -> ConstraintBinding {
        match (self, self.resolve_object(resolver)) {
            (_, Some(object)) => ConstraintBinding::Object(Some(object)),
            (NetObjectRef::Scope { scope_id, is_shape }, None) => ConstraintBinding::ScopeId {
                scope_id: *scope_id,
                is_shape: *is_shape,
            },
            _ => ConstraintBinding::Object(None),
        }
    }
}

pub(crate) fn read_variable_u32(reader: &mut BitReader) -> Result<u32, SerdeErr> {
    let value = UnsignedVariableInteger::<7>::de(reader)?.get();
    u32::try_from(value).map_err(|_| SerdeErr)
}

impl Serde for NetObjectRef {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            NetObjectRef::Ghost(index) => {
                true.ser(writer);
                UnsignedVariableInteger::<7>::new(*index).ser(writer);
            }
            NetObjectRef::Scope { scope_id, is_shape } => {
                false.ser(writer);
                true.ser(writer);
                UnsignedVariableInteger::<7>::new(*scope_id).ser(writer);
                is_shape.ser(writer);
            }
            NetObjectRef::Unavailable => {
                false.ser(writer);
                false.ser(writer);
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if bool::de(reader)? {
            let index = UnsignedVariableInteger::<7>::de(reader)?.get();
            let index = GhostIndex::try_from(index).map_err(|_| SerdeErr)?;
            return Ok(NetObjectRef::Ghost(index));
        }
        if bool::de(reader)? {
            let scope_id = read_variable_u32(reader)?;
            let is_shape = bool::de(reader)?;
            return Ok(NetObjectRef::Scope { scope_id, is_shape });
        }
        Ok(NetObjectRef::Unavailable)
    }

    fn bit_length(&self) -> u32 {
        match self {
            NetObjectRef::Ghost(index) => 1 + UnsignedVariableInteger::<7>::new(*index).bit_length(),
            NetObjectRef::Scope { scope_id, .. } => {
                3 + UnsignedVariableInteger::<7>::new(*scope_id).bit_length()
            }
            NetObjectRef::Unavailable => 2,
        }
    }
}
