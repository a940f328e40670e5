//! # Choreo Shared
//! Constraints, phrases, choreographers and the replication protocol shared
//! between the choreo-server & choreo-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use choreo_serde::{
    BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, SerdeIntegerConversion,
    SignedInteger, SignedVariableInteger, UnsignedInteger, UnsignedVariableInteger, MTU_SIZE_BITS,
    MTU_SIZE_BYTES,
};

pub mod choreographer;
pub mod constraint;
pub mod directory;
pub mod effect;
pub mod event_queue;
pub mod events;
pub mod math;
pub mod performance;
pub mod phrase;
pub mod protocol;
pub mod scene;
pub mod sync;
pub mod types;

pub use choreographer::{
    CameraRedirect, Choreographer, ChoreographerError, DynamicConstraint, RemapHook,
};
pub use constraint::{
    ConstraintBinding, ConstraintDef, ConstraintError, ConstraintKind, ConstraintManager,
    ConstraintSample,
};
pub use directory::{Directory, DirectoryError, ProcessOrder};
pub use effect::{
    EffectFactory, EffectKind, EffectPrimitive, EffectTemplate, EffectTiming, NamedEffects,
    PrimitiveFactory,
};
pub use event_queue::EventQueue;
pub use events::{ChoreographyEvent, ChoreographyEvents};
pub use math::{Point3, Quat, Transform};
pub use performance::{
    Effectron, Marks, Performance, PerformanceKind, PerformanceState, ProcessContext, Selectron,
    StateChange,
};
pub use phrase::{Phrase, PhraseTemplate};
pub use protocol::{
    EffectronTemplate, Protocol, ProtocolPlugin, SelectionRegistry, SelectronTemplate,
    TemplateError,
};
pub use scene::SceneQuery;
pub use sync::{
    ChoreographyMessage, ChoreographyPacket, GhostLookup, GhostResolve, NetObjectRef,
    PerformanceUpdate, UpdateMask,
};
pub use types::{
    ChoreographerId, ConnectionKey, GhostIndex, HostType, ObjectRef, ScopeId, TemplateIndex,
};
