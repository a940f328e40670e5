mod binding;
mod constraint_def;
mod constraint_manager;
mod error;

pub use binding::{ConstraintBinding, ConstraintKind};
pub use constraint_def::{
    ConstraintDef, ConstraintPayload, CAMERA_CONSTRAINT, EXTRA_CONSTRAINT, LISTENER_CONSTRAINT,
    SELECTED_CONSTRAINT,
};
pub use constraint_manager::{
    ConstraintId, ConstraintKey, ConstraintManager, ConstraintSample, SampleContext,
};
pub use error::ConstraintError;
