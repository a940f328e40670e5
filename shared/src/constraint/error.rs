use thiserror::Error;

use crate::constraint::ConstraintId;

/// Errors that can occur while defining or binding constraints
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    /// A constraint spec or source spec was empty
    #[error("Constraint spec is empty")]
    EmptySpec,

    /// A `ghost:` source spec did not carry a numeric scope id
    #[error("Invalid scope id in constraint source '{spec}'")]
    InvalidScopeId { spec: String },

    /// An `effect:` or `scene:` spec had nothing after the prefix
    #[error("Missing name after prefix in constraint spec '{spec}'")]
    MissingName { spec: String },

    /// Source spec is neither a scene object, a ghost, an effect nor a coordinate list
    #[error("Constraint source '{spec}' could not be resolved")]
    UnresolvedSource { spec: String },

    /// Constraint id was never handed out by this manager
    #[error("Constraint id {id} is not defined")]
    UnknownId { id: ConstraintId },

    /// Manager ran out of 16-bit constraint ids
    #[error("No constraint ids left to define '{name}'")]
    IdsExhausted { name: String },
}
