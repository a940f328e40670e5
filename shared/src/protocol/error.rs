use thiserror::Error;

use crate::constraint::ConstraintError;

/// Errors that can occur while registering templates with a [`Protocol`](crate::Protocol)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    /// Protocol is locked and cannot be modified
    #[error("Protocol is already locked and cannot be modified. Protocol.lock() has been called and no further changes are allowed")]
    AlreadyLocked,

    /// Another template of the same kind already uses this name
    #[error("A template named '{name}' is already registered")]
    DuplicateName { name: String },

    /// Template index space is exhausted
    #[error("Cannot register '{name}': too many templates")]
    TooManyTemplates { name: String },

    /// An effect entry carries a constraint spec that does not parse
    #[error("Template '{name}' has an invalid constraint: {source}")]
    InvalidConstraint {
        name: String,
        #[source]
        source: ConstraintError,
    },

    /// An effect entry has a negative delay, fade or residue, or a phrase loops
    /// forever without a duration
    #[error("Template '{name}' has invalid timing: {reason}")]
    InvalidTiming { name: String, reason: &'static str },
}
