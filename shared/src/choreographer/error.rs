use thiserror::Error;

use crate::constraint::ConstraintError;

/// Errors that can occur while configuring a choreographer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChoreographerError {
    /// Constraint source or definition could not be used
    #[error("Constraint could not be added: {0}")]
    Constraint(#[from] ConstraintError),

    /// Constraint names must be non-empty
    #[error("Constraint name is empty")]
    EmptyName,

    /// Time factor must be a positive, finite number
    #[error("Invalid time factor {value}")]
    InvalidTimeFactor { value: f32 },
}
