use thiserror::Error;

use choreo_shared::{ChoreographerError, ChoreographerId};

#[derive(Debug, Error)]
pub enum ChoreoServerError {
    /// No template with this name was registered in the Protocol
    #[error("no template named '{name}' is registered")]
    UnknownTemplate { name: String },
    /// No registered selection template accepts the picked object
    #[error("no selection template matches type mask {type_mask:#x} with style {style}")]
    NoSelectionTemplate { type_mask: u32, style: u8 },
    /// The choreographer was never registered or has already been deleted
    #[error("choreographer {id} is not registered")]
    UnknownChoreographer { id: ChoreographerId },
    /// Configuring the new performance failed
    #[error(transparent)]
    Choreographer(#[from] ChoreographerError),
}
