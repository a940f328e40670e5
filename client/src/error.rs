use thiserror::Error;

use choreo_shared::{
    ChoreographerId, DirectoryError, PerformanceKind, SerdeErr, TemplateIndex,
};

#[derive(Debug, Error)]
pub enum ChoreoClientError {
    /// The packet could not be decoded; client and server protocols differ
    #[error("failed to decode choreography packet: {0}")]
    Decode(#[from] SerdeErr),
    /// The server created a replica from a template this client lacks
    #[error("no {kind:?} template at index {index}")]
    UnknownTemplate {
        kind: PerformanceKind,
        index: TemplateIndex,
    },
    /// The server created a replica under an id that is still in use
    #[error("replica {id} already exists")]
    DuplicateReplica { id: ChoreographerId },
    /// The replica could not be inserted into the directory
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
