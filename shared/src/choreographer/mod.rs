mod choreographer;
mod error;
mod remap;

pub use choreographer::Choreographer;
pub use error::ChoreographerError;
pub use remap::{CameraRedirect, DynamicConstraint, RemapHook};
