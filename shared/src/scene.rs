use crate::{
    math::{Point3, Transform},
    types::{ObjectRef, ScopeId},
};

/// Read-only view of the host's scene, supplied by the engine each tick.
///
/// Scene objects are expected to have finished updating their own transforms
/// for the current tick before choreographers sample constraints against them.
pub trait SceneQuery {
    /// The camera object this host renders from. Servers usually have none.
    fn find_local_camera(&self) -> Option<ObjectRef>;

    /// Position of the local audio listener
    fn find_local_listener_position(&self) -> Point3;

    /// Current transform of a scene object, or `None` once it has been destroyed
    fn object_transform(&self, object: ObjectRef) -> Option<Transform>;

    /// Looks up a named scene object
    fn find_object(&self, name: &str) -> Option<ObjectRef>;

    /// Resolves a networked object by scope id once it has been ghosted locally
    fn resolve_scope_id(&self, _scope_id: ScopeId) -> Option<ObjectRef> {
        None
    }
}
