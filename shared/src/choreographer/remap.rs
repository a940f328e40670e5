use crate::{
    constraint::{ConstraintBinding, CAMERA_CONSTRAINT},
    types::ObjectRef,
};

/// A named constraint binding added or remapped at runtime
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicConstraint {
    pub name: String,
    pub binding: ConstraintBinding,
}

impl DynamicConstraint {
    pub fn new(name: &str, binding: ConstraintBinding) -> Self {
        Self {
            name: name.to_string(),
            binding,
        }
    }
}

/// Host-provided remapping consulted after the explicit remap list
pub trait RemapHook {
    fn remap(&self, name: &str) -> Option<ConstraintBinding>;
}

/// Points the `camera` constraint at a fixed object, e.g. a cinematic camera
pub struct CameraRedirect {
    camera: ObjectRef,
}

impl CameraRedirect {
    pub fn new(camera: ObjectRef) -> Self {
        Self { camera }
    }
}

impl RemapHook for CameraRedirect {
    fn remap(&self, name: &str) -> Option<ConstraintBinding> {
        (name == CAMERA_CONSTRAINT).then(|| ConstraintBinding::Object(Some(self.camera)))
    }
}
