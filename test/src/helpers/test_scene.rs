use std::collections::HashMap;

use choreo_shared::{ObjectRef, Point3, SceneQuery, ScopeId, Transform};

/// In-memory scene with named objects, a camera and a listener
#[derive(Default)]
pub struct TestScene {
    objects: HashMap<ObjectRef, Transform>,
    names: HashMap<String, ObjectRef>,
    scope_ids: HashMap<ScopeId, ObjectRef>,
    camera: Option<ObjectRef>,
    listener: Point3,
    next_id: u32,
}

impl TestScene {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Adds an object at `position` and returns its handle
    pub fn spawn(&mut self, name: &str, position: Point3) -> ObjectRef {
        let object = ObjectRef::new(self.next_id);
        self.next_id += 1;
        self.objects.insert(object, Transform::from_position(position));
        self.names.insert(name.to_string(), object);
        object
    }

    pub fn despawn(&mut self, object: ObjectRef) {
        self.objects.remove(&object);
        self.names.retain(|_, named| *named != object);
    }

    pub fn move_to(&mut self, object: ObjectRef, position: Point3) {
        if let Some(transform) = self.objects.get_mut(&object) {
            transform.position = position;
        }
    }

    pub fn set_camera(&mut self, camera: Option<ObjectRef>) {
        self.camera = camera;
    }

    pub fn set_listener(&mut self, position: Point3) {
        self.listener = position;
    }

    /// Makes `object` resolvable through its network scope id
    pub fn assign_scope_id(&mut self, object: ObjectRef, scope_id: ScopeId) {
        self.scope_ids.insert(scope_id, object);
    }
}

impl SceneQuery for TestScene {
    fn find_local_camera(&self) -> Option<ObjectRef> {
        self.camera
    }

    fn find_local_listener_position(&self) -> Point3 {
        self.listener
    }

    fn object_transform(&self, object: ObjectRef) -> Option<Transform> {
        self.objects.get(&object).copied()
    }

    fn find_object(&self, name: &str) -> Option<ObjectRef> {
        self.names.get(name).copied()
    }

    fn resolve_scope_id(&self, scope_id: ScopeId) -> Option<ObjectRef> {
        self.scope_ids.get(&scope_id).copied()
    }
}
