use modsave_common::{Guid, Transform};
use serde::{Deserialize, Serialize};

/// A live object the host has registered for saving.
///
/// Name, tag label, and transform belong to the host; the save layer reads
/// them as provenance metadata. The guid tag slot is the one piece of state
/// owned by the identity manager: empty until a tag is attached, at most one
/// tag per object, and gone when the object is dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    name: String,
    tag: String,
    transform: Transform,
    guid: Option<Guid>,
}

impl SceneObject {
    /// Create an untagged object.
    pub fn new(name: impl Into<String>, tag: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            transform,
            guid: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// The attached identity tag, if any.
    pub fn guid(&self) -> Option<Guid> {
        self.guid
    }

    /// Attach an identity tag, replacing any previous one.
    pub fn attach_guid(&mut self, guid: Guid) {
        if let Some(old) = self.guid.replace(guid) {
            tracing::debug!(object = %self.name, %old, new = %guid, "replaced guid tag");
        }
    }
}

/// Ordered registration list of objects to save.
///
/// Stands in for the host's scene graph: the save layer only ever asks for
/// the objects registered to save, in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object for saving. Registration order is the save order.
    pub fn register(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// The ordered list of objects registered to save.
    pub fn objects_registered_to_save(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Mutable access to the registered objects, for tag attachment.
    pub fn objects_registered_to_save_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
