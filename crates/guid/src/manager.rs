use glam::{Quat, Vec3};
use modsave_common::Guid;
use modsave_scene::SceneObject;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Base value for guid allocation, clear of any sentinel or default id.
pub const GUID_BASE: u64 = 0x1000_0000;

/// Errors from identity snapshot handling.
#[derive(Debug, thiserror::Error)]
pub enum GuidError {
    #[error("snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("object count mismatch: snapshot has {saved}, scene has {live}")]
    ObjectCountMismatch { saved: usize, live: usize },
}

/// One saved object entry: its identity plus provenance metadata.
///
/// The non-identity fields record what the object looked like at save time.
/// They are diagnostic only; reattachment is positional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSnapshot {
    pub identity: Guid,
    pub name: String,
    pub tag_label: String,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Allocates stable identities and reattaches them across session reloads.
///
/// The counter is session state: construct one manager per save-slot session
/// and discard it when the session ends.
#[derive(Debug)]
pub struct GuidManager {
    /// Last allocated or restored identity value.
    counter: u64,
}

impl Default for GuidManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GuidManager {
    pub fn new() -> Self {
        Self { counter: GUID_BASE }
    }

    /// Allocate the next identity.
    ///
    /// Advancing the counter and reading it back is a single step; no caller
    /// observes an intermediate value, and freed identities are never reused.
    pub fn allocate(&mut self) -> Guid {
        self.counter += 1;
        Guid(self.counter)
    }

    /// Find the object currently tagged with `guid`.
    ///
    /// Linear scan over the registered objects. This is an on-demand query,
    /// not a hot path; callers go through this function so an index can
    /// replace the scan later without touching them.
    pub fn find_object<'a>(&self, objects: &'a [SceneObject], guid: Guid) -> Option<&'a SceneObject> {
        objects.iter().find(|obj| obj.guid() == Some(guid))
    }

    /// Capture the identity snapshot for the current registered-object list.
    ///
    /// Objects without a tag get a fresh identity in the snapshot, but their
    /// tag slot stays empty here: attachment happens during the restore that
    /// follows the host's next load.
    pub fn capture(&mut self, objects: &[SceneObject]) -> Result<String, GuidError> {
        let nodes: Vec<ObjectSnapshot> = objects
            .iter()
            .map(|obj| ObjectSnapshot {
                identity: obj.guid().unwrap_or_else(|| self.allocate()),
                name: obj.name().to_string(),
                tag_label: obj.tag().to_string(),
                position: obj.transform().position,
                rotation: obj.transform().rotation,
            })
            .collect();
        Ok(serde_json::to_string(&nodes)?)
    }

    /// Reattach identities from a prior snapshot.
    ///
    /// A `payload` of `None` (or an empty string) means no prior save exists
    /// for this slot: the counter is reset and no objects are tagged, which
    /// is success. Otherwise the decoded snapshot must match the live object
    /// list one-to-one by position; a length mismatch is structural
    /// corruption and aborts the whole restore with nothing attached and the
    /// counter left at its reset value.
    pub fn restore(
        &mut self,
        objects: &mut [SceneObject],
        payload: Option<&str>,
    ) -> Result<(), GuidError> {
        self.counter = GUID_BASE - 1;

        let payload = match payload {
            Some(p) if !p.is_empty() => p,
            _ => return Ok(()),
        };

        let nodes: Vec<ObjectSnapshot> = serde_json::from_str(payload)?;
        if nodes.len() != objects.len() {
            tracing::error!(
                saved = nodes.len(),
                live = objects.len(),
                "identity snapshot does not match live scene, aborting restore"
            );
            return Err(GuidError::ObjectCountMismatch {
                saved: nodes.len(),
                live: objects.len(),
            });
        }

        let mut seen = HashSet::new();
        for node in &nodes {
            if !seen.insert(node.identity) {
                tracing::warn!(identity = %node.identity, "duplicate identity in snapshot");
            }
        }

        let mut max = self.counter;
        for (obj, node) in objects.iter_mut().zip(&nodes) {
            if obj.name() != node.name {
                tracing::debug!(saved = %node.name, live = %obj.name(), "snapshot name drift");
            }
            obj.attach_guid(node.identity);
            max = max.max(node.identity.0);
        }
        self.counter = max;
        Ok(())
    }
}
