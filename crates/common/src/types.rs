use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity assigned to a persistable scene object.
///
/// Unlike a scene index, a guid survives session reloads: it is captured in
/// the identity snapshot on save and reattached to the matching object on
/// the following load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(pub u64);

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Spatial transform: position and rotation.
///
/// Captured as provenance metadata on identity snapshots; never used to
/// reconstruct an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}
