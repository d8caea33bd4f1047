//! Host-side scene model as the save layer sees it.
//!
//! The host owns object lifecycle and the scene graph; this crate carries
//! only what identity assignment and persistence need: an ordered list of
//! objects registered to save, and a guid tag slot on each object.
//!
//! # Invariants
//! - Registration order is the save order and must be positionally stable
//!   between the save that captured a snapshot and the load that consumes it.
//! - At most one guid tag per object.

pub mod scene;

pub use scene::{Scene, SceneObject};
