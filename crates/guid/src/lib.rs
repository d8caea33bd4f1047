//! Identity manager: stable guids for transient scene objects.
//!
//! # Invariants
//! - Guids are allocated monotonically from [`GUID_BASE`] and never reused.
//! - Restore is all-or-nothing: an object-count mismatch attaches no tags.
//! - After a successful restore the counter clears every restored guid, so
//!   later allocations cannot collide.

pub mod manager;

pub use manager::{GUID_BASE, GuidError, GuidManager, ObjectSnapshot};
