//! Shared leaf types used across the modsave workspace.

pub mod types;

pub use types::{Guid, Transform};
