//! Core data structures for Wrapforge.
//!
//! - The `Wrapforge.toml` manifest and its naming rules
//! - Workspace discovery and local tool overrides

pub mod manifest;
pub mod workspace;

pub use manifest::{Manifest, MANIFEST_NAME};
pub use workspace::{find_manifest, Workspace};
