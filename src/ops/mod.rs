//! High-level operations.
//!
//! This module contains the implementation of Wrapforge commands.

pub mod wrapforge_build;
pub mod wrapforge_clean;
pub mod wrapforge_init;
pub mod wrapforge_logconf;

pub use wrapforge_build::{build, smart, BuildOptions};
pub use wrapforge_clean::{clean, CleanScope};
pub use wrapforge_init::{init_project, InitOptions};
