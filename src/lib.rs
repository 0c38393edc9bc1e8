//! Wrapforge - a SWIG extension-module build pipeline
//!
//! This crate turns a small manifest describing C++ units and a SWIG
//! interface into a dependency graph of generate, compile and link steps,
//! runs the stale ones, and validates the declarative logging config the
//! resulting module ships with.

pub mod builder;
pub mod core;
pub mod logconf;
pub mod ops;
pub mod util;

pub use builder::{BuildPlan, PipelineError};
pub use crate::core::{manifest::Manifest, workspace::Workspace};
pub use logconf::LoggingConfig;
