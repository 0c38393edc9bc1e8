//! Extension-module build pipeline.
//!
//! This module plans the generate/compile/link graph and drives the
//! external tools that execute it.

pub mod errors;
pub mod events;
pub mod executor;
pub mod freshness;
pub mod plan;
pub mod toolchain;

pub use errors::PipelineError;
pub use events::BuildEvent;
pub use executor::{BuildExecutor, BuildReport};
pub use plan::BuildPlan;
pub use toolchain::{CommandSpec, GccToolchain, Swig, Toolchain};
