//! Data model for the tickerviz pipeline
//!
//! Defines the two values that flow through a pipeline run:
//! - [`QuerySpec`]: validated structured intent extracted from a free-text query
//! - [`Artifact`]: a generated source-code candidate plus its execution
//!   status and diagnostic history
//!
//! Both are created once per run and discarded when the run ends; nothing in
//! this crate persists state or is shared across runs.

pub mod artifact;
pub mod spec;

pub use artifact::{Artifact, ArtifactStatus};
pub use spec::{Action, QuerySpec, SpecError, TIMEFRAMES};
