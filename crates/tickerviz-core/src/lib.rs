//! tickerviz core — pipeline orchestration
//!
//! Turns a free-text financial-data query into a verified, executable
//! visualization artifact through three strictly sequential stages:
//!
//! 1. [`QueryInterpreter`]: query text -> validated [`QuerySpec`]
//! 2. [`CodeSynthesizer`]: spec (+ prior errors) -> draft [`Artifact`]
//! 3. [`Executor`]: sandboxed execution with a bounded repair loop
//!
//! # Example
//!
//! ```rust,ignore
//! use tickerviz_core::{Pipeline, PipelineConfig};
//! use tickerviz_inference::OllamaBackend;
//! use tickerviz_sandbox::SubprocessSandbox;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new();
//! let backend = OllamaBackend::new(
//!     "http://127.0.0.1:11434",
//!     "llama3.1",
//!     config.backend_timeout(),
//! )?;
//! let sandbox = SubprocessSandbox::new("python3", config.sandbox_time_limit());
//!
//! let pipeline = Pipeline::new(backend, sandbox, config);
//! let artifact = pipeline.run("Plot YTD stock gain of Google").await?;
//! println!("{}", artifact.code);
//! # Ok(())
//! # }
//! ```
//!
//! [`QuerySpec`]: tickerviz_artifact::QuerySpec
//! [`Artifact`]: tickerviz_artifact::Artifact

#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod interpreter;
pub mod pipeline;
pub mod synthesizer;

// Re-exports for convenience
pub use config::PipelineConfig;
pub use context::{PipelineContext, RunId};
pub use error::PipelineError;
pub use executor::{allowed_transitions, ExecState, Executor};
pub use interpreter::QueryInterpreter;
pub use pipeline::Pipeline;
pub use synthesizer::CodeSynthesizer;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the tickerviz pipeline
    pub use crate::{
        CodeSynthesizer, ExecState, Executor, Pipeline, PipelineConfig, PipelineContext,
        PipelineError, QueryInterpreter, RunId,
    };
    pub use tickerviz_artifact::{Action, Artifact, ArtifactStatus, QuerySpec};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
