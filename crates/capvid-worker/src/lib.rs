//! Captioned-video render worker.
//!
//! This crate provides:
//! - Environment-driven configuration with fatal startup checks
//! - HTTP collaborators: source acquisition, result delivery, deployment
//!   control
//! - The job pipeline with its cleanup contract
//! - The one-shot lifecycle controller (drain or probe, then shut down)

pub mod config;
pub mod delivery;
pub mod deploy;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod pipeline;
pub mod source;

pub use config::WorkerConfig;
pub use delivery::DeliveryClient;
pub use deploy::DeployClient;
pub use error::{WorkerError, WorkerResult};
pub use lifecycle::{decide, LifecycleController, LifecycleDecision, LifecycleReport};
pub use pipeline::{process_job, ArtifactSet, PipelineContext};
pub use source::{SourceClient, SourceConfig};
