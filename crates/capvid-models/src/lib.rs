//! Shared data models for the capvid backend.
//!
//! This crate provides:
//! - The queued job payload and media kind
//! - Probed media metrics
//! - The immutable render settings threaded through the pipeline

pub mod job;
pub mod metrics;
pub mod settings;

pub use job::{Job, MediaKind};
pub use metrics::MediaMetrics;
pub use settings::RenderSettings;
