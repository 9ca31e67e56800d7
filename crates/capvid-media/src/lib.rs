#![deny(unreachable_patterns)]
//! Media processing for the capvid worker.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with a hard timeout
//! - Source-media probing (image intrinsics, ffprobe for video)
//! - Caption rasterization with a soft drop shadow
//! - A typed filter-graph IR and the composition engine
//! - Representative-frame extraction

pub mod caption;
pub mod command;
pub mod compose;
pub mod error;
pub mod frame;
pub mod graph;
pub mod probe;
pub mod wrap;

pub use caption::{render as render_caption, CaptionArtifact, CaptionFont};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegInput, FfmpegRunner};
pub use compose::{build_command, execute as execute_composition, filter_graph, plan, CompositionPlan};
pub use error::{MediaError, MediaResult};
pub use frame::extract as extract_frame;
pub use graph::{FilterChain, FilterGraph, FilterOp, OverlayPos};
pub use probe::probe;
pub use wrap::wrap_text;
