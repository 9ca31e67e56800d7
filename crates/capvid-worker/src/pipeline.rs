//! Job pipeline.
//!
//! One job runs through a linear sequence with no back-edges:
//! Acquire → Probe → RenderCaption → Plan&Encode → ExtractFrame → Deliver,
//! then Cleanup, which always runs. A stage failure short-circuits the
//! rest, ends the job, and never retries.

use std::path::PathBuf;

use tracing::{error, info, warn};

use capvid_media::{caption, compose, frame, probe, CaptionFont};
use capvid_models::{Job, RenderSettings};

use crate::delivery::DeliveryClient;
use crate::error::WorkerResult;
use crate::source::SourceClient;

/// Maximum characters of error detail kept in the job-failure log line.
const ERROR_DETAIL_CHARS: usize = 1000;

/// Every filesystem path created while processing one job.
///
/// Each recorded path is removed exactly once on every exit path of the
/// pipeline; a missing or already-removed file is not an error.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    paths: Vec<PathBuf>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path for end-of-job removal.
    pub fn add(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove every recorded path. Deletion errors are logged, never
    /// escalated.
    pub async fn cleanup(&mut self) {
        for path in self.paths.drain(..) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!(path = %path.display(), "cleaned up file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "failed to delete file: {}", e),
            }
        }
    }
}

/// Shared collaborators and settings for processing jobs.
pub struct PipelineContext {
    pub source: SourceClient,
    pub delivery: DeliveryClient,
    pub font: CaptionFont,
    pub settings: RenderSettings,
    pub download_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Process one job end to end. The terminal error, if any, is logged here
/// with the job id and truncated detail; the caller moves on to the next
/// queued job either way.
pub async fn process_job(ctx: &PipelineContext, job: &Job) -> WorkerResult<()> {
    info!(job_id = %job.job_id, media = %job.media_type, "starting job");

    let mut artifacts = ArtifactSet::new();
    let result = run_stages(ctx, job, &mut artifacts).await;

    if let Err(e) = &result {
        let detail = e.to_string();
        error!(
            job_id = %job.job_id,
            "job failed: {}",
            tail(&detail, ERROR_DETAIL_CHARS)
        );
    }

    artifacts.cleanup().await;
    result
}

async fn run_stages(
    ctx: &PipelineContext,
    job: &Job,
    artifacts: &mut ArtifactSet,
) -> WorkerResult<()> {
    // Acquire
    let media_path = ctx
        .source
        .acquire(&job.file_id, &job.job_id, &ctx.download_dir)
        .await?;
    artifacts.add(media_path.clone());

    // Probe
    let metrics = probe::probe(&media_path, job.media_type, &ctx.settings).await?;

    // RenderCaption
    let caption = caption::render(
        &job.caption_text,
        &job.job_id,
        &ctx.output_dir,
        &ctx.font,
        &ctx.settings,
    )?;
    artifacts.add(caption.path.clone());

    // Plan & Encode
    let plan = compose::plan(job, metrics, &ctx.settings);
    let clip_path = compose::execute(
        &plan,
        &media_path,
        &caption.path,
        &ctx.output_dir,
        &job.job_id,
    )
    .await?;
    artifacts.add(clip_path.clone());

    // ExtractFrame
    let frame_path = frame::extract(
        &clip_path,
        metrics.duration,
        &job.job_id,
        &ctx.output_dir,
        &ctx.settings,
    )
    .await?;
    artifacts.add(frame_path.clone());

    // Deliver
    ctx.delivery
        .submit(job.chat_id, &clip_path, &frame_path, &job.messages_to_delete)
        .await?;

    info!(job_id = %job.job_id, "job completed");
    Ok(())
}

/// Last `max_chars` characters of `s`, split on a char boundary.
pub fn tail(s: &str, max_chars: usize) -> &str {
    match s.char_indices().rev().nth(max_chars.saturating_sub(1)) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
