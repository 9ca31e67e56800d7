//! Worker lifecycle controller.
//!
//! The outermost state machine: Init → {Draining, Probing} →
//! ShutdownRequested → Exited. The branch is chosen from exactly one
//! non-blocking initial queue fetch and never re-evaluated; a job arriving
//! during the probing window is left for the next process lifetime.

use std::time::Duration;

use tracing::{info, warn};

use capvid_models::Job;
use capvid_queue::JobQueue;

use crate::deploy::DeployClient;
use crate::error::WorkerResult;
use crate::pipeline::{process_job, PipelineContext};

/// The one-shot lifecycle branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleDecision {
    /// A job was queued: drain the queue, then shut down
    Drain,
    /// The queue was empty: answer liveness probes, then shut down
    Probe,
}

/// Choose the branch from the single initial fetch.
pub fn decide(first: Option<&Job>) -> LifecycleDecision {
    match first {
        Some(_) => LifecycleDecision::Drain,
        None => LifecycleDecision::Probe,
    }
}

/// What one process lifetime did, for logging and tests.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleReport {
    pub decision: LifecycleDecision,
    pub jobs_processed: usize,
}

/// The lifecycle controller.
pub struct LifecycleController {
    queue: JobQueue,
    deploy: DeployClient,
    probe_window: Duration,
    drain_grace: Duration,
}

impl LifecycleController {
    pub fn new(
        queue: JobQueue,
        deploy: DeployClient,
        probe_window: Duration,
        drain_grace: Duration,
    ) -> Self {
        Self {
            queue,
            deploy,
            probe_window,
            drain_grace,
        }
    }

    /// Run one process lifetime: decide, drain or probe, request shutdown.
    pub async fn run(&self, ctx: &PipelineContext) -> WorkerResult<LifecycleReport> {
        // A queue failure here means no job could have been fetched; the
        // process behaves as a probe and shuts down, like an empty queue.
        let first = match self.queue.fetch().await {
            Ok(first) => first,
            Err(e) => {
                warn!("initial queue fetch failed, treating queue as empty: {}", e);
                None
            }
        };

        let decision = decide(first.as_ref());
        info!(?decision, "lifecycle decision made");

        let report = match first {
            Some(job) => self.drain(ctx, job).await,
            None => self.probe().await,
        };

        // Fire-and-forget: failure to stop the host never blocks our exit.
        self.deploy.stop_deployment().await;

        Ok(report)
    }

    /// Process the first job, then fetch-and-process until the queue
    /// reports empty.
    async fn drain(&self, ctx: &PipelineContext, first: Job) -> LifecycleReport {
        info!("job found in queue, draining");

        let mut jobs_processed = 0usize;
        let mut current = Some(first);

        while let Some(job) = current {
            // A failed job is already logged by the pipeline; draining
            // continues with the next queued job.
            let _ = process_job(ctx, &job).await;
            jobs_processed += 1;

            current = match self.queue.fetch().await {
                Ok(next) => next,
                Err(e) => {
                    warn!("queue fetch failed mid-drain, stopping: {}", e);
                    None
                }
            };
        }

        info!(jobs_processed, "queue drained");
        if !self.drain_grace.is_zero() {
            tokio::time::sleep(self.drain_grace).await;
        }

        LifecycleReport {
            decision: LifecycleDecision::Drain,
            jobs_processed,
        }
    }

    /// Stay available for liveness checks, then shut down. The responder
    /// itself runs for the whole process; this only holds the window open.
    async fn probe(&self) -> LifecycleReport {
        info!(
            window_secs = self.probe_window.as_secs(),
            "no job queued, holding liveness window before shutdown"
        );
        tokio::time::sleep(self.probe_window).await;

        LifecycleReport {
            decision: LifecycleDecision::Probe,
            jobs_processed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capvid_models::MediaKind;

    #[test]
    fn test_decide_is_exclusive() {
        let job = Job::new("j1", 1, "f", MediaKind::Image, "c");
        assert_eq!(decide(Some(&job)), LifecycleDecision::Drain);
        assert_eq!(decide(None), LifecycleDecision::Probe);
    }
}
