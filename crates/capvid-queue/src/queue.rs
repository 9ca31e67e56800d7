//! Job queue backed by a Redis list.
//!
//! The fetch is a plain `RPOP`: at most one pending job per call, or an
//! explicit empty signal. A fetched job is consumed immediately; there
//! are no acknowledgment or visibility-timeout semantics.

use redis::AsyncCommands;
use tracing::{debug, info};

use capvid_models::Job;

use crate::error::{QueueError, QueueResult};

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// List key holding pending jobs
    pub queue_key: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            queue_key: "capvid:jobs".to_string(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("QUEUE_REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            queue_key: std::env::var("QUEUE_KEY").unwrap_or_else(|_| "capvid:jobs".to_string()),
        }
    }
}

/// Job queue client.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Pop one pending job, or `None` when the queue is empty.
    pub async fn fetch(&self) -> QueueResult<Option<Job>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload: Option<String> = conn.rpop(&self.config.queue_key, None).await?;
        match payload {
            Some(payload) => {
                let job: Job = serde_json::from_str(&payload)?;
                info!(job_id = %job.job_id, "fetched job from queue");
                Ok(Some(job))
            }
            None => {
                debug!("job queue is empty");
                Ok(None)
            }
        }
    }

    /// Push a job onto the queue (producer side and tests).
    pub async fn push(&self, job: &Job) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(job)?;
        conn.lpush::<_, _, ()>(&self.config.queue_key, payload).await?;
        debug!(job_id = %job.job_id, "enqueued job");
        Ok(())
    }

    /// Number of pending jobs.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.llen(&self.config.queue_key).await?;
        Ok(len)
    }
}
