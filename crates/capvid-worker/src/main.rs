//! Captioned-video worker binary.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use capvid_media::CaptionFont;
use capvid_models::RenderSettings;
use capvid_queue::{JobQueue, QueueConfig};
use capvid_worker::{
    health, DeliveryClient, DeployClient, LifecycleController, PipelineContext, SourceClient,
    SourceConfig, WorkerConfig,
};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("capvid=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting capvid-worker");

    // Missing required settings are fatal before any job is touched.
    let config = match WorkerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let mut settings = RenderSettings::default();
    if let Some(font_path) = &config.font_path {
        settings.font_path = font_path.clone();
    }

    // Static assets are process-fatal too: no job can render without the
    // caption font.
    let font = match CaptionFont::load(&settings.font_path) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to load caption font: {}", e);
            std::process::exit(1);
        }
    };

    // Work directories
    for dir in [&config.download_dir, &config.output_dir] {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            error!("Failed to create directory {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    }

    // QUEUE_KEY keeps its default from the queue crate; the Redis URL is
    // the required one from the worker config.
    let queue_config = QueueConfig {
        redis_url: config.queue_redis_url.clone(),
        ..QueueConfig::from_env()
    };
    let queue = match JobQueue::new(queue_config) {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create job queue: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = match build_context(&config, font, settings) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Failed to build pipeline context: {}", e);
            std::process::exit(1);
        }
    };

    let deploy = match DeployClient::new(
        &config.deploy_api_url,
        &config.deploy_api_token,
        &config.deploy_service_id,
    ) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to create deploy client: {}", e);
            std::process::exit(1);
        }
    };

    // Liveness responder runs for the whole process lifetime.
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            error!("Liveness endpoint failed: {}", e);
        }
    });

    let controller =
        LifecycleController::new(queue, deploy, config.probe_window, config.drain_grace);

    match controller.run(&ctx).await {
        Ok(report) => {
            info!(
                decision = ?report.decision,
                jobs_processed = report.jobs_processed,
                "worker finished, exiting"
            );
        }
        Err(e) => {
            error!("Lifecycle error: {}", e);
            std::process::exit(1);
        }
    }
}

fn build_context(
    config: &WorkerConfig,
    font: CaptionFont,
    settings: RenderSettings,
) -> capvid_worker::WorkerResult<PipelineContext> {
    Ok(PipelineContext {
        source: SourceClient::new(SourceConfig::new(
            &config.source_api_base,
            &config.source_api_token,
        ))?,
        delivery: DeliveryClient::new(&config.delivery_url)?,
        font,
        settings,
        download_dir: config.download_dir.clone(),
        output_dir: config.output_dir.clone(),
    })
}
