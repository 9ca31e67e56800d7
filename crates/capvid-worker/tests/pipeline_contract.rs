//! End-to-end pipeline contract: a mid-pipeline failure ends the job,
//! removes everything it created, and never reaches delivery.

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use capvid_media::CaptionFont;
use capvid_models::{Job, MediaKind, RenderSettings};
use capvid_worker::{
    process_job, DeliveryClient, PipelineContext, SourceClient, SourceConfig, WorkerError,
};

fn fixture_font() -> CaptionFont {
    let path = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../capvid-media/tests/fixtures/DejaVuSansMono.ttf"
    );
    CaptionFont::load(path).unwrap()
}

#[tokio::test]
async fn probe_failure_cleans_up_download_and_skips_delivery() {
    let source_server = MockServer::start().await;
    let delivery_server = MockServer::start().await;

    // The source resolves and serves bytes that are not a decodable image,
    // so the job fails at the probe stage, after the download.
    Mock::given(method("GET"))
        .and(path("/files/img-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "path": "photos/broken.jpg"
        })))
        .mount(&source_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/photos/broken.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a jpeg".to_vec()))
        .mount(&source_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&delivery_server)
        .await;

    let download_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    let ctx = PipelineContext {
        source: SourceClient::new(SourceConfig::new(source_server.uri(), "token")).unwrap(),
        delivery: DeliveryClient::new(delivery_server.uri()).unwrap(),
        font: fixture_font(),
        settings: RenderSettings::default(),
        download_dir: download_dir.path().to_path_buf(),
        output_dir: output_dir.path().to_path_buf(),
    };

    let job = Job::new("job-px", 7, "img-1", MediaKind::Image, "a caption");
    let err = process_job(&ctx, &job).await.unwrap_err();
    assert!(matches!(err, WorkerError::Media(_)));

    // The downloaded source was the only artifact, and it is gone.
    assert!(!download_dir.path().join("job-px.jpg").exists());
    let mut outputs = tokio::fs::read_dir(output_dir.path()).await.unwrap();
    assert!(outputs.next_entry().await.unwrap().is_none());

    // Dropping the delivery server verifies it was never called.
}
