//! Integration tests for the worker's HTTP collaborators, backed by a
//! local mock server.

use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use capvid_worker::{DeliveryClient, DeployClient, SourceClient, SourceConfig, WorkerError};

#[tokio::test]
async fn source_acquire_resolves_then_streams() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "path": "photos/pic.jpg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/content/photos/pic.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = SourceClient::new(SourceConfig::new(server.uri(), "token")).unwrap();

    let saved = client.acquire("abc-123", "job-7", dir.path()).await.unwrap();

    assert_eq!(saved.file_name().unwrap(), "job-7.jpg");
    assert_eq!(tokio::fs::read(&saved).await.unwrap(), b"jpeg-bytes");
}

#[tokio::test]
async fn source_acquire_maps_resolve_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = SourceClient::new(SourceConfig::new(server.uri(), "token")).unwrap();

    let err = client.acquire("missing", "job-8", dir.path()).await.unwrap_err();
    assert!(matches!(err, WorkerError::Acquire(_)));
}

#[tokio::test]
async fn delivery_submits_multipart_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("name=\"chat_id\""))
        .and(body_string_contains("name=\"image_data\""))
        .and(body_string_contains("name=\"messages_to_delete\""))
        .and(body_string_contains("final_video.mp4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let video = dir.path().join("output_j.mp4");
    let frame = dir.path().join("frame_j.jpg");
    tokio::fs::write(&video, b"video-bytes").await.unwrap();
    tokio::fs::write(&frame, b"frame-bytes").await.unwrap();

    let client = DeliveryClient::new(server.uri()).unwrap();
    client.submit(42, &video, &frame, &[11, 12]).await.unwrap();
}

#[tokio::test]
async fn delivery_maps_non_success_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let video = dir.path().join("v.mp4");
    let frame = dir.path().join("f.jpg");
    tokio::fs::write(&video, b"v").await.unwrap();
    tokio::fs::write(&frame, b"f").await.unwrap();

    let client = DeliveryClient::new(server.uri()).unwrap();
    let err = client.submit(1, &video, &frame, &[]).await.unwrap_err();
    assert!(matches!(err, WorkerError::Delivery(_)));
}

#[tokio::test]
async fn deploy_stop_runs_query_then_mutation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("latestDeployment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "service": {
                    "deployments": {
                        "edges": [{ "node": { "id": "dep-123" } }]
                    }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("deploymentStop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "deploymentStop": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeployClient::new(server.uri(), "token", "svc-1").unwrap();
    let deployment_id = client.try_stop().await.unwrap();
    assert_eq!(deployment_id, "dep-123");
}

#[tokio::test]
async fn deploy_stop_is_best_effort() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = DeployClient::new(server.uri(), "token", "svc-1").unwrap();
    assert!(client.try_stop().await.is_err());

    // The public entry point swallows the failure.
    client.stop_deployment().await;
}
