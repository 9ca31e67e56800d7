//! Liveness endpoint.
//!
//! A minimal HTTP responder serving a fixed 200 on `/` and `/healthz`.
//! Started before the lifecycle decision and left running for the whole
//! process lifetime so health checks are answered throughout.

use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::error::WorkerResult;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Liveness handler.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Build the liveness router.
pub fn router() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/healthz", get(health))
}

/// Bind and serve the liveness endpoint until the process exits.
pub async fn serve(port: u16) -> WorkerResult<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "liveness endpoint listening");
    axum::serve(listener, router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_responds_200() {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router()).await.unwrap();
        });

        let body: serde_json::Value = reqwest::get(format!("http://{}/healthz", addr))
            .await
            .unwrap()
            .error_for_status()
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "healthy");

        let root = reqwest::get(format!("http://{}/", addr)).await.unwrap();
        assert!(root.status().is_success());
    }
}
