//! Deployment-control collaborator.
//!
//! Two GraphQL operations: resolve the service's latest deployment id,
//! then request that deployment's termination. Both are fire-and-forget
//! from the worker's perspective: failure to stop the host is logged,
//! never fatal to the worker's own exit.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::{WorkerError, WorkerResult};

const LATEST_DEPLOYMENT_QUERY: &str = r#"
    query latestDeployment($serviceId: String!) {
        service(id: $serviceId) {
            deployments(first: 1) {
                edges {
                    node { id }
                }
            }
        }
    }
"#;

const STOP_MUTATION: &str = r#"
    mutation deploymentStop($id: String!) {
        deploymentStop(id: $id)
    }
"#;

/// Client for the deployment-control API.
pub struct DeployClient {
    http: Client,
    api_url: String,
    token: String,
    service_id: String,
}

impl DeployClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        service_id: impl Into<String>,
    ) -> WorkerResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            token: token.into(),
            service_id: service_id.into(),
        })
    }

    /// Request host shutdown, best-effort.
    pub async fn stop_deployment(&self) {
        info!("requesting deployment stop");
        match self.try_stop().await {
            Ok(deployment_id) => {
                info!(deployment_id, "deployment stop requested");
            }
            Err(e) => {
                error!("failed to stop deployment: {}", e);
            }
        }
    }

    /// The fallible two-step stop, separated so tests can assert on it.
    pub async fn try_stop(&self) -> WorkerResult<String> {
        let deployment_id = self.latest_deployment_id().await?;
        self.post_graphql(STOP_MUTATION, json!({ "id": deployment_id }))
            .await?;
        Ok(deployment_id)
    }

    async fn latest_deployment_id(&self) -> WorkerResult<String> {
        let data = self
            .post_graphql(
                LATEST_DEPLOYMENT_QUERY,
                json!({ "serviceId": self.service_id }),
            )
            .await?;

        data.pointer("/data/service/deployments/edges/0/node/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                WorkerError::control("deployment id missing from control API response")
            })
    }

    async fn post_graphql(&self, query: &str, variables: Value) -> WorkerResult<Value> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::control(format!(
                "control API returned {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}
