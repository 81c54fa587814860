use anyhow::{Context, Result};
use shared::{ServerError, WorkAssignment, WorkRequest, WorkResult, PROTOCOL_VERSION};
use sim::StoreConfig;
use std::time::Duration;
use uuid::Uuid;

pub struct Client {
    client_id: Uuid,
    server_url: String,
    http_client: reqwest::Client,
}

impl Client {
    pub fn new(server_url: &str) -> Self {
        let client_id = Uuid::new_v4();

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        Self {
            client_id,
            server_url: server_url.to_string(),
            http_client,
        }
    }

    /// Request work from the server
    pub async fn request_work(&self) -> Result<WorkAssignment> {
        let url = format!("{}/api/work/request", self.server_url);
        let request = WorkRequest::new(self.client_id, PROTOCOL_VERSION);

        tracing::debug!("Requesting work from server");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send work request")?;

        if !response.status().is_success() {
            let status = response.status();
            if let Ok(error) = response.json::<ServerError>().await {
                match error {
                    ServerError::VersionMismatch {
                        server_version,
                        client_version,
                    } => {
                        tracing::error!(
                            "Version mismatch! Server version: {}, Client version: {}",
                            server_version,
                            client_version
                        );
                        anyhow::bail!("Version mismatch - please update client");
                    }
                    ServerError::ServerOverloaded => {
                        tracing::warn!("Server is overloaded, will retry");
                        anyhow::bail!("Server overloaded");
                    }
                    ServerError::InvalidRequest(msg) => {
                        anyhow::bail!("Invalid request: {}", msg);
                    }
                    ServerError::InternalError(msg) => {
                        anyhow::bail!("Server error: {}", msg);
                    }
                }
            }
            anyhow::bail!("Request failed with status: {}", status);
        }

        let assignment = response
            .json()
            .await
            .context("Failed to parse work assignment")?;

        Ok(assignment)
    }

    /// Submit work results to the server
    pub async fn submit_results(&self, result: WorkResult) -> Result<()> {
        let url = format!("{}/api/work/submit", self.server_url);

        tracing::debug!("Submitting work results");

        let response = self
            .http_client
            .post(&url)
            .json(&result)
            .send()
            .await
            .context("Failed to send work results")?;

        if !response.status().is_success() {
            anyhow::bail!("Submit failed with status: {}", response.status());
        }

        Ok(())
    }

    /// Evaluate the assigned layout with the assignment's seed. The seed and
    /// dimensions come from the server, so the score is reproducible by any
    /// other client given the same assignment.
    pub fn process_work(&self, assignment: WorkAssignment) -> Result<WorkResult> {
        tracing::info!(
            "Processing work {}: {} shelves, {} customers, {}x{} floor",
            assignment.work_id,
            assignment.layout.len(),
            assignment.customer_quota,
            assignment.width,
            assignment.height
        );

        let config = StoreConfig {
            width: assignment.width,
            height: assignment.height,
            capacity: assignment.capacity,
            customer_quota: assignment.customer_quota,
            ..StoreConfig::default()
        };

        let stats = sim::run_evaluation(
            &assignment.layout,
            &config,
            assignment.seed,
            assignment.max_ticks,
        )
        .context("Assigned layout failed to replay")?;

        Ok(WorkResult {
            work_id: assignment.work_id,
            client_id: self.client_id,
            layout: assignment.layout,
            stats,
        })
    }
}

/// Main client loop
pub async fn run(server_url: &str) -> Result<()> {
    let client = Client::new(server_url);

    tracing::info!("Client ID: {}", client.client_id);

    loop {
        let assignment = match client.request_work().await {
            Ok(a) => a,
            Err(e) => {
                if e.to_string().contains("Version mismatch") {
                    tracing::error!("Version mismatch detected - exiting");
                    std::process::exit(1);
                }

                tracing::error!("Failed to request work: {}", e);
                tokio::time::sleep(Duration::from_secs(10)).await;
                continue;
            }
        };

        let result = match client.process_work(assignment) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Failed to process work: {}", e);
                continue;
            }
        };

        if let Err(e) = client.submit_results(result).await {
            tracing::error!("Failed to submit results: {}", e);
            tokio::time::sleep(Duration::from_secs(5)).await;
            continue;
        }

        tracing::info!("Work completed successfully");
    }
}
