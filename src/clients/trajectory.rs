// src/clients/trajectory.rs
// Optional ML trajectory predictions client with periodic health polling.
// Grounded in `state.rs`'s `Option<Arc<...>>`-style optional dependency
// wiring plus `tasks/mod.rs`'s periodic background task pattern.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::TrajectoryClientConfig;
use crate::error::{SearchError, SearchResult};
use crate::models::MlTrajectoryBlock;

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    candidate_id: &'a str,
    title_sequence: &'a [String],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    direction: String,
    velocity: String,
    trajectory_type: String,
    fit_score: f32,
}

pub struct TrajectoryClient {
    http: reqwest::Client,
    config: TrajectoryClientConfig,
    available: Arc<AtomicBool>,
}

impl TrajectoryClient {
    pub fn new(config: TrajectoryClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("trajectory http client builds");
        Self {
            http,
            config,
            available: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_available(&self) -> bool {
        self.config.enabled && self.available.load(Ordering::SeqCst)
    }

    /// Spawns the ~30s health-poll loop. The handle is intentionally
    /// detached; it runs for the lifetime of the process, same as the
    /// teacher's background task pattern.
    pub fn spawn_health_poll(self: &Arc<Self>) {
        if !self.config.enabled {
            return;
        }
        let client = self.clone();
        tokio::spawn(async move {
            let interval = Duration::from_secs(client.config.poll_interval_secs);
            loop {
                let healthy = client
                    .http
                    .get(format!("{}/health", client.config.url))
                    .send()
                    .await
                    .map(|r| r.status().is_success())
                    .unwrap_or(false);
                client.available.store(healthy, Ordering::SeqCst);
                if !healthy {
                    warn!("ML trajectory service health check failed");
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    /// Never fails the search: callers should simply omit the trajectory
    /// block when this returns `Err`.
    pub async fn predict(
        &self,
        candidate_id: &str,
        title_sequence: &[String],
    ) -> SearchResult<MlTrajectoryBlock> {
        if !self.is_available() {
            return Err(SearchError::dependency_unready("trajectory client unavailable"));
        }

        let resp = self
            .http
            .post(format!("{}/predict", self.config.url))
            .json(&PredictRequest { candidate_id, title_sequence })
            .send()
            .await
            .map_err(SearchError::from)?;

        if !resp.status().is_success() {
            return Err(SearchError::transient(format!("trajectory status {}", resp.status())));
        }

        let body: PredictResponse = resp.json().await.map_err(SearchError::from)?;
        Ok(MlTrajectoryBlock {
            direction: body.direction,
            velocity: body.velocity,
            trajectory_type: body.trajectory_type,
            fit_score: body.fit_score,
        })
    }
}
