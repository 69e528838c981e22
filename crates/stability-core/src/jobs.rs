//! Polling for asynchronous generations
//!
//! The creative upscaler follows a submit-then-poll protocol: submission
//! answers immediately with a job id, and the result endpoint replies 202
//! while the generation is still running. The wait loop here issues one
//! request at a time, sleeps a fixed interval between polls, and stops on
//! the first completed result, the first error, or the configured deadline.
//! Finished results are kept server-side for a fixed retention window; the
//! client does not enforce that window.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{StabilityClient, decode_image_body};
use crate::error::{Error, Result};
use crate::stable_image::{ImageResult, ResponseFormat};

/// Server-issued identifier for an asynchronous generation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap an identifier, e.g. one persisted by the caller
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a single poll
#[derive(Debug, Clone)]
pub enum JobStatus {
    /// The generation is still running; poll again later
    InProgress,
    /// The generation finished; the result matches the requested
    /// representation
    Complete(ImageResult),
}

/// Body of a 202 in-progress response
#[derive(Debug, Deserialize)]
struct PendingBody {
    id: String,
    status: String,
}

/// Polling cadence and cutoff
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed wait between polls
    pub interval: Duration,
    /// Give up after this much total waiting; `None` polls until the server
    /// answers
    pub deadline: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            deadline: None,
        }
    }
}

impl PollConfig {
    /// Config with the given interval and no deadline
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Set the deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl StabilityClient {
    /// Poll a creative-upscale job once.
    ///
    /// 202 is the reserved in-progress signal and is classified before the
    /// error branch; any status of 400 or above surfaces as a normalized
    /// error; anything else carries the finished image in the requested
    /// representation.
    pub async fn fetch_upscale_result(
        &self,
        id: &JobId,
        format: ResponseFormat,
    ) -> Result<JobStatus> {
        let path = format!("/v2beta/stable-image/upscale/creative/result/{id}");
        let response = self
            .get(&path)
            .header(ACCEPT, format.accept())
            .send()
            .await
            .map_err(Error::Network)?;

        if response.status() == StatusCode::ACCEPTED {
            let body = response.bytes().await.map_err(Error::Network)?;
            let pending: PendingBody = serde_json::from_slice(&body)
                .map_err(|e| Error::Decode(format!("in-progress response: {e}")))?;
            debug!(id = %pending.id, status = %pending.status, "Generation still in progress");
            return Ok(JobStatus::InProgress);
        }

        let response = Self::check_status(response).await?;
        let body = response.bytes().await.map_err(Error::Network)?;
        Ok(JobStatus::Complete(decode_image_body(format, body.to_vec())?))
    }

    /// Poll a creative-upscale job until it finishes.
    ///
    /// One outstanding request at a time; sleeps `poll.interval` between
    /// polls. Stops immediately on an HTTP error instead of retrying, and
    /// fails with [`Error::PollTimeout`] rather than sleeping past the
    /// deadline.
    pub async fn wait_for_upscale(
        &self,
        id: &JobId,
        format: ResponseFormat,
        poll: &PollConfig,
    ) -> Result<ImageResult> {
        let started = Instant::now();
        loop {
            match self.fetch_upscale_result(id, format).await? {
                JobStatus::Complete(result) => return Ok(result),
                JobStatus::InProgress => {
                    if let Some(deadline) = poll.deadline {
                        if started.elapsed() + poll.interval >= deadline {
                            return Err(Error::PollTimeout {
                                id: id.to_string(),
                                waited_secs: started.elapsed().as_secs(),
                            });
                        }
                    }
                    tokio::time::sleep(poll.interval).await;
                }
            }
        }
    }

    /// Submit an image to the creative upscaler and wait for the result.
    pub async fn upscale_creative_and_wait(
        &self,
        request: &crate::stable_image::UpscaleRequest,
        format: ResponseFormat,
        poll: &PollConfig,
    ) -> Result<ImageResult> {
        let id = self.upscale_creative(request).await?;
        debug!(%id, "Creative upscale accepted");
        self.wait_for_upscale(&id, format, poll).await
    }
}
