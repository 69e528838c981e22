//! Stable Image upscale endpoints (v2beta, multipart)
//!
//! Two distinct shapes: the conservative upscaler answers in one exchange,
//! while the creative upscaler returns a job id that must be polled (see
//! [`crate::jobs`]). Both stay visible in the public API rather than being
//! folded into one call.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::info;

use crate::client::StabilityClient;
use crate::error::{Error, Result};
use crate::jobs::JobId;

use super::types::{ImageResult, OutputFormat, ResponseFormat, check_range, check_seed};

/// Request for either upscale endpoint
///
/// Conservative and creative accept the same fields; only the response
/// protocol differs.
#[derive(Debug, Clone)]
pub struct UpscaleRequest {
    /// Encoded source image
    pub image: Vec<u8>,
    /// What the upscaled image should depict
    pub prompt: String,
    /// What to keep out of the image
    pub negative_prompt: Option<String>,
    /// Seed for reproducibility
    pub seed: Option<u64>,
    /// How much latitude the model has to invent detail
    pub creativity: Option<f32>,
    /// Encoded output format
    pub output_format: Option<OutputFormat>,
}

impl UpscaleRequest {
    /// Create a request for the given source image and prompt
    pub fn new(image: Vec<u8>, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
            negative_prompt: None,
            seed: None,
            creativity: None,
            output_format: None,
        }
    }

    /// Set the negative prompt
    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the creativity
    pub fn with_creativity(mut self, creativity: f32) -> Self {
        self.creativity = Some(creativity);
        self
    }

    /// Set the output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Check the request against the API's accepted ranges.
    pub fn validate(&self) -> Result<()> {
        if self.image.is_empty() {
            return Err(Error::Validation("image must not be empty".to_string()));
        }
        if self.prompt.is_empty() {
            return Err(Error::Validation("prompt must not be empty".to_string()));
        }
        if let Some(seed) = self.seed {
            check_seed(seed)?;
        }
        if let Some(creativity) = self.creativity {
            check_range("creativity", creativity, 0.0, 0.35)?;
        }
        Ok(())
    }

    pub(crate) fn to_form(&self) -> Form {
        let mut form = Form::new()
            .part("image", Part::bytes(self.image.clone()).file_name("image"))
            .text("prompt", self.prompt.clone());
        if let Some(negative) = &self.negative_prompt {
            form = form.text("negative_prompt", negative.clone());
        }
        if let Some(seed) = self.seed {
            form = form.text("seed", seed.to_string());
        }
        if let Some(creativity) = self.creativity {
            form = form.text("creativity", creativity.to_string());
        }
        if let Some(format) = self.output_format {
            form = form.text("output_format", format.as_str());
        }
        form
    }
}

/// Body returned when an asynchronous generation is accepted
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: JobId,
}

impl StabilityClient {
    /// Upscale an image with the conservative model.
    ///
    /// Synchronous: the response carries the finished image directly.
    pub async fn upscale_conservative(
        &self,
        request: &UpscaleRequest,
        format: ResponseFormat,
    ) -> Result<ImageResult> {
        request.validate()?;
        info!(prompt = %request.prompt, "Upscaling image (conservative)");
        self.send_image_request(
            "/v2beta/stable-image/upscale/conservative",
            request.to_form(),
            format,
        )
        .await
    }

    /// Submit an image to the creative upscaler.
    ///
    /// Asynchronous: the server accepts the job and answers with an id to
    /// poll via [`StabilityClient::fetch_upscale_result`] or
    /// [`StabilityClient::wait_for_upscale`].
    pub async fn upscale_creative(&self, request: &UpscaleRequest) -> Result<JobId> {
        request.validate()?;
        info!(prompt = %request.prompt, "Submitting image to creative upscaler");
        let response: SubmitResponse = self
            .send_json(
                self.post("/v2beta/stable-image/upscale/creative")
                    .multipart(request.to_form()),
            )
            .await?;
        Ok(response.id)
    }
}
