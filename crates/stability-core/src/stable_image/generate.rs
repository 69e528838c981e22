//! Stable Image generation endpoints (v2beta, multipart)
//!
//! Three endpoint tiers share one request style: every set scalar field
//! becomes a multipart text part carrying its wire token, and the optional
//! source image becomes the single `image` file part. Requests validate
//! before anything touches the network.

use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::client::StabilityClient;
use crate::error::{Error, Result};

use super::types::{
    AspectRatio, ImageResult, OutputFormat, ResponseFormat, Sd3Model, StylePreset, check_range,
    check_seed,
};

/// Request for the `core` generation endpoint
#[derive(Debug, Clone, Default)]
pub struct CoreGenerateRequest {
    /// What to generate
    pub prompt: String,
    /// What to keep out of the image
    pub negative_prompt: Option<String>,
    /// Output aspect ratio
    pub aspect_ratio: Option<AspectRatio>,
    /// Seed for reproducibility; omit for a random one
    pub seed: Option<u64>,
    /// Style preset
    pub style_preset: Option<StylePreset>,
    /// Encoded output format
    pub output_format: Option<OutputFormat>,
}

impl CoreGenerateRequest {
    /// Create a request with the given prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the negative prompt
    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    /// Set the aspect ratio
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the style preset
    pub fn with_style_preset(mut self, preset: StylePreset) -> Self {
        self.style_preset = Some(preset);
        self
    }

    /// Set the output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Check the request against the API's accepted ranges.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.is_empty() {
            return Err(Error::Validation("prompt must not be empty".to_string()));
        }
        if let Some(seed) = self.seed {
            check_seed(seed)?;
        }
        Ok(())
    }

    pub(crate) fn to_form(&self) -> Form {
        let mut form = Form::new().text("prompt", self.prompt.clone());
        if let Some(negative) = &self.negative_prompt {
            form = form.text("negative_prompt", negative.clone());
        }
        if let Some(ratio) = self.aspect_ratio {
            form = form.text("aspect_ratio", ratio.as_str());
        }
        if let Some(seed) = self.seed {
            form = form.text("seed", seed.to_string());
        }
        if let Some(preset) = self.style_preset {
            form = form.text("style_preset", preset.as_str());
        }
        if let Some(format) = self.output_format {
            form = form.text("output_format", format.as_str());
        }
        form
    }
}

/// Request for the `sd3` generation endpoint
///
/// Supports both text-to-image and image-to-image; the latter requires the
/// source image and a strength together.
#[derive(Debug, Clone, Default)]
pub struct Sd3GenerateRequest {
    /// What to generate
    pub prompt: String,
    /// What to keep out of the image
    pub negative_prompt: Option<String>,
    /// Model variant; the server default applies when unset
    pub model: Option<Sd3Model>,
    /// Output aspect ratio (text-to-image only)
    pub aspect_ratio: Option<AspectRatio>,
    /// Seed for reproducibility
    pub seed: Option<u64>,
    /// How strictly the model adheres to the prompt
    pub cfg_scale: Option<f32>,
    /// Source image for image-to-image
    pub image: Option<Vec<u8>>,
    /// How much the source image is altered, 0 keeps it, 1 replaces it
    pub strength: Option<f32>,
    /// Encoded output format
    pub output_format: Option<OutputFormat>,
}

impl Sd3GenerateRequest {
    /// Create a request with the given prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the negative prompt
    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    /// Set the model variant
    pub fn with_model(mut self, model: Sd3Model) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the aspect ratio
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the cfg scale
    pub fn with_cfg_scale(mut self, cfg_scale: f32) -> Self {
        self.cfg_scale = Some(cfg_scale);
        self
    }

    /// Set the source image for image-to-image
    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    /// Set the image-to-image strength
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Set the output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Check the request against the API's accepted ranges and the
    /// image/strength pairing rule.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.is_empty() {
            return Err(Error::Validation("prompt must not be empty".to_string()));
        }
        if let Some(seed) = self.seed {
            check_seed(seed)?;
        }
        if let Some(cfg_scale) = self.cfg_scale {
            check_range("cfg_scale", cfg_scale, 1.0, 10.0)?;
        }
        match (&self.image, self.strength) {
            (Some(_), None) => {
                return Err(Error::Validation(
                    "strength is required when image is supplied".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(Error::Validation(
                    "image is required when strength is supplied".to_string(),
                ));
            }
            _ => {}
        }
        if let Some(strength) = self.strength {
            check_range("strength", strength, 0.0, 1.0)?;
        }
        Ok(())
    }

    pub(crate) fn to_form(&self) -> Form {
        // Mode is derived from the presence of a source image, not supplied
        // by the caller.
        let mode = if self.image.is_some() {
            "image-to-image"
        } else {
            "text-to-image"
        };

        let mut form = Form::new()
            .text("prompt", self.prompt.clone())
            .text("mode", mode);
        if let Some(negative) = &self.negative_prompt {
            form = form.text("negative_prompt", negative.clone());
        }
        if let Some(model) = self.model {
            form = form.text("model", model.as_str());
        }
        if self.image.is_none() {
            if let Some(ratio) = self.aspect_ratio {
                form = form.text("aspect_ratio", ratio.as_str());
            }
        }
        if let Some(seed) = self.seed {
            form = form.text("seed", seed.to_string());
        }
        if let Some(cfg_scale) = self.cfg_scale {
            form = form.text("cfg_scale", cfg_scale.to_string());
        }
        if let Some(image) = &self.image {
            form = form.part("image", Part::bytes(image.clone()).file_name("image"));
        }
        if let Some(strength) = self.strength {
            form = form.text("strength", strength.to_string());
        }
        if let Some(format) = self.output_format {
            form = form.text("output_format", format.as_str());
        }
        form
    }
}

/// Request for the `ultra` generation endpoint
#[derive(Debug, Clone, Default)]
pub struct UltraGenerateRequest {
    /// What to generate
    pub prompt: String,
    /// What to keep out of the image
    pub negative_prompt: Option<String>,
    /// Output aspect ratio
    pub aspect_ratio: Option<AspectRatio>,
    /// Seed for reproducibility
    pub seed: Option<u64>,
    /// Encoded output format
    pub output_format: Option<OutputFormat>,
}

impl UltraGenerateRequest {
    /// Create a request with the given prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the negative prompt
    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    /// Set the aspect ratio
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Check the request against the API's accepted ranges.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.is_empty() {
            return Err(Error::Validation("prompt must not be empty".to_string()));
        }
        if let Some(seed) = self.seed {
            check_seed(seed)?;
        }
        Ok(())
    }

    pub(crate) fn to_form(&self) -> Form {
        let mut form = Form::new().text("prompt", self.prompt.clone());
        if let Some(negative) = &self.negative_prompt {
            form = form.text("negative_prompt", negative.clone());
        }
        if let Some(ratio) = self.aspect_ratio {
            form = form.text("aspect_ratio", ratio.as_str());
        }
        if let Some(seed) = self.seed {
            form = form.text("seed", seed.to_string());
        }
        if let Some(format) = self.output_format {
            form = form.text("output_format", format.as_str());
        }
        form
    }
}

impl StabilityClient {
    /// Generate an image with the core model.
    pub async fn generate_core(
        &self,
        request: &CoreGenerateRequest,
        format: ResponseFormat,
    ) -> Result<ImageResult> {
        request.validate()?;
        info!(prompt = %request.prompt, "Generating image (core)");
        self.send_image_request("/v2beta/stable-image/generate/core", request.to_form(), format)
            .await
    }

    /// Generate an image with a Stable Diffusion 3.5 model, from text or
    /// from a source image.
    pub async fn generate_sd3(
        &self,
        request: &Sd3GenerateRequest,
        format: ResponseFormat,
    ) -> Result<ImageResult> {
        request.validate()?;
        info!(
            prompt = %request.prompt,
            image_to_image = request.image.is_some(),
            "Generating image (sd3)"
        );
        self.send_image_request("/v2beta/stable-image/generate/sd3", request.to_form(), format)
            .await
    }

    /// Generate an image with the ultra model.
    pub async fn generate_ultra(
        &self,
        request: &UltraGenerateRequest,
        format: ResponseFormat,
    ) -> Result<ImageResult> {
        request.validate()?;
        info!(prompt = %request.prompt, "Generating image (ultra)");
        self.send_image_request("/v2beta/stable-image/generate/ultra", request.to_form(), format)
            .await
    }
}
