//! Request and response types for the v1 generation endpoints

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stable_image::{FinishReason, StylePreset, check_range, check_seed};

/// A weighted prompt fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPrompt {
    /// Prompt text
    pub text: String,
    /// Relative weight; negative values steer the model away
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

impl TextPrompt {
    /// Create an unweighted prompt fragment
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: None,
        }
    }

    /// Create a weighted prompt fragment
    pub fn weighted(text: impl Into<String>, weight: f32) -> Self {
        Self {
            text: text.into(),
            weight: Some(weight),
        }
    }
}

/// Request body for v1 text-to-image
#[derive(Debug, Clone, Serialize)]
pub struct TextToImageRequest {
    /// Prompt fragments
    pub text_prompts: Vec<TextPrompt>,
    /// How strictly the model adheres to the prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfg_scale: Option<f32>,
    /// Output height in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Output width in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Number of images to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<u32>,
    /// Seed for reproducibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Diffusion steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    /// Style preset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_preset: Option<StylePreset>,
}

impl TextToImageRequest {
    /// Create a request with a single unweighted prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            text_prompts: vec![TextPrompt::new(prompt)],
            cfg_scale: None,
            height: None,
            width: None,
            samples: None,
            seed: None,
            steps: None,
            style_preset: None,
        }
    }

    /// Add a prompt fragment
    pub fn with_prompt(mut self, prompt: TextPrompt) -> Self {
        self.text_prompts.push(prompt);
        self
    }

    /// Set the cfg scale
    pub fn with_cfg_scale(mut self, cfg_scale: f32) -> Self {
        self.cfg_scale = Some(cfg_scale);
        self
    }

    /// Set the output dimensions
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the sample count
    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the step count
    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Set the style preset
    pub fn with_style_preset(mut self, preset: StylePreset) -> Self {
        self.style_preset = Some(preset);
        self
    }

    /// Check the request against the API's accepted ranges.
    pub fn validate(&self) -> Result<()> {
        if self.text_prompts.is_empty() || self.text_prompts.iter().all(|p| p.text.is_empty()) {
            return Err(Error::Validation(
                "at least one non-empty text prompt is required".to_string(),
            ));
        }
        if let Some(cfg_scale) = self.cfg_scale {
            check_range("cfg_scale", cfg_scale, 1.0, 10.0)?;
        }
        if let Some(seed) = self.seed {
            check_seed(seed)?;
        }
        Ok(())
    }
}

/// One generated image from a v1 response
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    /// Base64-encoded image
    pub base64: String,
    /// Generation outcome
    #[serde(rename = "finishReason")]
    pub finish_reason: FinishReason,
    /// Seed the image was generated with
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Artifact {
    /// Decode the base64 payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.base64.as_bytes())
            .map_err(|e| Error::Decode(format!("invalid base64 artifact: {e}")))
    }
}

/// Response body for v1 text-to-image
#[derive(Debug, Deserialize)]
pub(crate) struct TextToImageResponse {
    pub artifacts: Vec<Artifact>,
}
