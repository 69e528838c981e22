//! Stable Image endpoint family (v2beta)
//!
//! Multipart endpoints for generation, editing, and upscaling. All of them
//! return either raw image bytes or a JSON envelope, selected per call via
//! [`ResponseFormat`].

mod edit;
mod generate;
mod types;
mod upscale;

pub use edit::RemoveBackgroundRequest;
pub use generate::{CoreGenerateRequest, Sd3GenerateRequest, UltraGenerateRequest};
pub use types::{
    AspectRatio, FinishReason, ImageArtifact, ImageResult, OutputFormat, ResponseFormat, SEED_MAX,
    Sd3Model, StylePreset,
};
pub use upscale::UpscaleRequest;

pub(crate) use types::{check_range, check_seed};
