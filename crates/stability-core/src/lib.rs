//! Stability Core Library
//!
//! Typed async client for the Stability AI image generation REST API:
//! - Engine listing and v1 text-to-image (JSON endpoints)
//! - Stable Image generate/edit/upscale (v2beta multipart endpoints)
//! - Submit-then-poll protocol for the creative upscaler
//! - Dual raw-bytes / JSON-envelope response handling
//!
//! One [`StabilityClient`] per API key; all operations borrow the client and
//! perform a single HTTP exchange (the poll loop performs one per iteration).

pub mod client;
pub mod engines;
pub mod error;
pub mod generation;
pub mod jobs;
pub mod stable_image;

pub use client::{StabilityClient, StabilityClientBuilder, api_key_from_env};
pub use error::{Error, Result};
pub use jobs::{JobId, JobStatus, PollConfig};
pub use stable_image::{FinishReason, ImageArtifact, ImageResult, ResponseFormat};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::StabilityClient;
    pub use crate::error::{Error, Result};
    pub use crate::jobs::{JobId, JobStatus, PollConfig};
    pub use crate::stable_image::{
        AspectRatio, FinishReason, ImageResult, OutputFormat, ResponseFormat, StylePreset,
    };
}
