//! v1 generation endpoints (JSON)
//!
//! The engine-scoped text-to-image endpoint predates the Stable Image
//! family: requests and responses are plain JSON, and images come back as
//! base64 artifacts rather than a raw-bytes option.

mod types;

pub use types::{Artifact, TextPrompt, TextToImageRequest};

use tracing::info;

use crate::client::StabilityClient;
use crate::error::Result;

use types::TextToImageResponse;

impl StabilityClient {
    /// Generate images from text with a v1 engine.
    pub async fn text_to_image(
        &self,
        engine_id: &str,
        request: &TextToImageRequest,
    ) -> Result<Vec<Artifact>> {
        request.validate()?;
        info!(engine = engine_id, "Generating image (v1)");

        let path = format!("/v1/generation/{engine_id}/text-to-image");
        let response: TextToImageResponse =
            self.send_json(self.post(&path).json(request)).await?;
        Ok(response.artifacts)
    }
}
