//! Engine discovery (v1)

use serde::Deserialize;

use crate::client::StabilityClient;
use crate::error::Result;

/// A generation engine available to the authenticated account
#[derive(Debug, Clone, Deserialize)]
pub struct Engine {
    /// Engine identifier, e.g. `stable-diffusion-xl-1024-v1-0`
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// What the engine does
    pub description: String,
    /// Engine kind, e.g. `PICTURE`
    #[serde(rename = "type")]
    pub engine_type: String,
}

impl StabilityClient {
    /// List the engines available to this API key.
    pub async fn list_engines(&self) -> Result<Vec<Engine>> {
        self.send_json(self.get("/v1/engines/list")).await
    }
}
