//! HTTP client for the Stability AI REST API
//!
//! Owns the transport: bearer-token auth, JSON and multipart dispatch, the
//! status-code policy (anything >= 400 is an error), and normalization of
//! API error bodies into [`Error::Api`].

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};
use crate::stable_image::{ImageArtifact, ImageResult, ResponseFormat};

/// Stability API base URL
const STABILITY_BASE_URL: &str = "https://api.stability.ai";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Async client for the Stability AI REST API
///
/// One instance per API key. Cloning is cheap; clones share the underlying
/// connection pool.
#[derive(Clone)]
pub struct StabilityClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for StabilityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StabilityClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Builder for [`StabilityClient`]
pub struct StabilityClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl Default for StabilityClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StabilityClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_secs: None,
        }
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL (defaults to the public Stability API origin)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<StabilityClient> {
        let api_key = self.api_key.ok_or(Error::ApiKeyMissing)?;

        let timeout = Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Network)?;

        Ok(StabilityClient {
            http,
            api_key,
            base_url: self
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| STABILITY_BASE_URL.to_string()),
        })
    }
}

impl StabilityClient {
    /// Create a client with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        StabilityClientBuilder::new().api_key(api_key).build()
    }

    /// Create a new builder
    pub fn builder() -> StabilityClientBuilder {
        StabilityClientBuilder::new()
    }

    /// Base origin this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
    }

    /// Send a request expecting a JSON response body.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(Error::Network)?;
        let response = Self::check_status(response).await?;

        let body = response.text().await.map_err(Error::Network)?;
        serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Send a multipart request to an image-bearing endpoint.
    ///
    /// The `Accept` header is derived from `format` and decides whether the
    /// server returns raw bytes or the JSON envelope; the returned variant
    /// always matches it.
    pub(crate) async fn send_image_request(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        format: ResponseFormat,
    ) -> Result<ImageResult> {
        debug!(path, accept = format.accept(), "Sending image request");

        let response = self
            .post(path)
            .header(ACCEPT, format.accept())
            .multipart(form)
            .send()
            .await
            .map_err(Error::Network)?;
        let response = Self::check_status(response).await?;

        let body = response.bytes().await.map_err(Error::Network)?;
        decode_image_body(format, body.to_vec())
    }

    /// Reject any response with a status of 400 or above, normalizing the
    /// error body. Responses below 400 pass through untouched.
    pub(crate) async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }
        Ok(response)
    }
}

/// Read the API key from the `STABILITY_API_KEY` environment variable.
pub fn api_key_from_env() -> Result<String> {
    std::env::var("STABILITY_API_KEY").map_err(|_| Error::ApiKeyMissing)
}

/// Interpret a successful response body under the caller's chosen
/// representation.
///
/// Raw mode wraps the bytes untouched; no JSON parsing is attempted even if
/// the body happens to be valid JSON text.
pub(crate) fn decode_image_body(format: ResponseFormat, body: Vec<u8>) -> Result<ImageResult> {
    match format {
        ResponseFormat::Image => Ok(ImageResult::Bytes(body)),
        ResponseFormat::Json => {
            let artifact: ImageArtifact = serde_json::from_slice(&body)
                .map_err(|e| Error::Decode(format!("image response: {e}")))?;
            Ok(ImageResult::Json(artifact))
        }
    }
}

/// Error body shape the API uses for most failures.
///
/// All fields are optional so a partial match can fall through to the
/// looser message forms below.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    id: Option<String>,
    name: Option<String>,
    errors: Option<Vec<String>>,
    message: Option<String>,
}

/// Normalize a failing HTTP response into [`Error::Api`].
///
/// Precedence: the structured `{id, name, errors}` shape, then a bare
/// `message` field, then the raw body text. A body that parses as JSON but
/// matches neither shape still surfaces as its raw text rather than a
/// placeholder.
pub(crate) fn api_error(status: StatusCode, body: &str) -> Error {
    let (message, id, name) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            id: Some(id),
            name: Some(name),
            errors: Some(errors),
            ..
        }) if !errors.is_empty() => (errors.join(", "), Some(id), Some(name)),
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => (message, None, None),
        _ => (body.to_string(), None, None),
    };

    Error::Api {
        status: status.as_u16(),
        message,
        id,
        name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stable_image::FinishReason;

    #[test]
    fn test_builder_requires_api_key() {
        let result = StabilityClientBuilder::new().build();
        assert!(matches!(result, Err(Error::ApiKeyMissing)));
    }

    #[test]
    fn test_builder_with_api_key() {
        let client = StabilityClientBuilder::new()
            .api_key("test-key")
            .base_url("http://localhost:9999/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999");
    }

    #[test]
    fn test_debug_omits_api_key() {
        let client = StabilityClient::new("sk-secret").unwrap();
        let printed = format!("{:?}", client);
        assert!(!printed.contains("sk-secret"));
    }

    #[test]
    fn test_api_error_structured_shape() {
        let body = r#"{"id":"e1","name":"bad_request","errors":["A","B"]}"#;
        let error = api_error(StatusCode::BAD_REQUEST, body);
        match error {
            Error::Api {
                status,
                message,
                id,
                name,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "A, B");
                assert_eq!(id.as_deref(), Some("e1"));
                assert_eq!(name.as_deref(), Some("bad_request"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_message_shape() {
        let body = r#"{"message":"no such engine"}"#;
        let error = api_error(StatusCode::NOT_FOUND, body);
        match error {
            Error::Api {
                message, id, name, ..
            } => {
                assert_eq!(message, "no such engine");
                assert!(id.is_none());
                assert!(name.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_empty_errors_falls_through() {
        // Structured shape requires at least one error string.
        let body = r#"{"id":"e1","name":"bad_request","errors":[],"message":"fallback"}"#;
        let error = api_error(StatusCode::BAD_REQUEST, body);
        match error {
            Error::Api {
                message, id, name, ..
            } => {
                assert_eq!(message, "fallback");
                assert!(id.is_none());
                assert!(name.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_unmatched_json_uses_raw_body() {
        let body = r#"{"detail":"something else"}"#;
        let error = api_error(StatusCode::INTERNAL_SERVER_ERROR, body);
        match error {
            Error::Api { message, id, .. } => {
                assert_eq!(message, body);
                assert!(id.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_non_json_uses_raw_body() {
        let error = api_error(StatusCode::BAD_GATEWAY, "upstream exploded");
        match error {
            Error::Api {
                status,
                message,
                id,
                name,
            } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream exploded");
                assert!(id.is_none());
                assert!(name.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_image_body_raw_never_parses_json() {
        // A JSON-looking body stays opaque bytes in raw mode.
        let body = br#"{"image":"bm90IGFuIGltYWdl","finish_reason":"SUCCESS"}"#.to_vec();
        match decode_image_body(ResponseFormat::Image, body.clone()).unwrap() {
            ImageResult::Bytes(bytes) => assert_eq!(bytes, body),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_decode_image_body_json_envelope() {
        let body = br#"{"image":"aGVsbG8=","finish_reason":"SUCCESS","seed":42}"#.to_vec();
        match decode_image_body(ResponseFormat::Json, body).unwrap() {
            ImageResult::Json(artifact) => {
                assert_eq!(artifact.finish_reason, FinishReason::Success);
                assert_eq!(artifact.seed, Some(42));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_decode_image_body_json_shape_mismatch() {
        let body = br#"{"unexpected":"shape"}"#.to_vec();
        let result = decode_image_body(ResponseFormat::Json, body);
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
