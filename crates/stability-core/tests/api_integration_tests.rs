//! Integration tests against an in-process stub of the Stability API
//!
//! Each test stands up a purpose-built axum router on an ephemeral port and
//! drives the real client against it, covering representation selection,
//! error normalization over the wire, and the submit-then-poll protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use stability_core::generation::TextToImageRequest;
use stability_core::stable_image::{CoreGenerateRequest, UpscaleRequest};
use stability_core::{
    Error, FinishReason, ImageResult, JobId, JobStatus, PollConfig, ResponseFormat,
    StabilityClient,
};

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Default)]
struct StubState {
    submits: AtomicUsize,
    polls: AtomicUsize,
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: &str) -> StabilityClient {
    StabilityClient::builder()
        .api_key("test-key")
        .base_url(base_url)
        .build()
        .unwrap()
}

fn envelope(seed: u64) -> serde_json::Value {
    json!({
        "image": "aGVsbG8=",
        "finish_reason": "SUCCESS",
        "seed": seed,
    })
}

#[tokio::test]
async fn test_list_engines() {
    let router = Router::new().route(
        "/v1/engines/list",
        get(|headers: HeaderMap| async move {
            assert_eq!(
                headers.get(header::AUTHORIZATION).unwrap(),
                "Bearer test-key"
            );
            Json(json!([
                {"id": "sdxl", "name": "SDXL", "description": "Stable Diffusion XL", "type": "PICTURE"},
                {"id": "esrgan-v1", "name": "ESRGAN", "description": "Upscaler", "type": "PICTURE"},
            ]))
        }),
    );
    let base = serve(router).await;

    let engines = client(&base).list_engines().await.unwrap();
    assert_eq!(engines.len(), 2);
    assert_eq!(engines[0].id, "sdxl");
    assert_eq!(engines[1].engine_type, "PICTURE");
}

#[tokio::test]
async fn test_text_to_image_decodes_artifacts() {
    let router = Router::new().route(
        "/v1/generation/{engine_id}/text-to-image",
        post(
            |Path(engine_id): Path<String>, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(engine_id, "sdxl");
                assert_eq!(body["text_prompts"][0]["text"], "a koi pond");
                Json(json!({
                    "artifacts": [
                        {"base64": "aGVsbG8=", "finishReason": "SUCCESS", "seed": 7}
                    ]
                }))
            },
        ),
    );
    let base = serve(router).await;

    let request = TextToImageRequest::new("a koi pond").with_seed(11);
    let artifacts = client(&base).text_to_image("sdxl", &request).await.unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].finish_reason, FinishReason::Success);
    assert_eq!(artifacts[0].seed, Some(7));
    assert_eq!(artifacts[0].decode().unwrap(), b"hello");
}

/// The Accept header is the sole representation selector: the stub answers
/// bytes for `image/*` and the JSON envelope for `application/json`, and the
/// returned variant must match the caller's choice.
async fn generate_by_accept(headers: HeaderMap) -> Response {
    match headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) {
        Some("image/*") => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/png")],
            PNG_MAGIC.to_vec(),
        )
            .into_response(),
        Some("application/json") => Json(envelope(3)).into_response(),
        other => panic!("unexpected Accept header: {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_core_binary_representation() {
    let router = Router::new().route(
        "/v2beta/stable-image/generate/core",
        post(generate_by_accept),
    );
    let base = serve(router).await;

    let request = CoreGenerateRequest::new("a lighthouse");
    let result = client(&base)
        .generate_core(&request, ResponseFormat::Image)
        .await
        .unwrap();
    match result {
        ImageResult::Bytes(bytes) => assert_eq!(bytes, PNG_MAGIC),
        other => panic!("expected raw bytes, got {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_core_json_representation() {
    let router = Router::new().route(
        "/v2beta/stable-image/generate/core",
        post(generate_by_accept),
    );
    let base = serve(router).await;

    let request = CoreGenerateRequest::new("a lighthouse");
    let result = client(&base)
        .generate_core(&request, ResponseFormat::Json)
        .await
        .unwrap();
    match result {
        ImageResult::Json(artifact) => {
            assert_eq!(artifact.finish_reason, FinishReason::Success);
            assert_eq!(artifact.seed, Some(3));
        }
        other => panic!("expected JSON envelope, got {other:?}"),
    }
}

#[tokio::test]
async fn test_binary_representation_never_parses_json_body() {
    // Server misbehaves: answers a JSON document to an `image/*` request.
    // The client must hand the bytes through untouched rather than decode.
    let json_text = br#"{"image":"aGVsbG8=","finish_reason":"SUCCESS","seed":1}"#;
    let router = Router::new().route(
        "/v2beta/stable-image/generate/core",
        post(|| async {
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                json_text.to_vec(),
            )
        }),
    );
    let base = serve(router).await;

    let request = CoreGenerateRequest::new("a lighthouse");
    let result = client(&base)
        .generate_core(&request, ResponseFormat::Image)
        .await
        .unwrap();
    match result {
        ImageResult::Bytes(bytes) => assert_eq!(bytes, json_text),
        other => panic!("expected raw bytes, got {other:?}"),
    }
}

#[tokio::test]
async fn test_structured_error_normalized_over_wire() {
    let router = Router::new().route(
        "/v2beta/stable-image/generate/core",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"id": "e1", "name": "bad_request", "errors": ["A", "B"]})),
            )
        }),
    );
    let base = serve(router).await;

    let request = CoreGenerateRequest::new("a lighthouse");
    let error = client(&base)
        .generate_core(&request, ResponseFormat::Image)
        .await
        .unwrap_err();
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

#[tokio::test]
async fn test_non_json_error_body_surfaces_raw_text() {
    let router = Router::new().route(
        "/v2beta/stable-image/generate/core",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let base = serve(router).await;

    let request = CoreGenerateRequest::new("a lighthouse");
    let error = client(&base)
        .generate_core(&request, ResponseFormat::Image)
        .await
        .unwrap_err();
    match error {
        Error::Api {
            status,
            message,
            id,
            name,
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
            assert!(id.is_none());
            assert!(name.is_none());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

fn upscale_router(state: Arc<StubState>) -> Router {
    Router::new()
        .route(
            "/v2beta/stable-image/upscale/creative",
            post(|State(state): State<Arc<StubState>>| async move {
                state.submits.fetch_add(1, Ordering::SeqCst);
                Json(json!({"id": "abc"}))
            }),
        )
        .route(
            "/v2beta/stable-image/upscale/creative/result/{id}",
            get(
                |State(state): State<Arc<StubState>>,
                 Path(id): Path<String>,
                 headers: HeaderMap| async move {
                    if id != "abc" {
                        return (StatusCode::NOT_FOUND, "unknown id").into_response();
                    }
                    let prior = state.polls.fetch_add(1, Ordering::SeqCst);
                    if prior == 0 {
                        return (
                            StatusCode::ACCEPTED,
                            Json(json!({"id": id, "status": "in-progress"})),
                        )
                            .into_response();
                    }
                    match headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) {
                        Some("image/*") => (
                            StatusCode::OK,
                            [(header::CONTENT_TYPE, "image/png")],
                            PNG_MAGIC.to_vec(),
                        )
                            .into_response(),
                        _ => Json(envelope(42)).into_response(),
                    }
                },
            ),
        )
        .with_state(state)
}

#[tokio::test]
async fn test_submit_and_wait_returns_structured_result() {
    let state = Arc::new(StubState::default());
    let base = serve(upscale_router(state.clone())).await;

    let request = UpscaleRequest::new(PNG_MAGIC.to_vec(), "a sharper lighthouse");
    let poll = PollConfig::with_interval(Duration::from_millis(5));
    let result = client(&base)
        .upscale_creative_and_wait(&request, ResponseFormat::Json, &poll)
        .await
        .unwrap();

    assert_eq!(result.seed(), Some(42));
    assert_eq!(result.finish_reason(), Some(FinishReason::Success));
    // First poll answered 202; exactly one more was issued after the interval.
    assert_eq!(state.submits.load(Ordering::SeqCst), 1);
    assert_eq!(state.polls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_in_progress_poll_is_not_an_error() {
    let state = Arc::new(StubState::default());
    let base = serve(upscale_router(state.clone())).await;
    let stability = client(&base);

    let id = JobId::new("abc");
    let status = stability
        .fetch_upscale_result(&id, ResponseFormat::Json)
        .await
        .unwrap();
    assert!(matches!(status, JobStatus::InProgress));

    let status = stability
        .fetch_upscale_result(&id, ResponseFormat::Json)
        .await
        .unwrap();
    match status {
        JobStatus::Complete(result) => assert_eq!(result.seed(), Some(42)),
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wait_for_upscale_binary_completion() {
    let state = Arc::new(StubState::default());
    let base = serve(upscale_router(state.clone())).await;

    let id = JobId::new("abc");
    let poll = PollConfig::with_interval(Duration::from_millis(5));
    let result = client(&base)
        .wait_for_upscale(&id, ResponseFormat::Image, &poll)
        .await
        .unwrap();
    match result {
        ImageResult::Bytes(bytes) => assert_eq!(bytes, PNG_MAGIC),
        other => panic!("expected raw bytes, got {other:?}"),
    }
}

#[tokio::test]
async fn test_poll_stops_immediately_on_error() {
    let polls = Arc::new(AtomicUsize::new(0));
    let seen = polls.clone();
    let router = Router::new().route(
        "/v2beta/stable-image/upscale/creative/result/{id}",
        get(move |Path(_id): Path<String>| {
            let polls = seen.clone();
            async move {
                polls.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"id": "e9", "name": "not_found", "errors": ["result expired"]})),
                )
            }
        }),
    );
    let base = serve(router).await;

    let id = JobId::new("gone");
    let poll = PollConfig::with_interval(Duration::from_millis(5));
    let error = client(&base)
        .wait_for_upscale(&id, ResponseFormat::Json, &poll)
        .await
        .unwrap_err();

    match error {
        Error::Api {
            status,
            message,
            name,
            ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(message, "result expired");
            assert_eq!(name.as_deref(), Some("not_found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(polls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_poll_deadline_aborts_the_loop() {
    let router = Router::new().route(
        "/v2beta/stable-image/upscale/creative/result/{id}",
        get(|Path(id): Path<String>| async move {
            (
                StatusCode::ACCEPTED,
                Json(json!({"id": id, "status": "in-progress"})),
            )
        }),
    );
    let base = serve(router).await;

    let id = JobId::new("slow");
    let poll = PollConfig::with_interval(Duration::from_millis(5))
        .with_deadline(Duration::from_millis(30));
    let started = Instant::now();
    let error = client(&base)
        .wait_for_upscale(&id, ResponseFormat::Json, &poll)
        .await
        .unwrap_err();

    assert!(matches!(error, Error::PollTimeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_malformed_in_progress_body_is_a_decode_error() {
    let router = Router::new().route(
        "/v2beta/stable-image/upscale/creative/result/{id}",
        get(|| async { (StatusCode::ACCEPTED, Json(json!({}))) }),
    );
    let base = serve(router).await;

    let id = JobId::new("abc");
    let error = client(&base)
        .fetch_upscale_result(&id, ResponseFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(error, Error::Decode(_)));
}

#[tokio::test]
async fn test_conservative_upscale_is_synchronous() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let router = Router::new().route(
        "/v2beta/stable-image/upscale/conservative",
        post(move || {
            let calls = seen.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "image/png")],
                    PNG_MAGIC.to_vec(),
                )
            }
        }),
    );
    let base = serve(router).await;

    let request = UpscaleRequest::new(PNG_MAGIC.to_vec(), "a sharper lighthouse")
        .with_creativity(0.2);
    let result = client(&base)
        .upscale_conservative(&request, ResponseFormat::Image)
        .await
        .unwrap();
    assert!(matches!(result, ImageResult::Bytes(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_validation_failures_never_reach_the_network() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let router = Router::new().route(
        "/v2beta/stable-image/upscale/creative",
        post(move || {
            let calls = seen.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Json(json!({"id": "abc"}))
            }
        }),
    );
    let base = serve(router).await;

    let request = UpscaleRequest::new(PNG_MAGIC.to_vec(), "x").with_creativity(0.9);
    let error = client(&base).upscale_creative(&request).await.unwrap_err();
    assert!(matches!(error, Error::Validation(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
