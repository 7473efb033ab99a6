//! Client for the external background-generation service.
//!
//! Wire contract: request `{ image_url, prompt, ...options }`, response
//! `{ images: [{ url, width, height, file_size }], seed }`. The first image
//! is the result. Transient failures are retried with exponential backoff;
//! validation failures surface immediately.

use crate::error::{GenerateError, GenerateResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Total attempts per generation call (1 initial + 2 retries).
pub const MAX_ATTEMPTS: u32 = 3;
/// First backoff delay; doubles on each subsequent attempt.
pub const BACKOFF_BASE_DELAY: Duration = Duration::from_millis(500);

/// Generation request: product photo URL plus a scene prompt, with
/// passthrough options forwarded verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub image_url: String,
    pub prompt: String,
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl GenerateRequest {
    pub fn new(image_url: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            prompt: prompt.into(),
            options: serde_json::Map::new(),
        }
    }

    /// Attach a passthrough option forwarded to the service unchanged.
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    fn validate(&self) -> GenerateResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(GenerateError::InvalidRequest("prompt is empty".into()));
        }
        if self.image_url.trim().is_empty() {
            return Err(GenerateError::InvalidRequest("image_url is empty".into()));
        }
        Ok(())
    }
}

/// One generated image in the service response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
}

/// Service response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub images: Vec<GeneratedImage>,
    pub seed: u64,
}

impl GenerateResponse {
    /// URL of the result image (the first entry).
    pub fn primary_url(&self) -> Option<&str> {
        self.images.first().map(|img| img.url.as_str())
    }
}

/// Pluggable transport so tests can script failures without a network.
#[async_trait]
pub trait GenerateTransport: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> GenerateResult<GenerateResponse>;
}

/// Retrying client over a [`GenerateTransport`].
pub struct BackgroundClient<T> {
    transport: T,
    max_attempts: u32,
    base_delay: Duration,
}

impl<T: GenerateTransport> BackgroundClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_retry(transport, MAX_ATTEMPTS, BACKOFF_BASE_DELAY)
    }

    pub fn with_retry(transport: T, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            transport,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Run a generation request.
    ///
    /// Transient failures (timeouts, rate limits, 5xx) are retried up to the
    /// attempt budget with the backoff delay doubling per attempt; any other
    /// failure propagates immediately.
    pub async fn generate(&self, request: &GenerateRequest) -> GenerateResult<GenerateResponse> {
        request.validate()?;

        let mut attempt = 1;
        loop {
            match self.transport.generate(request).await {
                Ok(response) => {
                    if response.images.is_empty() {
                        return Err(GenerateError::EmptyResponse);
                    }
                    debug!(attempt, seed = response.seed, "background generated");
                    return Ok(response);
                }
                Err(err) if attempt < self.max_attempts && err.is_transient() => {
                    let delay = self.base_delay * 2u32.pow(attempt - 1);
                    warn!(attempt, ?delay, error = %err, "transient generation failure, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Run a generation request and extract the result image URL.
    pub async fn generate_background_url(&self, request: &GenerateRequest) -> GenerateResult<String> {
        let response = self.generate(request).await?;
        response
            .images
            .into_iter()
            .next()
            .map(|img| img.url)
            .ok_or(GenerateError::EmptyResponse)
    }
}

/// HTTP transport over `reqwest`, posting the request as JSON.
#[cfg(feature = "http-client")]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

#[cfg(feature = "http-client")]
impl HttpTransport {
    /// Build a transport for the given generation endpoint.
    pub fn new(endpoint: impl Into<String>) -> GenerateResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    fn status_is_transient(status: reqwest::StatusCode) -> bool {
        use reqwest::StatusCode;
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        )
    }
}

#[cfg(feature = "http-client")]
#[async_trait]
impl GenerateTransport for HttpTransport {
    async fn generate(&self, request: &GenerateRequest) -> GenerateResult<GenerateResponse> {
        let response = self.http.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{status}: {body}");
            return Err(if Self::status_is_transient(status) {
                GenerateError::Transient(message)
            } else {
                GenerateError::Service(message)
            });
        }
        Ok(response.json::<GenerateResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<GenerateResult<GenerateResponse>>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<GenerateResult<GenerateResponse>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: AtomicU32::new(0),
            }
        }

        pub(crate) fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerateTransport for ScriptedTransport {
        async fn generate(&self, _request: &GenerateRequest) -> GenerateResult<GenerateResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerateError::EmptyResponse))
        }
    }

    pub(crate) fn response_with(url: &str) -> GenerateResponse {
        GenerateResponse {
            images: vec![GeneratedImage {
                url: url.to_string(),
                width: 1024,
                height: 1024,
                file_size: 350_000,
            }],
            seed: 42,
        }
    }

    fn request() -> GenerateRequest {
        GenerateRequest::new("https://cdn.example/product.png", "studio scene, soft light")
    }

    #[tokio::test]
    async fn test_empty_prompt_fails_without_calling_transport() {
        let transport = ScriptedTransport::new(vec![Ok(response_with("https://x/1.png"))]);
        let client = BackgroundClient::new(transport);

        let bad = GenerateRequest::new("https://cdn.example/product.png", "   ");
        let err = client.generate(&bad).await.unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRequest(_)));
        assert_eq!(client.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_transient_failure_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Err(GenerateError::Service("prompt rejected by moderation".into())),
            Ok(response_with("https://x/1.png")),
        ]);
        let client = BackgroundClient::new(transport);

        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerateError::Service(_)));
        assert_eq!(client.transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhaust_after_max_attempts() {
        let transport = ScriptedTransport::new(vec![
            Err(GenerateError::Transient("timeout".into())),
            Err(GenerateError::Transient("timeout".into())),
            Err(GenerateError::Transient("timeout".into())),
        ]);
        let client = BackgroundClient::new(transport);

        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerateError::Transient(_)));
        assert_eq!(client.transport.calls(), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_empty_image_list_is_an_error() {
        let transport = ScriptedTransport::new(vec![Ok(GenerateResponse {
            images: Vec::new(),
            seed: 7,
        })]);
        let client = BackgroundClient::new(transport);

        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerateError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_url_extraction_takes_first_image() {
        let mut response = response_with("https://x/first.png");
        response.images.push(GeneratedImage {
            url: "https://x/second.png".to_string(),
            width: 512,
            height: 512,
            file_size: 90_000,
        });
        let transport = ScriptedTransport::new(vec![Ok(response)]);
        let client = BackgroundClient::new(transport);

        let url = client.generate_background_url(&request()).await.unwrap();
        assert_eq!(url, "https://x/first.png");
    }

    #[test]
    fn test_request_options_flatten_into_payload() {
        let request = request()
            .with_option("num_images", serde_json::json!(1))
            .with_option("guidance_scale", serde_json::json!(7.5));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["prompt"], "studio scene, soft light");
        assert_eq!(value["num_images"], 1);
        assert_eq!(value["guidance_scale"], 7.5);
    }
}
