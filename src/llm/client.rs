//! Chat-completion HTTP client
//!
//! OpenAI-compatible chat endpoint client with:
//! - Rate limiting to prevent API abuse
//! - Retry logic with exponential backoff
//! - Request timeout enforced at the HTTP layer
//! - In-memory usage counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::config::CompletionConfig;
use crate::core::error::{CompletionError, ErrorRecovery};

use super::{CompletionRequest, CompletionResponse, TextCompletion};

/// Chat client configuration
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// API endpoint URL
    pub endpoint: String,

    /// API key
    pub api_key: SecretString,

    /// Model identifier sent to the endpoint
    pub model: String,

    /// Requests per minute limit
    pub requests_per_minute: u32,

    /// Whether the backend is enabled
    pub enabled: bool,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum request attempts
    pub max_retries: u32,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: SecretString::new(String::new()),
            model: "gpt-4o-mini".to_string(),
            requests_per_minute: 60,
            enabled: false,
            timeout_ms: 5000,
            max_retries: 3,
        }
    }
}

impl ChatClientConfig {
    /// Create an enabled OpenAI config.
    pub fn openai(api_key: String) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            enabled: true,
            ..Default::default()
        }
    }

    /// Build from persisted settings plus a key supplied at runtime.
    /// The key never passes through the serialized config.
    pub fn from_settings(settings: &CompletionConfig, api_key: SecretString) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key,
            model: settings.model.clone(),
            requests_per_minute: settings.requests_per_minute,
            enabled: settings.enabled,
            timeout_ms: settings.timeout_ms,
            max_retries: settings.max_retries,
        }
    }
}

/// Rate limiter using token bucket algorithm
pub struct RateLimiter {
    /// Tokens available
    tokens: AtomicU64,

    /// Maximum tokens (requests per minute)
    max_tokens: u64,

    /// Last refill time
    last_refill: RwLock<Instant>,

    /// Refill interval
    refill_interval: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            tokens: AtomicU64::new(requests_per_minute as u64),
            max_tokens: requests_per_minute as u64,
            last_refill: RwLock::new(Instant::now()),
            refill_interval: Duration::from_secs(60),
        }
    }

    /// Try to acquire a token
    pub async fn acquire(&self) -> Result<(), CompletionError> {
        self.refill().await;

        let current = self.tokens.load(Ordering::SeqCst);
        if current == 0 {
            return Err(CompletionError::RateLimitExceeded);
        }

        self.tokens.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    /// Refill tokens based on elapsed time
    async fn refill(&self) {
        let mut last_refill = self.last_refill.write().await;
        let elapsed = last_refill.elapsed();

        if elapsed >= self.refill_interval {
            self.tokens.store(self.max_tokens, Ordering::SeqCst);
            *last_refill = Instant::now();
        }
    }

    /// Get current available tokens
    pub fn available_tokens(&self) -> u64 {
        self.tokens.load(Ordering::SeqCst)
    }
}

/// Usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    /// Total requests served
    pub total_requests: u64,

    /// Total tokens reported by the backend
    pub total_tokens: u64,
}

/// In-memory usage counters
struct UsageCounter {
    requests: AtomicU64,
    tokens: AtomicU64,
}

impl UsageCounter {
    fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            tokens: AtomicU64::new(0),
        }
    }

    fn record(&self, tokens: u64) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.tokens.fetch_add(tokens, Ordering::SeqCst);
    }

    fn snapshot(&self) -> UsageStats {
        UsageStats {
            total_requests: self.requests.load(Ordering::SeqCst),
            total_tokens: self.tokens.load(Ordering::SeqCst),
        }
    }
}

/// Chat API request structure
#[derive(Debug, Serialize)]
struct ChatApiRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

/// Chat API message
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat API response structure
#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

/// OpenAI-compatible chat completion client
pub struct ChatCompletionClient {
    /// HTTP client
    client: Client,

    /// Client configuration
    config: ChatClientConfig,

    /// Rate limiter
    rate_limiter: RateLimiter,

    /// Usage counters
    usage: UsageCounter,
}

impl ChatCompletionClient {
    /// Create a new client. The request timeout is set on the HTTP
    /// client itself so every call is bounded.
    pub fn new(config: ChatClientConfig) -> Result<Self, CompletionError> {
        let rate_limiter = RateLimiter::new(config.requests_per_minute);

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CompletionError::RequestFailed {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config,
            rate_limiter,
            usage: UsageCounter::new(),
        })
    }

    /// Get usage statistics
    pub fn usage(&self) -> UsageStats {
        self.usage.snapshot()
    }

    /// Get rate limiter reference
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Get current configuration
    pub fn config(&self) -> &ChatClientConfig {
        &self.config
    }

    /// Make API request with retry logic
    async fn make_request_with_retry(
        &self,
        request: &CompletionRequest,
    ) -> Result<ChatApiResponse, CompletionError> {
        let mut last_error = None;
        let mut retry_delay = Duration::from_millis(100);

        for attempt in 0..self.config.max_retries {
            match self.make_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        "Completion request failed (attempt {}/{}): {}",
                        attempt + 1,
                        self.config.max_retries,
                        e
                    );

                    if !e.is_retryable() {
                        return Err(e);
                    }

                    if let Some(delay_ms) = e.retry_delay_ms() {
                        retry_delay = retry_delay.max(Duration::from_millis(delay_ms));
                    }

                    last_error = Some(e);

                    tokio::time::sleep(retry_delay).await;
                    retry_delay = retry_delay.saturating_mul(2);
                }
            }
        }

        Err(last_error.unwrap_or(CompletionError::RequestFailed {
            reason: "Max retries exceeded".to_string(),
        }))
    }

    /// Make a single API request
    async fn make_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<ChatApiResponse, CompletionError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let request_body = ChatApiRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout {
                        timeout_ms: self.config.timeout_ms,
                    }
                } else {
                    CompletionError::RequestFailed {
                        reason: format!("Request failed: {}", e),
                    }
                }
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimitExceeded);
        }

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(CompletionError::AuthenticationFailed);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::RequestFailed {
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        let api_response: ChatApiResponse =
            response
                .json()
                .await
                .map_err(|e| CompletionError::ResponseParseFailed {
                    reason: format!("Failed to parse response: {}", e),
                })?;

        Ok(api_response)
    }
}

#[async_trait]
impl TextCompletion for ChatCompletionClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        if !self.config.enabled {
            return Err(CompletionError::Disabled);
        }

        self.rate_limiter.acquire().await?;

        let start = Instant::now();
        let api_response = self.make_request_with_retry(&request).await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let text = api_response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| CompletionError::ResponseParseFailed {
                reason: "Response contained no choices".to_string(),
            })?;

        let total_tokens = api_response.usage.as_ref().map(|u| u.total_tokens);
        self.usage.record(total_tokens.unwrap_or(0) as u64);

        Ok(CompletionResponse {
            text,
            total_tokens,
            duration_ms,
        })
    }

    fn is_available(&self) -> bool {
        self.config.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(60);
        assert_eq!(limiter.available_tokens(), 60);
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire() {
        let limiter = RateLimiter::new(2);

        assert!(limiter.acquire().await.is_ok());
        assert!(limiter.acquire().await.is_ok());

        assert!(matches!(
            limiter.acquire().await,
            Err(CompletionError::RateLimitExceeded)
        ));
    }

    #[test]
    fn test_config_default_is_disabled() {
        let config = ChatClientConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.requests_per_minute, 60);
        assert_eq!(config.timeout_ms, 5000);
    }

    #[test]
    fn test_config_openai() {
        let config = ChatClientConfig::openai("test-key".to_string());
        assert!(config.enabled);
        assert!(config.endpoint.contains("openai"));
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[test]
    fn test_config_from_settings_keeps_key_separate() {
        let settings = CompletionConfig {
            enabled: true,
            model: "gpt-4o".to_string(),
            timeout_ms: 2500,
            ..Default::default()
        };
        let config = ChatClientConfig::from_settings(
            &settings,
            SecretString::new("runtime-key".to_string()),
        );
        assert!(config.enabled);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.api_key.expose_secret(), "runtime-key");
    }

    #[tokio::test]
    async fn test_disabled_client_rejects_requests() {
        let client = ChatCompletionClient::new(ChatClientConfig::default()).unwrap();
        assert!(!client.is_available());
        let result = client
            .complete(CompletionRequest::new("translate this"))
            .await;
        assert!(matches!(result, Err(CompletionError::Disabled)));
    }
}
