//! Chat endpoint client

use crate::chat::{ChatRequest, ChatResponse};
use crate::error::ChatApiError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

/// Default path of the chat endpoint, relative to the base URL
const DEFAULT_CHAT_PATH: &str = "/api/chat";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the caller's identity token
pub const ID_TOKEN_HEADER: &str = "x-id-token";

// ============================================================================
// Raw Response Types
// ============================================================================

/// HTTP metadata of a chat response
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,

    /// Request ID (from `x-request-id`), if the backend sent one
    pub request_id: Option<String>,
}

/// A response with both parsed data and raw HTTP metadata
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The parsed response data
    pub data: T,

    /// Raw HTTP response metadata
    pub raw: RawResponse,
}

impl<T> Response<T> {
    /// Get the parsed data
    pub fn into_data(self) -> T {
        self.data
    }

    /// Get the request ID for debugging
    pub fn request_id(&self) -> Option<&str> {
        self.raw.request_id.as_deref()
    }
}

// ============================================================================
// Client
// ============================================================================

/// Chat endpoint client
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    chat_path: String,
    access_token: Option<String>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("chat_path", &self.chat_path)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ChatClient {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChatApiError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a client from the environment
    ///
    /// Reads `FLOWGATE_API_URL` (required) and `FLOWGATE_API_TIMEOUT_SECS`
    /// (optional).
    pub fn from_env() -> Result<Self, ChatApiError> {
        let base_url = std::env::var("FLOWGATE_API_URL").map_err(|_| {
            ChatApiError::Configuration("FLOWGATE_API_URL environment variable not set".to_string())
        })?;

        let mut builder = Self::builder().base_url(base_url);
        if let Ok(secs) = std::env::var("FLOWGATE_API_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ChatApiError::Configuration(format!(
                    "FLOWGATE_API_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
                    secs
                ))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    /// Create a builder for more advanced configuration
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::new()
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a chat message
    ///
    /// Failed requests are not retried: a chat message can trigger tool
    /// calls with side effects on the backend.
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ChatApiError> {
        self.send_with_metadata(request).await.map(|r| r.data)
    }

    /// Send a chat message and keep the HTTP metadata
    pub async fn send_with_metadata(
        &self,
        request: &ChatRequest,
    ) -> Result<Response<ChatResponse>, ChatApiError> {
        let url = format!("{}{}", self.base_url, self.chat_path);
        let headers = build_headers(request.id_token.as_deref(), self.access_token.as_deref())?;

        log::debug!(
            "POST {} (id token attached: {}, conversation: {:?})",
            url,
            request.id_token.is_some(),
            request.conversation_id
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(ChatApiError::from_reqwest_error)?;

        let raw = RawResponse {
            status: response.status().as_u16(),
            request_id: response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        };

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("chat endpoint returned HTTP {}", raw.status);
            return Err(ChatApiError::from_status(raw.status, &body));
        }

        let body = response
            .text()
            .await
            .map_err(ChatApiError::from_reqwest_error)?;
        let data = serde_json::from_str::<ChatResponse>(&body).map_err(|e| {
            ChatApiError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        Ok(Response { data, raw })
    }
}

/// Builder for [`ChatClient`]
///
/// Create with [`ChatClient::builder()`]. The base URL is required.
pub struct ChatClientBuilder {
    base_url: Option<String>,
    chat_path: Option<String>,
    timeout: Option<Duration>,
    access_token: Option<String>,
}

impl ChatClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            chat_path: None,
            timeout: None,
            access_token: None,
        }
    }

    /// Set the backend base URL (e.g. `http://localhost:8000`)
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the chat endpoint path (default: `/api/chat`)
    pub fn chat_path(mut self, path: impl Into<String>) -> Self {
        self.chat_path = Some(path.into());
        self
    }

    /// Set the request timeout (default: 30 seconds)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send this bearer token in the `Authorization` header
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ChatClient, ChatApiError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ChatApiError::Configuration("base URL is required".to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ChatApiError::Configuration(
                "base URL must not be empty".to_string(),
            ));
        }

        let chat_path = match self.chat_path {
            Some(path) if path.starts_with('/') => path,
            Some(path) => format!("/{}", path),
            None => DEFAULT_CHAT_PATH.to_string(),
        };

        let client = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| {
                ChatApiError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(ChatClient {
            client,
            base_url,
            chat_path,
            access_token: self.access_token,
        })
    }
}

// ============================================================================
// Shared Helpers
// ============================================================================

fn build_headers(
    id_token: Option<&str>,
    access_token: Option<&str>,
) -> Result<HeaderMap, ChatApiError> {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = id_token.filter(|t| !t.is_empty()) {
        headers.insert(
            ID_TOKEN_HEADER,
            HeaderValue::from_str(token)
                .map_err(|e| ChatApiError::Configuration(format!("Invalid ID token: {}", e)))?,
        );
    }

    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                ChatApiError::Configuration(format!("Invalid access token: {}", e))
            })?,
        );
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let result = ChatClient::builder().build();
        assert!(matches!(result, Err(ChatApiError::Configuration(_))));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = ChatClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_builder_rejects_empty_base_url() {
        let result = ChatClient::new("/");
        assert!(matches!(result, Err(ChatApiError::Configuration(_))));
    }

    #[test]
    fn test_builder_normalizes_chat_path() {
        let client = ChatClient::builder()
            .base_url("http://localhost")
            .chat_path("v2/chat")
            .build()
            .unwrap();
        assert_eq!(client.chat_path, "/v2/chat");
    }

    #[test]
    fn test_debug_redacts_access_token() {
        let client = ChatClient::builder()
            .base_url("http://localhost")
            .access_token("secret-token")
            .build()
            .unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_build_headers_skips_empty_tokens() {
        let headers = build_headers(Some(""), None).unwrap();
        assert!(headers.get(ID_TOKEN_HEADER).is_none());
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_build_headers_rejects_invalid_token() {
        let result = build_headers(Some("bad\ntoken"), None);
        assert!(matches!(result, Err(ChatApiError::Configuration(_))));
    }
}
