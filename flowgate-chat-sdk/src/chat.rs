//! Wire types for the chat endpoint
//!
//! These mirror the JSON exchanged with the chat backend. Request types use a
//! `Request` suffix, response types have no suffix.
//!
//! # Example
//!
//! ```
//! use flowgate_chat_sdk::ChatRequest;
//!
//! let request = ChatRequest::new("Get customer information for Alice")
//!     .conversation_id("conv-1234abcd")
//!     .id_token("eyJhbGciOi...");
//! assert_eq!(request.message, "Get customer information for Alice");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Request Types
// ============================================================================

/// A chat message sent to the backend
///
/// The identity token is never serialized into the body; the client sends it
/// out-of-band in the `X-ID-Token` header.
#[derive(Clone, Serialize)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,

    /// Conversation to continue, if one was returned earlier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Identity token forwarded as `X-ID-Token`
    #[serde(skip)]
    pub id_token: Option<String>,
}

impl ChatRequest {
    /// Create a request for a single message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            id_token: None,
        }
    }

    /// Continue an existing conversation
    pub fn conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    /// Attach the caller's identity token
    pub fn id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("message", &self.message)
            .field("conversation_id", &self.conversation_id)
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Response from the chat endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Assistant text
    pub response: String,

    /// Conversation the message was appended to
    #[serde(default)]
    pub conversation_id: Option<String>,

    /// Tools the assistant invoked while answering
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Authorization checks performed on the way to the tool call
    #[serde(default)]
    pub security_flow: Option<SecurityFlow>,

    /// Audit log entry recorded for the request
    #[serde(default)]
    pub audit_id: Option<String>,

    /// Tokens produced by the cross-app token exchange, if one happened
    #[serde(default)]
    pub mcp_info: Option<McpInfo>,

    /// Server timestamp (kept as the raw string the backend sent)
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ChatResponse {
    /// Whether the backend reports a completed token exchange
    ///
    /// An explicit `token_exchanged: false` wins over a present `mcp_info`.
    pub fn token_exchanged(&self) -> bool {
        let flagged = self
            .security_flow
            .as_ref()
            .map(|flow| flow.token_exchanged)
            .unwrap_or(true);
        flagged && self.mcp_info.is_some()
    }
}

/// Token exchange details returned by the backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct McpInfo {
    /// Identity assertion grant issued for the agent
    #[serde(default)]
    pub id_jag_token: Option<String>,

    /// Access token issued by the resource's authorization server
    #[serde(default)]
    pub auth_server_token: Option<String>,

    /// Older name for the same access token; some backends send both
    #[serde(default)]
    pub mcp_access_token: Option<String>,

    /// Granted scope
    #[serde(default)]
    pub scope: Option<String>,

    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,

    /// Audience the access token was minted for
    #[serde(default)]
    pub audience: Option<String>,

    /// Token type, usually `Bearer`
    #[serde(default)]
    pub token_type: Option<String>,
}

impl McpInfo {
    /// The issued access token under either of its wire names
    pub fn access_token(&self) -> Option<&str> {
        self.auth_server_token
            .as_deref()
            .or(self.mcp_access_token.as_deref())
    }
}

/// Security checks reported by the backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityFlow {
    #[serde(default)]
    pub token_exchanged: bool,
    #[serde(default)]
    pub target_audience: Option<String>,
    /// `ALLOWED` or `DENIED` when a fine-grained check ran
    #[serde(default)]
    pub fga_check_result: Option<String>,
    #[serde(default)]
    pub ciba_approval_required: bool,
    #[serde(default)]
    pub ciba_approval_status: Option<String>,
    #[serde(default)]
    pub delegation_chain: Vec<String>,
}

impl SecurityFlow {
    /// True when the fine-grained access check explicitly denied the call
    pub fn access_denied(&self) -> bool {
        self.fga_check_result
            .as_deref()
            .is_some_and(|result| result.eq_ignore_ascii_case("denied"))
    }
}

/// A tool invocation made while answering
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub tool_output: Option<Value>,
    #[serde(default)]
    pub status: ToolCallStatus,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub approval_reason: Option<String>,
    #[serde(default)]
    pub execution_time_ms: Option<u64>,
}

/// Status of a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    #[default]
    Pending,
    Allowed,
    Denied,
    RequiresApproval,
    Completed,
    Failed,
}

/// Risk level the backend assigned to an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// Body of a non-2xx response from the backend
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub detail: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_skips_absent_fields() {
        let json = serde_json::to_value(ChatRequest::new("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"message": "hi"}));
    }

    #[test]
    fn request_never_serializes_id_token() {
        let request = ChatRequest::new("hi")
            .conversation_id("conv-1")
            .id_token("secret");
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("conv-1"));
    }

    #[test]
    fn request_debug_redacts_token() {
        let request = ChatRequest::new("hi").id_token("secret");
        let debug = format!("{:?}", request);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn minimal_response_parses() {
        let response: ChatResponse =
            serde_json::from_value(serde_json::json!({"response": "hello"})).unwrap();
        assert_eq!(response.response, "hello");
        assert!(response.tool_calls.is_empty());
        assert!(response.mcp_info.is_none());
        assert!(!response.token_exchanged());
    }

    #[test]
    fn full_response_parses() {
        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "response": "I found Alice Johnson's customer record...",
            "conversation_id": "conv-123",
            "tool_calls": [{
                "tool_name": "get_customer",
                "tool_input": {"name": "Alice Johnson"},
                "status": "completed",
                "risk_level": "low"
            }],
            "security_flow": {
                "token_exchanged": true,
                "target_audience": "mcp-server",
                "fga_check_result": "ALLOWED"
            },
            "audit_id": "audit-789",
            "mcp_info": {
                "id_jag_token": "a.b.c",
                "auth_server_token": "at",
                "scope": "mcp:read",
                "expires_in": 3600,
                "audience": "api://default"
            },
            "timestamp": "2025-01-01T00:00:00.000000"
        }))
        .unwrap();

        assert!(response.token_exchanged());
        assert_eq!(response.tool_calls[0].status, ToolCallStatus::Completed);
        assert_eq!(response.tool_calls[0].risk_level, RiskLevel::Low);
        let info = response.mcp_info.unwrap();
        assert_eq!(info.expires_in, Some(3600));
        assert_eq!(info.access_token(), Some("at"));
    }

    #[test]
    fn legacy_access_token_field_is_accepted() {
        let info: McpInfo = serde_json::from_value(serde_json::json!({
            "id_jag_token": "a.b.c",
            "mcp_access_token": "mcp_at_1"
        }))
        .unwrap();
        assert_eq!(info.access_token(), Some("mcp_at_1"));
    }

    #[test]
    fn both_access_token_names_in_one_payload() {
        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "response": "ok",
            "mcp_info": {
                "id_jag_token": "a.b.c",
                "auth_server_token": "at-current",
                "mcp_access_token": "at-legacy"
            }
        }))
        .unwrap();

        assert!(response.token_exchanged());
        let info = response.mcp_info.unwrap();
        assert_eq!(info.access_token(), Some("at-current"));
    }

    #[test]
    fn explicit_false_flag_overrides_mcp_info() {
        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "response": "no access",
            "mcp_info": {"id_jag_token": "a.b.c"},
            "security_flow": {"token_exchanged": false}
        }))
        .unwrap();
        assert!(!response.token_exchanged());
    }

    #[test]
    fn access_denied_is_case_insensitive() {
        let flow = SecurityFlow {
            fga_check_result: Some("DENIED".to_string()),
            ..Default::default()
        };
        assert!(flow.access_denied());

        let flow = SecurityFlow {
            fga_check_result: Some("ALLOWED".to_string()),
            ..Default::default()
        };
        assert!(!flow.access_denied());
        assert!(!SecurityFlow::default().access_denied());
    }

    #[test]
    fn requires_approval_status_parses() {
        let call: ToolCall = serde_json::from_value(serde_json::json!({
            "tool_name": "initiate_payment",
            "status": "requires_approval",
            "risk_level": "high",
            "requires_approval": true,
            "approval_reason": "Payment amount $15,000.00 exceeds threshold"
        }))
        .unwrap();
        assert_eq!(call.status, ToolCallStatus::RequiresApproval);
        assert!(call.requires_approval);
    }
}
