//! HTTP chat endpoint collaborator

use flowgate_chat_sdk::{
    ChatApiError, ChatClient, ChatRequest, ChatResponse, McpInfo, RiskLevel as WireRiskLevel,
    ToolCall, ToolCallStatus,
};

use super::{ChatCollaborator, ChatReply, ChatTurn, CollaboratorError, ToolInvocation, ToolStatus};
use crate::classifier::RiskLevel;
use crate::tokens::ExchangeResult;

// ===== Error Classification =====

impl From<ChatApiError> for CollaboratorError {
    fn from(err: ChatApiError) -> Self {
        let code = err.status_code();
        match err {
            ChatApiError::Authentication(msg) | ChatApiError::Forbidden(msg) => {
                CollaboratorError::Unauthorized(msg)
            }
            ChatApiError::RateLimited(msg) => CollaboratorError::Status {
                code: code.unwrap_or(429),
                message: msg,
            },
            ChatApiError::ServiceUnavailable { status, message }
            | ChatApiError::InvalidRequest { status, message } => CollaboratorError::Status {
                code: status,
                message,
            },
            ChatApiError::InvalidResponse(msg) => CollaboratorError::InvalidResponse(msg),
            ChatApiError::Network(msg) => CollaboratorError::Network(msg),
            ChatApiError::Configuration(msg) => CollaboratorError::Configuration(msg),
            ChatApiError::Other(msg) => CollaboratorError::Other(msg),
        }
    }
}

// ===== Conversion =====

fn from_mcp_info(info: McpInfo) -> ExchangeResult {
    ExchangeResult {
        delegation_token: info.id_jag_token,
        access_token: info.auth_server_token.or(info.mcp_access_token),
        scope: info.scope,
        audience: info.audience,
        expires_in: info.expires_in,
    }
}

fn from_tool_call(call: ToolCall) -> ToolInvocation {
    let status = match call.status {
        ToolCallStatus::Pending => ToolStatus::Pending,
        ToolCallStatus::Allowed => ToolStatus::Allowed,
        ToolCallStatus::Denied => ToolStatus::Denied,
        ToolCallStatus::RequiresApproval => ToolStatus::RequiresApproval,
        ToolCallStatus::Completed => ToolStatus::Completed,
        ToolCallStatus::Failed => ToolStatus::Failed,
    };
    let risk = match call.risk_level {
        WireRiskLevel::Low => RiskLevel::Low,
        WireRiskLevel::Medium => RiskLevel::Medium,
        WireRiskLevel::High => RiskLevel::High,
        WireRiskLevel::Critical => RiskLevel::Critical,
    };

    ToolInvocation {
        name: call.tool_name,
        status,
        risk,
        requires_approval: call.requires_approval,
        approval_reason: call.approval_reason,
    }
}

pub(crate) fn from_chat_response(response: ChatResponse) -> ChatReply {
    // Without a security_flow block the presence of mcp_info is the signal
    let token_exchanged = response
        .security_flow
        .as_ref()
        .map(|flow| flow.token_exchanged)
        .unwrap_or(true);
    let access_denied = response
        .security_flow
        .as_ref()
        .is_some_and(|flow| flow.access_denied());

    ChatReply {
        text: response.response,
        conversation_id: response.conversation_id,
        exchange: response.mcp_info.map(from_mcp_info),
        token_exchanged,
        access_denied,
        tool_calls: response.tool_calls.into_iter().map(from_tool_call).collect(),
        audit_id: response.audit_id,
    }
}

// ===== HttpCollaborator =====

/// Collaborator backed by the chat HTTP endpoint
///
/// ```no_run
/// use flowgate_core::{HttpCollaborator, FlowConfig, Orchestrator};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let collaborator = HttpCollaborator::new("http://localhost:8000")?;
/// let orchestrator = Orchestrator::new(collaborator, FlowConfig::default());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    client: ChatClient,
    name: String,
}

impl HttpCollaborator {
    /// Create a collaborator for the endpoint at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, CollaboratorError> {
        let client = ChatClient::new(base_url)?;
        Ok(Self::with_client(client))
    }

    /// Create a collaborator from `FLOWGATE_API_URL` and friends
    pub fn from_env() -> Result<Self, CollaboratorError> {
        let client = ChatClient::from_env()?;
        Ok(Self::with_client(client))
    }

    /// Wrap a preconfigured client
    pub fn with_client(client: ChatClient) -> Self {
        let name = format!("chat api ({})", client.base_url());
        Self { client, name }
    }
}

#[async_trait::async_trait]
impl ChatCollaborator for HttpCollaborator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, turn: ChatTurn) -> Result<ChatReply, CollaboratorError> {
        let mut request = ChatRequest::new(turn.message);
        if let Some(id) = turn.conversation_id {
            request = request.conversation_id(id);
        }
        if let Some(token) = turn.identity_token {
            request = request.id_token(token);
        }

        let response = self.client.send(&request).await?;
        log::debug!(
            "chat api replied: {} tool calls, mcp_info={}",
            response.tool_calls.len(),
            response.mcp_info.is_some()
        );
        Ok(from_chat_response(response))
    }
}
