//! Offline collaborator for demos and tests.
//!
//! Mints display-only tokens derived from a SHA-256 seed and applies a few
//! fixed policy rules, so the whole flow can be exercised without a backend.

use std::time::Duration;

use serde_json::json;
use sha2::{Digest, Sha256};

use super::{ChatCollaborator, ChatReply, ChatTurn, CollaboratorError, ToolInvocation, ToolStatus};
use crate::classifier::{classify, OperationKind};
use crate::codec;
use crate::tokens::ExchangeResult;

/// Resource the simulated exchange targets
pub const DEFAULT_RESOURCE: &str = "mcp-server";

/// Scope granted by the simulated authorization server
pub const SIMULATED_SCOPE: &str = "read write mcp:tools";

/// Payments above this amount need human approval
pub const APPROVAL_THRESHOLD: f64 = 10_000.0;

const TOKEN_LIFETIME_SECS: i64 = 3600;
const AGENT_ID: &str = "flowgate-agent";

/// Collaborator that answers locally
#[derive(Debug, Clone)]
pub struct SimulatedCollaborator {
    resource: String,
    latency: Duration,
    issued_at: Option<i64>,
}

impl Default for SimulatedCollaborator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCollaborator {
    pub fn new() -> Self {
        Self {
            resource: DEFAULT_RESOURCE.to_string(),
            latency: Duration::ZERO,
            issued_at: None,
        }
    }

    /// Target resource (becomes the delegation token's `aud`)
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Delay every reply, to mimic a network round trip
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Pin the issue time, making minted tokens reproducible
    pub fn issued_at(mut self, unix_seconds: i64) -> Self {
        self.issued_at = Some(unix_seconds);
        self
    }

    fn exchange(&self, identity_token: &str) -> ExchangeResult {
        let iat = self
            .issued_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp());
        let prefix: String = identity_token.chars().take(20).collect();
        let seed = format!("{}:{}:{}", prefix, self.resource, iat);
        let hash = format!("{:x}", Sha256::digest(seed.as_bytes()));

        let subject = codec::claim_str(&codec::decode(identity_token), "sub")
            .unwrap_or("demo-user")
            .to_string();
        let id_jag = codec::encode_unsigned(
            &json!({"alg": "RS256", "typ": "oauth-id-jag+jwt"}),
            &json!({
                "sub": subject,
                "aud": self.resource,
                "scope": SIMULATED_SCOPE,
                "iat": iat,
                "exp": iat + TOKEN_LIFETIME_SECS,
                "act": {"sub": AGENT_ID},
            }),
            &format!("{}_simulated", &hash[32..]),
        );

        ExchangeResult {
            delegation_token: Some(id_jag),
            access_token: Some(format!("mcp_at_{}_simulated", &hash[..32])),
            scope: Some(SIMULATED_SCOPE.to_string()),
            audience: Some(format!("api://{}", self.resource)),
            expires_in: Some(TOKEN_LIFETIME_SECS),
        }
    }
}

#[async_trait::async_trait]
impl ChatCollaborator for SimulatedCollaborator {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn send(&self, turn: ChatTurn) -> Result<ChatReply, CollaboratorError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let conversation_id = turn
            .conversation_id
            .clone()
            .unwrap_or_else(|| format!("conv_{}", uuid::Uuid::new_v4().simple()));

        let Some(identity_token) = turn.identity_token.as_deref() else {
            log::info!("simulated exchange skipped: no identity token");
            let mut reply = ChatReply::text(
                "I can't call any tools without a signed-in user. Please log in and try again.",
            )
            .with_conversation_id(conversation_id);
            reply.token_exchanged = false;
            return Ok(reply);
        };

        let exchange = self.exchange(identity_token);
        log::info!("simulated exchange for resource: {}", self.resource);

        let kind = classify(&turn.message);
        let lowered = turn.message.to_lowercase();
        let mut call = ToolInvocation::new(kind.tool_label(), ToolStatus::Completed);
        let mut denied = false;

        let text = match kind {
            OperationKind::Lookup if lowered.contains("charlie") => {
                call.status = ToolStatus::Denied;
                denied = true;
                "Access to that customer record was denied by the fine-grained authorization check."
                    .to_string()
            }
            OperationKind::Lookup => {
                "Here is the customer record you asked for. It was retrieved with a scoped access token issued on your behalf."
                    .to_string()
            }
            OperationKind::Payment => match first_amount(&turn.message) {
                Some(amount) if amount > APPROVAL_THRESHOLD => {
                    let reason = format!("Payment amount ${} exceeds threshold", format_amount(amount));
                    call.status = ToolStatus::RequiresApproval;
                    call.requires_approval = true;
                    call.approval_reason = Some(reason.clone());
                    format!("{}. The payment is waiting for your approval.", reason)
                }
                Some(amount) => format!("Payment of ${} initiated.", format_amount(amount)),
                None => "Payment initiated.".to_string(),
            },
            OperationKind::Search => {
                "I found matching documents in the knowledge base.".to_string()
            }
        };

        let mut reply = ChatReply::text(text)
            .with_conversation_id(conversation_id)
            .with_exchange(exchange)
            .with_tool_call(call);
        if denied {
            reply = reply.denied();
        }
        reply.audit_id = Some(uuid::Uuid::new_v4().to_string());
        Ok(reply)
    }
}

/// First number in `text`, ignoring `$` and thousands separators
fn first_amount(text: &str) -> Option<f64> {
    text.split_whitespace()
        .map(|word| {
            word.trim_start_matches('$')
                .trim_end_matches(|c: char| !c.is_ascii_digit())
                .replace(',', "")
        })
        .find_map(|word| word.parse::<f64>().ok())
}

/// `15000.0` -> `15,000.00`
fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount);
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let (sign, whole) = match whole.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", whole),
    };
    let mut grouped = String::from(sign);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}.{}", grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_token() -> String {
        codec::encode_unsigned(&json!({"alg": "RS256"}), &json!({"sub": "alice"}), "sig")
    }

    fn collaborator() -> SimulatedCollaborator {
        SimulatedCollaborator::new().issued_at(1_700_000_000)
    }

    async fn send(text: &str) -> ChatReply {
        collaborator()
            .send(ChatTurn::new(text).identity_token(id_token()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_lookup_exchanges_tokens() {
        let reply = send("Get customer information for Alice").await;

        assert!(reply.exchange_performed());
        assert!(!reply.access_denied);
        assert_eq!(reply.first_tool(), Some("get_customer"));
        assert_eq!(reply.tool_calls[0].status, ToolStatus::Completed);

        let exchange = reply.exchange.unwrap();
        let access = exchange.access_token.unwrap();
        assert!(access.starts_with("mcp_at_") && access.ends_with("_simulated"));
        assert_eq!(exchange.scope.as_deref(), Some(SIMULATED_SCOPE));
        assert_eq!(exchange.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn test_delegation_token_is_decodable() {
        let reply = send("Get customer information for Alice").await;
        let jag = reply.exchange.unwrap().delegation_token.unwrap();

        let claims = codec::decode(&jag);
        assert_eq!(codec::claim_str(&claims, "sub"), Some("alice"));
        assert_eq!(codec::claim_str(&claims, "aud"), Some(DEFAULT_RESOURCE));
        assert_eq!(codec::claim_i64(&claims, "exp"), Some(1_700_003_600));
        assert_eq!(claims["act"]["sub"], AGENT_ID);
    }

    #[tokio::test]
    async fn test_tokens_are_deterministic_for_fixed_time() {
        let a = send("Get customer information for Alice").await;
        let b = send("Get customer information for Alice").await;
        assert_eq!(a.exchange, b.exchange);
    }

    #[tokio::test]
    async fn test_charlie_is_denied() {
        let reply = send("Get customer information for Charlie").await;
        assert!(reply.access_denied);
        assert_eq!(reply.tool_calls[0].status, ToolStatus::Denied);
        assert!(reply.exchange_performed());
    }

    #[tokio::test]
    async fn test_large_payment_requires_approval() {
        let reply = send("Initiate a payment of $15,000 to Bob").await;
        let call = &reply.tool_calls[0];
        assert_eq!(call.name, "initiate_payment");
        assert_eq!(call.status, ToolStatus::RequiresApproval);
        assert!(call.requires_approval);
        assert_eq!(
            call.approval_reason.as_deref(),
            Some("Payment amount $15,000.00 exceeds threshold")
        );
    }

    #[tokio::test]
    async fn test_small_payment_completes() {
        let reply = send("Pay $250 to Bob").await;
        assert_eq!(reply.tool_calls[0].status, ToolStatus::Completed);
        assert!(reply.text.contains("$250.00"));
    }

    #[tokio::test]
    async fn test_negative_payment_amount_keeps_sign_outside_grouping() {
        let reply = send("Refund $-1500 to Bob").await;
        assert!(reply.text.contains("$-1,500.00"), "got {:?}", reply.text);
    }

    #[tokio::test]
    async fn test_no_identity_means_no_exchange() {
        let reply = collaborator()
            .send(ChatTurn::new("Get customer information for Alice"))
            .await
            .unwrap();
        assert!(!reply.token_exchanged);
        assert!(reply.exchange.is_none());
        assert!(reply.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_conversation_id_is_kept() {
        let reply = collaborator()
            .send(
                ChatTurn::new("search docs")
                    .identity_token(id_token())
                    .conversation_id("conv-42"),
            )
            .await
            .unwrap();
        assert_eq!(reply.conversation_id.as_deref(), Some("conv-42"));

        let fresh = send("search docs").await;
        assert!(fresh.conversation_id.unwrap().starts_with("conv_"));
    }

    #[test]
    fn test_first_amount() {
        assert_eq!(first_amount("pay $15000 to Bob"), Some(15000.0));
        assert_eq!(first_amount("pay $1,250.50."), Some(1250.5));
        assert_eq!(first_amount("pay Bob"), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(15000.0), "15,000.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1234567.0), "1,234,567.00");
        assert_eq!(format_amount(-100.0), "-100.00");
        assert_eq!(format_amount(-15000.0), "-15,000.00");
    }
}
