//! Minimal HTTP client for the flowgate chat endpoint
//!
//! The chat backend receives a user message together with the caller's
//! identity token, performs the cross-app token exchange on the agent's
//! behalf, runs the assistant, and reports which tools ran and which
//! authorization checks passed.
//!
//! # Quick Start
//!
//! ```no_run
//! use flowgate_chat_sdk::{ChatClient, ChatRequest};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ChatClient::new("http://localhost:8000")?;
//!
//! let request = ChatRequest::new("Get customer information for Alice")
//!     .id_token("eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJ1MSJ9.sig");
//!
//! let response = client.send(&request).await?;
//! println!("{}", response.response);
//! if let Some(info) = &response.mcp_info {
//!     println!("scope: {:?}", info.scope);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```
//! use flowgate_chat_sdk::ChatClient;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ChatClient::builder()
//!     .base_url("https://agent.example.com")
//!     .chat_path("/api/chat/authenticated")
//!     .timeout(Duration::from_secs(10))
//!     .access_token("okta-access-token")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

pub mod chat;
mod client;
mod error;

// Client types
pub use client::{ChatClient, ChatClientBuilder, RawResponse, Response, ID_TOKEN_HEADER};

// Error types
pub use error::ChatApiError;

// Wire types
pub use chat::{
    ChatRequest, ChatResponse, ErrorDetail, McpInfo, RiskLevel, SecurityFlow, ToolCall,
    ToolCallStatus,
};
