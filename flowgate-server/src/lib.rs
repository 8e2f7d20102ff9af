//! HTTP display surface for flowgate.
//!
//! Serves one [`Orchestrator`](flowgate_core::Orchestrator) over JSON: sign
//! in with an identity token, submit chat messages, and read back the token
//! bundle, flow steps and chat log as a single snapshot. A browser front end
//! polls `GET /api/state` to animate the flow while the sequencer advances.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowgate_core::{FlowConfig, Orchestrator, SimulatedCollaborator};
//! use flowgate_server::FlowgateRouter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::new(SimulatedCollaborator::new(), FlowConfig::from_env()?);
//!
//! let app = FlowgateRouter::new(orchestrator)
//!     .with_cors_origins(["http://localhost:3000"])
//!     .build()?;
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod router;
pub(crate) mod state;

// Re-exports
pub use error::{BuildError, ServerError, ServerResult};
pub use handlers::{ChatRequest, ChatResponse, LoginRequest};
pub use router::{FlowgateRouter, DEFAULT_API_PREFIX};
