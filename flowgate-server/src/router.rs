//! Router builder for flowgate HTTP endpoints.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use flowgate_core::Orchestrator;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::BuildError;
use crate::handlers;
use crate::state::AppState;

/// Prefix the API is mounted under unless [`FlowgateRouter::with_api`] says otherwise
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Builder for configuring flowgate HTTP endpoints.
///
/// Routes, relative to the API prefix:
///
/// | Method | Path          | Body              | Reply                 |
/// |--------|---------------|-------------------|-----------------------|
/// | POST   | `/session`    | `{"id_token"}`    | 204                   |
/// | DELETE | `/session`    |                   | 204                   |
/// | POST   | `/chat`       | `{"message"}`     | `{report, snapshot}`  |
/// | GET    | `/state`      |                   | snapshot              |
/// | POST   | `/flow/reset` |                   | 204                   |
///
/// # Example
///
/// ```rust,no_run
/// use flowgate_core::{FlowConfig, Orchestrator, SimulatedCollaborator};
/// use flowgate_server::FlowgateRouter;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let orchestrator = Orchestrator::new(SimulatedCollaborator::new(), FlowConfig::default());
/// let app = FlowgateRouter::new(orchestrator)
///     .with_api("/v1")
///     .with_cors_origins(["http://localhost:3000"])
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct FlowgateRouter {
    orchestrator: Arc<Orchestrator>,
    api_prefix: String,
    cors_origins: Vec<String>,
}

impl FlowgateRouter {
    /// Create a new router builder with the given orchestrator.
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self::from_arc(Arc::new(orchestrator))
    }

    /// Create a new router builder from an existing `Arc<Orchestrator>`.
    ///
    /// Use this when other parts of the application also drive the session.
    pub fn from_arc(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            cors_origins: Vec::new(),
        }
    }

    /// Mount the API under `prefix` instead of `/api`. `"/"` mounts it at
    /// the root.
    pub fn with_api(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Allow cross-origin requests from these origins.
    ///
    /// Without any, no CORS headers are sent.
    pub fn with_cors_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cors_origins.extend(origins.into_iter().map(Into::into));
        self
    }

    /// Build the router with all configured endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidPrefix`] if the prefix does not start
    /// with `/`, and [`BuildError::InvalidOrigin`] for an unusable origin.
    pub fn build(self) -> Result<Router, BuildError> {
        if !self.api_prefix.starts_with('/') {
            return Err(BuildError::InvalidPrefix(self.api_prefix));
        }
        let prefix = self.api_prefix.trim_end_matches('/');
        let path = |route: &str| format!("{}{}", prefix, route);

        let cors = cors_layer(&self.cors_origins)?;
        let state = AppState::from_arc(self.orchestrator);

        let router = Router::new()
            .route(
                &path("/session"),
                post(handlers::login).delete(handlers::logout),
            )
            .route(&path("/chat"), post(handlers::chat))
            .route(&path("/state"), get(handlers::snapshot))
            .route(&path("/flow/reset"), post(handlers::reset_flow))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

        Ok(match cors {
            Some(cors) => router.layer(cors),
            None => router,
        })
    }

    /// Build the router and nest it under a prefix path.
    ///
    /// This is useful when integrating with an existing application router.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_nested(self, prefix: impl Into<String>) -> Result<Router, BuildError> {
        Ok(Router::new().nest(&prefix.into(), self.build()?))
    }
}

fn cors_layer(origins: &[String]) -> Result<Option<CorsLayer>, BuildError> {
    if origins.is_empty() {
        return Ok(None);
    }

    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| BuildError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
    ))
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
