//! Identity and delegation token storage.
//!
//! The store holds the user's identity token for the lifetime of a session
//! and the delegation/access pair produced by the most recent completed
//! exchange. The pair is always replaced wholesale.

use serde::Serialize;

use crate::codec::{self, Claims};

/// Audience used when the collaborator does not report one
pub const DEFAULT_AUDIENCE: &str = "api://default";

/// Lifetime used when the collaborator does not report one
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Token asserting who the human user is, obtained at login.
#[derive(Clone, PartialEq, Serialize)]
pub struct IdentityToken {
    pub raw: String,
    pub claims: Claims,
}

impl IdentityToken {
    /// Decode a raw identity token. Malformed tokens keep an empty claim set.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let claims = codec::decode(&raw);
        Self { raw, claims }
    }

    /// The `sub` claim, if present
    pub fn subject(&self) -> Option<&str> {
        codec::claim_str(&self.claims, "sub")
    }
}

/// Intermediate grant allowing the agent to act under the user's identity.
#[derive(Clone, PartialEq, Serialize)]
pub struct DelegationToken {
    pub raw: String,
    pub claims: Claims,
}

impl DelegationToken {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let claims = codec::decode(&raw);
        Self { raw, claims }
    }
}

/// Short-lived token with a narrow scope/audience for one tool call.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ScopedAccessToken {
    pub raw: String,
    pub scope: String,
    pub audience: String,
    pub expires_in_seconds: i64,
}

// Raw token strings stay out of Debug output so they never reach logs.
macro_rules! redacted_debug {
    ($ty:ident, $($field:ident),*) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("raw", &format_args!("[{} bytes]", self.raw.len()))
                    $(.field(stringify!($field), &self.$field))*
                    .finish()
            }
        }
    };
}

redacted_debug!(IdentityToken, claims);
redacted_debug!(DelegationToken, claims);
redacted_debug!(ScopedAccessToken, scope, audience, expires_in_seconds);

/// Current token state of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBundle {
    pub identity: IdentityToken,
    pub delegation: Option<DelegationToken>,
    pub access: Option<ScopedAccessToken>,
}

/// Fields reported by the collaborator for a completed exchange.
///
/// All fields are optional; see [`TokenStore::apply_exchange_result`] for the
/// defaults applied when a delegation token is present.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ExchangeResult {
    pub delegation_token: Option<String>,
    pub access_token: Option<String>,
    pub scope: Option<String>,
    pub audience: Option<String>,
    pub expires_in: Option<i64>,
}

impl std::fmt::Debug for ExchangeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeResult")
            .field("delegation_token", &self.delegation_token.is_some())
            .field("access_token", &self.access_token.is_some())
            .field("scope", &self.scope)
            .field("audience", &self.audience)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl ExchangeResult {
    /// An exchange that produced nothing
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_performed(&self) -> bool {
        self.delegation_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Holds the identity token and the latest delegation/access pair.
///
/// Never performs I/O; all side effects stay inside its own fields.
#[derive(Debug, Clone)]
pub struct TokenStore {
    bundle: Option<TokenBundle>,
    default_scope: String,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new("")
    }
}

impl TokenStore {
    /// Create an empty store. `default_scope` fills in a missing scope on
    /// exchange results.
    pub fn new(default_scope: impl Into<String>) -> Self {
        Self {
            bundle: None,
            default_scope: default_scope.into(),
        }
    }

    /// Decode and store a new identity token, clearing any delegation and
    /// access tokens from a previous session.
    pub fn initialize(&mut self, identity_token: &str) {
        let identity = IdentityToken::new(identity_token);
        log::debug!(
            "identity token stored ({} bytes, {} claims, sub={:?})",
            identity.raw.len(),
            identity.claims.len(),
            identity.subject()
        );
        self.bundle = Some(TokenBundle {
            identity,
            delegation: None,
            access: None,
        });
    }

    /// Merge the result of an exchange.
    ///
    /// With a delegation token present, both delegation and access tokens are
    /// replaced. Without one, both are cleared. The identity token is never
    /// touched. Without a session this is a no-op.
    pub fn apply_exchange_result(&mut self, result: ExchangeResult) {
        let Some(current) = self.bundle.as_ref() else {
            log::warn!("exchange result ignored: no identity token held");
            return;
        };

        let (delegation, access) = match result.delegation_token.filter(|t| !t.is_empty()) {
            Some(raw) => {
                let access = ScopedAccessToken {
                    raw: result.access_token.unwrap_or_default(),
                    scope: result
                        .scope
                        .unwrap_or_else(|| self.default_scope.clone()),
                    audience: result
                        .audience
                        .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
                    expires_in_seconds: result.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
                };
                (Some(DelegationToken::new(raw)), Some(access))
            }
            None => (None, None),
        };

        self.bundle = Some(TokenBundle {
            identity: current.identity.clone(),
            delegation,
            access,
        });
    }

    /// Snapshot of the current bundle, `None` before login
    pub fn current(&self) -> Option<TokenBundle> {
        self.bundle.clone()
    }

    /// Raw identity token, for forwarding to the collaborator
    pub fn identity_raw(&self) -> Option<&str> {
        self.bundle.as_ref().map(|b| b.identity.raw.as_str())
    }

    pub fn has_identity(&self) -> bool {
        self.bundle.is_some()
    }

    /// Drop all tokens (logout)
    pub fn clear(&mut self) {
        self.bundle = None;
    }
}
