//! Authentication interface for the gateway.
//!
//! Maps a request's bearer token to the user id its chats are stored
//! under. Requests without a token act as [`ANONYMOUS`].

use axum::http::{HeaderMap, header};
use compact_str::CompactString;
use std::future::Future;

/// User id for requests without credentials.
pub const ANONYMOUS: &str = "anonymous";

/// Authentication context returned on successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// The user the token belongs to.
    pub user_id: CompactString,
}

impl AuthContext {
    /// The context for unauthenticated requests.
    pub fn anonymous() -> Self {
        Self {
            user_id: ANONYMOUS.into(),
        }
    }
}

/// Authentication error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The provided token is invalid or unknown.
    #[error("invalid or unknown token")]
    InvalidToken,
}

/// Trait for authenticating requests.
pub trait Authenticator: Send + Sync + 'static {
    /// Verify a token and return the authentication context.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<AuthContext, AuthError>> + Send;
}

/// The bearer token of a request, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
