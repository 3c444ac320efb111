//! API key authenticator implementation.
//!
//! Static lookup mapping API keys to user ids.

use crate::{
    auth::{AuthContext, AuthError, Authenticator},
    config::AuthConfig,
};
use compact_str::CompactString;
use std::collections::BTreeMap;

/// Authenticates requests via static API key lookup.
pub struct ApiKeyAuthenticator {
    /// Map from API key to user id.
    keys: BTreeMap<CompactString, CompactString>,
}

impl ApiKeyAuthenticator {
    /// Create from a map of key -> user id pairs.
    pub fn new(keys: BTreeMap<CompactString, CompactString>) -> Self {
        Self { keys }
    }

    /// Create from [`AuthConfig`].
    pub fn from_config(config: &AuthConfig) -> Self {
        let keys = config
            .api_keys
            .iter()
            .map(|(key, user)| (CompactString::new(key), CompactString::new(user)))
            .collect();
        Self { keys }
    }
}

impl Authenticator for ApiKeyAuthenticator {
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<AuthContext, AuthError>> + Send {
        let result = self
            .keys
            .get(token)
            .map(|user_id| AuthContext {
                user_id: user_id.clone(),
            })
            .ok_or(AuthError::InvalidToken);
        std::future::ready(result)
    }
}
