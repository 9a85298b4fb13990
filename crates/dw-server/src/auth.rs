//! Bearer-token plumbing.
//!
//! Token issuance is someone else's job; this module only turns an already
//! issued opaque token into a caller identity, or `None` for anonymous
//! callers. Public demo endpoints skip it entirely.

use std::collections::HashMap;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// Maps an opaque bearer token to an owner identity.
pub trait TokenValidator: Send + Sync {
    /// Returns the owner for a valid token, `None` otherwise.
    fn validate(&self, token: &str) -> Option<String>;
}

/// Fixed token table, loaded at startup.
#[derive(Debug, Default, Clone)]
pub struct StaticTokens {
    tokens: HashMap<String, String>,
}

impl StaticTokens {
    /// Builds a validator from `(token, owner)` pairs.
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: pairs.into_iter().collect(),
        }
    }
}

impl TokenValidator for StaticTokens {
    fn validate(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }
}

/// Extracts the caller identity from the `Authorization` header.
///
/// Returns `None` for a missing header, a non-bearer scheme, or a token the
/// validator rejects.
#[must_use]
pub fn caller_identity(headers: &HeaderMap, validator: &dyn TokenValidator) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    validator.validate(token)
}
