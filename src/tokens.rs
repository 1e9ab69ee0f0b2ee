//! Session token storage for `x-auth-token` authentication.
//!
//! Tokens are stored in memory and expire after a configurable time. Unlike
//! one-shot links they stay valid for repeated requests until they expire or
//! are revoked.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

#[derive(Debug, Clone)]
struct TokenData {
    claims: TokenClaims,
    expires_at: Instant,
}

/// In-memory token store with expiry.
///
/// Thread-safe via internal RwLock.
#[derive(Debug)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, TokenData>>,
    default_expiry: Duration,
}

impl TokenStore {
    /// Creates a new token store with the specified default expiry in minutes.
    pub fn new(expiry_minutes: u64) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            default_expiry: Duration::from_secs(expiry_minutes * 60),
        }
    }

    /// Issues a token for the given claims.
    ///
    /// Returns the token string (32 bytes, base64url encoded).
    pub fn issue(&self, claims: TokenClaims) -> String {
        self.issue_with_expiry(claims, self.default_expiry)
    }

    pub fn issue_with_expiry(&self, claims: TokenClaims, expiry: Duration) -> String {
        let token = generate_token();
        let data = TokenData {
            claims,
            expires_at: Instant::now() + expiry,
        };

        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), data);

        token
    }

    /// Returns the claims for a live token, or `None` if unknown or expired.
    pub fn resolve(&self, token: &str) -> Option<TokenClaims> {
        let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
        tokens
            .get(token)
            .filter(|data| Instant::now() < data.expires_at)
            .map(|data| data.claims.clone())
    }

    /// Revokes a token. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    /// Removes all expired tokens.
    ///
    /// Returns the number of tokens removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let before = tokens.len();
        tokens.retain(|_, data| data.expires_at > now);
        before - tokens.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(60 * 24)
    }
}

/// Generates a secure random token.
///
/// Returns 32 random bytes encoded as base64url (no padding).
fn generate_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
