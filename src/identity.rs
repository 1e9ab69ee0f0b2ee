//! Identity store: turns an `x-auth-token` value into a [`Principal`].

use uuid::Uuid;

use crate::db::RoleRepository;
use crate::error::AppError;
use crate::policy::Principal;
use crate::tokens::{TokenClaims, TokenStore};

pub struct IdentityStore {
    tokens: TokenStore,
    roles: RoleRepository,
    admin_role: String,
}

impl IdentityStore {
    pub fn new(tokens: TokenStore, roles: RoleRepository, admin_role: impl Into<String>) -> Self {
        Self {
            tokens,
            roles,
            admin_role: admin_role.into(),
        }
    }

    pub fn issue_token(&self, user_id: Uuid, role_id: Uuid) -> String {
        self.tokens.issue(TokenClaims { user_id, role_id })
    }

    pub fn revoke_token(&self, token: &str) -> bool {
        self.tokens.revoke(token)
    }

    pub fn cleanup_expired_tokens(&self) -> usize {
        self.tokens.cleanup_expired()
    }

    /// Resolves a credential. No credential means an anonymous principal.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Principal, AppError> {
        let Some(token) = token else {
            return Ok(Principal::Anonymous);
        };

        let claims = self
            .tokens
            .resolve(token)
            .ok_or_else(|| AppError::unauthorized("invalid or expired token"))?;

        let is_admin = self.is_admin_role(claims.role_id).await?;
        Ok(Principal::user(claims.user_id, claims.role_id, is_admin))
    }

    /// True if the role exists and carries the administrator title.
    pub async fn is_admin_role(&self, role_id: Uuid) -> Result<bool, AppError> {
        let role = self.roles.find(role_id).await?;
        Ok(role.is_some_and(|r| r.title == self.admin_role))
    }
}
