use std::sync::Arc;

use crate::credentials::{hash_password, verify_password};
use crate::db::{RoleRepository, UserRepository};
use crate::error::AppError;
use crate::identity::IdentityStore;
use crate::models::{Credentials, NewUser, User};
use crate::policy::Principal;

const MIN_PASSWORD_LEN: usize = 8;

/// Registration, login and profile lookup.
pub struct UserService {
    users: UserRepository,
    roles: RoleRepository,
    identity: Arc<IdentityStore>,
}

impl UserService {
    pub fn new(users: UserRepository, roles: RoleRepository, identity: Arc<IdentityStore>) -> Self {
        Self {
            users,
            roles,
            identity,
        }
    }

    /// Registers a user and issues a token for them.
    ///
    /// Only an admin may register someone into the administrator role.
    pub async fn register(
        &self,
        input: NewUser,
        principal: &Principal,
    ) -> Result<(User, String), AppError> {
        validate(&input)?;

        if self.roles.find(input.role).await?.is_none() {
            return Err(AppError::validation("unknown role"));
        }
        if self.identity.is_admin_role(input.role).await? && !principal.is_admin() {
            return Err(AppError::forbidden(
                "only administrators may create administrator accounts",
            ));
        }
        if self.users.is_taken(&input.email, &input.user_name).await? {
            return Err(AppError::validation("email or user name already registered"));
        }

        let password = input.password.clone();
        let credential_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Unavailable(format!("password hashing task failed: {}", e)))?
            .map_err(|e| AppError::Unavailable(format!("password hashing failed: {}", e)))?;

        let user = self
            .users
            .create(&User {
                id: uuid::Uuid::new_v4(),
                name: input.name,
                email: input.email.trim().to_string(),
                user_name: input.user_name.trim().to_string(),
                credential_hash,
                role: input.role,
            })
            .await?;

        let token = self.identity.issue_token(user.id, user.role);
        tracing::info!(user_id = %user.id, "user registered");
        Ok((user, token))
    }

    pub async fn login(&self, credentials: Credentials) -> Result<String, AppError> {
        let invalid = || AppError::unauthorized("invalid email or password");

        let user = self
            .users
            .find_by_email(credentials.email.trim())
            .await?
            .ok_or_else(invalid)?;

        let password = credentials.password;
        let hash = user.credential_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Unavailable(format!("credential check task failed: {}", e)))?
            .map_err(|e| {
                tracing::warn!(user_id = %user.id, error = %e, "stored credential hash is malformed");
                invalid()
            })?;
        if !matches {
            return Err(invalid());
        }

        Ok(self.identity.issue_token(user.id, user.role))
    }

    pub async fn me(&self, principal: &Principal) -> Result<User, AppError> {
        let user_id = principal
            .user_id()
            .ok_or_else(|| AppError::unauthorized("authentication required"))?;
        self.users
            .find(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))
    }
}

fn validate(input: &NewUser) -> Result<(), AppError> {
    if input.name.first.trim().is_empty() || input.name.last.trim().is_empty() {
        return Err(AppError::validation("first and last name are required"));
    }
    if input.user_name.trim().is_empty() {
        return Err(AppError::validation("user name is required"));
    }
    if !input.email.contains('@') {
        return Err(AppError::validation("email is invalid"));
    }
    if input.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
