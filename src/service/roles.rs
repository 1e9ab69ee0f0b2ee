use uuid::Uuid;

use crate::db::RoleRepository;
use crate::error::AppError;
use crate::models::Role;
use crate::policy::{decide, Action, Principal};

/// Role management. Every mutation is admin-only.
pub struct RoleService {
    roles: RoleRepository,
    admin_role: String,
}

impl RoleService {
    pub fn new(roles: RoleRepository, admin_role: impl Into<String>) -> Self {
        Self {
            roles,
            admin_role: admin_role.into(),
        }
    }

    pub async fn create(
        &self,
        title: Option<&str>,
        principal: &Principal,
    ) -> Result<Role, AppError> {
        decide(principal, None, Action::ManageRoles).into_result(Action::ManageRoles)?;
        let title = self.validate_unique_title(title).await?;

        let role = self.roles.create(&Role::new(title)).await?;
        tracing::info!(role_id = %role.id, title = %role.title, "role created");
        Ok(role)
    }

    pub async fn list(&self) -> Result<Vec<Role>, AppError> {
        Ok(self.roles.list().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Role, AppError> {
        self.roles
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("role"))
    }

    pub async fn rename(
        &self,
        id: Uuid,
        title: Option<&str>,
        principal: &Principal,
    ) -> Result<Role, AppError> {
        decide(principal, None, Action::ManageRoles).into_result(Action::ManageRoles)?;
        let existing = self.get(id).await?;
        self.guard_admin_role(&existing)?;

        let title = self.validate_unique_title(title).await?;
        let role = self.roles.rename(id, &title).await?;
        tracing::info!(role_id = %id, title = %role.title, "role renamed");
        Ok(role)
    }

    pub async fn delete(&self, id: Uuid, principal: &Principal) -> Result<Role, AppError> {
        decide(principal, None, Action::ManageRoles).into_result(Action::ManageRoles)?;
        let existing = self.get(id).await?;
        self.guard_admin_role(&existing)?;

        if self.roles.member_count(id).await? > 0 {
            return Err(AppError::validation("role is still assigned to users"));
        }

        let role = self.roles.delete(id).await?;
        tracing::info!(role_id = %id, title = %role.title, "role deleted");
        Ok(role)
    }

    async fn validate_unique_title(&self, title: Option<&str>) -> Result<String, AppError> {
        let title = title.map(str::trim).unwrap_or_default();
        if title.is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if self.roles.find_by_title(title).await?.is_some() {
            return Err(AppError::validation(format!(
                "a role titled '{}' already exists",
                title
            )));
        }
        Ok(title.to_string())
    }

    /// The administrator role anchors admin detection and cannot be changed.
    fn guard_admin_role(&self, role: &Role) -> Result<(), AppError> {
        if role.title == self.admin_role {
            return Err(AppError::validation(
                "the administrator role cannot be renamed or deleted",
            ));
        }
        Ok(())
    }
}
