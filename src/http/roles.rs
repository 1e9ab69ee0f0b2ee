use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use super::extract::JsonBody;
use super::AppState;
use crate::error::AppError;
use crate::models::{Role, RoleInput};
use crate::policy::Principal;

fn role_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("role"))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(state.roles.list().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Role>, AppError> {
    let id = role_id(&id)?;
    Ok(Json(state.roles.get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(input): JsonBody<RoleInput>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    let role = state
        .roles
        .create(input.title.as_deref(), &principal)
        .await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<RoleInput>,
) -> Result<Json<Role>, AppError> {
    let id = role_id(&id)?;
    let role = state
        .roles
        .rename(id, input.title.as_deref(), &principal)
        .await?;
    Ok(Json(role))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Role>, AppError> {
    let id = role_id(&id)?;
    Ok(Json(state.roles.delete(id, &principal).await?))
}
