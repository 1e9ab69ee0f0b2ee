use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use super::extract::JsonBody;
use super::AppState;
use crate::error::AppError;
use crate::models::{Document, DocumentPatch, NewDocument};
use crate::policy::Principal;

/// Ids that do not parse cannot exist.
fn document_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("document"))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Document>>, AppError> {
    Ok(Json(state.documents.list(&principal).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(input): JsonBody<NewDocument>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let document = state.documents.create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let id = document_id(&id)?;
    Ok(Json(state.documents.read(id, &principal).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<DocumentPatch>,
) -> Result<Json<Document>, AppError> {
    let id = document_id(&id)?;
    Ok(Json(state.documents.update(id, &principal, patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let id = document_id(&id)?;
    Ok(Json(state.documents.delete(id, &principal).await?))
}
