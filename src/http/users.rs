use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use super::auth::{auth_token, AUTH_HEADER};
use super::extract::JsonBody;
use super::AppState;
use crate::error::AppError;
use crate::models::{Credentials, NewUser, User};
use crate::policy::Principal;

#[derive(Serialize)]
pub struct RegisterResponse {
    user: User,
    token: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    token: String,
}

/// Registers a user. The token is returned in the body and in `x-auth-token`.
pub async fn register(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(input): JsonBody<NewUser>,
) -> Result<Response, AppError> {
    let (user, token) = state.users.register(input, &principal).await?;

    let mut response = (
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            token: token.clone(),
        }),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&token) {
        response.headers_mut().insert(AUTH_HEADER, value);
    }
    Ok(response)
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state.users.login(credentials).await?;
    Ok(Json(TokenResponse { token }))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = auth_token(&headers) {
        state.identity.revoke_token(token);
    }
    StatusCode::NO_CONTENT
}

pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.me(&principal).await?))
}
