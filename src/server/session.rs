use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::{RequireUser, issue_session};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{CredentialsRequest, LoginResponse, MeResponse, UserResponse};
use crate::server::response::{ApiResponse, ApiResult};
use crate::workflow::{access::is_commander, settings::get_settings, users};

/// POST /auth/login - Exchange credentials for a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = users::find_by_credentials(
        state.store.as_ref(),
        state.credentials.as_ref(),
        &req.username,
        &req.password,
    )?;

    let Some(user) = user else {
        tracing::warn!(username = %req.username, "Failed login attempt");
        return Err(Error::Unauthorized.into());
    };

    let token = issue_session(&state, &user)?;
    tracing::info!(user = %user.username, "User logged in");

    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        user: UserResponse::from(&user),
    })))
}

/// POST /auth/register - Self-service signup, logged in immediately
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = users::register(
        state.store.as_ref(),
        state.credentials.as_ref(),
        req.username.trim(),
        &req.password,
    )?;
    let token = issue_session(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(LoginResponse {
            token,
            user: UserResponse::from(&user),
        })),
    ))
}

/// POST /auth/logout - Revoke the presented session
pub async fn logout(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    state.store.delete_session(&auth.session.id)?;
    tracing::info!(user = %auth.user.username, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /me
pub async fn me(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let settings = get_settings(state.store.as_ref())?;

    Ok(Json(ApiResponse::success(MeResponse {
        user: UserResponse::from(&auth.user),
        is_commander: is_commander(&auth.user, &settings),
    })))
}
