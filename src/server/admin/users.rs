use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::server::response::{ApiError, ApiResponse, ApiResult};
use crate::types::Permission;
use crate::workflow::users::{self, NewUser, UserEdit};

fn parse_permissions(tags: &[String]) -> Result<Permission, ApiError> {
    Permission::parse_many(tags).ok_or_else(|| {
        ApiError::bad_request(format!("Unknown permission in [{}]", tags.join(", ")))
    })
}

pub async fn create_user(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let permissions = parse_permissions(&req.permissions)?;

    let user = users::add_user(
        state.store.as_ref(),
        state.credentials.as_ref(),
        &auth.user,
        NewUser {
            username: req.username.trim().to_string(),
            password: req.password,
            role: req.role,
            permissions: Some(permissions),
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserResponse::from(&user))),
    ))
}

pub async fn list_users(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let users = users::list_users(state.store.as_ref(), &auth.user)?;
    let responses: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(Json(ApiResponse::success(responses)))
}

pub async fn get_user(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = users::get_user(state.store.as_ref(), &auth.user, &id)?;
    Ok(Json(ApiResponse::success(UserResponse::from(&user))))
}

pub async fn update_user(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let permissions = parse_permissions(&req.permissions)?;

    let user = users::edit_user(
        state.store.as_ref(),
        &auth.user,
        &id,
        UserEdit {
            username: req.username.trim().to_string(),
            role: req.role,
            permissions,
        },
    )?;
    Ok(Json(ApiResponse::success(UserResponse::from(&user))))
}

pub async fn delete_user(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    users::delete_user(state.store.as_ref(), &auth.user, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
