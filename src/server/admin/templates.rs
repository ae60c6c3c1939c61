use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::CreateTemplateRequest;
use crate::server::form::MultipartForm;
use crate::server::response::{ApiError, ApiResponse, ApiResult};
use crate::workflow::templates;

pub async fn list_templates(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let templates = templates::list_templates(state.store.as_ref(), &auth.user)?;
    Ok(Json(ApiResponse::success(templates)))
}

pub async fn create_template(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTemplateRequest>,
) -> ApiResult<impl IntoResponse> {
    let template =
        templates::add_template(state.store.as_ref(), &auth.user, &req.name, &req.content)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(template))))
}

/// POST /admin/templates/import - Multipart `file`, optional `name`
pub async fn import_template(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = MultipartForm::read(&mut multipart, state.max_upload_bytes).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| ApiError::bad_request("file field is required"))?;

    // Without an explicit name the file stem is used.
    let name = match form.take_text("name").filter(|n| !n.trim().is_empty()) {
        Some(name) => name,
        None => file
            .file_name
            .rsplit_once('.')
            .map_or(file.file_name.as_str(), |(stem, _)| stem)
            .to_string(),
    };

    let template = templates::import_template(state.store.as_ref(), &auth.user, &name, file.data)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(template))))
}

pub async fn get_template(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let template = templates::get_template(state.store.as_ref(), &auth.user, &id)?;
    Ok(Json(ApiResponse::success(template)))
}

pub async fn delete_template(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    templates::delete_template(state.store.as_ref(), &auth.user, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
