use axum::{Json, response::IntoResponse};

use crate::auth::RequireUser;
use crate::server::dto::DraftRequest;
use crate::server::response::{ApiResponse, ApiResult};
use crate::workflow::editor;

/// POST /editor/draft - Echo a draft back for rendering
pub async fn draft(auth: RequireUser, Json(req): Json<DraftRequest>) -> ApiResult<impl IntoResponse> {
    let draft = editor::draft(&auth.user, &req.title, &req.content)?;
    Ok(Json(ApiResponse::success(draft)))
}
