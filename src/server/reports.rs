use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{SignatureRequest, UpdateReportRequest};
use crate::server::form::MultipartForm;
use crate::server::response::{ApiResponse, ApiResult};
use crate::workflow::reports::{self, ImageUpload, NewReport, ReportEdit};

/// GET /reports - The caller's own reports
pub async fn list_reports(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let reports = reports::list_own(state.store.as_ref(), &auth.user)?;
    Ok(Json(ApiResponse::success(reports)))
}

/// GET /reports/inbox - Pending reports for the commander
pub async fn inbox(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let reports = reports::list_inbox(state.store.as_ref(), &auth.user)?;
    Ok(Json(ApiResponse::success(reports)))
}

/// POST /reports - File a new report (multipart)
pub async fn create_report(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = MultipartForm::read(&mut multipart, state.max_upload_bytes).await?;

    let new = NewReport {
        title: form.require_text("title")?,
        accepted_violations: form.require_text("accepted_violations")?,
        rejected_violations: form.require_text("rejected_violations")?,
        image: form.take_file("image").map(|file| ImageUpload {
            file_name: file.file_name,
            data: file.data,
        }),
        signature: form.take_text("signature"),
    };

    let report = reports::create(state.store.as_ref(), &state.attachments, &auth.user, new).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(report))))
}

/// GET /reports/{id} - Detail view for the author or the commander
pub async fn get_report(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let view = reports::view(state.store.as_ref(), &auth.user, &id)?;
    Ok(Json(ApiResponse::success(view)))
}

/// PATCH /reports/{id}
pub async fn update_report(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateReportRequest>,
) -> ApiResult<impl IntoResponse> {
    let report = reports::edit(
        state.store.as_ref(),
        &auth.user,
        &id,
        ReportEdit {
            title: req.title,
            content: req.content,
            date: req.date,
        },
    )?;
    Ok(Json(ApiResponse::success(report)))
}

/// DELETE /reports/{id}
pub async fn delete_report(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    reports::delete(state.store.as_ref(), &auth.user, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /reports/{id}/print - Report plus print settings
pub async fn print_report(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let context = reports::print(state.store.as_ref(), &auth.user, &id)?;
    Ok(Json(ApiResponse::success(context)))
}

pub async fn accept_report(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let report = reports::accept(state.store.as_ref(), &auth.user, &id)?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn reject_report(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let report = reports::reject(state.store.as_ref(), &auth.user, &id)?;
    Ok(Json(ApiResponse::success(report)))
}

/// POST /reports/{id}/signature - Commander countersignature
pub async fn sign_report(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SignatureRequest>,
) -> ApiResult<impl IntoResponse> {
    let report = reports::attach_signature(
        state.store.as_ref(),
        &state.attachments,
        &auth.user,
        &id,
        &req.signature,
    )
    .await?;
    Ok(Json(ApiResponse::success(report)))
}
