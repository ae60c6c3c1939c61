use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::form::MultipartForm;
use crate::server::response::{ApiError, ApiResponse, ApiResult};
use crate::types::{Permission, SettingsUpdate};
use crate::workflow::{access::require_permission, settings};

fn update_from_form(form: &mut MultipartForm) -> Result<SettingsUpdate, ApiError> {
    Ok(SettingsUpdate {
        header_text: form.take_text("header_text"),
        commander_name: form.take_text("commander_name"),
        paper_size: form.take_text("paper_size"),
        margin_top: form.parse("margin_top")?,
        margin_bottom: form.parse("margin_bottom")?,
        margin_right: form.parse("margin_right")?,
        margin_left: form.parse("margin_left")?,
        font_family: form.take_text("font_family"),
        font_size: form.parse("font_size")?,
        show_logo: form.flag("show_logo")?,
        show_header: form.flag("show_header")?,
        show_signature: form.flag("show_signature")?,
        show_image: form.flag("show_image")?,
        footer_text: form.take_text("footer_text"),
    })
}

pub async fn get_settings(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    require_permission(&auth.user, Permission::SYSTEM_SETTINGS)?;
    let settings = settings::get_settings(state.store.as_ref())?;
    Ok(Json(ApiResponse::success(settings)))
}

/// PUT /admin/settings - Partial update (multipart, optional `logo` file)
pub async fn update_settings(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = MultipartForm::read(&mut multipart, state.max_upload_bytes).await?;
    let update = update_from_form(&mut form)?;
    let logo = form.take_file("logo").map(|file| file.data);

    let settings = settings::update_settings(
        state.store.as_ref(),
        &state.attachments,
        &auth.user,
        update,
        logo,
    )
    .await?;
    Ok(Json(ApiResponse::success(settings)))
}
