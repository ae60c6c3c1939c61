mod settings;
mod templates;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // User routes
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Settings routes
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        // Template routes
        .route(
            "/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route("/templates/import", post(templates::import_template))
        .route(
            "/templates/{id}",
            get(templates::get_template).delete(templates::delete_template),
        )
}
