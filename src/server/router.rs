use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use chrono::TimeDelta;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use super::admin::admin_router;
use super::{editor, reports, session};
use crate::attachments::AttachmentStore;
use crate::auth::{Argon2Credentials, CredentialVerifier, SessionTokenGenerator};
use crate::config::ServerConfig;
use crate::error::Result;
use crate::store::Store;

/// Room for the non-file parts of a form on top of the largest file.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub attachments: AttachmentStore,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub sessions: SessionTokenGenerator,
    pub session_ttl: TimeDelta,
    /// Largest accepted single file (report image, logo, template).
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Builds the shared state. Fails when the config does not validate.
    pub fn new(store: Arc<dyn Store>, config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            store,
            attachments: AttachmentStore::new(&config.data_dir),
            credentials: Arc::new(Argon2Credentials::new()),
            sessions: SessionTokenGenerator::new(),
            session_ttl: config.session_ttl()?,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// Replaces the password hasher.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialVerifier>) -> Self {
        self.credentials = credentials;
        self
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(session::login))
        .route("/auth/register", post(session::register))
        .route("/auth/logout", post(session::logout))
        .route("/me", get(session::me))
        .route(
            "/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route("/reports/inbox", get(reports::inbox))
        .route(
            "/reports/{id}",
            get(reports::get_report)
                .patch(reports::update_report)
                .delete(reports::delete_report),
        )
        .route("/reports/{id}/print", get(reports::print_report))
        .route("/reports/{id}/accept", post(reports::accept_report))
        .route("/reports/{id}/reject", post(reports::reject_report))
        .route("/reports/{id}/signature", post(reports::sign_report))
        .route("/editor/draft", post(editor::draft))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .max_upload_bytes
        .saturating_mul(2)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1", api_router())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(log_request))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
