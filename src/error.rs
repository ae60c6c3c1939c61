use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("template name already exists")]
    DuplicateTemplateName,

    #[error("permission denied")]
    PermissionDenied,

    #[error("the bootstrap admin account cannot be removed or demoted")]
    ProtectedAccount,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("template import failed: {0}")]
    ImportError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid username or password")]
    Unauthorized,

    #[error("session token lookup collision")]
    SessionLookupCollision,

    #[error("invalid session token format")]
    InvalidTokenFormat,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("credential error: {0}")]
    Credential(String),
}

pub type Result<T> = std::result::Result<T, Error>;
