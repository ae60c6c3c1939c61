use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::AppState;
use crate::types::{Session, User};

const MAX_LOOKUP_RETRIES: u32 = 3;

#[derive(Debug)]
pub enum SessionValidationError {
    InvalidScheme,
    InvalidToken,
    SessionExpired,
    InternalError,
}

/// Extracts the raw token from a `Bearer` Authorization header.
/// Returns None if no header is present.
pub fn extract_bearer_token(
    auth_header: Option<&str>,
) -> std::result::Result<Option<String>, SessionValidationError> {
    match auth_header {
        Some(header) => header
            .strip_prefix("Bearer ")
            .map(|token| Some(token.trim().to_string()))
            .ok_or(SessionValidationError::InvalidScheme),
        None => Ok(None),
    }
}

/// Validates a raw session token against the store and resolves its user.
pub fn validate_session(
    state: &AppState,
    raw_token: &str,
) -> std::result::Result<(Session, User), SessionValidationError> {
    let (lookup, _secret) =
        super::parse_token(raw_token).map_err(|_| SessionValidationError::InvalidToken)?;

    let session = state
        .store
        .get_session_by_lookup(&lookup)
        .map_err(|_| SessionValidationError::InternalError)?
        .ok_or(SessionValidationError::InvalidToken)?;

    if !state
        .sessions
        .verify(raw_token, &session.token_hash)
        .map_err(|_| SessionValidationError::InternalError)?
    {
        return Err(SessionValidationError::InvalidToken);
    }

    if session.expires_at < Utc::now() {
        return Err(SessionValidationError::SessionExpired);
    }

    let user = state
        .store
        .get_user(&session.user_id)
        .map_err(|_| SessionValidationError::InternalError)?
        .ok_or(SessionValidationError::InvalidToken)?;

    if let Err(e) = state.store.update_session_last_used(&session.id) {
        tracing::warn!("Failed to update session last_used_at: {e}");
    }

    Ok((session, user))
}

/// Creates a session for an authenticated user and returns the raw token.
pub fn issue_session(state: &AppState, user: &User) -> Result<String> {
    match state.store.delete_expired_sessions(Utc::now()) {
        Ok(0) => {}
        Ok(n) => tracing::debug!("Purged {n} expired sessions"),
        Err(e) => tracing::warn!("Failed to purge expired sessions: {e}"),
    }

    for _ in 0..MAX_LOOKUP_RETRIES {
        let (raw_token, lookup, hash) = state.sessions.generate()?;
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(state.session_ttl)
            .ok_or_else(|| Error::Config("session lifetime is out of range".to_string()))?;
        let session = Session {
            id: Uuid::new_v4().to_string(),
            token_hash: hash,
            token_lookup: lookup,
            user_id: user.id.clone(),
            created_at: now,
            expires_at,
            last_used_at: None,
        };

        match state.store.create_session(&session) {
            Ok(()) => return Ok(raw_token),
            Err(Error::SessionLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::SessionLookupCollision)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeDelta;
    use tempfile::TempDir;

    use super::*;
    use crate::config::ServerConfig;
    use crate::store::{SqliteStore, Store};
    use crate::types::Role;

    fn test_state(temp: &TempDir) -> AppState {
        let config = ServerConfig {
            data_dir: temp.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let store = SqliteStore::new(config.db_path()).unwrap();
        store.initialize().unwrap();
        AppState::new(Arc::new(store), &config).unwrap()
    }

    fn test_user(state: &AppState) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: "alice".to_string(),
            password_hash: "unused".to_string(),
            role: Role::User,
            permissions: Default::default(),
            created_at: now,
            updated_at: now,
        };
        state.store.create_user(&user).unwrap();
        user
    }

    #[test]
    fn test_issue_session_expires_after_ttl() {
        let temp = TempDir::new().unwrap();
        let state = test_state(&temp);
        let user = test_user(&state);

        let token = issue_session(&state, &user).unwrap();
        let (session, found) = validate_session(&state, &token).unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(session.expires_at - session.created_at, state.session_ttl);
    }

    #[test]
    fn test_issue_session_rejects_unrepresentable_expiry() {
        let temp = TempDir::new().unwrap();
        let mut state = test_state(&temp);
        state.session_ttl = TimeDelta::MAX;
        let user = test_user(&state);

        assert!(matches!(
            issue_session(&state, &user),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(Some("Bearer rdk_abc")).unwrap(),
            Some("rdk_abc".to_string())
        );
        assert_eq!(extract_bearer_token(None).unwrap(), None);
        assert!(matches!(
            extract_bearer_token(Some("Basic eC10b2tlbjp4")),
            Err(SessionValidationError::InvalidScheme)
        ));
    }
}
