//! Shared fixtures for workflow unit tests.

use std::path::Path;

use tempfile::TempDir;

use super::users::{self, BOOTSTRAP_ADMIN};
use crate::attachments::AttachmentStore;
use crate::auth::{Argon2Credentials, CredentialVerifier};
use crate::store::{SqliteStore, Store};
use crate::types::User;

pub struct TestEnv {
    temp: TempDir,
    store: SqliteStore,
    credentials: Argon2Credentials,
    pub attachments: AttachmentStore,
    pub admin: User,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let credentials = Argon2Credentials::with_cost(1024, 1).unwrap();
        let attachments = AttachmentStore::new(temp.path());

        users::bootstrap_admin(&store, &credentials, "1234").unwrap();
        let admin = store.get_user_by_username(BOOTSTRAP_ADMIN).unwrap().unwrap();

        Self {
            temp,
            store,
            credentials,
            attachments,
            admin,
        }
    }

    pub fn store(&self) -> &dyn Store {
        &self.store
    }

    pub fn credentials(&self) -> &dyn CredentialVerifier {
        &self.credentials
    }

    pub fn data_dir(&self) -> &Path {
        self.temp.path()
    }

    pub fn set_commander(&self, username: &str) {
        let mut settings = super::settings::get_settings(self.store()).unwrap();
        settings.commander_name = username.to_string();
        self.store.save_settings(&settings).unwrap();
    }
}

/// Registers a regular account with the default grant.
pub fn regular(env: &TestEnv, username: &str) -> User {
    users::register(env.store(), env.credentials(), username, "pw").unwrap()
}
