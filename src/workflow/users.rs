use chrono::Utc;
use uuid::Uuid;

use super::access::require_permission;
use crate::auth::CredentialVerifier;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Permission, Role, User};

/// Username of the account created by `admin init`. The account cannot be
/// deleted and always keeps this name and the admin role.
pub const BOOTSTRAP_ADMIN: &str = "admin";

const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    /// `None` or an empty set gives non-admins the default grant.
    pub permissions: Option<Permission>,
}

#[derive(Debug, Clone)]
pub struct UserEdit {
    pub username: String,
    pub role: Role,
    pub permissions: Permission,
}

pub fn validate_username(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("username cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(Error::InvalidInput(format!(
            "username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidInput(
            "username cannot contain whitespace".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::InvalidInput("password cannot be empty".to_string()));
    }
    Ok(())
}

pub fn find_by_username(store: &dyn Store, username: &str) -> Result<Option<User>> {
    store.get_user_by_username(username)
}

/// Resolves a login. Unknown usernames and wrong passwords both yield `None`.
pub fn find_by_credentials(
    store: &dyn Store,
    credentials: &dyn CredentialVerifier,
    username: &str,
    password: &str,
) -> Result<Option<User>> {
    let Some(user) = store.get_user_by_username(username)? else {
        return Ok(None);
    };

    if credentials.verify(password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Creates and persists an account. Fails with DuplicateUsername, leaving the
/// existing record untouched.
pub fn create(
    store: &dyn Store,
    credentials: &dyn CredentialVerifier,
    new: NewUser,
) -> Result<User> {
    validate_username(&new.username)?;
    validate_password(&new.password)?;

    if store.get_user_by_username(&new.username)?.is_some() {
        return Err(Error::DuplicateUsername);
    }

    let permissions = match (new.role, new.permissions) {
        (Role::Admin, _) => Permission::all(),
        (Role::User, Some(p)) if !p.is_empty() => p,
        (Role::User, _) => Permission::default_user_grant(),
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: new.username,
        password_hash: credentials.hash(&new.password)?,
        role: new.role,
        permissions,
        created_at: now,
        updated_at: now,
    };

    store.create_user(&user)?;
    tracing::info!(user = %user.username, role = %user.role, "Created user");
    Ok(user)
}

/// Self-service signup. Always a regular account with the default grant.
pub fn register(
    store: &dyn Store,
    credentials: &dyn CredentialVerifier,
    username: &str,
    password: &str,
) -> Result<User> {
    create(
        store,
        credentials,
        NewUser {
            username: username.to_string(),
            password: password.to_string(),
            role: Role::User,
            permissions: None,
        },
    )
}

pub fn add_user(
    store: &dyn Store,
    credentials: &dyn CredentialVerifier,
    actor: &User,
    new: NewUser,
) -> Result<User> {
    require_permission(actor, Permission::MANAGE_USERS)?;
    create(store, credentials, new)
}

pub fn list_users(store: &dyn Store, actor: &User) -> Result<Vec<User>> {
    require_permission(actor, Permission::MANAGE_USERS)?;
    store.list_users()
}

pub fn get_user(store: &dyn Store, actor: &User, id: &str) -> Result<User> {
    require_permission(actor, Permission::MANAGE_USERS)?;
    store.get_user(id)?.ok_or(Error::NotFound)
}

pub fn edit_user(store: &dyn Store, actor: &User, id: &str, edit: UserEdit) -> Result<User> {
    require_permission(actor, Permission::MANAGE_USERS)?;
    validate_username(&edit.username)?;

    let mut user = store.get_user(id)?.ok_or(Error::NotFound)?;

    if user.username == BOOTSTRAP_ADMIN
        && (edit.username != BOOTSTRAP_ADMIN || edit.role != Role::Admin)
    {
        return Err(Error::ProtectedAccount);
    }

    user.username = edit.username;
    user.role = edit.role;
    user.permissions = edit.permissions;
    user.updated_at = Utc::now();

    store.update_user(&user)?;
    tracing::info!(
        user = %user.username,
        by = %actor.username,
        permissions = %user.permissions,
        "Updated user"
    );
    Ok(user)
}

pub fn delete_user(store: &dyn Store, actor: &User, id: &str) -> Result<()> {
    require_permission(actor, Permission::MANAGE_USERS)?;

    let user = store.get_user(id)?.ok_or(Error::NotFound)?;
    if user.username == BOOTSTRAP_ADMIN {
        tracing::warn!(by = %actor.username, "Refused to delete bootstrap admin");
        return Err(Error::ProtectedAccount);
    }

    store.delete_user(&user.id)?;
    tracing::info!(user = %user.username, by = %actor.username, "Deleted user");
    Ok(())
}

/// Creates the bootstrap admin unless it already exists.
/// Returns `None` when the account was already present.
pub fn bootstrap_admin(
    store: &dyn Store,
    credentials: &dyn CredentialVerifier,
    password: &str,
) -> Result<Option<User>> {
    if store.get_user_by_username(BOOTSTRAP_ADMIN)?.is_some() {
        return Ok(None);
    }

    create(
        store,
        credentials,
        NewUser {
            username: BOOTSTRAP_ADMIN.to_string(),
            password: password.to_string(),
            role: Role::Admin,
            permissions: None,
        },
    )
    .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::{TestEnv, regular};

    #[test]
    fn test_register_gets_default_grant() {
        let env = TestEnv::new();
        let user = register(env.store(), env.credentials(), "alice", "pw").unwrap();

        assert_eq!(user.role, Role::User);
        assert_eq!(user.permissions, Permission::default_user_grant());
        assert_ne!(user.password_hash, "pw");
    }

    #[test]
    fn test_find_by_credentials() {
        let env = TestEnv::new();
        register(env.store(), env.credentials(), "alice", "pw").unwrap();

        let found =
            find_by_credentials(env.store(), env.credentials(), "alice", "pw").unwrap();
        assert_eq!(found.unwrap().username, "alice");

        assert!(
            find_by_credentials(env.store(), env.credentials(), "alice", "PW")
                .unwrap()
                .is_none()
        );
        assert!(
            find_by_credentials(env.store(), env.credentials(), "nobody", "pw")
                .unwrap()
                .is_none()
        );
        assert!(find_by_username(env.store(), "alice").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_username_leaves_existing_record() {
        let env = TestEnv::new();
        let original = register(env.store(), env.credentials(), "alice", "first").unwrap();

        let result = add_user(
            env.store(),
            env.credentials(),
            &env.admin,
            NewUser {
                username: "alice".to_string(),
                password: "second".to_string(),
                role: Role::Admin,
                permissions: None,
            },
        );
        assert!(matches!(result, Err(Error::DuplicateUsername)));

        let stored = env.store().get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.role, Role::User);
        assert!(env.credentials().verify("first", &stored.password_hash).unwrap());
    }

    #[test]
    fn test_add_user_requires_manage_users() {
        let env = TestEnv::new();
        let author = regular(&env, "author");

        let result = add_user(
            env.store(),
            env.credentials(),
            &author,
            NewUser {
                username: "bob".to_string(),
                password: "pw".to_string(),
                role: Role::User,
                permissions: None,
            },
        );
        assert!(matches!(result, Err(Error::PermissionDenied)));
    }

    #[test]
    fn test_add_user_with_explicit_permissions() {
        let env = TestEnv::new();
        let user = add_user(
            env.store(),
            env.credentials(),
            &env.admin,
            NewUser {
                username: "editor".to_string(),
                password: "pw".to_string(),
                role: Role::User,
                permissions: Some(Permission::DIGITAL_EDITOR),
            },
        )
        .unwrap();
        assert_eq!(user.permissions, Permission::DIGITAL_EDITOR);
    }

    #[test]
    fn test_invalid_usernames() {
        let env = TestEnv::new();
        let too_long = "x".repeat(65);
        for name in ["", "two words", too_long.as_str()] {
            assert!(matches!(
                register(env.store(), env.credentials(), name, "pw"),
                Err(Error::InvalidInput(_))
            ));
        }
        assert!(matches!(
            register(env.store(), env.credentials(), "alice", ""),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_delete_bootstrap_admin_is_protected() {
        let env = TestEnv::new();
        let result = delete_user(env.store(), &env.admin, &env.admin.id);
        assert!(matches!(result, Err(Error::ProtectedAccount)));
        assert!(env.store().get_user(&env.admin.id).unwrap().is_some());
    }

    #[test]
    fn test_delete_user() {
        let env = TestEnv::new();
        let author = regular(&env, "author");

        delete_user(env.store(), &env.admin, &author.id).unwrap();
        assert!(env.store().get_user(&author.id).unwrap().is_none());
        assert!(matches!(
            delete_user(env.store(), &env.admin, &author.id),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_bootstrap_admin_cannot_be_renamed_or_demoted() {
        let env = TestEnv::new();

        let rename = edit_user(
            env.store(),
            &env.admin,
            &env.admin.id,
            UserEdit {
                username: "root".to_string(),
                role: Role::Admin,
                permissions: Permission::all(),
            },
        );
        assert!(matches!(rename, Err(Error::ProtectedAccount)));

        let demote = edit_user(
            env.store(),
            &env.admin,
            &env.admin.id,
            UserEdit {
                username: BOOTSTRAP_ADMIN.to_string(),
                role: Role::User,
                permissions: Permission::all(),
            },
        );
        assert!(matches!(demote, Err(Error::ProtectedAccount)));
    }

    #[test]
    fn test_edit_user_updates_role_and_permissions() {
        let env = TestEnv::new();
        let author = regular(&env, "author");
        regular(&env, "taken");

        let edited = edit_user(
            env.store(),
            &env.admin,
            &author.id,
            UserEdit {
                username: "writer".to_string(),
                role: Role::User,
                permissions: Permission::VIEW_REPORTS,
            },
        )
        .unwrap();
        assert_eq!(edited.username, "writer");
        assert_eq!(edited.permissions, Permission::VIEW_REPORTS);

        let clash = edit_user(
            env.store(),
            &env.admin,
            &author.id,
            UserEdit {
                username: "taken".to_string(),
                role: Role::User,
                permissions: Permission::VIEW_REPORTS,
            },
        );
        assert!(matches!(clash, Err(Error::DuplicateUsername)));
    }

    #[test]
    fn test_bootstrap_admin_runs_once() {
        let env = TestEnv::new();
        assert!(
            bootstrap_admin(env.store(), env.credentials(), "other")
                .unwrap()
                .is_none()
        );
        let admin = env.store().get_user_by_username(BOOTSTRAP_ADMIN).unwrap().unwrap();
        assert_eq!(admin.permissions, Permission::all());
    }

    #[test]
    fn test_list_users() {
        let env = TestEnv::new();
        let author = regular(&env, "author");

        let users = list_users(env.store(), &env.admin).unwrap();
        assert_eq!(users.len(), 2);
        assert!(matches!(
            list_users(env.store(), &author),
            Err(Error::PermissionDenied)
        ));
        assert_eq!(get_user(env.store(), &env.admin, &author.id).unwrap().id, author.id);
    }
}
