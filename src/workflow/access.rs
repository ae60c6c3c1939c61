use crate::error::{Error, Result};
use crate::types::{Permission, SystemSettings, User};

/// Capabilities a user actually holds. Admins hold every capability no matter
/// what their stored set says; everyone else holds exactly the stored set.
#[must_use]
pub fn effective_permissions(user: &User) -> Permission {
    if user.is_admin() {
        Permission::all()
    } else {
        user.permissions
    }
}

#[must_use]
pub fn has_permission(user: &User, required: Permission) -> bool {
    effective_permissions(user).has(required)
}

/// Check that the user holds the capability, returning PermissionDenied if not.
pub fn require_permission(user: &User, required: Permission) -> Result<()> {
    if !has_permission(user, required) {
        tracing::warn!(
            user = %user.username,
            required = %required,
            "Capability check failed"
        );
        return Err(Error::PermissionDenied);
    }
    Ok(())
}

/// The commander is whoever's username matches the configured commander name.
/// An empty commander name means nobody holds the role.
#[must_use]
pub fn is_commander(actor: &User, settings: &SystemSettings) -> bool {
    !settings.commander_name.is_empty() && actor.username == settings.commander_name
}
