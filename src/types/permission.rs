use std::fmt;

use serde::{Deserialize, Serialize};

/// Permission is a bitmask of capability tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(u32);

impl Permission {
    pub const VIEW_REPORTS: Permission = Permission(1 << 0); // 1
    pub const CREATE_REPORT: Permission = Permission(1 << 1); // 2
    pub const MANAGE_USERS: Permission = Permission(1 << 2); // 4
    pub const MANAGE_TEMPLATES: Permission = Permission(1 << 3); // 8
    pub const SYSTEM_SETTINGS: Permission = Permission(1 << 4); // 16
    pub const DIGITAL_EDITOR: Permission = Permission(1 << 5); // 32

    const TAGS: [(Permission, &'static str); 6] = [
        (Self::VIEW_REPORTS, "view_reports"),
        (Self::CREATE_REPORT, "create_report"),
        (Self::MANAGE_USERS, "manage_users"),
        (Self::MANAGE_TEMPLATES, "manage_templates"),
        (Self::SYSTEM_SETTINGS, "system_settings"),
        (Self::DIGITAL_EDITOR, "digital_editor"),
    ];

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Every capability tag.
    #[must_use]
    pub const fn all() -> Permission {
        Permission(
            Self::VIEW_REPORTS.0
                | Self::CREATE_REPORT.0
                | Self::MANAGE_USERS.0
                | Self::MANAGE_TEMPLATES.0
                | Self::SYSTEM_SETTINGS.0
                | Self::DIGITAL_EDITOR.0,
        )
    }

    /// Grant given to regular accounts that are created without an explicit set.
    #[must_use]
    pub const fn default_user_grant() -> Permission {
        Permission(Self::VIEW_REPORTS.0 | Self::CREATE_REPORT.0)
    }

    /// Returns true if this bitmask contains the required capability.
    #[must_use]
    pub const fn has(self, required: Permission) -> bool {
        self.0 & required.0 == required.0
    }

    #[must_use]
    pub const fn union(self, other: Permission) -> Permission {
        Permission(self.0 | other.0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Converts a capability tag to its bitmask value.
    pub fn parse(s: &str) -> Option<Permission> {
        Self::TAGS
            .iter()
            .find(|(_, tag)| *tag == s)
            .map(|(perm, _)| *perm)
    }

    /// Converts a list of capability tags to a combined bitmask.
    pub fn parse_many<S: AsRef<str>>(strs: &[S]) -> Option<Permission> {
        let mut result = Permission::default();
        for s in strs {
            result = result.union(Self::parse(s.as_ref())?);
        }
        Some(result)
    }

    /// Returns the capability tags in this bitmask, in declaration order.
    #[must_use]
    pub fn to_strings(self) -> Vec<&'static str> {
        Self::TAGS
            .iter()
            .filter(|(perm, _)| self.has(*perm))
            .map(|(_, tag)| *tag)
            .collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(", "))
    }
}

impl From<u32> for Permission {
    fn from(bits: u32) -> Self {
        Self(bits & Self::all().0)
    }
}

impl From<Permission> for u32 {
    fn from(p: Permission) -> Self {
        p.0
    }
}

impl From<i64> for Permission {
    fn from(bits: i64) -> Self {
        Self::from(bits as u32)
    }
}

impl From<Permission> for i64 {
    fn from(p: Permission) -> Self {
        i64::from(p.0)
    }
}
