use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub permissions: Permission,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub token_hash: String,
    pub token_lookup: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of a report. Nothing moves a report back to pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ReportStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Accepted => "accepted",
            ReportStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<ReportStatus> {
        match s {
            "pending" => Some(ReportStatus::Pending),
            "accepted" => Some(ReportStatus::Accepted),
            "rejected" => Some(ReportStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub author_id: String,
    pub accepted_violations: u32,
    pub rejected_violations: u32,
    pub total_violations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_path: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

/// Print-layout configuration. A single row exists system-wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub header_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    pub commander_name: String,
    pub paper_size: String,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_right: f64,
    pub margin_left: f64,
    pub font_family: String,
    pub font_size: u32,
    pub show_logo: bool,
    pub show_header: bool,
    pub show_signature: bool,
    pub show_image: bool,
    pub footer_text: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            header_text: String::new(),
            logo_path: None,
            commander_name: String::new(),
            paper_size: "A4".to_string(),
            margin_top: 20.0,
            margin_bottom: 20.0,
            margin_right: 20.0,
            margin_left: 20.0,
            font_family: "Arial".to_string(),
            font_size: 14,
            show_logo: true,
            show_header: true,
            show_signature: true,
            show_image: true,
            footer_text: String::new(),
        }
    }
}

/// Partial settings update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub header_text: Option<String>,
    pub commander_name: Option<String>,
    pub paper_size: Option<String>,
    pub margin_top: Option<f64>,
    pub margin_bottom: Option<f64>,
    pub margin_right: Option<f64>,
    pub margin_left: Option<f64>,
    pub font_family: Option<String>,
    pub font_size: Option<u32>,
    pub show_logo: Option<bool>,
    pub show_header: Option<bool>,
    pub show_signature: Option<bool>,
    pub show_image: Option<bool>,
    pub footer_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub id: String,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
