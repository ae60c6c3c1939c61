mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize>;
    fn update_session_last_used(&self, id: &str) -> Result<()>;

    // Report operations
    fn create_report(&self, report: &Report) -> Result<()>;
    fn get_report(&self, id: &str) -> Result<Option<Report>>;
    fn list_reports_by_author(&self, author_id: &str) -> Result<Vec<Report>>;
    fn list_reports_by_status(&self, status: ReportStatus) -> Result<Vec<Report>>;
    fn update_report_details(
        &self,
        id: &str,
        title: &str,
        content: &str,
        date: DateTime<Utc>,
    ) -> Result<()>;
    fn update_report_status(&self, id: &str, status: ReportStatus) -> Result<()>;
    fn update_report_signature(&self, id: &str, signature_path: &str) -> Result<()>;
    fn delete_report(&self, id: &str) -> Result<bool>;

    // Settings singleton
    fn get_settings(&self) -> Result<Option<SystemSettings>>;
    fn save_settings(&self, settings: &SystemSettings) -> Result<()>;

    // Template operations
    fn create_template(&self, template: &ReportTemplate) -> Result<()>;
    fn get_template(&self, id: &str) -> Result<Option<ReportTemplate>>;
    fn list_templates(&self) -> Result<Vec<ReportTemplate>>;
    fn delete_template(&self, id: &str) -> Result<bool>;
}
