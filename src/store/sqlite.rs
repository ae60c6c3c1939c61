use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const USER_COLUMNS: &str =
    "id, username, password_hash, role, permissions, created_at, updated_at";

const SESSION_COLUMNS: &str =
    "id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at";

const REPORT_COLUMNS: &str = "id, title, content, date, author_id, accepted_violations, \
     rejected_violations, total_violations, image_path, signature_path, status, created_at";

const SETTINGS_COLUMNS: &str = "header_text, logo_path, commander_name, paper_size, \
     margin_top, margin_bottom, margin_right, margin_left, font_family, font_size, \
     show_logo, show_header, show_signature, show_image, footer_text";

const TEMPLATE_COLUMNS: &str = "id, name, content, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: Role::parse(&role).unwrap_or_else(|| {
            tracing::error!("Invalid role in database: '{}'", role);
            Role::User
        }),
        permissions: Permission::from(row.get::<_, i64>(4)?),
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        user_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        expires_at: parse_datetime(&row.get::<_, String>(5)?),
        last_used_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
    })
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<Report> {
    let status: String = row.get(10)?;
    Ok(Report {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        date: parse_datetime(&row.get::<_, String>(3)?),
        author_id: row.get(4)?,
        accepted_violations: row.get(5)?,
        rejected_violations: row.get(6)?,
        total_violations: row.get(7)?,
        image_path: row.get(8)?,
        signature_path: row.get(9)?,
        status: ReportStatus::parse(&status).unwrap_or_else(|| {
            tracing::error!("Invalid report status in database: '{}'", status);
            ReportStatus::Pending
        }),
        created_at: parse_datetime(&row.get::<_, String>(11)?),
    })
}

fn settings_from_row(row: &Row<'_>) -> rusqlite::Result<SystemSettings> {
    Ok(SystemSettings {
        header_text: row.get(0)?,
        logo_path: row.get(1)?,
        commander_name: row.get(2)?,
        paper_size: row.get(3)?,
        margin_top: row.get(4)?,
        margin_bottom: row.get(5)?,
        margin_right: row.get(6)?,
        margin_left: row.get(7)?,
        font_family: row.get(8)?,
        font_size: row.get(9)?,
        show_logo: row.get(10)?,
        show_header: row.get(11)?,
        show_signature: row.get(12)?,
        show_image: row.get(13)?,
        footer_text: row.get(14)?,
    })
}

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<ReportTemplate> {
    Ok(ReportTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO users (id, username, password_hash, role, permissions, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id,
                user.username,
                user.password_hash,
                user.role.as_str(),
                i64::from(user.permissions),
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::DuplicateUsername),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))?;

        let rows = stmt.query_map([], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "UPDATE users SET username = ?1, password_hash = ?2, role = ?3, permissions = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                user.username,
                user.password_hash,
                user.role.as_str(),
                i64::from(user.permissions),
                format_datetime(&user.updated_at),
                user.id,
            ],
        );

        match result {
            Ok(0) => Err(Error::NotFound),
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::DuplicateUsername),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO sessions (id, token_hash, token_lookup, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.token_hash,
                session.token_lookup,
                session.user_id,
                format_datetime(&session.created_at),
                format_datetime(&session.expires_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::SessionLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE token_lookup = ?1"),
            params![lookup],
            session_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![format_datetime(&now)],
        )?;
        Ok(rows)
    }

    fn update_session_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE sessions SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Report operations

    fn create_report(&self, report: &Report) -> Result<()> {
        self.conn().execute(
            "INSERT INTO reports (id, title, content, date, author_id, accepted_violations,
                                  rejected_violations, total_violations, image_path,
                                  signature_path, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                report.id,
                report.title,
                report.content,
                format_datetime(&report.date),
                report.author_id,
                report.accepted_violations,
                report.rejected_violations,
                report.total_violations,
                report.image_path,
                report.signature_path,
                report.status.as_str(),
                format_datetime(&report.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_report(&self, id: &str) -> Result<Option<Report>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
            params![id],
            report_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_reports_by_author(&self, author_id: &str) -> Result<Vec<Report>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE author_id = ?1 ORDER BY date DESC, created_at DESC"
        ))?;

        let rows = stmt.query_map(params![author_id], report_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_reports_by_status(&self, status: ReportStatus) -> Result<Vec<Report>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE status = ?1 ORDER BY date DESC, created_at DESC"
        ))?;

        let rows = stmt.query_map(params![status.as_str()], report_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_report_details(
        &self,
        id: &str,
        title: &str,
        content: &str,
        date: DateTime<Utc>,
    ) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE reports SET title = ?1, content = ?2, date = ?3 WHERE id = ?4",
            params![title, content, format_datetime(&date), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn update_report_status(&self, id: &str, status: ReportStatus) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE reports SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn update_report_signature(&self, id: &str, signature_path: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE reports SET signature_path = ?1 WHERE id = ?2",
            params![signature_path, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_report(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM reports WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Settings singleton

    fn get_settings(&self) -> Result<Option<SystemSettings>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SETTINGS_COLUMNS} FROM system_settings WHERE id = 1"),
            [],
            settings_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn save_settings(&self, settings: &SystemSettings) -> Result<()> {
        self.conn().execute(
            "INSERT INTO system_settings (id, header_text, logo_path, commander_name, paper_size,
                                          margin_top, margin_bottom, margin_right, margin_left,
                                          font_family, font_size, show_logo, show_header,
                                          show_signature, show_image, footer_text)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT (id) DO UPDATE SET
                header_text = excluded.header_text,
                logo_path = excluded.logo_path,
                commander_name = excluded.commander_name,
                paper_size = excluded.paper_size,
                margin_top = excluded.margin_top,
                margin_bottom = excluded.margin_bottom,
                margin_right = excluded.margin_right,
                margin_left = excluded.margin_left,
                font_family = excluded.font_family,
                font_size = excluded.font_size,
                show_logo = excluded.show_logo,
                show_header = excluded.show_header,
                show_signature = excluded.show_signature,
                show_image = excluded.show_image,
                footer_text = excluded.footer_text",
            params![
                settings.header_text,
                settings.logo_path,
                settings.commander_name,
                settings.paper_size,
                settings.margin_top,
                settings.margin_bottom,
                settings.margin_right,
                settings.margin_left,
                settings.font_family,
                settings.font_size,
                settings.show_logo,
                settings.show_header,
                settings.show_signature,
                settings.show_image,
                settings.footer_text,
            ],
        )?;
        Ok(())
    }

    // Template operations

    fn create_template(&self, template: &ReportTemplate) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO report_templates (id, name, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                template.id,
                template.name,
                template.content,
                format_datetime(&template.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::DuplicateTemplateName),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_template(&self, id: &str) -> Result<Option<ReportTemplate>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TEMPLATE_COLUMNS} FROM report_templates WHERE id = ?1"),
            params![id],
            template_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_templates(&self) -> Result<Vec<ReportTemplate>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM report_templates ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map([], template_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_template(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM report_templates WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
