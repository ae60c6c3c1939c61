use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::access::{is_commander, require_permission};
use super::settings::get_settings;
use crate::attachments::{AttachmentStore, decode_data_url};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Permission, Report, ReportStatus, SystemSettings, User};

/// An uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Raw report submission. Counts arrive as text and are validated here.
#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub title: String,
    pub accepted_violations: String,
    pub rejected_violations: String,
    pub image: Option<ImageUpload>,
    /// Author signature as a `data:image` URL.
    pub signature: Option<String>,
}

/// Author edit. Violation counts are not editable.
#[derive(Debug, Clone)]
pub struct ReportEdit {
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
}

/// Context handed to the renderer for the report detail page.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub report: Report,
    pub is_commander: bool,
    pub settings: SystemSettings,
}

/// Context handed to the renderer for the print layout.
#[derive(Debug, Clone, Serialize)]
pub struct PrintContext {
    pub report: Report,
    pub settings: SystemSettings,
}

fn parse_count(field: &str, raw: &str) -> Result<u32> {
    raw.trim().parse::<u32>().map_err(|_| {
        Error::InvalidInput(format!("{field} must be a non-negative integer"))
    })
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("title cannot be empty".to_string()));
    }
    Ok(())
}

fn is_author(report: &Report, actor: &User) -> bool {
    report.author_id == actor.id
}

pub fn get(store: &dyn Store, id: &str) -> Result<Report> {
    store.get_report(id)?.ok_or(Error::NotFound)
}

pub async fn create(
    store: &dyn Store,
    attachments: &AttachmentStore,
    author: &User,
    new: NewReport,
) -> Result<Report> {
    require_permission(author, Permission::CREATE_REPORT)?;
    validate_title(&new.title)?;

    let accepted = parse_count("accepted_violations", &new.accepted_violations)?;
    let rejected = parse_count("rejected_violations", &new.rejected_violations)?;
    let total = accepted
        .checked_add(rejected)
        .ok_or_else(|| Error::InvalidInput("violation counts are too large".to_string()))?;

    let signature = new.signature.filter(|s| !s.trim().is_empty());
    if let Some(data_url) = &signature {
        decode_data_url(data_url)?;
    }

    let image_path = match new.image.filter(|img| !img.data.is_empty()) {
        Some(image) => Some(attachments.store_upload(&image.data, &image.file_name).await?),
        None => None,
    };

    let signature_path = match signature {
        Some(data_url) => Some(attachments.store_signature(&data_url, &author.id, None).await?),
        None => None,
    };

    let now = Utc::now();
    let report = Report {
        id: Uuid::new_v4().to_string(),
        title: new.title.trim().to_string(),
        content: String::new(),
        date: now,
        author_id: author.id.clone(),
        accepted_violations: accepted,
        rejected_violations: rejected,
        total_violations: total,
        image_path,
        signature_path,
        status: ReportStatus::Pending,
        created_at: now,
    };

    store.create_report(&report)?;
    tracing::info!(
        report = %report.id,
        author = %author.username,
        total = report.total_violations,
        "Created report"
    );
    Ok(report)
}

/// The actor's own reports, newest first.
pub fn list_own(store: &dyn Store, actor: &User) -> Result<Vec<Report>> {
    require_permission(actor, Permission::VIEW_REPORTS)?;
    store.list_reports_by_author(&actor.id)
}

/// Pending reports awaiting the commander's decision.
pub fn list_inbox(store: &dyn Store, actor: &User) -> Result<Vec<Report>> {
    let settings = get_settings(store)?;
    if !is_commander(actor, &settings) {
        return Err(Error::PermissionDenied);
    }
    store.list_reports_by_status(ReportStatus::Pending)
}

pub fn edit(store: &dyn Store, actor: &User, id: &str, edit: ReportEdit) -> Result<Report> {
    let mut report = get(store, id)?;
    if !is_author(&report, actor) {
        tracing::warn!(report = %id, actor = %actor.username, "Edit by non-author refused");
        return Err(Error::PermissionDenied);
    }
    validate_title(&edit.title)?;

    let date: DateTime<Utc> = edit.date.and_time(chrono::NaiveTime::MIN).and_utc();
    store.update_report_details(&report.id, edit.title.trim(), &edit.content, date)?;

    report.title = edit.title.trim().to_string();
    report.content = edit.content;
    report.date = date;
    tracing::info!(report = %report.id, "Edited report");
    Ok(report)
}

pub fn delete(store: &dyn Store, actor: &User, id: &str) -> Result<()> {
    let report = get(store, id)?;
    if !is_author(&report, actor) {
        tracing::warn!(report = %id, actor = %actor.username, "Delete by non-author refused");
        return Err(Error::PermissionDenied);
    }

    store.delete_report(&report.id)?;
    tracing::info!(report = %report.id, "Deleted report");
    Ok(())
}

/// Detail view: the author or the commander.
pub fn view(store: &dyn Store, actor: &User, id: &str) -> Result<ReportView> {
    let report = get(store, id)?;
    let settings = get_settings(store)?;
    let commander = is_commander(actor, &settings);

    if !is_author(&report, actor) && !commander {
        return Err(Error::PermissionDenied);
    }

    Ok(ReportView {
        report,
        is_commander: commander,
        settings,
    })
}

/// Print layout: the author or any admin. The commander gets no special
/// treatment here.
pub fn print(store: &dyn Store, actor: &User, id: &str) -> Result<PrintContext> {
    let report = get(store, id)?;
    if !is_author(&report, actor) && !actor.is_admin() {
        return Err(Error::PermissionDenied);
    }

    Ok(PrintContext {
        report,
        settings: get_settings(store)?,
    })
}

pub fn accept(store: &dyn Store, actor: &User, id: &str) -> Result<Report> {
    decide(store, actor, id, ReportStatus::Accepted)
}

pub fn reject(store: &dyn Store, actor: &User, id: &str) -> Result<Report> {
    decide(store, actor, id, ReportStatus::Rejected)
}

/// Commander decision. Repeating a decision overwrites the stored status.
fn decide(store: &dyn Store, actor: &User, id: &str, status: ReportStatus) -> Result<Report> {
    let mut report = get(store, id)?;
    let settings = get_settings(store)?;
    if !is_commander(actor, &settings) {
        tracing::warn!(report = %id, actor = %actor.username, "Decision by non-commander refused");
        return Err(Error::PermissionDenied);
    }

    store.update_report_status(&report.id, status)?;
    tracing::info!(report = %report.id, from = %report.status, to = %status, "Report decided");
    report.status = status;
    Ok(report)
}

/// Commander countersignature; replaces any signature already on the report.
pub async fn attach_signature(
    store: &dyn Store,
    attachments: &AttachmentStore,
    actor: &User,
    id: &str,
    data_url: &str,
) -> Result<Report> {
    let mut report = get(store, id)?;
    let settings = get_settings(store)?;
    if !is_commander(actor, &settings) {
        return Err(Error::PermissionDenied);
    }

    let path = attachments
        .store_signature(data_url, &actor.id, Some(&report.id))
        .await?;
    store.update_report_signature(&report.id, &path)?;

    tracing::info!(report = %report.id, "Commander signed report");
    report.signature_path = Some(path);
    Ok(report)
}
