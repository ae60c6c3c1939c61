use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{Error, Result};

const UPLOADS_DIR: &str = "uploads";
const SIGNATURES_DIR: &str = "signatures";
const LOGO_FILE: &str = "logo.png";
const DATA_URL_PREFIX: &str = "data:image";
const MAX_NAME_LEN: usize = 100;

/// Writes report images, signatures and the system logo under the data
/// directory. Returned paths are relative to that directory.
///
/// Files are never removed when their report goes away.
pub struct AttachmentStore {
    base_path: PathBuf,
}

impl AttachmentStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            base_path: data_dir.to_path_buf(),
        }
    }

    /// Absolute location of a stored reference path.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.base_path.join(relative)
    }

    /// Stores an uploaded image as `uploads/<millis>_<rand>_<name>`.
    pub async fn store_upload(&self, data: &[u8], original_name: &str) -> Result<String> {
        let name = format!(
            "{}_{}_{}",
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8],
            sanitize_file_name(original_name)
        );
        let relative = format!("{UPLOADS_DIR}/{name}");

        self.write_atomic(&relative, data).await?;
        tracing::info!(path = %relative, bytes = data.len(), "Stored upload");
        Ok(relative)
    }

    /// Decodes a `data:image/...;base64,` URL and stores it under
    /// `uploads/signatures/`. Nothing is written if the payload is invalid.
    pub async fn store_signature(
        &self,
        data_url: &str,
        owner_id: &str,
        report_id: Option<&str>,
    ) -> Result<String> {
        let bytes = decode_data_url(data_url)?;

        let name = match report_id {
            Some(report_id) => format!(
                "signature_{}_{owner_id}_{report_id}.png",
                Utc::now().timestamp_millis()
            ),
            None => format!("signature_{}_{owner_id}.png", Utc::now().timestamp_millis()),
        };
        let relative = format!("{UPLOADS_DIR}/{SIGNATURES_DIR}/{name}");

        self.write_atomic(&relative, &bytes).await?;
        tracing::info!(path = %relative, "Stored signature");
        Ok(relative)
    }

    /// Replaces the single system logo.
    pub async fn store_logo(&self, data: &[u8]) -> Result<String> {
        self.write_atomic(LOGO_FILE, data).await?;
        tracing::info!(bytes = data.len(), "Replaced system logo");
        Ok(LOGO_FILE.to_string())
    }

    async fn write_atomic(&self, relative: &str, data: &[u8]) -> Result<()> {
        let final_path = self.resolve(relative);
        let parent = final_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_path.clone());
        fs::create_dir_all(&parent).await?;

        let temp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut temp_file = File::create(&temp_path).await?;
        temp_file.write_all(data).await?;
        temp_file.sync_all().await?;

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::Io(e));
        }

        Ok(())
    }
}

/// Extracts the image bytes from a data URL.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    if !data_url.starts_with(DATA_URL_PREFIX) {
        return Err(Error::InvalidPayload(
            "signature must be a data:image URL".to_string(),
        ));
    }

    let (_, payload) = data_url
        .split_once(',')
        .ok_or_else(|| Error::InvalidPayload("data URL has no payload".to_string()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::InvalidPayload(format!("invalid base64 payload: {e}")))?;

    if bytes.is_empty() {
        return Err(Error::InvalidPayload("empty image payload".to_string()));
    }

    Ok(bytes)
}

/// Reduces a client-supplied file name to a safe final path component.
fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .take(MAX_NAME_LEN)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
