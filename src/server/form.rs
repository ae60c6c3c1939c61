use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use super::response::ApiError;

/// An uploaded file part.
#[derive(Debug)]
pub struct FilePart {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// A fully buffered multipart form. Parts carrying a file name are files,
/// everything else is text.
#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: HashMap<String, String>,
    files: HashMap<String, FilePart>,
}

fn read_error(e: MultipartError) -> ApiError {
    ApiError {
        status: e.status(),
        message: format!("Failed to read multipart: {}", e.body_text()),
    }
}

impl MultipartForm {
    /// Reads every part. Files larger than `max_file_bytes` are rejected. A
    /// nameless empty part is an unfilled file input and counts as absent;
    /// a named zero-byte file is kept.
    pub async fn read(multipart: &mut Multipart, max_file_bytes: usize) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(read_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field.bytes().await.map_err(read_error)?;
                    if data.len() > max_file_bytes {
                        return Err(ApiError::bad_request(format!(
                            "{name} ({} bytes) exceeds maximum allowed size ({max_file_bytes} bytes)",
                            data.len()
                        )));
                    }
                    if !(file_name.is_empty() && data.is_empty()) {
                        form.files.insert(
                            name,
                            FilePart {
                                file_name,
                                data: data.to_vec(),
                            },
                        );
                    }
                }
                None => {
                    let text = field.text().await.map_err(read_error)?;
                    form.texts.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.texts.remove(name)
    }

    pub fn require_text(&mut self, name: &str) -> Result<String, ApiError> {
        self.take_text(name)
            .ok_or_else(|| ApiError::bad_request(format!("{name} field is required")))
    }

    pub fn take_file(&mut self, name: &str) -> Option<FilePart> {
        self.files.remove(name)
    }

    /// Parses an optional text field, treating blank values as absent.
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, ApiError> {
        match self.text(name).map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ApiError::bad_request(format!("{name} has an invalid value"))),
            None => Ok(None),
        }
    }

    /// Checkbox-style boolean: `true`/`on`/`1` or `false`/`off`/`0`.
    pub fn flag(&self, name: &str) -> Result<Option<bool>, ApiError> {
        match self.text(name).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(None),
            Some(v) => match v.as_str() {
                "true" | "on" | "1" => Ok(Some(true)),
                "false" | "off" | "0" | "" => Ok(Some(false)),
                _ => Err(ApiError::bad_request(format!("{name} must be a boolean"))),
            },
        }
    }
}
