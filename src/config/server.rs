use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_SESSION_TTL_HOURS: i64 = 12;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Ten years.
const MAX_SESSION_TTL_HOURS: i64 = 10 * 366 * 24;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Lifetime of a login session before the token must be renewed.
    pub session_ttl_hours: i64,
    /// Upper bound for a single uploaded image or logo.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Loads a TOML config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_hours <= 0 {
            return Err(Error::Config(
                "session_ttl_hours must be positive".to_string(),
            ));
        }
        if self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(Error::Config(format!(
                "session_ttl_hours cannot exceed {MAX_SESSION_TTL_HOURS}"
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config(
                "max_upload_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Session lifetime as a duration. Fails for values `validate` rejects.
    pub fn session_ttl(&self) -> Result<TimeDelta> {
        self.validate()?;
        TimeDelta::try_hours(self.session_ttl_hours)
            .ok_or_else(|| Error::Config("session_ttl_hours is out of range".to_string()))
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("reportdesk.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reportdesk.toml");
        std::fs::write(&path, "port = 9090\ndata_dir = \"/srv/reports\"\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.data_dir, PathBuf::from("/srv/reports"));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.session_ttl_hours, DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(config.db_path(), PathBuf::from("/srv/reports/reportdesk.db"));
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reportdesk.toml");
        std::fs::write(&path, "session_ttl_hours = 0\n").unwrap();

        assert!(matches!(
            ServerConfig::from_file(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_ttl() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reportdesk.toml");
        std::fs::write(&path, "session_ttl_hours = 100000000000\n").unwrap();

        assert!(matches!(
            ServerConfig::from_file(&path),
            Err(Error::Config(_))
        ));

        let config = ServerConfig {
            session_ttl_hours: MAX_SESSION_TTL_HOURS + 1,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(config.session_ttl().is_err());
    }

    #[test]
    fn test_session_ttl_at_limit() {
        let config = ServerConfig {
            session_ttl_hours: MAX_SESSION_TTL_HOURS,
            ..ServerConfig::default()
        };
        assert_eq!(
            config.session_ttl().unwrap(),
            TimeDelta::hours(MAX_SESSION_TTL_HOURS)
        );
        assert_eq!(
            ServerConfig::default().session_ttl().unwrap(),
            TimeDelta::hours(DEFAULT_SESSION_TTL_HOURS)
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }
}
