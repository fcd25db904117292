//! Persisted OAuth token.
//!
//! The file holds a single JSON object:
//!
//! ```json
//! {
//!   "access_token": "ya29...",
//!   "refresh_token": "1//0g...",
//!   "expires_at": "2024-03-15T10:00:00Z",
//!   "scopes": ["https://www.googleapis.com/auth/calendar"]
//! }
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SyncError;

/// Tokens this close to expiry are treated as already expired
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredToken {
    /// True when the access token can no longer be used at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| at - Duration::seconds(EXPIRY_SKEW_SECS) <= now)
    }

    /// True when the token was granted `scope`
    pub fn covers(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// File-backed credential store
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored token, `None` when nothing has been persisted yet
    pub fn load(&self) -> Result<Option<StoredToken>, SyncError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        let token = serde_json::from_str(&content).map_err(|e| self.error(e))?;
        Ok(Some(token))
    }

    /// Persist `token`, replacing any previous one
    pub fn save(&self, token: &StoredToken) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }

        let json = serde_json::to_string_pretty(token).map_err(|e| self.error(e))?;

        // Write next to the target and rename so a crash never leaves a torn file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.error(e))?;
        restrict_permissions(&tmp).map_err(|e| self.error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.error(e))?;

        debug!(path = ?self.path, "Saved credential");
        Ok(())
    }

    /// Delete the stored token; returns whether one existed
    pub fn remove(&self) -> Result<bool, SyncError> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path).map_err(|e| self.error(e))?;
        Ok(true)
    }

    fn error(&self, err: impl std::fmt::Display) -> SyncError {
        SyncError::CredentialStore {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn token(expires_at: Option<DateTime<Utc>>) -> StoredToken {
        StoredToken {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at,
            scopes: vec![crate::auth::CALENDAR_SCOPE.to_string()],
        }
    }

    #[test]
    fn test_load_absent_store() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("creds.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join(".credentials").join("creds.json"));
        let expires = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        store.save(&token(Some(expires))).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.expires_at, Some(expires));
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
        assert!(!dir.path().join(".credentials").join("creds.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("creds.json"));
        store.save(&token(None)).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("creds.json"));
        assert!(!store.remove().unwrap());

        store.save(&token(None)).unwrap();
        assert!(store.remove().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_corrupt_store_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(&path, "{").unwrap();

        let err = TokenStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SyncError::CredentialStore { .. }));
    }

    #[test]
    fn test_is_expired_with_skew() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        assert!(token(Some(now)).is_expired(now));
        assert!(token(Some(now + Duration::seconds(30))).is_expired(now));
        assert!(!token(Some(now + Duration::seconds(120))).is_expired(now));
        assert!(!token(None).is_expired(now));
    }

    #[test]
    fn test_covers_scope() {
        let t = token(None);
        assert!(t.covers(crate::auth::CALENDAR_SCOPE));
        assert!(!t.covers("https://www.googleapis.com/auth/calendar.readonly"));
    }
}
