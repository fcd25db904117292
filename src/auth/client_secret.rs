//! Client secret (application identity) downloaded from the Google Cloud console

use std::path::Path;

use serde::Deserialize;

use crate::error::SyncError;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client credentials for an installed application
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The console wraps the secret in an `installed` or `web` object
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Load the client secret JSON file.
    ///
    /// A missing file is reported as [`SyncError::MissingClientSecret`] so the
    /// run aborts before any sync work begins.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        if !path.exists() {
            return Err(SyncError::MissingClientSecret {
                path: path.to_path_buf(),
            });
        }

        let invalid = |message: String| SyncError::InvalidClientSecret {
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let file: ClientSecretFile =
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        let secret = file
            .installed
            .or(file.web)
            .ok_or_else(|| invalid("expected an 'installed' or 'web' section".to_string()))?;

        if secret.client_id.is_empty() || secret.client_secret.is_empty() {
            return Err(invalid("client_id and client_secret must be set".to_string()));
        }

        Ok(secret)
    }

    /// Redirect URI registered for the installed-app flow
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or("http://localhost")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("clientsecret.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_installed_secret() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"{"installed": {
                "client_id": "123.apps.googleusercontent.com",
                "project_id": "syncer",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_secret": "shh",
                "redirect_uris": ["http://localhost"]
            }}"#,
        );

        let secret = ClientSecret::load(&path).unwrap();
        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "shh");
        assert_eq!(secret.redirect_uri(), "http://localhost");
    }

    #[test]
    fn test_load_web_secret_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{"web": {"client_id": "id", "client_secret": "secret"}}"#);

        let secret = ClientSecret::load(&path).unwrap();
        assert_eq!(secret.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(secret.auth_uri, DEFAULT_AUTH_URI);
        assert_eq!(secret.redirect_uri(), "http://localhost");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ClientSecret::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SyncError::MissingClientSecret { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "not json");
        let err = ClientSecret::load(&path).unwrap_err();
        assert!(matches!(err, SyncError::InvalidClientSecret { .. }));
    }

    #[test]
    fn test_missing_section() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{"other": {}}"#);
        let err = ClientSecret::load(&path).unwrap_err();
        assert!(matches!(err, SyncError::InvalidClientSecret { .. }));
    }
}
